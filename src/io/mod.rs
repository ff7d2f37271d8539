/*!
## I/O façade

The interpreter talks to the outside world through two ports: a
character console and a persistent store. Output is multiplexed over a
bitmask of sinks, input comes from one source at a time, and the EEPROM
image is an owned byte array with the classic flag/top/program layout.

*/

use std::fs;
use std::io::{BufReader, Read, Write};

use crate::lang::{Address, Number, EHEADER_SIZE};

/// Output sinks, OR-able into the `od` mask.
pub const O_SERIAL: u8 = 1;
pub const O_DSP: u8 = 2;
pub const O_PRT: u8 = 4;
pub const O_FILE: u8 = 16;

/// Input sources, one at a time in `id`.
pub const I_SERIAL: u8 = 1;
pub const I_KEYBOARD: u8 = 2;
pub const I_FILE: u8 = 16;

/// The character console the interpreter runs against. The terminal
/// front end implements this for a real tty; tests script it.
pub trait Console {
    /// Writes one byte to the screen/serial side of the world.
    fn write(&mut self, c: u8);

    /// Blocks until a character is available.
    fn read(&mut self) -> u8;

    /// Non-blocking look at the next character, if any.
    fn peek(&mut self) -> Option<u8>;

    /// Reads a whole input line, without the terminating newline. Echo
    /// is the console's business, not the interpreter's.
    fn read_line(&mut self) -> String;

    /// Called after LIST prints a line; returning ESC cancels the
    /// listing. A scrolling terminal just returns 0.
    fn wait_on_scroll(&mut self) -> u8 {
        0
    }

    /// CLS hook.
    fn clear(&mut self) {}

    /// Cursor position for the `@X`/`@Y` pseudo variables.
    fn cursor(&self) -> (Number, Number) {
        (0, 0)
    }

    fn set_cursor(&mut self, _col: Number, _row: Number) {}

    /// Direct display-cell access for the `@D` pseudo array. Consoles
    /// without an addressable display ignore writes and read 0.
    fn display_get(&mut self, _index: Number) -> Number {
        0
    }

    fn display_set(&mut self, _index: Number, _value: Number) {}
}

/// A console over stdin/stdout, line-buffered. Good enough for piping
/// programs through the interpreter; the terminal front end replaces it
/// with one that can peek and clear the screen.
#[derive(Default)]
pub struct StdioConsole {
    pending: Vec<u8>,
}

impl Console for StdioConsole {
    fn write(&mut self, c: u8) {
        let mut out = std::io::stdout();
        let _ = out.write_all(&[c]);
        if c == b'\n' {
            let _ = out.flush();
        }
    }

    fn read(&mut self) -> u8 {
        if self.pending.is_empty() {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
                return 0;
            }
            self.pending = line.into_bytes();
            self.pending.reverse();
        }
        self.pending.pop().unwrap_or(0)
    }

    fn peek(&mut self) -> Option<u8> {
        self.pending.last().copied()
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        loop {
            let c = self.read();
            if c == 0 || c == b'\n' || c == b'\r' {
                return line;
            }
            line.push(c as char);
        }
    }
}

/// The persistent-store port: short ASCII names, read or write streams,
/// a prefix-matched directory, and deletion. Failures surface as the
/// trappable error register, never as interpreter errors.
pub trait Storage {
    fn open_in(&mut self, name: &str) -> std::io::Result<Box<dyn Read>>;
    fn open_out(&mut self, name: &str) -> std::io::Result<Box<dyn Write>>;
    fn catalog(&mut self, pattern: &str) -> std::io::Result<Vec<(String, u64)>>;
    fn remove(&mut self, name: &str) -> std::io::Result<()>;
}

/// Plain files in the working directory.
#[derive(Default)]
pub struct DiskStorage;

impl Storage for DiskStorage {
    fn open_in(&mut self, name: &str) -> std::io::Result<Box<dyn Read>> {
        let file = fs::File::open(name)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_out(&mut self, name: &str) -> std::io::Result<Box<dyn Write>> {
        let file = fs::File::create(name)?;
        Ok(Box::new(file))
    }

    fn catalog(&mut self, pattern: &str) -> std::io::Result<Vec<(String, u64)>> {
        let mut names = vec![];
        for entry in fs::read_dir(".")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name_matches(&name, pattern) {
                names.push((name, entry.metadata()?.len()));
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&mut self, name: &str) -> std::io::Result<()> {
        fs::remove_file(name)
    }
}

/// CATALOG matching: the pattern is a prefix, the empty pattern matches
/// everything.
pub fn name_matches(name: &str, pattern: &str) -> bool {
    name.as_bytes()
        .iter()
        .zip(pattern.as_bytes())
        .all(|(a, b)| a == b)
        && pattern.len() <= name.len()
}

/// The EEPROM image: byte 0 is a flag (255 erased, 0 program stored,
/// 1 autorun), the next two bytes hold the stored program's `top`, the
/// program bytes follow. Negative PEEK/POKE addresses and the `@E`
/// array also land here.
pub struct Eeprom {
    bytes: Vec<u8>,
}

impl Eeprom {
    pub fn new(len: usize) -> Eeprom {
        Eeprom {
            bytes: vec![0xFF; len],
        }
    }

    pub fn len(&self) -> Address {
        self.bytes.len() as Address
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read(&self, addr: Address) -> i8 {
        self.bytes[addr as usize] as i8
    }

    pub fn update(&mut self, addr: Address, val: i8) {
        self.bytes[addr as usize] = val as u8;
    }

    pub fn read_addr(&self, addr: Address) -> Address {
        Address::from_le_bytes([self.bytes[addr as usize], self.bytes[addr as usize + 1]])
    }

    pub fn write_addr(&mut self, addr: Address, val: Address) {
        let b = val.to_le_bytes();
        self.bytes[addr as usize] = b[0];
        self.bytes[addr as usize + 1] = b[1];
    }

    pub fn read_num(&self, addr: Address) -> Number {
        let mut bytes = [0u8; crate::lang::NUM_SIZE as usize];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.bytes[addr as usize + i];
        }
        Number::from_le_bytes(bytes)
    }

    pub fn write_num(&mut self, addr: Address, val: Number) {
        for (i, b) in val.to_le_bytes().iter().enumerate() {
            self.bytes[addr as usize + i] = *b;
        }
    }

    /// Room the program image may occupy.
    pub fn image_len(&self) -> Address {
        self.len().saturating_sub(EHEADER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eeprom_starts_erased() {
        let e = Eeprom::new(64);
        assert_eq!(e.read(0), -1);
        assert_eq!(e.len(), 64);
    }

    #[test]
    fn test_eeprom_addr_roundtrip() {
        let mut e = Eeprom::new(64);
        e.write_addr(1, 517);
        assert_eq!(e.read_addr(1), 517);
        assert_eq!(e.read(1), 5);
        assert_eq!(e.read(2), 2);
    }

    #[test]
    fn test_catalog_pattern() {
        assert!(name_matches("file.bas", ""));
        assert!(name_matches("file.bas", "file"));
        assert!(!name_matches("file.bas", "data"));
        assert!(!name_matches("f", "file"));
    }
}
