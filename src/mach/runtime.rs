use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use log::debug;

use super::memory::Memory;
use super::stack::{ForStack, GosubStack, Stack};
use crate::io::{Console, DiskStorage, Eeprom, StdioConsole, Storage};
use crate::io::{I_SERIAL, O_FILE, O_SERIAL};
use crate::lang::{Address, Error, Number, Token, BUF_SIZE, VAR_SIZE};

type Result<T> = std::result::Result<T, Error>;

/// Interpreter mode: at the prompt, running the stored program, or
/// running straight from the EEPROM image.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    Int,
    Run,
    Erun,
}

/// Default EEPROM image size on a hosted build.
const EEPROM_LEN: usize = 1024;

/// The interpreter. One value owns the shared byte store, the stacks,
/// the token look-ahead, the stream selections and the two ports; two
/// of these in one process do not know about each other.
pub struct Runtime {
    pub(crate) mem: Memory,
    pub(crate) eeprom: Eeprom,
    pub(crate) vars: [Number; VAR_SIZE],
    pub(crate) stack: Stack,
    pub(crate) forstack: ForStack,
    pub(crate) gosubstack: GosubStack,
    /// Single-token look-ahead, fed by the tokenizer.
    pub(crate) token: Token,
    /// Program cursor in run mode.
    pub(crate) here: Address,
    /// Interactive input buffer; byte 0 holds the line length and the
    /// `@$` pseudo string reads it directly.
    pub(crate) ibuffer: [u8; BUF_SIZE],
    /// Cursor into `ibuffer` in interactive mode.
    pub(crate) bi: usize,
    pub(crate) st: State,
    /// Trappable error register, `@S` in BASIC.
    pub(crate) ert: Number,
    pub(crate) id: u8,
    pub(crate) od: u8,
    pub(crate) idd: u8,
    pub(crate) odd: u8,
    /// PRINT field width.
    pub(crate) form: Number,
    /// Random number generator state, `@R` in BASIC.
    pub(crate) rd: u16,
    /// Output column, for the separating space in front of numbers.
    pub(crate) ocol: usize,
    /// Last byte written, so separators never double up.
    pub(crate) olast: u8,
    /// String assignment keeps the longer old length when set; clearing
    /// it gives the classic truncating substring assignment.
    pub(crate) extension: bool,
    pub(crate) console: Box<dyn Console>,
    pub(crate) storage: Box<dyn Storage>,
    pub(crate) ifile: Option<Box<dyn Read>>,
    pub(crate) ofile: Option<Box<dyn Write>>,
    started: DateTime<Utc>,
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime::new(Box::new(StdioConsole::default()), Box::new(DiskStorage))
    }
}

impl Runtime {
    pub fn new(console: Box<dyn Console>, storage: Box<dyn Storage>) -> Runtime {
        Runtime::with_memory(Memory::new(), Eeprom::new(EEPROM_LEN), console, storage)
    }

    pub fn with_memory(
        mem: Memory,
        eeprom: Eeprom,
        console: Box<dyn Console>,
        storage: Box<dyn Storage>,
    ) -> Runtime {
        Runtime {
            mem,
            eeprom,
            vars: [0; VAR_SIZE],
            stack: Stack::new(),
            forstack: ForStack::new(),
            gosubstack: GosubStack::new(),
            token: Token::Eol,
            here: 0,
            ibuffer: [0; BUF_SIZE],
            bi: 0,
            st: State::Int,
            ert: 0,
            id: I_SERIAL,
            od: O_SERIAL,
            idd: I_SERIAL,
            odd: O_SERIAL,
            form: 0,
            rd: 0,
            ocol: 0,
            olast: b'\n',
            extension: true,
            console,
            storage,
            ifile: None,
            ofile: None,
            started: Utc::now(),
        }
    }

    /// Classic Apple 1 string truncation instead of the extension rule.
    pub fn set_classic_strings(&mut self) {
        self.extension = false;
    }

    /// The greeting the REPL prints once.
    pub fn greeting(&self) -> String {
        format!(
            "Tiny BASIC {} Memory {} {}",
            env!("CARGO_PKG_VERSION"),
            self.mem.memsize() as u32 + 1,
            self.eeprom.len()
        )
    }

    /// Checks the EEPROM autorun flag and, when set, runs the stored
    /// image without touching the program store.
    pub fn boot(&mut self) {
        if !self.eeprom.is_empty() && self.eeprom.read(0) == 1 {
            self.mem.top = self.eeprom.read_addr(1);
            self.st = State::Erun;
            self.here = 0;
            self.clr_all();
            if let Err(e) = self.nexttoken().and_then(|_| self.exec_run()) {
                self.report(e);
            }
            self.st = State::Int;
            self.mem.top = 0;
        }
    }

    /// One REPL interaction: a numbered line goes to the editor, an
    /// immediate statement executes. Returns false for blank input.
    pub fn enter(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        self.set_buffer(line);
        self.iodefaults();
        if let Err(e) = self.enter_buffer() {
            self.report(e);
        }
        true
    }

    fn enter_buffer(&mut self) -> Result<()> {
        self.nexttoken()?;
        if let Token::Number(_) = self.token {
            self.storeline()
        } else {
            self.st = State::Int;
            self.statement()
        }
    }

    /// The error boundary. Cleanup happens exactly once and exactly
    /// here: streams back to defaults, message out, all three stacks
    /// cleared, back to the prompt.
    pub(crate) fn report(&mut self, e: Error) {
        debug!("error caught at statement boundary: {:?}", e);
        let e = if self.st != State::Int {
            let line = self.myline(self.here);
            if line != 0 {
                e.in_line(line)
            } else {
                e
            }
        } else {
            e
        };
        self.iodefaults();
        self.outs_str(&e.to_string());
        self.outcr();
        self.stack.clear();
        self.forstack.clear();
        self.gosubstack.clear();
        self.here = 0;
        self.st = State::Int;
    }

    pub(crate) fn iodefaults(&mut self) {
        self.id = self.idd;
        self.od = self.odd;
    }

    /// Loads a line into the input buffer and rewinds the interactive
    /// cursor. Byte 0 carries the length for the `@$` pseudo string.
    pub(crate) fn set_buffer(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let n = bytes.len().min(BUF_SIZE - 2);
        self.ibuffer[1..=n].copy_from_slice(&bytes[..n]);
        self.ibuffer[0] = n as u8;
        for b in self.ibuffer[n + 1..].iter_mut() {
            *b = 0;
        }
        self.bi = 0;
    }

    /// Reads an input line from the current input selection, for the
    /// INPUT statement.
    pub(crate) fn read_line_raw(&mut self) -> String {
        if self.id == crate::io::I_FILE {
            let mut line = String::new();
            loop {
                let c = self.inch();
                if c == 0 || c == b'\n' || c == b'\r' {
                    break;
                }
                line.push(c as char);
            }
            line
        } else {
            self.console.read_line()
        }
    }

    /// One byte from the current input source, blocking.
    pub(crate) fn inch(&mut self) -> u8 {
        if self.id == crate::io::I_FILE {
            let mut b = [0u8];
            match self.ifile.as_mut().map(|f| f.read(&mut b)) {
                Some(Ok(1)) => b[0],
                _ => {
                    self.ert = 1;
                    0
                }
            }
        } else {
            self.console.read()
        }
    }

    /// Non-blocking peek at the console, for `@C`, GET and the break
    /// poll.
    pub(crate) fn checkch(&mut self) -> Option<u8> {
        self.console.peek()
    }

    /// Fans one byte out to every selected sink.
    pub(crate) fn outch(&mut self, c: u8) {
        if self.od & (O_SERIAL | crate::io::O_DSP) != 0 {
            self.console.write(c);
        }
        if self.od & O_FILE != 0 {
            if let Some(f) = self.ofile.as_mut() {
                let _ = f.write_all(&[c]);
            } else {
                self.ert = 1;
            }
        }
        if c == b'\n' {
            self.ocol = 0;
        } else {
            self.ocol += 1;
        }
        self.olast = c;
    }

    pub(crate) fn outcr(&mut self) {
        self.outch(b'\n');
    }

    pub(crate) fn outspc(&mut self) {
        self.outch(b' ');
    }

    pub(crate) fn outs(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.outch(*b);
        }
    }

    pub(crate) fn outs_str(&mut self, s: &str) {
        self.outs(s.as_bytes());
    }

    /// Prints a number, padded on the right to the PRINT field width.
    pub(crate) fn outnumber(&mut self, n: Number) {
        let s = n.to_string();
        self.outs_str(&s);
        let mut nd = s.len() as Number;
        while nd < self.form {
            self.outspc();
            nd += 1;
        }
    }

    /// Milliseconds since the interpreter came up.
    pub(crate) fn millis(&self) -> Number {
        (Utc::now() - self.started).num_milliseconds() as Number
    }

    /// Clears variables, heap and control stacks; RUN and CLR share
    /// this.
    pub(crate) fn clr_all(&mut self) {
        self.vars = [0; VAR_SIZE];
        self.mem.nvars = 0;
        self.mem.himem = self.mem.memsize();
        self.forstack.clear();
        self.gosubstack.clear();
    }
}

#[cfg(test)]
impl Runtime {
    /// A small store is plenty for the unit tests and keeps failures
    /// readable.
    pub(crate) fn for_test() -> Runtime {
        Runtime::with_memory(
            Memory::with_size(4096),
            Eeprom::new(256),
            Box::new(StdioConsole::default()),
            Box::new(DiskStorage),
        )
    }
}
