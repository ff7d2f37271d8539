use crate::error;
use crate::lang::{Address, Error, Number, MAX_ADDR, NUM_SIZE};

type Result<T> = std::result::Result<T, Error>;

/// Capacities tried at startup, largest first, shaped after the memory
/// ladder of the 8-bit boards the dialect grew up on.
const MEM_MODEL: [usize; 7] = [60000, 46000, 28000, 4096, 1024, 512, 128];

/// The shared byte store. Program bytes grow up from 0 to `top`; heap
/// objects grow down from the end, `himem` being the last byte the heap
/// does not yet occupy. The region `[top, himem]` is free and every
/// writer checks against the opposite frontier before touching it.
///
/// Cells are signed bytes and every multi-byte value is little-endian,
/// so the store is a faithful image of what PEEK and DUMP show.
pub struct Memory {
    mem: Vec<i8>,
    pub top: Address,
    pub himem: Address,
    memsize: Address,
    pub nvars: Address,
}

impl Memory {
    pub fn new() -> Memory {
        Memory::with_size(MEM_MODEL[0])
    }

    /// A store of exactly `size` bytes, clamped to the address space.
    pub fn with_size(size: usize) -> Memory {
        let size = size.max(2).min(MAX_ADDR as usize + 1);
        let memsize = (size - 1) as Address;
        Memory {
            mem: vec![0; size],
            top: 0,
            himem: memsize,
            memsize,
            nvars: 0,
        }
    }

    /// Highest valid address.
    pub fn memsize(&self) -> Address {
        self.memsize
    }

    /// Free bytes between the two frontiers; what SIZE reports.
    pub fn free(&self) -> Address {
        self.himem - self.top
    }

    /// True when `need` more program bytes would run into the heap.
    pub fn has_room(&self, need: Address) -> bool {
        match self.himem.checked_sub(need) {
            Some(limit) => self.top < limit,
            None => false,
        }
    }

    pub fn read8(&self, addr: Address) -> i8 {
        self.mem[addr as usize]
    }

    pub fn write8(&mut self, addr: Address, val: i8) {
        self.mem[addr as usize] = val;
    }

    pub fn read_num(&self, addr: Address) -> Number {
        let mut bytes = [0u8; NUM_SIZE as usize];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.mem[addr as usize + i] as u8;
        }
        Number::from_le_bytes(bytes)
    }

    pub fn write_num(&mut self, addr: Address, val: Number) {
        for (i, b) in val.to_le_bytes().iter().enumerate() {
            self.mem[addr as usize + i] = *b as i8;
        }
    }

    pub fn read_addr(&self, addr: Address) -> Address {
        let lo = self.mem[addr as usize] as u8;
        let hi = self.mem[addr as usize + 1] as u8;
        Address::from_le_bytes([lo, hi])
    }

    pub fn write_addr(&mut self, addr: Address, val: Address) {
        let bytes = val.to_le_bytes();
        self.mem[addr as usize] = bytes[0] as i8;
        self.mem[addr as usize + 1] = bytes[1] as i8;
    }

    /// Moves `len` bytes from `src` to `dst`. The ranges may overlap;
    /// writing past `himem` is refused because that is heap territory.
    pub fn moveblock(&mut self, src: Address, len: Address, dst: Address) -> Result<()> {
        if dst as u32 + len as u32 > self.himem as u32 {
            return Err(error!(OutOfMemory));
        }
        if len < 1 {
            return Ok(());
        }
        let (src, len, dst) = (src as usize, len as usize, dst as usize);
        self.mem.copy_within(src..src + len, dst);
        Ok(())
    }

    /// Clears `len` bytes at `addr`, same guard as `moveblock`.
    pub fn zeroblock(&mut self, addr: Address, len: Address) -> Result<()> {
        if addr as u32 + len as u32 > self.himem as u32 + 1 {
            return Err(error!(OutOfMemory));
        }
        self.fill(addr, len, 0);
        Ok(())
    }

    /// Raw fill, no frontier guard. Heap initialisation writes above
    /// `himem` and must bypass the program-region check.
    pub(crate) fn fill(&mut self, addr: Address, len: Address, val: i8) {
        for i in 0..len {
            self.mem[(addr + i) as usize] = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_roundtrip_little_endian() {
        let mut m = Memory::with_size(128);
        m.write_num(10, -123456);
        assert_eq!(m.read_num(10), -123456);
        m.write_num(10, 0x01020304);
        assert_eq!(m.read8(10), 0x04);
        assert_eq!(m.read8(13), 0x01);
        m.write_addr(20, 0xBEEF);
        assert_eq!(m.read_addr(20), 0xBEEF);
        assert_eq!(m.read8(20) as u8, 0xEF);
    }

    #[test]
    fn test_moveblock_overlap_both_directions() {
        let mut m = Memory::with_size(128);
        for i in 0..8 {
            m.write8(i, i as i8);
        }
        m.moveblock(0, 8, 2).unwrap();
        for i in 0..8 {
            assert_eq!(m.read8(2 + i), i as i8);
        }
        m.moveblock(2, 8, 0).unwrap();
        for i in 0..8 {
            assert_eq!(m.read8(i), i as i8);
        }
    }

    #[test]
    fn test_moveblock_respects_himem() {
        let mut m = Memory::with_size(128);
        m.himem = 63;
        assert!(m.moveblock(0, 32, 40).is_err());
        assert!(m.moveblock(0, 32, 31).is_ok());
    }

    #[test]
    fn test_room_check() {
        let mut m = Memory::with_size(128);
        m.top = 60;
        m.himem = 70;
        assert!(m.has_room(9));
        assert!(!m.has_room(10));
        assert!(!m.has_room(200));
    }
}
