use log::trace;

use super::heap::ObjKind;
use super::runtime::Runtime;
use crate::error;
use crate::lang::{
    Address, Error, Name, Number, StrLoc, StrSource, BUF_SIZE, EHEADER_SIZE, NUM_SIZE,
    STR_INDEX_SIZE,
};

type Result<T> = std::result::Result<T, Error>;

/// Capacity a string gets when first used without a DIM.
const DEFAULT_STR_DIM: Address = 32;

/// A writable string position: either inside the byte store (heap
/// string payloads) or inside the interactive buffer (the `@$` pseudo
/// string). The address points at one character, 1-based positions are
/// resolved before a `StrRef` is handed out.
#[derive(Debug, Clone, Copy)]
pub enum StrRef {
    Mem(Address),
    Buffer(usize),
}

/// Variable access. Single letters A..Z live in a static array; every
/// other name is a heap object, created on first touch. Names starting
/// with `@` are hooks into interpreter and environment state rather
/// than storage.
impl Runtime {
    pub(crate) fn getvar(&mut self, name: Name) -> Result<Number> {
        trace!("getvar {}", name);
        if name.is_static() {
            return Ok(self.vars[name.slot()]);
        }
        if name.is_pseudo() {
            match name.1 {
                b'S' => return Ok(self.ert),
                b'I' => return Ok(self.id as Number),
                b'O' => return Ok(self.od as Number),
                b'C' => {
                    return Ok(if self.checkch().is_some() {
                        self.inch() as Number
                    } else {
                        0
                    })
                }
                b'R' => return Ok(self.rd as Number),
                b'X' => return Ok(self.console.cursor().0),
                b'Y' => return Ok(self.console.cursor().1),
                _ => {}
            }
        }
        let addr = self.scalar_addr(name)?;
        Ok(self.mem.read_num(addr))
    }

    pub(crate) fn setvar(&mut self, name: Name, val: Number) -> Result<()> {
        trace!("setvar {} = {}", name, val);
        if name.is_static() {
            self.vars[name.slot()] = val;
            return Ok(());
        }
        if name.is_pseudo() {
            match name.1 {
                b'S' => {
                    self.ert = val;
                    return Ok(());
                }
                b'I' => {
                    self.id = val as u8;
                    return Ok(());
                }
                b'O' => {
                    self.od = val as u8;
                    return Ok(());
                }
                b'C' => {
                    self.outch(val as u8);
                    return Ok(());
                }
                b'R' => {
                    self.rd = val as u16;
                    return Ok(());
                }
                b'X' => {
                    let (_, row) = self.console.cursor();
                    self.console.set_cursor(val, row);
                    return Ok(());
                }
                b'Y' => {
                    let (col, _) = self.console.cursor();
                    self.console.set_cursor(col, val);
                    return Ok(());
                }
                _ => {}
            }
        }
        let addr = self.scalar_addr(name)?;
        self.mem.write_num(addr, val);
        Ok(())
    }

    /// Heap scalars appear on first use, zeroed.
    fn scalar_addr(&mut self, name: Name) -> Result<Address> {
        if let Some(addr) = self.mem.bfind(ObjKind::Scalar, name) {
            return Ok(addr);
        }
        let addr = self.mem.bmalloc(ObjKind::Scalar, name, 0)?;
        self.mem.write_num(addr, 0);
        Ok(addr)
    }

    /// DIM for arrays. Unlike scalars these never appear on the fly.
    pub(crate) fn create_array(&mut self, name: Name, len: Address) -> Result<()> {
        let addr = self.mem.bmalloc(ObjKind::Array, name, len)?;
        self.mem.fill(addr, len * NUM_SIZE, 0);
        Ok(())
    }

    /// DIM for strings; the length word starts at zero.
    pub(crate) fn create_string(&mut self, name: Name, len: Address) -> Result<()> {
        let addr = self.mem.bmalloc(ObjKind::String, name, len + STR_INDEX_SIZE)?;
        self.mem.write_addr(addr, 0);
        Ok(())
    }

    pub(crate) fn array_get(&mut self, name: Name, index: Number) -> Result<Number> {
        if name.is_pseudo() {
            match name.1 {
                b'E' => {
                    let h = self.eeprom.len() / NUM_SIZE;
                    self.check_index(index, h as Number)?;
                    let a = self.eeprom.len() - NUM_SIZE * index as Address;
                    return Ok(self.eeprom.read_num(a));
                }
                b'D' => return Ok(self.console.display_get(index)),
                _ => {
                    let h = (self.mem.himem - self.mem.top) / NUM_SIZE;
                    self.check_index(index, h as Number)?;
                    let a = self.mem.himem - NUM_SIZE * index as Address + 1;
                    return Ok(self.mem.read_num(a));
                }
            }
        }
        let a = self.heap_array(name, index)?;
        Ok(self.mem.read_num(a))
    }

    pub(crate) fn array_set(&mut self, name: Name, index: Number, val: Number) -> Result<()> {
        if name.is_pseudo() {
            match name.1 {
                b'E' => {
                    let h = self.eeprom.len() / NUM_SIZE;
                    self.check_index(index, h as Number)?;
                    let a = self.eeprom.len() - NUM_SIZE * index as Address;
                    self.eeprom.write_num(a, val);
                    return Ok(());
                }
                b'D' => {
                    self.console.display_set(index, val);
                    return Ok(());
                }
                _ => {
                    let h = (self.mem.himem - self.mem.top) / NUM_SIZE;
                    self.check_index(index, h as Number)?;
                    let a = self.mem.himem - NUM_SIZE * index as Address + 1;
                    self.mem.write_num(a, val);
                    return Ok(());
                }
            }
        }
        let a = self.heap_array(name, index)?;
        self.mem.write_num(a, val);
        Ok(())
    }

    /// Resolves a heap array element; the index is 1-based.
    fn heap_array(&mut self, name: Name, index: Number) -> Result<Address> {
        let addr = self
            .mem
            .bfind(ObjKind::Array, name)
            .ok_or_else(|| error!(Variable))?;
        let len = self.mem.blength(ObjKind::Array, name);
        let h = len / NUM_SIZE;
        self.check_index(index, h as Number)?;
        Ok(addr + (index as Address - 1) * NUM_SIZE)
    }

    fn check_index(&self, index: Number, h: Number) -> Result<()> {
        if index < 1 || index > h {
            return Err(error!(Range));
        }
        Ok(())
    }

    /// A string's payload address, allocating a default-capacity one
    /// on first touch like scalars do.
    fn string_addr(&mut self, name: Name) -> Result<Address> {
        if let Some(addr) = self.mem.bfind(ObjKind::String, name) {
            return Ok(addr);
        }
        let addr = self
            .mem
            .bmalloc(ObjKind::String, name, DEFAULT_STR_DIM + STR_INDEX_SIZE)?;
        self.mem.write_addr(addr, 0);
        Ok(addr)
    }

    /// Position `b` (1-based) inside a string variable. `@$` aliases
    /// the input buffer, whose byte 0 is its length.
    pub(crate) fn getstring(&mut self, name: Name, b: Address) -> Result<StrRef> {
        if name.is_pseudo() {
            if b < 1 || b as usize > BUF_SIZE - 1 {
                return Err(error!(Range));
            }
            return Ok(StrRef::Buffer(b as usize));
        }
        let addr = self.string_addr(name)?;
        let cap = self.mem.blength(ObjKind::String, name);
        if b < 1 || b > cap - STR_INDEX_SIZE {
            return Err(error!(Range));
        }
        Ok(StrRef::Mem(addr + b - 1 + STR_INDEX_SIZE))
    }

    /// Declared capacity in characters.
    pub(crate) fn stringdim(&mut self, name: Name) -> Result<Address> {
        if name.is_pseudo() {
            return Ok((BUF_SIZE - 1) as Address);
        }
        self.string_addr(name)?;
        Ok(self.mem.blength(ObjKind::String, name) - STR_INDEX_SIZE)
    }

    /// Current logical length.
    pub(crate) fn lenstring(&mut self, name: Name) -> Result<Address> {
        if name.is_pseudo() {
            return Ok(self.ibuffer[0] as Address);
        }
        let addr = self.string_addr(name)?;
        Ok(self.mem.read_addr(addr))
    }

    pub(crate) fn setstringlength(&mut self, name: Name, len: Address) -> Result<()> {
        if name.is_pseudo() {
            self.ibuffer[0] = len as u8;
            return Ok(());
        }
        let addr = self.string_addr(name)?;
        let dim = self.mem.blength(ObjKind::String, name) - STR_INDEX_SIZE;
        if len > dim {
            return Err(error!(Range));
        }
        self.mem.write_addr(addr, len);
        Ok(())
    }

    /// One byte of a string value, `j` counted from its first char.
    pub(crate) fn lit_read(&self, loc: StrLoc, j: usize) -> u8 {
        match loc.src {
            StrSource::Buffer => self.ibuffer[loc.addr as usize + j],
            StrSource::Mem => self.mem.read8(loc.addr + j as Address) as u8,
            StrSource::Eeprom => self.eeprom.read(loc.addr + EHEADER_SIZE + j as Address) as u8,
        }
    }

    pub(crate) fn str_write(&mut self, r: StrRef, j: usize, val: u8) {
        match r {
            StrRef::Mem(a) => self.mem.write8(a + j as Address, val as i8),
            StrRef::Buffer(o) => self.ibuffer[o + j] = val,
        }
    }

    /// Copies `n` source bytes to the destination. Source and target
    /// may alias (`A$(2)=A$(1)`), so the direction depends on which
    /// side starts lower.
    pub(crate) fn str_copy(&mut self, src: StrLoc, dst: StrRef, n: usize) {
        let descending = match (src.src, dst) {
            (StrSource::Mem, StrRef::Mem(d)) => src.addr < d,
            (StrSource::Buffer, StrRef::Buffer(d)) => (src.addr as usize) < d,
            _ => false,
        };
        if descending {
            for j in (0..n).rev() {
                let c = self.lit_read(src, j);
                self.str_write(dst, j, c);
            }
        } else {
            for j in 0..n {
                let c = self.lit_read(src, j);
                self.str_write(dst, j, c);
            }
        }
    }

    /// Collects a string value into owned bytes, for filenames and
    /// INPUT targets.
    pub(crate) fn lit_bytes(&self, loc: StrLoc) -> Vec<u8> {
        (0..loc.len as usize).map(|j| self.lit_read(loc, j)).collect()
    }
}
