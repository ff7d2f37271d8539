use log::debug;

use super::memory::Memory;
use crate::error;
use crate::lang::{token, Address, Error, Name, ADDR_SIZE, NUM_SIZE};

type Result<T> = std::result::Result<T, Error>;

/// What kind of object a heap header announces. The tag byte stored in
/// memory is the matching variable token code, so DUMP output reads the
/// same as the token stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ObjKind {
    Scalar,
    Array,
    String,
}

impl ObjKind {
    pub fn tag(self) -> i8 {
        match self {
            ObjKind::Scalar => token::VARIABLE,
            ObjKind::Array => token::ARRAYVAR,
            ObjKind::String => token::STRINGVAR,
        }
    }
}

/// Heap objects are stored high-to-low from `himem`: a three byte
/// header `[name1, name2, tag]` written in decreasing addresses, then
/// for arrays and strings a two byte capacity, then the payload.
/// Objects are never freed one by one; CLR and NEW drop the whole heap
/// by resetting `himem` and `nvars`.
impl Memory {
    /// Allocates a named object, refusing names that already exist.
    /// `len` is the element count for arrays and the payload byte count
    /// for strings; scalars ignore it. Returns the low address of the
    /// payload.
    pub fn bmalloc(&mut self, kind: ObjKind, name: Name, len: Address) -> Result<Address> {
        debug!("bmalloc {:?} {} len {}", kind, name, len);
        if self.bfind(kind, name).is_some() {
            return Err(error!(Variable));
        }
        let vsize = match kind {
            ObjKind::Scalar => NUM_SIZE as u32 + 3,
            ObjKind::Array => NUM_SIZE as u32 * len as u32 + ADDR_SIZE as u32 + 3,
            ObjKind::String => len as u32 + ADDR_SIZE as u32 + 3,
        };
        if ((self.himem - self.top) as u32) < vsize {
            return Err(error!(OutOfMemory));
        }
        let vsize = vsize as Address;
        let b = self.himem;
        self.write8(b, name.0 as i8);
        self.write8(b - 1, name.1 as i8);
        self.write8(b - 2, kind.tag());
        if kind != ObjKind::Scalar {
            self.write_addr(b - 2 - ADDR_SIZE, vsize - (ADDR_SIZE + 3));
        }
        self.himem -= vsize;
        self.nvars += 1;
        Ok(self.himem + 1)
    }

    /// Linear scan from the top of memory, one object per step, exactly
    /// `nvars` steps. Returns the payload address.
    pub fn bfind(&self, kind: ObjKind, name: Name) -> Option<Address> {
        self.bscan(kind, name).map(|(addr, _)| addr)
    }

    /// Payload byte count of an object, 0 when it does not exist.
    pub fn blength(&self, kind: ObjKind, name: Name) -> Address {
        self.bscan(kind, name).map(|(_, len)| len).unwrap_or(0)
    }

    fn bscan(&self, kind: ObjKind, name: Name) -> Option<(Address, Address)> {
        let mut b = self.memsize();
        for _ in 0..self.nvars {
            let n1 = self.read8(b) as u8;
            let n2 = self.read8(b - 1) as u8;
            let tag = self.read8(b - 2);
            b -= 2;
            let len = if tag == ObjKind::Scalar.tag() {
                NUM_SIZE
            } else {
                b -= ADDR_SIZE;
                self.read_addr(b)
            };
            b -= 1 + len;
            if tag == kind.tag() && n1 == name.0 && n2 == name.1 {
                return Some((b + 1, len));
            }
        }
        None
    }
}
