use log::debug;

use super::runtime::{Runtime, State};
use crate::error;
use crate::lang::{token, Address, Error, Name, StrLoc, StrSource, Token, Word};
use crate::lang::{ADDR_SIZE, EHEADER_SIZE, MAX_ADDR, NUM_SIZE};

type Result<T> = std::result::Result<T, Error>;

/// A stored line is `LINENUMBER` tag, two number bytes, then the body
/// tokens; the next `LINENUMBER` (or `top`) ends it.
const LN_LENGTH: Address = ADDR_SIZE + 1;

/// The program store. Tokens append at `top`; the editor keeps lines
/// strictly ascending by moving blocks around inside the byte store.
impl Runtime {
    /// Appends the current token at `top`, payload included. Nothing is
    /// written unless the room check against the heap frontier passes.
    pub(crate) fn storetoken(&mut self) -> Result<()> {
        let top = self.mem.top;
        match self.token {
            Token::LineNumber(n) => {
                if !self.mem.has_room(ADDR_SIZE + 1) {
                    return Err(error!(OutOfMemory));
                }
                self.mem.write8(top, token::LINENUMBER);
                self.mem.write_addr(top + 1, n);
                self.mem.top += 1 + ADDR_SIZE;
            }
            Token::Number(v) => {
                if !self.mem.has_room(NUM_SIZE + 1) {
                    return Err(error!(OutOfMemory));
                }
                self.mem.write8(top, token::NUMBER);
                self.mem.write_num(top + 1, v);
                self.mem.top += 1 + NUM_SIZE;
            }
            Token::Variable(n) | Token::ArrayVar(n) | Token::StringVar(n) => {
                if !self.mem.has_room(3) {
                    return Err(error!(OutOfMemory));
                }
                self.mem.write8(top, self.token.code());
                self.mem.write8(top + 1, n.0 as i8);
                self.mem.write8(top + 2, n.1 as i8);
                self.mem.top += 3;
            }
            Token::Str(loc) => {
                if !self.mem.has_room(loc.len + 2) {
                    return Err(error!(OutOfMemory));
                }
                self.mem.write8(top, token::STRING);
                self.mem.write8(top + 1, loc.len as i8);
                for j in 0..loc.len {
                    let c = self.lit_read(loc, j as usize);
                    self.mem.write8(top + 2 + j, c as i8);
                }
                self.mem.top += 2 + loc.len;
            }
            _ => {
                if !self.mem.has_room(1) {
                    return Err(error!(OutOfMemory));
                }
                self.mem.write8(top, self.token.code());
                self.mem.top += 1;
            }
        }
        Ok(())
    }

    /// Program byte access; in EEPROM-run mode reads come from the
    /// image, shifted past its header.
    pub(crate) fn memread(&self, i: Address) -> i8 {
        if self.st == State::Erun {
            self.eeprom.read(i + EHEADER_SIZE)
        } else {
            self.mem.read8(i)
        }
    }

    /// Reads the token at `here` and advances. Past `top` there is only
    /// end-of-line; stored lines have no explicit terminator.
    pub(crate) fn gettoken(&mut self) -> Result<()> {
        if self.here >= self.mem.top {
            self.token = Token::Eol;
            return Ok(());
        }
        let code = self.memread(self.here);
        self.here += 1;
        match code {
            token::LINENUMBER => {
                let n = if self.st == State::Erun {
                    self.eeprom.read_addr(self.here + EHEADER_SIZE)
                } else {
                    self.mem.read_addr(self.here)
                };
                self.here += ADDR_SIZE;
                self.token = Token::LineNumber(n);
            }
            token::NUMBER => {
                let v = if self.st == State::Erun {
                    self.eeprom.read_num(self.here + EHEADER_SIZE)
                } else {
                    self.mem.read_num(self.here)
                };
                self.here += NUM_SIZE;
                self.token = Token::Number(v);
            }
            token::VARIABLE | token::ARRAYVAR | token::STRINGVAR => {
                let n1 = self.memread(self.here) as u8;
                let n2 = self.memread(self.here + 1) as u8;
                self.here += 2;
                let name = Name(n1, n2);
                self.token = match code {
                    token::VARIABLE => Token::Variable(name),
                    token::ARRAYVAR => Token::ArrayVar(name),
                    _ => Token::StringVar(name),
                };
            }
            token::STRING => {
                let len = self.memread(self.here) as u8 as Address;
                self.here += 1;
                let src = if self.st == State::Erun {
                    StrSource::Eeprom
                } else {
                    StrSource::Mem
                };
                self.token = Token::Str(StrLoc {
                    src,
                    addr: self.here,
                    len,
                });
                self.here += len;
            }
            token::GREATEREQUAL => self.token = Token::GreaterEqual,
            token::LESSEREQUAL => self.token = Token::LesserEqual,
            token::NOTEQUAL => self.token = Token::NotEqual,
            token::EOL => self.token = Token::Eol,
            code if code > 31 => self.token = Token::Char(code as u8),
            code => match Word::from_code(code) {
                Some(w) => self.token = Token::Word(w),
                None => self.token = Token::Unknown,
            },
        }
        Ok(())
    }

    /// First line's number, 0 for an empty program. Leaves `here` at
    /// the line body; `nextline` continues the walk.
    pub fn firstline(&mut self) -> Result<Address> {
        if self.mem.top == 0 {
            return Ok(0);
        }
        self.here = 0;
        self.gettoken()?;
        match self.token {
            Token::LineNumber(n) => Ok(n),
            _ => Ok(0),
        }
    }

    /// Scans forward to the next line header; returns its number, or 0
    /// with `here` at `top` when there is none.
    pub fn nextline(&mut self) -> Result<Address> {
        while self.here < self.mem.top {
            self.gettoken()?;
            if let Token::LineNumber(n) = self.token {
                return Ok(n);
            }
            if self.here >= self.mem.top {
                self.here = self.mem.top;
                return Ok(0);
            }
        }
        Ok(0)
    }

    /// Positions `here` just past the header of line `l`.
    pub(crate) fn findline(&mut self, l: Address) -> Result<()> {
        self.here = 0;
        while self.here < self.mem.top {
            self.gettoken()?;
            if self.token == Token::LineNumber(l) {
                return Ok(());
            }
        }
        Err(error!(LineUnknown))
    }

    /// The number of the line containing address `h`, for error
    /// reports. Preserves the cursor and look-ahead.
    pub(crate) fn myline(&mut self, h: Address) -> Address {
        let saved = self.tell();
        let mut l: Address = 0;
        let mut l1: Address = 0;
        self.here = 0;
        let _ = self.gettoken();
        while self.here < self.mem.top {
            if let Token::LineNumber(n) = self.token {
                l1 = l;
                l = n;
            }
            if self.here >= h {
                break;
            }
            let _ = self.gettoken();
        }
        let at_header = matches!(self.token, Token::LineNumber(_));
        self.seek(saved);
        if at_header {
            l1
        } else {
            l
        }
    }

    /// The line editor. The new line is first tokenized onto the top of
    /// the store, then woven into place:
    ///
    /// 1. append at `top`, rolling back if tokenization fails;
    /// 2. a bare line number deletes the line it names;
    /// 3. otherwise find the first line with a number not below the new
    ///    one and replace or insert, shifting the tail as needed;
    /// 4. the appended copy always ends up removed from the top.
    pub(crate) fn storeline(&mut self) -> Result<()> {
        let number = match self.token {
            Token::Number(n) if n > 0 && n <= MAX_ADDR as i32 => n as Address,
            _ => return Err(error!(LineUnknown)),
        };
        debug!("storeline {}", number);

        // stage 1: append the tokenized line at top
        self.here = self.mem.top;
        let newline = self.here;
        self.token = Token::LineNumber(number);
        loop {
            if let Err(e) = self.storetoken() {
                self.mem.top = newline;
                self.here = 0;
                return Err(e);
            }
            self.nexttoken()?;
            if self.token == Token::Eol {
                break;
            }
        }
        let linelength = self.mem.top - newline;

        // stage 2: a naked line number deletes that line
        if linelength == LN_LENGTH {
            self.mem.top -= LN_LENGTH;
            self.findline(number)?;
            let start = self.here - LN_LENGTH;
            let next = self.nextline()?;
            if next != 0 {
                let from = self.here - LN_LENGTH;
                self.mem.moveblock(from, self.mem.top - from, start)?;
                self.mem.top -= from - start;
            } else {
                self.mem.top = start;
            }
            return Ok(());
        }

        // stage 3: if the appended line is the only line, it is already
        // in place
        self.here = LN_LENGTH;
        if self.nextline()? == 0 {
            return Ok(());
        }

        // walk the lines, appended copy included, for the first number
        // above the new one
        self.here = 0;
        let mut here2: Address = 0;
        let mut here3: Address = 0;
        let mut found: Address = 0;
        while self.here < self.mem.top {
            here3 = here2;
            here2 = self.here;
            found = self.nextline()?;
            if found > number {
                break;
            }
        }

        if found == 0 {
            // every line is below the new number, so the appended copy
            // already sits where it belongs; unless the last real line
            // carries the same number and has to be replaced
            self.here = here3 - LN_LENGTH;
            self.gettoken()?;
            if self.token == Token::LineNumber(number) {
                let src = here2 - LN_LENGTH;
                let dst = self.here - LN_LENGTH;
                self.mem.moveblock(src, linelength, dst)?;
                self.mem.top = dst + linelength;
            }
            return Ok(());
        }

        let next_start = self.here - LN_LENGTH;
        if here2 > 0 {
            let prev_start = here2 - LN_LENGTH;
            self.here = prev_start;
            self.gettoken()?;
            if self.token == Token::LineNumber(number) {
                return self.replace_line(newline, prev_start, next_start, linelength);
            }
        }
        self.insert_line(newline, next_start, linelength)
    }

    /// Replaces the line at `old_start`..`old_end` with the appended
    /// copy of `linelength` bytes waiting at the top of the store.
    fn replace_line(
        &mut self,
        newline: Address,
        old_start: Address,
        old_end: Address,
        linelength: Address,
    ) -> Result<()> {
        let old_length = old_end - old_start;
        if linelength == old_length {
            self.mem
                .moveblock(self.mem.top - linelength, linelength, old_start)?;
            self.mem.top -= linelength;
        } else if linelength > old_length {
            let grow = linelength - old_length;
            if let Err(e) = self
                .mem
                .moveblock(old_end, self.mem.top - old_end, old_end + grow)
            {
                self.mem.top = newline;
                return Err(e);
            }
            self.mem.top += grow;
            self.mem
                .moveblock(self.mem.top - linelength, linelength, old_start)?;
            self.mem.top -= linelength;
        } else {
            self.mem
                .moveblock(self.mem.top - linelength, linelength, old_start)?;
            self.mem.top -= linelength;
            let shrink = old_length - linelength;
            self.mem
                .moveblock(old_end, self.mem.top - old_end, old_start + linelength)?;
            self.mem.top -= shrink;
        }
        Ok(())
    }

    /// Opens a hole at `at` and drops the appended copy into it. The
    /// total byte count does not change: the copy stops living at the
    /// top and starts living at `at`.
    fn insert_line(&mut self, newline: Address, at: Address, linelength: Address) -> Result<()> {
        let top = self.mem.top;
        if let Err(e) = self.mem.moveblock(at, top - at, at + linelength) {
            self.mem.top = newline;
            return Err(e);
        }
        self.mem.moveblock(top, linelength, at)?;
        Ok(())
    }
}
