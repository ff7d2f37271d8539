use log::trace;

use super::runtime::{Runtime, State};
use crate::lang::{Address, Error, Name, Number, StrLoc, StrSource, Token, BUF_SIZE, KEYWORDS};

type Result<T> = std::result::Result<T, Error>;

/// A snapshot of the token stream position, both modes. Restoring one
/// is the single-token rewind string comparison needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor {
    bi: usize,
    here: Address,
    token: Token,
}

/// Unsigned digit run at the head of `bytes`; returns the value and
/// how many bytes it consumed. Overflow wraps like the 8-bit original.
pub(crate) fn parse_number(bytes: &[u8]) -> (Number, usize) {
    let mut val: Number = 0;
    let mut nd = 0;
    for b in bytes {
        if !b.is_ascii_digit() {
            break;
        }
        val = val.wrapping_mul(10).wrapping_add((b - b'0') as Number);
        nd += 1;
    }
    (val, nd)
}

/// The tokenizer. One cursor, two sources: in interactive mode it lexes
/// the input buffer character by character; in run mode it reads back
/// the tagged bytes the editor stored. Both feed the same one-token
/// look-ahead in `self.token`.
impl Runtime {
    pub(crate) fn tell(&self) -> Cursor {
        Cursor {
            bi: self.bi,
            here: self.here,
            token: self.token,
        }
    }

    pub(crate) fn seek(&mut self, cursor: Cursor) {
        self.bi = cursor.bi;
        self.here = cursor.here;
        self.token = cursor.token;
    }

    fn skip_whitespace(&mut self) {
        while self.ibuffer[self.bi] == b' ' || self.ibuffer[self.bi] == b'\t' {
            self.bi += 1;
        }
    }

    pub(crate) fn nexttoken(&mut self) -> Result<()> {
        if self.st != State::Int {
            return self.gettoken();
        }

        // byte 0 of the buffer is its length, not input
        if self.bi == 0 {
            self.bi = 1;
        }
        self.skip_whitespace();

        let c = self.ibuffer[self.bi];

        if c == 0 {
            self.token = Token::Eol;
            return Ok(());
        }

        // unsigned number literal
        if c.is_ascii_digit() {
            let (val, nd) = parse_number(&self.ibuffer[self.bi..]);
            self.bi += nd;
            self.token = Token::Number(val);
            trace!("token {:?}", self.token);
            return Ok(());
        }

        // string literal, closed by a quote or the end of the buffer
        if c == b'"' {
            self.bi += 1;
            let start = self.bi;
            while self.ibuffer[self.bi] != b'"' && self.ibuffer[self.bi] != 0 {
                self.bi += 1;
            }
            let len = (self.bi - start) as Address;
            self.bi = (self.bi + 1).min(BUF_SIZE - 1);
            self.token = Token::Str(StrLoc {
                src: StrSource::Buffer,
                addr: start as Address,
                len,
            });
            return Ok(());
        }

        // single-character operators are their own tokens
        if b"+-*/%\\:,()".contains(&c) {
            self.bi += 1;
            self.token = Token::Char(c);
            return Ok(());
        }

        // relations, including the two-character forms
        if c == b'=' {
            self.bi += 1;
            self.skip_whitespace();
            match self.ibuffer[self.bi] {
                b'>' => {
                    self.bi += 1;
                    self.token = Token::GreaterEqual;
                }
                b'<' => {
                    self.bi += 1;
                    self.token = Token::LesserEqual;
                }
                _ => self.token = Token::Char(b'='),
            }
            return Ok(());
        }
        if c == b'>' {
            self.bi += 1;
            self.skip_whitespace();
            if self.ibuffer[self.bi] == b'=' {
                self.bi += 1;
                self.token = Token::GreaterEqual;
            } else {
                self.token = Token::Char(b'>');
            }
            return Ok(());
        }
        if c == b'<' {
            self.bi += 1;
            self.skip_whitespace();
            match self.ibuffer[self.bi] {
                b'=' => {
                    self.bi += 1;
                    self.token = Token::LesserEqual;
                }
                b'>' => {
                    self.bi += 1;
                    self.token = Token::NotEqual;
                }
                _ => self.token = Token::Char(b'<'),
            }
            return Ok(());
        }

        // isolate a word, uppercasing it in place; @ counts as a letter
        // so the pseudo variables lex like everything else
        let mut x = 0;
        loop {
            let p = self.bi + x;
            if p >= BUF_SIZE {
                break;
            }
            let w = self.ibuffer[p];
            if w.is_ascii_lowercase() {
                self.ibuffer[p] = w - 32;
                x += 1;
            } else if (b'@'..=b'Z').contains(&w) {
                x += 1;
            } else {
                break;
            }
        }

        // keywords first, in table order, by prefix match; the match
        // only holds if the next character is not a letter, so TOTAL
        // does not lex as TO
        for (text, word) in KEYWORDS.iter() {
            let text = text.as_bytes();
            if self.bi + text.len() >= BUF_SIZE {
                continue;
            }
            if &self.ibuffer[self.bi..self.bi + text.len()] != text {
                continue;
            }
            self.bi += text.len();
            if self.ibuffer[self.bi].is_ascii_uppercase() {
                self.token = Token::Unknown;
            } else {
                self.token = Token::Word(*word);
            }
            trace!("token {:?}", self.token);
            return Ok(());
        }

        // variables: one letter, letter+digit, or @ plus one letter;
        // a $ suffix makes a string, a following ( an array
        if x == 1 || (x == 2 && c == b'@') {
            let n1 = self.ibuffer[self.bi];
            self.bi += 1;
            let mut n2 = 0;
            if self.ibuffer[self.bi].is_ascii_digit() {
                n2 = self.ibuffer[self.bi];
                self.bi += 1;
            }
            if n1 == b'@' && x == 2 {
                n2 = self.ibuffer[self.bi];
                self.bi += 1;
            }
            let name = Name(n1, n2);
            if self.ibuffer[self.bi] == b'$' {
                self.bi += 1;
                self.token = Token::StringVar(name);
                return Ok(());
            }
            self.skip_whitespace();
            if self.ibuffer[self.bi] == b'(' {
                self.token = Token::ArrayVar(name);
            } else {
                self.token = Token::Variable(name);
            }
            return Ok(());
        }

        // anything left is passed through as itself
        self.bi += 1;
        self.token = Token::Char(c);
        Ok(())
    }
}
