use super::heap::ObjKind;
use super::lexer::parse_number;
use super::runtime::{Runtime, State};
use super::vars::StrRef;
use crate::error;
use crate::lang::{Address, Error, Name, Number, StrLoc, StrSource, Token, Word};
use crate::lang::{
    ADDR_SIZE, BUF_SIZE, FOR_DEPTH, GOSUB_DEPTH, MAX_ADDR, MAX_NUM, NUM_SIZE, SBUF_SIZE,
    STACK_SIZE, STR_INDEX_SIZE,
};

type Result<T> = std::result::Result<T, Error>;

/// The expression evaluator: recursive descent over the token stream,
/// loosest production first. Operands travel over the evaluation
/// stack; every production pops what it needs and pushes one result.
///
/// Token discipline: each production is entered with `token` holding
/// its first token and leaves `token` one past its last, except
/// `factor`, which stays on its last token and lets the caller step.
impl Runtime {
    pub(crate) fn push(&mut self, val: Number) -> Result<()> {
        self.stack.push(val)
    }

    pub(crate) fn pop(&mut self) -> Result<Number> {
        self.stack.pop()
    }

    /// A comma list of expressions, ended by a statement terminator.
    /// Leaves the values on the stack and returns how many.
    pub(crate) fn parsearguments(&mut self) -> Result<u8> {
        let mut args = 0;
        if self.token.is_termsymbol() {
            return Ok(args);
        }
        loop {
            self.expression()?;
            args += 1;
            if self.token == Token::Char(b',') {
                self.nexttoken()?;
            } else {
                return Ok(args);
            }
        }
    }

    pub(crate) fn parsenarguments(&mut self, n: u8) -> Result<()> {
        if self.parsearguments()? == n {
            Ok(())
        } else {
            Err(error!(Args))
        }
    }

    /// A parenthesised argument list; no parenthesis means no
    /// arguments. Leaves `token` on the closing parenthesis.
    pub(crate) fn parsesubscripts(&mut self) -> Result<u8> {
        if self.token != Token::Char(b'(') {
            return Ok(0);
        }
        self.nexttoken()?;
        let args = self.parsearguments()?;
        if self.token != Token::Char(b')') {
            return Err(error!(Args));
        }
        Ok(args)
    }

    /// Fixed-arity builtin: parenthesised arguments, then the
    /// operation on the stack.
    fn parsefunction(&mut self, f: fn(&mut Runtime) -> Result<()>, arity: u8) -> Result<()> {
        self.nexttoken()?;
        let args = self.parsesubscripts()?;
        if args != arity {
            return Err(error!(Args));
        }
        f(self)
    }

    /// Steps past an infix operator, evaluates the right side with
    /// `f`, and hands back both operands.
    fn parseoperator(&mut self, f: fn(&mut Runtime) -> Result<()>) -> Result<(Number, Number)> {
        self.nexttoken()?;
        f(self)?;
        let y = self.pop()?;
        let x = self.pop()?;
        Ok((x, y))
    }

    /// Substring selection behind a string variable: none, `(start)`,
    /// or `(start, end)`. Returns 1-based start and end. With no
    /// subscripts the stream is rewound so the variable stays the last
    /// token of the factor.
    fn parsesubstring(&mut self, name: Name) -> Result<(Number, Number)> {
        let mark = self.tell();
        self.nexttoken()?;
        let args = self.parsesubscripts()?;
        match args {
            2 => {
                let y = self.pop()?;
                let x = self.pop()?;
                Ok((x, y))
            }
            1 => {
                let x = self.pop()?;
                let y = self.lenstring(name)? as Number;
                Ok((x, y))
            }
            0 => {
                self.seek(mark);
                let y = self.lenstring(name)? as Number;
                Ok((1, y))
            }
            _ => Err(error!(Args)),
        }
    }

    /// Recognises a string value at the current token: a literal or a
    /// string variable with optional substring. Returns its location,
    /// or None if the token is not string-valued.
    pub(crate) fn stringvalue(&mut self) -> Result<Option<StrLoc>> {
        match self.token {
            Token::Str(loc) => Ok(Some(loc)),
            Token::StringVar(name) => {
                let (x, y) = self.parsesubstring(name)?;
                if x < 1 {
                    return Err(error!(Range));
                }
                if y > self.stringdim(name)? as Number {
                    return Err(error!(Range));
                }
                let r = self.getstring(name, x as Address)?;
                let len = if y >= x { (y - x + 1) as Address } else { 0 };
                let loc = match r {
                    StrRef::Mem(a) => StrLoc {
                        src: StrSource::Mem,
                        addr: a,
                        len,
                    },
                    StrRef::Buffer(o) => StrLoc {
                        src: StrSource::Buffer,
                        addr: o as Address,
                        len,
                    },
                };
                Ok(Some(loc))
            }
            _ => Ok(None),
        }
    }

    /// A string where a number is wanted. If `=` or `<>` follows, this
    /// is a string comparison and 0/1 is pushed; otherwise the stream
    /// is rewound one token and the string collapses to its first
    /// character's code, or 0 when empty.
    fn streval(&mut self) -> Result<()> {
        let left = match self.stringvalue()? {
            Some(loc) => loc,
            None => return Err(error!(Unknown)),
        };
        let mark = self.tell();
        self.nexttoken()?;
        let op = self.token;
        if op != Token::Char(b'=') && op != Token::NotEqual {
            self.seek(mark);
            let v = if left.len == 0 {
                0
            } else {
                self.lit_read(left, 0) as Number
            };
            return self.push(v);
        }
        self.nexttoken()?;
        let right = match self.stringvalue()? {
            Some(loc) => loc,
            None => return Err(error!(Unknown)),
        };
        let mut eq = left.len == right.len;
        if eq {
            for j in 0..left.len as usize {
                if self.lit_read(left, j) != self.lit_read(right, j) {
                    eq = false;
                    break;
                }
            }
        }
        let wanted = op == Token::Char(b'=');
        self.push((eq == wanted) as Number)
    }

    /// The tightest production. Leaves `token` on its own last token.
    fn factor(&mut self) -> Result<()> {
        match self.token {
            Token::Number(n) => self.push(n),
            Token::Variable(name) => {
                let v = self.getvar(name)?;
                self.push(v)
            }
            Token::ArrayVar(name) => {
                self.nexttoken()?;
                if self.parsesubscripts()? != 1 {
                    return Err(error!(Args));
                }
                let i = self.pop()?;
                let v = self.array_get(name, i)?;
                self.push(v)
            }
            Token::Char(b'(') => {
                self.nexttoken()?;
                self.expression()?;
                if self.token != Token::Char(b')') {
                    return Err(error!(Args));
                }
                Ok(())
            }
            Token::Str(_) | Token::StringVar(_) => self.streval(),
            Token::Word(w) => match w {
                Word::Abs => self.parsefunction(Runtime::fn_abs, 1),
                Word::Rnd => self.parsefunction(Runtime::fn_rnd, 1),
                Word::Sgn => self.parsefunction(Runtime::fn_sgn, 1),
                Word::Peek => self.parsefunction(Runtime::fn_peek, 1),
                Word::Sqr => self.parsefunction(Runtime::fn_sqr, 1),
                Word::Fre => self.parsefunction(Runtime::fn_fre, 1),
                Word::Usr => self.parsefunction(Runtime::fn_usr, 2),
                Word::Aread => self.parsefunction(Runtime::fn_aread, 1),
                Word::Dread => self.parsefunction(Runtime::fn_dread, 1),
                Word::Millis => self.parsefunction(Runtime::fn_millis, 1),
                Word::Pulsein => self.parsefunction(Runtime::fn_pulsein, 3),
                Word::Azero => self.push(0),
                Word::Size => {
                    let free = self.mem.free();
                    self.push(free as Number)
                }
                Word::Lomem => self.push(0),
                Word::Himem => self.push(self.mem.himem as Number),
                Word::Len => self.fn_len(),
                _ => Err(error!(Unknown)),
            },
            _ => Err(error!(Unknown)),
        }
    }

    fn term(&mut self) -> Result<()> {
        self.factor()?;
        loop {
            self.nexttoken()?;
            match self.token {
                Token::Char(b'*') => {
                    let (x, y) = self.parseoperator(Runtime::factor)?;
                    self.push(x.wrapping_mul(y))?;
                }
                Token::Char(b'/') => {
                    let (x, y) = self.parseoperator(Runtime::factor)?;
                    if y == 0 {
                        return Err(error!(DivByZero));
                    }
                    self.push(x.wrapping_div(y))?;
                }
                Token::Char(b'%') => {
                    let (x, y) = self.parseoperator(Runtime::factor)?;
                    if y == 0 {
                        return Err(error!(DivByZero));
                    }
                    self.push(x.wrapping_rem(y))?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn addexpression(&mut self) -> Result<()> {
        if self.token == Token::Char(b'+') || self.token == Token::Char(b'-') {
            // unary sign: fold against a zero left operand
            self.push(0)?;
        } else {
            self.term()?;
        }
        loop {
            match self.token {
                Token::Char(b'+') => {
                    let (x, y) = self.parseoperator(Runtime::term)?;
                    self.push(x.wrapping_add(y))?;
                }
                Token::Char(b'-') => {
                    let (x, y) = self.parseoperator(Runtime::term)?;
                    self.push(x.wrapping_sub(y))?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn compexpression(&mut self) -> Result<()> {
        self.addexpression()?;
        let op = self.token;
        let res = match op {
            Token::Char(b'=') => {
                let (x, y) = self.parseoperator(Runtime::addexpression)?;
                x == y
            }
            Token::NotEqual => {
                let (x, y) = self.parseoperator(Runtime::addexpression)?;
                x != y
            }
            Token::Char(b'>') => {
                let (x, y) = self.parseoperator(Runtime::addexpression)?;
                x > y
            }
            Token::Char(b'<') => {
                let (x, y) = self.parseoperator(Runtime::addexpression)?;
                x < y
            }
            Token::LesserEqual => {
                let (x, y) = self.parseoperator(Runtime::addexpression)?;
                x <= y
            }
            Token::GreaterEqual => {
                let (x, y) = self.parseoperator(Runtime::addexpression)?;
                x >= y
            }
            _ => return Ok(()),
        };
        self.push(res as Number)
    }

    fn notexpression(&mut self) -> Result<()> {
        if self.token == Token::Word(Word::Not) {
            self.nexttoken()?;
            self.compexpression()?;
            let x = self.pop()?;
            self.push((x == 0) as Number)
        } else {
            self.compexpression()
        }
    }

    fn andexpression(&mut self) -> Result<()> {
        self.notexpression()?;
        while self.token == Token::Word(Word::And) {
            let (x, y) = self.parseoperator(Runtime::notexpression)?;
            self.push((x != 0 && y != 0) as Number)?;
        }
        Ok(())
    }

    pub(crate) fn expression(&mut self) -> Result<()> {
        self.andexpression()?;
        while self.token == Token::Word(Word::Or) {
            let (x, y) = self.parseoperator(Runtime::andexpression)?;
            self.push((x != 0 || y != 0) as Number)?;
        }
        Ok(())
    }

    // the builtins

    fn fn_abs(&mut self) -> Result<()> {
        let x = self.pop()?;
        self.push(x.wrapping_abs())
    }

    fn fn_sgn(&mut self) -> Result<()> {
        let x = self.pop()?;
        self.push(x.signum())
    }

    /// Positive addresses read the byte store, negative ones the
    /// EEPROM image at `-a-1`.
    fn fn_peek(&mut self) -> Result<()> {
        let a = self.pop()?;
        if a >= 0 && (a as u32) < self.mem.memsize() as u32 {
            let v = self.mem.read8(a as Address) as Number;
            self.push(v)
        } else if a < 0 && -a < self.eeprom.len() as Number {
            let v = self.eeprom.read((-a - 1) as Address) as Number;
            self.push(v)
        } else {
            Err(error!(Range))
        }
    }

    fn fn_fre(&mut self) -> Result<()> {
        let a = self.pop()?;
        let v = if a >= 0 {
            self.mem.free() as Number
        } else {
            self.eeprom.len() as Number
        };
        self.push(v)
    }

    /// The 16-bit LCG: `r <- 31421*r + 6927 mod 2^16`; scaled into
    /// `0..arg` for positive arguments.
    fn fn_rnd(&mut self) -> Result<()> {
        let r = self.pop()?;
        self.rd = self.rd.wrapping_mul(31421).wrapping_add(6927);
        let v = ((self.rd as i64 * r as i64) / 0x10000) as Number;
        self.push(if r >= 0 { v } else { v + 1 })
    }

    /// Integer square root, Newton style.
    fn fn_sqr(&mut self) -> Result<()> {
        let r = self.pop()?;
        if r <= 0 {
            return self.push(0);
        }
        let mut bits = 0;
        let mut t = r;
        while t > 0 {
            t >>= 1;
            bits += 1;
        }
        t = 1 << (bits / 2);
        loop {
            let l = t;
            t = (t + r / t) / 2;
            if (t - l).abs() <= 1 {
                break;
            }
        }
        self.push(t)
    }

    fn fn_aread(&mut self) -> Result<()> {
        let _pin = self.pop()?;
        self.push(0)
    }

    fn fn_dread(&mut self) -> Result<()> {
        let _pin = self.pop()?;
        self.push(0)
    }

    fn fn_millis(&mut self) -> Result<()> {
        let d = self.pop()?;
        if d == 0 {
            return Err(error!(DivByZero));
        }
        let m = self.millis();
        self.push(m / d)
    }

    fn fn_pulsein(&mut self) -> Result<()> {
        let _timeout = self.pop()?;
        let _level = self.pop()?;
        let _pin = self.pop()?;
        self.push(0)
    }

    /// `LEN(<string value>)`.
    fn fn_len(&mut self) -> Result<()> {
        self.nexttoken()?;
        if self.token != Token::Char(b'(') {
            return Err(error!(Args));
        }
        self.nexttoken()?;
        let loc = match self.stringvalue()? {
            Some(loc) => loc,
            None => return Err(error!(Unknown)),
        };
        self.nexttoken()?;
        if self.token != Token::Char(b')') {
            return Err(error!(Args));
        }
        self.push(loc.len as Number)
    }

    /// `USR(fn, arg)` pokes at the interpreter itself: build constants,
    /// live registers, stream selections, raw heap access through
    /// names placed in the input buffer, and the number formatter.
    fn fn_usr(&mut self) -> Result<()> {
        let arg = self.pop()?;
        let f = self.pop()?;
        let v = match f {
            0 => match arg {
                0 => NUM_SIZE as Number,
                1 => MAX_NUM,
                2 => ADDR_SIZE as Number,
                3 => MAX_ADDR as Number,
                4 => STR_INDEX_SIZE as Number,
                5 => self.mem.memsize() as Number + 1,
                6 => self.eeprom.len() as Number,
                7 => GOSUB_DEPTH as Number,
                8 => FOR_DEPTH as Number,
                9 => STACK_SIZE as Number,
                10 => BUF_SIZE as Number,
                11 => SBUF_SIZE as Number,
                _ => 0,
            },
            1 => match arg {
                0 => self.mem.top as Number,
                1 => self.here as Number,
                2 => self.mem.himem as Number,
                3 => self.mem.nvars as Number,
                7 => self.gosubstack.len() as Number,
                8 => self.forstack.len() as Number,
                9 => self.stack.len() as Number,
                _ => 0,
            },
            2 => match arg {
                0 => self.id as Number,
                1 => self.idd as Number,
                2 => self.od as Number,
                3 => self.odd as Number,
                _ => 0,
            },
            3 => match self.buffer_object() {
                Some((kind, name)) => {
                    self.mem.bfind(kind, name).unwrap_or(0) as Number
                }
                None => 0,
            },
            4 => match self.buffer_object() {
                Some((kind, name)) => self.mem.bmalloc(kind, name, arg as Address)? as Number,
                None => 0,
            },
            5 => match self.buffer_object() {
                Some((kind, name)) => self.mem.blength(kind, name) as Number,
                None => 0,
            },
            6 => parse_number(&self.ibuffer[1..]).0,
            7 => {
                let s = arg.to_string();
                self.set_buffer(&s);
                s.len() as Number
            }
            8 => {
                let saved_st = self.st;
                let saved_here = self.here;
                self.st = State::Int;
                let n = self.ibuffer[0] as usize;
                self.ibuffer[n + 1] = 0;
                self.bi = 1;
                self.token = Token::Number(arg);
                let res = self.storeline();
                self.here = saved_here;
                self.st = saved_st;
                res?;
                0
            }
            _ => 0,
        };
        self.push(v)
    }

    /// Heap object named in the input buffer, for the USR heap calls:
    /// byte 1 is the type tag, bytes 2 and 3 the name.
    fn buffer_object(&self) -> Option<(ObjKind, Name)> {
        let kind = match self.ibuffer[1] as i8 {
            crate::lang::token::VARIABLE => ObjKind::Scalar,
            crate::lang::token::ARRAYVAR => ObjKind::Array,
            crate::lang::token::STRINGVAR => ObjKind::String,
            _ => return None,
        };
        Some((kind, Name(self.ibuffer[2], self.ibuffer[3])))
    }
}
