use std::io::Read;

use log::debug;

use super::runtime::{Runtime, State};
use super::stack::ForSlot;
use crate::error;
use crate::io::{I_FILE, I_KEYBOARD, I_SERIAL, O_DSP, O_FILE, O_SERIAL};
use crate::lang::{Address, Error, ErrorCode, Name, Number, Token, Word};
use crate::lang::{BREAK_CHAR, EHEADER_SIZE, MAX_ADDR, SBUF_SIZE};

type Result<T> = std::result::Result<T, Error>;

/// A resolved assignment target: the start position inside a string
/// (1 for scalars and whole strings), whether the target is a whole
/// string, and the optional end bound of a two-subscript string slice.
struct Lhs {
    i: Number,
    pure: bool,
    end: Option<Number>,
}

/// The statement executor: a flat dispatch on the first token of each
/// statement. Every statement routine leaves the loop a fresh token,
/// except the ones that invalidate the token stream (LOAD, NEW, RUN,
/// END/STOP) and therefore return out of the dispatch loop.
impl Runtime {
    /// Executes statements until the end of the input line or, in run
    /// mode, the end of the program.
    pub(crate) fn statement(&mut self) -> Result<()> {
        while self.token != Token::Eol {
            debug!("statement at {:?}", self.token);
            match self.token {
                Token::LineNumber(_) => self.nexttoken()?,
                Token::Word(Word::Print) => self.x_print()?,
                Token::Word(Word::Let) => {
                    self.nexttoken()?;
                    match self.token {
                        Token::Variable(_) | Token::ArrayVar(_) | Token::StringVar(_) => {
                            self.assignment()?
                        }
                        _ => return Err(error!(Unknown)),
                    }
                }
                Token::Variable(_) | Token::ArrayVar(_) | Token::StringVar(_) => {
                    self.assignment()?
                }
                Token::Word(Word::Input) => self.x_input()?,
                Token::Word(Word::Return) => self.x_return()?,
                Token::Word(Word::Goto) | Token::Word(Word::Gosub) => self.x_goto()?,
                Token::Word(Word::If) => self.x_if()?,
                Token::Word(Word::For) => self.x_for()?,
                Token::Word(Word::Next) => self.x_next()?,
                Token::Word(Word::Break) => self.x_break()?,
                Token::Word(Word::Stop) | Token::Word(Word::End) => {
                    // new input is needed, the token stream is dead
                    self.ibuffer[0] = 0;
                    self.st = State::Int;
                    return Ok(());
                }
                Token::Word(Word::List) => self.x_list()?,
                Token::Word(Word::New) => {
                    self.x_new()?;
                    return Ok(());
                }
                Token::Word(Word::Run) | Token::Word(Word::Cont) => return self.x_run(),
                Token::Word(Word::Rem) => self.x_rem()?,
                Token::Word(Word::Dim) => self.x_dim()?,
                Token::Word(Word::Clr) => self.x_clr()?,
                Token::Word(Word::Tab) => self.x_tab()?,
                Token::Word(Word::Poke) => self.x_poke()?,
                Token::Word(Word::Dump) => self.x_dump()?,
                Token::Word(Word::Save) => self.x_save()?,
                Token::Word(Word::Load) => {
                    // load clobbers the input buffer, the line is over
                    self.x_load()?;
                    return Ok(());
                }
                Token::Word(Word::Get) => self.x_get()?,
                Token::Word(Word::Put) => self.x_put()?,
                Token::Word(Word::Set) => self.x_set()?,
                Token::Word(Word::Cls) => {
                    self.console.clear();
                    self.nexttoken()?;
                }
                Token::Word(Word::Dwrite) => self.x_dwrite()?,
                Token::Word(Word::Awrite) => self.x_awrite()?,
                Token::Word(Word::Pinm) => self.x_pinm()?,
                Token::Word(Word::Delay) => self.x_delay()?,
                Token::Word(Word::Atone) => self.x_tone()?,
                Token::Word(Word::Catalog) => self.x_catalog()?,
                Token::Word(Word::Delete) => self.x_delete()?,
                Token::Word(Word::Open) => self.x_open()?,
                Token::Word(Word::Close) => self.x_close()?,
                Token::Word(Word::Call) => self.nexttoken()?,
                Token::Unknown => return Err(error!(Unknown)),
                Token::Char(b':') => self.nexttoken()?,
                // tolerant: stray tokens are skipped
                _ => self.nexttoken()?,
            }
            // the break character stops a running program cleanly
            if self.st != State::Int && self.checkch() == Some(BREAK_CHAR) {
                let _ = self.inch();
                self.st = State::Int;
                return Ok(());
            }
        }
        Ok(())
    }

    /// The run loop: statements until the program ends, an error is
    /// raised, or a statement drops back to interactive mode.
    pub(crate) fn exec_run(&mut self) -> Result<()> {
        while self.here < self.mem.top && (self.st == State::Run || self.st == State::Erun) {
            self.statement()?;
        }
        self.st = State::Int;
        Ok(())
    }

    /// PRINT: a comma/semicolon list of strings and expressions, with
    /// `#n` setting the field width and `&n` redirecting the output
    /// stream for the rest of the statement.
    fn x_print(&mut self) -> Result<()> {
        self.form = 0;
        let oldod = self.od;
        let mut semicolon = false;
        let mut modifier = false;
        self.nexttoken()?;
        loop {
            if self.token.is_termsymbol() {
                if !semicolon {
                    self.outcr();
                }
                self.nexttoken()?;
                self.od = oldod;
                return Ok(());
            }
            semicolon = false;
            if let Some(loc) = self.stringvalue()? {
                for j in 0..loc.len as usize {
                    let c = self.lit_read(loc, j);
                    self.outch(c);
                }
                self.nexttoken()?;
            } else if self.token == Token::Char(b'#') || self.token == Token::Char(b'&') {
                let which = self.token;
                self.nexttoken()?;
                self.expression()?;
                let v = self.pop()?;
                if which == Token::Char(b'#') {
                    self.form = v;
                } else {
                    self.od = v as u8;
                }
                modifier = true;
                continue;
            } else if self.token != Token::Char(b',') && self.token != Token::Char(b';') {
                self.expression()?;
                let v = self.pop()?;
                // numbers get a separating space unless a field width
                // is active or output sits at the start of a line
                if self.form == 0 && self.ocol != 0 && self.olast != b' ' {
                    self.outspc();
                }
                self.outnumber(v);
            }
            if self.token == Token::Char(b',') {
                if !modifier {
                    self.outspc();
                }
                self.nexttoken()?;
            }
            if self.token == Token::Char(b';') {
                semicolon = true;
                self.nexttoken()?;
            }
            modifier = false;
        }
    }

    /// The left side of an assignment or GET target. Consumes through
    /// the subscripts and one token beyond.
    fn lefthandside(&mut self, t: Token) -> Result<Lhs> {
        match t {
            Token::Variable(_) => {
                self.nexttoken()?;
                Ok(Lhs {
                    i: 1,
                    pure: true,
                    end: None,
                })
            }
            Token::ArrayVar(_) => {
                self.nexttoken()?;
                let args = self.parsesubscripts()?;
                self.nexttoken()?;
                if args != 1 {
                    return Err(error!(Args));
                }
                Ok(Lhs {
                    i: self.pop()?,
                    pure: false,
                    end: None,
                })
            }
            Token::StringVar(_) => {
                self.nexttoken()?;
                let args = self.parsesubscripts()?;
                match args {
                    0 => Ok(Lhs {
                        i: 1,
                        pure: true,
                        end: None,
                    }),
                    1 => {
                        self.nexttoken()?;
                        Ok(Lhs {
                            i: self.pop()?,
                            pure: false,
                            end: None,
                        })
                    }
                    2 => {
                        self.nexttoken()?;
                        let end = self.pop()?;
                        Ok(Lhs {
                            i: self.pop()?,
                            pure: false,
                            end: Some(end),
                        })
                    }
                    _ => Err(error!(Args)),
                }
            }
            _ => Err(error!(Unknown)),
        }
    }

    /// Stores a number into a resolved target. Assigning a number into
    /// a string position sets one character.
    fn assignnumber(&mut self, t: Token, i: Number, pure: bool, val: Number) -> Result<()> {
        match t {
            Token::Variable(name) => self.setvar(name, val),
            Token::ArrayVar(name) => self.array_set(name, i, val),
            Token::StringVar(name) => {
                if i < 1 {
                    return Err(error!(Range));
                }
                let r = self.getstring(name, i as Address)?;
                self.str_write(r, 0, val as u8);
                if pure {
                    self.setstringlength(name, 1)
                } else {
                    let len = self.lenstring(name)? as Number;
                    let dim = self.stringdim(name)? as Number;
                    if len < i && i < dim {
                        self.setstringlength(name, i as Address)
                    } else {
                        Ok(())
                    }
                }
            }
            _ => Ok(()),
        }
    }

    /// LET and bare assignments. The right side is a string value when
    /// the scanner sees one and the target is a string; otherwise a
    /// numeric expression.
    fn assignment(&mut self) -> Result<()> {
        let t = self.token;
        let lhs = self.lefthandside(t)?;
        if self.token != Token::Char(b'=') {
            return Err(error!(Unknown));
        }
        self.nexttoken()?;
        match t {
            Token::Variable(_) | Token::ArrayVar(_) => {
                self.expression()?;
                let v = self.pop()?;
                self.assignnumber(t, lhs.i, lhs.pure, v)?;
            }
            Token::StringVar(name) => match self.stringvalue()? {
                None => {
                    self.expression()?;
                    let v = self.pop()?;
                    self.assignnumber(t, lhs.i, lhs.pure, v)?;
                }
                Some(src) => {
                    let i = lhs.i;
                    if i < 1 {
                        return Err(error!(Range));
                    }
                    let mut n = src.len as Number;
                    if let Some(end) = lhs.end {
                        n = n.min((end - i + 1).max(0));
                    }
                    if i + n - 1 > self.stringdim(name)? as Number {
                        return Err(error!(Range));
                    }
                    let lendest = self.lenstring(name)? as Number;
                    let dst = self.getstring(name, i as Address)?;
                    self.str_copy(src, dst, n as usize);
                    let newlength = if self.extension {
                        // keep the tail beyond the stored slice
                        if i + n > lendest {
                            i + n - 1
                        } else {
                            lendest
                        }
                    } else {
                        // classic Apple 1 truncation
                        i + n - 1
                    };
                    self.setstringlength(name, newlength as Address)?;
                }
            },
            _ => return Err(error!(Unknown)),
        }
        self.nexttoken()
    }

    /// INPUT with optional `&stream`, prompt strings and a target
    /// list. The break character drops back to the prompt.
    fn x_input(&mut self) -> Result<()> {
        self.nexttoken()?;
        let mut oldid: Option<u8> = None;
        if self.token == Token::Char(b'&') {
            self.nexttoken()?;
            self.expression()?;
            oldid = Some(self.id);
            self.id = self.pop()? as u8;
            if self.token != Token::Char(b',') {
                return Err(error!(Unknown));
            }
            self.nexttoken()?;
        }
        loop {
            if let Token::Str(loc) = self.token {
                if self.id != I_FILE {
                    for j in 0..loc.len as usize {
                        let c = self.lit_read(loc, j);
                        self.outch(c);
                    }
                }
                self.nexttoken()?;
                if self.token != Token::Char(b',') && self.token != Token::Char(b';') {
                    return Err(error!(Unknown));
                }
                self.nexttoken()?;
            }
            match self.token {
                Token::Variable(name) => {
                    if self.id != I_FILE {
                        self.outs_str("? ");
                    }
                    match self.innumber() {
                        None => {
                            self.setvar(name, 0)?;
                            return self.input_break(oldid);
                        }
                        Some(v) => self.setvar(name, v)?,
                    }
                }
                Token::ArrayVar(name) => {
                    self.nexttoken()?;
                    if self.parsesubscripts()? != 1 {
                        return Err(error!(Args));
                    }
                    let index = self.pop()?;
                    if self.id != I_FILE {
                        self.outs_str("? ");
                    }
                    match self.innumber() {
                        None => {
                            self.array_set(name, index, 0)?;
                            return self.input_break(oldid);
                        }
                        Some(v) => self.array_set(name, index, v)?,
                    }
                }
                Token::StringVar(name) => {
                    if self.id != I_FILE {
                        self.outs_str("? ");
                    }
                    let line = self.read_line_raw();
                    let dim = self.stringdim(name)? as usize;
                    let n = line.len().min(dim);
                    let r = self.getstring(name, 1)?;
                    for (j, c) in line.as_bytes()[..n].iter().enumerate() {
                        self.str_write(r, j, *c);
                    }
                    self.setstringlength(name, n as Address)?;
                }
                _ => {}
            }
            self.nexttoken()?;
            if self.token == Token::Char(b',') || self.token == Token::Char(b';') {
                self.nexttoken()?;
                continue;
            }
            break;
        }
        if let Some(id) = oldid {
            self.id = id;
        }
        Ok(())
    }

    fn input_break(&mut self, oldid: Option<u8>) -> Result<()> {
        self.st = State::Int;
        self.nexttoken()?;
        if let Some(id) = oldid {
            self.id = id;
        }
        Ok(())
    }

    /// Reads and parses one number, prompting again on junk. None
    /// means the break character arrived.
    fn innumber(&mut self) -> Option<Number> {
        loop {
            let line = self.read_line_raw();
            let s = line.trim_start();
            if s.as_bytes().first() == Some(&BREAK_CHAR) {
                return None;
            }
            if s.is_empty() {
                return Some(0);
            }
            let (neg, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s),
            };
            if digits.as_bytes().first().map(|b| b.is_ascii_digit()) == Some(true) {
                let (v, _) = super::lexer::parse_number(digits.as_bytes());
                return Some(if neg { -v } else { v });
            }
            let msg = format!("{} Error", ErrorCode::Number);
            self.outs_str(&msg);
            self.outcr();
        }
    }

    /// GOTO and GOSUB; the target is an expression. GOSUB remembers
    /// where to come back to.
    fn x_goto(&mut self) -> Result<()> {
        let is_gosub = self.token == Token::Word(Word::Gosub);
        self.nexttoken()?;
        self.expression()?;
        if is_gosub {
            self.gosubstack.push(self.here)?;
        }
        let n = self.pop()?;
        if n < 1 || n > MAX_ADDR as Number {
            return Err(error!(LineUnknown));
        }
        self.findline(n as Address)?;
        if self.st == State::Int {
            self.st = State::Run;
        }
        self.nexttoken()
    }

    fn x_return(&mut self) -> Result<()> {
        self.here = self.gosubstack.pop()?;
        self.nexttoken()
    }

    /// IF: on false the rest of the line is skipped. THEN is optional;
    /// a bare number after THEN is an implicit GOTO.
    fn x_if(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.expression()?;
        let x = self.pop()?;
        if x == 0 {
            loop {
                self.nexttoken()?;
                if matches!(self.token, Token::LineNumber(_) | Token::Eol)
                    || self.here > self.mem.top
                {
                    break;
                }
            }
        }
        if self.token == Token::Word(Word::Then) {
            self.nexttoken()?;
            if let Token::Number(n) = self.token {
                if n < 1 || n > MAX_ADDR as Number {
                    return Err(error!(LineUnknown));
                }
                self.findline(n as Address)?;
            }
        }
        Ok(())
    }

    /// Scans forward for the NEXT that closes the current loop level,
    /// minding nested FORs.
    fn find_next(&mut self) -> Result<()> {
        let mut depth = 0;
        loop {
            if self.token == Token::Word(Word::Next) {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            if self.token == Token::Word(Word::For) {
                depth += 1;
            }
            if self.st == State::Int {
                if self.token == Token::Eol {
                    return Err(error!(For));
                }
            } else if self.here >= self.mem.top {
                return Err(error!(For));
            }
            self.nexttoken()?;
        }
    }

    /// Steps past a located NEXT and its optional loop variable.
    fn skip_next(&mut self) -> Result<()> {
        self.nexttoken()?;
        if let Token::Variable(_) = self.token {
            self.nexttoken()?;
        }
        Ok(())
    }

    /// FOR v = e1 TO e2 [STEP e3]. The slot captures the variable, the
    /// position of the loop body, the limit and the step; the entry
    /// test can skip the body entirely.
    fn x_for(&mut self) -> Result<()> {
        self.nexttoken()?;
        let name = match self.token {
            Token::Variable(n) => n,
            _ => return Err(error!(Unknown)),
        };
        self.nexttoken()?;
        if self.token != Token::Char(b'=') {
            return Err(error!(Unknown));
        }
        self.nexttoken()?;
        self.expression()?;
        let begin = self.pop()?;
        self.setvar(name, begin)?;
        if self.token != Token::Word(Word::To) {
            return Err(error!(Unknown));
        }
        self.nexttoken()?;
        self.expression()?;
        let step = if self.token == Token::Word(Word::Step) {
            self.nexttoken()?;
            self.expression()?;
            self.pop()?
        } else {
            1
        };
        if !self.token.is_termsymbol() {
            return Err(error!(Unknown));
        }
        let to = self.pop()?;
        let here = if self.st == State::Int {
            self.bi as Address
        } else {
            self.here
        };
        self.forstack.push(ForSlot {
            var: name,
            here,
            to,
            step,
        })?;
        // entry test; STEP 0 loops forever on purpose
        let v = self.getvar(name)?;
        if (step > 0 && v > to) || (step < 0 && v < to) {
            self.forstack.drop_top()?;
            self.find_next()?;
            self.skip_next()?;
        }
        Ok(())
    }

    /// BREAK pops one loop level and leaves the loop body. Inside
    /// nested loops it only ever drops the innermost level.
    fn x_break(&mut self) -> Result<()> {
        self.forstack.drop_top()?;
        self.find_next()?;
        self.skip_next()
    }

    /// NEXT [v]: steps the loop variable and either re-enters the body
    /// or pops the loop.
    fn x_next(&mut self) -> Result<()> {
        self.nexttoken()?;
        let mut named: Option<Name> = None;
        if !self.token.is_termsymbol() {
            if let Token::Variable(n) = self.token {
                named = Some(n);
                self.nexttoken()?;
                if !self.token.is_termsymbol() {
                    return Err(error!(Unknown));
                }
            }
        }
        let after_next = self.here;
        let slot = self.forstack.pop()?;
        if let Some(n) = named {
            if n != slot.var {
                return Err(error!(Next));
            }
        }
        if slot.step == 0 {
            return self.loop_again(slot);
        }
        let v = self.getvar(slot.var)?.wrapping_add(slot.step);
        self.setvar(slot.var, v)?;
        if (slot.step > 0 && v <= slot.to) || (slot.step < 0 && v >= slot.to) {
            return self.loop_again(slot);
        }
        // the loop is done
        self.here = after_next;
        self.nexttoken()
    }

    fn loop_again(&mut self, slot: ForSlot) -> Result<()> {
        self.forstack.push(slot)?;
        if self.st == State::Int {
            self.bi = slot.here as usize;
        } else {
            self.here = slot.here;
        }
        self.nexttoken()
    }

    /// LIST [a[, b]] prints the program back as text; the console's
    /// scroll hook may cancel with ESC.
    fn x_list(&mut self) -> Result<()> {
        self.nexttoken()?;
        let args = self.parsearguments()?;
        let (b, e) = match args {
            0 => (0, 32767),
            1 => {
                let b = self.pop()?;
                (b, b)
            }
            2 => {
                let e = self.pop()?;
                let b = self.pop()?;
                (b, e)
            }
            _ => return Err(error!(Args)),
        };
        if self.mem.top == 0 {
            return self.nexttoken();
        }
        self.here = 0;
        let mut oflag = false;
        self.gettoken()?;
        while self.here < self.mem.top {
            if let Token::LineNumber(n) = self.token {
                if n as Number >= b {
                    oflag = true;
                }
                if n as Number > e {
                    oflag = false;
                }
            }
            if oflag {
                self.outputtoken();
            }
            self.gettoken()?;
            if matches!(self.token, Token::LineNumber(_)) && oflag {
                self.outcr();
                if self.console.wait_on_scroll() == 27 {
                    break;
                }
            }
        }
        if self.here == self.mem.top && oflag {
            self.outputtoken();
        }
        if e == 32767 || b != e {
            self.outcr();
        }
        self.nexttoken()
    }

    /// One token back as text, spaced so that the listing tokenizes to
    /// the same bytes.
    fn outputtoken(&mut self) {
        match self.token {
            Token::Number(n) => self.outnumber(n),
            Token::LineNumber(n) => {
                self.outnumber(n as Number);
                self.outspc();
            }
            Token::Variable(n) | Token::ArrayVar(n) => {
                self.outch(n.0);
                if n.1 != 0 {
                    self.outch(n.1);
                }
            }
            Token::StringVar(n) => {
                self.outch(n.0);
                if n.1 != 0 {
                    self.outch(n.1);
                }
                self.outch(b'$');
            }
            Token::Str(loc) => {
                self.outch(b'"');
                for j in 0..loc.len as usize {
                    let c = self.lit_read(loc, j);
                    self.outch(c);
                }
                self.outch(b'"');
            }
            Token::GreaterEqual => self.outs_str(">="),
            Token::LesserEqual => self.outs_str("<="),
            Token::NotEqual => self.outs_str("<>"),
            Token::Word(w) => {
                if matches!(w, Word::Then | Word::To | Word::Step) {
                    self.outspc();
                }
                self.outs_str(w.text());
                self.outspc();
            }
            Token::Char(c) => self.outch(c),
            Token::Unknown | Token::Eol => {}
        }
    }

    /// RUN [n] starts fresh, CONT resumes wherever `here` points.
    fn x_run(&mut self) -> Result<()> {
        if self.token == Token::Word(Word::Cont) {
            self.st = if self.st == State::Erun {
                State::Erun
            } else {
                State::Run
            };
            self.nexttoken()?;
            return self.exec_run();
        }
        self.nexttoken()?;
        let args = self.parsearguments()?;
        match args {
            0 => self.here = 0,
            1 => {
                let n = self.pop()?;
                if n < 1 || n > MAX_ADDR as Number {
                    return Err(error!(LineUnknown));
                }
                self.findline(n as Address)?;
            }
            _ => return Err(error!(Args)),
        }
        if self.st == State::Int {
            self.st = State::Run;
        }
        self.x_clr()?;
        self.exec_run()
    }

    /// NEW: everything goes, including the stored program.
    fn x_new(&mut self) -> Result<()> {
        self.stack.clear();
        self.clr_all();
        self.mem.top = 0;
        self.mem.zeroblock(0, self.mem.himem + 1)?;
        self.here = 0;
        self.st = State::Int;
        Ok(())
    }

    fn x_rem(&mut self) -> Result<()> {
        while !matches!(self.token, Token::LineNumber(_) | Token::Eol)
            && self.here <= self.mem.top
        {
            self.nexttoken()?;
        }
        Ok(())
    }

    /// CLR drops variables and the heap but keeps the program.
    fn x_clr(&mut self) -> Result<()> {
        self.clr_all();
        self.nexttoken()
    }

    /// DIM allocates arrays and strings on the heap.
    fn x_dim(&mut self) -> Result<()> {
        self.nexttoken()?;
        loop {
            let (name, is_string) = match self.token {
                Token::ArrayVar(n) => (n, false),
                Token::StringVar(n) => (n, true),
                _ => return Err(error!(Unknown)),
            };
            self.nexttoken()?;
            if self.parsesubscripts()? != 1 {
                return Err(error!(Args));
            }
            let x = self.pop()?;
            if x <= 0 {
                return Err(error!(Range));
            }
            if is_string {
                self.create_string(name, x as Address)?;
            } else {
                self.create_array(name, x as Address)?;
            }
            self.nexttoken()?;
            if self.token == Token::Char(b',') {
                self.nexttoken()?;
                continue;
            }
            break;
        }
        self.nexttoken()
    }

    /// POKE: positive addresses hit the byte store, negative ones the
    /// EEPROM image, mirroring PEEK.
    fn x_poke(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(2)?;
        let v = self.pop()?;
        let a = self.pop()?;
        if a >= 0 && (a as u32) < self.mem.memsize() as u32 {
            self.mem.write8(a as Address, v as i8);
            Ok(())
        } else if a < 0 && -a <= self.eeprom.len() as Number {
            self.eeprom.update((-a - 1) as Address, v as i8);
            Ok(())
        } else {
            Err(error!(Range))
        }
    }

    /// TAB n prints n spaces.
    fn x_tab(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(1)?;
        let mut x = self.pop()?;
        while x > 0 {
            self.outspc();
            x -= 1;
        }
        Ok(())
    }

    /// DUMP [first [, count]]: raw cells, eight per row, then the
    /// EEPROM image and the two frontiers.
    fn x_dump(&mut self) -> Result<()> {
        self.nexttoken()?;
        let args = self.parsearguments()?;
        let (start, extent) = match args {
            0 => (0, self.mem.memsize() as Number),
            1 => (self.pop()?, self.mem.memsize() as Number),
            2 => {
                let a = self.pop()?;
                let x = self.pop()?;
                (x, a)
            }
            _ => return Err(error!(Args)),
        };
        self.form = 6;
        self.dumpmem(extent / 8 + 1, start);
        self.form = 0;
        self.nexttoken()
    }

    fn dumpmem(&mut self, rows: Number, start: Number) {
        let mut k = (start.max(0) as Address).min(self.mem.memsize());
        for _ in 0..rows {
            self.outnumber(k as Number);
            self.outspc();
            for _ in 0..8 {
                let v = self.mem.read8(k) as Number;
                self.outnumber(v);
                self.outspc();
                if k >= self.mem.memsize() {
                    break;
                }
                k += 1;
            }
            self.outcr();
            if k >= self.mem.memsize() {
                break;
            }
        }
        if !self.eeprom.is_empty() {
            let msg = format!("{}", ErrorCode::Eeprom);
            self.outs_str(&msg);
            self.outcr();
            let mut k: Address = 0;
            for _ in 0..rows {
                self.outnumber(k as Number);
                self.outspc();
                for _ in 0..8 {
                    let v = self.eeprom.read(k) as Number;
                    self.outnumber(v);
                    self.outspc();
                    if k >= self.eeprom.len() - 1 {
                        break;
                    }
                    k += 1;
                }
                self.outcr();
                if k >= self.eeprom.len() - 1 {
                    break;
                }
            }
        }
        self.outs_str("top: ");
        let top = self.mem.top as Number;
        self.outnumber(top);
        self.outcr();
        self.outs_str("himem: ");
        let himem = self.mem.himem as Number;
        self.outnumber(himem);
        self.outcr();
    }

    /// A filename argument: a string value, or the default/empty name
    /// at the end of the statement.
    fn getfilename(&mut self, with_default: bool) -> Result<String> {
        self.nexttoken()?;
        if let Some(loc) = self.stringvalue()? {
            let bytes = self.lit_bytes(loc);
            let n = bytes.len().min(SBUF_SIZE - 1);
            Ok(String::from_utf8_lossy(&bytes[..n]).into_owned())
        } else if self.token.is_termsymbol() {
            Ok(if with_default {
                "file.bas".into()
            } else {
                String::new()
            })
        } else {
            Err(error!(Unknown))
        }
    }

    /// SAVE writes the canonical listing; the name `!` targets the
    /// EEPROM image instead.
    fn x_save(&mut self) -> Result<()> {
        let name = self.getfilename(true)?;
        if name == "!" {
            self.esave();
            return self.nexttoken();
        }
        match self.storage.open_out(&name) {
            Ok(f) => {
                self.ofile = Some(f);
                self.ert = 0;
            }
            Err(_) => {
                self.ert = 1;
                return self.nexttoken();
            }
        }
        let oldod = self.od;
        self.od = O_FILE;
        let here2 = self.here;
        self.here = 0;
        self.gettoken()?;
        while self.here < self.mem.top {
            self.outputtoken();
            self.gettoken()?;
            if matches!(self.token, Token::LineNumber(_)) {
                self.outcr();
            }
        }
        if self.here == self.mem.top {
            self.outputtoken();
        }
        self.outcr();
        self.here = here2;
        self.od = oldod;
        self.ofile = None;
        self.nexttoken()
    }

    /// LOAD tokenizes a saved listing line by line, exactly as if it
    /// were typed. During a run it chains: new program, old variables,
    /// execution restarts at the first line.
    fn x_load(&mut self) -> Result<()> {
        let name = self.getfilename(true)?;
        if name == "!" {
            self.eload()?;
            return self.nexttoken();
        }
        let mut chain = false;
        if self.st == State::Run {
            chain = true;
            self.st = State::Int;
            self.mem.top = 0;
            self.forstack.clear();
            self.gosubstack.clear();
        }
        let mut text = String::new();
        match self.storage.open_in(&name) {
            Ok(mut f) => {
                if f.read_to_string(&mut text).is_err() {
                    self.ert = 1;
                    return self.nexttoken();
                }
                self.ert = 0;
            }
            Err(_) => {
                self.ert = 1;
                return self.nexttoken();
            }
        }
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            self.set_buffer(line);
            self.nexttoken()?;
            if let Token::Number(_) = self.token {
                self.storeline()?;
            }
        }
        if chain {
            self.st = State::Run;
            self.here = 0;
        }
        self.nexttoken()
    }

    /// Writes the program image to the EEPROM: flag, top, bytes. Too
    /// big only trips the trappable error.
    fn esave(&mut self) {
        if (self.mem.top + EHEADER_SIZE) < self.eeprom.len() {
            self.eeprom.update(0, 0);
            self.eeprom.write_addr(1, self.mem.top);
            for a in 0..self.mem.top {
                let v = self.mem.read8(a);
                self.eeprom.update(a + EHEADER_SIZE, v);
            }
            self.eeprom.update(self.mem.top + EHEADER_SIZE, 0);
            self.ert = 0;
        } else {
            self.ert = 1;
        }
    }

    /// Copies a stored EEPROM image back into the program store.
    fn eload(&mut self) -> Result<()> {
        if self.eeprom.is_empty() || (self.eeprom.read(0) != 0 && self.eeprom.read(0) != 1) {
            return Err(error!(Eeprom));
        }
        let top = self.eeprom.read_addr(1);
        if top > self.eeprom.image_len() || top > self.mem.himem {
            return Err(error!(Eeprom));
        }
        self.mem.top = top;
        for a in 0..top {
            let v = self.eeprom.read(a + EHEADER_SIZE);
            self.mem.write8(a, v);
        }
        Ok(())
    }

    /// GET [&stream,] target: one non-blocking character, 0 when none
    /// is pending.
    fn x_get(&mut self) -> Result<()> {
        self.nexttoken()?;
        let oldid = self.id;
        if self.token == Token::Char(b'&') {
            self.nexttoken()?;
            self.expression()?;
            self.id = self.pop()? as u8;
            if self.token != Token::Char(b',') {
                return Err(error!(Unknown));
            }
            self.nexttoken()?;
        }
        let t = self.token;
        let lhs = self.lefthandside(t)?;
        let v = if self.id == I_FILE {
            self.inch() as Number
        } else if self.checkch().is_some() {
            self.inch() as Number
        } else {
            0
        };
        self.assignnumber(t, lhs.i, lhs.pure, v)?;
        self.nexttoken()?;
        self.id = oldid;
        Ok(())
    }

    /// PUT [&stream,] expr...: raw characters to the output.
    fn x_put(&mut self) -> Result<()> {
        self.nexttoken()?;
        let oldod = self.od;
        if self.token == Token::Char(b'&') {
            self.nexttoken()?;
            self.expression()?;
            self.od = self.pop()? as u8;
            if self.token != Token::Char(b',') {
                return Err(error!(Unknown));
            }
            self.nexttoken()?;
        }
        let args = self.parsearguments()?;
        let mut vals = Vec::with_capacity(args as usize);
        for _ in 0..args {
            vals.push(self.pop()?);
        }
        vals.reverse();
        for v in vals {
            self.outch(v as u8);
        }
        self.od = oldod;
        Ok(())
    }

    /// SET fn, arg: low level interpreter switches.
    fn x_set(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(2)?;
        let arg = self.pop()?;
        let f = self.pop()?;
        match f {
            // EEPROM flag byte: 255 erased, 0 program, 1 autorun
            1 => self.eeprom.update(0, arg as i8),
            2 => self.od = if arg == 0 { O_SERIAL } else { O_DSP },
            3 => {
                self.odd = if arg == 0 { O_SERIAL } else { O_DSP };
                self.od = self.odd;
            }
            4 => self.id = if arg == 0 { I_SERIAL } else { I_KEYBOARD },
            5 => {
                self.idd = if arg == 0 { I_SERIAL } else { I_KEYBOARD };
                self.id = self.idd;
            }
            _ => {}
        }
        Ok(())
    }

    fn x_dwrite(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(2)?;
        let _val = self.pop()?;
        let _pin = self.pop()?;
        Ok(())
    }

    fn x_awrite(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(2)?;
        let _val = self.pop()?;
        let _pin = self.pop()?;
        Ok(())
    }

    fn x_pinm(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(2)?;
        let _mode = self.pop()?;
        let _pin = self.pop()?;
        Ok(())
    }

    fn x_delay(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(1)?;
        let ms = self.pop()?;
        if ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(ms as u64));
        }
        Ok(())
    }

    /// ATONE parses like on the boards but there is no speaker here.
    fn x_tone(&mut self) -> Result<()> {
        self.nexttoken()?;
        let args = self.parsearguments()?;
        if !(2..=3).contains(&args) {
            return Err(error!(Args));
        }
        for _ in 0..args {
            self.pop()?;
        }
        Ok(())
    }

    /// CATALOG [pattern]: prefix-matched directory of the store.
    fn x_catalog(&mut self) -> Result<()> {
        let pattern = self.getfilename(false)?;
        match self.storage.catalog(&pattern) {
            Ok(entries) => {
                self.ert = 0;
                for (name, size) in entries {
                    self.outs_str(&name);
                    let mut pad = name.len() as Number;
                    while pad < 14 {
                        self.outspc();
                        pad += 1;
                    }
                    self.outspc();
                    self.outnumber(size as Number);
                    self.outcr();
                    if self.console.wait_on_scroll() == 27 {
                        break;
                    }
                }
            }
            Err(_) => self.ert = 1,
        }
        self.nexttoken()
    }

    fn x_delete(&mut self) -> Result<()> {
        let name = self.getfilename(false)?;
        match self.storage.remove(&name) {
            Ok(()) => self.ert = 0,
            Err(_) => self.ert = 1,
        }
        self.nexttoken()
    }

    /// OPEN name [, mode]: mode 0 reads, mode 1 writes. Success and
    /// failure both land in the trappable register.
    fn x_open(&mut self) -> Result<()> {
        let name = self.getfilename(false)?;
        self.nexttoken()?;
        let mut mode = 0;
        if self.token == Token::Char(b',') {
            self.nexttoken()?;
            mode = match self.parsearguments()? {
                0 => 0,
                1 => self.pop()?,
                _ => return Err(error!(Args)),
            };
        }
        if mode == 1 {
            self.ofile = None;
            match self.storage.open_out(&name) {
                Ok(f) => {
                    self.ofile = Some(f);
                    self.ert = 0;
                }
                Err(_) => self.ert = 1,
            }
        } else if mode == 0 {
            self.ifile = None;
            match self.storage.open_in(&name) {
                Ok(f) => {
                    self.ifile = Some(f);
                    self.ert = 0;
                }
                Err(_) => self.ert = 1,
            }
        }
        self.nexttoken()
    }

    fn x_close(&mut self) -> Result<()> {
        self.nexttoken()?;
        self.parsenarguments(1)?;
        let mode = self.pop()?;
        if mode == 1 {
            self.ofile = None;
        } else if mode == 0 {
            self.ifile = None;
        }
        self.nexttoken()
    }
}
