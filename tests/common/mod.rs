use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read, Write};
use std::rc::Rc;

use tinybasic::io::{name_matches, Console, Storage};
use tinybasic::mach::Runtime;

/// An interpreter wired to a scripted console and an in-memory store.
/// Tests queue input, enter lines, and assert on the drained output.
pub struct Session {
    pub runtime: Runtime,
    output: Rc<RefCell<Vec<u8>>>,
    input: Rc<RefCell<VecDeque<u8>>>,
    pub files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

#[allow(dead_code)]
impl Session {
    pub fn new() -> Session {
        let output = Rc::new(RefCell::new(Vec::new()));
        let input = Rc::new(RefCell::new(VecDeque::new()));
        let files = Rc::new(RefCell::new(HashMap::new()));
        let console = ScriptedConsole {
            output: output.clone(),
            input: input.clone(),
        };
        let storage = MemStorage {
            files: files.clone(),
        };
        Session {
            runtime: Runtime::new(Box::new(console), Box::new(storage)),
            output,
            input,
            files,
        }
    }

    pub fn enter(&mut self, line: &str) {
        self.runtime.enter(line);
    }

    /// Queues one line of input for INPUT and friends.
    pub fn provide(&mut self, line: &str) {
        let mut input = self.input.borrow_mut();
        for b in line.bytes() {
            input.push_back(b);
        }
        input.push_back(b'\n');
    }

    /// Drains everything printed so far.
    pub fn output(&mut self) -> String {
        let mut out = self.output.borrow_mut();
        let s = String::from_utf8_lossy(&out).into_owned();
        out.clear();
        s
    }

    pub fn file(&self, name: &str) -> Option<String> {
        self.files
            .borrow()
            .get(name)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn put_file(&mut self, name: &str, text: &str) {
        self.files
            .borrow_mut()
            .insert(name.to_string(), text.as_bytes().to_vec());
    }
}

struct ScriptedConsole {
    output: Rc<RefCell<Vec<u8>>>,
    input: Rc<RefCell<VecDeque<u8>>>,
}

impl Console for ScriptedConsole {
    fn write(&mut self, c: u8) {
        self.output.borrow_mut().push(c);
    }

    fn read(&mut self) -> u8 {
        self.input.borrow_mut().pop_front().unwrap_or(0)
    }

    fn peek(&mut self) -> Option<u8> {
        self.input.borrow().front().copied()
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        loop {
            match self.input.borrow_mut().pop_front() {
                None | Some(b'\n') | Some(0) => return line,
                Some(c) => line.push(c as char),
            }
        }
    }
}

struct MemStorage {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

/// A write handle that lands in the shared map when dropped, the way
/// a real file appears on close.
struct MemFile {
    name: String,
    buf: Vec<u8>,
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MemFile {
    fn drop(&mut self) {
        self.files
            .borrow_mut()
            .insert(self.name.clone(), std::mem::take(&mut self.buf));
    }
}

impl Storage for MemStorage {
    fn open_in(&mut self, name: &str) -> std::io::Result<Box<dyn Read>> {
        match self.files.borrow().get(name) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                name.to_string(),
            )),
        }
    }

    fn open_out(&mut self, name: &str) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(MemFile {
            name: name.to_string(),
            buf: Vec::new(),
            files: self.files.clone(),
        }))
    }

    fn catalog(&mut self, pattern: &str) -> std::io::Result<Vec<(String, u64)>> {
        let mut names: Vec<(String, u64)> = self
            .files
            .borrow()
            .iter()
            .filter(|(name, _)| name_matches(name, pattern))
            .map(|(name, data)| (name.clone(), data.len() as u64))
            .collect();
        names.sort();
        Ok(names)
    }

    fn remove(&mut self, name: &str) -> std::io::Result<()> {
        match self.files.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                name.to_string(),
            )),
        }
    }
}
