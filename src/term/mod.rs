/*!
## Terminal front end

The thin read-eval-print wrapper around the interpreter: a linefeed
prompt with history, Ctrl-C mapped to the interpreter's break
character, and a mortal terminal for clearing the screen.

*/

extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
extern crate mortal;

use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ansi_term::Style;
use linefeed::{Interface, ReadResult};

use crate::io::{Console, DiskStorage};
use crate::lang::BREAK_CHAR;
use crate::mach::Runtime;

pub fn main() {
    if std::env::args().count() > 2 {
        println!("Usage: tinybasic [FILENAME]");
        return;
    }
    let mut args = std::env::args();
    let _executable = args.next();
    let filename = args.next().unwrap_or_default();
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    if let Err(error) = main_loop(interrupted, filename) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>, filename: String) -> std::io::Result<()> {
    let console = TermConsole::new(interrupted)?;
    let mut runtime = Runtime::new(Box::new(console), Box::new(DiskStorage));

    if !filename.is_empty() {
        match fs::read_to_string(&filename) {
            Ok(text) => {
                for line in text.lines() {
                    runtime.enter(line);
                }
                runtime.enter("RUN");
                return Ok(());
            }
            Err(error) => {
                eprintln!("{}", Style::new().bold().paint(error.to_string()));
                return Ok(());
            }
        }
    }

    let command = Interface::new("tinybasic")?;
    command.set_prompt("> ")?;
    println!("{}", Style::new().bold().paint(runtime.greeting()));
    runtime.boot();

    loop {
        match command.read_line()? {
            ReadResult::Input(string) => {
                if runtime.enter(&string) {
                    command.add_history_unique(string);
                }
            }
            ReadResult::Signal(_) | ReadResult::Eof => break,
        }
    }
    Ok(())
}

/// The interpreter's console port on a real terminal. Reads are line
/// buffered; Ctrl-C surfaces as a pending break character so the
/// statement loop's poll sees it.
struct TermConsole {
    interrupted: Arc<AtomicBool>,
    terminal: mortal::Terminal,
    pending: Vec<u8>,
}

impl TermConsole {
    fn new(interrupted: Arc<AtomicBool>) -> std::io::Result<TermConsole> {
        Ok(TermConsole {
            interrupted,
            terminal: mortal::Terminal::new()?,
            pending: Vec::new(),
        })
    }

    fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }
}

impl Console for TermConsole {
    fn write(&mut self, c: u8) {
        let mut out = std::io::stdout();
        let _ = out.write_all(&[c]);
        if c == b'\n' {
            let _ = out.flush();
        }
    }

    fn read(&mut self) -> u8 {
        if self.take_interrupt() {
            return BREAK_CHAR;
        }
        if self.pending.is_empty() {
            let mut line = String::new();
            let _ = std::io::stdout().flush();
            if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
                return 0;
            }
            self.pending = line.into_bytes();
            self.pending.reverse();
        }
        self.pending.pop().unwrap_or(0)
    }

    fn peek(&mut self) -> Option<u8> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Some(BREAK_CHAR);
        }
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

    fn clear(&mut self) {
        let _ = self.terminal.clear_screen();
    }
}
