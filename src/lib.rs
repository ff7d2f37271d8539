//! # Tiny BASIC
//!
//! A line-numbered BASIC the way the 8-bit home computers spoke it:
//! the Palo Alto core, the Apple 1 extensions, and a few proprietary
//! statements on top.
//! ```text
//! Tiny BASIC 0.9.0 Memory 60000 1024
//! > █
//! ```
//!
//! The program lives tokenized in a single fixed-size byte store,
//! sharing it with the variable heap; the evaluator is a recursive
//! descent over the token stream. Type a numbered line to edit the
//! program, an unnumbered one to execute it, `RUN` to start.
//!
//! This is the manual. The language is documented in the chapter
//! modules below; the interpreter internals in [`mach`]; the ports it
//! runs against in [`io`].

#[path = "doc/introduction.rs"]
#[allow(non_snake_case)]
pub mod _Introduction;

#[path = "doc/chapter_1.rs"]
#[allow(non_snake_case)]
pub mod __Chapter_1;

#[path = "doc/appendix_a.rs"]
#[allow(non_snake_case)]
pub mod ___Appendix_A;

#[macro_use]
pub mod lang;
pub mod io;
pub mod mach;
pub mod term;
