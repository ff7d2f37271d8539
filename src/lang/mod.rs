/*!
## Language module

Scalar types, interpreter limits, and the token model of the dialect:
the Palo Alto BASIC core, the Apple 1 extensions, and a handful of
proprietary statements.

*/

/// Numbers as BASIC sees them. The whole interpreter is integer-only.
pub type Number = i32;
/// Addresses into the shared byte store and the EEPROM image.
pub type Address = u16;

/// Bytes a `Number` occupies in the byte store, little-endian.
pub const NUM_SIZE: Address = 4;
/// Bytes an `Address` occupies in the byte store, little-endian.
pub const ADDR_SIZE: Address = 2;
/// Bytes of the length word that prefixes every string payload.
pub const STR_INDEX_SIZE: Address = 2;
/// EEPROM image header: one flag byte plus the stored `top`.
pub const EHEADER_SIZE: Address = ADDR_SIZE + 1;

/// Interactive input buffer size; byte 0 holds the line length.
pub const BUF_SIZE: usize = 92;
/// Scratch buffer size for number formatting and filenames.
pub const SBUF_SIZE: usize = 32;
/// Static single-letter scalar slots A..Z.
pub const VAR_SIZE: usize = 26;
/// Depth of the expression evaluation stack.
pub const STACK_SIZE: usize = 15;
/// Depth of the GOSUB return stack.
pub const GOSUB_DEPTH: usize = 4;
/// Depth of the FOR loop stack.
pub const FOR_DEPTH: usize = 4;

pub const MAX_NUM: Number = Number::max_value();
pub const MAX_ADDR: Address = Address::max_value();

/// Typing this at runtime stops the program and drops to the prompt.
pub const BREAK_CHAR: u8 = b'#';

#[macro_use]
mod error;
pub mod token;

pub use error::{Error, ErrorCode};
pub use token::{Name, StrLoc, StrSource, Token, Word, KEYWORDS};
