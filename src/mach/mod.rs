/*!
## Machine module

The interpreter proper: the shared byte store with its two frontiers,
the heap allocator living in the same buffer, the dual-mode tokenizer,
the line editor, the expression evaluator, and the statement executor.
Everything hangs off one `Runtime` value.

*/

mod eval;
mod heap;
mod lexer;
mod memory;
mod program;
mod runtime;
mod stack;
mod statement;
mod vars;

pub use heap::ObjKind;
pub use memory::Memory;
pub use runtime::{Runtime, State};
pub use stack::{ForSlot, ForStack, GosubStack, Stack};
