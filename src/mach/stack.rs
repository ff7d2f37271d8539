use arrayvec::ArrayVec;

use crate::error;
use crate::lang::{Address, Error, Name, Number, FOR_DEPTH, GOSUB_DEPTH, STACK_SIZE};

type Result<T> = std::result::Result<T, Error>;

/// The expression evaluation stack. Every production of the evaluator
/// pops its operands and pushes its result, so the stack is empty again
/// at every statement boundary.
#[derive(Debug, Default)]
pub struct Stack {
    stack: ArrayVec<Number, STACK_SIZE>,
}

impl Stack {
    pub fn new() -> Stack {
        Stack::default()
    }

    pub fn push(&mut self, val: Number) -> Result<()> {
        self.stack.try_push(val).map_err(|_| error!(Stack))
    }

    pub fn pop(&mut self) -> Result<Number> {
        self.stack.pop().ok_or_else(|| error!(Stack))
    }

    pub fn clear(&mut self) {
        self.stack.clear()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// One active FOR loop: the loop variable, the position to resume the
/// body at, the limit, and the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForSlot {
    pub var: Name,
    pub here: Address,
    pub to: Number,
    pub step: Number,
}

#[derive(Debug, Default)]
pub struct ForStack {
    stack: ArrayVec<ForSlot, FOR_DEPTH>,
}

impl ForStack {
    pub fn new() -> ForStack {
        ForStack::default()
    }

    pub fn push(&mut self, slot: ForSlot) -> Result<()> {
        self.stack.try_push(slot).map_err(|_| error!(For))
    }

    pub fn pop(&mut self) -> Result<ForSlot> {
        self.stack.pop().ok_or_else(|| error!(For))
    }

    /// Discards the innermost loop, as BREAK and a skipped body do.
    pub fn drop_top(&mut self) -> Result<()> {
        self.pop().map(|_| ())
    }

    pub fn clear(&mut self) {
        self.stack.clear()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }
}

/// Return addresses of active GOSUBs. Overflow is a GOSUB error,
/// popping without a caller is a Return error.
#[derive(Debug, Default)]
pub struct GosubStack {
    stack: ArrayVec<Address, GOSUB_DEPTH>,
}

impl GosubStack {
    pub fn new() -> GosubStack {
        GosubStack::default()
    }

    pub fn push(&mut self, here: Address) -> Result<()> {
        self.stack.try_push(here).map_err(|_| error!(Gosub))
    }

    pub fn pop(&mut self) -> Result<Address> {
        self.stack.pop().ok_or_else(|| error!(Return))
    }

    pub fn clear(&mut self) {
        self.stack.clear()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_stack_depth_limit() {
        let mut s = Stack::new();
        for i in 0..STACK_SIZE {
            s.push(i as Number).unwrap();
        }
        assert_eq!(s.push(99).unwrap_err().code(), ErrorCode::Stack);
        assert_eq!(s.pop().unwrap(), (STACK_SIZE - 1) as Number);
    }

    #[test]
    fn test_stack_underflow() {
        let mut s = Stack::new();
        assert_eq!(s.pop().unwrap_err().code(), ErrorCode::Stack);
    }

    #[test]
    fn test_gosub_errors() {
        let mut s = GosubStack::new();
        assert_eq!(s.pop().unwrap_err().code(), ErrorCode::Return);
        for i in 0..GOSUB_DEPTH {
            s.push(i as Address).unwrap();
        }
        assert_eq!(s.push(0).unwrap_err().code(), ErrorCode::Gosub);
    }

    #[test]
    fn test_for_nesting_limit() {
        let mut s = ForStack::new();
        let slot = ForSlot {
            var: Name(b'I', 0),
            here: 0,
            to: 10,
            step: 1,
        };
        for _ in 0..FOR_DEPTH {
            s.push(slot).unwrap();
        }
        assert_eq!(s.push(slot).unwrap_err().code(), ErrorCode::For);
    }
}
