use crate::error::{Error, Result};

/// how many general purpose registers (V0..VF)
pub const REGISTER_COUNT: usize = 16;
/// VF doubles as the carry/borrow/collision flag
pub const FLAG: usize = 0xF;
/// how many return addresses can be nested
pub const STACK_DEPTH: usize = 16;

/// # registers
///
/// - (v) 16 8-bit registers V0..VF; VF is written implicitly by some
///   instructions as a flag
/// - (i) 16-bit address register, only the low 12 bits mean anything
/// - (pc) 16-bit program counter
/// - (sp) 8-bit stack pointer; starts at 0xff so that the first call wraps it
///   round to slot 0
/// - (stack) 16 return addresses
///
/// The delay and sound timers are not here: they are shared with the timer
/// thread, see `timer::Timers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub stack: [u16; STACK_DEPTH],
}

impl Registers {
    pub fn new(pc: u16) -> Self {
        Registers {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc,
            sp: u8::MAX,
            stack: [0; STACK_DEPTH],
        }
    }

    /// how many return addresses are on the stack
    pub fn depth(&self) -> usize {
        self.sp.wrapping_add(1) as usize
    }

    /// bump the stack pointer, then store `addr` in the new slot
    pub fn push(&mut self, addr: u16) -> Result<()> {
        let next = self.sp.wrapping_add(1);
        if next as usize >= STACK_DEPTH {
            return Err(Error::StackOverflow { pc: self.pc });
        }
        self.sp = next;
        self.stack[next as usize] = addr;
        Ok(())
    }

    /// read the current slot, then drop the stack pointer
    pub fn pop(&mut self) -> Result<u16> {
        if self.sp as usize >= STACK_DEPTH {
            return Err(Error::StackUnderflow { pc: self.pc });
        }
        let addr = self.stack[self.sp as usize];
        self.sp = self.sp.wrapping_sub(1);
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let r = Registers::new(0x200);
        assert_eq!(r.sp, 0xff);
        assert_eq!(r.depth(), 0);
        assert_eq!(r.pc, 0x200);
    }

    #[test]
    fn test_push_pop() -> Result<()> {
        let mut r = Registers::new(0);
        r.push(0x0abc)?;
        assert_eq!(r.sp, 0);
        assert_eq!(r.stack[0], 0x0abc);
        assert_eq!(r.depth(), 1);
        r.push(0x0def)?;
        assert_eq!(r.depth(), 2);
        assert_eq!(r.pop()?, 0x0def);
        assert_eq!(r.pop()?, 0x0abc);
        assert_eq!(r.sp, 0xff);
        assert_eq!(r.depth(), 0);
        Ok(())
    }

    #[test]
    fn test_overflow() -> Result<()> {
        let mut r = Registers::new(0x300);
        for n in 0..STACK_DEPTH as u16 {
            r.push(n)?;
        }
        assert_eq!(r.depth(), STACK_DEPTH);
        assert!(matches!(r.push(0), Err(Error::StackOverflow { pc: 0x300 })));
        // the failed push left things alone
        assert_eq!(r.depth(), STACK_DEPTH);
        Ok(())
    }

    #[test]
    fn test_underflow() {
        let mut r = Registers::new(0x300);
        assert!(matches!(r.pop(), Err(Error::StackUnderflow { pc: 0x300 })));
        assert_eq!(r.sp, 0xff);
    }
}
