use std::io;
use thiserror::Error;

/// Everything that can go wrong while loading or running a program.
///
/// `UnknownOpcode` is the one non-fatal variant: the interpreter has already
/// skipped past the offending word when it is returned, so the host may log
/// it and keep stepping. The structural variants mean the session is beyond
/// saving and the step that produced them mutated nothing.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program of {size} bytes does not fit in {avail} bytes of program memory")]
    CapacityExceeded { size: usize, avail: usize },

    #[error("memory access out of bounds at {addr:#06x}")]
    OutOfBounds { addr: u16 },

    #[error("call stack overflow at {pc:#06x}")]
    StackOverflow { pc: u16 },

    #[error("call stack underflow at {pc:#06x}")]
    StackUnderflow { pc: u16 },

    #[error("unknown opcode {opcode:#06x} at {pc:#06x}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Chip8Error {
    /// true for errors that end the session; false for ones the host can
    /// note and step past
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Chip8Error::UnknownOpcode { .. })
    }
}
