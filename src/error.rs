use std::io;
use std::sync;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop the interpreter
#[derive(Debug, Error)]
pub enum Error {
    /// I/O errors (e.g. reading a ROM file, drawing to the terminal)
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("memory too small: {capacity} bytes, need at least {required}")]
    MemoryTooSmall { capacity: usize, required: usize },

    #[error("display too small: {width}x{height}, need at least {min_width}x{min_height}")]
    DisplayTooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },

    #[error("memory access out of bounds: {len} byte(s) at {addr:#05x}")]
    MemoryOutOfBounds { addr: usize, len: usize },

    #[error("program too large: {size} bytes, at most {available} fit")]
    ProgramTooLarge { size: usize, available: usize },

    #[error("program counter out of bounds: {0:#05x}")]
    ProgramCounterOutOfBounds(u16),

    #[error("no instruction matches {0:#06x}")]
    Decode(u16),

    #[error("call stack overflow calling from {pc:#05x}")]
    StackOverflow { pc: u16 },

    #[error("return with an empty call stack at {pc:#05x}")]
    StackUnderflow { pc: u16 },

    /// a timer lock was poisoned by a panicking thread
    #[error("timer lock poisoned: {0}")]
    Poison(String),

    /// the timer thread died; the delay and sound timers no longer count
    #[error("timers stopped: {0}")]
    TimersStopped(String),

    #[error("sound error: {0}")]
    Sound(String),

    /// the operator asked to quit; not a failure
    #[error("halted by user")]
    Halted,
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(err: sync::PoisonError<T>) -> Self {
        Error::Poison(err.to_string())
    }
}
