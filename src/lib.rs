//! # chip8
//!
//! A CHIP-8 interpreter core, plus a terminal front end to drive it.
//!
//! ## Design
//!
//! * the interpreter borrows everything it talks to through a trait, so the
//!   terminal can be swapped for a headless stand-in (tests do exactly that)
//!     - memory: `memory::MemoryMap`
//!     - screen: `display::Display`
//!     - keypad: `input::Input`
//! * diagnostics go through `log`; the binary points them at a file, since
//!   the terminal belongs to the display
//! * the instruction set is an ordered table of (mask, pattern) rows; decode
//!   takes the first row that matches, so the most specific row goes first
//! * instructions run as fast as they can; only the delay and sound timers
//!   keep time, on a thread of their own
//!
//! Model
//!
//! main
//!  |-- settings(cli)
//!  |-- log file
//!  |-- memory, display, input
//!  |-- interpreter(memory, display, input)
//!  |    |-- font at 0x000, program at 0x200
//!  |    `-- timers -> timer thread(sound) at 60Hz
//!  `-- interpreter.run()
//!       `-- loop { service input; fetch; decode; execute }
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod opcode;
mod operations;
pub mod registers;
pub mod sound;
pub mod timer;

pub use error::{Error, Result};
pub use interpreter::Chip8Interpreter;
