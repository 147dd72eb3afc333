//! # interpreter
//!
//! One thread runs fetch -> decode -> execute, as fast as it can, for ever.
//! A second thread (see `timer`) counts the delay and sound timers down; the
//! two share nothing but those timers.
//!
//! Memory, display and keyboard are borrowed, never owned: the caller builds
//! them and hands them over for the lifetime of the interpreter. Diagnostics
//! go through the `log` facade; `main` decides where they end up.
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use log::{debug, error, info, log_enabled, warn, Level};

use crate::display::Display;
use crate::error::{Error, Result};
use crate::input::Input;
use crate::instruction::{self, Decoded};
use crate::memory::{MemoryMap, CHIP8_FONT, CHIP8_FONT_ADDR, CHIP8_PROGRAM_ADDR, CHIP8_RAM_SIZE_BYTES};
use crate::registers::Registers;
use crate::sound::Sound;
use crate::timer::{self, Timers};

/// smallest screen the instruction set can draw on
pub const MIN_DISPLAY_WIDTH: usize = 64;
pub const MIN_DISPLAY_HEIGHT: usize = 32;

/// every instruction is two bytes
pub const INSTRUCTION_LEN: u16 = 2;

pub struct Chip8Interpreter<'a> {
    pub(crate) memory: &'a mut dyn MemoryMap,
    pub(crate) display: &'a mut dyn Display,
    pub(crate) input: &'a mut dyn Input,
    pub(crate) registers: Registers,
    pub(crate) timers: Arc<Timers>,
    timers_started: bool,
    /// SYS addresses already complained about
    pub(crate) warned_sys: HashSet<u16>,
}

impl<'a> Chip8Interpreter<'a> {
    /// Check the collaborators are big enough, then put the font at the
    /// bottom of memory. The timers don't run until `start_timers`.
    pub fn new(
        memory: &'a mut dyn MemoryMap,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
    ) -> Result<Chip8Interpreter<'a>> {
        if memory.capacity() < CHIP8_RAM_SIZE_BYTES {
            return Err(Error::MemoryTooSmall {
                capacity: memory.capacity(),
                required: CHIP8_RAM_SIZE_BYTES,
            });
        }
        let (width, height) = display.resolution();
        if width < MIN_DISPLAY_WIDTH || height < MIN_DISPLAY_HEIGHT {
            return Err(Error::DisplayTooSmall {
                width,
                height,
                min_width: MIN_DISPLAY_WIDTH,
                min_height: MIN_DISPLAY_HEIGHT,
            });
        }
        memory.write(&CHIP8_FONT, CHIP8_FONT_ADDR)?;
        info!(
            "interpreter ready: {} bytes of memory, {}x{} display",
            memory.capacity(),
            width,
            height
        );

        Ok(Chip8Interpreter {
            memory,
            display,
            input,
            registers: Registers::new(CHIP8_PROGRAM_ADDR),
            timers: Arc::new(Timers::new()),
            timers_started: false,
            warned_sys: HashSet::new(),
        })
    }

    /// load a chip8 program at 0x200
    pub fn load_program(&mut self, reader: &mut dyn io::Read) -> Result<usize> {
        let len = self.memory.write_any(reader, CHIP8_PROGRAM_ADDR)?;
        info!("loaded {} byte program at {:#05x}", len, CHIP8_PROGRAM_ADDR);
        Ok(len)
    }

    /// start counting the timers down `rate` times a second; only the first
    /// call starts a ticker, later ones are ignored
    pub fn start_timers(&mut self, rate: f64, sound: Box<dyn Sound + Send>) -> Result<()> {
        if self.timers_started {
            warn!("timers already running, ignoring a second start");
            return Ok(());
        }
        timer::spawn(Arc::clone(&self.timers), rate, sound)?;
        self.timers_started = true;
        info!("timers running at {} Hz", rate);
        Ok(())
    }

    pub fn timers_started(&self) -> bool {
        self.timers_started
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn timers(&self) -> Arc<Timers> {
        Arc::clone(&self.timers)
    }

    /// read the instruction at pc and move pc on past it
    pub fn fetch(&mut self) -> Result<u16> {
        let pc = self.registers.pc;
        if pc as usize + INSTRUCTION_LEN as usize > self.memory.capacity() {
            return Err(Error::ProgramCounterOutOfBounds(pc));
        }
        let word = self.memory.get_word(pc)?;
        self.registers.pc = pc
            .checked_add(INSTRUCTION_LEN)
            .ok_or(Error::ProgramCounterOutOfBounds(pc))?;
        Ok(word)
    }

    /// one whole instruction
    pub fn step(&mut self) -> Result<()> {
        self.input.service()?;
        self.timers.check()?;
        let pc = self.registers.pc;
        let word = self.fetch()?;
        let decoded = instruction::decode(word)?;
        if log_enabled!(Level::Debug) {
            debug!(
                "{:03x}: {:04x} {:<16} v{:02x?} i{:03x}",
                pc,
                word,
                decoded.to_string(),
                self.registers.v,
                self.registers.i
            );
        }
        self.execute(decoded)
    }

    /// run until something goes wrong; there is no way to stop normally
    pub fn run(&mut self) -> Result<()> {
        loop {
            if let Err(e) = self.step() {
                return Err(self.report(e));
            }
        }
    }

    /// run at most `steps` instructions
    pub fn run_for(&mut self, steps: usize) -> Result<()> {
        for _ in 0..steps {
            if let Err(e) = self.step() {
                return Err(self.report(e));
            }
        }
        Ok(())
    }

    fn report(&self, e: Error) -> Error {
        match e {
            Error::Halted => info!("stopped at {:#05x}: {}", self.registers.pc, e),
            _ => error!("stopped at {:#05x}: {}", self.registers.pc, e),
        }
        e
    }

    /// point pc at `addr`, as long as a whole instruction fits there
    pub(crate) fn jump_to(&mut self, addr: u16) -> Result<()> {
        if addr as usize + INSTRUCTION_LEN as usize > self.memory.capacity() {
            return Err(Error::ProgramCounterOutOfBounds(addr));
        }
        self.registers.pc = addr;
        Ok(())
    }

    /// decode and execute `word` as though it had just been fetched
    pub fn execute_word(&mut self, word: u16) -> Result<()> {
        let decoded: Decoded = instruction::decode(word)?;
        self.execute(decoded)
    }
}


#[cfg(test)]
mod tests {
    use super::rig::Rig;
    use super::*;
    use crate::display::HeadlessDisplay;
    use crate::input::DummyInput;
    use crate::memory::Chip8MemoryMap;
    use crate::sound::Mute;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut rig = Rig::new();
        let mut i = rig.interpreter()?;
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(i.load_program(&mut prog)?, 2);
        assert_eq!(i.memory.get_ro_slice(0x200, 2)?, &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_font_preloaded() -> Result<()> {
        let mut rig = Rig::new();
        let i = rig.interpreter()?;
        assert_eq!(i.memory.get_ro_slice(0, 80)?, &CHIP8_FONT[..]);
        assert_eq!(i.registers().pc, 0x200);
        assert_eq!(i.registers().sp, 0xff);
        Ok(())
    }

    #[test]
    fn test_memory_too_small() {
        let mut memory = Chip8MemoryMap::with_capacity(2048);
        let mut display = HeadlessDisplay::new(64, 32);
        let mut input = DummyInput::default();
        let i = Chip8Interpreter::new(&mut memory, &mut display, &mut input);
        assert!(matches!(
            i,
            Err(Error::MemoryTooSmall {
                capacity: 2048,
                required: 4096
            })
        ));
    }

    #[test]
    fn test_display_too_small() {
        let mut memory = Chip8MemoryMap::new();
        let mut display = HeadlessDisplay::new(64, 16);
        let mut input = DummyInput::default();
        let i = Chip8Interpreter::new(&mut memory, &mut display, &mut input);
        assert!(matches!(i, Err(Error::DisplayTooSmall { height: 16, .. })));
    }

    #[test]
    fn test_fetch() -> Result<()> {
        let mut rig = Rig::new();
        rig.memory.write(&[0xff, 0x66, 0x42, 0x33], 0x200)?;
        let mut i = rig.interpreter()?;
        assert_eq!(i.fetch()?, 0xff66);
        assert_eq!(i.fetch()?, 0x4233);
        assert_eq!(i.registers().pc, 0x204);
        Ok(())
    }

    #[test]
    fn test_fetch_advances_by_two_whatever_the_instruction() -> Result<()> {
        let words: [u16; 8] = [0x00e0, 0x1abc, 0x2abc, 0x3000, 0xb123, 0xf00a, 0xffff, 0x0000];
        for word in words.iter() {
            let mut rig = Rig::new();
            rig.memory.write(&word.to_be_bytes(), 0x200)?;
            let mut i = rig.interpreter()?;
            assert_eq!(i.fetch()?, *word);
            assert_eq!(i.registers().pc, 0x202, "{:04x}", word);
        }
        Ok(())
    }

    #[test]
    fn test_jump_is_distinct_from_fetch_advance() -> Result<()> {
        let mut rig = Rig::new();
        rig.memory.write(&[0x13, 0x00], 0x200)?; // JP 0x300
        let mut i = rig.interpreter()?;
        i.step()?;
        assert_eq!(i.registers().pc, 0x300);
        Ok(())
    }

    #[test]
    fn test_fetch_past_end_of_memory() -> Result<()> {
        let mut rig = Rig::new();
        let mut i = rig.interpreter()?;
        i.registers.pc = 0x0fff;
        assert!(matches!(i.fetch(), Err(Error::ProgramCounterOutOfBounds(0x0fff))));
        Ok(())
    }

    #[test]
    fn test_fetch_at_the_top_of_a_64k_memory() -> Result<()> {
        let mut memory = Chip8MemoryMap::with_capacity(0x10000);
        let mut display = HeadlessDisplay::new(64, 32);
        let mut input = DummyInput::default();
        let mut i = Chip8Interpreter::new(&mut memory, &mut display, &mut input)?;
        i.registers.pc = 0xfffe;
        assert!(matches!(i.fetch(), Err(Error::ProgramCounterOutOfBounds(0xfffe))));
        assert_eq!(i.registers.pc, 0xfffe);

        // a skip from the last instruction has nowhere to go either
        i.registers.pc = 0xfffe;
        assert!(matches!(
            i.execute_word(0x3000),
            Err(Error::ProgramCounterOutOfBounds(_))
        ));
        Ok(())
    }

    #[test]
    fn test_timers_only_start_once() -> Result<()> {
        let mut rig = Rig::new();
        let mut i = rig.interpreter()?;
        assert!(!i.timers_started());
        i.timers.set_delay(255)?;
        i.start_timers(60.0, Box::new(Mute::new()))?;
        i.start_timers(60.0, Box::new(Mute::new()))?;
        assert!(i.timers_started());
        thread::sleep(Duration::from_millis(250));
        // one ticker manages about 15 ticks in that time; two would manage 30
        let delay = i.timers.delay()?;
        assert!(delay < 255, "delay timer never ticked");
        assert!(delay > 230, "delay timer ticked too fast: {}", delay);
        Ok(())
    }

    #[test]
    fn test_dead_timers_stop_the_machine() -> Result<()> {
        let mut rig = Rig::new();
        let mut i = rig.interpreter()?;
        i.step()?;
        i.timers.record_fault(&Error::Poison("delay timer lock".into()));
        assert!(matches!(i.step(), Err(Error::TimersStopped(_))));
        Ok(())
    }

    #[test]
    fn test_runs_a_program() -> Result<()> {
        let mut rig = Rig::new();
        {
            let mut i = rig.interpreter()?;
            let mut prog: &[u8] = &[
                0x00, 0xe0, // CLS
                0x60, 0x05, // LD V0, 5
                0x61, 0x0a, // LD V1, 10
                0x80, 0x14, // ADD V0, V1
                0xf0, 0x29, // LD F, V0   (I = sprite for "F")
                0x62, 0x01, // LD V2, 1
                0xd2, 0x25, // DRW V2, V2, 5
                0x12, 0x0e, // JP 0x20e  (spin)
            ];
            i.load_program(&mut prog)?;
            i.run_for(20)?;
            assert_eq!(i.registers().v[0], 15);
            assert_eq!(i.registers().i, 15 * 5);
            assert_eq!(i.registers().v[0xf], 0);
            assert_eq!(i.registers().pc, 0x20e);
        }
        // "F" is 0xf0, 0x80, 0xf0, 0x80, 0x80 drawn at (1, 1)
        let frame = &rig.display.frame;
        assert!(frame.pixel(1, 1) && frame.pixel(4, 1) && !frame.pixel(5, 1));
        assert!(frame.pixel(1, 5) && !frame.pixel(2, 5));
        Ok(())
    }

    #[test]
    fn test_halt_propagates() -> Result<()> {
        struct Quitter;
        impl Input for Quitter {
            fn is_pressing(&mut self, _key: u8) -> Result<bool> {
                Ok(false)
            }
            fn acquire_key(&mut self) -> Result<Option<u8>> {
                Ok(None)
            }
            fn service(&mut self) -> Result<()> {
                Err(Error::Halted)
            }
        }

        let mut memory = Chip8MemoryMap::new();
        let mut display = HeadlessDisplay::new(64, 32);
        let mut input = Quitter;
        let mut i = Chip8Interpreter::new(&mut memory, &mut display, &mut input)?;
        assert!(matches!(i.run(), Err(Error::Halted)));
        Ok(())
    }
}
