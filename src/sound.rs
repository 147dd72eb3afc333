use beep::beep;

use crate::error::{Error, Result};

/// Driven by the timer thread: on while the sound timer is nonzero
pub trait Sound {
    fn beep(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// beeps the PC speaker
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }

    pub fn is_beeping(&self) -> bool {
        self.is_beeping
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<()> {
        beep(SIMPLEBEEP_PITCH).map_err(|e| Error::Sound(e.to_string()))?;
        self.is_beeping = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        beep(0).map_err(|e| Error::Sound(e.to_string()))?;
        self.is_beeping = false;
        Ok(())
    }
}

/// silence; also counts how often it was asked to make a noise, for tests
#[derive(Default)]
pub struct Mute {
    pub beeps: usize,
    pub stops: usize,
}

impl Mute {
    pub fn new() -> Self {
        Mute::default()
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<()> {
        self.beeps += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stops += 1;
        Ok(())
    }
}
