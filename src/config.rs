use std::path::PathBuf;

use log::LevelFilter;

use crate::timer::DEFAULT_TICK_RATE;

/// where the log goes unless told otherwise; the terminal belongs to the
/// display
pub const DEFAULT_LOG_PATH: &str = "chip8.log";

/// Everything a run can be told from outside
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rom_path: PathBuf,
    /// timer decrements per second
    pub tick_rate: f64,
    pub mute: bool,
    pub log_path: PathBuf,
    /// log every instruction as it runs
    pub verbose: bool,
}

impl Settings {
    pub fn new(rom_path: impl Into<PathBuf>) -> Self {
        Settings {
            rom_path: rom_path.into(),
            ..Settings::default()
        }
    }

    /// the quietest level that makes it into the log
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// a rate the timer thread can actually keep to
    pub fn is_valid_tick_rate(&self) -> bool {
        self.tick_rate.is_finite() && self.tick_rate > 0.0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rom_path: PathBuf::new(),
            tick_rate: DEFAULT_TICK_RATE,
            mute: false,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            verbose: false,
        }
    }
}
