use std::sync::{Arc, Mutex};
use std::thread;

use log::{error, warn};
use spin_sleep::LoopHelper;

use crate::error::{Error, Result};
use crate::sound::{Mute, Sound};

/// ticks per second; the documented CHIP-8 rate
pub const DEFAULT_TICK_RATE: f64 = 60.0;

/// The delay and sound timers. Both the interpreter and the ticker thread
/// touch these, so each one sits behind its own lock; the two timers never
/// contend with each other.
#[derive(Debug, Default)]
pub struct Timers {
    delay: Mutex<u8>,
    sound: Mutex<u8>,
    /// why the ticker stopped, if it did
    fault: Mutex<Option<String>>,
}

impl Timers {
    pub fn new() -> Self {
        Timers::default()
    }

    pub fn delay(&self) -> Result<u8> {
        Ok(*self.delay.lock()?)
    }

    pub fn set_delay(&self, value: u8) -> Result<()> {
        *self.delay.lock()? = value;
        Ok(())
    }

    pub fn sound(&self) -> Result<u8> {
        Ok(*self.sound.lock()?)
    }

    pub fn set_sound(&self, value: u8) -> Result<()> {
        *self.sound.lock()? = value;
        Ok(())
    }

    /// one tick: count each timer down towards zero, never past it.
    /// returns whether the sound timer is still running afterwards
    pub fn tick(&self) -> Result<bool> {
        {
            let mut delay = self.delay.lock()?;
            *delay = delay.saturating_sub(1);
        }
        let mut sound = self.sound.lock()?;
        *sound = sound.saturating_sub(1);
        Ok(*sound > 0)
    }

    /// Err once the ticker has died; the timers are frozen from then on
    pub fn check(&self) -> Result<()> {
        match &*self.fault.lock()? {
            Some(reason) => Err(Error::TimersStopped(reason.clone())),
            None => Ok(()),
        }
    }

    pub(crate) fn record_fault(&self, err: &Error) {
        let mut fault = match self.fault.lock() {
            Ok(fault) => fault,
            Err(poisoned) => poisoned.into_inner(),
        };
        fault.get_or_insert_with(|| err.to_string());
    }
}

/// Start the ticker. It runs until the process exits; there is no handle to
/// stop it. A speaker that fails is swapped for silence and the timers keep
/// going. If a timer lock is poisoned the ticker records why and ends, and
/// `Timers::check` reports it.
pub fn spawn(timers: Arc<Timers>, rate: f64, sound: Box<dyn Sound + Send>) -> Result<()> {
    thread::Builder::new()
        .name("chip8-timers".into())
        .spawn(move || {
            if let Err(e) = run_ticker(&timers, rate, sound) {
                error!("timer thread stopped: {}", e);
                timers.record_fault(&e);
            }
        })?;
    Ok(())
}

fn run_ticker(timers: &Timers, rate: f64, mut sound: Box<dyn Sound + Send>) -> Result<()> {
    let mut loop_helper = LoopHelper::builder().build_with_target_rate(rate);
    let mut beeping = false;
    loop {
        loop_helper.loop_start();
        let sounding = timers.tick()?;
        let toggled = if sounding && !beeping {
            sound.beep()
        } else if !sounding && beeping {
            sound.stop()
        } else {
            Ok(())
        };
        if let Err(e) = toggled {
            warn!("sound disabled: {}", e);
            sound = Box::new(Mute::new());
        }
        beeping = sounding;
        loop_helper.loop_sleep();
    }
}
