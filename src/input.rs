use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;

use crate::error::{Error, Result};

/// how many keys on the hex keypad
pub const KEY_COUNT: u8 = 16;

/// map of keys on the left-hand side of a qwerty keyboard to the hex keypad
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  <-  |Q|W|E|R|
/// |7|8|9|E|  <-  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals only report presses (and auto-repeats), never releases, so a key
/// counts as down for this long after we last heard about it
const KEY_HOLD: Duration = Duration::from_millis(150);

/// how long `acquire_key` waits before giving up and letting the caller retry
const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(100);

/// don't bother the terminal more often than this when nothing asked for keys
const SERVICE_INTERVAL: Duration = Duration::from_millis(16);

/// reads the hex keypad
pub trait Input {
    /// is `key` down right now? never blocks; keys outside 0..=F are never down
    fn is_pressing(&mut self, key: u8) -> Result<bool>;

    /// wait a while for a key press; `None` means nothing arrived in time
    fn acquire_key(&mut self) -> Result<Option<u8>>;

    /// called between instructions so the device can keep up with events
    fn service(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Input from the terminal via crossterm; puts the terminal into raw mode for
/// as long as it lives. Esc or Ctrl-C halts the machine.
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    last_seen: [Option<Instant>; KEY_COUNT as usize],
    fresh: VecDeque<u8>,
    last_service: Instant,
}

impl StdinInput {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_seen: [None; KEY_COUNT as usize],
            fresh: VecDeque::new(),
            last_service: Instant::now(),
        })
    }

    /// drain whatever events are waiting, waiting up to `timeout` for the first
    fn read_stdin(&mut self, timeout: Duration) -> Result<()> {
        let mut timeout = timeout;
        while poll(timeout)? {
            timeout = Duration::ZERO;
            if let Event::Key(evt) = read()? {
                self.handle_key(evt)?;
            }
        }
        self.last_service = Instant::now();
        Ok(())
    }

    fn handle_key(&mut self, evt: KeyEvent) -> Result<()> {
        match evt.code {
            KeyCode::Esc => Err(Error::Halted),
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                Err(Error::Halted)
            }
            KeyCode::Char(key) => {
                if let Some(&mapped) = self.keymap.get(&key.to_ascii_lowercase()) {
                    self.last_seen[mapped as usize] = Some(Instant::now());
                    self.fresh.push_back(mapped);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn is_pressing(&mut self, key: u8) -> Result<bool> {
        self.read_stdin(Duration::ZERO)?;
        Ok(self
            .last_seen
            .get(key as usize)
            .copied()
            .flatten()
            .map_or(false, |at| at.elapsed() < KEY_HOLD))
    }

    fn acquire_key(&mut self) -> Result<Option<u8>> {
        // presses that happened before we started waiting don't count
        self.read_stdin(Duration::ZERO)?;
        self.fresh.clear();
        self.read_stdin(ACQUIRE_TIMEOUT)?;
        Ok(self.fresh.pop_front())
    }

    fn service(&mut self) -> Result<()> {
        if self.last_service.elapsed() >= SERVICE_INTERVAL {
            self.read_stdin(Duration::ZERO)?;
            self.fresh.clear();
        }
        Ok(())
    }
}

/// dummy Input implementation for testing: a fixed set of keys held down and
/// a queue of answers for `acquire_key`
#[derive(Default)]
pub struct DummyInput {
    pub held: Vec<u8>,
    pub queue: VecDeque<Option<u8>>,
}

impl DummyInput {
    pub fn new(held: &[u8]) -> Self {
        DummyInput {
            held: Vec::from(held),
            queue: VecDeque::new(),
        }
    }

    /// answers `acquire_key` will give, in order
    pub fn with_queue(mut self, answers: &[Option<u8>]) -> Self {
        self.queue.extend(answers.iter().copied());
        self
    }
}

impl Input for DummyInput {
    fn is_pressing(&mut self, key: u8) -> Result<bool> {
        Ok(key < KEY_COUNT && self.held.contains(&key))
    }

    fn acquire_key(&mut self) -> Result<Option<u8>> {
        Ok(self.queue.pop_front().flatten())
    }
}
