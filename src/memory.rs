use std::io;
use std::ops::Range;

use crate::error::{Error, Result};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents addressable memory. Every access is bounds-checked against
/// `capacity()`; nothing here panics on a bad address.
pub trait MemoryMap {
    /// how many bytes are addressable
    fn capacity(&self) -> usize;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]>;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]>;

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<()> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// write unknown len of data into memory at a particular address,
    /// returning how many bytes were written
    fn write_any(&mut self, reader: &mut dyn io::Read, addr: u16) -> Result<usize> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        let available = self.capacity().saturating_sub(addr as usize);
        if len > available {
            return Err(Error::ProgramTooLarge {
                size: len,
                available,
            });
        }
        self.write(&buf, addr)?;
        Ok(len)
    }

    /// get a big-endian two-byte word (instructions)
    fn get_word(&self, addr: u16) -> Result<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }
}

/// turn (addr, len) into a byte range, or fail if it runs off the end
pub fn checked_range(addr: u16, len: usize, capacity: usize) -> Result<Range<usize>> {
    let start = addr as usize;
    match start.checked_add(len) {
        Some(end) if end <= capacity => Ok(start..end),
        _ => Err(Error::MemoryOutOfBounds { addr: start, len }),
    }
}

/// Defines the CHIP-8 memory map
///
///   0x0000-0x004f  font (16 characters, 5 bytes each)
///   0x0050-0x01ff  reserved for the interpreter
///   0x0200-0x0fff  program
///
/// chip-8 programs *should* not write below 0x200
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

impl MemoryMap for Chip8MemoryMap {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let range = checked_range(addr, len, self.bytes.len())?;
        Ok(&self.bytes[range])
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let range = checked_range(addr, len, self.bytes.len())?;
        Ok(&mut self.bytes[range])
    }
}

impl Chip8MemoryMap {
    /// zeroed 4K of RAM
    pub fn new() -> Self {
        Self::with_capacity(CHIP8_RAM_SIZE_BYTES)
    }

    /// zeroed RAM of an arbitrary size; the interpreter refuses anything
    /// smaller than `CHIP8_RAM_SIZE_BYTES`
    pub fn with_capacity(capacity: usize) -> Self {
        Chip8MemoryMap {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_FONT_ADDR: u16 = 0x000;
/// bytes per character in the font
pub const CHIP8_FONT_GLYPH_LEN: u16 = 5;
pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
