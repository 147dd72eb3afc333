use std::fmt;

use crate::error::{Error, Result};
use crate::opcode::Operand;

/// Every kind of instruction the CHIP-8 understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// 0nnn, and anything else nothing more specific claims
    Sys,
    Cls,
    Ret,
    Jp,
    Call,
    SeVxByte,
    SneVxByte,
    SeVxVy,
    LdVxByte,
    AddVxByte,
    LdVxVy,
    Or,
    And,
    Xor,
    AddVxVy,
    Sub,
    Shr,
    Subn,
    Shl,
    SneVxVy,
    LdIAddr,
    JpV0Addr,
    Rnd,
    Drw,
    Skp,
    Sknp,
    LdVxDt,
    LdVxK,
    LdDtVx,
    LdStVx,
    AddIVx,
    LdFVx,
    LdBVx,
    LdIVx,
    LdVxI,
}

/// One row of the catalog. `mask` has a bit set for every fixed position
/// (fixed zeroes included), `pattern` holds the values of those bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub mask: u16,
    pub pattern: u16,
    pub category: Category,
}

impl Entry {
    pub fn matches(&self, word: u16) -> bool {
        word & self.mask == self.pattern
    }
}

const fn entry(mask: u16, pattern: u16, category: Category) -> Entry {
    Entry {
        mask,
        pattern,
        category,
    }
}

/// The instruction set, most fixed bits first. Only the first match counts,
/// so a row must never sit above one with more fixed bits. The wildcard goes
/// last.
#[rustfmt::skip]
pub const CATALOG: [Entry; 35] = [
    entry(0xFFFF, 0x00E0, Category::Cls),
    entry(0xFFFF, 0x00EE, Category::Ret),
    entry(0xF0FF, 0xE09E, Category::Skp),
    entry(0xF0FF, 0xE0A1, Category::Sknp),
    entry(0xF0FF, 0xF007, Category::LdVxDt),
    entry(0xF0FF, 0xF00A, Category::LdVxK),
    entry(0xF0FF, 0xF015, Category::LdDtVx),
    entry(0xF0FF, 0xF018, Category::LdStVx),
    entry(0xF0FF, 0xF01E, Category::AddIVx),
    entry(0xF0FF, 0xF029, Category::LdFVx),
    entry(0xF0FF, 0xF033, Category::LdBVx),
    entry(0xF0FF, 0xF055, Category::LdIVx),
    entry(0xF0FF, 0xF065, Category::LdVxI),
    entry(0xF00F, 0x5000, Category::SeVxVy),
    entry(0xF00F, 0x8000, Category::LdVxVy),
    entry(0xF00F, 0x8001, Category::Or),
    entry(0xF00F, 0x8002, Category::And),
    entry(0xF00F, 0x8003, Category::Xor),
    entry(0xF00F, 0x8004, Category::AddVxVy),
    entry(0xF00F, 0x8005, Category::Sub),
    entry(0xF00F, 0x8006, Category::Shr),
    entry(0xF00F, 0x8007, Category::Subn),
    entry(0xF00F, 0x800E, Category::Shl),
    entry(0xF00F, 0x9000, Category::SneVxVy),
    entry(0xF000, 0x1000, Category::Jp),
    entry(0xF000, 0x2000, Category::Call),
    entry(0xF000, 0x3000, Category::SeVxByte),
    entry(0xF000, 0x4000, Category::SneVxByte),
    entry(0xF000, 0x6000, Category::LdVxByte),
    entry(0xF000, 0x7000, Category::AddVxByte),
    entry(0xF000, 0xA000, Category::LdIAddr),
    entry(0xF000, 0xB000, Category::JpV0Addr),
    entry(0xF000, 0xC000, Category::Rnd),
    entry(0xF000, 0xD000, Category::Drw),
    entry(0x0000, 0x0000, Category::Sys),
];

impl Category {
    /// this category's row in the catalog
    pub fn entry(self) -> &'static Entry {
        CATALOG
            .iter()
            .find(|e| e.category == self)
            .unwrap_or(&CATALOG[CATALOG.len() - 1])
    }
}

/// A matched instruction: its category and the bits its category leaves
/// variable, still in their original positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub category: Category,
    pub operand: u16,
}

impl Decoded {
    /// put the fixed bits back
    pub fn encode(&self) -> u16 {
        self.category.entry().pattern | self.operand
    }
}

/// Match `word` against the catalog, most specific first. The operand is the
/// word with the matched fixed bits cleared.
pub fn decode(word: u16) -> Result<Decoded> {
    CATALOG
        .iter()
        .find(|e| e.matches(word))
        .map(|e| Decoded {
            category: e.category,
            operand: word ^ e.pattern,
        })
        .ok_or(Error::Decode(word))
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operand;
        let (x, y, n, kk, nnn) = (op.x(), op.y(), op.n(), op.kk(), op.addr());
        match self.category {
            Category::Sys => write!(f, "SYS {:#05x}", op),
            Category::Cls => write!(f, "CLS"),
            Category::Ret => write!(f, "RET"),
            Category::Jp => write!(f, "JP {:#05x}", nnn),
            Category::Call => write!(f, "CALL {:#05x}", nnn),
            Category::SeVxByte => write!(f, "SE V{:X}, {:#04x}", x, kk),
            Category::SneVxByte => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            Category::SeVxVy => write!(f, "SE V{:X}, V{:X}", x, y),
            Category::LdVxByte => write!(f, "LD V{:X}, {:#04x}", x, kk),
            Category::AddVxByte => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            Category::LdVxVy => write!(f, "LD V{:X}, V{:X}", x, y),
            Category::Or => write!(f, "OR V{:X}, V{:X}", x, y),
            Category::And => write!(f, "AND V{:X}, V{:X}", x, y),
            Category::Xor => write!(f, "XOR V{:X}, V{:X}", x, y),
            Category::AddVxVy => write!(f, "ADD V{:X}, V{:X}", x, y),
            Category::Sub => write!(f, "SUB V{:X}, V{:X}", x, y),
            Category::Shr => write!(f, "SHR V{:X}", x),
            Category::Subn => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Category::Shl => write!(f, "SHL V{:X}", x),
            Category::SneVxVy => write!(f, "SNE V{:X}, V{:X}", x, y),
            Category::LdIAddr => write!(f, "LD I, {:#05x}", nnn),
            Category::JpV0Addr => write!(f, "JP V0, {:#05x}", nnn),
            Category::Rnd => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Category::Drw => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Category::Skp => write!(f, "SKP V{:X}", x),
            Category::Sknp => write!(f, "SKNP V{:X}", x),
            Category::LdVxDt => write!(f, "LD V{:X}, DT", x),
            Category::LdVxK => write!(f, "LD V{:X}, K", x),
            Category::LdDtVx => write!(f, "LD DT, V{:X}", x),
            Category::LdStVx => write!(f, "LD ST, V{:X}", x),
            Category::AddIVx => write!(f, "ADD I, V{:X}", x),
            Category::LdFVx => write!(f, "LD F, V{:X}", x),
            Category::LdBVx => write!(f, "LD B, V{:X}", x),
            Category::LdIVx => write!(f, "LD [I], V{:X}", x),
            Category::LdVxI => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_most_specific_first() {
        let fixed: Vec<u32> = CATALOG.iter().map(|e| e.mask.count_ones()).collect();
        assert!(fixed.windows(2).all(|w| w[0] >= w[1]), "{:?}", fixed);
        assert_eq!(CATALOG[CATALOG.len() - 1].mask, 0);
    }

    #[test]
    fn test_catalog_is_well_formed() {
        let mut seen = HashSet::new();
        for e in CATALOG.iter() {
            assert_eq!(e.pattern & !e.mask, 0, "{:?} sets a variable bit", e);
            assert!(seen.insert(e.category), "{:?} listed twice", e.category);
            assert_eq!(e.category.entry(), e);
        }
    }

    #[test]
    fn test_decode() -> Result<()> {
        assert_eq!(decode(0x00e0)?.category, Category::Cls);

        let d = decode(0x1fff)?;
        assert_eq!(d.category, Category::Jp);
        assert_eq!(d.operand, 0x0fff);

        let d = decode(0x82a3)?;
        assert_eq!(d.category, Category::Xor);
        assert_eq!(d.operand, 0x02a0);

        assert_eq!(decode(0x8be4)?.category, Category::AddVxVy);
        Ok(())
    }

    #[test]
    fn test_decode_alu_family() -> Result<()> {
        let expected = [
            (0x8120, Category::LdVxVy),
            (0x8121, Category::Or),
            (0x8122, Category::And),
            (0x8123, Category::Xor),
            (0x8124, Category::AddVxVy),
            (0x8125, Category::Sub),
            (0x8126, Category::Shr),
            (0x8127, Category::Subn),
            (0x812e, Category::Shl),
        ];
        for (word, category) in expected.iter() {
            assert_eq!(decode(*word)?.category, *category, "{:04x}", word);
        }
        Ok(())
    }

    #[test]
    fn test_variable_bits_do_not_pose_as_fixed_bits() -> Result<()> {
        // operands that contain another category's whole bit pattern
        assert_eq!(decode(0x60e0)?.category, Category::LdVxByte);
        assert_eq!(decode(0x1eee)?.category, Category::Jp);
        assert_eq!(decode(0x3fee)?.category, Category::SeVxByte);
        assert_eq!(decode(0x7f9e)?.category, Category::AddVxByte);
        assert_eq!(decode(0x9ff0)?.category, Category::SneVxVy);
        assert_eq!(decode(0xbfff)?.category, Category::JpV0Addr);
        assert_eq!(decode(0xf155)?.category, Category::LdIVx);
        assert_eq!(decode(0xf11e)?.category, Category::AddIVx);
        Ok(())
    }

    #[test]
    fn test_unclaimed_words_fall_to_sys() -> Result<()> {
        assert_eq!(decode(0x0123)?.category, Category::Sys);
        assert_eq!(decode(0x5121)?.category, Category::Sys);
        assert_eq!(decode(0xe1ff)?.category, Category::Sys);
        assert_eq!(decode(0x8ff8)?.category, Category::Sys);
        Ok(())
    }

    #[test]
    fn test_every_word_reencodes() -> Result<()> {
        for word in 0..=u16::MAX {
            let d = decode(word)?;
            assert_eq!(d.encode(), word, "{:?}", d);
        }
        Ok(())
    }

    #[test]
    fn test_mnemonics() -> Result<()> {
        assert_eq!(decode(0xd125)?.to_string(), "DRW V1, V2, 5");
        assert_eq!(decode(0xa2f0)?.to_string(), "LD I, 0x2f0");
        assert_eq!(decode(0xfa65)?.to_string(), "LD VA, [I]");
        Ok(())
    }
}
