/// # Operand fields
///
/// Once an instruction's fixed bits are cleared, what is left sits in the same
/// nibble positions it had in the instruction:
/// - `(_, n, n, n)` a 12-bit address
/// - `(_, _, n, n)` a byte that is assigned to and/or compared with Vx
/// - `(_, n, _, _)` the register Vx, or the last register of the range V0..Vx
/// - `(_, _, n, _)` the register Vy
/// - `(_, _, _, n)` a nibble; the sprite height for DRW
pub trait Operand {
    /// `[_x__]`
    fn x(&self) -> usize;

    /// `[__y_]`
    fn y(&self) -> usize;

    /// `[___n]`
    fn n(&self) -> usize;

    /// `[__kk]`
    fn kk(&self) -> u8;

    /// `[_nnn]`
    fn addr(&self) -> u16;
}

impl Operand for u16 {
    fn x(&self) -> usize {
        ((self & 0x0F00) >> 8) as usize
    }

    fn y(&self) -> usize {
        ((self & 0x00F0) >> 4) as usize
    }

    fn n(&self) -> usize {
        (self & 0x000F) as usize
    }

    fn kk(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn addr(&self) -> u16 {
        self & 0x0FFF
    }
}
