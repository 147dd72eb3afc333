use log::warn;

use crate::error::{Error, Result};
use crate::input::KEY_COUNT;
use crate::instruction::{Category, Decoded};
use crate::interpreter::{Chip8Interpreter, INSTRUCTION_LEN};
use crate::memory::{CHIP8_FONT_ADDR, CHIP8_FONT_GLYPH_LEN};
use crate::opcode::Operand;
use crate::registers::FLAG;

/// The semantics of each instruction. By the time one of these runs, pc has
/// already moved past the instruction, so "skip" means one more instruction.
impl Chip8Interpreter<'_> {
    /// hand a decoded instruction to its handler
    pub fn execute(&mut self, decoded: Decoded) -> Result<()> {
        let op = decoded.operand;
        match decoded.category {
            Category::Sys => self.sys(op),
            Category::Cls => self.cls(),
            Category::Ret => self.ret(),
            Category::Jp => self.jp(op),
            Category::Call => self.call(op),
            Category::SeVxByte => self.skip_if(self.registers.v[op.x()] == op.kk()),
            Category::SneVxByte => self.skip_if(self.registers.v[op.x()] != op.kk()),
            Category::SeVxVy => self.skip_if(self.registers.v[op.x()] == self.registers.v[op.y()]),
            Category::LdVxByte => self.ld_vx_byte(op),
            Category::AddVxByte => self.add_vx_byte(op),
            Category::LdVxVy => self.ld_vx_vy(op),
            Category::Or => self.or(op),
            Category::And => self.and(op),
            Category::Xor => self.xor(op),
            Category::AddVxVy => self.add_vx_vy(op),
            Category::Sub => self.sub(op),
            Category::Shr => self.shr(op),
            Category::Subn => self.subn(op),
            Category::Shl => self.shl(op),
            Category::SneVxVy => self.skip_if(self.registers.v[op.x()] != self.registers.v[op.y()]),
            Category::LdIAddr => self.ld_i_addr(op),
            Category::JpV0Addr => self.jp_v0_addr(op),
            Category::Rnd => self.rnd(op),
            Category::Drw => self.drw(op),
            Category::Skp => self.skp(op),
            Category::Sknp => self.sknp(op),
            Category::LdVxDt => self.ld_vx_dt(op),
            Category::LdVxK => self.ld_vx_k(op),
            Category::LdDtVx => self.timers.set_delay(self.registers.v[op.x()]),
            Category::LdStVx => self.timers.set_sound(self.registers.v[op.x()]),
            Category::AddIVx => self.add_i_vx(op),
            Category::LdFVx => self.ld_f_vx(op),
            Category::LdBVx => self.ld_b_vx(op),
            Category::LdIVx => self.ld_i_vx(op),
            Category::LdVxI => self.ld_vx_i(op),
        }
    }

    /// write a result and the flag it produced; the flag goes last so that it
    /// wins when x is VF
    fn set_with_flag(&mut self, x: usize, value: u8, flag: bool) {
        self.registers.v[x] = value;
        self.registers.v[FLAG] = flag as u8;
    }

    /// pc += 2 if `condition`
    fn skip_if(&mut self, condition: bool) -> Result<()> {
        if condition {
            let pc = self.registers.pc;
            let next = pc
                .checked_add(INSTRUCTION_LEN)
                .ok_or(Error::ProgramCounterOutOfBounds(pc))?;
            self.jump_to(next)?;
        }
        Ok(())
    }

    /// machine code routine; nothing to run it on, so a no-op
    fn sys(&mut self, op: u16) -> Result<()> {
        let at = self.registers.pc.wrapping_sub(INSTRUCTION_LEN);
        if self.warned_sys.insert(at) {
            warn!("ignoring SYS {:#06x} at {:#05x}", op, at);
        }
        Ok(())
    }

    /// clear
    fn cls(&mut self) -> Result<()> {
        self.display.clear()
    }

    /// PC = STACK.pop()
    fn ret(&mut self) -> Result<()> {
        let addr = self.registers.pop()?;
        self.jump_to(addr)
    }

    /// PC = addr
    fn jp(&mut self, op: u16) -> Result<()> {
        self.jump_to(op.addr())
    }

    /// STACK.push(PC); PC = addr
    fn call(&mut self, op: u16) -> Result<()> {
        let return_to = self.registers.pc;
        self.jump_to(op.addr())?;
        if let Err(e) = self.registers.push(return_to) {
            self.registers.pc = return_to;
            return Err(e);
        }
        Ok(())
    }

    /// Vx = kk
    fn ld_vx_byte(&mut self, op: u16) -> Result<()> {
        self.registers.v[op.x()] = op.kk();
        Ok(())
    }

    /// Vx += kk; overflow is dropped and VF left alone
    fn add_vx_byte(&mut self, op: u16) -> Result<()> {
        let v = &mut self.registers.v[op.x()];
        *v = v.wrapping_add(op.kk());
        Ok(())
    }

    /// Vx = Vy
    fn ld_vx_vy(&mut self, op: u16) -> Result<()> {
        self.registers.v[op.x()] = self.registers.v[op.y()];
        Ok(())
    }

    /// Vx |= Vy
    fn or(&mut self, op: u16) -> Result<()> {
        self.registers.v[op.x()] |= self.registers.v[op.y()];
        Ok(())
    }

    /// Vx &= Vy
    fn and(&mut self, op: u16) -> Result<()> {
        self.registers.v[op.x()] &= self.registers.v[op.y()];
        Ok(())
    }

    /// Vx ^= Vy
    fn xor(&mut self, op: u16) -> Result<()> {
        self.registers.v[op.x()] ^= self.registers.v[op.y()];
        Ok(())
    }

    /// Vx += Vy; VF = carry
    fn add_vx_vy(&mut self, op: u16) -> Result<()> {
        let (vx, vy) = (self.registers.v[op.x()], self.registers.v[op.y()]);
        let (sum, carry) = vx.overflowing_add(vy);
        self.set_with_flag(op.x(), sum, carry);
        Ok(())
    }

    /// Vx -= Vy; VF = !borrow
    fn sub(&mut self, op: u16) -> Result<()> {
        let (vx, vy) = (self.registers.v[op.x()], self.registers.v[op.y()]);
        self.set_with_flag(op.x(), vx.wrapping_sub(vy), vx >= vy);
        Ok(())
    }

    /// Vx = Vy - Vx; VF = !borrow
    fn subn(&mut self, op: u16) -> Result<()> {
        let (vx, vy) = (self.registers.v[op.x()], self.registers.v[op.y()]);
        self.set_with_flag(op.x(), vy.wrapping_sub(vx), vy >= vx);
        Ok(())
    }

    /// Vx >>= 1; VF = the bit shifted out
    fn shr(&mut self, op: u16) -> Result<()> {
        let vx = self.registers.v[op.x()];
        self.set_with_flag(op.x(), vx >> 1, vx & 0x01 == 0x01);
        Ok(())
    }

    /// Vx <<= 1; VF = the bit shifted out
    fn shl(&mut self, op: u16) -> Result<()> {
        let vx = self.registers.v[op.x()];
        self.set_with_flag(op.x(), vx << 1, vx & 0x80 == 0x80);
        Ok(())
    }

    /// I = addr
    fn ld_i_addr(&mut self, op: u16) -> Result<()> {
        self.registers.i = op.addr();
        Ok(())
    }

    /// PC = V0 + addr
    fn jp_v0_addr(&mut self, op: u16) -> Result<()> {
        self.jump_to(u16::from(self.registers.v[0x0]) + op.addr())
    }

    /// Vx = random byte & kk
    fn rnd(&mut self, op: u16) -> Result<()> {
        let rand_byte: u8 = rand::random();
        self.registers.v[op.x()] = rand_byte & op.kk();
        Ok(())
    }

    /// draw_sprite(x=Vx y=Vy rows=mem[I..I+n]); VF = collision
    fn drw(&mut self, op: u16) -> Result<()> {
        let x = self.registers.v[op.x()] as usize;
        let y = self.registers.v[op.y()] as usize;
        let rows = self.memory.get_ro_slice(self.registers.i, op.n())?;
        let collided = self.display.render_sprite(x, y, rows)?;
        self.registers.v[FLAG] = collided as u8;
        Ok(())
    }

    /// if Vx.pressed then pc += 2
    fn skp(&mut self, op: u16) -> Result<()> {
        let pressed = self.input.is_pressing(self.registers.v[op.x()])?;
        self.skip_if(pressed)
    }

    /// if !Vx.pressed then pc += 2
    fn sknp(&mut self, op: u16) -> Result<()> {
        let pressed = self.input.is_pressing(self.registers.v[op.x()])?;
        self.skip_if(!pressed)
    }

    /// Vx = DT
    fn ld_vx_dt(&mut self, op: u16) -> Result<()> {
        self.registers.v[op.x()] = self.timers.delay()?;
        Ok(())
    }

    /// Vx = next key pressed; blocks this thread, the timers keep going
    fn ld_vx_k(&mut self, op: u16) -> Result<()> {
        loop {
            match self.input.acquire_key()? {
                Some(key) if key < KEY_COUNT => {
                    self.registers.v[op.x()] = key;
                    return Ok(());
                }
                _ => continue,
            }
        }
    }

    /// I += Vx
    fn add_i_vx(&mut self, op: u16) -> Result<()> {
        self.registers.i = self
            .registers
            .i
            .wrapping_add(u16::from(self.registers.v[op.x()]));
        Ok(())
    }

    /// I = address of the font glyph for the low nibble of Vx
    fn ld_f_vx(&mut self, op: u16) -> Result<()> {
        let digit = u16::from(self.registers.v[op.x()] & 0x0F);
        self.registers.i = CHIP8_FONT_ADDR + digit * CHIP8_FONT_GLYPH_LEN;
        Ok(())
    }

    /// mem[I..I+3] = bcd(Vx)
    fn ld_b_vx(&mut self, op: u16) -> Result<()> {
        let vx = self.registers.v[op.x()];
        let bcd = [vx / 100 % 10, vx / 10 % 10, vx % 10];
        self.memory.write(&bcd, self.registers.i)
    }

    /// mem[I..=I+x] = V0..=Vx
    fn ld_i_vx(&mut self, op: u16) -> Result<()> {
        self.memory
            .write(&self.registers.v[..=op.x()], self.registers.i)
    }

    /// V0..=Vx = mem[I..=I+x]
    fn ld_vx_i(&mut self, op: u16) -> Result<()> {
        let src = self.memory.get_ro_slice(self.registers.i, op.x() + 1)?;
        self.registers.v[..=op.x()].copy_from_slice(src);
        Ok(())
    }
}
