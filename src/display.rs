use std::io;

use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use crate::error::Result;

/// Display is used by the interpreter to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// XOR a sprite onto the frame, one byte per 8-pixel row, with its top
    /// left corner at (x, y). Returns true if any lit pixel was switched off.
    fn render_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> Result<bool>;

    /// switch every pixel off
    fn clear(&mut self) -> Result<()>;

    /// (width, height) in pixels
    fn resolution(&self) -> (usize, usize);
}

// store useful metadata about the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn byte_count(&self) -> usize {
        (self.pixel_count() + 7) / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count();
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                let bit = 1 & (data[count / 8] >> (7 - count % 8));
                if bit == bitplane {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// Monochrome pixels packed one bit each, row-major, most significant bit
/// leftmost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    resolution: Resolution,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let resolution = Resolution(width, height);
        FrameBuffer {
            resolution,
            data: vec![0; resolution.byte_count()],
        }
    }

    pub fn width(&self) -> usize {
        self.resolution.0
    }

    pub fn height(&self) -> usize {
        self.resolution.1
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        let idx = y * self.width() + x;
        self.data[idx / 8] & (0x80 >> (idx % 8)) != 0
    }

    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|b| *b = 0);
    }

    /// The origin wraps round the edges of the frame; whatever then hangs off
    /// the right or bottom edge is clipped.
    pub fn xor_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let (w, h) = (self.width(), self.height());
        if w == 0 || h == 0 {
            return false;
        }
        let (x0, y0) = (x % w, y % h);
        let mut collided = false;
        for (dy, row) in rows.iter().enumerate() {
            let py = y0 + dy;
            if py >= h {
                break;
            }
            for dx in 0..8 {
                let px = x0 + dx;
                if px >= w {
                    break;
                }
                if (row >> (7 - dx)) & 1 == 0 {
                    continue;
                }
                let idx = py * w + px;
                let mask = 0x80 >> (idx % 8);
                if self.data[idx / 8] & mask != 0 {
                    collided = true;
                }
                self.data[idx / 8] ^= mask;
            }
        }
        collided
    }
}

/// monochrome display in a terminal, rendered using TUI and Crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    frame: FrameBuffer,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            frame: FrameBuffer::new(x, y),
        })
    }

    fn render(&mut self) -> Result<()> {
        let MonoTermDisplay { terminal, frame } = self;
        let resolution = frame.resolution;
        let data = frame.as_bytes();

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16)
                .intersection(f.size());

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    // expand each bitplane into x, y float coords, suitable for
                    // rendering with TUI. this just prints blocky points for now
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 0).collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 1).collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

impl Display for MonoTermDisplay {
    fn render_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> Result<bool> {
        let collided = self.frame.xor_sprite(x, y, rows);
        self.render()?;
        Ok(collided)
    }

    fn clear(&mut self) -> Result<()> {
        self.frame.clear();
        self.render()
    }

    fn resolution(&self) -> (usize, usize) {
        (self.frame.width(), self.frame.height())
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let _ = self.terminal.set_cursor(0, 2 + self.frame.height() as u16);
    }
}

/// keeps a frame buffer but never shows it; for tests and headless runs
pub struct HeadlessDisplay {
    pub frame: FrameBuffer,
}

impl HeadlessDisplay {
    pub fn new(x: usize, y: usize) -> HeadlessDisplay {
        HeadlessDisplay {
            frame: FrameBuffer::new(x, y),
        }
    }
}

impl Display for HeadlessDisplay {
    fn render_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> Result<bool> {
        Ok(self.frame.xor_sprite(x, y, rows))
    }

    fn clear(&mut self) -> Result<()> {
        self.frame.clear();
        Ok(())
    }

    fn resolution(&self) -> (usize, usize) {
        (self.frame.width(), self.frame.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_byte_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.byte_count(), 256);
        assert_eq!(Resolution(3, 3).byte_count(), 2);
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplanes_split_pixels() {
        let r = Resolution(16, 2);
        let data = [0x80, 0x00, 0x00, 0x01];
        let lit: Vec<_> = r.bitplane_from_data(&data, 1).collect();
        assert_eq!(lit, vec![(15.0, -1.0), (0.0, 0.0)]);
        assert_eq!(r.bitplane_from_data(&data, 0).count(), 30);
    }

    // FrameBuffer tests
    #[test]
    fn test_sprite_sets_pixels() {
        let mut fb = FrameBuffer::new(64, 32);
        // "0" from the font, one pixel in from the corner
        let collided = fb.xor_sprite(1, 1, &[0xf0, 0x90, 0x90, 0x90, 0xf0]);
        assert!(!collided);
        assert!(fb.pixel(1, 1) && fb.pixel(4, 1));
        assert!(fb.pixel(1, 2) && !fb.pixel(2, 2) && fb.pixel(4, 2));
        assert!(!fb.pixel(5, 1) && !fb.pixel(0, 0));
    }

    #[test]
    fn test_same_sprite_twice_collides_and_erases() {
        let mut fb = FrameBuffer::new(64, 32);
        let sprite = [0xf0, 0x80, 0xf0, 0x80, 0x80];
        assert!(!fb.xor_sprite(10, 10, &sprite));
        assert!(fb.xor_sprite(10, 10, &sprite));
        assert_eq!(fb, FrameBuffer::new(64, 32));
    }

    #[test]
    fn test_sprite_xors() {
        let mut fb = FrameBuffer::new(64, 32);
        fb.xor_sprite(2, 0, &[0x50]); // 0101
        let collided = fb.xor_sprite(2, 0, &[0xc0]); // 1100
        assert!(collided);
        let row: Vec<bool> = (2..6).map(|x| fb.pixel(x, 0)).collect();
        assert_eq!(row, vec![true, false, false, true]);
    }

    #[test]
    fn test_sprite_clips_at_edges() {
        let mut fb = FrameBuffer::new(64, 32);
        fb.xor_sprite(60, 30, &[0xff, 0xff, 0xff]);
        assert!(fb.pixel(63, 31));
        let lit = (0..64)
            .flat_map(|x| (0..32).map(move |y| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y))
            .count();
        assert_eq!(lit, 4 * 2);
    }

    #[test]
    fn test_sprite_origin_wraps() {
        let mut fb = FrameBuffer::new(64, 32);
        fb.xor_sprite(64 + 3, 32 + 2, &[0x80]);
        assert!(fb.pixel(3, 2));
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new(64, 32);
        fb.xor_sprite(0, 0, &[0xff; 8]);
        fb.clear();
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    // HeadlessDisplay tests
    #[test]
    fn test_headless_draws() -> Result<()> {
        let mut d = HeadlessDisplay::new(64, 32);
        assert_eq!(d.resolution(), (64, 32));
        assert!(!d.render_sprite(0, 0, &[0x80])?);
        assert!(d.render_sprite(0, 0, &[0x80])?);
        d.clear()?;
        assert!(!d.frame.pixel(0, 0));
        Ok(())
    }

    // MonoTermDisplay tests
    #[test]
    #[ignore]
    // NB. needs a real terminal
    fn test_term_display_draws() -> Result<()> {
        let mut d = MonoTermDisplay::new(64, 32)?;
        assert_eq!(d.resolution(), (64, 32));
        assert!(!d.render_sprite(0, 0, &[0xf0, 0x90, 0x90, 0x90, 0xf0])?);
        d.clear()
    }
}
