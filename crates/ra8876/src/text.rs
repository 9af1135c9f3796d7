//! Text output through the internal character generator.
//!
//! In text mode every byte written to the memory data port is rendered as a
//! glyph at the text cursor, which the chip then advances on its own. The
//! driver only handles mode switching, line breaks and the character
//! control registers.

use core::fmt;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::driver::Ra8876;
use crate::error::Error;
use crate::packing::{self, FontSize, InternalEncoding};
use crate::registers::*;

/// Substitute for characters the internal fonts cannot encode.
const REPLACEMENT: u8 = b'?';

impl<SPI, RST, DELAY> Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    /// Move the text cursor.
    pub fn set_cursor(&mut self, x: u16, y: u16) -> Result<(), Error> {
        self.bus.write_reg16(F_CURX0, x)?;
        self.bus.write_reg16(F_CURY0, y)
    }

    /// Current text cursor column, as advanced by the chip.
    pub fn cursor_x(&mut self) -> Result<u16, Error> {
        self.bus.read_reg16(F_CURX0)
    }

    /// Current text cursor row, as advanced by the chip.
    pub fn cursor_y(&mut self) -> Result<u16, Error> {
        self.bus.read_reg16(F_CURY0)
    }

    // -----------------------------------------------------------------------
    // Style
    // -----------------------------------------------------------------------

    /// Glyph color for subsequent text output.
    pub fn set_text_color(&mut self, color: Rgb565) {
        self.state.text_color = color;
    }

    /// Glyph magnification per axis, each clamped to 1..=4.
    pub fn set_text_scale(&mut self, x_scale: u8, y_scale: u8) -> Result<(), Error> {
        self.bus.modify_reg(CCR1, |ccr1| packing::text_scale(ccr1, x_scale, y_scale))?;
        self.state.text_scale = (x_scale.clamp(1, 4), y_scale.clamp(1, 4));
        Ok(())
    }

    /// Use the internal character generator with the given size and
    /// character set. Glyph backgrounds are transparent.
    pub fn select_internal_font(&mut self, size: FontSize, encoding: InternalEncoding) -> Result<(), Error> {
        self.bus.write_reg(CCR0, packing::internal_font_select(size, encoding))?;
        self.bus.modify_reg(CCR1, |ccr1| ccr1 | CCR1_TRANSPARENT)?;
        self.state.font_size = size;
        Ok(())
    }

    /// Height of one text line in pixels at the current font and scale.
    pub fn text_height(&self) -> u16 {
        self.state
            .font_size
            .height()
            .saturating_mul(u16::from(self.state.text_scale.1))
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    fn enter_text_mode(&mut self) -> Result<(), Error> {
        self.write_foreground(self.state.text_color)?;
        self.wait_status_clear(STATUS_CORE_BUSY)?;
        self.bus.modify_reg(ICR, |icr| icr | ICR_TEXT_MODE)
    }

    fn enter_graphics_mode(&mut self) -> Result<(), Error> {
        let idle = self.wait_status_clear(STATUS_CORE_BUSY);
        self.bus.modify_reg(ICR, |icr| icr & !ICR_TEXT_MODE)?;
        idle
    }

    /// Run `body` with the memory data port selected in text mode. Graphics
    /// mode is restored even when `body` fails; the first error wins.
    fn with_text_mode(&mut self, body: impl FnOnce(&mut Self) -> Result<(), Error>) -> Result<(), Error> {
        self.enter_text_mode()?;
        let written = self.bus.write_command(MRWDP).and_then(|()| body(self));
        let restored = self.enter_graphics_mode();
        written.and(restored)
    }

    fn push_glyph(&mut self, code: u8) -> Result<(), Error> {
        self.wait_status_clear(STATUS_WRITE_FIFO_FULL)?;
        self.bus.write_data(code)
    }

    /// Render raw character codes at the text cursor.
    pub fn put_chars(&mut self, codes: &[u8]) -> Result<(), Error> {
        self.with_text_mode(|this| codes.iter().try_for_each(|&code| this.push_glyph(code)))
    }

    /// Render a string at the text cursor.
    ///
    /// `'\n'` starts a new line at column 0, `'\r'` is ignored, and
    /// characters outside Latin-1 are shown as `?`.
    pub fn put_str(&mut self, text: &str) -> Result<(), Error> {
        self.with_text_mode(|this| {
            for c in text.chars() {
                match c {
                    '\r' => {}
                    '\n' => {
                        let next_line = this.cursor_y()?.saturating_add(this.text_height());
                        this.set_cursor(0, next_line)?;
                        this.bus.write_command(MRWDP)?;
                    }
                    _ => this.push_glyph(u8::try_from(c).unwrap_or(REPLACEMENT))?,
                }
            }
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Show or hide the built-in color bar test pattern.
    pub fn color_bar_test(&mut self, enabled: bool) -> Result<(), Error> {
        self.bus.modify_reg(DPCR, |dpcr| {
            if enabled {
                dpcr | DPCR_COLOR_BAR
            } else {
                dpcr & !DPCR_COLOR_BAR
            }
        })
    }
}

impl<SPI, RST, DELAY> fmt::Write for Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s).map_err(|_| fmt::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Ra8876Config;
    use crate::driver::NoResetPin;
    use core::fmt::Write as _;
    use embedded_graphics::pixelcolor::RgbColor;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use ra8876_sim::{Frame, SimulatedChip};

    fn sim_driver(chip: &SimulatedChip) -> Ra8876<SimulatedChip, NoResetPin, NoopDelay> {
        Ra8876::without_reset_pin(chip.clone(), NoopDelay::new(), Ra8876Config::default())
    }

    fn port_selects(chip: &SimulatedChip) -> usize {
        chip.frames()
            .iter()
            .filter(|f| matches!(f, Frame::Command(reg) if *reg == MRWDP))
            .count()
    }

    #[test]
    fn test_cursor_round_trip() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);

        display.set_cursor(300, 1000).unwrap();
        assert_eq!(display.cursor_x().unwrap(), 300);
        assert_eq!(display.cursor_y().unwrap(), 1000);
    }

    #[test]
    fn test_put_chars_in_text_mode_then_back() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);
        display.set_text_color(Rgb565::GREEN);

        display.put_chars(b"OK").unwrap();

        assert_eq!(chip.memory_port_writes(), b"OK".to_vec());
        assert_eq!([chip.register(FGCR), chip.register(FGCG), chip.register(FGCB)], [0, 0xFC, 0]);
        assert_eq!(chip.register(ICR) & ICR_TEXT_MODE, 0);

        let icr_writes: Vec<u8> = chip
            .register_writes()
            .into_iter()
            .filter(|(reg, _)| *reg == ICR)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(icr_writes, vec![ICR_TEXT_MODE, 0x00]);
        assert_eq!(port_selects(&chip), 1);
    }

    #[test]
    fn test_default_text_color_is_white() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);

        display.put_chars(b"x").unwrap();
        assert_eq!([chip.register(FGCR), chip.register(FGCG), chip.register(FGCB)], [0xF8, 0xFC, 0xF8]);
    }

    #[test]
    fn test_put_str_newline_and_carriage_return() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);
        display.set_cursor(40, 100).unwrap();

        display.put_str("Hi\r\nA").unwrap();

        assert_eq!(chip.memory_port_writes(), b"HiA".to_vec());
        assert_eq!(display.cursor_x().unwrap(), 0);
        assert_eq!(display.cursor_y().unwrap(), 116);
        assert_eq!(port_selects(&chip), 2);
    }

    #[test]
    fn test_line_height_follows_font_and_scale() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);

        display.select_internal_font(FontSize::Px24, InternalEncoding::Latin1).unwrap();
        display.set_text_scale(1, 2).unwrap();
        assert_eq!(display.text_height(), 48);

        display.put_str("\n").unwrap();
        assert_eq!(display.cursor_y().unwrap(), 48);
    }

    #[test]
    fn test_non_latin1_replaced() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);

        display.put_str("é€").unwrap();
        assert_eq!(chip.memory_port_writes(), vec![0xE9, b'?']);
    }

    #[test]
    fn test_font_select_and_scale_registers() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);

        display.select_internal_font(FontSize::Px32, InternalEncoding::Cyrillic).unwrap();
        assert_eq!(chip.register(CCR0), 0x23);
        assert_eq!(chip.register(CCR1), CCR1_TRANSPARENT);

        display.set_text_scale(2, 9).unwrap();
        assert_eq!(chip.register(CCR1), CCR1_TRANSPARENT | 0x07);
        assert_eq!(display.text_height(), 128);
    }

    #[test]
    fn test_fmt_write() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);

        write!(display, "{}", 42).unwrap();
        assert_eq!(chip.memory_port_writes(), b"42".to_vec());
    }

    #[test]
    fn test_color_bar_toggle() {
        let chip = SimulatedChip::new();
        chip.set_register(DPCR, 0x40);
        let mut display = sim_driver(&chip);

        display.color_bar_test(true).unwrap();
        assert_eq!(chip.register(DPCR), 0x60);
        display.color_bar_test(false).unwrap();
        assert_eq!(chip.register(DPCR), 0x40);
    }
}
