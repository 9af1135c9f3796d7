//! `embedded-graphics` integration.
//!
//! Solid fills and clears go to the 2D engine; everything else falls back to
//! single-pixel writes through the memory data port.

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{Dimensions, OriginDimensions, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::Pixel;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::driver::Ra8876;
use crate::error::Error;

impl<SPI, RST, DELAY> OriginDimensions for Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    fn size(&self) -> Size {
        Size::new(u32::from(self.width()), u32::from(self.height()))
    }
}

// ---------------------------------------------------------------------------
// DrawTarget
// ---------------------------------------------------------------------------

impl<SPI, RST, DELAY> DrawTarget for Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    type Color = Rgb565;
    type Error = Error;

    /// Pixels outside the panel are dropped.
    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.draw_pixel(point, color)?;
            }
        }
        Ok(())
    }

    /// Accelerated filled rectangle, clipped to the panel.
    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        match area.bottom_right() {
            Some(bottom_right) => self.fill_rect(area.top_left, bottom_right, color),
            None => Ok(()),
        }
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_screen(color)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
