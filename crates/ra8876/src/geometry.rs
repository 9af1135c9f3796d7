//! Accelerated 2D drawing.
//!
//! Every shape follows the same protocol: load the coordinate registers,
//! load the foreground color, write the trigger byte from
//! [`ShapeCommand::trigger`], then wait for the engine busy flag to clear
//! under the configured [`BusyWait`](crate::BusyWait) policy.
//!
//! Single pixels bypass the engine and go straight through the memory data
//! port, so they never wait.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::config::ColorDepth;
use crate::driver::Ra8876;
use crate::error::Error;
use crate::log::trace;
use crate::packing::{self, ShapeCommand, COORD_MAX};
use crate::registers::*;

/// Coordinate payload of one engine command.
#[derive(Debug, Clone, Copy)]
enum Geometry {
    TwoPoint(Point, Point),
    ThreePoint(Point, Point, Point),
    Ellipse { center: Point, radii: Size },
}

/// Clamp a radius into the coordinate register range.
fn radius(value: u32) -> u16 {
    packing::coord(i32::try_from(value).unwrap_or(COORD_MAX))
}

impl<SPI, RST, DELAY> Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    // -----------------------------------------------------------------------
    // Engine dispatch
    // -----------------------------------------------------------------------

    fn write_point(&mut self, x_register: u8, y_register: u8, p: Point) -> Result<(), Error> {
        let (x, y) = packing::point(p);
        self.bus.write_reg16(x_register, x)?;
        self.bus.write_reg16(y_register, y)
    }

    pub(crate) fn write_foreground(&mut self, color: Rgb565) -> Result<(), Error> {
        let [r, g, b] = packing::color_channels(color);
        self.bus.write_reg(FGCR, r)?;
        self.bus.write_reg(FGCG, g)?;
        self.bus.write_reg(FGCB, b)
    }

    fn dispatch(&mut self, command: ShapeCommand, geometry: Geometry, color: Rgb565) -> Result<(), Error> {
        match geometry {
            Geometry::TwoPoint(p1, p2) => {
                self.write_point(DLHSR0, DLVSR0, p1)?;
                self.write_point(DLHER0, DLVER0, p2)?;
            }
            Geometry::ThreePoint(p1, p2, p3) => {
                self.write_point(DLHSR0, DLVSR0, p1)?;
                self.write_point(DLHER0, DLVER0, p2)?;
                self.write_point(DTPH0, DTPV0, p3)?;
            }
            Geometry::Ellipse { center, radii } => {
                self.write_point(DEHR0, DEVR0, center)?;
                self.bus.write_reg16(ELL_A0, radius(radii.width))?;
                self.bus.write_reg16(ELL_B0, radius(radii.height))?;
            }
        }
        self.write_foreground(color)?;

        let (register, start) = command.trigger();
        trace!("engine start: reg {} <- {}", register, start);
        self.bus.write_reg(register, start)?;
        self.wait_status_clear(STATUS_CORE_BUSY)
    }

    // -----------------------------------------------------------------------
    // Pixels
    // -----------------------------------------------------------------------

    /// Write one pixel through the memory data port.
    pub fn draw_pixel(&mut self, p: Point, color: Rgb565) -> Result<(), Error> {
        self.write_point(CURH0, CURV0, p)?;
        match self.config.color_depth {
            ColorDepth::Bpp16 => {
                for byte in packing::pixel_bytes_16(color) {
                    self.bus.write_reg(MRWDP, byte)?;
                }
            }
            ColorDepth::Bpp24 => {
                for byte in packing::pixel_bytes_24(color) {
                    self.bus.write_reg(MRWDP, byte)?;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Two-point shapes
    // -----------------------------------------------------------------------

    /// Straight line from `start` to `end`.
    pub fn draw_line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::Line, Geometry::TwoPoint(start, end), color)
    }

    /// Rectangle outline with opposite corners `p1` and `p2`.
    pub fn draw_rect(&mut self, p1: Point, p2: Point, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::Rect, Geometry::TwoPoint(p1, p2), color)
    }

    /// Filled rectangle with opposite corners `p1` and `p2`.
    pub fn fill_rect(&mut self, p1: Point, p2: Point, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::FilledRect, Geometry::TwoPoint(p1, p2), color)
    }

    // -----------------------------------------------------------------------
    // Triangles
    // -----------------------------------------------------------------------

    /// Triangle outline through three points.
    pub fn draw_triangle(&mut self, p1: Point, p2: Point, p3: Point, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::Triangle, Geometry::ThreePoint(p1, p2, p3), color)
    }

    /// Filled triangle through three points.
    pub fn fill_triangle(&mut self, p1: Point, p2: Point, p3: Point, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::FilledTriangle, Geometry::ThreePoint(p1, p2, p3), color)
    }

    // -----------------------------------------------------------------------
    // Ellipses
    // -----------------------------------------------------------------------

    /// Ellipse outline; `radii` holds the horizontal and vertical radius.
    pub fn draw_ellipse(&mut self, center: Point, radii: Size, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::Ellipse, Geometry::Ellipse { center, radii }, color)
    }

    /// Filled ellipse.
    pub fn fill_ellipse(&mut self, center: Point, radii: Size, color: Rgb565) -> Result<(), Error> {
        self.dispatch(ShapeCommand::FilledEllipse, Geometry::Ellipse { center, radii }, color)
    }

    /// Circle outline.
    pub fn draw_circle(&mut self, center: Point, radius: u32, color: Rgb565) -> Result<(), Error> {
        self.draw_ellipse(center, Size::new(radius, radius), color)
    }

    /// Filled circle.
    pub fn fill_circle(&mut self, center: Point, radius: u32, color: Rgb565) -> Result<(), Error> {
        self.fill_ellipse(center, Size::new(radius, radius), color)
    }

    // -----------------------------------------------------------------------
    // Whole screen
    // -----------------------------------------------------------------------

    /// Fill the panel area with `color` and home the text cursor.
    pub fn clear_screen(&mut self, color: Rgb565) -> Result<(), Error> {
        self.set_cursor(0, 0)?;
        let corner = Point::new(i32::from(self.width()), i32::from(self.height()));
        self.fill_rect(Point::zero(), corner, color)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
