//! Canvas and window addressing.
//!
//! Four windows describe how SDRAM maps to the panel:
//!
//! | Window        | Registers              | Meaning                              |
//! |---------------|------------------------|--------------------------------------|
//! | canvas region | CVSSA, CVS_IMWTH       | memory the drawing engine targets    |
//! | active window | AWUL_X/Y, AW_WTH/HT    | clip rectangle inside the canvas     |
//! | display region| MISA, MIW              | memory scanned out to the panel      |
//! | display offset| MWULX, MWULY           | panel origin inside the display image|
//!
//! Every call validates first and touches the bus only once all of its
//! arguments are known to be good.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::driver::Ra8876;
use crate::error::{Error, ParameterError};
use crate::packing;
use crate::registers::*;

/// Largest canvas width in block mode.
const CANVAS_WIDTH_MAX: u16 = 8191;
/// Right edge limit for the active window and display offset.
const X_LIMIT: u32 = 8188;
/// Bottom edge limit for the active window and display offset.
const Y_LIMIT: u32 = 8191;

const fn aligned(value: u32) -> bool {
    value & 0x03 == 0
}

fn reject(reason: ParameterError) -> Result<(), Error> {
    Err(Error::InvalidParameter(reason))
}

impl<SPI, RST, DELAY> Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Point the drawing engine at canvas memory starting at `address`.
    ///
    /// `width` is the canvas width in pixels for block addressing, or 0 to
    /// switch to linear addressing.
    pub fn set_canvas_region(&mut self, address: u32, width: u16) -> Result<(), Error> {
        if !aligned(address) {
            return reject(ParameterError::CanvasAddressAlignment);
        }
        if width != 0 && (!aligned(u32::from(width)) || width > CANVAS_WIDTH_MAX) {
            return reject(ParameterError::CanvasWidth);
        }

        self.bus.write_reg32(CVSSA0, address)?;
        if width > 0 {
            self.bus.write_reg16(CVS_IMWTH0, width)?;
        }
        self.bus.modify_reg(AW_COLOR, |aw| packing::canvas_addressing(aw, width))
    }

    /// Set the active window (drawing clip rectangle) inside the canvas.
    pub fn set_canvas_window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Error> {
        let right = u32::from(x).saturating_add(u32::from(width));
        let bottom = u32::from(y).saturating_add(u32::from(height));
        if right > X_LIMIT || bottom > Y_LIMIT {
            return reject(ParameterError::WindowBounds);
        }

        self.bus.write_reg16(AWUL_X0, x)?;
        self.bus.write_reg16(AWUL_Y0, y)?;
        self.bus.write_reg16(AW_WTH0, width)?;
        self.bus.write_reg16(AW_HT0, height)
    }

    /// Select the memory image scanned out to the panel.
    pub fn set_display_region(&mut self, address: u32, width: u16) -> Result<(), Error> {
        if !aligned(address) {
            return reject(ParameterError::DisplayAddressAlignment);
        }
        if !aligned(u32::from(width)) || u32::from(width) > X_LIMIT {
            return reject(ParameterError::DisplayWidth);
        }

        self.bus.write_reg32(MISA0, address)?;
        self.bus.write_reg16(MIW0, width)
    }

    /// Position the panel's upper-left corner inside the display image.
    ///
    /// The chip ignores the two low bits of `x`; they are cleared on write.
    pub fn set_display_offset(&mut self, x: u16, y: u16) -> Result<(), Error> {
        if u32::from(x) > X_LIMIT || u32::from(y) > Y_LIMIT {
            return reject(ParameterError::OffsetBounds);
        }

        self.bus.write_reg16(MWULX0, x & 0xFFFC)?;
        self.bus.write_reg16(MWULY0, y)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
