//! Register field packing.
//!
//! Pure functions that turn structured values into the bytes the chip
//! expects. Nothing here touches the bus.

// Every narrowing cast below follows a range check or a mask that bounds the
// value to the target width.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects
)]

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, RgbColor};

use crate::clock::ClockPlan;
use crate::config::{DisplayTimingConfig, MemoryTimingConfig};
use crate::error::{ConfigField, Error};
use crate::registers::{AW_COLOR_LINEAR, DCR0, DCR1};

// ---------------------------------------------------------------------------
// SDRAM
// ---------------------------------------------------------------------------

/// SDRAM controller register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdramRegisters {
    /// SDRAR: bank count, row and column address widths.
    pub attribute: u8,
    /// SDRMD: CAS latency.
    pub mode: u8,
    /// SDR_REF_ITVL: memory clocks between auto refresh commands.
    pub refresh_interval: u16,
}

impl SdramRegisters {
    /// Pack a memory configuration, rejecting unsupported geometry.
    pub fn from_config(config: &MemoryTimingConfig) -> Result<Self, Error> {
        let reject = |field| Err(Error::UnsupportedConfig(field));

        let bank_bit = match config.banks {
            2 => 0x00,
            4 => 0x20,
            _ => return reject(ConfigField::Banks),
        };
        if !(11..=13).contains(&config.row_bits) {
            return reject(ConfigField::RowBits);
        }
        if !(8..=12).contains(&config.col_bits) {
            return reject(ConfigField::ColumnBits);
        }
        if !(2..=3).contains(&config.cas_latency) {
            return reject(ConfigField::CasLatency);
        }

        // Clocks per full refresh, spread over every row.
        let clocks = u64::from(config.refresh_ms) * u64::from(config.speed_mhz) * 1000;
        let Ok(refresh_interval) = u16::try_from(clocks >> config.row_bits) else {
            return reject(ConfigField::RefreshInterval);
        };

        Ok(Self {
            attribute: bank_bit | (((config.row_bits - 11) & 0x03) << 3) | (config.col_bits & 0x03),
            mode: config.cas_latency & 0x03,
            refresh_interval,
        })
    }
}

// ---------------------------------------------------------------------------
// Panel timing
// ---------------------------------------------------------------------------

/// Panel timing register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayTimingRegisters {
    /// HDWR: width / 8 - 1.
    pub hdwr: u8,
    /// HDWFTR: width % 8.
    pub hdwftr: u8,
    /// VDHR: height - 1.
    pub vdhr: u16,
    /// HNDR: back porch / 8 - 1.
    pub hndr: u8,
    /// HNDFTR: back porch % 8.
    pub hndftr: u8,
    /// HSTR: (front porch + 4) / 8 - 1.
    pub hstr: u8,
    /// HPWR: (pulse width + 4) / 8 - 1.
    pub hpwr: u8,
    /// VNDR: back porch - 1.
    pub vndr: u16,
    /// VSTR: front porch - 1.
    pub vstr: u8,
    /// VPWR: pulse width - 1.
    pub vpwr: u8,
}

impl DisplayTimingRegisters {
    /// Pack a panel configuration, rejecting values that would underflow or
    /// overflow their register.
    pub fn from_config(config: &DisplayTimingConfig) -> Result<Self, Error> {
        if config.dot_clock_khz == 0 {
            return Err(Error::UnsupportedConfig(ConfigField::DotClock));
        }
        if !(8..=2048).contains(&config.width) {
            return Err(Error::UnsupportedConfig(ConfigField::Width));
        }
        if !(1..=8192).contains(&config.height) {
            return Err(Error::UnsupportedConfig(ConfigField::Height));
        }
        Ok(Self {
            hdwr: eighths_minus_one(config.width, 0, ConfigField::Width)?,
            hdwftr: (config.width % 8) as u8,
            vdhr: config.height - 1,
            hndr: eighths_minus_one(config.h_back_porch, 0, ConfigField::HorizontalBackPorch)?,
            hndftr: (config.h_back_porch % 8) as u8,
            hstr: eighths_minus_one(config.h_front_porch, 4, ConfigField::HorizontalFrontPorch)?,
            hpwr: eighths_minus_one(config.h_pulse_width, 4, ConfigField::HorizontalPulseWidth)?,
            vndr: config
                .v_back_porch
                .checked_sub(1)
                .ok_or(Error::UnsupportedConfig(ConfigField::VerticalBackPorch))?,
            vstr: minus_one_u8(config.v_front_porch, ConfigField::VerticalFrontPorch)?,
            vpwr: minus_one_u8(config.v_pulse_width, ConfigField::VerticalPulseWidth)?,
        })
    }
}

/// `(value + bias) / 8 - 1`, which must land in 0..=255.
fn eighths_minus_one(value: u16, bias: u16, field: ConfigField) -> Result<u8, Error> {
    let units = (u32::from(value) + u32::from(bias)) / 8;
    units
        .checked_sub(1)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or(Error::UnsupportedConfig(field))
}

fn minus_one_u8(value: u16, field: ConfigField) -> Result<u8, Error> {
    value
        .checked_sub(1)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or(Error::UnsupportedConfig(field))
}

/// CCR for panel output: 24-bit TFT bus (bits\[4:3\] = 0), 8-bit host bus
/// (bit 0 = 0).
pub const fn panel_chip_config(ccr: u8) -> u8 {
    ccr & 0xE7 & 0xFE
}

/// DPCR for panel output: top-to-bottom scan, RGB color order, data latched
/// on the PCLK falling edge.
pub const fn panel_display_config(dpcr: u8) -> u8 {
    (dpcr & 0xFB & 0xF8) | 0x80
}

/// PCSR for panel output: HSYNC and VSYNC active high, DE active high.
pub const fn panel_sync_polarity(pcsr: u8) -> u8 {
    (pcsr | 0x80 | 0x40) & 0xDF
}

// ---------------------------------------------------------------------------
// PLL
// ---------------------------------------------------------------------------

/// `(control 1, control 2)` bytes for a PLL: divider exponent in bits\[3:1\],
/// multiplier in bits\[5:0\].
pub const fn pll_control(plan: ClockPlan) -> (u8, u8) {
    (plan.k << 1, plan.n)
}

// ---------------------------------------------------------------------------
// Color and coordinates
// ---------------------------------------------------------------------------

/// Foreground color registers `[red, green, blue]`, each channel left
/// aligned in its byte.
pub fn color_channels(color: Rgb565) -> [u8; 3] {
    [color.r() << 3, color.g() << 2, color.b() << 3]
}

/// Memory port bytes for one RGB565 pixel, low byte first.
pub fn pixel_bytes_16(color: Rgb565) -> [u8; 2] {
    color.into_storage().to_le_bytes()
}

/// Memory port bytes for one pixel at 24 bpp: blue, green, red.
pub fn pixel_bytes_24(color: Rgb565) -> [u8; 3] {
    let [r, g, b] = color_channels(color);
    [b, g, r]
}

/// Largest value the 13-bit coordinate registers hold.
pub const COORD_MAX: i32 = 0x1FFF;

/// Clamp a signed coordinate into the chip's coordinate space.
pub fn coord(value: i32) -> u16 {
    value.clamp(0, COORD_MAX) as u16
}

/// Clamp a point into the chip's coordinate space.
pub fn point(p: Point) -> (u16, u16) {
    (coord(p.x), coord(p.y))
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// AW_COLOR with the addressing mode bit set for `width` (0 = linear).
pub const fn canvas_addressing(aw_color: u8, width: u16) -> u8 {
    if width == 0 {
        aw_color | AW_COLOR_LINEAR
    } else {
        aw_color & !AW_COLOR_LINEAR
    }
}

// ---------------------------------------------------------------------------
// Geometry commands
// ---------------------------------------------------------------------------

/// Accelerated drawing commands of the 2D engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShapeCommand {
    /// Straight line between two points.
    Line,
    /// Rectangle outline between two corners.
    Rect,
    /// Filled rectangle between two corners.
    FilledRect,
    /// Triangle outline through three points.
    Triangle,
    /// Filled triangle through three points.
    FilledTriangle,
    /// Ellipse outline from centre and radii.
    Ellipse,
    /// Filled ellipse from centre and radii.
    FilledEllipse,
}

impl ShapeCommand {
    /// `(control register, command byte)` that starts the operation.
    pub const fn trigger(self) -> (u8, u8) {
        match self {
            Self::Line => (DCR0, 0x80),
            Self::Triangle => (DCR0, 0xA2),
            Self::FilledTriangle => (DCR0, 0xE2),
            Self::Rect => (DCR1, 0xA0),
            Self::FilledRect => (DCR1, 0xE0),
            Self::Ellipse => (DCR1, 0x80),
            Self::FilledEllipse => (DCR1, 0xC0),
        }
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Internal character generator glyph heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontSize {
    /// 8×16.
    #[default]
    Px16,
    /// 12×24.
    Px24,
    /// 16×32.
    Px32,
}

impl FontSize {
    /// Size index used by CCR0 bits\[5:4\].
    pub const fn index(self) -> u8 {
        match self {
            Self::Px16 => 0,
            Self::Px24 => 1,
            Self::Px32 => 2,
        }
    }

    /// Glyph height in pixels at 1× scale.
    pub const fn height(self) -> u16 {
        (self.index() as u16 + 2) * 8
    }
}

/// Character sets of the internal character generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InternalEncoding {
    /// ISO 8859-1, Western European.
    #[default]
    Latin1,
    /// ISO 8859-2, Central European.
    Latin2,
    /// ISO 8859-4, Northern European.
    Latin4,
    /// ISO 8859-5, Cyrillic.
    Cyrillic,
}

impl InternalEncoding {
    /// CCR0 bits\[1:0\].
    pub const fn code(self) -> u8 {
        match self {
            Self::Latin1 => 0,
            Self::Latin2 => 1,
            Self::Latin4 => 2,
            Self::Cyrillic => 3,
        }
    }
}

/// CCR0 for the internal character generator.
pub const fn internal_font_select(size: FontSize, encoding: InternalEncoding) -> u8 {
    ((size.index() & 0x03) << 4) | encoding.code()
}

/// CCR1 with the scale fields replaced. Scales are clamped to 1..=4.
pub fn text_scale(ccr1: u8, x_scale: u8, y_scale: u8) -> u8 {
    let x = x_scale.clamp(1, 4) - 1;
    let y = y_scale.clamp(1, 4) - 1;
    (ccr1 & 0xF0) | (x << 2) | y
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
