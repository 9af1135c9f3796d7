//! Driver configuration.
//!
//! All values are supplied by the caller at construction time. The `Default`
//! impls describe the reference board: a 10 MHz crystal, a 16 MB SDRAM at
//! 120 MHz and a 1024×600 TFT panel.

use crate::clock::VcoBandCheck;
use crate::error::{ConfigField, Error};
use crate::packing::{DisplayTimingRegisters, SdramRegisters};

// ---------------------------------------------------------------------------
// MemoryTimingConfig
// ---------------------------------------------------------------------------

/// External SDRAM parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryTimingConfig {
    /// Maximum clock in MHz.
    pub speed_mhz: u16,
    /// CAS latency in clocks (2 or 3).
    pub cas_latency: u8,
    /// Number of banks (2 or 4).
    pub banks: u8,
    /// Row address bits (11 to 13).
    pub row_bits: u8,
    /// Column address bits (8 to 12).
    pub col_bits: u8,
    /// Time to refresh every row, in milliseconds.
    pub refresh_ms: u16,
}

impl Default for MemoryTimingConfig {
    /// 4 banks, 12-bit rows, 9-bit columns, CAS 3 at 120 MHz.
    fn default() -> Self {
        Self {
            speed_mhz: 120,
            cas_latency: 3,
            banks: 4,
            row_bits: 12,
            col_bits: 9,
            refresh_ms: 64,
        }
    }
}

impl MemoryTimingConfig {
    /// Check every field against the SDRAM controller's supported ranges.
    pub fn validate(&self) -> Result<(), Error> {
        SdramRegisters::from_config(self).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// DisplayTimingConfig
// ---------------------------------------------------------------------------

/// TFT panel timing. Horizontal values are in pixels, vertical in lines.
///
/// The controller counts horizontal porches in units of 8 pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayTimingConfig {
    /// Visible width in pixels.
    pub width: u16,
    /// Visible height in lines.
    pub height: u16,
    /// Pixel clock in kHz.
    pub dot_clock_khz: u32,
    /// Horizontal front porch.
    pub h_front_porch: u16,
    /// Horizontal back porch.
    pub h_back_porch: u16,
    /// HSYNC pulse width.
    pub h_pulse_width: u16,
    /// Vertical front porch.
    pub v_front_porch: u16,
    /// Vertical back porch.
    pub v_back_porch: u16,
    /// VSYNC pulse width.
    pub v_pulse_width: u16,
}

impl Default for DisplayTimingConfig {
    /// 1024×600 panel with a 50 MHz pixel clock.
    fn default() -> Self {
        Self {
            width: 1024,
            height: 600,
            dot_clock_khz: 50_000,
            h_front_porch: 160,
            h_back_porch: 160,
            h_pulse_width: 70,
            v_front_porch: 12,
            v_back_porch: 23,
            v_pulse_width: 10,
        }
    }
}

impl DisplayTimingConfig {
    /// Check that every value fits the panel timing registers.
    pub fn validate(&self) -> Result<(), Error> {
        DisplayTimingRegisters::from_config(self).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// ColorDepth
// ---------------------------------------------------------------------------

/// Main window and canvas pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorDepth {
    /// RGB565, two bytes per pixel.
    #[default]
    Bpp16,
    /// RGB888, three bytes per pixel.
    Bpp24,
}

impl ColorDepth {
    /// Bits per pixel.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bpp16 => 16,
            Self::Bpp24 => 24,
        }
    }

    /// MPWCTR value: PIP windows off, sync outputs on, main image depth.
    pub const fn main_window_control(self) -> u8 {
        match self {
            Self::Bpp16 => 0x04,
            Self::Bpp24 => 0x08,
        }
    }

    /// AW_COLOR depth field.
    pub const fn canvas_depth(self) -> u8 {
        match self {
            Self::Bpp16 => 0x01,
            Self::Bpp24 => 0x02,
        }
    }
}

// ---------------------------------------------------------------------------
// BusyWait
// ---------------------------------------------------------------------------

/// How long to wait for the 2D engine and the write FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusyWait {
    /// Poll every `poll_interval_us` and give up with
    /// [`Error::EngineTimeout`] after `timeout_us`.
    Bounded {
        /// Total time budget per wait.
        timeout_us: u32,
        /// Delay between status reads.
        poll_interval_us: u32,
    },
    /// Poll back-to-back until the chip reports idle, however long it takes.
    Unbounded,
}

impl Default for BusyWait {
    fn default() -> Self {
        Self::Bounded { timeout_us: 500_000, poll_interval_us: 10 }
    }
}

// ---------------------------------------------------------------------------
// Ra8876Config
// ---------------------------------------------------------------------------

/// Everything the driver needs to bring the chip up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ra8876Config {
    /// Crystal frequency in kHz. Fixed for the life of the driver.
    pub oscillator_khz: u32,
    /// SDRAM timing.
    pub memory: MemoryTimingConfig,
    /// Panel timing.
    pub display: DisplayTimingConfig,
    /// Pixel format.
    pub color_depth: ColorDepth,
    /// Engine completion wait policy.
    pub busy_wait: BusyWait,
    /// PLL VCO band policy.
    pub vco_band: VcoBandCheck,
}

impl Default for Ra8876Config {
    fn default() -> Self {
        Self::new(MemoryTimingConfig::default(), DisplayTimingConfig::default())
    }
}

impl Ra8876Config {
    /// Reference oscillator on the common RA8876 boards.
    pub const DEFAULT_OSCILLATOR_KHZ: u32 = 10_000;

    /// Configuration for the given memory and panel, with default policies.
    pub fn new(memory: MemoryTimingConfig, display: DisplayTimingConfig) -> Self {
        Self {
            oscillator_khz: Self::DEFAULT_OSCILLATOR_KHZ,
            memory,
            display,
            color_depth: ColorDepth::default(),
            busy_wait: BusyWait::default(),
            vco_band: VcoBandCheck::default(),
        }
    }

    /// Validate everything that can be checked without the chip.
    pub fn validate(&self) -> Result<(), Error> {
        if self.oscillator_khz == 0 {
            return Err(Error::UnsupportedConfig(ConfigField::Oscillator));
        }
        self.memory.validate()?;
        self.display.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(Ra8876Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_oscillator_rejected() {
        let config = Ra8876Config { oscillator_khz: 0, ..Ra8876Config::default() };
        assert_eq!(config.validate(), Err(Error::UnsupportedConfig(ConfigField::Oscillator)));
    }

    #[test]
    fn test_depth_tables() {
        assert_eq!(ColorDepth::Bpp16.main_window_control(), 0x04);
        assert_eq!(ColorDepth::Bpp24.main_window_control(), 0x08);
        assert_eq!(ColorDepth::Bpp16.canvas_depth(), 0x01);
        assert_eq!(ColorDepth::Bpp24.canvas_depth(), 0x02);
        assert_eq!(ColorDepth::Bpp24.bits(), 24);
    }

    #[test]
    fn test_default_busy_wait_is_bounded() {
        assert!(matches!(BusyWait::default(), BusyWait::Bounded { .. }));
    }
}
