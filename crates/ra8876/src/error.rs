//! Driver error types.

use core::fmt;

use crate::clock::ClockDomain;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors returned by the RA8876 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI communication error.
    Bus,
    /// Reset pin operation error.
    Gpio,
    /// An addressing call was given an out-of-range or misaligned value.
    /// Nothing was written to the chip.
    InvalidParameter(ParameterError),
    /// A timing configuration value is outside what the chip supports.
    /// Nothing was written to the chip.
    UnsupportedConfig(ConfigField),
    /// No PLL settings satisfy a clock domain, or the derived clocks violate
    /// the cross-domain ratio rules.
    ClockUnsatisfiable(ClockFailure),
    /// A bring-up stage polled for readiness and gave up.
    NotReady(Stage),
    /// The 2D engine or the write FIFO did not finish within the
    /// configured [`BusyWait`](crate::BusyWait) limit.
    EngineTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "SPI communication error"),
            Self::Gpio => write!(f, "GPIO error"),
            Self::InvalidParameter(p) => write!(f, "Invalid parameter: {p}"),
            Self::UnsupportedConfig(field) => write!(f, "Unsupported configuration: {field}"),
            Self::ClockUnsatisfiable(c) => write!(f, "Clock configuration unsatisfiable: {c}"),
            Self::NotReady(stage) => write!(f, "Hardware not ready during {stage}"),
            Self::EngineTimeout => write!(f, "Drawing engine did not complete"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Detail enums
// ---------------------------------------------------------------------------

/// Which addressing constraint was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterError {
    /// Canvas start address is not a multiple of 4.
    CanvasAddressAlignment,
    /// Canvas width is not a multiple of 4 or exceeds 8191.
    CanvasWidth,
    /// Active window extends past x 8188 or y 8191.
    WindowBounds,
    /// Main image start address is not a multiple of 4.
    DisplayAddressAlignment,
    /// Main image width is not a multiple of 4 or exceeds 8188.
    DisplayWidth,
    /// Display offset exceeds x 8188 or y 8191.
    OffsetBounds,
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::CanvasAddressAlignment => "canvas address must be a multiple of 4",
            Self::CanvasWidth => "canvas width must be a multiple of 4 and at most 8191",
            Self::WindowBounds => "active window exceeds canvas coordinate space",
            Self::DisplayAddressAlignment => "display address must be a multiple of 4",
            Self::DisplayWidth => "display width must be a multiple of 4 and at most 8188",
            Self::OffsetBounds => "display offset exceeds canvas coordinate space",
        };
        f.write_str(msg)
    }
}

/// Configuration field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    /// Oscillator frequency is zero.
    Oscillator,
    /// SDRAM CAS latency (2 or 3).
    CasLatency,
    /// SDRAM bank count (2 or 4).
    Banks,
    /// SDRAM row address bits (11 to 13).
    RowBits,
    /// SDRAM column address bits (8 to 12).
    ColumnBits,
    /// SDRAM refresh interval does not fit the 16-bit register.
    RefreshInterval,
    /// Panel width.
    Width,
    /// Panel height.
    Height,
    /// Pixel clock.
    DotClock,
    /// Horizontal front porch.
    HorizontalFrontPorch,
    /// Horizontal back porch.
    HorizontalBackPorch,
    /// Horizontal sync pulse width.
    HorizontalPulseWidth,
    /// Vertical front porch.
    VerticalFrontPorch,
    /// Vertical back porch.
    VerticalBackPorch,
    /// Vertical sync pulse width.
    VerticalPulseWidth,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Oscillator => "oscillator frequency",
            Self::CasLatency => "CAS latency",
            Self::Banks => "bank count",
            Self::RowBits => "row address bits",
            Self::ColumnBits => "column address bits",
            Self::RefreshInterval => "refresh interval",
            Self::Width => "width",
            Self::Height => "height",
            Self::DotClock => "dot clock",
            Self::HorizontalFrontPorch => "horizontal front porch",
            Self::HorizontalBackPorch => "horizontal back porch",
            Self::HorizontalPulseWidth => "horizontal pulse width",
            Self::VerticalFrontPorch => "vertical front porch",
            Self::VerticalBackPorch => "vertical back porch",
            Self::VerticalPulseWidth => "vertical pulse width",
        };
        f.write_str(name)
    }
}

/// Why the clock tree could not be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockFailure {
    /// The solver found no valid (n, k) pair for this domain.
    NoSolution(ClockDomain),
    /// Core clock is faster than the memory clock.
    CoreAboveMemory,
    /// Core clock is at most half the memory clock.
    CoreTooSlowForMemory,
    /// Core clock is at most 1.5 times the scan clock.
    CoreTooSlowForScan,
}

impl fmt::Display for ClockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSolution(domain) => write!(f, "no PLL settings for {domain} clock"),
            Self::CoreAboveMemory => write!(f, "core clock exceeds memory clock"),
            Self::CoreTooSlowForMemory => write!(f, "core clock must exceed half the memory clock"),
            Self::CoreTooSlowForScan => write!(f, "core clock must exceed 1.5x the scan clock"),
        }
    }
}

/// Bring-up stage that reported a readiness failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// PLL programming and lock readback.
    Pll,
    /// SDRAM initialization.
    Memory,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pll => "PLL programming",
            Self::Memory => "SDRAM init",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Bus.to_string(), "SPI communication error");
        assert_eq!(Error::EngineTimeout.to_string(), "Drawing engine did not complete");
        assert_eq!(
            Error::NotReady(Stage::Memory).to_string(),
            "Hardware not ready during SDRAM init"
        );
        assert_eq!(
            Error::NotReady(Stage::Pll).to_string(),
            "Hardware not ready during PLL programming"
        );
        assert_eq!(
            Error::UnsupportedConfig(ConfigField::Banks).to_string(),
            "Unsupported configuration: bank count"
        );
        assert_eq!(
            Error::ClockUnsatisfiable(ClockFailure::NoSolution(ClockDomain::Scan)).to_string(),
            "Clock configuration unsatisfiable: no PLL settings for scan clock"
        );
    }

    #[test]
    fn test_invalid_parameter_display() {
        assert_eq!(
            Error::InvalidParameter(ParameterError::CanvasAddressAlignment).to_string(),
            "Invalid parameter: canvas address must be a multiple of 4"
        );
    }
}
