//! Driver handle and shared plumbing.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::bus::RegisterBus;
use crate::clock::ClockPlans;
use crate::config::{BusyWait, ColorDepth, Ra8876Config};
use crate::error::Error;
use crate::log::warn;
use crate::packing::FontSize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Readiness polls during bring-up, one per [`READY_POLL_MS`].
pub(crate) const READY_POLLS: u32 = 250;
/// Delay between bring-up readiness polls.
pub(crate) const READY_POLL_MS: u32 = 1;

// ---------------------------------------------------------------------------
// NoResetPin
// ---------------------------------------------------------------------------

/// Placeholder reset pin for boards that leave the RA8876 reset line
/// unconnected. Bring-up falls back to a software reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResetPin;

impl digital::ErrorType for NoResetPin {
    type Error = Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Host-side mirror of chip state the driver needs between calls.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeviceState {
    pub(crate) clocks: Option<ClockPlans>,
    pub(crate) text_color: Rgb565,
    pub(crate) font_size: FontSize,
    pub(crate) text_scale: (u8, u8),
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            clocks: None,
            text_color: Rgb565::WHITE,
            font_size: FontSize::Px16,
            text_scale: (1, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// Ra8876
// ---------------------------------------------------------------------------

/// RA8876 driver.
///
/// Generic over:
/// - `SPI`: [`SpiDevice`] wired to the controller (mode 3, up to ~10 MHz
///   before the PLLs are running)
/// - `RST`: [`OutputPin`] driving the active-low reset line
/// - `DELAY`: [`DelayNs`] used for reset pulses and readiness polling
///
/// The chip is unusable until [`init`](Self::init) succeeds.
pub struct Ra8876<SPI, RST, DELAY> {
    pub(crate) bus: RegisterBus<SPI>,
    pub(crate) reset: Option<RST>,
    pub(crate) delay: DELAY,
    pub(crate) config: Ra8876Config,
    pub(crate) state: DeviceState,
}

impl<SPI, DELAY> Ra8876<SPI, NoResetPin, DELAY>
where
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Driver for a board without a reset line.
    pub fn without_reset_pin(spi: SPI, delay: DELAY, config: Ra8876Config) -> Self {
        Self::new(spi, None, delay, config)
    }
}

impl<SPI, RST, DELAY> Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Create a driver. No bus traffic happens until [`init`](Self::init).
    pub fn new(spi: SPI, reset: Option<RST>, delay: DELAY, config: Ra8876Config) -> Self {
        Self {
            bus: RegisterBus::new(spi),
            reset,
            delay,
            config,
            state: DeviceState::default(),
        }
    }

    /// Consume the driver and return its peripherals.
    pub fn release(self) -> (SPI, Option<RST>, DELAY) {
        (self.bus.release(), self.reset, self.delay)
    }

    /// Configuration the driver was created with.
    pub fn config(&self) -> &Ra8876Config {
        &self.config
    }

    /// Panel width in pixels.
    pub fn width(&self) -> u16 {
        self.config.display.width
    }

    /// Panel height in pixels.
    pub fn height(&self) -> u16 {
        self.config.display.height
    }

    /// Pixel format programmed at bring-up.
    pub fn color_depth(&self) -> ColorDepth {
        self.config.color_depth
    }

    /// PLL settings from the last successful PLL programming.
    pub fn clock_plans(&self) -> Option<ClockPlans> {
        self.state.clocks
    }

    /// Direct register access for functions the driver does not wrap.
    pub fn register_bus(&mut self) -> &mut RegisterBus<SPI> {
        &mut self.bus
    }

    // -----------------------------------------------------------------------
    // Status polling
    // -----------------------------------------------------------------------

    /// Wait until every bit in `mask` reads back clear, under the configured
    /// [`BusyWait`] policy.
    pub(crate) fn wait_status_clear(&mut self, mask: u8) -> Result<(), Error> {
        match self.config.busy_wait {
            BusyWait::Unbounded => loop {
                if self.bus.read_status()? & mask == 0 {
                    return Ok(());
                }
            },
            BusyWait::Bounded { timeout_us, poll_interval_us } => {
                let mut waited_us = 0u32;
                loop {
                    let status = self.bus.read_status()?;
                    if status & mask == 0 {
                        return Ok(());
                    }
                    if waited_us >= timeout_us {
                        warn!("status {} still busy after {} us", status, waited_us);
                        return Err(Error::EngineTimeout);
                    }
                    self.delay.delay_us(poll_interval_us);
                    waited_us = waited_us.saturating_add(poll_interval_us.max(1));
                }
            }
        }
    }

    /// Poll the status register up to [`READY_POLLS`] times until `ready`
    /// holds. Returns whether it did.
    pub(crate) fn poll_ready(&mut self, ready: impl Fn(u8) -> bool) -> Result<bool, Error> {
        for _ in 0..READY_POLLS {
            self.delay.delay_ms(READY_POLL_MS);
            if ready(self.bus.read_status()?) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
