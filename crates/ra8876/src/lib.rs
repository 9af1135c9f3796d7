//! RA8876 TFT Controller Driver
//!
//! Blocking `embedded-hal` 1.0 driver for the RAiO RA8876 display controller
//! attached over its 4-wire serial host interface.
//!
//! # Architecture
//!
//! ```text
//! embedded-graphics DrawTarget / text output
//!         ↓
//! Geometry engine, canvas/window addressing
//!         ↓
//! Bring-up sequencer (reset → clocks → PLL → SDRAM → panel → text)
//!         ↓
//! Register access (8/16/32-bit, low byte first)
//!         ↓
//! Framed serial transport (SpiDevice)
//! ```
//!
//! The clock solver and all register field packing are pure functions
//! ([`clock`], [`packing`]) that can be exercised without a bus.
//!
//! # Features
//!
//! - `std` - `std::error::Error` for [`Error`]
//! - `defmt` - log bring-up and failures through `defmt`
//! - `tracing` - log through `tracing` (desktop / simulator builds)
//!
//! # Example
//!
//! ```no_run
//! # fn demo<SPI, RST, D>(spi: SPI, rst: RST, delay: D) -> Result<(), ra8876::Error>
//! # where SPI: embedded_hal::spi::SpiDevice, RST: embedded_hal::digital::OutputPin,
//! #       D: embedded_hal::delay::DelayNs {
//! use embedded_graphics::pixelcolor::Rgb565;
//! use embedded_graphics::prelude::*;
//! use ra8876::{Ra8876, Ra8876Config};
//!
//! let mut display = Ra8876::new(spi, Some(rst), delay, Ra8876Config::default());
//! display.init()?;
//! display.clear_screen(Rgb565::BLACK)?;
//! display.fill_circle(Point::new(512, 300), 100, Rgb565::RED)?;
//! # Ok(()) }
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod log;

pub mod bus;
pub mod clock;
pub mod config;
pub mod error;
pub mod packing;
pub mod registers;

mod bringup;
mod canvas;
mod driver;
mod geometry;
mod graphics;
mod text;

pub use bus::RegisterBus;
pub use clock::{ClockDomain, ClockPlan, ClockPlans, VcoBandCheck};
pub use config::{
    BusyWait, ColorDepth, DisplayTimingConfig, MemoryTimingConfig, Ra8876Config,
};
pub use driver::{NoResetPin, Ra8876};
pub use error::{ClockFailure, ConfigField, Error, ParameterError, Stage};
pub use packing::{FontSize, InternalEncoding, ShapeCommand};
