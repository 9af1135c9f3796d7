//! Bring-up sequence against the simulated controller.
//!
//! Stage order:
//!   1. reset (pin pulse, or software reset)
//!   2. clock derivation and ratio check
//!   3. PLL programming and lock check
//!   4. SDRAM init and ready poll
//!   5. panel, window and canvas setup
//!   6. text defaults

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use embedded_hal_mock::eh1::delay::NoopDelay;
use ra8876::registers::*;
use ra8876::{
    ClockFailure, ClockPlan, ClockPlans, ColorDepth, ConfigField, DisplayTimingConfig, Error,
    NoResetPin, Ra8876, Ra8876Config, Stage,
};
use ra8876_sim::{Behavior, Frame, SimulatedChip};

fn soft_reset_driver(chip: &SimulatedChip, config: Ra8876Config) -> Ra8876<SimulatedChip, NoResetPin, NoopDelay> {
    Ra8876::without_reset_pin(chip.clone(), NoopDelay::new(), config)
}

fn reg16(chip: &SimulatedChip, low: u8) -> u16 {
    let regs = chip.registers();
    u16::from_le_bytes([regs[usize::from(low)], regs[usize::from(low) + 1]])
}

/// Default configuration brings the panel up with every stage applied.
#[test]
fn default_bringup_programs_every_stage() {
    let chip = SimulatedChip::new();
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    display.init().unwrap();

    // SDRAM
    assert_eq!(chip.register(SDRAR), 0x29);
    assert_eq!(chip.register(SDRMD), 0x03);
    assert_eq!(reg16(&chip, SDR_REF_ITVL0), 1875);

    // Panel timing
    assert_eq!(chip.register(HDWR), 127);
    assert_eq!(reg16(&chip, VDHR0), 599);
    assert_eq!(chip.register(HNDR), 19);
    assert_eq!(chip.register(HSTR), 19);
    assert_eq!(chip.register(HPWR), 8);
    assert_eq!(reg16(&chip, VNDR0), 22);
    assert_eq!(chip.register(VSTR), 11);
    assert_eq!(chip.register(VPWR), 9);

    // Windows cover the whole panel
    assert_eq!(reg16(&chip, MIW0), 1024);
    assert_eq!(reg16(&chip, CVS_IMWTH0), 1024);
    assert_eq!(reg16(&chip, AW_WTH0), 1024);
    assert_eq!(reg16(&chip, AW_HT0), 600);

    // Display on, PLLs locked
    assert_ne!(chip.register(DPCR) & DPCR_DISPLAY_ON, 0);
    assert_ne!(chip.register(CCR) & CCR_PLL_RECONFIGURE, 0);

    let plans = display.clock_plans().unwrap();
    assert_eq!(plans.memory.freq_khz, 120_000);
    assert_eq!(plans.core.freq_khz, 120_000);
    assert_eq!(plans.scan.freq_khz, 50_000);
}

/// Running bring-up twice leaves identical register state.
///
/// Soft reset keeps the configuration registers, so the second pass
/// read-modify-writes over the values left by the first.
#[test]
fn reinit_is_idempotent() {
    let chip = SimulatedChip::new();
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    display.init().unwrap();
    let first = chip.registers();
    chip.clear_log();
    display.init().unwrap();
    let second = chip.registers();

    assert_eq!(first, second);

    let first_read = |reg: u8| {
        chip.frames()
            .into_iter()
            .find_map(|f| match f {
                Frame::DataRead { register, value } if register == reg => Some(value),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(first_read(DPCR), first[usize::from(DPCR)]);
    assert_ne!(first_read(DPCR) & DPCR_DISPLAY_ON, 0);
    assert_eq!(first_read(PCSR), first[usize::from(PCSR)]);
    assert_ne!(first_read(CCR1) & CCR1_TRANSPARENT, 0);
}

/// Same with the hardware reset line wired.
#[test]
fn reinit_with_reset_pin_is_idempotent() {
    let chip = SimulatedChip::new();
    let mut display = Ra8876::new(chip.clone(), Some(chip.reset_pin()), NoopDelay::new(), Ra8876Config::default());

    display.init().unwrap();
    let first = chip.registers();
    display.init().unwrap();

    assert_eq!(first, chip.registers());
    assert_eq!(chip.hard_resets(), 2);
}

/// Ratio violation is caught before any PLL register is touched.
#[test]
fn ratio_violation_aborts_before_programming() {
    let chip = SimulatedChip::new();
    let mut display = Ra8876::new(chip.clone(), Some(chip.reset_pin()), NoopDelay::new(), Ra8876Config::default());

    // core × 2 == memory: violates core × 2 > memory.
    let plans = ClockPlans {
        memory: ClockPlan { freq_khz: 160_000, n: 31, k: 1 },
        core: ClockPlan { freq_khz: 80_000, n: 15, k: 1 },
        scan: ClockPlan { freq_khz: 50_000, n: 9, k: 1 },
    };

    assert_eq!(
        display.init_with_clock_plans(plans),
        Err(Error::ClockUnsatisfiable(ClockFailure::CoreTooSlowForMemory))
    );
    assert!(chip.frames().is_empty(), "no register traffic expected: {:?}", chip.frames());
    assert_eq!(display.clock_plans(), None);
}

/// Explicit plans that satisfy the ratios are programmed as given.
#[test]
fn explicit_plans_are_programmed() {
    let chip = SimulatedChip::new();
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    let plans = ClockPlans {
        memory: ClockPlan { freq_khz: 100_000, n: 19, k: 1 },
        core: ClockPlan { freq_khz: 100_000, n: 39, k: 2 },
        scan: ClockPlan { freq_khz: 30_000, n: 47, k: 4 },
    };
    display.init_with_clock_plans(plans).unwrap();

    assert_eq!((chip.register(MPLLC1), chip.register(MPLLC2)), (0x02, 19));
    assert_eq!((chip.register(SPLLC1), chip.register(SPLLC2)), (0x04, 39));
    assert_eq!((chip.register(PPLLC1), chip.register(PPLLC2)), (0x08, 47));
    assert_eq!(display.clock_plans(), Some(plans));
}

/// A PLL that never locks fails the PLL stage.
#[test]
fn pll_lock_failure_is_not_ready() {
    let chip = SimulatedChip::with_behavior(Behavior { pll_locks: false, ..Behavior::default() });
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    assert_eq!(display.init(), Err(Error::NotReady(Stage::Pll)));
}

/// SDRAM that never reports ready fails after the full poll budget.
#[test]
fn sdram_not_ready_after_250_polls() {
    let chip = SimulatedChip::with_behavior(Behavior { sdram_comes_up: false, ..Behavior::default() });
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    assert_eq!(display.init(), Err(Error::NotReady(Stage::Memory)));

    let frames = chip.frames();
    let sdram_start = frames
        .iter()
        .position(|f| *f == Frame::DataWrite { register: SDRCR, value: SDRCR_INIT })
        .unwrap();
    let polls = frames[sdram_start..]
        .iter()
        .filter(|f| matches!(f, Frame::StatusRead(_)))
        .count();
    assert_eq!(polls, 250);

    // Later stages never ran.
    assert_eq!(chip.register(HDWR), 0);
}

/// A chip stuck in inhibit after soft reset is logged, not fatal.
#[test]
fn soft_reset_timeout_is_tolerated() {
    let chip = SimulatedChip::with_behavior(Behavior { soft_reset_completes: false, ..Behavior::default() });
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    display.init().unwrap();
    assert_ne!(chip.register(DPCR) & DPCR_DISPLAY_ON, 0);
}

/// Unsupported memory geometry is rejected before the bus is used.
#[test]
fn unsupported_memory_rejected_without_traffic() {
    let chip = SimulatedChip::new();
    let mut config = Ra8876Config::default();
    config.memory.cas_latency = 4;
    let mut display = soft_reset_driver(&chip, config);

    assert_eq!(display.init(), Err(Error::UnsupportedConfig(ConfigField::CasLatency)));
    assert!(chip.frames().is_empty());
}

/// Unsupported panel timing is rejected before the bus is used.
#[test]
fn unsupported_display_rejected_without_traffic() {
    let chip = SimulatedChip::new();
    let display_timing = DisplayTimingConfig { h_back_porch: 4, ..DisplayTimingConfig::default() };
    let mut display = soft_reset_driver(&chip, Ra8876Config::new(Default::default(), display_timing));

    assert_eq!(
        display.init(),
        Err(Error::UnsupportedConfig(ConfigField::HorizontalBackPorch))
    );
    assert!(chip.frames().is_empty());
}

/// A pixel clock the scan PLL cannot reach fails clock derivation.
#[test]
fn unreachable_dot_clock_is_unsatisfiable() {
    let chip = SimulatedChip::new();
    let display_timing = DisplayTimingConfig { dot_clock_khz: 1_000, ..DisplayTimingConfig::default() };
    let mut display = soft_reset_driver(&chip, Ra8876Config::new(Default::default(), display_timing));

    assert_eq!(
        display.init(),
        Err(Error::ClockUnsatisfiable(ClockFailure::NoSolution(ra8876::ClockDomain::Scan)))
    );
    assert!(chip.register_writes().iter().all(|(reg, _)| !(PPLLC1..=SPLLC2).contains(reg)));
}

/// 24 bpp selects the matching main window and canvas depth.
#[test]
fn color_depth_24_programs_depth_fields() {
    let chip = SimulatedChip::new();
    let config = Ra8876Config { color_depth: ColorDepth::Bpp24, ..Ra8876Config::default() };
    let mut display = soft_reset_driver(&chip, config);

    display.init().unwrap();
    assert_eq!(chip.register(MPWCTR), 0x08);
    assert_eq!(chip.register(AW_COLOR), 0x02);
}

/// Text defaults: 16 px Latin-1, transparent background, 1× scale.
#[test]
fn text_defaults_applied() {
    let chip = SimulatedChip::new();
    let mut display = soft_reset_driver(&chip, Ra8876Config::default());

    display.init().unwrap();
    assert_eq!(chip.register(CCR0), 0x00);
    assert_eq!(chip.register(CCR1), CCR1_TRANSPARENT);
    assert_eq!(display.text_height(), 16);
}

/// The driver hands its peripherals back.
#[test]
fn release_returns_peripherals() {
    let chip = SimulatedChip::new();
    let display = Ra8876::new(chip.clone(), Some(chip.reset_pin()), NoopDelay::new(), Ra8876Config::default());

    let (_spi, reset, _delay) = display.release();
    assert!(reset.is_some());
}
