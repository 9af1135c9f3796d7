//! Bring-up sequence.
//!
//! Stages run strictly in order and each one relies on register state the
//! previous stage left behind:
//!
//! 1. Reset (hardware pulse, or software reset when no pin is wired)
//! 2. Clock plan derivation
//! 3. Cross-domain ratio check
//! 4. PLL programming and lock check
//! 5. SDRAM initialization
//! 6. Panel timing, main window, canvas and active window
//! 7. Default text settings
//!
//! A failing stage stops the sequence. Registers already written stay
//! written; recover by calling [`Ra8876::init`] again.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::clock::{ClockDomain, ClockPlans};
use crate::driver::Ra8876;
use crate::error::{Error, Stage};
use crate::log::{debug, info, warn};
use crate::packing::{
    self, DisplayTimingRegisters, FontSize, InternalEncoding, SdramRegisters,
};
use crate::registers::*;

/// Settling time around each reset edge.
const RESET_SETTLE_MS: u32 = 5;
/// Settling time after each PLL reconfigure toggle.
const PLL_SETTLE_MS: u32 = 2;

impl<SPI, RST, DELAY> Ra8876<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Reset the chip and run the full bring-up sequence.
    ///
    /// Configuration errors are reported before any bus traffic. Calling
    /// `init` again repeats the whole sequence from reset and leaves the
    /// chip in the same state.
    pub fn init(&mut self) -> Result<(), Error> {
        self.config.validate()?;
        self.reset()?;

        info!("RA8876 bring-up: deriving clocks");
        let plans = ClockPlans::derive(
            self.config.oscillator_khz,
            &self.config.memory,
            &self.config.display,
            self.config.vco_band,
        )?;
        self.bring_up(plans)
    }

    /// Bring-up with caller-supplied PLL settings instead of solved ones.
    ///
    /// The plans still go through the cross-domain ratio check, which runs
    /// before any PLL register is written.
    pub fn init_with_clock_plans(&mut self, plans: ClockPlans) -> Result<(), Error> {
        self.config.validate()?;
        self.reset()?;
        self.bring_up(plans)
    }

    fn bring_up(&mut self, plans: ClockPlans) -> Result<(), Error> {
        debug!(
            "clocks: memory {} kHz (n={} k={}), core {} kHz (n={} k={}), scan {} kHz (n={} k={})",
            plans.memory.freq_khz,
            plans.memory.n,
            plans.memory.k,
            plans.core.freq_khz,
            plans.core.n,
            plans.core.k,
            plans.scan.freq_khz,
            plans.scan.n,
            plans.scan.k
        );
        if let Err(e) = plans.validate() {
            warn!("RA8876 bring-up: clock ratios rejected: {}", e);
            return Err(e);
        }

        info!("RA8876 bring-up: programming PLLs");
        self.program_plls(&plans)?;
        self.state.clocks = Some(plans);

        info!("RA8876 bring-up: SDRAM");
        self.init_memory()?;

        info!("RA8876 bring-up: display");
        self.init_display()?;

        info!("RA8876 bring-up: text defaults");
        self.apply_text_defaults()?;

        info!("RA8876 ready ({}x{})", self.width(), self.height());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    fn reset(&mut self) -> Result<(), Error> {
        if self.reset.is_some() {
            self.hard_reset()
        } else {
            self.soft_reset()
        }
    }

    /// Pulse the reset line low with settling delays on both edges.
    ///
    /// Does nothing if the driver was created without a reset pin.
    pub fn hard_reset(&mut self) -> Result<(), Error> {
        let Some(pin) = self.reset.as_mut() else {
            return Ok(());
        };
        self.delay.delay_ms(RESET_SETTLE_MS);
        pin.set_low().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        pin.set_high().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Software reset, then wait for the chip to report normal operation.
    ///
    /// Not reaching normal operation is logged and otherwise ignored; the
    /// following stages report a dead chip on their own.
    pub fn soft_reset(&mut self) -> Result<(), Error> {
        self.bus.write_reg(SRR, SRR_SOFT_RESET)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        if !self.poll_ready(|status| status & STATUS_INHIBIT == 0)? {
            warn!("RA8876 soft reset: chip still inhibited, continuing");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // PLL
    // -----------------------------------------------------------------------

    fn program_plls(&mut self, plans: &ClockPlans) -> Result<(), Error> {
        for domain in [ClockDomain::Memory, ClockDomain::Core, ClockDomain::Scan] {
            let (reg1, reg2) = domain.control_registers();
            let (divider, multiplier) = packing::pll_control(plans.get(domain));
            self.bus.write_reg(reg1, divider)?;
            self.bus.write_reg(reg2, multiplier)?;
        }

        // Toggle the reconfigure bit; it reads back set once all PLLs lock.
        self.bus.write_reg(CCR, 0x00)?;
        self.delay.delay_ms(PLL_SETTLE_MS);
        self.bus.write_reg(CCR, CCR_PLL_RECONFIGURE)?;
        self.delay.delay_ms(PLL_SETTLE_MS);

        if self.bus.read_reg(CCR)? & CCR_PLL_RECONFIGURE == 0 {
            warn!("RA8876 PLLs did not lock");
            return Err(Error::NotReady(Stage::Pll));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // SDRAM
    // -----------------------------------------------------------------------

    fn init_memory(&mut self) -> Result<(), Error> {
        let sdram = SdramRegisters::from_config(&self.config.memory)?;

        self.bus.write_reg(SDRAR, sdram.attribute)?;
        self.bus.write_reg(SDRMD, sdram.mode)?;
        self.bus.write_reg16(SDR_REF_ITVL0, sdram.refresh_interval)?;
        self.bus.write_reg(SDRCR, SDRCR_INIT)?;

        if !self.poll_ready(|status| status & STATUS_SDRAM_READY != 0)? {
            warn!("RA8876 SDRAM never reported ready");
            return Err(Error::NotReady(Stage::Memory));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Display
    // -----------------------------------------------------------------------

    fn init_display(&mut self) -> Result<(), Error> {
        let timing = DisplayTimingRegisters::from_config(&self.config.display)?;
        let width = self.width();
        let height = self.height();
        let depth = self.config.color_depth;

        self.bus.modify_reg(CCR, packing::panel_chip_config)?;
        // Direct write, left to right then top to bottom.
        self.bus.write_reg(MACR, 0x00)?;
        // Graphics mode, memory target is SDRAM.
        self.bus.write_reg(ICR, 0x00)?;
        self.bus.modify_reg(DPCR, packing::panel_display_config)?;
        self.bus.modify_reg(PCSR, packing::panel_sync_polarity)?;

        self.bus.write_reg(HDWR, timing.hdwr)?;
        self.bus.write_reg(HDWFTR, timing.hdwftr)?;
        self.bus.write_reg16(VDHR0, timing.vdhr)?;
        self.bus.write_reg(HNDR, timing.hndr)?;
        self.bus.write_reg(HNDFTR, timing.hndftr)?;
        self.bus.write_reg(HSTR, timing.hstr)?;
        self.bus.write_reg(HPWR, timing.hpwr)?;
        self.bus.write_reg16(VNDR0, timing.vndr)?;
        self.bus.write_reg(VSTR, timing.vstr)?;
        self.bus.write_reg(VPWR, timing.vpwr)?;

        self.bus.write_reg(MPWCTR, depth.main_window_control())?;

        // Main window shows canvas memory from address 0.
        self.bus.write_reg32(MISA0, 0)?;
        self.bus.write_reg16(MIW0, width)?;
        self.bus.write_reg16(MWULX0, 0)?;
        self.bus.write_reg16(MWULY0, 0)?;

        // Canvas and active window cover the whole panel.
        self.bus.write_reg32(CVSSA0, 0)?;
        self.bus.write_reg16(CVS_IMWTH0, width)?;
        self.bus.write_reg16(AWUL_X0, 0)?;
        self.bus.write_reg16(AWUL_Y0, 0)?;
        self.bus.write_reg16(AW_WTH0, width)?;
        self.bus.write_reg16(AW_HT0, height)?;
        self.bus.write_reg(AW_COLOR, depth.canvas_depth())?;

        self.bus.modify_reg(DPCR, |dpcr| dpcr | DPCR_DISPLAY_ON)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    fn apply_text_defaults(&mut self) -> Result<(), Error> {
        self.select_internal_font(FontSize::Px16, InternalEncoding::Latin1)?;
        self.set_text_scale(1, 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ClockPlan;
    use crate::config::{MemoryTimingConfig, Ra8876Config};
    use crate::driver::NoResetPin;
    use crate::error::{ClockFailure, ConfigField};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use ra8876_sim::{Behavior, SimulatedChip};

    fn sim_driver(chip: &SimulatedChip) -> Ra8876<SimulatedChip, NoResetPin, NoopDelay> {
        Ra8876::without_reset_pin(chip.clone(), NoopDelay::new(), Ra8876Config::default())
    }

    fn write_frames(reg: u8, value: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![CMD_WRITE, reg]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![DATA_WRITE, value]),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn test_init_reaches_display_on() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);
        display.init().unwrap();

        assert_ne!(chip.register(DPCR) & DPCR_DISPLAY_ON, 0);
        assert_ne!(chip.register(CCR) & CCR_PLL_RECONFIGURE, 0);
        assert_eq!(chip.register(SDRAR), 0x29);
        assert_eq!(chip.register(SDRMD), 0x03);
        assert_eq!(chip.register(HDWR), 127);
        assert_eq!(chip.register(MPWCTR), 0x04);
        assert_eq!(chip.register(AW_COLOR), 0x01);
        assert_eq!(chip.register(CCR1) & 0x4F, 0x40);
        assert!(display.clock_plans().is_some());
    }

    #[test]
    fn test_pll_registers_written_in_domain_order() {
        let chip = SimulatedChip::new();
        let mut display = sim_driver(&chip);
        display.init().unwrap();

        let pll_writes: Vec<(u8, u8)> = chip
            .register_writes()
            .into_iter()
            .filter(|(reg, _)| (PPLLC1..=SPLLC2).contains(reg))
            .collect();
        assert_eq!(
            pll_writes,
            vec![
                (MPLLC1, 0x02),
                (MPLLC2, 23),
                (SPLLC1, 0x02),
                (SPLLC2, 23),
                (PPLLC1, 0x02),
                (PPLLC2, 9),
            ]
        );
    }

    #[test]
    fn test_pll_lock_failure_aborts_before_sdram() {
        let chip = SimulatedChip::with_behavior(Behavior { pll_locks: false, ..Behavior::default() });
        let mut display = sim_driver(&chip);

        assert_eq!(display.init(), Err(Error::NotReady(Stage::Pll)));
        assert!(chip.register_writes().iter().all(|(reg, _)| *reg != SDRAR));
        assert_eq!(display.clock_plans(), None);
    }

    #[test]
    fn test_sdram_timeout_is_not_ready() {
        let chip = SimulatedChip::with_behavior(Behavior { sdram_comes_up: false, ..Behavior::default() });
        let mut display = sim_driver(&chip);

        assert_eq!(display.init(), Err(Error::NotReady(Stage::Memory)));
        assert_eq!(chip.register(DPCR) & DPCR_DISPLAY_ON, 0);
    }

    #[test]
    fn test_soft_reset_failure_is_tolerated() {
        let chip = SimulatedChip::with_behavior(Behavior {
            soft_reset_completes: false,
            ..Behavior::default()
        });
        let mut display = sim_driver(&chip);
        display.init().unwrap();
    }

    #[test]
    fn test_unsupported_memory_rejected_before_bus_traffic() {
        let chip = SimulatedChip::new();
        let config = Ra8876Config {
            memory: MemoryTimingConfig { banks: 8, ..MemoryTimingConfig::default() },
            ..Ra8876Config::default()
        };
        let mut display = Ra8876::without_reset_pin(chip.clone(), NoopDelay::new(), config);

        assert_eq!(display.init(), Err(Error::UnsupportedConfig(ConfigField::Banks)));
        assert!(chip.frames().is_empty());
    }

    #[test]
    fn test_ratio_violation_aborts_after_reset_only() {
        let plan = |freq_khz, n| ClockPlan { freq_khz, n, k: 1 };
        let plans = ClockPlans {
            memory: plan(160_000, 31),
            core: plan(80_000, 15),
            scan: plan(50_000, 9),
        };

        let rst_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut rst = PinMock::new(&rst_expectations);
        let no_traffic: [SpiTransaction<u8>; 0] = [];
        let mut spi = SpiMock::new(&no_traffic);

        let mut display = Ra8876::new(spi.clone(), Some(rst.clone()), NoopDelay::new(), Ra8876Config::default());
        assert_eq!(
            display.init_with_clock_plans(plans),
            Err(Error::ClockUnsatisfiable(ClockFailure::CoreTooSlowForMemory))
        );

        spi.done();
        rst.done();
    }

    #[test]
    fn test_soft_reset_frames() {
        let mut expectations = write_frames(SRR, SRR_SOFT_RESET);
        expectations.extend([
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![STATUS_READ, 0x00], vec![0x00, STATUS_INHIBIT]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![STATUS_READ, 0x00], vec![0x00, 0x00]),
            SpiTransaction::transaction_end(),
        ]);
        let mut spi = SpiMock::new(&expectations);

        let mut display = Ra8876::without_reset_pin(spi.clone(), NoopDelay::new(), Ra8876Config::default());
        display.soft_reset().unwrap();

        spi.done();
    }

    #[test]
    fn test_hard_reset_pulses_line() {
        let chip = SimulatedChip::new();
        let mut display = Ra8876::new(
            chip.clone(),
            Some(chip.reset_pin()),
            NoopDelay::new(),
            Ra8876Config::default(),
        );
        display.init().unwrap();

        assert_eq!(chip.hard_resets(), 1);
        assert!(chip.register_writes().iter().all(|(reg, _)| *reg != SRR));
    }
}
