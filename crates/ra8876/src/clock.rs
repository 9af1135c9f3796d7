//! PLL parameter search for the three RA8876 clock domains.
//!
//! Each PLL produces `osc × (n + 1) / 2^k`. The solver walks the output
//! divider exponent `k` upwards and, for each, picks the largest multiplier
//! that does not overshoot the target. The closest candidate wins; an exact
//! hit stops the search early.
//!
//! All arithmetic is in kHz.

// Divisions below are by powers of two no smaller than 2 or by constants;
// everything else is checked or saturating.
#![allow(clippy::arithmetic_side_effects)]

use core::fmt;

use crate::config::{DisplayTimingConfig, MemoryTimingConfig};
use crate::error::{ClockFailure, Error};
use crate::registers::{MPLLC1, MPLLC2, PPLLC1, PPLLC2, SPLLC1, SPLLC2};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower edge of the PLL VCO band.
pub const VCO_MIN_KHZ: u32 = 100_000;
/// Upper edge of the PLL VCO band.
pub const VCO_MAX_KHZ: u32 = 600_000;

/// Smallest feedback multiplier term.
pub const N_MIN: u32 = 1;
/// Largest feedback multiplier term (6-bit field).
pub const N_MAX: u32 = 63;

// ---------------------------------------------------------------------------
// ClockDomain
// ---------------------------------------------------------------------------

/// The three independently synthesized clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDomain {
    /// SDRAM clock (MCLK).
    Memory,
    /// Core / 2D engine clock (CCLK).
    Core,
    /// Panel scan / pixel clock (SCLK).
    Scan,
}

impl ClockDomain {
    /// Largest output divider exponent the domain's PLL accepts.
    pub const fn max_divider_exponent(self) -> u8 {
        match self {
            Self::Memory | Self::Core => 3,
            Self::Scan => 7,
        }
    }

    /// Maximum frequency the chip allows for the domain.
    pub const fn ceiling_khz(self) -> u32 {
        match self {
            Self::Memory => 166_000,
            Self::Core => 120_000,
            Self::Scan => 100_000,
        }
    }

    /// `(control 1, control 2)` register addresses of the domain's PLL.
    pub const fn control_registers(self) -> (u8, u8) {
        match self {
            Self::Memory => (MPLLC1, MPLLC2),
            Self::Core => (SPLLC1, SPLLC2),
            Self::Scan => (PPLLC1, PPLLC2),
        }
    }
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Core => "core",
            Self::Scan => "scan",
        })
    }
}

// ---------------------------------------------------------------------------
// VCO band policy
// ---------------------------------------------------------------------------

/// How strictly the solver applies the VCO band limits.
///
/// A band test written as `fvco < MIN && fvco > MAX` can never be true and
/// so accepts any VCO frequency. `Literal` keeps that behavior for boards
/// tuned against it; `Enforced` rejects candidates outside the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VcoBandCheck {
    /// Reject `fvco` outside [`VCO_MIN_KHZ`, `VCO_MAX_KHZ`].
    #[default]
    Enforced,
    /// Accept every `fvco`.
    Literal,
}

impl VcoBandCheck {
    /// Whether a candidate with this VCO frequency may be used.
    pub const fn accepts(self, fvco_khz: u32) -> bool {
        match self {
            Self::Enforced => fvco_khz >= VCO_MIN_KHZ && fvco_khz <= VCO_MAX_KHZ,
            Self::Literal => true,
        }
    }
}

// ---------------------------------------------------------------------------
// ClockPlan
// ---------------------------------------------------------------------------

/// PLL settings for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPlan {
    /// Achieved output frequency in kHz.
    pub freq_khz: u32,
    /// Feedback multiplier term, 1..=63.
    pub n: u8,
    /// Output divider exponent.
    pub k: u8,
}

/// Find PLL settings producing the closest frequency to `target_khz` without
/// exceeding it.
///
/// Returns `None` if no divider exponent in `1..=k_max` yields a valid
/// multiplier (and VCO frequency, under [`VcoBandCheck::Enforced`]).
pub fn solve(osc_khz: u32, target_khz: u32, k_max: u8, band: VcoBandCheck) -> Option<ClockPlan> {
    search(osc_khz, target_khz, k_max, band).0
}

/// [`solve`], also reporting how many divider exponents were examined.
pub(crate) fn search(
    osc_khz: u32,
    target_khz: u32,
    k_max: u8,
    band: VcoBandCheck,
) -> (Option<ClockPlan>, u8) {
    let mut best: Option<(ClockPlan, u32)> = None;
    let mut examined = 0u8;

    for k in 1..=k_max {
        examined = k;
        let Some(divisor) = 1u32.checked_shl(u32::from(k)) else {
            break;
        };
        // A fractional step size is not representable.
        if osc_khz % divisor != 0 {
            continue;
        }
        let step = osc_khz / divisor;
        let Some(n) = target_khz.checked_div(step).and_then(|m| m.checked_sub(1)) else {
            continue;
        };
        if !(N_MIN..=N_MAX).contains(&n) {
            continue;
        }
        let Some(fvco) = osc_khz.checked_mul(n.saturating_add(1)) else {
            continue;
        };
        if !band.accepts(fvco) {
            continue;
        }

        let freq_khz = fvco / divisor;
        let shortfall = target_khz.saturating_sub(freq_khz);
        if best.map_or(true, |(_, best_shortfall)| shortfall < best_shortfall) {
            #[allow(clippy::cast_possible_truncation)] // n <= 63
            let plan = ClockPlan { freq_khz, n: n as u8, k };
            best = Some((plan, shortfall));
        }
        if shortfall == 0 {
            break;
        }
    }

    (best.map(|(plan, _)| plan), examined)
}

// ---------------------------------------------------------------------------
// ClockPlans
// ---------------------------------------------------------------------------

/// Settings for all three PLLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPlans {
    /// SDRAM clock.
    pub memory: ClockPlan,
    /// Core clock.
    pub core: ClockPlan,
    /// Scan (pixel) clock.
    pub scan: ClockPlan,
}

impl ClockPlans {
    /// Solve all three domains from the timing configuration.
    ///
    /// The core clock is derived from the achieved memory clock, not the
    /// requested one.
    pub fn derive(
        osc_khz: u32,
        memory: &MemoryTimingConfig,
        display: &DisplayTimingConfig,
        band: VcoBandCheck,
    ) -> Result<Self, Error> {
        let memory_target = u32::from(memory.speed_mhz)
            .saturating_mul(1000)
            .min(ClockDomain::Memory.ceiling_khz());
        let memory = solve_domain(osc_khz, memory_target, ClockDomain::Memory, band)?;

        let core_target = memory.freq_khz.min(ClockDomain::Core.ceiling_khz());
        let core = solve_domain(osc_khz, core_target, ClockDomain::Core, band)?;

        let scan_target = display.dot_clock_khz.min(ClockDomain::Scan.ceiling_khz());
        let scan = solve_domain(osc_khz, scan_target, ClockDomain::Scan, band)?;

        Ok(Self { memory, core, scan })
    }

    /// Check the cross-domain ratio rules:
    /// core ≤ memory, core × 2 > memory, core > scan × 1.5.
    pub fn validate(&self) -> Result<(), Error> {
        let memory = u64::from(self.memory.freq_khz);
        let core = u64::from(self.core.freq_khz);
        let scan = u64::from(self.scan.freq_khz);

        let failure = if core > memory {
            Some(ClockFailure::CoreAboveMemory)
        } else if core.saturating_mul(2) <= memory {
            Some(ClockFailure::CoreTooSlowForMemory)
        } else if core <= scan.saturating_add(scan / 2) {
            Some(ClockFailure::CoreTooSlowForScan)
        } else {
            None
        };
        failure.map_or(Ok(()), |f| Err(Error::ClockUnsatisfiable(f)))
    }

    /// Plan for one domain.
    pub const fn get(&self, domain: ClockDomain) -> ClockPlan {
        match domain {
            ClockDomain::Memory => self.memory,
            ClockDomain::Core => self.core,
            ClockDomain::Scan => self.scan,
        }
    }
}

fn solve_domain(
    osc_khz: u32,
    target_khz: u32,
    domain: ClockDomain,
    band: VcoBandCheck,
) -> Result<ClockPlan, Error> {
    solve(osc_khz, target_khz, domain.max_divider_exponent(), band)
        .ok_or(Error::ClockUnsatisfiable(ClockFailure::NoSolution(domain)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
