use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for elapsed seconds, rates, conveyor progress, power and resource
/// counters so that identical `deltaTime` sequences give identical states.
pub type Fixed64 = I32F32;

/// Simulated seconds.
pub type Seconds = Fixed64;

/// Ticks are the atomic unit of simulation time (one per `advance`).
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only at the boundary, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Largest whole-unit amount a [`Fixed64`] holds exactly.
pub const MAX_UNITS: u32 = i32::MAX as u32;

/// Whole units as Fixed64. Amounts above [`MAX_UNITS`] saturate.
#[inline]
pub fn units(n: u32) -> Fixed64 {
    Fixed64::saturating_from_num(n)
}

/// Floor a non-negative quantity to whole units, clamped to the u32 range.
#[inline]
pub fn whole_units(v: Fixed64) -> u32 {
    if v <= Fixed64::ZERO {
        0
    } else {
        v.floor().saturating_to_num::<u32>()
    }
}

/// `numerator / denominator` clamped to `[0, 1]`. A zero denominator
/// yields 1 (nothing was asked for, so everything asked for was met).
#[inline]
pub fn clamped_ratio(numerator: Fixed64, denominator: Fixed64) -> Fixed64 {
    if denominator <= Fixed64::ZERO {
        return Fixed64::ONE;
    }
    let ratio = numerator
        .checked_div(denominator)
        .unwrap_or(Fixed64::ONE);
    ratio.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// Slack absorbed by [`cycle_complete`]. Rates such as 0.2 or 0.001 are
/// not exact in Q32.32 and round a few thousand ulps below their decimal
/// value.
pub const CYCLE_TOLERANCE: Fixed64 = Fixed64::from_bits(1 << 16);

/// Whether `elapsed` seconds at `rate` units per second, scaled by
/// `efficiency`, add up to at least one whole unit.
///
/// Equivalent to `elapsed >= 1 / (rate * efficiency)` without the division,
/// so a zero rate or zero efficiency simply never completes.
#[inline]
pub fn cycle_complete(elapsed: Seconds, rate: Fixed64, efficiency: Fixed64) -> bool {
    let done = elapsed.saturating_mul(rate).saturating_mul(efficiency);
    done > Fixed64::ZERO && done.saturating_add(CYCLE_TOLERANCE) >= Fixed64::ONE
}
