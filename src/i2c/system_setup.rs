// Licensed under the Apache-2.0 license

//! I2C System Setup Helper
//!
//! Reference clock sources and the divider calculation that turns a bus
//! frequency into a CLOCK_CONTROL value.

use crate::i2c::registers::CLKDIV_MAX;
use crate::i2c::traits::ReferenceClock;
use fugit::HertzU32;

/// The transaction unit splits every SCL period into four phases.
pub const PHASES_PER_BIT: u32 = 4;

/// Reference clock with a rate fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub HertzU32);

impl ReferenceClock for FixedClock {
    fn frequency(&self) -> HertzU32 {
        self.0
    }
}

/// Divider for `bus` given the reference clock:
/// `reference / (bus * 4) - 1`.
///
/// Returns `None` when the reference is too slow for the requested rate or
/// when the result does not fit CLKDIV.
#[must_use]
pub fn clock_divider(reference: HertzU32, bus: HertzU32) -> Option<u16> {
    let quarter_rate = bus.raw().checked_mul(PHASES_PER_BIT)?;
    let divider = reference.raw().checked_div(quarter_rate)?.checked_sub(1)?;
    if divider > CLKDIV_MAX {
        return None;
    }
    u16::try_from(divider).ok()
}
