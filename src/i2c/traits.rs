// Licensed under the Apache-2.0 license

//! # I2C Hardware Abstraction Traits
//!
//! The transaction engine only talks to the outside world through the
//! small traits in this module. Each trait covers one collaborator:
//!
//! ```text
//! TransactionUnit  (register block: data, setup, status, clock divider)
//! ReferenceClock   (bus reference clock, used for the divider)
//! PinConfig        (pin-mux and pull-up routing, run once per configure)
//! PollYield        (cooperative yield between status polls)
//! ```
//!
//! [`I2cTransfer`] is the upward-facing seam: anything that can run a list
//! of messages against one address as a single bus transaction.
//!
//! Keeping these seams narrow lets tests substitute a scripted transaction
//! unit and a counting yield hook without real hardware timing.

use crate::i2c::common::{Error, Message};
use crate::i2c::registers::{OutgoingData, TransactionSetup, TransactionStatus};
use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

/// Executes a list of messages as one bus transaction.
pub trait I2cTransfer {
    /// Run `messages` in order against the 7-bit `address`, stopping at the
    /// first error.
    ///
    /// # Errors
    ///
    /// Returns the first error any message produced.
    fn transfer(&self, address: u8, messages: &mut [Message<'_>]) -> Result<(), Error>;
}

impl<T: I2cTransfer + ?Sized> I2cTransfer for &T {
    fn transfer(&self, address: u8, messages: &mut [Message<'_>]) -> Result<(), Error> {
        (**self).transfer(address, messages)
    }
}

/// Register-level access to one transaction unit.
///
/// Implementations must perform every access exactly once and in program
/// order; the engine relies on the status register being re-read on every
/// call to [`TransactionUnit::status`].
pub trait TransactionUnit {
    /// Program OUTGOING_DATA (value, output-enable mask and pull-up).
    fn write_outgoing(&mut self, data: OutgoingData);

    /// Program TRANSACTION_SETUP. Writing a value with GO set starts a phase.
    fn write_setup(&mut self, setup: TransactionSetup);

    /// Sample TRANSACTION_STATUS.
    fn status(&mut self) -> TransactionStatus;

    /// Byte latched by the last receive phase.
    fn incoming(&mut self) -> u8;

    /// Program the CLKDIV field of CLOCK_CONTROL.
    fn write_clock_divider(&mut self, divider: u16);
}

/// Source of the bus reference clock.
pub trait ReferenceClock {
    /// Current reference frequency.
    fn frequency(&self) -> HertzU32;
}

/// Routes SCL/SDA to their pins and enables the optional SCL pull-up.
///
/// Assumed infallible. Closures implement this trait, so board code can
/// pass `|| { /* pin mux */ }` directly.
pub trait PinConfig {
    fn configure_pins(&mut self);
}

impl<F: FnMut()> PinConfig for F {
    fn configure_pins(&mut self) {
        self();
    }
}

/// Hook invoked once per unsuccessful status poll.
pub trait PollYield {
    fn yield_now(&mut self);
}

/// Yields by spinning for a single instruction.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinYield;

impl PollYield for SpinYield {
    fn yield_now(&mut self) {
        #[cfg(all(target_arch = "arm", target_os = "none"))]
        cortex_m::asm::nop();
        #[cfg(not(all(target_arch = "arm", target_os = "none")))]
        core::hint::spin_loop();
    }
}

/// Sleeps a fixed number of nanoseconds between polls.
///
/// With this hook the poll ceiling becomes an approximate wall-clock bound
/// of `poll_timeout * interval_ns`.
pub struct DelayYield<D: DelayNs> {
    delay: D,
    interval_ns: u32,
}

impl<D: DelayNs> DelayYield<D> {
    pub fn new(delay: D, interval_ns: u32) -> Self {
        Self { delay, interval_ns }
    }

    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> PollYield for DelayYield<D> {
    fn yield_now(&mut self) {
        self.delay.delay_ns(self.interval_ns);
    }
}
