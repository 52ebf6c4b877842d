// Licensed under the Apache-2.0 license

//! Transfer orchestrator for the ATM APB I2C controller.
//!
//! [`AtmI2c`] owns the transaction unit behind a blocking mutex. Every
//! public operation runs inside one lock acquisition, so at most one
//! transfer drives the unit at a time and the lock is released on every
//! exit path when the closure returns.
//!
//! ```rust,ignore
//! use atm_ddk::i2c::{AtmI2c, DeviceConfig, FixedClock, Message, Mmio, SpinYield};
//! use atm_ddk::common::NoOpLogger;
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use fugit::HertzU32;
//!
//! let unit = unsafe { Mmio::new(0x4000_3000) };
//! let i2c: AtmI2c<CriticalSectionRawMutex, _, _, _> = AtmI2c::init(
//!     &DeviceConfig::new(0, 400_000),
//!     unit,
//!     || { /* pin mux */ },
//!     FixedClock(HertzU32::MHz(16)),
//!     SpinYield,
//!     NoOpLogger,
//! )?;
//!
//! let mut id = [0u8; 2];
//! i2c.transfer(0x50, &mut [Message::write(&[0x00]), Message::read(&mut id).with_stop()])?;
//! ```

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{
    DeviceConfig, Error, I2cConfig, I2cConfigBuilder, I2cMode, I2cSpeed, Message, SpeedLookup,
};
use crate::i2c::phase::PhaseDriver;
use crate::i2c::sequencer::run_message;
use crate::i2c::system_setup::clock_divider;
use crate::i2c::traits::{
    I2cTransfer, PinConfig, PollYield, ReferenceClock, SpinYield, TransactionUnit,
};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Highest 7-bit bus address.
pub const MAX_ADDRESS: u8 = 0x7f;

struct State<H, P, C, Y, L>
where
    H: TransactionUnit,
    Y: PollYield,
    L: Logger,
{
    phase: PhaseDriver<H, Y, L>,
    pins: P,
    clock: C,
    config: I2cConfig,
}

impl<H, P, C, Y, L> State<H, P, C, Y, L>
where
    H: TransactionUnit,
    P: PinConfig,
    C: ReferenceClock,
    Y: PollYield,
    L: Logger,
{
    /// Nothing is committed unless the requested speed resolves to a divider.
    fn configure(&mut self, config: I2cConfig) -> Result<(), Error> {
        if config.mode != I2cMode::Controller {
            self.phase
                .logger_mut()
                .error(format_args!("I2C target mode not supported. Received: {config:?}"));
            return Err(Error::NotSupported);
        }
        let divider = self.divider_for(config.speed)?;

        self.config = config;
        self.phase.set_sda_pullup(config.sda_pullup);
        self.phase.set_poll_timeout(config.poll_timeout);
        self.pins.configure_pins();

        self.program_divider(config.speed, divider);
        Ok(())
    }

    fn set_speed(&mut self, speed: I2cSpeed) -> Result<(), Error> {
        let divider = self.divider_for(speed)?;
        self.program_divider(speed, divider);
        Ok(())
    }

    fn divider_for(&mut self, speed: I2cSpeed) -> Result<u16, Error> {
        let bus = match speed.lookup() {
            SpeedLookup::Supported(bus) => bus,
            SpeedLookup::Unsupported => {
                self.phase
                    .logger_mut()
                    .error(format_args!("I2C speed not supported. Received: {speed:?}"));
                return Err(Error::NotSupported);
            }
        };

        let reference = self.clock.frequency();
        let Some(divider) = clock_divider(reference, bus) else {
            self.phase.logger_mut().error(format_args!(
                "I2C speed {speed:?} unreachable from {} Hz reference",
                reference.raw()
            ));
            return Err(Error::NotSupported);
        };

        self.phase.logger_mut().debug(format_args!(
            "I2C clkdiv {divider} for {} Hz",
            bus.raw()
        ));
        Ok(divider)
    }

    fn program_divider(&mut self, speed: I2cSpeed, divider: u16) {
        self.phase.unit_mut().write_clock_divider(divider);
        self.config.speed = speed;
    }

    fn transfer(&mut self, address: u8, messages: &mut [Message<'_>]) -> Result<(), Error> {
        if self.config.ten_bit_addressing || address > MAX_ADDRESS {
            self.phase.logger_mut().error(format_args!(
                "10-bit I2C address not supported. Received: {address:#x}"
            ));
            return Err(Error::NotSupported);
        }

        for (index, message) in messages.iter_mut().enumerate() {
            run_message(&mut self.phase, address, message, index)?;
        }
        Ok(())
    }
}

/// Synchronous I2C controller built on the ATM transaction unit.
///
/// * `R` - raw mutex guarding the unit. `NoopRawMutex` suits single-context
///   use. `CriticalSectionRawMutex` makes the controller `Sync`, but on bare
///   metal it masks interrupts for the whole locked call: up to
///   `(poll_timeout + 1)` polls per phase, `DelayYield` sleeps included,
///   so the poll hook no longer lets other work run.
/// * `H` - transaction unit register access
/// * `P` - pin routing callback
/// * `C` - reference clock source
/// * `Y` - yield hook between status polls
/// * `L` - logger
///
/// The lock is not reentrant: calling back into the controller from a
/// [`PinConfig`] callback panics.
pub struct AtmI2c<R, H, P, C, Y = SpinYield, L = NoOpLogger>
where
    R: RawMutex,
    H: TransactionUnit,
    Y: PollYield,
    L: Logger,
{
    state: Mutex<R, RefCell<State<H, P, C, Y, L>>>,
}

impl<R, H, P, C, Y, L> AtmI2c<R, H, P, C, Y, L>
where
    R: RawMutex,
    H: TransactionUnit,
    P: PinConfig,
    C: ReferenceClock,
    Y: PollYield,
    L: Logger,
{
    /// Wrap the collaborators without touching the hardware.
    ///
    /// The controller starts unlocked with the builder defaults recorded as
    /// its configuration; call [`AtmI2c::configure`] before transferring.
    pub fn new(unit: H, pins: P, clock: C, poll: Y, logger: L) -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                phase: PhaseDriver::new(unit, poll, logger),
                pins,
                clock,
                config: I2cConfigBuilder::new().build(),
            })),
        }
    }

    /// Build and configure a controller from its static description:
    /// controller mode at the mapped default bitrate.
    ///
    /// # Errors
    ///
    /// `NotSupported` if the bitrate has no speed class, the class has no
    /// frequency, or the mode is not controller.
    pub fn init(
        device: &DeviceConfig,
        unit: H,
        pins: P,
        clock: C,
        poll: Y,
        logger: L,
    ) -> Result<Self, Error> {
        let i2c = Self::new(unit, pins, clock, poll, logger);

        let Some(speed) = I2cSpeed::from_bitrate(device.bitrate) else {
            i2c.with_state(|state| {
                state.phase.logger_mut().error(format_args!(
                    "I2C{} invalid bit rate: {}",
                    device.instance, device.bitrate
                ));
            });
            return Err(Error::NotSupported);
        };

        let config = I2cConfigBuilder::new()
            .mode(device.mode)
            .speed(speed)
            .sda_pullup(device.sda_pullup)
            .poll_timeout(device.poll_timeout)
            .build();
        i2c.configure(config)?;
        Ok(i2c)
    }

    /// Apply `config`: controller mode only, route pins, program the clock
    /// divider for `config.speed`.
    ///
    /// # Errors
    ///
    /// `NotSupported` for target mode or an unsupported speed.
    pub fn configure(&self, config: I2cConfig) -> Result<(), Error> {
        self.with_state(|state| state.configure(config))
    }

    /// Reprogram the clock divider for `speed`.
    ///
    /// # Errors
    ///
    /// `NotSupported` if `speed` has no frequency on this unit or cannot be
    /// derived from the reference clock.
    pub fn set_speed(&self, speed: I2cSpeed) -> Result<(), Error> {
        self.with_state(|state| state.set_speed(speed))
    }

    /// Currently applied configuration.
    pub fn config(&self) -> I2cConfig {
        self.with_state(|state| state.config)
    }

    /// Run `messages` against `address` as one bus transaction.
    ///
    /// Messages execute in order; the first error stops the transfer and is
    /// returned. Bytes already latched into read buffers are kept.
    ///
    /// # Errors
    ///
    /// `NotSupported` for 10-bit addressing, `InvalidArgument` for an
    /// illegal zero-length message, `IoTimeout`/`IoNack` from the bus.
    pub fn transfer(&self, address: u8, messages: &mut [Message<'_>]) -> Result<(), Error> {
        self.with_state(|state| state.transfer(address, messages))
    }

    /// Address-only write closed by STOP; `Ok` means a device answered.
    ///
    /// # Errors
    ///
    /// `IoNack` when nothing acknowledges `address`.
    pub fn probe(&self, address: u8) -> Result<(), Error> {
        self.transfer(address, &mut [Message::probe()])
    }

    /// Give back the collaborators.
    pub fn free(self) -> (H, P, C, Y, L) {
        let state = self.state.into_inner().into_inner();
        let (unit, poll, logger) = state.phase.into_parts();
        (unit, state.pins, state.clock, poll, logger)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State<H, P, C, Y, L>) -> T) -> T {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<R, H, P, C, Y, L> I2cTransfer for AtmI2c<R, H, P, C, Y, L>
where
    R: RawMutex,
    H: TransactionUnit,
    P: PinConfig,
    C: ReferenceClock,
    Y: PollYield,
    L: Logger,
{
    fn transfer(&self, address: u8, messages: &mut [Message<'_>]) -> Result<(), Error> {
        AtmI2c::transfer(self, address, messages)
    }
}
