// Licensed under the Apache-2.0 license

//! ATM APB I2C driver module.
//!
//! Synchronous, polled controller-mode driver for the ATM I2C transaction
//! unit, designed for bare-metal and `no_std` environments. Layers, leaves
//! first:
//!
//! - [`phase`]: one 8-bit bus phase per GO strobe, polled with a timeout
//! - [`sequencer`]: one logical message as a run of phases
//! - [`atm_i2c`]: ordered messages to one address under a single lock
//! - [`i2c_controller`]: embedded-hal `I2c` front end

pub mod atm_i2c;
pub mod common;
pub mod i2c_controller;
#[cfg(test)]
pub(crate) mod mock;
pub mod phase;
pub mod registers;
pub mod sequencer;
pub mod system_setup;
pub mod traits;

pub use atm_i2c::AtmI2c;
pub use common::{
    Ack, DeviceConfig, Direction, Error, Head, I2cConfig, I2cConfigBuilder, I2cMode, I2cSpeed,
    Message, SpeedLookup, Tail,
};
pub use i2c_controller::I2cController;
pub use registers::Mmio;
pub use system_setup::FixedClock;
pub use traits::{
    DelayYield, I2cTransfer, PinConfig, PollYield, ReferenceClock, SpinYield, TransactionUnit,
};
