// Licensed under the Apache-2.0 license

//! Bit-phase driver.
//!
//! Runs exactly one 8-bit bus phase per call: program the data register,
//! strobe GO with the requested framing, poll until the unit goes idle,
//! then deassert GO. Only one phase is ever outstanding.

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{Ack, Error, Head, Tail, DEFAULT_POLL_TIMEOUT};
use crate::i2c::registers::{OutgoingData, TransactionSetup, TransactionStatus};
use crate::i2c::traits::{PollYield, SpinYield, TransactionUnit};

pub struct PhaseDriver<H: TransactionUnit, Y: PollYield = SpinYield, L: Logger = NoOpLogger> {
    unit: H,
    poll: Y,
    logger: L,
    sda_pullup: bool,
    poll_timeout: u32,
}

impl<H: TransactionUnit, Y: PollYield, L: Logger> PhaseDriver<H, Y, L> {
    pub fn new(unit: H, poll: Y, logger: L) -> Self {
        Self {
            unit,
            poll,
            logger,
            sda_pullup: false,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn set_sda_pullup(&mut self, enabled: bool) {
        self.sda_pullup = enabled;
    }

    pub fn set_poll_timeout(&mut self, iterations: u32) {
        self.poll_timeout = iterations;
    }

    pub fn unit_mut(&mut self) -> &mut H {
        &mut self.unit
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    pub fn into_parts(self) -> (H, Y, L) {
        (self.unit, self.poll, self.logger)
    }

    /// Transmit `value` framed by `head`/`tail`; the peer drives ACK.
    ///
    /// # Errors
    ///
    /// `IoTimeout` if the phase never completes, `IoNack` if the peer
    /// answered NACK.
    pub fn write_byte(&mut self, head: Head, value: u8, tail: Tail) -> Result<(), Error> {
        self.unit
            .write_outgoing(OutgoingData::drive(value, self.sda_pullup));
        self.unit.write_setup(TransactionSetup::transmit(head, tail));

        let status = self.wait_idle()?;
        let result = match status.ack() {
            Ack::Ack => Ok(()),
            Ack::Nack => Err(Error::IoNack),
        };

        self.unit.write_setup(TransactionSetup::RELEASED);
        result
    }

    /// Receive one byte, answering it with `ack`, closing with `tail`.
    ///
    /// # Errors
    ///
    /// `IoTimeout` if the phase never completes.
    pub fn read_byte(&mut self, ack: Ack, tail: Tail) -> Result<u8, Error> {
        self.unit
            .write_outgoing(OutgoingData::release(self.sda_pullup));
        self.unit.write_setup(TransactionSetup::receive(ack, tail));

        self.wait_idle()?;
        let value = self.unit.incoming();

        self.unit.write_setup(TransactionSetup::RELEASED);
        Ok(value)
    }

    /// Poll until RUNNING clears. On timeout the setup register is cleared
    /// before returning so the unit is left idle.
    fn wait_idle(&mut self) -> Result<TransactionStatus, Error> {
        let ceiling = u64::from(self.poll_timeout);
        let mut polls: u64 = 0;
        loop {
            let status = self.unit.status();
            if !status.running() {
                return Ok(status);
            }
            if polls > ceiling {
                self.unit.write_setup(TransactionSetup::IDLE);
                self.logger.error(format_args!(
                    "I2C communication timed out: {:#x}",
                    status.bits()
                ));
                return Err(Error::IoTimeout);
            }
            polls += 1;
            self.poll.yield_now();
        }
    }
}
