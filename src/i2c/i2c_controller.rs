// Licensed under the Apache-2.0 license

//! embedded-hal front end for the transfer engine.
//!
//! [`I2cController`] adapts any [`I2cTransfer`] implementation to
//! `embedded_hal::i2c::I2c`, so device drivers written against
//! embedded-hal run unchanged on the ATM controller.

use crate::i2c::common::{Error, Message};
use crate::i2c::traits::I2cTransfer;
use embedded_hal::i2c::{Operation, SevenBitAddress};
use heapless::Vec;

/// Most operations a single embedded-hal transaction may carry.
pub const MAX_OPERATIONS: usize = 8;

/// embedded-hal wrapper around a transfer engine.
///
/// `T` is usually `&AtmI2c<..>`, so several device drivers can share one
/// controller while the engine's lock serializes their transactions.
pub struct I2cController<T: I2cTransfer> {
    pub bus: T,
}

impl<T: I2cTransfer> I2cController<T> {
    pub fn new(bus: T) -> Self {
        Self { bus }
    }
}

impl<T: I2cTransfer> embedded_hal::i2c::ErrorType for I2cController<T> {
    type Error = Error;
}

impl<T: I2cTransfer> embedded_hal::i2c::I2c for I2cController<T> {
    /// Only the last operation releases the bus.
    ///
    /// The engine addresses the target once per write run and once per
    /// read, so two shapes cannot be framed and fail with `NotSupported`
    /// before the bus is touched: a write after a read, which would need a
    /// repeated START with a write address, and adjacent reads, which would
    /// need to continue with ACK instead of re-addressing.
    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let count = operations.len();
        let mut messages: Vec<Message<'_>, MAX_OPERATIONS> = Vec::new();
        let mut after_read = false;
        for (index, operation) in operations.iter_mut().enumerate() {
            if after_read {
                return Err(Error::NotSupported);
            }
            let stop = index + 1 == count;
            let message = match operation {
                Operation::Write(bytes) => Message::Write { bytes: *bytes, stop },
                Operation::Read(buffer) => {
                    after_read = true;
                    Message::Read {
                        buffer: &mut **buffer,
                        stop,
                    }
                }
            };
            messages
                .push(message)
                .map_err(|_| Error::InvalidArgument)?;
        }
        self.bus.transfer(addr, &mut messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::atm_i2c::AtmI2c;
    use crate::i2c::common::{Ack, Head, I2cConfigBuilder, Tail};
    use crate::i2c::mock::{CountingYield, FakeUnit, RecordingLogger};
    use crate::i2c::system_setup::FixedClock;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
    use fugit::HertzU32;

    type TestI2c = AtmI2c<NoopRawMutex, FakeUnit, fn(), FixedClock, CountingYield, RecordingLogger>;

    fn no_pins() {}

    fn engine(unit: FakeUnit) -> TestI2c {
        let i2c = AtmI2c::new(
            unit,
            no_pins as fn(),
            FixedClock(HertzU32::MHz(16)),
            CountingYield::default(),
            RecordingLogger::default(),
        );
        i2c.configure(I2cConfigBuilder::new().build()).unwrap();
        i2c
    }

    #[test]
    fn test_write_read_uses_restart_then_stop() {
        let i2c = engine(FakeUnit::with_rx(&[0x12, 0x34]));
        let mut controller = I2cController::new(&i2c);
        let mut buffer = [0u8; 2];
        controller.write_read(0x50, &[0x00, 0x10], &mut buffer).unwrap();
        assert_eq!(buffer, [0x12, 0x34]);

        let phases = i2c.free().0.phases;
        assert_eq!(phases.len(), 6);
        assert_eq!(phases[2].tail(), Tail::Stall);
        assert_eq!(phases[3].head(), Head::Start);
        assert_eq!(phases[3].value(), 0xA1);
        assert_eq!(phases[4].driven_ack(), Ack::Ack);
        assert_eq!(phases[5].driven_ack(), Ack::Nack);
        assert_eq!(phases[5].tail(), Tail::Stop);
    }

    #[test]
    fn test_empty_write_probes_address() {
        let i2c = engine(FakeUnit::new());
        I2cController::new(&i2c).write(0x3c, &[]).unwrap();

        let phases = i2c.free().0.phases;
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].tail(), Tail::Stop);
    }

    #[test]
    fn test_read_only_transaction() {
        let i2c = engine(FakeUnit::with_rx(&[0x77]));
        let mut buffer = [0u8; 1];
        I2cController::new(&i2c).read(0x48, &mut buffer).unwrap();
        assert_eq!(buffer, [0x77]);

        let phases = i2c.free().0.phases;
        assert_eq!(phases[0].value(), 0x91);
        assert_eq!(phases[1].tail(), Tail::Stop);
    }

    #[test]
    fn test_stop_only_on_last_operation() {
        let i2c = engine(FakeUnit::new());
        let mut controller = I2cController::new(&i2c);
        controller
            .transaction(
                0x20,
                &mut [Operation::Write(&[0x01]), Operation::Write(&[0x02, 0x03])],
            )
            .unwrap();

        let phases = i2c.free().0.phases;
        let tails: std::vec::Vec<_> = phases.iter().map(|p| p.tail()).collect();
        assert_eq!(tails, [Tail::Stall, Tail::Stall, Tail::Stall, Tail::Stop]);
        assert_eq!(phases[2].head(), Head::Stall);
    }

    #[test]
    fn test_write_after_read_rejected() {
        let i2c = engine(FakeUnit::with_rx(&[0x55]));
        let mut controller = I2cController::new(&i2c);
        let mut buffer = [0u8; 1];

        assert_eq!(
            controller.transaction(
                0x50,
                &mut [Operation::Read(&mut buffer), Operation::Write(&[0x42])],
            ),
            Err(Error::NotSupported)
        );
        assert!(i2c.free().0.phases.is_empty());
    }

    #[test]
    fn test_adjacent_reads_rejected() {
        let i2c = engine(FakeUnit::with_rx(&[0x01, 0x02]));
        let mut controller = I2cController::new(&i2c);
        let mut first = [0u8; 1];
        let mut second = [0u8; 1];

        assert_eq!(
            controller.transaction(
                0x50,
                &mut [Operation::Read(&mut first), Operation::Read(&mut second)],
            ),
            Err(Error::NotSupported)
        );
        assert_eq!(first, [0]);
        assert!(i2c.free().0.phases.is_empty());
    }

    #[test]
    fn test_too_many_operations_rejected() {
        let i2c = engine(FakeUnit::new());
        let mut controller = I2cController::new(&i2c);
        let byte = [0u8];
        let mut operations: [Operation<'_>; MAX_OPERATIONS + 1] =
            core::array::from_fn(|_| Operation::Write(&byte));

        assert_eq!(
            controller.transaction(0x20, &mut operations),
            Err(Error::InvalidArgument)
        );
        assert!(i2c.free().0.phases.is_empty());
    }

    #[test]
    fn test_nack_maps_to_embedded_hal_kind() {
        let mut unit = FakeUnit::new();
        unit.nack_on = Some(0);
        let i2c = engine(unit);
        let err = I2cController::new(&i2c).write(0x20, &[0x01]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
        );
    }
}
