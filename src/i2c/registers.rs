// Licensed under the Apache-2.0 license

//! Register layout of the ATM APB I2C transaction unit.
//!
//! The unit runs one 8-bit bus phase per GO strobe. Software frames the
//! phase with a head (START or continue) and a tail (STOP, hold or
//! repeated START), then polls TRANSACTION_STATUS until RUNNING clears.

use crate::i2c::common::{Ack, Head, Tail};
use crate::i2c::traits::TransactionUnit;
use core::ptr::{read_volatile, write_volatile};

pub const OUTGOING_DATA_OFFSET: usize = 0x00;
pub const INCOMING_DATA_OFFSET: usize = 0x04;
pub const TRANSACTION_SETUP_OFFSET: usize = 0x08;
pub const TRANSACTION_STATUS_OFFSET: usize = 0x0c;
pub const CLOCK_CONTROL_OFFSET: usize = 0x10;

const DATA_O_SHIFT: u32 = 0;
const DATA_OE_SHIFT: u32 = 8;
const DATA_PU_MASK: u32 = 1 << 16;

const GO_MASK: u32 = 1 << 0;
const HEAD_SHIFT: u32 = 1;
const HEAD_MASK: u32 = 0b1 << HEAD_SHIFT;
const TAIL_SHIFT: u32 = 2;
const TAIL_MASK: u32 = 0b11 << TAIL_SHIFT;
const ACK_VALUE_TO_DRIVE_SHIFT: u32 = 4;
const ACK_VALUE_TO_DRIVE_MASK: u32 = 1 << ACK_VALUE_TO_DRIVE_SHIFT;
const MASTER_DRIVES_ACK_MASK: u32 = 1 << 5;
const MSTR_MASK: u32 = 1 << 6;

const RUNNING_MASK: u32 = 1 << 0;
const ACK_VALUE_MASK: u32 = 1 << 1;

pub const CLKDIV_MAX: u32 = 0xffff;

/// OUTGOING_DATA register value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutgoingData(u32);

impl OutgoingData {
    /// Controller drives all eight bits; output-enable is the complement of
    /// the value so ones are left to the pull-up and zeros are pulled low.
    #[must_use]
    pub const fn drive(value: u8, pullup: bool) -> Self {
        let pu = if pullup { DATA_PU_MASK } else { 0 };
        Self(pu | ((!value as u32) << DATA_OE_SHIFT) | ((value as u32) << DATA_O_SHIFT))
    }

    /// Controller releases SDA and listens.
    #[must_use]
    pub const fn release(pullup: bool) -> Self {
        Self(if pullup { DATA_PU_MASK } else { 0 })
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        (self.0 >> DATA_O_SHIFT) as u8
    }

    #[must_use]
    pub const fn output_enable(self) -> u8 {
        (self.0 >> DATA_OE_SHIFT) as u8
    }

    #[must_use]
    pub const fn pullup(self) -> bool {
        self.0 & DATA_PU_MASK != 0
    }
}

/// TRANSACTION_SETUP register value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransactionSetup(u32);

impl TransactionSetup {
    /// Everything cleared, used to abort a stuck phase.
    pub const IDLE: Self = Self(0);

    /// Controller mode with GO deasserted.
    pub const RELEASED: Self = Self(MSTR_MASK);

    /// GO for a phase where the controller transmits and the peer drives ACK.
    #[must_use]
    pub const fn transmit(head: Head, tail: Tail) -> Self {
        Self(
            GO_MASK
                | ACK_VALUE_TO_DRIVE_MASK
                | MSTR_MASK
                | ((tail as u32) << TAIL_SHIFT)
                | ((head as u32) << HEAD_SHIFT),
        )
    }

    /// GO for a phase where the controller receives and drives `ack`.
    /// Receive phases never open the bus, so the head is always STALL.
    #[must_use]
    pub const fn receive(ack: Ack, tail: Tail) -> Self {
        Self(
            GO_MASK
                | ((ack as u32) << ACK_VALUE_TO_DRIVE_SHIFT)
                | MASTER_DRIVES_ACK_MASK
                | MSTR_MASK
                | ((tail as u32) << TAIL_SHIFT)
                | ((Head::Stall as u32) << HEAD_SHIFT),
        )
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn go(self) -> bool {
        self.0 & GO_MASK != 0
    }

    #[must_use]
    pub const fn head(self) -> Head {
        if self.0 & HEAD_MASK == 0 {
            Head::Start
        } else {
            Head::Stall
        }
    }

    /// Decoded tail, `None` for the reserved encoding.
    #[must_use]
    pub const fn tail(self) -> Option<Tail> {
        match (self.0 & TAIL_MASK) >> TAIL_SHIFT {
            0 => Some(Tail::Stop),
            1 => Some(Tail::Stall),
            2 => Some(Tail::Restart),
            _ => None,
        }
    }

    #[must_use]
    pub const fn ack_to_drive(self) -> Ack {
        if self.0 & ACK_VALUE_TO_DRIVE_MASK == 0 {
            Ack::Ack
        } else {
            Ack::Nack
        }
    }

    #[must_use]
    pub const fn master_drives_ack(self) -> bool {
        self.0 & MASTER_DRIVES_ACK_MASK != 0
    }
}

/// TRANSACTION_STATUS register value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransactionStatus(u32);

impl TransactionStatus {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Builds a completed status carrying the observed ACK level.
    #[must_use]
    pub const fn done(ack: Ack) -> Self {
        match ack {
            Ack::Ack => Self(0),
            Ack::Nack => Self(ACK_VALUE_MASK),
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn running(self) -> bool {
        self.0 & RUNNING_MASK != 0
    }

    /// ACK level sampled on the ninth clock. Active low.
    #[must_use]
    pub const fn ack(self) -> Ack {
        if self.0 & ACK_VALUE_MASK == 0 {
            Ack::Ack
        } else {
            Ack::Nack
        }
    }
}

/// Memory-mapped transaction unit.
pub struct Mmio {
    base: *mut u32,
}

// SAFETY: the register block is only reached through `&mut self`, and the
// driver owning this handle is its single user.
unsafe impl Send for Mmio {}

impl Mmio {
    /// Create a handle for the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` MUST point to an ATM I2C register block, and no other handle
    /// to the same block may exist for the lifetime of this one.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` guarantees `base` addresses the register block, and
        // every offset used here lies within it.
        unsafe { read_volatile(self.base.byte_add(offset)) }
    }

    fn write(&mut self, offset: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { write_volatile(self.base.byte_add(offset), value) }
    }
}

impl TransactionUnit for Mmio {
    fn write_outgoing(&mut self, data: OutgoingData) {
        self.write(OUTGOING_DATA_OFFSET, data.bits());
    }

    fn write_setup(&mut self, setup: TransactionSetup) {
        self.write(TRANSACTION_SETUP_OFFSET, setup.bits());
    }

    fn status(&mut self) -> TransactionStatus {
        TransactionStatus::from_bits(self.read(TRANSACTION_STATUS_OFFSET))
    }

    fn incoming(&mut self) -> u8 {
        (self.read(INCOMING_DATA_OFFSET) & 0xff) as u8
    }

    fn write_clock_divider(&mut self, divider: u16) {
        self.write(CLOCK_CONTROL_OFFSET, u32::from(divider));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_sets_complemented_output_enable() {
        let data = OutgoingData::drive(0xA5, false);
        assert_eq!(data.value(), 0xA5);
        assert_eq!(data.output_enable(), 0x5A);
        assert!(!data.pullup());
        assert!(OutgoingData::drive(0x00, true).pullup());
    }

    #[test]
    fn test_release_only_carries_pullup() {
        assert_eq!(OutgoingData::release(false).bits(), 0);
        assert_eq!(OutgoingData::release(true).bits(), 1 << 16);
    }

    #[test]
    fn test_transmit_setup_fields() {
        let setup = TransactionSetup::transmit(Head::Start, Tail::Restart);
        assert!(setup.go());
        assert_eq!(setup.head(), Head::Start);
        assert_eq!(setup.tail(), Some(Tail::Restart));
        assert_eq!(setup.ack_to_drive(), Ack::Nack);
        assert!(!setup.master_drives_ack());
    }

    #[test]
    fn test_receive_setup_fields() {
        let setup = TransactionSetup::receive(Ack::Ack, Tail::Stall);
        assert!(setup.go());
        assert_eq!(setup.head(), Head::Stall);
        assert_eq!(setup.tail(), Some(Tail::Stall));
        assert_eq!(setup.ack_to_drive(), Ack::Ack);
        assert!(setup.master_drives_ack());

        let last = TransactionSetup::receive(Ack::Nack, Tail::Stop);
        assert_eq!(last.ack_to_drive(), Ack::Nack);
        assert_eq!(last.tail(), Some(Tail::Stop));
    }

    #[test]
    fn test_released_setup_has_go_clear() {
        assert!(!TransactionSetup::RELEASED.go());
        assert_eq!(TransactionSetup::IDLE.bits(), 0);
    }

    #[test]
    fn test_status_decoding() {
        assert!(TransactionStatus::from_bits(1).running());
        assert_eq!(TransactionStatus::done(Ack::Ack).ack(), Ack::Ack);
        assert_eq!(TransactionStatus::done(Ack::Nack).ack(), Ack::Nack);
        assert!(!TransactionStatus::done(Ack::Nack).running());
    }

    #[test]
    fn test_mmio_accesses_backing_memory() {
        let mut block = [0u32; 5];
        block[3] = 0b10;
        block[1] = 0x1ab;
        let mut mmio = unsafe { Mmio::new(block.as_mut_ptr() as usize) };

        mmio.write_outgoing(OutgoingData::drive(0x3c, true));
        mmio.write_setup(TransactionSetup::transmit(Head::Stall, Tail::Stop));
        mmio.write_clock_divider(39);
        assert_eq!(mmio.status().ack(), Ack::Nack);
        assert_eq!(mmio.incoming(), 0xab);

        assert_eq!(block[0], OutgoingData::drive(0x3c, true).bits());
        assert_eq!(
            block[2],
            TransactionSetup::transmit(Head::Stall, Tail::Stop).bits()
        );
        assert_eq!(block[4], 39);
    }
}
