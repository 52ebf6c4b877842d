// Licensed under the Apache-2.0 license

//! Scripted transaction unit for host tests.

use crate::i2c::common::{Ack, Head, Tail};
use crate::i2c::registers::{OutgoingData, TransactionSetup, TransactionStatus};
use crate::i2c::traits::{PollYield, TransactionUnit};
use std::collections::VecDeque;

/// Register access as seen by the fake.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Outgoing(OutgoingData),
    Setup(TransactionSetup),
    Status,
    Incoming,
    ClockDivider(u16),
}

/// One GO strobe with the data register contents at the time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Phase {
    pub setup: TransactionSetup,
    pub data: OutgoingData,
}

impl Phase {
    pub fn head(&self) -> Head {
        self.setup.head()
    }

    pub fn tail(&self) -> Tail {
        self.setup.tail().expect("reserved tail encoding")
    }

    pub fn is_receive(&self) -> bool {
        self.setup.master_drives_ack()
    }

    /// ACK the controller drives on a receive phase.
    pub fn driven_ack(&self) -> Ack {
        self.setup.ack_to_drive()
    }

    /// Byte the controller transmits on a transmit phase.
    pub fn value(&self) -> u8 {
        self.data.value()
    }
}

#[derive(Default)]
pub struct FakeUnit {
    pub accesses: Vec<Access>,
    pub phases: Vec<Phase>,
    pub clock_divider: Option<u16>,
    /// Status reads that report RUNNING before each phase completes.
    pub busy_polls: u32,
    /// Phase index that never completes.
    pub hang_on: Option<usize>,
    /// Phase index answered with NACK.
    pub nack_on: Option<usize>,
    /// Bytes returned by receive phases, in order.
    pub rx: VecDeque<u8>,
    data: Option<OutgoingData>,
    polls_left: u32,
}

impl FakeUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rx(bytes: &[u8]) -> Self {
        Self {
            rx: bytes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn setup_writes(&self) -> Vec<TransactionSetup> {
        self.accesses
            .iter()
            .filter_map(|access| match access {
                Access::Setup(setup) => Some(*setup),
                _ => None,
            })
            .collect()
    }

    pub fn status_reads(&self) -> usize {
        self.accesses
            .iter()
            .filter(|access| matches!(access, Access::Status))
            .count()
    }

    fn current_phase(&self) -> Option<usize> {
        self.phases.len().checked_sub(1)
    }
}

impl TransactionUnit for FakeUnit {
    fn write_outgoing(&mut self, data: OutgoingData) {
        self.accesses.push(Access::Outgoing(data));
        self.data = Some(data);
    }

    fn write_setup(&mut self, setup: TransactionSetup) {
        self.accesses.push(Access::Setup(setup));
        if setup.go() {
            self.phases.push(Phase {
                setup,
                data: self.data.unwrap_or(OutgoingData::release(false)),
            });
            self.polls_left = self.busy_polls;
        }
    }

    fn status(&mut self) -> TransactionStatus {
        self.accesses.push(Access::Status);
        let phase = self.current_phase();
        if phase.is_some() && phase == self.hang_on {
            return TransactionStatus::from_bits(1);
        }
        if self.polls_left > 0 {
            self.polls_left -= 1;
            return TransactionStatus::from_bits(1);
        }
        if phase.is_some() && phase == self.nack_on {
            TransactionStatus::done(Ack::Nack)
        } else {
            TransactionStatus::done(Ack::Ack)
        }
    }

    fn incoming(&mut self) -> u8 {
        self.accesses.push(Access::Incoming);
        self.rx.pop_front().unwrap_or(0xff)
    }

    fn write_clock_divider(&mut self, divider: u16) {
        self.accesses.push(Access::ClockDivider(divider));
        self.clock_divider = Some(divider);
    }
}

/// Yield hook that only counts.
#[derive(Default)]
pub struct CountingYield {
    pub count: u32,
}

impl PollYield for CountingYield {
    fn yield_now(&mut self) {
        self.count += 1;
    }
}

/// Logger that keeps every message.
#[derive(Default)]
pub struct RecordingLogger {
    pub debug: Vec<String>,
    pub error: Vec<String>,
}

impl crate::common::Logger for RecordingLogger {
    fn debug(&mut self, args: core::fmt::Arguments<'_>) {
        self.debug.push(format!("{args}"));
    }

    fn error(&mut self, args: core::fmt::Arguments<'_>) {
        self.error.push(format!("{args}"));
    }
}
