// Licensed under the Apache-2.0 license

//! Message sequencer.
//!
//! Turns one logical message into a run of bus phases. Only the first
//! message of a transfer opens the bus with a write address phase; reads
//! always re-address because the direction bit travels with the address.

use crate::common::Logger;
use crate::i2c::common::{address_byte, Ack, Direction, Error, Head, Message, Tail};
use crate::i2c::phase::PhaseDriver;
use crate::i2c::traits::{PollYield, TransactionUnit};

/// Run `message` as the `index`-th message of a transfer to `address`.
///
/// # Errors
///
/// Any phase error aborts the message and is returned unchanged.
pub fn run_message<H, Y, L>(
    phase: &mut PhaseDriver<H, Y, L>,
    address: u8,
    message: &mut Message<'_>,
    index: usize,
) -> Result<(), Error>
where
    H: TransactionUnit,
    Y: PollYield,
    L: Logger,
{
    match message {
        Message::Write { bytes, stop } => write_message(phase, address, bytes, *stop, index),
        Message::Read { buffer, stop } => read_message(phase, address, buffer, *stop),
    }
}

/// Transmit `bytes` to `address`.
///
/// A zero-length write is only accepted as the first message with `stop`
/// set: it becomes a lone address phase closed by STOP.
///
/// # Errors
///
/// `InvalidArgument` for a zero-length write without STOP (or not first in
/// the transfer), otherwise the first phase error.
pub fn write_message<H, Y, L>(
    phase: &mut PhaseDriver<H, Y, L>,
    address: u8,
    bytes: &[u8],
    stop: bool,
    index: usize,
) -> Result<(), Error>
where
    H: TransactionUnit,
    Y: PollYield,
    L: Logger,
{
    if bytes.is_empty() && (!stop || index != 0) {
        phase.logger_mut().error(format_args!(
            "Invalid message length. Received: 0 stop {stop} index {index}"
        ));
        return Err(Error::InvalidArgument);
    }

    if index == 0 {
        let tail = if bytes.is_empty() {
            Tail::Stop
        } else {
            Tail::Stall
        };
        phase.write_byte(Head::Start, address_byte(address, Direction::Write), tail)?;
    }

    let Some((last, body)) = bytes.split_last() else {
        return Ok(());
    };

    for &byte in body {
        phase.write_byte(Head::Stall, byte, Tail::Stall)?;
    }

    let tail = if stop { Tail::Stop } else { Tail::Stall };
    phase.write_byte(Head::Stall, *last, tail)
}

/// Receive `buffer.len()` bytes from `address` into `buffer`.
///
/// Every byte but the last is answered with ACK; the last gets NACK and
/// closes with STOP, or with a repeated START when `stop` is clear. Bytes
/// latched before a failing phase stay in `buffer`.
///
/// # Errors
///
/// `InvalidArgument` for an empty buffer, otherwise the first phase error.
pub fn read_message<H, Y, L>(
    phase: &mut PhaseDriver<H, Y, L>,
    address: u8,
    buffer: &mut [u8],
    stop: bool,
) -> Result<(), Error>
where
    H: TransactionUnit,
    Y: PollYield,
    L: Logger,
{
    let Some((last, body)) = buffer.split_last_mut() else {
        phase
            .logger_mut()
            .error(format_args!("Invalid message length. Received: 0"));
        return Err(Error::InvalidArgument);
    };

    phase.write_byte(
        Head::Start,
        address_byte(address, Direction::Read),
        Tail::Stall,
    )?;

    for slot in body.iter_mut() {
        *slot = phase.read_byte(Ack::Ack, Tail::Stall)?;
    }

    let tail = if stop { Tail::Stop } else { Tail::Restart };
    *last = phase.read_byte(Ack::Nack, tail)?;
    Ok(())
}
