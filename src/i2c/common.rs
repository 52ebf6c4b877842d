// Licensed under the Apache-2.0 license

//! Common types and constants for the ATM I2C driver modules.
//!
//! This module provides shared definitions for error handling, bus phase
//! framing, messages and controller configuration.

use core::fmt;
use fugit::HertzU32;

/// Default poll iteration ceiling for one bus phase.
pub const DEFAULT_POLL_TIMEOUT: u32 = 10_000;

/// Driver error kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Zero-length read, or zero-length write without STOP.
    InvalidArgument,
    /// Target mode, 10-bit addressing or an unmapped speed class.
    NotSupported,
    /// A phase never completed within the poll ceiling.
    IoTimeout,
    /// The peer answered a controller-driven byte with NACK.
    IoNack,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidArgument => "invalid argument",
            Error::NotSupported => "not supported",
            Error::IoTimeout => "transaction unit timed out",
            Error::IoNack => "peer did not acknowledge",
        };
        f.write_str(msg)
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            Error::IoNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Error::InvalidArgument | Error::NotSupported | Error::IoTimeout => ErrorKind::Other,
        }
    }
}

/// How a phase opens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Head {
    /// Issue a START (or repeated START) condition first.
    Start = 0,
    /// Continue an already-open bus.
    Stall = 1,
}

/// How a phase closes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Tail {
    /// Release the bus.
    Stop = 0,
    /// Hold the bus for the next phase.
    Stall = 1,
    /// Issue a repeated START.
    Restart = 2,
}

/// Acknowledge level on the wire. ACK is active low.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Ack {
    Ack = 0,
    Nack = 1,
}

/// Direction bit appended to the 7-bit address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Encodes the address byte: `(address << 1) | rw`.
#[must_use]
pub const fn address_byte(address: u8, direction: Direction) -> u8 {
    (address << 1) | direction as u8
}

/// One logical message of a transfer.
///
/// Write buffers are borrowed; read buffers are filled in place. `stop`
/// releases the bus after the message.
#[derive(Debug, PartialEq, Eq)]
pub enum Message<'a> {
    Write { bytes: &'a [u8], stop: bool },
    Read { buffer: &'a mut [u8], stop: bool },
}

impl<'a> Message<'a> {
    /// Write message that keeps the bus open.
    #[must_use]
    pub fn write(bytes: &'a [u8]) -> Self {
        Message::Write { bytes, stop: false }
    }

    /// Read message that ends with a repeated START.
    #[must_use]
    pub fn read(buffer: &'a mut [u8]) -> Self {
        Message::Read {
            buffer,
            stop: false,
        }
    }

    /// Zero-length, STOP-terminated write used to probe an address.
    #[must_use]
    pub fn probe() -> Self {
        Message::Write {
            bytes: &[],
            stop: true,
        }
    }

    /// Same message, releasing the bus afterwards.
    #[must_use]
    pub fn with_stop(self) -> Self {
        match self {
            Message::Write { bytes, .. } => Message::Write { bytes, stop: true },
            Message::Read { buffer, .. } => Message::Read { buffer, stop: true },
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        match self {
            Message::Write { .. } => Direction::Write,
            Message::Read { .. } => Direction::Read,
        }
    }

    #[must_use]
    pub fn stop(&self) -> bool {
        match self {
            Message::Write { stop, .. } | Message::Read { stop, .. } => *stop,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Message::Write { bytes, .. } => bytes.len(),
            Message::Read { buffer, .. } => buffer.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bus role requested from `configure`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum I2cMode {
    Controller,
    Target,
}

/// Bus speed classes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum I2cSpeed {
    Standard,
    Fast,
    FastPlus,
    High,
    Ultra,
}

/// Result of mapping a speed class to a bus frequency.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpeedLookup {
    Supported(HertzU32),
    Unsupported,
}

impl I2cSpeed {
    /// Target SCL frequency for this class on the transaction unit.
    #[must_use]
    pub const fn lookup(self) -> SpeedLookup {
        match self {
            I2cSpeed::Standard => SpeedLookup::Supported(HertzU32::kHz(100)),
            I2cSpeed::Fast => SpeedLookup::Supported(HertzU32::kHz(400)),
            I2cSpeed::FastPlus => SpeedLookup::Supported(HertzU32::MHz(1)),
            I2cSpeed::High | I2cSpeed::Ultra => SpeedLookup::Unsupported,
        }
    }

    /// Maps a bitrate from static configuration to its speed class.
    #[must_use]
    pub const fn from_bitrate(bitrate_hz: u32) -> Option<Self> {
        match bitrate_hz {
            100_000 => Some(I2cSpeed::Standard),
            400_000 => Some(I2cSpeed::Fast),
            1_000_000 => Some(I2cSpeed::FastPlus),
            3_400_000 => Some(I2cSpeed::High),
            5_000_000 => Some(I2cSpeed::Ultra),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct I2cConfig {
    pub mode: I2cMode,
    pub speed: I2cSpeed,
    pub ten_bit_addressing: bool,
    pub sda_pullup: bool,
    pub poll_timeout: u32,
}

pub struct I2cConfigBuilder {
    mode: I2cMode,
    speed: I2cSpeed,
    ten_bit_addressing: bool,
    sda_pullup: bool,
    poll_timeout: u32,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: I2cMode::Controller,
            speed: I2cSpeed::Standard,
            ten_bit_addressing: false,
            sda_pullup: false,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
    #[must_use]
    pub fn mode(mut self, mode: I2cMode) -> Self {
        self.mode = mode;
        self
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn ten_bit_addressing(mut self, enabled: bool) -> Self {
        self.ten_bit_addressing = enabled;
        self
    }
    #[must_use]
    pub fn sda_pullup(mut self, enabled: bool) -> Self {
        self.sda_pullup = enabled;
        self
    }
    #[must_use]
    pub fn poll_timeout(mut self, iterations: u32) -> Self {
        self.poll_timeout = iterations;
        self
    }
    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            mode: self.mode,
            speed: self.speed,
            ten_bit_addressing: self.ten_bit_addressing,
            sda_pullup: self.sda_pullup,
            poll_timeout: self.poll_timeout,
        }
    }
}

/// Static description of one controller instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    pub instance: u8,
    pub sda_pullup: bool,
    pub mode: I2cMode,
    /// Default bus bitrate in Hz.
    pub bitrate: u32,
    pub poll_timeout: u32,
}

impl DeviceConfig {
    #[must_use]
    pub const fn new(instance: u8, bitrate: u32) -> Self {
        Self {
            instance,
            sda_pullup: false,
            mode: I2cMode::Controller,
            bitrate,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}
