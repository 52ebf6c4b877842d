// Licensed under the Apache-2.0 license

//! Crate-wide helpers shared by the peripheral drivers.

use core::fmt::Arguments;

/// Diagnostic sink used by the drivers.
///
/// Drivers are generic over the logger so that production builds can use
/// [`NoOpLogger`] and pay nothing, while bring-up builds route messages to
/// a UART or to the `log` facade.
pub trait Logger {
    fn debug(&mut self, args: Arguments<'_>);
    fn error(&mut self, args: Arguments<'_>);
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _args: Arguments<'_>) {}
    fn error(&mut self, _args: Arguments<'_>) {}
}

/// Logger that forwards to the `log` crate under a fixed target.
#[derive(Clone, Copy, Debug)]
pub struct LogFacade {
    target: &'static str,
}

impl LogFacade {
    #[must_use]
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new("atm_ddk")
    }
}

impl Logger for LogFacade {
    fn debug(&mut self, args: Arguments<'_>) {
        log::debug!(target: self.target, "{args}");
    }

    fn error(&mut self, args: Arguments<'_>) {
        log::error!(target: self.target, "{args}");
    }
}
