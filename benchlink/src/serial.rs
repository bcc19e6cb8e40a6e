//! This module provides the implementation for an instrument controlled via a serial port.
//!
//! It includes a blocking implementation of the [`crate::InstrumentInterface`] trait using
//! the `serialport` crate.

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{Instrument, InstrumentError};

/// A blocking serial port implementation using the `serialport` crate.
///
/// The functions here return an [`Instrument`] wrapping a [`serialport::SerialPort`] trait
/// object, so the result can be used anywhere an
/// [`crate::InstrumentInterface`] is expected.
#[derive(Debug)]
pub struct SerialInterface {}

impl SerialInterface {
    /// Create an instrument interface with a simple serial port configuration.
    ///
    /// Data bits, parity, and stop bits are left at the `serialport` defaults (8N1); the
    /// timeout is set to 3 seconds. Use [`SerialInterface::full`] if your instrument needs a
    /// different configuration.
    ///
    /// # Arguments
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    /// * `baud_rate` - The baud rate for communications.
    pub fn simple(
        port: &str,
        baud_rate: u32,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let spb = serialport::new(port, baud_rate).timeout(Duration::from_secs(3));
        Self::full(spb)
    }

    /// Create an instrument interface from a fully configured [`SerialPortBuilder`].
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the
    /// `set_terminator` function. Note that the terminator is automatically appended to
    /// commands and reading responses will read until the terminator is found.
    ///
    /// # Arguments
    /// * `spb` - A `SerialPortBuilder` to configure the serial port. See
    ///   [`serialport::SerialPortBuilder`] and the [`serialport::new`] function for more
    ///   details.
    pub fn full(spb: SerialPortBuilder) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let port = spb.open()?;
        let timeout = port.timeout();
        Ok(Instrument::new(port, timeout))
    }
}
