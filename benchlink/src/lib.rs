//! BenchLink: talk to your laboratory bench equipment from Rust.
//!
//! BenchLink provides the interface layer that instrument drivers in this workspace are built
//! on. It consists of the [`InstrumentInterface`] trait, an [`InstrumentError`] type that all
//! drivers return, and a set of trait implementations for the physical channels we actually
//! have on the bench:
//!
//! - Serial (blocking) using the [`serialport`] crate, behind the `serial` feature.
//! - USB bulk endpoints using the [`rusb`] crate, behind the `usb` feature. This is the
//!   channel used by instruments that expose a plain command/response protocol over a pair of
//!   bulk endpoints rather than a virtual COM port.
//!
//! For tests, the [`LoopbackInterfaceString`] and [`LoopbackInterfaceBytes`] simulators allow
//! driver crates to script the expected traffic in both directions without hardware attached.
//!
//! # Writing a driver
//!
//! A driver takes any type implementing [`InstrumentInterface`], usually wrapped in an
//! `Arc<Mutex<..>>` so that channels of the same instrument can be handed to different
//! threads. Line-oriented instruments use [`InstrumentInterface::sendcmd`] and
//! [`InstrumentInterface::read_until_terminator`]; frame-oriented instruments (USB bulk)
//! use [`InstrumentInterface::read_chunk`] and handle framing themselves.

#![warn(missing_docs)]

mod instrument;
mod loopback;
#[cfg(feature = "serial")]
mod serial;
#[cfg(feature = "usb")]
mod usb;

pub use instrument::{Instrument, InstrumentError};
pub use loopback::{LoopbackInterfaceBytes, LoopbackInterfaceString};
#[cfg(feature = "serial")]
pub use serial::SerialInterface;
#[cfg(feature = "usb")]
pub use usb::UsbInterface;

use std::time::{Duration, Instant};

/// The `InstrumentInterface` trait defines the interface for controlling instruments.
///
/// Implementors provide the raw byte transfer primitives [`read_exact`](Self::read_exact) and
/// [`write_raw`](Self::write_raw); everything a typical command/response driver needs is then
/// available through the provided methods. Interfaces with a natural frame size (USB bulk
/// endpoints) additionally implement [`read_chunk`](Self::read_chunk).
pub trait InstrumentInterface {
    /// Read exactly `buf.len()` bytes from the instrument.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Write raw bytes to the instrument, flushing where the channel buffers.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Get the terminator that is appended to commands and ends responses.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// Drivers call this once at construction with whatever their instrument expects; an
    /// empty terminator is valid for instruments that frame commands by the transfer itself.
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the read timeout of the interface.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Read one frame from the instrument, up to the interface's natural packet size.
    ///
    /// Returns the bytes of the frame, which may be fewer than the packet size and may be
    /// empty. A read that runs into the channel timeout returns
    /// [`InstrumentError::Timeout`]; drivers that drain a device-side buffer use this as
    /// their end-of-data condition. Interfaces without a frame concept return
    /// [`InstrumentError::InterfaceCommandNotSupported`].
    fn read_chunk(&mut self) -> Result<Vec<u8>, InstrumentError> {
        Err(InstrumentError::InterfaceCommandNotSupported)
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the
    /// instrument.
    ///
    /// # Arguments
    /// * `cmd` - A string slice that will be sent to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let full_cmd = format!("{}{}", cmd, self.get_terminator());
        self.write_raw(full_cmd.as_bytes())
    }

    /// Read byte-by-byte until the terminator is found and return the trimmed response.
    ///
    /// If no terminator is encountered, the function blocks until the interface timeout is
    /// reached and returns [`InstrumentError::Timeout`]. If a non-UTF-8 byte is received, an
    /// error is printed to stderr and the byte is skipped.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.get_terminator().to_string();
        let timeout = self.get_timeout();
        let mut response = String::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < timeout {
            self.read_exact(&mut single_buf)?;
            if let Ok(val) = str::from_utf8(&single_buf) {
                response.push_str(val);
            } else {
                eprintln!("Received invalid UTF-8 data: {single_buf:?}");
            }
            if !terminator.is_empty() && response.ends_with(&terminator) {
                let retval = response.trim();
                return Ok(retval.to_string());
            }
        }

        Err(InstrumentError::Timeout(timeout))
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// This uses [`sendcmd`](Self::sendcmd) to send the command and then reads the response
    /// until the terminator. A timeout is reported as [`InstrumentError::TimeoutQuery`] so
    /// the caller knows which query went unanswered.
    ///
    /// # Arguments
    /// * `cmd` - The command to send to the instrument for which we expect a response.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        match self.read_until_terminator() {
            Err(InstrumentError::Timeout(timeout)) => Err(InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            }),
            other => other,
        }
    }
}
