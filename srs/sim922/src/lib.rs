//! A rust driver for the Stanford Research Systems SIM922 diode temperature monitor.
//!
//! The SIM922 reads up to four silicon diode sensors and reports both the raw diode voltage
//! and the temperature derived from its calibration curve. The module usually sits in a
//! SIM900 mainframe, which passes commands through to a slot once a `conn` preamble has
//! been sent; use [`Sim922::try_new_in_mainframe`] for that arrangement, or
//! [`Sim922::try_new`] when talking to the module directly.
//!
//! # Example
//!
//! This example connects through a SIM900 mainframe on slot 4.
//! ```no_run
//! use srs_sim922::{SerialInterfaceSim922, Sim922};
//!
//! // The port where the SIM900 mainframe is connected to
//! let port = "/dev/ttyUSB0";
//!
//! // Get the serial interface and pass through to the module in slot 4.
//! let serial_inst = SerialInterfaceSim922::simple(port).expect("Failed to open serial port");
//! let mut inst = Sim922::try_new_in_mainframe(serial_inst, 4, "xxyyzz").unwrap();
//!
//! // Print temperature and diode voltage of the first channel
//! let mut ch = inst.get_channel(0).unwrap();
//! println!("Temperature: {:?}", ch.get_temperature());
//! println!("Diode voltage: {:?}", ch.get_voltage());
//! ```

#![deny(warnings, missing_docs)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use benchlink::{Instrument, InstrumentError, InstrumentInterface, SerialInterface};

use measurements::{Temperature, Voltage};

use serialport::SerialPort;

/// A SerialInterface for the SIM922.
///
/// Builds a `benchlink` SerialInterface with the baud rate and timeout for communication
/// with the SIM900 mainframe.
#[derive(Debug)]
pub struct SerialInterfaceSim922 {}

impl SerialInterfaceSim922 {
    /// Try to create an Instrument interface with a simple serial port configuration.
    ///
    /// This is analog to the `simple` method of the `SerialInterface` struct in `benchlink`,
    /// however, it sets the 57600 baud rate the mainframe talks at and a 500 ms timeout.
    ///
    /// Arguments:
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM4"`.
    pub fn simple(port: &str) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let port = serialport::new(port, 57600).timeout(Duration::from_millis(500));
        SerialInterface::full(port)
    }
}

/// A rust driver for the SIM922.
///
/// See the top-level documentation for an example on how to use this driver.
pub struct Sim922<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    num_channels: usize,
    escape: Option<String>,
}

impl<T: InstrumentInterface> Sim922<T> {
    /// Create a new Sim922 instance talking to the module directly.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`]
    ///   trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\r\n");
        let interface = Arc::new(Mutex::new(intf));

        Ok(Sim922 {
            interface,
            num_channels: 4,
            escape: None,
        })
    }

    /// Create a new Sim922 instance for a module sitting in a SIM900 mainframe.
    ///
    /// Sends the mainframe's `conn` preamble, after which all commands pass through to the
    /// module. The escape string returns communication to the mainframe; pick one that
    /// cannot occur in regular traffic. Call
    /// [`disconnect_mainframe`](Self::disconnect_mainframe) when done.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`]
    ///   trait.
    /// * `slot` - The mainframe slot the module sits in.
    /// * `escape` - The pass-through escape string, e.g., `"xxyyzz"`.
    pub fn try_new_in_mainframe(
        interface: T,
        slot: u8,
        escape: &str,
    ) -> Result<Self, InstrumentError> {
        let mut inst = Self::try_new(interface)?;
        inst.escape = Some(escape.to_string());
        inst.send(&format!("conn {slot}, \"{escape}\""))?;
        Ok(inst)
    }

    /// Return communication to the mainframe by sending the escape string.
    ///
    /// Does nothing for a direct module connection.
    pub fn disconnect_mainframe(&mut self) -> Result<(), InstrumentError> {
        if let Some(escape) = self.escape.clone() {
            self.send(&escape)?;
        }
        Ok(())
    }

    /// Get a new channel with a given index for the Channel.
    ///
    /// Please note that channels are zero indexed.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        if idx >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_channels,
            });
        }
        Ok(Channel::new(idx, Arc::clone(&self.interface)))
    }

    /// Query the name of the instrument.
    ///
    /// Returns a comma-separated string of manufacturer, model, serial number, and firmware
    /// version.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Send a command to the instrument.
    pub fn send(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)
    }

    /// Send a list of commands to the instrument, without reading replies.
    pub fn send_list(&mut self, cmds: &[&str]) -> Result<(), InstrumentError> {
        for cmd in cmds {
            self.send(cmd)?;
        }
        Ok(())
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.send(cmd)?;
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.read_until_terminator()
    }
}

impl<T: InstrumentInterface> Clone for Sim922<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            num_channels: self.num_channels,
            escape: self.escape.clone(),
        }
    }
}

/// Channel structure representing a single diode channel of the SIM922.
///
/// **This structure can only be created through the [`Sim922`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// Get a new channel for the given instrument interface.
    ///
    /// This function can only be called from inside of the [`Sim922`] struct.
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Channel { idx, interface }
    }

    /// Get the temperature reading of this channel, from the module's calibration curve.
    pub fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        let resp = self.query("tval?")?;
        let val = resp
            .trim()
            .parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))?;
        Ok(Temperature::from_kelvin(val))
    }

    /// Get the raw diode voltage reading of this channel, in millivolts.
    pub fn get_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.query("volt?")?;
        let val = resp
            .trim()
            .parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))?;
        Ok(Voltage::from_millivolts(val))
    }

    /// Map the zero-indexed channel number to the module's one-indexed channel number.
    fn channel_number(&self) -> usize {
        self.idx + 1
    }

    /// Send a command for this channel to the interface.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(format!("{} {}", cmd, self.channel_number()).as_str())
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.read_until_terminator()
    }
}

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            interface: self.interface.clone(),
        }
    }
}
