//! A rust driver for the AMETEK Signal Recovery 7270 lock-in amplifier.
//!
//! The 7270 talks a plain ASCII command/response protocol over a pair of USB bulk endpoints.
//! The majority of measurements should be made using the front-panel methods [`get_x`],
//! [`get_y`], [`get_magnitude`], and [`get_phase`]. If faster sampling is required, the
//! instrument's internal curve buffer can be used: it records up to 100,000 samples per
//! channel at intervals down to 1 µs, which are then drained to the host and decoded after
//! the acquisition finishes.
//!
//! [`get_x`]: LockIn7270::get_x
//! [`get_y`]: LockIn7270::get_y
//! [`get_magnitude`]: LockIn7270::get_magnitude
//! [`get_phase`]: LockIn7270::get_phase
//!
//! # Example
//!
//! A single front-panel measurement:
//!
//! ```no_run
//! use lockin_7270::{LockIn7270, UsbInterfaceLockIn};
//!
//! let interface = UsbInterfaceLockIn::simple().expect("Failed to open USB device");
//! let mut lockin = LockIn7270::try_new(interface).unwrap();
//! lockin.setup().unwrap();
//!
//! // Magnitude matching the front-panel display, in volts.
//! let mag = lockin.get_magnitude().unwrap();
//! println!("Magnitude: {} V", mag.as_volts());
//! ```
//!
//! A buffered curve measurement:
//!
//! ```no_run
//! use std::thread;
//!
//! use lockin_7270::{CurveConfig, LockIn7270, UsbInterfaceLockIn};
//!
//! let interface = UsbInterfaceLockIn::simple().expect("Failed to open USB device");
//! let mut lockin = LockIn7270::try_new(interface).unwrap();
//! lockin.setup().unwrap();
//!
//! let config = CurveConfig {
//!     sample_interval_us: 100,
//!     buffer_length: 10_000,
//!     ..CurveConfig::default()
//! };
//! lockin.curve_setup(&config).unwrap();
//! lockin.start_acquisition();
//! thread::sleep(config.acquisition_time());
//! lockin.read_all_curves().unwrap();
//!
//! // The decoded samples are now available in the data store.
//! println!("{} X samples", lockin.data().x.len());
//! ```
//!
//! For repeated, externally paced curve acquisitions see [`LockIn7270::run`].

#![warn(missing_docs)]

mod curve;
mod interface;
mod run;
mod sensitivity;

pub use curve::{CurveChannel, CurveConfig, CurveMode, CurveStore, MAX_BUFFER_LENGTH, decode_curve};
pub use interface::UsbInterfaceLockIn;
pub use run::{RunSync, SyncEvent, VoltageWindow};
pub use sensitivity::full_scale_volts;

use std::sync::{Arc, Mutex};

use benchlink::{InstrumentError, InstrumentInterface};
use measurements::{Angle, Voltage};

/// Default instrument settings applied by [`LockIn7270::setup`].
///
/// Single internal reference, A-B differential voltage input, AC coupling, floating ground,
/// 100 ms time constant, bipolar input device. See the 7270 manual for the full command set.
pub const DEFAULT_SETUP: [(&str, i64); 7] = [
    ("REFMODE", 0),
    ("IE", 0),
    ("VMODE", 3),
    ("DCCOUPLE", 0),
    ("FLOAT", 1),
    ("TC", 12),
    ("FET", 0),
];

/// A rust driver for the AMETEK 7270 lock-in amplifier.
///
/// See the top-level documentation for examples on how to use this driver.
pub struct LockIn7270<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    setup_commands: Vec<(String, i64)>,
    data: CurveStore,
    sensitivity_code: i16,
    verbose: bool,
}

impl<T: InstrumentInterface> LockIn7270<T> {
    /// Create a new LockIn7270 instance with the given instrument interface.
    ///
    /// The driver is configured with [`DEFAULT_SETUP`]; call [`setup`](Self::setup) to
    /// actually write the settings to the instrument.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`]
    ///   trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let setup_commands = DEFAULT_SETUP
            .iter()
            .map(|(cmd, value)| (cmd.to_string(), *value))
            .collect();
        Self::with_setup(interface, setup_commands)
    }

    /// Create a new LockIn7270 instance with a custom set of setup commands.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`]
    ///   trait.
    /// * `setup_commands` - Command name / value pairs written, in order, by
    ///   [`setup`](Self::setup).
    pub fn with_setup(
        interface: T,
        setup_commands: Vec<(String, i64)>,
    ) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        // Commands are framed by the bulk transfer itself, no terminator.
        intf.set_terminator("");
        let interface = Arc::new(Mutex::new(intf));
        Ok(LockIn7270 {
            interface,
            setup_commands,
            data: CurveStore::default(),
            sensitivity_code: sensitivity::TOP_CODE,
            verbose: false,
        })
    }

    /// Echo best-effort query responses to the log when set.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Write the instrument settings this driver was constructed with.
    ///
    /// Finishes by enabling automatic sensitivity selection (`AS`). The settings are
    /// idempotent, so this can be called again at any time to restore a known configuration.
    pub fn setup(&mut self) -> Result<(), InstrumentError> {
        let cmds: Vec<String> = self
            .setup_commands
            .iter()
            .map(|(cmd, value)| format!("{cmd} {value}"))
            .collect();
        for cmd in &cmds {
            self.send(cmd)?;
        }
        self.send("AS")
    }

    /// Send a command to the instrument without reading a response.
    pub fn send(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)
    }

    /// Send a list of commands to the instrument, stopping at the first failure.
    pub fn send_list(&mut self, cmds: &[&str]) -> Result<(), InstrumentError> {
        for cmd in cmds {
            self.send(cmd)?;
        }
        Ok(())
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// This is the propagating query path: write failures, read failures, and invalid UTF-8
    /// in the response are all returned to the caller.
    pub fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)?;
        let response = intf.read_chunk()?;
        Ok(String::from_utf8(response)?)
    }

    /// Query the instrument with a command, substituting an empty string on any failure.
    ///
    /// This is the best-effort path used for configuration commands that the instrument does
    /// not always answer. Swallowed errors are logged at debug level; with
    /// [`set_verbose`](Self::set_verbose) the response is echoed to the log as well.
    pub fn query_lenient(&mut self, cmd: &str) -> String {
        let response = match self.query(cmd) {
            Ok(response) => response,
            Err(err) => {
                log::debug!("query '{cmd}' got no response: {err}");
                String::new()
            }
        };
        if self.verbose {
            log::info!("{cmd} -> {response}");
        }
        response
    }

    /// Query the instrument and parse the response as a floating point number.
    pub fn get_float(&mut self, cmd: &str) -> Result<f64, InstrumentError> {
        let response = self.query(cmd)?;
        response
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(response))
    }

    /// Read the X value from the front panel.
    pub fn get_x(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.get_float("X.")?))
    }

    /// Read the Y value from the front panel.
    pub fn get_y(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.get_float("Y.")?))
    }

    /// Read the magnitude value from the front panel.
    pub fn get_magnitude(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.get_float("MAG.")?))
    }

    /// Read the phase value from the front panel.
    pub fn get_phase(&mut self) -> Result<Angle, InstrumentError> {
        Ok(Angle::from_degrees(self.get_float("PHA.")?))
    }

    /// Get a reference to the decoded curve data accumulated so far.
    pub fn data(&self) -> &CurveStore {
        &self.data
    }

    /// Take the accumulated curve data out of the driver, leaving an empty store.
    pub fn take_data(&mut self) -> CurveStore {
        std::mem::take(&mut self.data)
    }

    /// The sensitivity code most recently decoded from the curve buffer.
    pub fn sensitivity_code(&self) -> i16 {
        self.sensitivity_code
    }
}
