//! Loopback interface for instrument drivers that send data packages in bytes back and forth.
//!
//! Generally, your instrument driver in this case should implement the reading of the bytes
//! and there is no dedicated "end-of-command" terminator.

use std::{collections::VecDeque, time::Duration};

use crate::{InstrumentError, InstrumentInterface, loopback::IncrIndex};

/// An interface that allows you to simply write tests for byte-oriented instrument drivers.
///
/// The main purpose of this interface is to provide a simple loopback interface for testing
/// of instrument drivers. To do so, you can provide a list of byte frames that are expected
/// to go from the host to the instrument, and a list of byte frames that are expected to go
/// from the instrument to the host. The frames are read in order. At the end, when the
/// [`LoopbackInterfaceBytes`] is dropped, a `finalize` function is called that checks if all
/// frames that you have provided have been used. If not, the program panics. During
/// instrument calls, whenever something is sent to the instrument that is not expected, the
/// [`LoopbackInterfaceBytes`] will panic as well. This way, your tests can ensure easily that
/// all frames that you have provided are used in the correct order.
///
/// For frame-oriented drivers, [`read_chunk`](InstrumentInterface::read_chunk) serves one
/// `from_inst` entry per call. When the entries are exhausted, it returns
/// [`InstrumentError::Timeout`], which is what a real interface reports once the device has
/// no more data to send. An empty entry is served as an empty frame.
pub struct LoopbackInterfaceBytes {
    from_host: Vec<Vec<u8>>,
    from_inst: Vec<Vec<u8>>,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    terminator: String,
}

impl LoopbackInterfaceBytes {
    /// Create a new loopback instrument with given frames to and from instrument.
    ///
    /// # Arguments:
    /// * `from_host` - Vector of byte frames expected from host to instrument.
    /// * `from_inst` - Vector of byte frames from instrument to host.
    pub fn new(from_host: Vec<Vec<u8>>, from_inst: Vec<Vec<u8>>) -> Self {
        LoopbackInterfaceBytes {
            from_host,
            from_inst,
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            terminator: String::new(),
        }
    }

    /// This command panics if not all frames in the [`LoopbackInterfaceBytes`] have been
    /// used.
    ///
    /// It is automatically called when the [`LoopbackInterfaceBytes`] is dropped, but you can
    /// also call it manually to ensure that all frames have been used.
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.next());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.next());
        if let Some(fil) = from_host_leftover {
            panic!("Leftover expected commands found from host to instrument: {fil:?}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover expected commands found from instrument to host: {fil:?}");
        }
    }

    /// Get the next frame from host to instrument, or panic.
    fn get_next_from_host(&mut self) -> &Vec<u8> {
        self.from_host
            .get(self.from_host_index.next())
            .expect("No more bytes were expected from host to instrument.")
    }

    /// Get the next frame from instrument to host, or panic.
    fn get_next_from_inst(&mut self) -> &Vec<u8> {
        self.from_inst
            .get(self.from_inst_index.next())
            .expect("No more bytes were expected from instrument to host.")
    }

    /// Function to read exactly one byte from the next frame from the instrument.
    ///
    /// This just panics if there are no more frames. If there are no more frames but one is
    /// required, the panic is justified as this is a test interface.
    fn read_one_byte(&mut self) -> u8 {
        match self.curr_bytes.pop_front() {
            Some(byte) => byte,
            None => {
                let next_cmd = self.get_next_from_inst();
                self.curr_bytes = next_cmd.clone().into();
                self.read_one_byte()
            }
        }
    }
}

impl InstrumentInterface for LoopbackInterfaceBytes {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn read_chunk(&mut self) -> Result<Vec<u8>, InstrumentError> {
        if !self.curr_bytes.is_empty() {
            return Ok(self.curr_bytes.drain(..).collect());
        }
        match self.from_inst.get(self.from_inst_index.peek()) {
            Some(chunk) => {
                let chunk = chunk.clone();
                self.from_inst_index.next();
                Ok(chunk)
            }
            None => Err(InstrumentError::Timeout(Duration::ZERO)),
        }
    }

    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self.get_next_from_host().clone();
        assert_eq!(
            exp,
            cmd,
            "Expected sendcmd '{0:?}', got '{1:?}'",
            exp,
            str::from_utf8(cmd)
        );
        Ok(())
    }
}

impl Drop for LoopbackInterfaceBytes {
    fn drop(&mut self) {
        self.finalize();
    }
}
