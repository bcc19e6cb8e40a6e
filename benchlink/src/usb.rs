//! This module provides the implementation for an instrument controlled via USB bulk
//! endpoints.
//!
//! Some bench instruments expose a plain ASCII command/response protocol directly over a pair
//! of bulk endpoints instead of a virtual COM port. This interface finds the device by vendor
//! and product ID, claims the first interface, and talks to the first bulk-out and bulk-in
//! endpoints it finds in the active configuration.

use std::{collections::VecDeque, time::Duration};

use rusb::{DeviceHandle, Direction, GlobalContext, TransferType};

use crate::{InstrumentError, InstrumentInterface};

/// A blocking USB bulk endpoint implementation using the `rusb` crate.
///
/// Commands are written to the bulk-out endpoint as raw bytes; responses are read from the
/// bulk-in endpoint one packet at a time via
/// [`read_chunk`](InstrumentInterface::read_chunk). The terminator defaults to the empty
/// string, as bulk instruments frame commands by the transfer itself.
pub struct UsbInterface {
    handle: DeviceHandle<GlobalContext>,
    endpoint_out: u8,
    endpoint_in: u8,
    max_packet_size: usize,
    terminator: String,
    timeout: Duration,
    readback: VecDeque<u8>,
}

impl UsbInterface {
    /// Open the USB device with the given vendor and product ID.
    ///
    /// The first bulk-out and bulk-in endpoints of the active configuration are used for
    /// writing and reading respectively. On platforms that support it, the kernel driver is
    /// detached automatically when the interface is claimed.
    ///
    /// # Arguments
    /// * `vendor_id` - USB vendor ID of the instrument.
    /// * `product_id` - USB product ID of the instrument.
    /// * `timeout` - Timeout for bulk transfers in both directions.
    pub fn open(
        vendor_id: u16,
        product_id: u16,
        timeout: Duration,
    ) -> Result<Self, InstrumentError> {
        let mut handle = rusb::open_device_with_vid_pid(vendor_id, product_id).ok_or(
            InstrumentError::DeviceNotFound {
                vendor_id,
                product_id,
            },
        )?;

        let config = handle.device().active_config_descriptor()?;
        let mut endpoint_out = None;
        let mut endpoint_in = None;
        let mut max_packet_size = 64usize;
        for interface in config.interfaces() {
            for descriptor in interface.descriptors() {
                for endpoint in descriptor.endpoint_descriptors() {
                    if endpoint.transfer_type() != TransferType::Bulk {
                        continue;
                    }
                    match endpoint.direction() {
                        Direction::Out => {
                            if endpoint_out.is_none() {
                                endpoint_out = Some(endpoint.address());
                            }
                        }
                        Direction::In => {
                            if endpoint_in.is_none() {
                                endpoint_in = Some(endpoint.address());
                                max_packet_size = endpoint.max_packet_size() as usize;
                            }
                        }
                    }
                }
            }
            if endpoint_out.is_some() && endpoint_in.is_some() {
                break;
            }
        }
        let endpoint_out = endpoint_out.ok_or(rusb::Error::NotFound)?;
        let endpoint_in = endpoint_in.ok_or(rusb::Error::NotFound)?;

        // Not supported on all platforms; claiming still works without it on those.
        let _ = handle.set_auto_detach_kernel_driver(true);
        handle.claim_interface(0)?;

        Ok(UsbInterface {
            handle,
            endpoint_out,
            endpoint_in,
            max_packet_size,
            terminator: String::new(),
            timeout,
            readback: VecDeque::new(),
        })
    }

    /// Get the maximum packet size of the bulk-in endpoint in bytes.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

impl InstrumentInterface for UsbInterface {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            if self.readback.is_empty() {
                let chunk = self.read_chunk()?;
                self.readback.extend(chunk);
            }
            match self.readback.pop_front() {
                Some(val) => *byte = val,
                None => return Err(InstrumentError::Timeout(self.timeout)),
            }
        }
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn read_chunk(&mut self) -> Result<Vec<u8>, InstrumentError> {
        let mut buf = vec![0u8; self.max_packet_size];
        let nof_bytes = self
            .handle
            .read_bulk(self.endpoint_in, &mut buf, self.timeout)
            .map_err(|err| match err {
                rusb::Error::Timeout => InstrumentError::Timeout(self.timeout),
                other => InstrumentError::Usb(other),
            })?;
        buf.truncate(nof_bytes);
        Ok(buf)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.handle.write_bulk(self.endpoint_out, data, self.timeout)?;
        Ok(())
    }
}
