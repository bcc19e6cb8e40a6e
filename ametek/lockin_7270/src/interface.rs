//! Provide a USB interface for the 7270.

use std::time::Duration;

use benchlink::{InstrumentError, UsbInterface};

/// A UsbInterface for the AMETEK 7270.
///
/// Builds a `benchlink` UsbInterface with the 7270's vendor and product ids.
#[derive(Debug)]
pub struct UsbInterfaceLockIn {}

impl UsbInterfaceLockIn {
    /// USB vendor id of the 7270.
    pub const VENDOR_ID: u16 = 0x0A2D;
    /// USB product id of the 7270.
    pub const PRODUCT_ID: u16 = 0x001B;

    /// Try to open the 7270 over USB.
    ///
    /// This is analog to the `open` method of the `UsbInterface` struct in `benchlink`,
    /// however, it fills in the 7270's vendor and product ids. The timeout is set to
    /// 500 ms, short enough that draining the curve buffer detects end-of-data quickly.
    pub fn simple() -> Result<UsbInterface, InstrumentError> {
        UsbInterface::open(
            Self::VENDOR_ID,
            Self::PRODUCT_ID,
            Duration::from_millis(500),
        )
    }
}
