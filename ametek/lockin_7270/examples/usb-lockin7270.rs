use std::thread;

use lockin_7270::{CurveConfig, LockIn7270, UsbInterfaceLockIn};

fn main() {
    // Get our USB instrument interface
    let usb_inst = UsbInterfaceLockIn::simple().expect("Failed to open USB device");

    // Now we can open the LockIn7270 with the USB interface and apply the default setup.
    let mut inst = LockIn7270::try_new(usb_inst).unwrap();
    inst.setup().unwrap();

    // Single front-panel measurement
    let mag = inst.get_magnitude().unwrap();
    println!("Magnitude: {} V", mag.as_volts());

    // Buffered curve measurement: 10,000 samples at 100 us intervals
    let config = CurveConfig {
        sample_interval_us: 100,
        buffer_length: 10_000,
        ..CurveConfig::default()
    };
    inst.curve_setup(&config).unwrap();
    inst.start_acquisition();
    thread::sleep(config.acquisition_time());
    inst.read_all_curves().unwrap();

    let data = inst.take_data();
    println!("Acquired {} X samples", data.x.len());
}
