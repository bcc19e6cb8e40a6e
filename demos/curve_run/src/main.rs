//! Run repeated curve acquisitions on the lock-in while a consumer thread tracks the sample
//! temperature through the thermodiode and decides when to stop.
//!
//! The run loop and the consumer synchronize per cycle: the loop sets `cycle_start` before
//! triggering, pulses `data_ready` after the drain, and both meet at the cycle barrier
//! before the next acquisition.

use std::sync::{Arc, Mutex};
use std::thread;

use lockin_7270::{CurveConfig, LockIn7270, RunSync, UsbInterfaceLockIn, VoltageWindow};
use srs_sim922::{SerialInterfaceSim922, Sim922};

const SIM922_PORT: &str = "/dev/ttyUSB0";
const SIM922_SLOT: u8 = 4;

/// Diode voltage at which the sample is considered cold and the run stops.
const STOP_MV: f64 = 1050.0;

fn main() {
    env_logger::init();

    let usb_inst = UsbInterfaceLockIn::simple().expect("Failed to open lock-in USB device");
    let mut lockin = LockIn7270::try_new(usb_inst).unwrap();
    lockin.setup().unwrap();

    let serial_inst = SerialInterfaceSim922::simple(SIM922_PORT).expect("Failed to open serial port");
    let mut thermo = Sim922::try_new_in_mainframe(serial_inst, SIM922_SLOT, "xxyyzz").unwrap();
    let mut diode = thermo.get_channel(0).unwrap();

    let initial_mv = diode.get_voltage().unwrap().as_millivolts();
    let window = Arc::new(Mutex::new(VoltageWindow {
        current_mv: initial_mv,
        stop_mv: STOP_MV,
    }));

    // Run loop and consumer meet at the barrier once per cycle.
    let sync = RunSync::new(2);

    let consumer = {
        let window = Arc::clone(&window);
        let cycle_start = Arc::clone(&sync.cycle_start);
        let data_ready = Arc::clone(&sync.data_ready);
        let consumer_done = Arc::clone(&sync.consumer_done);
        let barrier = Arc::clone(&sync.cycle_barrier);
        thread::spawn(move || {
            loop {
                cycle_start.wait();
                cycle_start.clear();
                data_ready.wait_pulse();

                // New diode reading decides whether the run loop keeps going.
                let reading = diode.get_voltage().unwrap().as_millivolts();
                let stop = {
                    let mut win = window.lock().unwrap();
                    win.current_mv = reading;
                    reading <= win.stop_mv
                };
                log::info!("cycle done, diode at {reading:.1} mV");
                barrier.wait();
                if stop {
                    break;
                }
            }
            consumer_done.set();
        })
    };

    let config = CurveConfig {
        sample_interval_us: 100,
        buffer_length: 10_000,
        ..CurveConfig::default()
    };
    lockin.run(&window, &sync, &config).expect("run loop failed");

    consumer.join().unwrap();
    thermo.disconnect_mainframe().unwrap();

    let data = lockin.take_data();
    println!(
        "Acquired {} samples per channel over the run.",
        data.x.len()
    );
}
