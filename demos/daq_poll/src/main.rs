//! Poll the lock-in magnitude and the thermodiode readings once per second and append each
//! row to a whitespace-delimited text file as it is acquired.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::thread;
use std::time::{Duration, Instant};

use lockin_7270::{LockIn7270, UsbInterfaceLockIn};
use srs_sim922::{SerialInterfaceSim922, Sim922};

const SIM922_PORT: &str = "/dev/ttyUSB0";
const SIM922_SLOT: u8 = 4;

const SAMPLE_PERIOD: Duration = Duration::from_secs(1);
const DURATION: Duration = Duration::from_secs(60);
const FILENAME: &str = "measurements.txt";

fn main() {
    env_logger::init();

    let usb_inst = UsbInterfaceLockIn::simple().expect("Failed to open lock-in USB device");
    let mut lockin = LockIn7270::try_new(usb_inst).unwrap();
    lockin.setup().unwrap();

    let serial_inst = SerialInterfaceSim922::simple(SIM922_PORT).expect("Failed to open serial port");
    let mut thermo = Sim922::try_new_in_mainframe(serial_inst, SIM922_SLOT, "xxyyzz").unwrap();
    let mut diode = thermo.get_channel(0).unwrap();

    let mut file = BufWriter::new(File::create(FILENAME).expect("Failed to create data file"));
    writeln!(file, "# time (s)  mag (V)  T (K)  T_volt (mV)").unwrap();

    // The delay between samples comes from `thread::sleep`, so the sampling period is not
    // controlled precisely; the elapsed time column holds the actual measurement times.
    let start = Instant::now();
    while start.elapsed() < DURATION {
        let elapsed = start.elapsed().as_secs_f64();
        let mag = lockin.get_magnitude();
        let temp = diode.get_temperature();
        let volt = diode.get_voltage();
        match (mag, temp, volt) {
            (Ok(mag), Ok(temp), Ok(volt)) => {
                writeln!(
                    file,
                    "{:.3}  {:.6e}  {:.3}  {:.3}",
                    elapsed,
                    mag.as_volts(),
                    temp.as_kelvin(),
                    volt.as_millivolts()
                )
                .unwrap();
                file.flush().unwrap();
            }
            (mag, temp, volt) => {
                log::warn!("skipping sample at {elapsed:.3} s: {mag:?} {temp:?} {volt:?}");
            }
        }
        thread::sleep(SAMPLE_PERIOD);
    }

    thermo.disconnect_mainframe().unwrap();
    println!("Wrote measurements to {FILENAME}");
}
