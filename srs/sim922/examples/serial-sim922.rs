use srs_sim922::{SerialInterfaceSim922, Sim922};

fn main() {
    let port = "/dev/ttyUSB0";

    // Get our serial instrument interface
    let serial_inst = SerialInterfaceSim922::simple(port).expect("Failed to open serial port");

    // The module sits in slot 4 of a SIM900 mainframe.
    let mut inst = Sim922::try_new_in_mainframe(serial_inst, 4, "xxyyzz").unwrap();

    // Query and print temperature and diode voltage of the first channel
    let mut ch = inst.get_channel(0).unwrap();
    println!("Temperature: {:?}", ch.get_temperature());
    println!("Diode voltage: {:?}", ch.get_voltage());

    // Hand the serial line back to the mainframe
    inst.disconnect_mainframe().unwrap();
}
