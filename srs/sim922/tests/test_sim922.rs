//! Tests for the SRS Sim922 driver.

use rstest::*;

use benchlink::{InstrumentError, LoopbackInterfaceString};

use srs_sim922::*;

// Type alias for the loopback interface with the Sim922 driver.
type Sim922Lbk = Sim922<LoopbackInterfaceString>;

/// Function that creates a new Sim922 instance with the given input and output commands.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> Sim922Lbk {
    let interface = crt_lbk(host2inst, inst2host);
    Sim922::try_new(interface).unwrap()
}

fn crt_lbk(host2inst: Vec<&str>, inst2host: Vec<&str>) -> LoopbackInterfaceString {
    let term = "\r\n";
    let h2i: Vec<String> = host2inst.iter().map(|s| s.to_string()).collect();
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    LoopbackInterfaceString::new(h2i, i2h, term)
}

#[fixture]
fn emp_inst() -> Sim922Lbk {
    crt_inst(vec![], vec![])
}

/// Empty initialization should always pass.
#[rstest]
fn test_initialization(_emp_inst: Sim922Lbk) {}

/// Connecting through a mainframe sends the pass-through preamble.
#[rstest]
fn test_mainframe_preamble() {
    let interface = crt_lbk(vec!["conn 4, \"xxyyzz\""], vec![]);
    let _ = Sim922::try_new_in_mainframe(interface, 4, "xxyyzz").unwrap();
}

/// Disconnecting sends the escape string back to the mainframe.
#[rstest]
fn test_disconnect_mainframe() {
    let interface = crt_lbk(vec!["conn 2, \"xyzzy\"", "xyzzy"], vec![]);
    let mut inst = Sim922::try_new_in_mainframe(interface, 2, "xyzzy").unwrap();
    inst.disconnect_mainframe().unwrap();
}

/// Disconnecting a direct connection sends nothing.
#[rstest]
fn test_disconnect_direct(mut emp_inst: Sim922Lbk) {
    emp_inst.disconnect_mainframe().unwrap();
}

/// Get the name from the instrument.
#[rstest]
fn test_get_name() {
    let mut inst = crt_inst(
        vec!["*IDN?"],
        vec!["Stanford_Research_Systems,SIM922,s/n105794,ver3.6"],
    );
    let name = inst.get_name().unwrap();
    assert_eq!(name, "Stanford_Research_Systems,SIM922,s/n105794,ver3.6");
}

/// Get temperature for the four channels.
#[rstest]
#[case(0, 1)]
#[case(1, 2)]
#[case(2, 3)]
#[case(3, 4)]
fn test_channel_get_temperature(#[case] ch_num: usize, #[case] ch_id: usize) {
    let mut inst = crt_inst(vec![&format!("tval? {}", ch_id)], vec!["77.35"]);
    let mut ch = inst.get_channel(ch_num).unwrap();
    let temp = ch.get_temperature().unwrap();
    assert_eq!(temp.as_kelvin(), 77.35);
}

/// Get the diode voltage, reported in millivolts.
#[rstest]
fn test_channel_get_voltage() {
    let mut inst = crt_inst(vec!["volt? 1"], vec!["512.3"]);
    let mut ch = inst.get_channel(0).unwrap();
    let volt = ch.get_voltage().unwrap();
    assert_eq!(volt.as_millivolts(), 512.3);
}

/// A non-numeric response is a parse error.
#[rstest]
fn test_channel_get_temperature_parse_error() {
    let mut inst = crt_inst(vec!["tval? 1"], vec!["not-a-number"]);
    let mut ch = inst.get_channel(0).unwrap();
    assert!(matches!(
        ch.get_temperature(),
        Err(InstrumentError::ResponseParseError(_))
    ));
}

/// A channel index past the four diode inputs is rejected.
#[rstest]
fn test_get_channel_out_of_range(mut emp_inst: Sim922Lbk) {
    assert!(matches!(
        emp_inst.get_channel(4),
        Err(InstrumentError::ChannelIndexOutOfRange {
            idx: 4,
            nof_channels: 4
        })
    ));
}

#[rstest]
fn test_send_list() {
    let mut inst = crt_inst(vec!["curv 1, 1", "curv 2, 1"], vec![]);
    inst.send_list(&["curv 1, 1", "curv 2, 1"]).unwrap();
}

/// Ensure cloning an instrument and a channel works correctly.
#[rstest]
fn test_cloning(mut emp_inst: Sim922Lbk) {
    let _ = emp_inst.clone();
    let ch = emp_inst.get_channel(2).unwrap();
    let _ = ch.clone();
}
