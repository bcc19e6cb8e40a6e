//! Test cases for the LoopbackInterfaceBytes.

use rstest::*;

use benchlink::{InstrumentError, InstrumentInterface, LoopbackInterfaceBytes};

/// A function that creates a new `LoopbackInterfaceBytes` with the given input and output
/// vectors.
fn crt_lbk(input: Vec<Vec<u8>>, output: Vec<Vec<u8>>) -> LoopbackInterfaceBytes {
    LoopbackInterfaceBytes::new(input, output)
}

/// Create a loopback interface that contains no commands.
#[fixture]
fn emp_lbk() -> LoopbackInterfaceBytes {
    crt_lbk(vec![], vec![])
}

/// Ensure `finalize` method passes if an empty loopback interface is used.
///
/// This routine calls the finalize method manually, however, it is not necessary to do so as
/// it is implemented in the `Drop` trait for `LoopbackInterfaceBytes`.
#[rstest]
fn finalize_test(mut emp_lbk: LoopbackInterfaceBytes) {
    emp_lbk.finalize();
}

/// Ensure `finalize` method panics if frames are left in the loopback interface.
#[rstest]
#[case(vec![vec![0x01]], vec![])]
#[case(vec![], vec![vec![0x02]])]
#[case(vec![vec![0x01]], vec![vec![0x02]])]
#[should_panic]
fn finalize_test_panic(#[case] from_host: Vec<Vec<u8>>, #[case] from_inst: Vec<Vec<u8>>) {
    let _ = crt_lbk(from_host, from_inst);
}

#[rstest]
fn write_raw() {
    let mut lbk = crt_lbk(vec![vec![0x01], vec![0x02]], vec![]);
    lbk.write_raw(&[0x01]).unwrap();
    lbk.write_raw(&[0x02]).unwrap();
}

#[rstest]
#[should_panic]
fn write_raw_mismatch() {
    let mut lbk = crt_lbk(vec![vec![0x01]], vec![]);
    assert!(lbk.write_raw(&[0x03]).is_err());
}

/// The default terminator for byte frames is empty, so `sendcmd` writes the bare command.
#[rstest]
fn sendcmd_no_terminator() {
    let mut lbk = crt_lbk(vec![b"CMD".to_vec()], vec![]);
    lbk.sendcmd("CMD").unwrap();
}

#[rstest]
fn query_bytes() {
    let mut lbk = crt_lbk(vec![vec![0x01], vec![0x02]], vec![vec![0x11], vec![0x22]]);
    lbk.write_raw(&[0x01]).unwrap();
    let mut resp1 = [0u8; 1];
    lbk.read_exact(&mut resp1).unwrap();
    assert_eq!(resp1, [0x11]);

    lbk.write_raw(&[0x02]).unwrap();
    let mut resp2 = [0u8; 1];
    lbk.read_exact(&mut resp2).unwrap();
    assert_eq!(resp2, [0x22]);
}

/// Each scripted response entry is served as one frame.
#[rstest]
fn read_chunk_serves_frames_in_order() {
    let mut lbk = crt_lbk(vec![], vec![vec![0x01, 0x02], vec![], vec![0x03]]);
    assert_eq!(lbk.read_chunk().unwrap(), vec![0x01, 0x02]);
    assert_eq!(lbk.read_chunk().unwrap(), Vec::<u8>::new());
    assert_eq!(lbk.read_chunk().unwrap(), vec![0x03]);
}

/// Once the scripted frames are exhausted, further chunk reads time out like a drained
/// device buffer would.
#[rstest]
fn read_chunk_times_out_when_exhausted(mut emp_lbk: LoopbackInterfaceBytes) {
    assert!(matches!(
        emp_lbk.read_chunk(),
        Err(InstrumentError::Timeout(_))
    ));
    // and it keeps timing out instead of panicking
    assert!(matches!(
        emp_lbk.read_chunk(),
        Err(InstrumentError::Timeout(_))
    ));
}
