//! Full-scale sensitivity table of the 7270.
//!
//! The instrument reports its sensitivity setting as an integer code. Curve buffer samples
//! are signed 16 bit fractions of the full-scale voltage that code stands for, so the code
//! is needed to scale raw samples to volts.

/// Sensitivity code for the largest full-scale range (1 V).
pub(crate) const TOP_CODE: i16 = 27;

/// Full-scale voltage for each sensitivity code, indexed by `code - 1`.
const FULL_SCALE: [f64; 27] = [
    2e-9, 5e-9, 1e-8, 2e-8, 5e-8, 1e-7, 2e-7, 5e-7, 1e-6, 2e-6, 5e-6, 1e-5, 2e-5, 5e-5, 1e-4,
    2e-4, 5e-4, 1e-3, 2e-3, 5e-3, 1e-2, 2e-2, 5e-2, 1e-1, 2e-1, 5e-1, 1.0,
];

/// Look up the full-scale voltage for a sensitivity code.
///
/// Valid codes run from 1 (2 nV) to 27 (1 V); any other code returns `None`.
///
/// # Example
///
/// ```
/// use lockin_7270::full_scale_volts;
///
/// assert_eq!(full_scale_volts(18), Some(1e-3));
/// assert_eq!(full_scale_volts(0), None);
/// ```
pub fn full_scale_volts(code: i16) -> Option<f64> {
    if (1..=27).contains(&code) {
        Some(FULL_SCALE[(code - 1) as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_endpoints() {
        assert_eq!(full_scale_volts(1), Some(2e-9));
        assert_eq!(full_scale_volts(TOP_CODE), Some(1.0));
    }

    #[test]
    fn full_scale_strictly_increasing() {
        for code in 1..TOP_CODE {
            assert!(full_scale_volts(code).unwrap() < full_scale_volts(code + 1).unwrap());
        }
    }

    #[test]
    fn full_scale_out_of_range() {
        assert_eq!(full_scale_volts(0), None);
        assert_eq!(full_scale_volts(28), None);
        assert_eq!(full_scale_volts(-3), None);
    }
}
