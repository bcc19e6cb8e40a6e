//! Curve buffer acquisition for the 7270.
//!
//! The instrument records samples into an internal buffer (`TD` trigger), which the host
//! then drains channel by channel with `DCB`. Samples come back as big-endian signed 16 bit
//! values with a fixed 3-byte trailer per transfer.

use std::time::Duration;

use benchlink::{InstrumentError, InstrumentInterface};

use crate::sensitivity::full_scale_volts;
use crate::LockIn7270;

/// Maximum number of samples the curve buffer holds per channel.
pub const MAX_BUFFER_LENGTH: u32 = 100_000;

/// The curve buffer channels this driver records.
///
/// The discriminants are the channel ids the `DCB` command takes; the corresponding bits
/// form the `CBD` channel mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveChannel {
    /// In-phase output.
    X = 0,
    /// Quadrature output.
    Y = 1,
    /// Signal phase.
    Phase = 3,
    /// Sensitivity setting, recorded so amplitude channels can be scaled.
    Sensitivity = 4,
    /// Noise output.
    Noise = 5,
}

impl CurveChannel {
    /// All channels, in the order they are drained.
    pub const ALL: [CurveChannel; 5] = [
        CurveChannel::X,
        CurveChannel::Y,
        CurveChannel::Phase,
        CurveChannel::Sensitivity,
        CurveChannel::Noise,
    ];

    /// The channel id as used by the `DCB` command.
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// The channel's bit in the `CBD` channel mask.
    pub fn bit(&self) -> u32 {
        1 << self.id()
    }

    /// The `CBD` mask covering all channels in [`ALL`](Self::ALL).
    pub fn mask() -> u32 {
        Self::ALL.iter().map(|ch| ch.bit()).sum()
    }
}

/// Curve buffer acquisition mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurveMode {
    /// Fast mode (`CMODE 0`), sample intervals down to 1 µs.
    #[default]
    Fast,
    /// Standard mode (`CMODE 1`), sample intervals down to 1000 µs.
    Standard,
}

impl CurveMode {
    fn cmode(&self) -> u8 {
        match self {
            CurveMode::Fast => 0,
            CurveMode::Standard => 1,
        }
    }

    fn min_interval_us(&self) -> u32 {
        match self {
            CurveMode::Fast => 1,
            CurveMode::Standard => 1000,
        }
    }
}

/// Settings for a curve buffer acquisition.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveConfig {
    /// Acquisition mode, sets the lower bound on the sample interval.
    pub mode: CurveMode,
    /// Time between samples in microseconds.
    pub sample_interval_us: u32,
    /// Number of samples to record per channel, at most [`MAX_BUFFER_LENGTH`].
    pub buffer_length: u32,
    /// Extra wait after the nominal acquisition time before draining the buffer.
    pub settle_margin: Duration,
}

impl Default for CurveConfig {
    fn default() -> Self {
        CurveConfig {
            mode: CurveMode::Fast,
            sample_interval_us: 10_000,
            buffer_length: MAX_BUFFER_LENGTH,
            settle_margin: Duration::from_secs(1),
        }
    }
}

impl CurveConfig {
    /// Check the settings against the instrument limits.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        let min_interval = self.mode.min_interval_us();
        if self.sample_interval_us < min_interval {
            return Err(InstrumentError::IntValueOutOfRange {
                value: self.sample_interval_us as i64,
                min: min_interval as i64,
                max: i64::MAX,
            });
        }
        if self.buffer_length == 0 || self.buffer_length > MAX_BUFFER_LENGTH {
            return Err(InstrumentError::IntValueOutOfRange {
                value: self.buffer_length as i64,
                min: 1,
                max: MAX_BUFFER_LENGTH as i64,
            });
        }
        Ok(())
    }

    /// How long a triggered acquisition takes, including the settle margin.
    pub fn acquisition_time(&self) -> Duration {
        let sampling =
            Duration::from_micros(self.buffer_length as u64 * self.sample_interval_us as u64);
        sampling + self.settle_margin
    }
}

/// Decoded curve samples, one vector per channel.
///
/// X, Y, and Noise are in volts; Phase is in the instrument's raw units of tenths of a
/// degree; Sensitivity holds the raw codes. Vectors grow across acquisitions until the
/// store is taken with [`LockIn7270::take_data`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveStore {
    /// In-phase samples in volts.
    pub x: Vec<f64>,
    /// Quadrature samples in volts.
    pub y: Vec<f64>,
    /// Phase samples in tenths of a degree.
    pub phase: Vec<f64>,
    /// Sensitivity codes.
    pub sensitivity: Vec<i16>,
    /// Noise samples in volts.
    pub noise: Vec<f64>,
}

/// Decode a raw curve transfer into signed 16 bit samples.
///
/// The last 3 bytes of a transfer are a status trailer and are dropped; the remainder is
/// interpreted as consecutive big-endian `i16` values. A transfer shorter than the trailer
/// decodes to no samples.
pub fn decode_curve(raw: &[u8]) -> Vec<i16> {
    let payload_len = raw.len().saturating_sub(3);
    raw[..payload_len]
        .chunks_exact(2)
        .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

impl<T: InstrumentInterface> LockIn7270<T> {
    /// Configure the curve buffer for a new acquisition.
    ///
    /// Validates the settings locally, then clears the device buffer and writes the curve
    /// settings. The configuration commands go out best-effort since the instrument does not
    /// reliably answer them; they are reissued before every acquisition anyway.
    pub fn curve_setup(&mut self, config: &CurveConfig) -> Result<(), InstrumentError> {
        config.validate()?;
        self.query_lenient("AS");
        self.query_lenient("NC");
        self.query_lenient(&format!("CMODE {}", config.mode.cmode()));
        self.query_lenient(&format!("CBD {}", CurveChannel::mask()));
        self.query_lenient(&format!("LEN {}", config.buffer_length));
        self.query_lenient(&format!("STR {}", config.sample_interval_us));
        self.query_lenient("REFP 0");
        Ok(())
    }

    /// Trigger the acquisition (`TD`).
    ///
    /// Sampling starts immediately; wait [`CurveConfig::acquisition_time`] before draining.
    pub fn start_acquisition(&mut self) {
        self.query_lenient("TD");
    }

    /// Drain one channel's raw bytes from the device buffer.
    ///
    /// An empty frame or a timeout marks the end of the data; any other transport fault
    /// propagates. A timeout on the very first read yields an empty transfer.
    fn dump_curve(&mut self, channel: CurveChannel) -> Result<Vec<u8>, InstrumentError> {
        let mut raw = Vec::new();
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(&format!("DCB {}", channel.id()))?;
        loop {
            match intf.read_chunk() {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) => raw.extend_from_slice(&chunk),
                Err(InstrumentError::Timeout(_)) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(raw)
    }

    /// Read one channel from the device buffer into the data store.
    pub fn read_curve(&mut self, channel: CurveChannel) -> Result<(), InstrumentError> {
        let raw = self.dump_curve(channel)?;
        let samples = decode_curve(&raw);
        match channel {
            CurveChannel::Sensitivity => {
                if let Some(&last) = samples.last() {
                    self.sensitivity_code = last;
                }
                self.data.sensitivity.extend_from_slice(&samples);
            }
            CurveChannel::Phase => {
                self.data.phase.extend(samples.iter().map(|&s| s as f64));
            }
            _ => {
                let scale = full_scale_volts(self.sensitivity_code).ok_or_else(|| {
                    InstrumentError::ResponseParseError(format!(
                        "invalid sensitivity code {}",
                        self.sensitivity_code
                    ))
                })?;
                let scaled = samples.iter().map(|&s| s as f64 * scale);
                match channel {
                    CurveChannel::X => self.data.x.extend(scaled),
                    CurveChannel::Y => self.data.y.extend(scaled),
                    CurveChannel::Noise => self.data.noise.extend(scaled),
                    _ => unreachable!(),
                }
            }
        }
        Ok(())
    }

    /// Read every channel from the device buffer into the data store.
    ///
    /// Discards the notification frame the instrument emits after an acquisition, if one is
    /// pending, then drains the channels in [`CurveChannel::ALL`] order.
    pub fn read_all_curves(&mut self) -> Result<(), InstrumentError> {
        {
            let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
            match intf.read_chunk() {
                Ok(_) | Err(InstrumentError::Timeout(_)) => {}
                Err(err) => return Err(err),
            }
        }
        for channel in CurveChannel::ALL {
            self.read_curve(channel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_mask_is_59() {
        assert_eq!(CurveChannel::mask(), 59);
    }

    #[test]
    fn channel_ids() {
        let ids: Vec<u8> = CurveChannel::ALL.iter().map(|ch| ch.id()).collect();
        assert_eq!(ids, vec![0, 1, 3, 4, 5]);
    }

    #[test]
    fn decode_drops_trailer() {
        // two samples plus the 3-byte trailer
        let raw = [0x00, 0x0a, 0xff, 0xf6, 0x00, 0x00, 0x00];
        assert_eq!(decode_curve(&raw), vec![10, -10]);
    }

    #[test]
    fn decode_short_transfer() {
        assert_eq!(decode_curve(&[]), Vec::<i16>::new());
        assert_eq!(decode_curve(&[0x00, 0x00, 0x00]), Vec::<i16>::new());
    }

    #[test]
    fn acquisition_time_includes_margin() {
        let config = CurveConfig {
            sample_interval_us: 100,
            buffer_length: 10_000,
            settle_margin: Duration::from_secs(1),
            ..CurveConfig::default()
        };
        assert_eq!(config.acquisition_time(), Duration::from_secs(2));
    }

    #[test]
    fn validate_rejects_fast_interval_in_standard_mode() {
        let config = CurveConfig {
            mode: CurveMode::Standard,
            sample_interval_us: 10,
            ..CurveConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(InstrumentError::IntValueOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_rejects_oversized_buffer() {
        let config = CurveConfig {
            buffer_length: MAX_BUFFER_LENGTH + 1,
            ..CurveConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(InstrumentError::IntValueOutOfRange { .. })
        ));
    }
}
