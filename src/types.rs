use chrono::{NaiveDate, NaiveTime};

/// Per-channel calibration mapping raw integer sample codes to physical units.
///
/// Every supported recording format stores samples as integers together with
/// some encoding of the channel's measurement range. All of them reduce to an
/// affine transform `physical = (raw - offset) * scale`; the constructors
/// below capture the three range encodings found on disk.
///
/// # Examples
///
/// ```rust
/// use sleepio::ChannelGain;
///
/// // Micromed-style calibration: 12-bit logical range over +/-500 uV
/// let gain = ChannelGain::from_logical_range(-2048, 2047, 0, -500.0, 500.0);
/// assert!((gain.scale - 1000.0 / 4096.0).abs() < 1e-12);
/// assert_eq!(gain.to_physical(0.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelGain {
    pub scale: f64,
    pub offset: f64,
}

impl ChannelGain {
    /// ELAN encoding: analog and digital (numeric) min/max pairs.
    pub fn from_analog_range(
        analog_min: f64,
        analog_max: f64,
        digital_min: f64,
        digital_max: f64,
    ) -> Self {
        ChannelGain {
            scale: (analog_max - analog_min) / (digital_max - digital_min),
            offset: 0.0,
        }
    }

    /// Micromed encoding: signed logical range plus a logical ground level.
    ///
    /// The `+ 1` in the divisor matches the on-disk convention: the logical
    /// range is the count of representable codes, not the end-point spread.
    pub fn from_logical_range(
        logical_min: i32,
        logical_max: i32,
        logical_ground: i32,
        physical_min: f64,
        physical_max: f64,
    ) -> Self {
        ChannelGain {
            scale: (physical_max - physical_min) / (logical_max - logical_min + 1) as f64,
            offset: logical_ground as f64,
        }
    }

    /// BrainVision encoding: a single resolution factor per channel.
    pub fn from_resolution(resolution: f64) -> Self {
        ChannelGain {
            scale: resolution,
            offset: 0.0,
        }
    }

    /// Converts one raw sample code to physical units.
    #[inline]
    pub fn to_physical(&self, raw: f64) -> f64 {
        (raw - self.offset) * self.scale
    }
}

/// Metadata shared by every recording format once parsed.
///
/// Built once per parse and read-only afterwards. `sample_count` is the
/// number of samples per channel in the *original* file, before any
/// decimation is applied to the returned data buffer.
#[derive(Debug, Clone)]
pub struct RecordingHeader {
    /// Source sampling frequency in Hz.
    pub sampling_frequency: f64,
    /// Data channel names, in physical channel order.
    pub channels: Vec<String>,
    /// Samples per channel in the original recording.
    pub sample_count: usize,
    /// Recording start date; 1900-01-01 when the file carries no date.
    pub start_date: NaiveDate,
    /// Recording wall-clock start time; midnight when absent.
    pub start_time: NaiveTime,
    /// Raw-to-physical calibration, one entry per channel.
    pub gains: Vec<ChannelGain>,
}

/// A normalized recording: header plus the physical-unit sample buffer.
///
/// The buffer is indexed `[channel][sample]`. Row count equals the channel
/// list length; column count equals `ceil(sample_count / stride)` for the
/// decimation stride that produced `output_frequency`.
#[derive(Debug)]
pub struct Recording {
    pub header: RecordingHeader,
    /// Effective sampling frequency of `data` after decimation.
    pub output_frequency: f64,
    /// Samples in physical units, one row per channel.
    pub data: Vec<Vec<f64>>,
}

impl Recording {
    /// Number of data channels.
    pub fn channel_count(&self) -> usize {
        self.header.channels.len()
    }

    /// Samples per channel in the returned (possibly decimated) buffer.
    pub fn samples_per_channel(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }
}

/// Fallback start date for formats that carry no clock ("No time" headers).
pub(crate) fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Fallback start time for formats that carry no clock.
pub(crate) fn default_start_time() -> NaiveTime {
    NaiveTime::MIN
}
