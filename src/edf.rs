//! EDF recording reader, delegating format decoding to the `edfplus` crate.
//!
//! `edfplus` owns the header layout and digital-to-physical conversion; the
//! adapter keeps only the normalization policy: pick the fastest per-channel
//! rate as the recording frequency, drop slower (marker) channels, and apply
//! the shared decimation stride to the extracted samples.

use std::path::Path;

use edfplus::{EdfReader, SignalParam, EDFLIB_TIME_DIMENSION};

use crate::decimate::Decimation;
use crate::error::{Result, SleepError};
use crate::types::{ChannelGain, Recording, RecordingHeader};

/// Reads an EDF recording through the delegated `edfplus` decoder.
pub fn read_recording(path: &Path, downsample: Option<f64>) -> Result<Recording> {
    if !path.is_file() {
        return Err(SleepError::FileNotFound(path.display().to_string()));
    }

    let mut reader = EdfReader::open(path)?;

    let (start_date, start_time, record_duration, records) = {
        let header = reader.header();
        (
            header.start_date,
            header.start_time,
            header.datarecord_duration,
            header.datarecords_in_file,
        )
    };
    if record_duration <= 0 || records <= 0 {
        return Err(SleepError::malformed(path, "empty data record table"));
    }
    let record_seconds = record_duration as f64 / EDFLIB_TIME_DIMENSION as f64;

    // Channels may carry heterogeneous rates; anything slower than the
    // fastest one is a marker/auxiliary channel and is dropped.
    let max_samples_per_record = reader
        .header()
        .signals
        .iter()
        .map(|s| s.samples_per_record)
        .max()
        .filter(|&m| m > 0)
        .ok_or_else(|| SleepError::malformed(path, "no data signals"))?;
    let sampling_frequency = max_samples_per_record as f64 / record_seconds;

    let kept: Vec<(usize, String, ChannelGain)> = reader
        .header()
        .signals
        .iter()
        .enumerate()
        .filter(|(_, s)| s.samples_per_record == max_samples_per_record)
        .map(|(index, s)| (index, s.label.clone(), signal_gain(s)))
        .collect();

    let sample_count = max_samples_per_record as usize * records as usize;
    let plan = Decimation::plan(sampling_frequency, downsample)?;

    let mut channels = Vec::with_capacity(kept.len());
    let mut gains = Vec::with_capacity(kept.len());
    let mut data = Vec::with_capacity(kept.len());
    for (index, label, gain) in kept {
        // edfplus already returns calibrated physical values; only the
        // decimation stride is applied here.
        let samples = reader.read_physical_samples(index, sample_count)?;
        data.push(samples.iter().copied().step_by(plan.stride).collect());
        channels.push(label);
        gains.push(gain);
    }

    Ok(Recording {
        header: RecordingHeader {
            sampling_frequency,
            channels,
            sample_count,
            start_date,
            start_time,
            gains,
        },
        output_frequency: plan.output_frequency,
        data,
    })
}

/// Equivalent affine calibration for an EDF signal, recorded in the header
/// for reference even though the delegate applies it during extraction.
fn signal_gain(signal: &SignalParam) -> ChannelGain {
    let scale = (signal.physical_max - signal.physical_min)
        / (signal.digital_max - signal.digital_min) as f64;
    ChannelGain {
        scale,
        offset: signal.digital_max as f64 - signal.physical_max / scale,
    }
}
