//! ELAN recording reader (`.eeg` raw data + `.ent` text sidecar).
//!
//! The `.ent` sidecar is line-oriented: a format version tag, the recording
//! clock, the sampling period, the channel list and four blocks of
//! per-channel analog/digital ranges at fixed line offsets. The `.eeg` file
//! is a bare column-major integer matrix with no header of its own.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder};
use chrono::{NaiveDate, NaiveTime};
use memmap2::Mmap;

use crate::decimate::Decimation;
use crate::error::{Result, SleepError};
use crate::types::{default_start_date, default_start_time, ChannelGain, Recording, RecordingHeader};
use crate::utils::read_text_lines;

/// Line index of the recording date (`day:month:year`).
const LINE_DATE: usize = 3;
/// Line index of the recording time (`hour:minute:second`), or `"No time"`.
const LINE_TIME: usize = 4;
/// Line index of the sampling period in seconds.
const LINE_PERIOD: usize = 8;
/// Line index of the declared channel count.
const LINE_CHANNEL_COUNT: usize = 9;
/// First channel-name line.
const LINE_FIRST_CHANNEL: usize = 10;

/// The trailing marker/trigger channels carry no signal data.
const NON_DATA_CHANNELS: usize = 2;

/// Reads an ELAN recording, converting the decimated sample subset to
/// physical units.
pub fn read_recording(path: &Path, downsample: Option<f64>) -> Result<Recording> {
    let sidecar = ent_sidecar(path);
    if !path.is_file() {
        return Err(SleepError::FileNotFound(path.display().to_string()));
    }
    if !sidecar.is_file() {
        return Err(SleepError::FileNotFound(sidecar.display().to_string()));
    }

    let lines = read_text_lines(&sidecar)?;
    let line = |index: usize| {
        lines
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| SleepError::malformed(&sidecar, format!("missing line {index}")))
    };

    // Line 0 selects the binary word size of the .eeg file.
    let word_size = match line(0)?.trim() {
        "V2" => 2usize,
        "V3" => 4usize,
        other => {
            return Err(SleepError::UnsupportedVersion {
                format: "ELAN",
                version: other.to_string(),
            })
        }
    };

    let period: f64 = line(LINE_PERIOD)?
        .trim()
        .parse()
        .map_err(|_| SleepError::malformed(&sidecar, "sampling period"))?;
    if period <= 0.0 {
        return Err(SleepError::malformed(&sidecar, "non-positive sampling period"));
    }
    let sampling_frequency = 1.0 / period;

    let (start_date, start_time) = parse_clock(&sidecar, line(LINE_DATE)?, line(LINE_TIME)?)?;

    let channel_count: usize = line(LINE_CHANNEL_COUNT)?
        .trim()
        .parse()
        .map_err(|_| SleepError::malformed(&sidecar, "channel count"))?;
    if channel_count <= NON_DATA_CHANNELS {
        return Err(SleepError::malformed(
            &sidecar,
            format!("channel count {channel_count} leaves no data channels"),
        ));
    }
    let data_channels = channel_count - NON_DATA_CHANNELS;

    let mut channels = Vec::with_capacity(data_channels);
    for i in 0..data_channels {
        channels.push(line(LINE_FIRST_CHANNEL + i)?.trim().to_string());
    }

    let gains = parse_gains(&sidecar, &lines, channel_count, data_channels)?;
    let plan = Decimation::plan(sampling_frequency, downsample)?;

    // The raw matrix is column-major [channel_count, N]; sample s of channel
    // c sits at word index s * channel_count + c.
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let sample_count = mmap.len() / (word_size * channel_count);

    let kept = plan.output_len(sample_count);
    let mut data = Vec::with_capacity(data_channels);
    for (c, gain) in gains.iter().enumerate() {
        let mut row = Vec::with_capacity(kept);
        for s in (0..sample_count).step_by(plan.stride) {
            let at = (s * channel_count + c) * word_size;
            let raw = if word_size == 2 {
                BigEndian::read_i16(&mmap[at..at + 2]) as f64
            } else {
                BigEndian::read_i32(&mmap[at..at + 4]) as f64
            };
            row.push(gain.to_physical(raw));
        }
        data.push(row);
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

/// ELAN sidecars append `.ent` to the full data-file name (`x.eeg.ent`).
pub(crate) fn ent_sidecar(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".ent");
    PathBuf::from(name)
}

fn parse_clock(sidecar: &Path, date_line: &str, time_line: &str) -> Result<(NaiveDate, NaiveTime)> {
    if time_line.trim() == "No time" {
        return Ok((default_start_date(), default_start_time()));
    }

    let date_parts: Vec<&str> = date_line.trim().split(':').collect();
    let time_parts: Vec<&str> = time_line.trim().split(':').collect();
    if date_parts.len() != 3 || time_parts.len() != 3 {
        return Err(SleepError::malformed(sidecar, "recording date/time"));
    }

    let field = |s: &str| -> Result<u32> {
        s.trim()
            .parse()
            .map_err(|_| SleepError::malformed(sidecar, "recording date/time"))
    };

    let (day, month, year) = (field(date_parts[0])?, field(date_parts[1])?, field(date_parts[2])?);
    let date = NaiveDate::from_ymd_opt(year as i32 + 1900, month, day)
        .ok_or_else(|| SleepError::malformed(sidecar, "recording date"))?;

    let time = NaiveTime::from_hms_opt(
        field(time_parts[0])?,
        field(time_parts[1])?,
        field(time_parts[2])?,
    )
    .ok_or_else(|| SleepError::malformed(sidecar, "recording time"))?;

    Ok((date, time))
}

/// The four range blocks each span `channel_count` lines: analog min, analog
/// max, digital min, digital max, starting one line past their block offset.
fn parse_gains(
    sidecar: &Path,
    lines: &[String],
    channel_count: usize,
    data_channels: usize,
) -> Result<Vec<ChannelGain>> {
    let analog_min_block = LINE_CHANNEL_COUNT + 3 * channel_count;
    let analog_max_block = LINE_CHANNEL_COUNT + 4 * channel_count;
    let digital_min_block = LINE_CHANNEL_COUNT + 5 * channel_count;
    let digital_max_block = LINE_CHANNEL_COUNT + 6 * channel_count;

    let value = |index: usize| -> Result<f64> {
        lines
            .get(index)
            .and_then(|l| l.trim().parse().ok())
            .ok_or_else(|| SleepError::malformed(sidecar, format!("gain field at line {index}")))
    };

    let mut gains = Vec::with_capacity(data_channels);
    for i in 1..=data_channels {
        let analog_min = value(analog_min_block + i)?;
        let analog_max = value(analog_max_block + i)?;
        let digital_min = value(digital_min_block + i)?;
        let digital_max = value(digital_max_block + i)?;
        if digital_max == digital_min {
            return Err(SleepError::malformed(
                sidecar,
                format!("channel {} has an empty digital range", i - 1),
            ));
        }
        gains.push(ChannelGain::from_analog_range(
            analog_min,
            analog_max,
            digital_min,
            digital_max,
        ));
    }
    Ok(gains)
}
