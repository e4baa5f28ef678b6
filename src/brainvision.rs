//! BrainVision recording reader (`.vhdr` header + optional `.vmrk` markers
//! + `.eeg` raw data).
//!
//! Only the layout produced by the vendor's default export is supported:
//! binary, channel-multiplexed, signed 16-bit little-endian samples. Header
//! versions 1 and 2 place the same fields at different fixed line indices.

use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDate, NaiveTime};
use memmap2::Mmap;

use crate::decimate::Decimation;
use crate::error::{Result, SleepError};
use crate::types::{default_start_date, default_start_time, ChannelGain, Recording, RecordingHeader};
use crate::utils::{first_integer, read_text_lines, trailing_digits};

/// Bytes per raw sample; the only supported encoding is INT_16.
const SAMPLE_BYTES: usize = 2;

struct HeaderLayout {
    channel_count_line: usize,
    interval_line: usize,
    sample_type_line: usize,
}

/// Fixed field positions per header version.
fn layout_for(version: u64) -> Option<HeaderLayout> {
    match version {
        1 => Some(HeaderLayout {
            channel_count_line: 9,
            interval_line: 11,
            sample_type_line: 13,
        }),
        2 => Some(HeaderLayout {
            channel_count_line: 10,
            interval_line: 14,
            sample_type_line: 22,
        }),
        _ => None,
    }
}

/// Reads a BrainVision recording, converting the decimated sample subset to
/// physical units via each channel's resolution factor.
pub fn read_recording(path: &Path, downsample: Option<f64>) -> Result<Recording> {
    let header_path = path.with_extension("vhdr");
    let marker_path = path.with_extension("vmrk");
    if !path.is_file() {
        return Err(SleepError::FileNotFound(path.display().to_string()));
    }
    if !header_path.is_file() {
        return Err(SleepError::FileNotFound(header_path.display().to_string()));
    }

    let lines = read_text_lines(&header_path)?;
    let line = |index: usize| {
        lines
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| SleepError::malformed(&header_path, format!("missing line {index}")))
    };

    let version = first_integer(line(0)?).ok_or_else(|| {
        SleepError::malformed(&header_path, "header version")
    })?;
    let layout = layout_for(version).ok_or_else(|| SleepError::UnsupportedVersion {
        format: "BrainVision",
        version: version.to_string(),
    })?;

    // The reader handles exactly one data layout; anything else would be
    // silently misdecoded, so every assertion is fatal.
    let encoding = |line_index: usize, expected: &str| {
        if line(line_index)?.contains(expected) {
            Ok(())
        } else {
            Err(SleepError::UnsupportedEncoding {
                path: header_path.display().to_string(),
                detail: format!("expected {expected} on line {line_index}"),
            })
        }
    };
    encoding(6, "BINARY")?;
    encoding(8, "MULTIPLEXED")?;
    encoding(layout.sample_type_line, "INT_16")?;

    let channel_count = first_integer(line(layout.channel_count_line)?)
        .ok_or_else(|| SleepError::malformed(&header_path, "channel count"))?
        as usize;
    if channel_count == 0 {
        return Err(SleepError::malformed(&header_path, "zero channels"));
    }

    // Sample interval is stored in microseconds.
    let interval_us = first_integer(line(layout.interval_line)?)
        .ok_or_else(|| SleepError::malformed(&header_path, "sampling interval"))?;
    if interval_us == 0 {
        return Err(SleepError::malformed(&header_path, "zero sampling interval"));
    }
    let sampling_frequency = 1e6 / interval_us as f64;

    let (channels, gains) = parse_channel_table(&header_path, &lines, channel_count)?;

    let (start_date, start_time) = if marker_path.is_file() {
        parse_marker_clock(&marker_path)?
    } else {
        (default_start_date(), default_start_time())
    };

    let plan = Decimation::plan(sampling_frequency, downsample)?;

    // Channel-multiplexed: sample s of channel c at word index
    // s * channel_count + c.
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let sample_count = mmap.len() / SAMPLE_BYTES / channel_count;

    let kept = plan.output_len(sample_count);
    let mut data = Vec::with_capacity(channel_count);
    for (c, gain) in gains.iter().enumerate() {
        let mut row = Vec::with_capacity(kept);
        for s in (0..sample_count).step_by(plan.stride) {
            let at = (s * channel_count + c) * SAMPLE_BYTES;
            let raw = LittleEndian::read_i16(&mmap[at..at + 2]) as f64;
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

/// Channel lines run contiguously from the first `Ch1=` line, one per
/// channel: `ChN=<name>,<reference>,<resolution>,<unit>`.
fn parse_channel_table(
    header_path: &Path,
    lines: &[String],
    channel_count: usize,
) -> Result<(Vec<String>, Vec<ChannelGain>)> {
    let start = lines
        .iter()
        .position(|l| l.starts_with("Ch1="))
        .ok_or_else(|| SleepError::malformed(header_path, "channel table"))?;

    let mut channels = Vec::with_capacity(channel_count);
    let mut gains = Vec::with_capacity(channel_count);
    for index in start..start + channel_count {
        let entry = lines
            .get(index)
            .ok_or_else(|| SleepError::malformed(header_path, "truncated channel table"))?;
        let value = entry
            .split_once('=')
            .map(|(_, v)| v)
            .ok_or_else(|| SleepError::malformed(header_path, format!("channel line {index}")))?;

        let fields: Vec<&str> = value.split(',').collect();
        let name = fields
            .first()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SleepError::malformed(header_path, format!("channel name, line {index}")))?;
        let resolution: f64 = fields
            .get(2)
            .and_then(|r| r.trim().parse().ok())
            .ok_or_else(|| {
                SleepError::malformed(header_path, format!("channel resolution, line {index}"))
            })?;

        channels.push(name.to_string());
        gains.push(ChannelGain::from_resolution(resolution));
    }
    Ok((channels, gains))
}

/// The first `Mk1=` marker ends in a `yyyymmddhhmmss...` timestamp.
fn parse_marker_clock(marker_path: &Path) -> Result<(NaiveDate, NaiveTime)> {
    let lines = read_text_lines(marker_path)?;
    let mk1 = match lines.iter().find(|l| l.starts_with("Mk1=")) {
        Some(l) => l,
        None => return Ok((default_start_date(), default_start_time())),
    };

    let stamp = trailing_digits(mk1);
    if stamp.len() < 14 {
        return Err(SleepError::malformed(marker_path, "Mk1 timestamp"));
    }

    let field = |range: std::ops::Range<usize>| -> Result<u32> {
        stamp[range]
            .parse()
            .map_err(|_| SleepError::malformed(marker_path, "Mk1 timestamp"))
    };

    let date = NaiveDate::from_ymd_opt(field(0..4)? as i32, field(4..6)?, field(6..8)?)
        .ok_or_else(|| SleepError::malformed(marker_path, "Mk1 date"))?;
    let time = NaiveTime::from_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)
        .ok_or_else(|| SleepError::malformed(marker_path, "Mk1 time"))?;
    Ok((date, time))
}
