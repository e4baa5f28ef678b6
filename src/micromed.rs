//! Micromed `.trc` recording reader (header version 4).
//!
//! The format is a single binary file: a fixed-offset header, two "zone"
//! descriptors locating the channel order and calibration tables, and a flat
//! unsigned sample matrix. All multibyte fields are little-endian.

use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDate, NaiveTime};
use memmap2::Mmap;

use crate::decimate::Decimation;
use crate::error::{Result, SleepError};
use crate::types::{ChannelGain, Recording, RecordingHeader};

/// Byte offset of the recording start date/time (six bytes: day, month,
/// year since 1900, hour, minute, second).
const OFFSET_CLOCK: usize = 128;
/// Byte offset of the acquisition block: u32 data start, u16 channel count,
/// u16 multiplexer, u16 sampling frequency, u16 sample byte width.
const OFFSET_ACQUISITION: usize = 138;
/// Byte offset of the header version byte.
const OFFSET_VERSION: usize = 175;
/// Byte offset of the first zone descriptor record.
const OFFSET_ZONES: usize = 176;
/// Zone descriptor record: 8-byte name + u32 position + u32 length.
const ZONE_RECORD_BYTES: usize = 16;
/// Bytes per entry in the channel label/calibration (LABCOD) table.
const LABCOD_ENTRY_BYTES: usize = 128;

/// The only header version this reader decodes.
const SUPPORTED_VERSION: i8 = 4;

/// Reads a Micromed v4 recording, converting the decimated sample subset to
/// physical units.
pub fn read_recording(path: &Path, downsample: Option<f64>) -> Result<Recording> {
    if !path.is_file() {
        return Err(SleepError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    let byte_at = |offset: usize| {
        mmap.get(offset)
            .copied()
            .ok_or_else(|| SleepError::malformed(path, format!("truncated at offset {offset}")))
    };
    let slice_at = |offset: usize, len: usize| {
        mmap.get(offset..offset + len)
            .ok_or_else(|| SleepError::malformed(path, format!("truncated at offset {offset}")))
    };

    let version = byte_at(OFFSET_VERSION)? as i8;
    if version != SUPPORTED_VERSION {
        return Err(SleepError::UnsupportedVersion {
            format: "Micromed",
            version: version.to_string(),
        });
    }

    let acquisition = slice_at(OFFSET_ACQUISITION, 12)?;
    let data_start = LittleEndian::read_u32(&acquisition[0..4]) as usize;
    let channel_count = LittleEndian::read_u16(&acquisition[4..6]) as usize;
    let sampling_frequency = LittleEndian::read_u16(&acquisition[8..10]) as f64;
    let sample_bytes = LittleEndian::read_u16(&acquisition[10..12]) as usize;
    if channel_count == 0 {
        return Err(SleepError::malformed(path, "zero channels"));
    }
    if !matches!(sample_bytes, 1 | 2 | 4) {
        return Err(SleepError::malformed(
            path,
            format!("sample width {sample_bytes} bytes"),
        ));
    }

    let clock = slice_at(OFFSET_CLOCK, 6)?;
    let start_date = NaiveDate::from_ymd_opt(
        clock[2] as i32 + 1900,
        clock[1] as u32,
        clock[0] as u32,
    )
    .ok_or_else(|| SleepError::malformed(path, "recording date"))?;
    let start_time = NaiveTime::from_hms_opt(clock[3] as u32, clock[4] as u32, clock[5] as u32)
        .ok_or_else(|| SleepError::malformed(path, "recording time"))?;

    // Zone descriptors are positional: ORDER first, LABCOD second.
    let order_zone = slice_at(OFFSET_ZONES, ZONE_RECORD_BYTES)?;
    let order_pos = LittleEndian::read_u32(&order_zone[8..12]) as usize;
    let labcod_zone = slice_at(OFFSET_ZONES + ZONE_RECORD_BYTES, ZONE_RECORD_BYTES)?;
    let labcod_pos = LittleEndian::read_u32(&labcod_zone[8..12]) as usize;

    let order = slice_at(order_pos, 2 * channel_count)?;
    let codes: Vec<u16> = (0..channel_count)
        .map(|c| LittleEndian::read_u16(&order[2 * c..2 * c + 2]))
        .collect();

    let mut channels = Vec::with_capacity(channel_count);
    let mut gains = Vec::with_capacity(channel_count);
    for &code in &codes {
        // Entry layout: 2 status bytes, 6-byte label, 6-byte ground label,
        // then logical min/max, logical ground, physical min/max as i32.
        let entry = slice_at(labcod_pos + code as usize * LABCOD_ENTRY_BYTES + 2, 32)?;
        let label: String = entry[0..6]
            .iter()
            .map(|&b| b as char)
            .collect::<String>()
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string();
        let logical_min = LittleEndian::read_i32(&entry[12..16]);
        let logical_max = LittleEndian::read_i32(&entry[16..20]);
        let logical_ground = LittleEndian::read_i32(&entry[20..24]);
        let physical_min = LittleEndian::read_i32(&entry[24..28]);
        let physical_max = LittleEndian::read_i32(&entry[28..32]);
        if logical_max == logical_min && physical_max == physical_min {
            return Err(SleepError::malformed(
                path,
                format!("channel {label} has an empty calibration range"),
            ));
        }

        channels.push(label);
        gains.push(ChannelGain::from_logical_range(
            logical_min,
            logical_max,
            logical_ground,
            physical_min as f64,
            physical_max as f64,
        ));
    }

    let plan = Decimation::plan(sampling_frequency, downsample)?;

    // Samples are stored as interleaved frames: sample s of channel c at
    // element index s * channel_count + c, unsigned, `sample_bytes` wide.
    let raw = mmap
        .get(data_start..)
        .ok_or_else(|| SleepError::malformed(path, "data start beyond end of file"))?;
    let sample_count = raw.len() / sample_bytes / channel_count;

    let kept = plan.output_len(sample_count);
    let mut data = Vec::with_capacity(channel_count);
    for (c, gain) in gains.iter().enumerate() {
        let mut row = Vec::with_capacity(kept);
        for s in (0..sample_count).step_by(plan.stride) {
            let at = (s * channel_count + c) * sample_bytes;
            let value = match sample_bytes {
                1 => raw[at] as f64,
                2 => LittleEndian::read_u16(&raw[at..at + 2]) as f64,
                _ => LittleEndian::read_u32(&raw[at..at + 4]) as f64,
            };
            row.push(gain.to_physical(value));
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
