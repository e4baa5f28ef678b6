//! Hypnogram writing: ELAN `.hyp` and generic `.txt` + description formats.
//!
//! Both writers take a canonical per-sample hypnogram and emit one value per
//! scoring epoch. The epoch grid is anchored to the *original* recording
//! (`sample_count` samples at `source_frequency` Hz), so a hypnogram aligned
//! with decimated data still lands on the same wall-clock epochs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SleepError};
use crate::hypno_reader::description_sidecar;
use crate::stage::elan_stage_on_disk;

/// Epoch count and in-memory stride for a hypnogram of `len` values over a
/// recording of `sample_count` samples at `source_frequency` Hz.
fn epoch_stride(len: usize, source_frequency: f64, sample_count: usize) -> Result<usize> {
    if len == 0 {
        return Err(SleepError::InvalidHypnogram("empty stage sequence".into()));
    }
    if source_frequency <= 0.0 {
        return Err(SleepError::InvalidHypnogram(format!(
            "non-positive source frequency {source_frequency}"
        )));
    }
    let epochs = (sample_count as f64 / source_frequency).round() as usize;
    if epochs == 0 {
        return Err(SleepError::InvalidHypnogram(
            "recording shorter than one epoch".into(),
        ));
    }
    let step = (len as f64 / epochs as f64).round() as usize;
    if step == 0 {
        return Err(SleepError::InvalidHypnogram(format!(
            "{len} stage values cannot cover {epochs} epochs"
        )));
    }
    Ok(step)
}

/// Writes a canonical hypnogram as an ELAN `.hyp` file.
///
/// Stage codes are translated back to the ELAN numbering (REM 4 becomes the
/// on-disk 5), one value per one-second epoch of the original recording,
/// after a fixed four-line header.
///
/// # Arguments
///
/// * `path` - Destination file.
/// * `hypno` - Canonical stage codes, one per (possibly decimated) sample.
/// * `source_frequency` - Sampling rate of the original recording in Hz.
/// * `sample_count` - Per-channel sample count of the original recording.
pub fn write_elan_hypnogram(
    path: &Path,
    hypno: &[i32],
    source_frequency: f64,
    sample_count: usize,
) -> Result<()> {
    let step = epoch_stride(hypno.len(), source_frequency, sample_count)?;
    let period = (1e8 / source_frequency).round() / 1e8;

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "time_base 1.000000")?;
    writeln!(out, "sampling_period {period}")?;
    writeln!(out, "epoch_nb {}", (sample_count as f64 / source_frequency) as usize)?;
    writeln!(out, "epoch_list")?;
    for value in hypno.iter().step_by(step) {
        writeln!(out, "{}", elan_stage_on_disk(*value))?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a canonical hypnogram as a bare-integer text file plus a
/// `<stem>_description.txt` side-car naming the canonical stage codes.
///
/// `window` is the epoch duration in seconds, recorded in the description
/// file's `time` line (1.0 means one value per second).
pub fn write_txt_hypnogram(
    path: &Path,
    hypno: &[i32],
    source_frequency: f64,
    sample_count: usize,
    window: f64,
) -> Result<()> {
    let step = epoch_stride(hypno.len(), source_frequency, sample_count)?;

    let mut out = BufWriter::new(File::create(path)?);
    for value in hypno.iter().step_by(step) {
        writeln!(out, "{value}")?;
    }
    out.flush()?;

    let mut desc = BufWriter::new(File::create(description_sidecar(path))?);
    writeln!(desc, "time {window}")?;
    writeln!(desc, "W 0")?;
    writeln!(desc, "N1 1")?;
    writeln!(desc, "N2 2")?;
    writeln!(desc, "N3 3")?;
    writeln!(desc, "REM 4")?;
    writeln!(desc, "Art -1")?;
    desc.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_one_value_per_epoch() {
        // 3000 samples at 100 Hz: 30 one-second epochs over 3000 stage values.
        assert_eq!(epoch_stride(3000, 100.0, 3000).unwrap(), 100);
    }

    #[test]
    fn stride_accounts_for_decimated_hypnograms() {
        // Hypnogram aligned with 100 Hz data decimated from 500 Hz.
        assert_eq!(epoch_stride(600, 500.0, 3000).unwrap(), 100);
    }

    #[test]
    fn fractional_ratio_rounds_the_stride() {
        // 450 stage values over 300 epochs: 1.5 values per epoch rounds to 2.
        assert_eq!(epoch_stride(450, 100.0, 30000).unwrap(), 2);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(epoch_stride(0, 100.0, 3000).is_err());
        assert!(epoch_stride(10, 100.0, 3000).is_err());
        assert!(epoch_stride(100, 100.0, 0).is_err());
        assert!(epoch_stride(100, 0.0, 3000).is_err());
    }
}
