//! Recording format detection and dispatch.
//!
//! A recording is identified by its extension plus, for `.eeg` files, the
//! sidecar header found next to it: `<file>.eeg.ent` marks ELAN,
//! `<stem>.vhdr` marks BrainVision. Detection only probes file existence;
//! no content is read until the selected reader runs.

use std::path::Path;

use log::debug;

use crate::elan::ent_sidecar;
use crate::error::{Result, SleepError};
use crate::types::Recording;
use crate::{brainvision, edf, elan, micromed};

/// The recording formats this crate can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingFormat {
    /// ELAN: `.eeg` raw data with a `.eeg.ent` text sidecar.
    Elan,
    /// BrainVision: `.eeg` raw data with `.vhdr` (and optional `.vmrk`).
    BrainVision,
    /// Micromed TRC, header version 4.
    Micromed,
    /// European Data Format, decoded by the delegated `edfplus` reader.
    Edf,
}

/// Determines the recording format for `path` without reading any content.
///
/// # Examples
///
/// ```rust
/// use sleepio::{detect_format, RecordingFormat, SleepError};
///
/// assert_eq!(detect_format("night.trc".as_ref())?, RecordingFormat::Micromed);
/// assert_eq!(detect_format("night.EDF".as_ref())?, RecordingFormat::Edf);
///
/// // A bare .eeg file with neither sidecar is not attributable to a format.
/// assert!(matches!(
///     detect_format("orphan.eeg".as_ref()),
///     Err(SleepError::UnsupportedFormat(_))
/// ));
/// # Ok::<(), sleepio::SleepError>(())
/// ```
pub fn detect_format(path: &Path) -> Result<RecordingFormat> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let format = match extension.as_str() {
        "edf" => RecordingFormat::Edf,
        "trc" => RecordingFormat::Micromed,
        "eeg" => {
            if ent_sidecar(path).is_file() {
                RecordingFormat::Elan
            } else if path.with_extension("vhdr").is_file() {
                RecordingFormat::BrainVision
            } else {
                return Err(SleepError::UnsupportedFormat(format!(
                    "{}: no .ent or .vhdr sidecar found",
                    path.display()
                )));
            }
        }
        _ => {
            return Err(SleepError::UnsupportedFormat(format!(
                "{}: unrecognized extension",
                path.display()
            )))
        }
    };

    debug!("{} detected as {:?}", path.display(), format);
    Ok(format)
}

/// Loads a recording, selecting the reader from the path.
///
/// `downsample` is an optional target frequency in Hz; the returned
/// [`Recording::output_frequency`] reports the rate actually achieved by the
/// integer decimation stride.
pub fn load_recording(path: &Path, downsample: Option<f64>) -> Result<Recording> {
    match detect_format(path)? {
        RecordingFormat::Elan => elan::read_recording(path, downsample),
        RecordingFormat::BrainVision => brainvision::read_recording(path, downsample),
        RecordingFormat::Micromed => micromed::read_recording(path, downsample),
        RecordingFormat::Edf => edf::read_recording(path, downsample),
    }
}
