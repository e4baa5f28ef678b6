//! # sleepio
//!
//! A multi-format ingestion library for polysomnography (sleep) recordings.
//! It normalizes signal data stored in several incompatible layouts — ELAN
//! (`.eeg` + `.ent`), BrainVision (`.eeg` + `.vhdr` [+ `.vmrk`]), Micromed
//! (`.trc`, header version 4) and EDF (`.edf`, decoded by the `edfplus`
//! crate) — into a single [`Recording`] in physical units, and loads, remaps
//! and writes sleep-stage annotations (hypnograms).
//!
//! ## Reading a recording
//!
//! The format is selected from the path and its sidecar files; no hints are
//! needed:
//!
//! ```rust,no_run
//! use sleepio::load_recording;
//!
//! // Downsample to 100 Hz while loading.
//! let recording = load_recording("night1.eeg".as_ref(), Some(100.0))?;
//!
//! println!("{} channels at {} Hz (stored at {} Hz)",
//!     recording.channel_count(),
//!     recording.output_frequency,
//!     recording.header.sampling_frequency);
//! for (name, row) in recording.header.channels.iter().zip(&recording.data) {
//!     println!("  {name}: {} samples", row.len());
//! }
//! # Ok::<(), sleepio::SleepError>(())
//! ```
//!
//! ## Hypnograms
//!
//! Hypnograms are normalized to the AASM stage codes: -1 artifact/unscored,
//! 0 Wake, 1 N1, 2 N2, 3 N3, 4 REM, expanded to one value per sample so
//! they align with the recording:
//!
//! ```rust,no_run
//! use sleepio::{load_hypnogram, write_elan_hypnogram};
//!
//! # let recording = sleepio::load_recording("night1.eeg".as_ref(), None)?;
//! let npts = recording.samples_per_channel();
//!
//! // A failed parse yields None, never an error: scoring is optional.
//! if let Some(hypno) = load_hypnogram("night1.hyp".as_ref(), npts)? {
//!     write_elan_hypnogram(
//!         "rescored.hyp".as_ref(),
//!         &hypno,
//!         recording.header.sampling_frequency,
//!         recording.header.sample_count,
//!     )?;
//! }
//! # Ok::<(), sleepio::SleepError>(())
//! ```

pub mod brainvision;
pub mod dataset;
pub mod decimate;
pub mod edf;
pub mod elan;
pub mod error;
pub mod hypno_reader;
pub mod hypno_writer;
pub mod micromed;
pub mod stage;
pub mod types;
mod utils;

pub use dataset::{detect_format, load_recording, RecordingFormat};
pub use decimate::Decimation;
pub use error::{Result, SleepError};
pub use hypno_reader::load_hypnogram;
pub use hypno_writer::{write_elan_hypnogram, write_txt_hypnogram};
pub use stage::{
    remap_elan_stages, StageMap, STAGE_ARTIFACT, STAGE_N1, STAGE_N2, STAGE_N3, STAGE_REM,
    STAGE_WAKE,
};
pub use types::{ChannelGain, Recording, RecordingHeader};

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
