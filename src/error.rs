use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SleepError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported {format} version: {version}")]
    UnsupportedVersion { format: &'static str, version: String },

    #[error("Unsupported encoding in {path}: {detail}")]
    UnsupportedEncoding { path: String, detail: String },

    #[error("Malformed header in {path}: {detail}")]
    MalformedHeader { path: String, detail: String },

    #[error("Invalid downsampling request: target {target} Hz, source {source_frequency} Hz")]
    InvalidDownsampleRequest { target: f64, source_frequency: f64 },

    #[error("Hypnogram length {actual} exceeds the expected {expected} samples")]
    HypnogramLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid hypnogram: {0}")]
    InvalidHypnogram(String),

    #[error("EDF error: {0}")]
    Edf(#[from] edfplus::EdfError),
}

impl SleepError {
    /// Builds a `MalformedHeader` error carrying the offending file and field.
    pub(crate) fn malformed(path: &Path, detail: impl Into<String>) -> Self {
        SleepError::MalformedHeader {
            path: path.display().to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SleepError>;
