//! Hypnogram loading: ELAN `.hyp` and generic `.txt`/`.csv` stage files.
//!
//! Loading is deliberately forgiving: a recording is still worth inspecting
//! without its sleep scoring, so any parse failure is caught here and
//! reported as an absent hypnogram (`Ok(None)`) rather than propagated. The
//! one fatal case is a stage sequence that resamples to *more* points than
//! the recording has, which would otherwise be silently truncated.

use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Result, SleepError};
use crate::stage::{remap_elan_stages, StageMap};
use crate::utils::{is_integer_token, read_text_lines};

/// Header lines preceding the stage values in an ELAN `.hyp` file.
const ELAN_HYP_HEADER_LINES: usize = 4;

/// Loads a hypnogram and resamples it to exactly `npts` stage values.
///
/// `npts` is the per-channel sample count of the (possibly decimated)
/// recording the hypnogram annotates. Returns `Ok(None)` when the file
/// cannot be parsed or its extension is not a known hypnogram format.
///
/// # Errors
///
/// [`SleepError::HypnogramLengthMismatch`] when the file holds more stage
/// values than `npts` can accommodate; truncation would drop scored epochs.
pub fn load_hypnogram(path: &Path, npts: usize) -> Result<Option<Vec<i32>>> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "hyp" => read_elan_stages(path),
        "txt" | "csv" => read_text_stages(path),
        _ => {
            warn!(
                "{}: not a recognized hypnogram format, continuing without one",
                path.display()
            );
            return Ok(None);
        }
    };

    let raw = match raw {
        Ok(stages) if !stages.is_empty() => stages,
        Ok(_) => {
            warn!("{}: empty hypnogram, continuing without one", path.display());
            return Ok(None);
        }
        Err(err) => {
            warn!(
                "{}: failed to load hypnogram ({err}), continuing without one",
                path.display()
            );
            return Ok(None);
        }
    };

    resample_stages(raw, npts).map(Some)
}

/// ELAN `.hyp`: four header lines, then one raw stage code per line, encoded
/// with the fixed ELAN stage numbering.
fn read_elan_stages(path: &Path) -> Result<Vec<i32>> {
    if !path.is_file() {
        return Err(SleepError::FileNotFound(path.display().to_string()));
    }
    let lines = read_text_lines(path)?;
    let mut raw = Vec::with_capacity(lines.len().saturating_sub(ELAN_HYP_HEADER_LINES));
    for line in lines.iter().skip(ELAN_HYP_HEADER_LINES) {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        let value: i32 = token
            .parse()
            .map_err(|_| SleepError::malformed(path, format!("stage value {token:?}")))?;
        raw.push(value);
    }
    Ok(remap_elan_stages(&raw))
}

/// Generic text hypnogram: integer-like lines are stage values in the raw
/// vendor numbering described by the co-located `<stem>_description.txt`.
fn read_text_stages(path: &Path) -> Result<Vec<i32>> {
    if !path.is_file() {
        return Err(SleepError::FileNotFound(path.display().to_string()));
    }
    let map = StageMap::from_description_file(&description_sidecar(path))?;

    let mut raw = Vec::new();
    for line in read_text_lines(path)? {
        let token = line.trim();
        if is_integer_token(token) {
            if let Ok(value) = token.parse::<i32>() {
                raw.push(value);
            }
        }
    }
    Ok(map.remap(&raw))
}

/// Description sidecar path for a text hypnogram: `<stem>_description.txt`.
pub(crate) fn description_sidecar(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!("{stem}_description.txt"))
}

/// Expands a per-epoch stage sequence to one value per sample.
///
/// Each element is repeated `floor(npts / len)` times; a short result is
/// padded with its final value, a long one is a contract violation.
fn resample_stages(raw: Vec<i32>, npts: usize) -> Result<Vec<i32>> {
    if raw.len() > npts {
        return Err(SleepError::HypnogramLengthMismatch {
            expected: npts,
            actual: raw.len(),
        });
    }

    let rep = npts / raw.len();
    let mut hypno = Vec::with_capacity(npts);
    for value in &raw {
        hypno.extend(std::iter::repeat(*value).take(rep));
    }
    if let Some(&last) = raw.last() {
        while hypno.len() < npts {
            hypno.push(last);
        }
    }
    Ok(hypno)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_repeats_each_stage() {
        let out = resample_stages(vec![0, 1, 2, 4], 8).unwrap();
        assert_eq!(out, vec![0, 0, 1, 1, 2, 2, 4, 4]);
    }

    #[test]
    fn resample_pads_with_final_value() {
        let out = resample_stages(vec![0, 1, 2, 4], 9).unwrap();
        assert_eq!(out, vec![0, 0, 1, 1, 2, 2, 4, 4, 4]);
    }

    #[test]
    fn resample_rejects_overlong_sequences() {
        let err = resample_stages(vec![0; 10], 8).unwrap_err();
        assert!(matches!(
            err,
            SleepError::HypnogramLengthMismatch { expected: 8, actual: 10 }
        ));
    }

    #[test]
    fn description_sidecar_path() {
        let sidecar = description_sidecar(Path::new("/data/night1.txt"));
        assert_eq!(sidecar, Path::new("/data/night1_description.txt"));
    }
}
