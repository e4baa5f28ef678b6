//! Canonical sleep-stage codes and vendor stage remapping.
//!
//! Hypnograms are normalized to the AASM stage set (Iber et al. 2007):
//! Wake 0, N1 1, N2 2, N3 3, REM 4, with -1 for artifacts and unscored
//! epochs. Vendor files encode stages differently; [`StageMap`] translates
//! description-file labels and [`remap_elan_stages`] handles the fixed ELAN
//! `.hyp` encoding.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SleepError};
use crate::utils::read_text_lines;

/// Artifact, movement or unscored epoch.
pub const STAGE_ARTIFACT: i32 = -1;
/// Wakefulness.
pub const STAGE_WAKE: i32 = 0;
/// NREM stage 1.
pub const STAGE_N1: i32 = 1;
/// NREM stage 2.
pub const STAGE_N2: i32 = 2;
/// NREM stage 3 (N4 in older scoring collapses into this).
pub const STAGE_N3: i32 = 3;
/// Rapid eye movement sleep.
pub const STAGE_REM: i32 = 4;

/// Mapping from vendor stage labels to the raw codes stored on disk.
///
/// Built from a `<stem>_description.txt` side-car file containing one
/// space-delimited `label value` pair per line, e.g. from the DREAMS EDF
/// database:
///
/// ```text
/// W 5
/// N1 3
/// N2 2
/// N3 1
/// REM 0
/// ```
#[derive(Debug, Clone, Default)]
pub struct StageMap {
    codes: HashMap<String, i32>,
}

impl StageMap {
    /// Parses a description file into a label -> raw-code table.
    ///
    /// Lines without a `label value` shape are skipped; a file yielding no
    /// pairs at all is malformed.
    pub fn from_description_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SleepError::FileNotFound(path.display().to_string()));
        }
        let mut codes = HashMap::new();
        for line in read_text_lines(path)? {
            let mut fields = line.split_whitespace();
            if let (Some(label), Some(value)) = (fields.next(), fields.next()) {
                if let Ok(code) = value.parse::<i32>() {
                    codes.insert(label.to_string(), code);
                }
            }
        }
        if codes.is_empty() {
            return Err(SleepError::malformed(path, "no label/value pairs"));
        }
        Ok(StageMap { codes })
    }

    /// Builds a map directly from label/code pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        StageMap {
            codes: pairs.into_iter().map(|(l, c)| (l.into(), c)).collect(),
        }
    }

    /// Raw code registered for `label`, if any.
    pub fn raw_code(&self, label: &str) -> Option<i32> {
        self.codes.get(label).copied()
    }

    /// Remaps a raw stage sequence to canonical codes.
    ///
    /// Targets are fixed: W -> 0, N1 -> 1, N2 -> 2, N3 -> 3, N4 -> 3
    /// (collapsed), REM -> 4, and Art/Nde/Mt -> -1. Raw values matching no
    /// registered label default to -1.
    pub fn remap(&self, raw: &[i32]) -> Vec<i32> {
        const TARGETS: [(&str, i32); 9] = [
            ("Art", STAGE_ARTIFACT),
            ("Nde", STAGE_ARTIFACT),
            ("Mt", STAGE_ARTIFACT),
            ("W", STAGE_WAKE),
            ("N1", STAGE_N1),
            ("N2", STAGE_N2),
            ("N3", STAGE_N3),
            ("N4", STAGE_N3),
            ("REM", STAGE_REM),
        ];

        // Raw code -> canonical code; later labels win on collisions, which
        // matches the fixed ordering above (N4 overrides nothing real since
        // N3 and N4 never share a raw code in practice).
        let mut lookup: HashMap<i32, i32> = HashMap::new();
        for (label, canonical) in TARGETS {
            if let Some(code) = self.raw_code(label) {
                lookup.insert(code, canonical);
            }
        }

        raw.iter()
            .map(|value| lookup.get(value).copied().unwrap_or(STAGE_ARTIFACT))
            .collect()
    }
}

/// Remaps raw ELAN `.hyp` stage codes to the canonical set.
///
/// ELAN stores N3+N4 as 4 and REM as 5, with -2 marking artifacts. The two
/// reassignments (4 -> 3, then 5 -> 4) operate on disjoint input values, so
/// a single pass is equivalent to the sequential rewrite ELAN tooling does.
/// Anything outside the known ELAN codes is treated as unscored.
pub fn remap_elan_stages(raw: &[i32]) -> Vec<i32> {
    raw.iter()
        .map(|&value| match value {
            -2 | -1 => STAGE_ARTIFACT,
            0..=3 => value,
            4 => STAGE_N3,
            5 => STAGE_REM,
            _ => STAGE_ARTIFACT,
        })
        .collect()
}

/// Inverse of the ELAN loader remap, applied when writing `.hyp` files:
/// canonical REM (4) becomes the on-disk code 5; 0..=3 and -1 pass through.
pub fn elan_stage_on_disk(canonical: i32) -> i32 {
    if canonical == STAGE_REM {
        5
    } else {
        canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elan_remap_fixed_codes() {
        let raw = [-2, 4, 5, 0, 1, 2, 3];
        assert_eq!(remap_elan_stages(&raw), vec![-1, 3, 4, 0, 1, 2, 3]);
    }

    #[test]
    fn elan_remap_unknown_codes_become_artifact() {
        assert_eq!(remap_elan_stages(&[9, -7]), vec![-1, -1]);
    }

    #[test]
    fn elan_on_disk_roundtrip() {
        for stage in [-1, 0, 1, 2, 3, 4] {
            let reloaded = remap_elan_stages(&[elan_stage_on_disk(stage)]);
            assert_eq!(reloaded[0], stage);
        }
    }

    #[test]
    fn stage_map_remaps_dreams_style_codes() {
        let map = StageMap::from_pairs([("W", 5), ("N1", 3), ("N2", 2), ("N3", 1), ("REM", 0)]);
        assert_eq!(map.remap(&[5, 3, 2, 1, 0]), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn stage_map_n4_collapses_into_n3() {
        let map = StageMap::from_pairs([("N3", 3), ("N4", 4)]);
        assert_eq!(map.remap(&[3, 4]), vec![3, 3]);
    }

    #[test]
    fn stage_map_unmapped_values_default_to_artifact() {
        let map = StageMap::from_pairs([("W", 0)]);
        assert_eq!(map.remap(&[0, 42]), vec![0, -1]);
    }

    #[test]
    fn stage_map_artifact_labels() {
        let map = StageMap::from_pairs([("Art", 8), ("Nde", 9), ("Mt", 10)]);
        assert_eq!(map.remap(&[8, 9, 10]), vec![-1, -1, -1]);
    }
}
