use std::fs;
use std::path::{Path, PathBuf};

use sleepio::{
    load_hypnogram, write_elan_hypnogram, write_txt_hypnogram, SleepError, StageMap,
};
use tempfile::TempDir;

fn write_hyp_file(dir: &Path, stem: &str, stages: &[i32]) -> PathBuf {
    let path = dir.join(format!("{stem}.hyp"));
    let mut lines = vec![
        "time_base 1.000000".to_string(),
        "sampling_period 0.004".to_string(),
        format!("epoch_nb {}", stages.len()),
        "epoch_list".to_string(),
    ];
    lines.extend(stages.iter().map(|s| s.to_string()));
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[test]
fn elan_hyp_remaps_to_canonical_stages() {
    let dir = TempDir::new().unwrap();
    let path = write_hyp_file(dir.path(), "night", &[-2, 4, 5, 0, 1, 2, 3]);

    let hypno = load_hypnogram(&path, 7).unwrap().unwrap();
    assert_eq!(hypno, vec![-1, 3, 4, 0, 1, 2, 3]);
}

#[test]
fn elan_hyp_expands_to_target_length() {
    let dir = TempDir::new().unwrap();
    let path = write_hyp_file(dir.path(), "short", &[0, 1, 2, 5]);

    // rep = floor(8 / 4) = 2; ELAN code 5 is canonical REM.
    let hypno = load_hypnogram(&path, 8).unwrap().unwrap();
    assert_eq!(hypno, vec![0, 0, 1, 1, 2, 2, 4, 4]);

    // A non-integer ratio pads with the final value.
    let hypno = load_hypnogram(&path, 9).unwrap().unwrap();
    assert_eq!(hypno, vec![0, 0, 1, 1, 2, 2, 4, 4, 4]);
}

#[test]
fn overlong_hypnogram_is_a_fatal_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = write_hyp_file(dir.path(), "long", &[0; 20]);

    let err = load_hypnogram(&path, 10).unwrap_err();
    assert!(matches!(
        err,
        SleepError::HypnogramLengthMismatch { expected: 10, actual: 20 }
    ));
}

#[test]
fn malformed_hyp_yields_absent_hypnogram() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.hyp");
    fs::write(&path, "time_base\nsampling_period\nepoch_nb\nepoch_list\nW\nN2\n").unwrap();

    assert!(load_hypnogram(&path, 10).unwrap().is_none());
}

#[test]
fn missing_file_yields_absent_hypnogram() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.hyp");

    assert!(load_hypnogram(&path, 10).unwrap().is_none());
}

#[test]
fn unknown_extension_yields_absent_hypnogram() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("night.dat");
    fs::write(&path, "0\n1\n").unwrap();

    assert!(load_hypnogram(&path, 2).unwrap().is_none());
}

#[test]
fn txt_hypnogram_uses_description_stage_map() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dreams.txt");
    // DREAMS-style inverted numbering, with labels mixed into the data file.
    fs::write(&path, "scoring export\n5\n3\n2\n1\n0\n7\n").unwrap();
    fs::write(
        dir.path().join("dreams_description.txt"),
        "W 5\nN1 3\nN2 2\nN3 1\nREM 0\n",
    )
    .unwrap();

    let hypno = load_hypnogram(&path, 6).unwrap().unwrap();
    // Raw 7 has no label and defaults to artifact.
    assert_eq!(hypno, vec![0, 1, 2, 3, 4, -1]);
}

#[test]
fn txt_hypnogram_without_description_is_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lonely.csv");
    fs::write(&path, "0\n1\n2\n").unwrap();

    assert!(load_hypnogram(&path, 3).unwrap().is_none());
}

#[test]
fn stage_map_reads_description_file() {
    let dir = TempDir::new().unwrap();
    let desc = dir.path().join("x_description.txt");
    fs::write(&desc, "time 30\nW 0\nN1 1\nArt -1\n").unwrap();

    let map = StageMap::from_description_file(&desc).unwrap();
    assert_eq!(map.raw_code("W"), Some(0));
    assert_eq!(map.raw_code("Art"), Some(-1));
    assert_eq!(map.raw_code("REM"), None);
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// A per-sample hypnogram of `epochs` one-second epochs at `sf` Hz, cycling
/// through the canonical stages.
fn per_sample_hypnogram(epochs: usize, sf: usize) -> Vec<i32> {
    const CYCLE: [i32; 6] = [0, 1, 2, 3, 4, -1];
    let mut hypno = Vec::with_capacity(epochs * sf);
    for epoch in 0..epochs {
        hypno.extend(std::iter::repeat(CYCLE[epoch % CYCLE.len()]).take(sf));
    }
    hypno
}

#[test]
fn elan_writer_emits_header_and_one_value_per_epoch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.hyp");
    let hypno = per_sample_hypnogram(30, 100);

    write_elan_hypnogram(&path, &hypno, 100.0, 3000).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "time_base 1.000000");
    assert_eq!(lines[1], "sampling_period 0.01");
    assert_eq!(lines[2], "epoch_nb 30");
    assert_eq!(lines[3], "epoch_list");
    assert_eq!(lines.len(), 4 + 30);
    // Canonical REM (4) is stored as the ELAN code 5.
    assert_eq!(lines[4 + 4], "5");
    assert_eq!(lines[4 + 5], "-1");
}

#[test]
fn elan_write_read_roundtrip_preserves_stages() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cycle.hyp");
    let hypno = per_sample_hypnogram(30, 100);

    write_elan_hypnogram(&path, &hypno, 100.0, 3000).unwrap();
    let reloaded = load_hypnogram(&path, 3000).unwrap().unwrap();

    assert_eq!(reloaded, hypno);
}

#[test]
fn txt_writer_emits_values_and_description_sidecar() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.txt");
    let hypno = per_sample_hypnogram(10, 100);

    write_txt_hypnogram(&path, &hypno, 100.0, 1000, 1.0).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let values: Vec<&str> = content.lines().collect();
    assert_eq!(values.len(), 10);
    assert_eq!(values[4], "4");

    let desc = fs::read_to_string(dir.path().join("out_description.txt")).unwrap();
    assert!(desc.contains("time 1"));
    assert!(desc.contains("W 0"));
    assert!(desc.contains("REM 4"));
    assert!(desc.contains("Art -1"));
}

#[test]
fn txt_write_read_roundtrip_preserves_stages() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cycle.txt");
    let hypno = per_sample_hypnogram(12, 50);

    write_txt_hypnogram(&path, &hypno, 50.0, 600, 1.0).unwrap();
    let reloaded = load_hypnogram(&path, 600).unwrap().unwrap();

    assert_eq!(reloaded, hypno);
}

#[test]
fn writer_anchors_epochs_to_the_original_sample_count() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ds.hyp");
    // Hypnogram aligned with 100 Hz data decimated from 500 Hz: 6 epochs of
    // the original 3000-sample recording, 100 hypnogram values each.
    let hypno = per_sample_hypnogram(6, 100);

    write_elan_hypnogram(&path, &hypno, 500.0, 3000).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let values: Vec<&str> = content.lines().skip(4).collect();
    assert_eq!(values.len(), 6);
    assert_eq!(values, vec!["0", "1", "2", "3", "5", "-1"]);
}

#[test]
fn writer_rounds_fractional_values_per_epoch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frac.hyp");
    // 450 stage values over 300 one-second epochs: 1.5 values per epoch,
    // which rounds to a stride of 2 and 225 emitted values.
    let hypno: Vec<i32> = (0..450).map(|i| i32::from(i % 3 == 0)).collect();

    write_elan_hypnogram(&path, &hypno, 100.0, 30000).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let values: Vec<&str> = content.lines().skip(4).collect();
    assert_eq!(values.len(), 225);
}

#[test]
fn writer_rejects_hypnograms_shorter_than_the_epoch_grid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.hyp");

    let err = write_elan_hypnogram(&path, &[0, 1, 2], 100.0, 3000).unwrap_err();
    assert!(matches!(err, SleepError::InvalidHypnogram(_)));
}
