use std::fs;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use walkdir::WalkDir;

use rstiming::json::{from_json, to_json};
use rstiming::{TimingData, TimingOptions, load_timing};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Edit {
    SetBpm { row: i32, bpm: f64 },
    SetStop { row: i32, seconds: f64 },
    SetDelay { row: i32, seconds: f64 },
    SetWarp { row: i32, length_beats: f64 },
    ScaleRegion { scale: f64, start_row: i32, end_row: i32, adjust_bpm: bool },
    InsertRows { start_row: i32, count: i32 },
    DeleteRows { start_row: i32, count: i32 },
    MultiplyBpm { start_row: i32, end_row: i32, factor: f64 },
    JsonRoundTrip,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Checks {
    has_bpm_changes: Option<bool>,
    has_negative_bpms: Option<bool>,
    time_at_beat: Vec<(f64, f64)>,
    beat_at_time: Vec<(f64, f64)>,
    freeze_at_time: Vec<f64>,
    delay_at_time: Vec<f64>,
    bpm_at_row: Vec<(i32, f64)>,
    judgable_at_row: Vec<(i32, bool)>,
    tempo_rows: Option<Vec<(i32, f64)>>,
}

#[derive(Debug, Deserialize)]
struct Case {
    #[serde(default)]
    quirks_mode: bool,
    #[serde(default)]
    global_offset_seconds: f64,
    #[serde(default)]
    tags: Vec<(String, String)>,
    #[serde(default)]
    edits: Vec<Edit>,
    #[serde(default)]
    checks: Checks,
}

const EPS: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS
}

fn apply_edit(timing: &mut TimingData, edit: &Edit) -> Result<(), String> {
    match *edit {
        Edit::SetBpm { row, bpm } => {
            timing.set_bpm_at_row(row, bpm);
        }
        Edit::SetStop { row, seconds } => {
            timing.set_stop_at_row(row, seconds);
        }
        Edit::SetDelay { row, seconds } => {
            timing.set_delay_at_row(row, seconds);
        }
        Edit::SetWarp { row, length_beats } => {
            timing.set_warp_at_row(row, length_beats);
        }
        Edit::ScaleRegion {
            scale,
            start_row,
            end_row,
            adjust_bpm,
        } => timing.scale_region(scale, start_row, end_row, adjust_bpm),
        Edit::InsertRows { start_row, count } => timing.insert_rows(start_row, count),
        Edit::DeleteRows { start_row, count } => timing.delete_rows(start_row, count),
        Edit::MultiplyBpm {
            start_row,
            end_row,
            factor,
        } => timing.multiply_bpm_in_range(start_row, end_row, factor),
        Edit::JsonRoundTrip => {
            let json = to_json(timing).map_err(|e| format!("serialize: {e}"))?;
            let negative = timing.has_negative_bpms();
            *timing = from_json(&json).map_err(|e| format!("deserialize: {e}"))?;
            if timing.has_negative_bpms() != negative {
                return Err("negative BPM flag lost in JSON round trip".to_string());
            }
        }
    }
    Ok(())
}

fn check_timing(timing: &TimingData, checks: &Checks, offset: f64) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(expected) = checks.has_bpm_changes
        && timing.has_bpm_changes() != expected
    {
        errors.push(format!("has_bpm_changes: expected {expected}"));
    }
    if let Some(expected) = checks.has_negative_bpms
        && timing.has_negative_bpms() != expected
    {
        errors.push(format!("has_negative_bpms: expected {expected}"));
    }
    for &(beat, seconds) in &checks.time_at_beat {
        let actual = timing.elapsed_time_from_beat(beat, offset);
        if !approx_eq(actual, seconds) {
            errors.push(format!("time at beat {beat}: expected {seconds}, got {actual}"));
        }
    }
    for &(seconds, beat) in &checks.beat_at_time {
        let actual = timing.beat_from_elapsed_time(seconds, offset);
        if !approx_eq(actual, beat) {
            errors.push(format!("beat at {seconds}s: expected {beat}, got {actual}"));
        }
    }
    for &seconds in &checks.freeze_at_time {
        if !timing.beat_and_bps_from_elapsed_time(seconds, offset).is_in_freeze {
            errors.push(format!("expected a freeze at {seconds}s"));
        }
    }
    for &seconds in &checks.delay_at_time {
        if !timing.beat_and_bps_from_elapsed_time(seconds, offset).is_in_delay {
            errors.push(format!("expected a delay at {seconds}s"));
        }
    }
    for &(row, bpm) in &checks.bpm_at_row {
        let actual = timing.bpm_at_row(row);
        if !approx_eq(actual, bpm) {
            errors.push(format!("bpm at row {row}: expected {bpm}, got {actual}"));
        }
    }
    for &(row, judgable) in &checks.judgable_at_row {
        if timing.is_judgable_at_row(row) != judgable {
            errors.push(format!("judgable at row {row}: expected {judgable}"));
        }
    }
    if let Some(expected) = &checks.tempo_rows {
        let actual: Vec<(i32, f64)> = timing.tempos().iter().map(|t| (t.row, t.bpm())).collect();
        let matches = expected.len() == actual.len()
            && expected
                .iter()
                .zip(&actual)
                .all(|(e, a)| e.0 == a.0 && approx_eq(e.1, a.1));
        if !matches {
            errors.push(format!("tempo rows: expected {expected:?}, got {actual:?}"));
        }
    }

    errors
}

fn check_file(path: &Path) -> Result<(), String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read case: {e}"))?;
    let case: Case =
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse case JSON: {e}"))?;

    let options = TimingOptions {
        global_offset_seconds: case.global_offset_seconds,
        quirks_mode: case.quirks_mode,
    };
    let tags = case.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let mut timing = load_timing(tags, &options).map_err(|e| format!("Load error: {e}"))?;

    for edit in &case.edits {
        apply_edit(&mut timing, edit)?;
    }

    let errors = check_timing(&timing, &case.checks, options.global_offset_seconds);
    if errors.is_empty() {
        return Ok(());
    }
    Err(format!(
        "\n\nMISMATCH DETECTED\nCase: {}\n  {}\n",
        path.display(),
        errors.join("\n  ")
    ))
}

/// One trial per JSON file under `tests/data/cases`, named by its path
/// relative to that directory.
fn case_trials(cases_dir: &Path) -> Vec<Trial> {
    let mut paths: Vec<PathBuf> = WalkDir::new(cases_dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let name = path
                .strip_prefix(cases_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            Trial::test(name, move || check_file(&path).map_err(Failed::from))
        })
        .collect()
}

fn main() {
    let args = Arguments::from_args();

    let cases_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/cases");
    if !cases_dir.exists() {
        println!("No tests/data/cases directory found.");
        return;
    }

    libtest_mimic::run(&args, case_trials(&cases_dir)).exit();
}
