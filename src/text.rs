use std::fmt;
use std::str::FromStr;

use crate::TimingOptions;
use crate::error::TimingError;
use crate::rows::{ROWS_PER_BEAT, beat_to_note_row};
use crate::segments::{
    ComboSegment, FakeSegment, LabelSegment, PauseKind, PauseSegment, ScrollSegment, Segment,
    SpeedSegment, SpeedUnit, TempoSegment, TickcountSegment, TimeSignatureSegment, WarpSegment,
};
use crate::timing::TimingData;

/// A `#TAG:beat=value,...;` timing list in a chart file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingTag {
    Bpms,
    Stops,
    Delays,
    Warps,
    TimeSignatures,
    Tickcounts,
    Combos,
    Labels,
    Speeds,
    Scrolls,
    Fakes,
}

impl TimingTag {
    pub const ALL: [Self; 11] = [
        Self::Bpms,
        Self::Stops,
        Self::Delays,
        Self::Warps,
        Self::TimeSignatures,
        Self::Tickcounts,
        Self::Combos,
        Self::Labels,
        Self::Speeds,
        Self::Scrolls,
        Self::Fakes,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bpms => "BPMS",
            Self::Stops => "STOPS",
            Self::Delays => "DELAYS",
            Self::Warps => "WARPS",
            Self::TimeSignatures => "TIMESIGNATURES",
            Self::Tickcounts => "TICKCOUNTS",
            Self::Combos => "COMBOS",
            Self::Labels => "LABELS",
            Self::Speeds => "SPEEDS",
            Self::Scrolls => "SCROLLS",
            Self::Fakes => "FAKES",
        }
    }
}

impl fmt::Display for TimingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimingTag {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        Self::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TimingError::UnknownTag(s.to_string()))
    }
}

#[inline(always)]
fn parse_f64_fast(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer field; a decimal like `4.000` truncates toward zero.
#[inline(always)]
fn parse_i32_lenient(s: &str) -> Option<i32> {
    let s = s.trim();
    s.parse::<i32>()
        .ok()
        .or_else(|| parse_f64_fast(s).map(|v| v as i32))
}

/// Loads one timing tag's value into `timing`, appending segments in file
/// order. Malformed or out-of-range entries are logged and skipped.
///
/// Returns how many segments were added.
pub fn load_timing_tag(
    timing: &mut TimingData,
    tag: TimingTag,
    value: &str,
    options: &TimingOptions,
) -> usize {
    let mut added = 0;
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let fields: Vec<&str> = entry.split('=').collect();
        if load_entry(timing, tag, entry, &fields, options) {
            added += 1;
        }
    }
    added
}

fn load_entry(
    timing: &mut TimingData,
    tag: TimingTag,
    entry: &str,
    fields: &[&str],
    options: &TimingOptions,
) -> bool {
    let expected_fields = match tag {
        TimingTag::TimeSignatures => 3..=3,
        TimingTag::Combos => 2..=3,
        TimingTag::Speeds => 3..=4,
        // Labels may themselves contain '='.
        TimingTag::Labels => 2..=usize::MAX,
        _ => 2..=2,
    };
    if !expected_fields.contains(&fields.len()) {
        log::warn!("invalid #{tag} value \"{entry}\" ({} fields), ignored", fields.len());
        return false;
    }
    let Some(beat) = parse_f64_fast(fields[0]) else {
        log::warn!("invalid #{tag} beat in \"{entry}\", ignored");
        return false;
    };
    let row = beat_to_note_row(beat);

    match tag {
        TimingTag::Bpms => {
            let Some(bpm) = parse_f64_fast(fields[1]) else {
                return reject(tag, entry);
            };
            if bpm < 0.0 {
                timing.mark_negative_bpms();
            }
            if bpm > 0.0 || (bpm < 0.0 && options.quirks_mode) {
                timing.add_tempo(TempoSegment::from_bpm(row, bpm));
                return true;
            }
            log::warn!("invalid BPM change at beat {beat}, BPM {bpm}, ignored");
            false
        }
        TimingTag::Stops | TimingTag::Delays => {
            let kind = if tag == TimingTag::Stops {
                PauseKind::Stop
            } else {
                PauseKind::Delay
            };
            let Some(seconds) = parse_f64_fast(fields[1]) else {
                return reject(tag, entry);
            };
            // Negative stops are a quirks-mode gimmick; delays must be positive.
            let quirk_ok = kind == PauseKind::Stop && options.quirks_mode && seconds < 0.0;
            if seconds > 0.0 || quirk_ok {
                timing.add_pause(kind, PauseSegment { row, seconds });
                return true;
            }
            log::warn!("invalid {kind:?} at beat {beat}, length {seconds}, ignored");
            false
        }
        TimingTag::Warps | TimingTag::Fakes => {
            let Some(length_beats) = parse_f64_fast(fields[1]).filter(|&l| l > 0.0) else {
                return reject(tag, entry);
            };
            if tag == TimingTag::Warps {
                timing.add_warp(WarpSegment { row, length_beats });
            } else {
                timing.add_fake(FakeSegment { row, length_beats });
            }
            true
        }
        TimingTag::TimeSignatures => {
            let numerator = parse_i32_lenient(fields[1]).unwrap_or(0);
            let denominator = parse_i32_lenient(fields[2]).unwrap_or(0);
            if beat < 0.0 || numerator < 1 || denominator < 1 {
                log::warn!(
                    "invalid time signature change at beat {beat}, {numerator}/{denominator}, ignored"
                );
                return false;
            }
            timing.add_time_signature(TimeSignatureSegment {
                row,
                numerator,
                denominator,
            });
            true
        }
        TimingTag::Tickcounts => {
            let ticks = parse_i32_lenient(fields[1]).unwrap_or(0);
            if !(1..=ROWS_PER_BEAT).contains(&ticks) {
                log::warn!("invalid tickcount at beat {beat}, ticks {ticks}, ignored");
                return false;
            }
            timing.add_tickcount(TickcountSegment { row, ticks });
            true
        }
        TimingTag::Combos => {
            let Some(combo) = parse_i32_lenient(fields[1]) else {
                return reject(tag, entry);
            };
            timing.add_combo(ComboSegment { row, combo });
            true
        }
        TimingTag::Labels => {
            let label = fields[1..].join("=");
            let label = label.trim();
            if label.is_empty() {
                return reject(tag, entry);
            }
            timing.add_label(LabelSegment {
                row,
                label: label.to_string(),
            });
            true
        }
        TimingTag::Speeds => {
            let (Some(ratio), Some(wait)) = (parse_f64_fast(fields[1]), parse_f64_fast(fields[2]))
            else {
                return reject(tag, entry);
            };
            let unit = fields
                .get(3)
                .and_then(|f| parse_i32_lenient(f))
                .map_or(SpeedUnit::Beats, SpeedUnit::from_flag);
            timing.add_speed(SpeedSegment {
                row,
                ratio,
                wait,
                unit,
            });
            true
        }
        TimingTag::Scrolls => {
            let Some(ratio) = parse_f64_fast(fields[1]) else {
                return reject(tag, entry);
            };
            timing.add_scroll(ScrollSegment { row, ratio });
            true
        }
    }
}

fn reject(tag: TimingTag, entry: &str) -> bool {
    log::warn!("invalid #{tag} value \"{entry}\", ignored");
    false
}

fn join_entries<'a, T: Segment + 'a>(
    list: impl IntoIterator<Item = &'a T>,
    value: impl Fn(&T) -> String,
) -> String {
    scripting_entries(list, value).join(",")
}

/// Renders one timing tag's value as comma-joined `beat=value` pairs with
/// six decimals, in list order.
pub fn write_timing_tag(timing: &TimingData, tag: TimingTag) -> String {
    match tag {
        TimingTag::Bpms => join_entries(timing.tempos(), |t| format!("{:.6}", t.bpm())),
        TimingTag::Stops => join_entries(timing.stops(), |p| format!("{:.6}", p.seconds)),
        TimingTag::Delays => join_entries(timing.delays(), |p| format!("{:.6}", p.seconds)),
        TimingTag::Warps => join_entries(timing.warps(), |w| format!("{:.6}", w.length_beats)),
        TimingTag::Fakes => join_entries(timing.fakes(), |f| format!("{:.6}", f.length_beats)),
        TimingTag::TimeSignatures => join_entries(timing.time_signatures(), |s| {
            format!("{}={}", s.numerator, s.denominator)
        }),
        TimingTag::Tickcounts => join_entries(timing.tickcounts(), |t| t.ticks.to_string()),
        TimingTag::Combos => join_entries(timing.combos(), |c| c.combo.to_string()),
        TimingTag::Labels => join_entries(timing.labels(), |l| l.label.clone()),
        TimingTag::Speeds => join_entries(timing.speeds(), |s| {
            format!("{:.6}={:.6}={}", s.ratio, s.wait, s.unit.flag())
        }),
        TimingTag::Scrolls => join_entries(timing.scrolls(), |s| format!("{:.6}", s.ratio)),
    }
}

fn scripting_entries<'a, T: Segment + 'a>(
    list: impl IntoIterator<Item = &'a T>,
    value: impl Fn(&T) -> String,
) -> Vec<String> {
    list.into_iter()
        .map(|seg| format!("{:.6}={}", seg.beat(), value(seg)))
        .collect()
}

impl TimingData {
    /// `beat=seconds` for every stop, as handed to theme scripts.
    pub fn stop_entries(&self) -> Vec<String> {
        scripting_entries(self.stops(), |p| format!("{:.6}", p.seconds))
    }

    pub fn delay_entries(&self) -> Vec<String> {
        scripting_entries(self.delays(), |p| format!("{:.6}", p.seconds))
    }

    pub fn label_entries(&self) -> Vec<String> {
        scripting_entries(self.labels(), |l| l.label.clone())
    }

    pub fn bpm_entries(&self) -> Vec<String> {
        scripting_entries(self.tempos(), |t| format!("{:.6}", t.bpm()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(tag: TimingTag, value: &str) -> (TimingData, usize) {
        let mut timing = TimingData::new();
        let added = load_timing_tag(&mut timing, tag, value, &TimingOptions::default());
        (timing, added)
    }

    #[test]
    fn tag_names_parse_case_insensitively() {
        assert_eq!("BPMS".parse::<TimingTag>().ok(), Some(TimingTag::Bpms));
        assert_eq!("#timesignatures".parse::<TimingTag>().ok(), Some(TimingTag::TimeSignatures));
        assert!(matches!(
            "ATTACKS".parse::<TimingTag>(),
            Err(TimingError::UnknownTag(name)) if name == "ATTACKS"
        ));
    }

    #[test]
    fn bpms_skip_malformed_and_non_positive() {
        let (timing, added) = load(TimingTag::Bpms, "0.000=120.000,\n4.000=0,8=1=2,x=3,12.000=-60");
        assert_eq!(added, 1);
        assert_eq!(timing.bpms(), vec![120.0]);
        // Seeing a negative tempo is recorded even when it is dropped.
        assert!(timing.has_negative_bpms());
    }

    #[test]
    fn quirks_mode_keeps_negative_bpms_and_stops() {
        let mut timing = TimingData::new();
        let options = TimingOptions {
            quirks_mode: true,
            ..TimingOptions::default()
        };
        let bpms = load_timing_tag(&mut timing, TimingTag::Bpms, "0=120,4=-120", &options);
        let stops = load_timing_tag(&mut timing, TimingTag::Stops, "2=-0.5", &options);
        let delays = load_timing_tag(&mut timing, TimingTag::Delays, "2=-0.5", &options);
        assert_eq!((bpms, stops, delays), (2, 1, 0));
        assert!(timing.has_negative_bpms());
        assert!((timing.stop_at_row(96) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn time_signatures_and_tickcounts_are_range_checked() {
        let (timing, added) = load(TimingTag::TimeSignatures, "0=4=4,-1=3=4,4=0=4,8=7=8,12=3");
        assert_eq!(added, 2);
        assert_eq!(timing.time_signatures().get(1).map(|s| s.numerator), Some(7));

        let (_, added) = load(TimingTag::Tickcounts, "0=4,4=0,8=48,12=49");
        assert_eq!(added, 2);
    }

    #[test]
    fn speeds_labels_and_combos() {
        let (timing, added) = load(TimingTag::Speeds, "0=1.000=0.000=0,16=2.5=1.5=1,32=0.5=4");
        assert_eq!(added, 3);
        let speeds = timing.speeds().as_slice();
        assert_eq!(speeds[1].unit, SpeedUnit::Seconds);
        assert_eq!(speeds[2].unit, SpeedUnit::Beats);

        let (timing, added) = load(TimingTag::Labels, "0=Song Start,32=a=b,64=");
        assert_eq!(added, 2);
        assert_eq!(timing.labels().get(1).map(|l| l.label.as_str()), Some("a=b"));

        let (timing, added) = load(TimingTag::Combos, "0=1,16=3=3");
        assert_eq!(added, 2);
        assert_eq!(timing.combos().get(1).map(|c| c.combo), Some(3));
    }

    #[test]
    fn writer_uses_six_decimals_in_list_order() {
        let mut timing = TimingData::new();
        load_timing_tag(&mut timing, TimingTag::Bpms, "0=120,4.5=240", &TimingOptions::default());
        load_timing_tag(&mut timing, TimingTag::TimeSignatures, "0=3=4", &TimingOptions::default());
        load_timing_tag(&mut timing, TimingTag::Speeds, "1=2=0.5=1", &TimingOptions::default());
        assert_eq!(
            write_timing_tag(&timing, TimingTag::Bpms),
            "0.000000=120.000000,4.500000=240.000000"
        );
        assert_eq!(write_timing_tag(&timing, TimingTag::TimeSignatures), "0.000000=3=4");
        assert_eq!(
            write_timing_tag(&timing, TimingTag::Speeds),
            "1.000000=2.000000=0.500000=1"
        );
        assert_eq!(write_timing_tag(&timing, TimingTag::Stops), "");
    }

    #[test]
    fn written_stops_keep_full_precision() {
        let (timing, _) = load(TimingTag::Stops, "1.000000=0.123456");
        let text = write_timing_tag(&timing, TimingTag::Stops);
        assert_eq!(text, "1.000000=0.123456");
        let (reloaded, added) = load(TimingTag::Stops, &text);
        assert_eq!(added, 1);
        assert!((reloaded.stop_at_row(48) - 0.123_456).abs() < 1e-12);
    }

    #[test]
    fn written_tags_load_back() {
        let (mut timing, _) = load(TimingTag::Stops, "1=0.25,3=1.5");
        load_timing_tag(&mut timing, TimingTag::Warps, "8=2", &TimingOptions::default());
        let mut reloaded = TimingData::new();
        for tag in [TimingTag::Stops, TimingTag::Warps] {
            let text = write_timing_tag(&timing, tag);
            load_timing_tag(&mut reloaded, tag, &text, &TimingOptions::default());
        }
        assert_eq!(reloaded.stops(), timing.stops());
        assert_eq!(reloaded.warps(), timing.warps());
    }

    #[test]
    fn scripting_entries_use_six_decimals() {
        let (mut timing, _) = load(TimingTag::Stops, "1=0.25");
        timing.tidy_up();
        assert_eq!(timing.stop_entries(), vec!["1.000000=0.250000".to_string()]);
        assert_eq!(timing.bpm_entries(), vec!["0.000000=60.000000".to_string()]);
        assert_eq!(timing.label_entries(), vec!["0.000000=Song Start".to_string()]);
        assert!(timing.delay_entries().is_empty());
    }
}
