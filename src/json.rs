use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::segments::{
    ComboSegment, FakeSegment, LabelSegment, PauseKind, PauseSegment, ScrollSegment,
    SpeedSegment, SpeedUnit, TempoSegment, TickcountSegment, TimeSignatureSegment, WarpSegment,
};
use crate::timing::TimingData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEntry {
    #[serde(rename = "StartRow")]
    pub start_row: i32,
    #[serde(rename = "BPS")]
    pub bps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PauseEntry {
    pub start_row: i32,
    pub stop_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpanEntry {
    pub start_row: i32,
    pub length_beats: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeSignatureEntry {
    pub start_row: i32,
    pub numerator: i32,
    pub denominator: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TickcountEntry {
    pub start_row: i32,
    pub ticks: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComboEntry {
    pub start_row: i32,
    pub combo: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelEntry {
    pub start_row: i32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpeedEntry {
    pub start_row: i32,
    pub ratio: f64,
    #[serde(default)]
    pub wait: f64,
    /// 0 = beats, 1 = seconds.
    #[serde(default)]
    pub unit: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrollEntry {
    pub start_row: i32,
    pub ratio: f64,
}

/// Serialized form of a [`TimingData`]. Every list is optional on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimingDocument {
    pub offset: f64,
    /// Set when a negative BPM was seen, even one the loader dropped.
    pub has_negative_bpms: bool,
    #[serde(rename = "BPMs")]
    pub bpms: Vec<TempoEntry>,
    pub stops: Vec<PauseEntry>,
    pub delays: Vec<PauseEntry>,
    pub warps: Vec<SpanEntry>,
    pub time_signatures: Vec<TimeSignatureEntry>,
    pub tickcounts: Vec<TickcountEntry>,
    pub combos: Vec<ComboEntry>,
    pub labels: Vec<LabelEntry>,
    pub speeds: Vec<SpeedEntry>,
    pub scrolls: Vec<ScrollEntry>,
    pub fakes: Vec<SpanEntry>,
}

fn pause_entries<'a>(list: impl IntoIterator<Item = &'a PauseSegment>) -> Vec<PauseEntry> {
    list.into_iter()
        .map(|p| PauseEntry {
            start_row: p.row,
            stop_seconds: p.seconds,
        })
        .collect()
}

impl From<&TimingData> for TimingDocument {
    fn from(timing: &TimingData) -> Self {
        Self {
            offset: timing.beat0_offset_seconds(),
            has_negative_bpms: timing.has_negative_bpms(),
            bpms: timing
                .tempos()
                .iter()
                .map(|t| TempoEntry {
                    start_row: t.row,
                    bps: t.bps,
                })
                .collect(),
            stops: pause_entries(timing.stops()),
            delays: pause_entries(timing.delays()),
            warps: timing
                .warps()
                .iter()
                .map(|w| SpanEntry {
                    start_row: w.row,
                    length_beats: w.length_beats,
                })
                .collect(),
            time_signatures: timing
                .time_signatures()
                .iter()
                .map(|s| TimeSignatureEntry {
                    start_row: s.row,
                    numerator: s.numerator,
                    denominator: s.denominator,
                })
                .collect(),
            tickcounts: timing
                .tickcounts()
                .iter()
                .map(|t| TickcountEntry {
                    start_row: t.row,
                    ticks: t.ticks,
                })
                .collect(),
            combos: timing
                .combos()
                .iter()
                .map(|c| ComboEntry {
                    start_row: c.row,
                    combo: c.combo,
                })
                .collect(),
            labels: timing
                .labels()
                .iter()
                .map(|l| LabelEntry {
                    start_row: l.row,
                    label: l.label.clone(),
                })
                .collect(),
            speeds: timing
                .speeds()
                .iter()
                .map(|s| SpeedEntry {
                    start_row: s.row,
                    ratio: s.ratio,
                    wait: s.wait,
                    unit: s.unit.flag(),
                })
                .collect(),
            scrolls: timing
                .scrolls()
                .iter()
                .map(|s| ScrollEntry {
                    start_row: s.row,
                    ratio: s.ratio,
                })
                .collect(),
            fakes: timing
                .fakes()
                .iter()
                .map(|f| SpanEntry {
                    start_row: f.row,
                    length_beats: f.length_beats,
                })
                .collect(),
        }
    }
}

impl TimingDocument {
    /// Rebuilds timing data by appending every entry, in document order.
    pub fn into_timing(self) -> TimingData {
        let mut timing = TimingData::with_offset(self.offset);
        if self.has_negative_bpms {
            timing.mark_negative_bpms();
        }
        for e in self.bpms {
            timing.add_tempo(TempoSegment {
                row: e.start_row,
                bps: e.bps,
            });
        }
        for (kind, entries) in [(PauseKind::Stop, self.stops), (PauseKind::Delay, self.delays)] {
            for e in entries {
                timing.add_pause(
                    kind,
                    PauseSegment {
                        row: e.start_row,
                        seconds: e.stop_seconds,
                    },
                );
            }
        }
        for e in self.warps {
            timing.add_warp(WarpSegment {
                row: e.start_row,
                length_beats: e.length_beats,
            });
        }
        for e in self.time_signatures {
            timing.add_time_signature(TimeSignatureSegment {
                row: e.start_row,
                numerator: e.numerator,
                denominator: e.denominator,
            });
        }
        for e in self.tickcounts {
            timing.add_tickcount(TickcountSegment {
                row: e.start_row,
                ticks: e.ticks,
            });
        }
        for e in self.combos {
            timing.add_combo(ComboSegment {
                row: e.start_row,
                combo: e.combo,
            });
        }
        for e in self.labels {
            timing.add_label(LabelSegment {
                row: e.start_row,
                label: e.label,
            });
        }
        for e in self.speeds {
            timing.add_speed(SpeedSegment {
                row: e.start_row,
                ratio: e.ratio,
                wait: e.wait,
                unit: SpeedUnit::from_flag(e.unit),
            });
        }
        for e in self.scrolls {
            timing.add_scroll(ScrollSegment {
                row: e.start_row,
                ratio: e.ratio,
            });
        }
        for e in self.fakes {
            timing.add_fake(FakeSegment {
                row: e.start_row,
                length_beats: e.length_beats,
            });
        }
        timing
    }
}

pub fn to_json(timing: &TimingData) -> Result<String> {
    Ok(serde_json::to_string_pretty(&TimingDocument::from(timing))?)
}

pub fn from_json(json: &str) -> Result<TimingData> {
    let doc: TimingDocument = serde_json::from_str(json)?;
    Ok(doc.into_timing())
}
