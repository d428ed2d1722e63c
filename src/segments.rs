use crate::rows::{BEATS_PER_MEASURE, ROWS_PER_BEAT, note_row_to_beat};

pub const DEFAULT_BPM: f64 = 60.0;
pub const DEFAULT_TICKCOUNT: i32 = 2;
pub const DEFAULT_COMBO: i32 = 1;
pub const DEFAULT_LABEL: &str = "Song Start";

/// Tempo values closer than this (in beats per second) are treated as equal.
pub const BPS_EPSILON: f64 = 1e-5;

/// A timing segment anchored at a note row.
pub trait Segment {
    fn row(&self) -> i32;
    fn set_row(&mut self, row: i32);

    #[inline(always)]
    fn beat(&self) -> f64 {
        note_row_to_beat(self.row())
    }
}

/// A segment whose payload holds until the next segment of the same kind.
pub trait StateSegment: Segment {
    /// Whether `other` would put the same value into effect.
    fn same_value(&self, other: &Self) -> bool;
}

/// A segment describing a span of beats starting at its row.
pub trait SpanSegment: Segment {
    fn length_beats(&self) -> f64;
    fn set_length_beats(&mut self, length: f64);

    #[inline(always)]
    fn end_beat(&self) -> f64 {
        self.beat() + self.length_beats()
    }
}

macro_rules! impl_segment {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Segment for $ty {
                #[inline(always)]
                fn row(&self) -> i32 {
                    self.row
                }

                #[inline(always)]
                fn set_row(&mut self, row: i32) {
                    self.row = row;
                }
            }
        )*
    };
}

macro_rules! impl_span_segment {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SpanSegment for $ty {
                #[inline(always)]
                fn length_beats(&self) -> f64 {
                    self.length_beats
                }

                #[inline(always)]
                fn set_length_beats(&mut self, length: f64) {
                    self.length_beats = length;
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub row: i32,
    pub bps: f64,
}

impl TempoSegment {
    pub fn from_bpm(row: i32, bpm: f64) -> Self {
        Self { row, bps: bpm / 60.0 }
    }

    #[inline(always)]
    pub fn bpm(&self) -> f64 {
        self.bps * 60.0
    }
}

impl Default for TempoSegment {
    fn default() -> Self {
        Self::from_bpm(0, DEFAULT_BPM)
    }
}

impl StateSegment for TempoSegment {
    fn same_value(&self, other: &Self) -> bool {
        (self.bps - other.bps).abs() < BPS_EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseKind {
    /// Happens after the row's notes are judged.
    Stop,
    /// Happens before the row's notes become judgable.
    Delay,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PauseSegment {
    pub row: i32,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WarpSegment {
    pub row: i32,
    pub length_beats: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FakeSegment {
    pub row: i32,
    pub length_beats: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureSegment {
    pub row: i32,
    pub numerator: i32,
    pub denominator: i32,
}

impl TimeSignatureSegment {
    /// Note rows in one measure: 4 beats scaled by numerator/denominator.
    #[inline(always)]
    pub fn rows_per_measure(&self) -> i32 {
        ROWS_PER_BEAT * BEATS_PER_MEASURE * self.numerator / self.denominator
    }
}

impl Default for TimeSignatureSegment {
    fn default() -> Self {
        Self { row: 0, numerator: 4, denominator: 4 }
    }
}

impl StateSegment for TimeSignatureSegment {
    fn same_value(&self, other: &Self) -> bool {
        self.numerator == other.numerator && self.denominator == other.denominator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickcountSegment {
    pub row: i32,
    pub ticks: i32,
}

impl Default for TickcountSegment {
    fn default() -> Self {
        Self { row: 0, ticks: DEFAULT_TICKCOUNT }
    }
}

impl StateSegment for TickcountSegment {
    fn same_value(&self, other: &Self) -> bool {
        self.ticks == other.ticks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboSegment {
    pub row: i32,
    pub combo: i32,
}

impl Default for ComboSegment {
    fn default() -> Self {
        Self { row: 0, combo: DEFAULT_COMBO }
    }
}

impl StateSegment for ComboSegment {
    fn same_value(&self, other: &Self) -> bool {
        self.combo == other.combo
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSegment {
    pub row: i32,
    pub label: String,
}

impl Default for LabelSegment {
    fn default() -> Self {
        Self { row: 0, label: DEFAULT_LABEL.to_string() }
    }
}

impl StateSegment for LabelSegment {
    fn same_value(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    Beats,
    Seconds,
}

impl SpeedUnit {
    #[inline(always)]
    pub fn from_flag(flag: i32) -> Self {
        if flag == 1 { Self::Seconds } else { Self::Beats }
    }

    #[inline(always)]
    pub fn flag(self) -> i32 {
        match self {
            Self::Beats => 0,
            Self::Seconds => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSegment {
    pub row: i32,
    /// Scroll-speed multiplier; 1.0 is 100%.
    pub ratio: f64,
    /// Transition time from the previous ratio, in `unit`s.
    pub wait: f64,
    pub unit: SpeedUnit,
}

impl Default for SpeedSegment {
    fn default() -> Self {
        Self { row: 0, ratio: 1.0, wait: 0.0, unit: SpeedUnit::Beats }
    }
}

// Only the ratio decides redundancy; wait and unit ride along.
impl StateSegment for SpeedSegment {
    fn same_value(&self, other: &Self) -> bool {
        self.ratio == other.ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSegment {
    pub row: i32,
    pub ratio: f64,
}

impl Default for ScrollSegment {
    fn default() -> Self {
        Self { row: 0, ratio: 1.0 }
    }
}

impl StateSegment for ScrollSegment {
    fn same_value(&self, other: &Self) -> bool {
        self.ratio == other.ratio
    }
}

impl_segment!(
    TempoSegment,
    PauseSegment,
    WarpSegment,
    FakeSegment,
    TimeSignatureSegment,
    TickcountSegment,
    ComboSegment,
    LabelSegment,
    SpeedSegment,
    ScrollSegment,
);

impl_span_segment!(WarpSegment, FakeSegment);
