use crate::rows::{ROWS_PER_BEAT, beat_to_note_row, note_row_to_beat};
use crate::segments::{
    ComboSegment, DEFAULT_BPM, FakeSegment, LabelSegment, PauseKind, PauseSegment,
    ScrollSegment, SpeedSegment, SpeedUnit, TempoSegment, TickcountSegment,
    TimeSignatureSegment, WarpSegment,
};
use crate::store::{SegmentList, SetOutcome};

/// Measure, beat-in-measure and leftover rows for a note row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasurePosition {
    pub measure: i32,
    pub beat: i32,
    pub remainder: i32,
}

/// Beat/time mapping for a song or a chart.
///
/// Segments are appended while loading, edited through the `set_*` calls and
/// queried during play. Run [`TimingData::tidy_up`] once loading or editing is
/// done: lookups into the tempo, time signature, tickcount, combo, label and
/// speed lists assume they are non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingData {
    pub(crate) beat0_offset_seconds: f64,
    pub(crate) has_negative_bpms: bool,
    pub(crate) tempos: SegmentList<TempoSegment>,
    pub(crate) stops: SegmentList<PauseSegment>,
    pub(crate) delays: SegmentList<PauseSegment>,
    pub(crate) warps: SegmentList<WarpSegment>,
    pub(crate) time_signatures: SegmentList<TimeSignatureSegment>,
    pub(crate) tickcounts: SegmentList<TickcountSegment>,
    pub(crate) combos: SegmentList<ComboSegment>,
    pub(crate) labels: SegmentList<LabelSegment>,
    pub(crate) speeds: SegmentList<SpeedSegment>,
    pub(crate) scrolls: SegmentList<ScrollSegment>,
    pub(crate) fakes: SegmentList<FakeSegment>,
}

impl TimingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(beat0_offset_seconds: f64) -> Self {
        Self {
            beat0_offset_seconds,
            ..Self::default()
        }
    }

    #[inline(always)]
    pub fn beat0_offset_seconds(&self) -> f64 {
        self.beat0_offset_seconds
    }

    pub fn set_beat0_offset_seconds(&mut self, seconds: f64) {
        self.beat0_offset_seconds = seconds;
    }

    #[inline(always)]
    pub fn tempos(&self) -> &SegmentList<TempoSegment> {
        &self.tempos
    }

    #[inline(always)]
    pub fn stops(&self) -> &SegmentList<PauseSegment> {
        &self.stops
    }

    #[inline(always)]
    pub fn delays(&self) -> &SegmentList<PauseSegment> {
        &self.delays
    }

    #[inline(always)]
    pub fn pauses(&self, kind: PauseKind) -> &SegmentList<PauseSegment> {
        match kind {
            PauseKind::Stop => &self.stops,
            PauseKind::Delay => &self.delays,
        }
    }

    #[inline(always)]
    pub fn warps(&self) -> &SegmentList<WarpSegment> {
        &self.warps
    }

    #[inline(always)]
    pub fn time_signatures(&self) -> &SegmentList<TimeSignatureSegment> {
        &self.time_signatures
    }

    #[inline(always)]
    pub fn tickcounts(&self) -> &SegmentList<TickcountSegment> {
        &self.tickcounts
    }

    #[inline(always)]
    pub fn combos(&self) -> &SegmentList<ComboSegment> {
        &self.combos
    }

    #[inline(always)]
    pub fn labels(&self) -> &SegmentList<LabelSegment> {
        &self.labels
    }

    #[inline(always)]
    pub fn speeds(&self) -> &SegmentList<SpeedSegment> {
        &self.speeds
    }

    #[inline(always)]
    pub fn scrolls(&self) -> &SegmentList<ScrollSegment> {
        &self.scrolls
    }

    #[inline(always)]
    pub fn fakes(&self) -> &SegmentList<FakeSegment> {
        &self.fakes
    }

    fn pauses_mut(&mut self, kind: PauseKind) -> &mut SegmentList<PauseSegment> {
        match kind {
            PauseKind::Stop => &mut self.stops,
            PauseKind::Delay => &mut self.delays,
        }
    }

    // ----- Appending (loaders) -----

    pub fn add_tempo(&mut self, seg: TempoSegment) {
        if seg.bps < 0.0 {
            self.has_negative_bpms = true;
        }
        self.tempos.add(seg);
    }

    pub fn add_pause(&mut self, kind: PauseKind, seg: PauseSegment) {
        self.pauses_mut(kind).add(seg);
    }

    pub fn add_warp(&mut self, seg: WarpSegment) {
        self.warps.add(seg);
    }

    pub fn add_time_signature(&mut self, seg: TimeSignatureSegment) {
        self.time_signatures.add(seg);
    }

    pub fn add_tickcount(&mut self, seg: TickcountSegment) {
        self.tickcounts.add(seg);
    }

    pub fn add_combo(&mut self, seg: ComboSegment) {
        self.combos.add(seg);
    }

    pub fn add_label(&mut self, seg: LabelSegment) {
        self.labels.add(seg);
    }

    pub fn add_speed(&mut self, seg: SpeedSegment) {
        self.speeds.add(seg);
    }

    pub fn add_scroll(&mut self, seg: ScrollSegment) {
        self.scrolls.add(seg);
    }

    pub fn add_fake(&mut self, seg: FakeSegment) {
        self.fakes.add(seg);
    }

    // ----- Editing -----

    pub fn set_bpm_at_row(&mut self, row: i32, bpm: f64) -> SetOutcome {
        if bpm < 0.0 {
            self.has_negative_bpms = true;
        }
        self.tempos.set_state(TempoSegment::from_bpm(row, bpm))
    }

    pub fn set_bpm_at_beat(&mut self, beat: f64, bpm: f64) -> SetOutcome {
        self.set_bpm_at_row(beat_to_note_row(beat), bpm)
    }

    /// A stop and a delay may share a row; each kind is keyed separately.
    /// Non-positive `seconds` removes the pause.
    pub fn set_pause_at_row(&mut self, row: i32, seconds: f64, kind: PauseKind) -> SetOutcome {
        self.pauses_mut(kind)
            .set_span(PauseSegment { row, seconds }, seconds > 0.0)
    }

    pub fn set_stop_at_row(&mut self, row: i32, seconds: f64) -> SetOutcome {
        self.set_pause_at_row(row, seconds, PauseKind::Stop)
    }

    pub fn set_delay_at_row(&mut self, row: i32, seconds: f64) -> SetOutcome {
        self.set_pause_at_row(row, seconds, PauseKind::Delay)
    }

    pub fn set_stop_at_beat(&mut self, beat: f64, seconds: f64) -> SetOutcome {
        self.set_stop_at_row(beat_to_note_row(beat), seconds)
    }

    pub fn set_delay_at_beat(&mut self, beat: f64, seconds: f64) -> SetOutcome {
        self.set_delay_at_row(beat_to_note_row(beat), seconds)
    }

    /// Warps on row 0 or with a non-positive length are removed.
    pub fn set_warp_at_row(&mut self, row: i32, length_beats: f64) -> SetOutcome {
        self.warps.set_span(
            WarpSegment { row, length_beats },
            row > 0 && length_beats > 0.0,
        )
    }

    pub fn set_warp_at_beat(&mut self, beat: f64, length_beats: f64) -> SetOutcome {
        self.set_warp_at_row(beat_to_note_row(beat), length_beats)
    }

    pub fn set_fake_at_row(&mut self, row: i32, length_beats: f64) -> SetOutcome {
        self.fakes.set_span(
            FakeSegment { row, length_beats },
            row > 0 && length_beats > 0.0,
        )
    }

    pub fn set_fake_at_beat(&mut self, beat: f64, length_beats: f64) -> SetOutcome {
        self.set_fake_at_row(beat_to_note_row(beat), length_beats)
    }

    pub fn set_time_signature_at_row(
        &mut self,
        row: i32,
        numerator: i32,
        denominator: i32,
    ) -> SetOutcome {
        self.time_signatures.set_state(TimeSignatureSegment {
            row,
            numerator,
            denominator,
        })
    }

    pub fn set_time_signature_at_beat(
        &mut self,
        beat: f64,
        numerator: i32,
        denominator: i32,
    ) -> SetOutcome {
        self.set_time_signature_at_row(beat_to_note_row(beat), numerator, denominator)
    }

    pub fn set_time_signature_numerator_at_row(&mut self, row: i32, numerator: i32) -> SetOutcome {
        let current = self.time_signature_or_default(row);
        self.set_time_signature_at_row(row, numerator, current.denominator)
    }

    pub fn set_time_signature_denominator_at_row(
        &mut self,
        row: i32,
        denominator: i32,
    ) -> SetOutcome {
        let current = self.time_signature_or_default(row);
        self.set_time_signature_at_row(row, current.numerator, denominator)
    }

    pub fn set_tickcount_at_row(&mut self, row: i32, ticks: i32) -> SetOutcome {
        self.tickcounts.set_state(TickcountSegment { row, ticks })
    }

    pub fn set_tickcount_at_beat(&mut self, beat: f64, ticks: i32) -> SetOutcome {
        self.set_tickcount_at_row(beat_to_note_row(beat), ticks)
    }

    pub fn set_combo_at_row(&mut self, row: i32, combo: i32) -> SetOutcome {
        self.combos.set_state(ComboSegment { row, combo })
    }

    pub fn set_combo_at_beat(&mut self, beat: f64, combo: i32) -> SetOutcome {
        self.set_combo_at_row(beat_to_note_row(beat), combo)
    }

    /// An empty label clears a label sitting exactly on `row`.
    pub fn set_label_at_row(&mut self, row: i32, label: &str) -> SetOutcome {
        if label.is_empty() {
            let at = self.labels.index_at_row(row);
            if let Some(i) = at.filter(|&i| i > 0 && self.labels.as_slice()[i].row == row) {
                self.labels.remove_state(i);
                return SetOutcome::Removed;
            }
        }
        self.labels.set_state(LabelSegment {
            row,
            label: label.to_string(),
        })
    }

    pub fn set_label_at_beat(&mut self, beat: f64, label: &str) -> SetOutcome {
        self.set_label_at_row(beat_to_note_row(beat), label)
    }

    pub fn set_speed_at_row(
        &mut self,
        row: i32,
        ratio: f64,
        wait: f64,
        unit: SpeedUnit,
    ) -> SetOutcome {
        self.speeds.set_state(SpeedSegment {
            row,
            ratio,
            wait,
            unit,
        })
    }

    pub fn set_speed_at_beat(
        &mut self,
        beat: f64,
        ratio: f64,
        wait: f64,
        unit: SpeedUnit,
    ) -> SetOutcome {
        self.set_speed_at_row(beat_to_note_row(beat), ratio, wait, unit)
    }

    pub fn set_speed_ratio_at_row(&mut self, row: i32, ratio: f64) -> SetOutcome {
        let current = self.speed_or_default(row);
        self.set_speed_at_row(row, ratio, current.wait, current.unit)
    }

    pub fn set_speed_wait_at_row(&mut self, row: i32, wait: f64) -> SetOutcome {
        let current = self.speed_or_default(row);
        self.set_speed_at_row(row, current.ratio, wait, current.unit)
    }

    pub fn set_speed_unit_at_row(&mut self, row: i32, unit: SpeedUnit) -> SetOutcome {
        let current = self.speed_or_default(row);
        self.set_speed_at_row(row, current.ratio, current.wait, unit)
    }

    pub fn set_scroll_at_row(&mut self, row: i32, ratio: f64) -> SetOutcome {
        self.scrolls.set_state(ScrollSegment { row, ratio })
    }

    pub fn set_scroll_at_beat(&mut self, beat: f64, ratio: f64) -> SetOutcome {
        self.set_scroll_at_row(beat_to_note_row(beat), ratio)
    }

    // ----- Lookups -----

    /// # Panics
    /// If the tempo list is empty (see [`TimingData::tidy_up`]).
    pub fn tempo_segment_at_row(&self, row: i32) -> TempoSegment {
        *self.tempos.at_row(row)
    }

    #[inline(always)]
    pub fn bpm_at_row(&self, row: i32) -> f64 {
        self.tempos.at_row(row).bpm()
    }

    #[inline(always)]
    pub fn bpm_at_beat(&self, beat: f64) -> f64 {
        self.bpm_at_row(beat_to_note_row(beat))
    }

    /// Seconds of the pause of `kind` sitting exactly on `row`, or 0.
    pub fn pause_at_row(&self, row: i32, kind: PauseKind) -> f64 {
        self.pauses(kind).find_exact(row).map_or(0.0, |p| p.seconds)
    }

    pub fn stop_at_row(&self, row: i32) -> f64 {
        self.pause_at_row(row, PauseKind::Stop)
    }

    pub fn delay_at_row(&self, row: i32) -> f64 {
        self.pause_at_row(row, PauseKind::Delay)
    }

    pub fn stop_at_beat(&self, beat: f64) -> f64 {
        self.stop_at_row(beat_to_note_row(beat))
    }

    pub fn delay_at_beat(&self, beat: f64) -> f64 {
        self.delay_at_row(beat_to_note_row(beat))
    }

    /// Length in beats of the warp starting exactly on `row`, or 0.
    pub fn warp_at_row(&self, row: i32) -> f64 {
        self.warps.find_exact(row).map_or(0.0, |w| w.length_beats)
    }

    pub fn warp_at_beat(&self, beat: f64) -> f64 {
        self.warp_at_row(beat_to_note_row(beat))
    }

    pub fn fake_at_row(&self, row: i32) -> f64 {
        self.fakes.find_exact(row).map_or(0.0, |f| f.length_beats)
    }

    pub fn fake_at_beat(&self, beat: f64) -> f64 {
        self.fake_at_row(beat_to_note_row(beat))
    }

    pub fn time_signature_at_row(&self, row: i32) -> TimeSignatureSegment {
        *self.time_signatures.at_row(row)
    }

    pub fn time_signature_at_beat(&self, beat: f64) -> TimeSignatureSegment {
        self.time_signature_at_row(beat_to_note_row(beat))
    }

    pub fn tickcount_at_row(&self, row: i32) -> i32 {
        self.tickcounts.at_row(row).ticks
    }

    pub fn tickcount_at_beat(&self, beat: f64) -> i32 {
        self.tickcount_at_row(beat_to_note_row(beat))
    }

    pub fn combo_at_row(&self, row: i32) -> i32 {
        self.combos.at_row(row).combo
    }

    pub fn combo_at_beat(&self, beat: f64) -> i32 {
        self.combo_at_row(beat_to_note_row(beat))
    }

    pub fn label_at_row(&self, row: i32) -> &str {
        &self.labels.at_row(row).label
    }

    pub fn label_at_beat(&self, beat: f64) -> &str {
        self.label_at_row(beat_to_note_row(beat))
    }

    pub fn speed_at_row(&self, row: i32) -> SpeedSegment {
        *self.speeds.at_row(row)
    }

    pub fn speed_at_beat(&self, beat: f64) -> SpeedSegment {
        self.speed_at_row(beat_to_note_row(beat))
    }

    /// Scroll ratio in effect at `row`; 1.0 when no scroll segment exists.
    pub fn scroll_at_row(&self, row: i32) -> f64 {
        self.scrolls.segment_at_row(row).map_or(1.0, |s| s.ratio)
    }

    pub fn scroll_at_beat(&self, beat: f64) -> f64 {
        self.scroll_at_row(beat_to_note_row(beat))
    }

    fn time_signature_or_default(&self, row: i32) -> TimeSignatureSegment {
        self.time_signatures
            .segment_at_row(row)
            .copied()
            .unwrap_or_default()
    }

    fn speed_or_default(&self, row: i32) -> SpeedSegment {
        self.speeds.segment_at_row(row).copied().unwrap_or_default()
    }

    /// A row inside a warp is skipped, unless a stop or delay sits on it.
    pub fn is_warp_at_row(&self, row: i32) -> bool {
        if !self.warps.covers_row(row) {
            return false;
        }
        self.stop_at_row(row) == 0.0 && self.delay_at_row(row) == 0.0
    }

    pub fn is_warp_at_beat(&self, beat: f64) -> bool {
        self.is_warp_at_row(beat_to_note_row(beat))
    }

    pub fn is_fake_at_row(&self, row: i32) -> bool {
        self.fakes.covers_row(row)
    }

    pub fn is_fake_at_beat(&self, beat: f64) -> bool {
        self.is_fake_at_row(beat_to_note_row(beat))
    }

    #[inline(always)]
    pub fn is_judgable_at_row(&self, row: i32) -> bool {
        !self.is_warp_at_row(row) && !self.is_fake_at_row(row)
    }

    pub fn is_judgable_at_beat(&self, beat: f64) -> bool {
        self.is_judgable_at_row(beat_to_note_row(beat))
    }

    /// Beat of the last label strictly before `row`, or `row`'s own beat.
    pub fn previous_label_beat_at_row(&self, row: i32) -> f64 {
        self.labels
            .iter()
            .take_while(|l| l.row < row)
            .last()
            .map_or_else(|| note_row_to_beat(row), |l| note_row_to_beat(l.row))
    }

    /// Beat of the first label strictly after `row`, or `row`'s own beat.
    pub fn next_label_beat_at_row(&self, row: i32) -> f64 {
        self.labels
            .iter()
            .find(|l| l.row > row)
            .map_or_else(|| note_row_to_beat(row), |l| note_row_to_beat(l.row))
    }

    pub fn does_label_exist(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.label == label)
    }

    /// # Panics
    /// If there are no time signatures (see [`TimingData::tidy_up`]).
    pub fn note_row_to_measure_and_beat(&self, row: i32) -> MeasurePosition {
        let sigs = self.time_signatures.as_slice();
        assert!(
            !sigs.is_empty(),
            "measure lookup with no time signatures; tidy_up was not run"
        );

        let mut measure = 0;
        for (i, seg) in sigs.iter().enumerate() {
            let rows_per_measure = seg.rows_per_measure().max(1);
            let next_row = sigs.get(i + 1).map(|next| next.row);
            if next_row.is_none_or(|next_row| row < next_row) {
                let rows_in = (row - seg.row).max(0);
                let in_measure = rows_in % rows_per_measure;
                return MeasurePosition {
                    measure: measure + rows_in / rows_per_measure,
                    beat: in_measure / ROWS_PER_BEAT,
                    remainder: in_measure % ROWS_PER_BEAT,
                };
            }
            // A partial measure at a signature change still counts as one.
            let span = next_row.unwrap_or(seg.row) - seg.row;
            measure += (span + rows_per_measure - 1) / rows_per_measure;
        }
        MeasurePosition::default()
    }

    // ----- Summaries -----

    #[inline(always)]
    pub fn has_bpm_changes(&self) -> bool {
        self.tempos.len() > 1
    }

    #[inline(always)]
    pub fn has_stops(&self) -> bool {
        !self.stops.is_empty()
    }

    #[inline(always)]
    pub fn has_delays(&self) -> bool {
        !self.delays.is_empty()
    }

    #[inline(always)]
    pub fn has_warps(&self) -> bool {
        !self.warps.is_empty()
    }

    #[inline(always)]
    pub fn has_fakes(&self) -> bool {
        !self.fakes.is_empty()
    }

    #[inline(always)]
    pub fn has_speed_changes(&self) -> bool {
        self.speeds.len() > 1
    }

    #[inline(always)]
    pub fn has_scroll_changes(&self) -> bool {
        self.scrolls.len() > 1
    }

    #[inline(always)]
    pub fn has_negative_bpms(&self) -> bool {
        self.has_negative_bpms
    }

    pub(crate) fn mark_negative_bpms(&mut self) {
        self.has_negative_bpms = true;
    }

    pub fn bpms(&self) -> Vec<f64> {
        self.tempos.iter().map(TempoSegment::bpm).collect()
    }

    /// `(min, max)` BPM over every tempo segment; `(f64::MAX, 0.0)` when
    /// there are none.
    pub fn actual_bpm(&self) -> (f64, f64) {
        self.tempos
            .iter()
            .map(TempoSegment::bpm)
            .fold((f64::MAX, 0.0), |(lo, hi), bpm| (lo.min(bpm), hi.max(bpm)))
    }

    // ----- Lifecycle -----

    /// Fills every list gameplay depends on with its default and pins the
    /// first tempo to row 0. Running it twice changes nothing further.
    pub fn tidy_up(&mut self) {
        if self.tempos.is_empty() {
            log::warn!("timing data has no BPM segments, default of {DEFAULT_BPM} provided");
            self.tempos.add(TempoSegment::default());
        }

        if let Some(first) = self.tempos.first_mut()
            && first.row != 0
        {
            log::debug!("moving first BPM segment from row {} to row 0", first.row);
            first.row = 0;
        }

        if self.time_signatures.is_empty() {
            self.time_signatures.add(TimeSignatureSegment::default());
        }
        // 2 ticks per beat matches the Pump Pro series.
        if self.tickcounts.is_empty() {
            self.tickcounts.add(TickcountSegment::default());
        }
        if self.combos.is_empty() {
            self.combos.add(ComboSegment::default());
        }
        if self.labels.is_empty() {
            self.labels.add(LabelSegment::default());
        }
        if self.speeds.is_empty() {
            self.speeds.add(SpeedSegment::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::Segment;

    fn tidied() -> TimingData {
        let mut timing = TimingData::new();
        timing.tidy_up();
        timing
    }

    #[test]
    fn tidy_up_on_empty_timing_provides_defaults() {
        let timing = tidied();
        assert!(!timing.has_bpm_changes());
        assert!((timing.bpm_at_row(0) - 60.0).abs() < 1e-9);
        assert_eq!(timing.time_signature_at_row(0), TimeSignatureSegment::default());
        assert_eq!(timing.tickcount_at_row(500), 2);
        assert_eq!(timing.combo_at_row(500), 1);
        assert_eq!(timing.label_at_row(0), "Song Start");
        assert!((timing.speed_at_row(0).ratio - 1.0).abs() < 1e-9);
        assert!(!timing.has_stops());
        assert!(!timing.has_warps());
    }

    #[test]
    fn tidy_up_is_idempotent() {
        let mut timing = TimingData::new();
        timing.add_tempo(TempoSegment::from_bpm(96, 150.0));
        timing.add_tempo(TempoSegment::from_bpm(192, 180.0));
        timing.add_label(LabelSegment { row: 48, label: "Intro".into() });
        timing.tidy_up();
        let once = timing.clone();
        timing.tidy_up();
        assert_eq!(timing, once);
        assert_eq!(timing.tempos().first().map(Segment::row), Some(0));
        assert_eq!(timing.labels().len(), 1);
    }

    #[test]
    fn set_bpm_merges_with_previous_segment() {
        let mut timing = tidied();
        assert_eq!(timing.set_bpm_at_row(192, 60.0), SetOutcome::Unchanged);
        assert_eq!(timing.set_bpm_at_row(192, 120.0), SetOutcome::Inserted);
        assert!(timing.has_bpm_changes());
        assert_eq!(timing.set_bpm_at_row(192, 60.000_000_1), SetOutcome::Removed);
        assert!(!timing.has_bpm_changes());
    }

    #[test]
    fn stop_and_delay_share_a_row_independently() {
        let mut timing = tidied();
        timing.set_stop_at_row(48, 0.5);
        timing.set_delay_at_row(48, 0.25);
        assert!((timing.stop_at_row(48) - 0.5).abs() < 1e-12);
        assert!((timing.delay_at_row(48) - 0.25).abs() < 1e-12);

        timing.set_stop_at_row(48, 0.0);
        assert_eq!(timing.stop_at_row(48), 0.0);
        assert!((timing.delay_at_row(48) - 0.25).abs() < 1e-12);

        assert_eq!(timing.set_delay_at_row(96, -1.0), SetOutcome::Unchanged);
        assert_eq!(timing.delays().len(), 1);
    }

    #[test]
    fn warps_and_fakes_reject_row_zero_and_non_positive_lengths() {
        let mut timing = tidied();
        assert_eq!(timing.set_warp_at_row(0, 4.0), SetOutcome::Unchanged);
        assert_eq!(timing.set_warp_at_row(48, 0.0), SetOutcome::Unchanged);
        assert_eq!(timing.set_warp_at_row(48, 2.0), SetOutcome::Inserted);
        assert_eq!(timing.set_warp_at_row(48, -1.0), SetOutcome::Removed);
        assert_eq!(timing.set_fake_at_row(0, 1.0), SetOutcome::Unchanged);
        assert_eq!(timing.set_fake_at_row(96, 1.0), SetOutcome::Inserted);
        assert!((timing.fake_at_row(96) - 1.0).abs() < 1e-12);
        assert!(!timing.has_warps());
        assert!(timing.has_fakes());
    }

    #[test]
    fn judgability_excludes_warps_and_fakes_but_not_stopped_rows() {
        let mut timing = tidied();
        timing.set_warp_at_row(48, 1.0);
        timing.set_fake_at_row(192, 1.0);
        timing.set_stop_at_row(72, 0.5);
        assert!(timing.is_judgable_at_row(47));
        assert!(!timing.is_judgable_at_row(48));
        assert!(timing.is_judgable_at_row(72));
        assert!(timing.is_judgable_at_row(96));
        assert!(!timing.is_judgable_at_beat(4.5));
        assert!(timing.is_judgable_at_beat(5.0));
    }

    #[test]
    fn rows_inside_an_outer_warp_stay_unjudgable() {
        let mut timing = tidied();
        timing.set_warp_at_row(48, 10.0);
        timing.set_warp_at_row(96, 1.0);
        assert!(timing.is_warp_at_row(200));
        assert!(!timing.is_judgable_at_row(200));
        assert!(timing.is_judgable_at_row(528));
        let skipped = timing.elapsed_time_from_beat_no_offset(note_row_to_beat(200));
        assert!((skipped - timing.elapsed_time_from_beat_no_offset(2.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_label_clears_existing_label() {
        let mut timing = tidied();
        timing.set_label_at_row(192, "Drop");
        assert!(timing.does_label_exist("Drop"));
        assert_eq!(timing.set_label_at_row(192, ""), SetOutcome::Removed);
        assert!(!timing.does_label_exist("Drop"));
        assert_eq!(timing.label_at_row(192), "Song Start");
    }

    #[test]
    fn clearing_a_label_merges_its_neighbours() {
        let mut timing = tidied();
        timing.set_label_at_row(96, "Verse");
        timing.set_label_at_row(192, "Song Start");
        assert_eq!(timing.labels().len(), 3);
        timing.set_label_at_row(96, "");
        assert_eq!(timing.labels().len(), 1);
        assert!(!timing.labels().has_adjacent_duplicates());
    }

    #[test]
    fn label_navigation() {
        let mut timing = tidied();
        timing.set_label_at_row(192, "Verse");
        timing.set_label_at_row(384, "Chorus");
        assert!((timing.previous_label_beat_at_row(300) - 4.0).abs() < 1e-12);
        assert!((timing.previous_label_beat_at_row(192)).abs() < 1e-12);
        assert!((timing.next_label_beat_at_row(192) - 8.0).abs() < 1e-12);
        assert!((timing.next_label_beat_at_row(400) - note_row_to_beat(400)).abs() < 1e-12);
    }

    #[test]
    fn partial_speed_setters_keep_other_fields() {
        let mut timing = tidied();
        timing.set_speed_at_row(96, 2.0, 1.5, SpeedUnit::Seconds);
        timing.set_speed_ratio_at_row(96, 3.0);
        let seg = timing.speed_at_row(96);
        assert!((seg.ratio - 3.0).abs() < 1e-12);
        assert!((seg.wait - 1.5).abs() < 1e-12);
        assert_eq!(seg.unit, SpeedUnit::Seconds);
        assert!(timing.has_speed_changes());
    }

    #[test]
    fn partial_time_signature_setters() {
        let mut timing = tidied();
        timing.set_time_signature_numerator_at_row(192, 3);
        assert_eq!(timing.time_signature_at_row(200).numerator, 3);
        assert_eq!(timing.time_signature_at_row(200).denominator, 4);
        timing.set_time_signature_denominator_at_row(192, 8);
        assert_eq!(timing.time_signature_at_row(200).denominator, 8);
    }

    #[test]
    fn measure_and_beat_follow_time_signatures() {
        let mut timing = tidied();
        // Two measures of 4/4, then 3/4.
        timing.set_time_signature_at_row(384, 3, 4);
        assert_eq!(
            timing.note_row_to_measure_and_beat(200),
            MeasurePosition { measure: 1, beat: 0, remainder: 8 }
        );
        assert_eq!(
            timing.note_row_to_measure_and_beat(384 + 144 + 50),
            MeasurePosition { measure: 3, beat: 1, remainder: 2 }
        );
    }

    #[test]
    fn actual_bpm_spans_all_segments() {
        let mut timing = tidied();
        timing.set_bpm_at_row(0, 150.0);
        timing.set_bpm_at_row(96, 75.0);
        timing.set_bpm_at_row(192, 300.0);
        assert_eq!(timing.actual_bpm(), (75.0, 300.0));
        assert_eq!(timing.bpms(), vec![150.0, 75.0, 300.0]);
    }
}
