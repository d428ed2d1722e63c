use crate::rows::lrint;
use crate::segments::TempoSegment;
use crate::timing::TimingData;

/// Runs `$body` once per segment list, binding each list to `$list`.
/// The `@points` form skips warps and fakes; `@states` visits only the
/// lists whose segments hold a value until the next one.
macro_rules! for_each_list {
    (@points $timing:expr, $list:ident => $body:expr) => {{
        { let $list = &mut $timing.tempos; $body; }
        { let $list = &mut $timing.stops; $body; }
        { let $list = &mut $timing.delays; $body; }
        { let $list = &mut $timing.time_signatures; $body; }
        { let $list = &mut $timing.tickcounts; $body; }
        { let $list = &mut $timing.combos; $body; }
        { let $list = &mut $timing.labels; $body; }
        { let $list = &mut $timing.speeds; $body; }
        { let $list = &mut $timing.scrolls; $body; }
    }};
    (@states $timing:expr, $list:ident => $body:expr) => {{
        { let $list = &mut $timing.tempos; $body; }
        { let $list = &mut $timing.time_signatures; $body; }
        { let $list = &mut $timing.tickcounts; $body; }
        { let $list = &mut $timing.combos; $body; }
        { let $list = &mut $timing.labels; $body; }
        { let $list = &mut $timing.speeds; $body; }
        { let $list = &mut $timing.scrolls; $body; }
    }};
    ($timing:expr, $list:ident => $body:expr) => {{
        for_each_list!(@points $timing, $list => $body);
        { let $list = &mut $timing.warps; $body; }
        { let $list = &mut $timing.fakes; $body; }
    }};
}

impl TimingData {
    /// Stretches (`scale > 1`) or squashes the rows `start..=end`, moving
    /// every later segment by the change in length.
    ///
    /// With `adjust_bpm`, tempos inside the new region are multiplied by
    /// `scale` and the tempos at `start` and the new end are pinned so the
    /// music outside the region keeps its timing.
    ///
    /// # Panics
    /// If `scale <= 0`, `start < 0` or `start >= end`.
    pub fn scale_region(&mut self, scale: f64, start: i32, end: i32, adjust_bpm: bool) {
        assert!(scale > 0.0, "scale_region: scale must be positive, got {scale}");
        assert!(start >= 0, "scale_region: negative start row {start}");
        assert!(start < end, "scale_region: empty range {start}..{end}");

        for_each_list!(@points self, list => list.scale_rows(scale, start, end));
        self.warps.scale_spans(scale, start, end);
        self.fakes.scale_spans(scale, start, end);

        if adjust_bpm {
            let new_end = lrint(f64::from(end - start) * scale) + start;
            let end_bps = self.tempos.at_row(new_end).bps;
            let start_bps = self.tempos.at_row(start).bps * scale;
            for seg in self.tempos.items_mut() {
                if seg.row > start && seg.row < new_end {
                    seg.bps *= scale;
                }
            }
            self.pin_tempo(start, start_bps);
            self.pin_tempo(new_end, end_bps);
        }
        self.merge_state_runs();
    }

    /// Opens `count` empty rows at `start`, pushing every segment at or
    /// after it down.
    ///
    /// # Panics
    /// If `start == 0` and there are no tempo segments.
    pub fn insert_rows(&mut self, start: i32, count: i32) {
        for_each_list!(self, list => list.shift_rows_from(start, count));

        if start == 0 {
            let Some(first) = self.tempos.first_mut() else {
                panic!("insert_rows at row 0 with no tempo segments");
            };
            first.row = 0;
        }
    }

    /// Removes the rows `start..start + count` and every segment on them,
    /// pulling later segments up. The tempo in effect where the removed
    /// range ended carries on from `start`.
    pub fn delete_rows(&mut self, start: i32, count: i32) {
        let end = start + count;
        let carried_bpm = self.tempos.segment_at_row(end).map(TempoSegment::bpm);

        for_each_list!(self, list => list.delete_rows(start, end));

        if let Some(bpm) = carried_bpm {
            self.set_bpm_at_row(start, bpm);
        }
        self.merge_state_runs();
    }

    /// Multiplies the tempo over `start..end` by `factor`, splitting tempo
    /// segments that cross either edge.
    pub fn multiply_bpm_in_range(&mut self, start: i32, end: i32, factor: f64) {
        if start >= end || self.tempos.is_empty() {
            return;
        }
        if factor < 0.0 {
            self.mark_negative_bpms();
        }

        let start_bps = self.tempos.at_row(start).bps;
        let end_bps = self.tempos.at_row(end).bps;
        self.pin_tempo(start, start_bps);
        self.pin_tempo(end, end_bps);
        for seg in self.tempos.items_mut() {
            if (start..end).contains(&seg.row) {
                seg.bps *= factor;
            }
        }
        // Splits that turned out redundant fold back here.
        self.tempos.merge_adjacent();
    }

    /// Puts `bps` in effect from exactly `row` without merging neighbours.
    fn pin_tempo(&mut self, row: i32, bps: f64) {
        match self.tempos.iter().position(|t| t.row == row) {
            Some(i) => self.tempos.items_mut()[i].bps = bps,
            None => self.tempos.add(TempoSegment { row, bps }),
        }
    }

    fn merge_state_runs(&mut self) {
        for_each_list!(@states self, list => list.merge_adjacent());
    }
}
