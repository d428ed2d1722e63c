use crate::rows::{beat_to_note_row, note_row_to_beat};
use crate::segments::{PauseKind, Segment, SpanSegment};
use crate::timing::TimingData;

/// Where the sweep landed for a given elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeatInfo {
    pub beat: f64,
    pub bps: f64,
    pub is_in_freeze: bool,
    pub is_in_delay: bool,
    /// Row of the last warp passed on the way, if any.
    pub warp_begin_row: Option<i32>,
    pub warp_destination: f64,
}

// Declaration order is tie priority on a shared row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimingEvent {
    WarpDest,
    Tempo,
    Pause(PauseKind),
    Marker,
    Warp,
}

#[derive(Debug, Clone, Copy, Default)]
struct SweepCursor {
    tempo_idx: usize,
    stop_idx: usize,
    delay_idx: usize,
    warp_idx: usize,
    last_row: i32,
    last_time: f64,
    warp_destination: f64,
    is_warping: bool,
}

impl SweepCursor {
    #[inline(always)]
    fn time_to(&self, row: i32, bps: f64) -> f64 {
        if self.is_warping {
            0.0
        } else {
            note_row_to_beat(row - self.last_row) / bps
        }
    }

    #[inline(always)]
    fn pause_idx(&mut self, kind: PauseKind) -> &mut usize {
        match kind {
            PauseKind::Stop => &mut self.stop_idx,
            PauseKind::Delay => &mut self.delay_idx,
        }
    }
}

impl TimingData {
    fn sweep_start(&self) -> (SweepCursor, f64) {
        let cursor = SweepCursor {
            last_time: -self.beat0_offset_seconds,
            ..SweepCursor::default()
        };
        (cursor, self.tempos.at_row(0).bps)
    }

    /// Next event for the sweep. Candidates are checked in priority order
    /// and only a strictly earlier row displaces the current pick:
    /// warp destination, tempo, delay, marker, stop, warp start.
    fn find_event(&self, cursor: &SweepCursor, marker_row: Option<i32>) -> Option<(i32, TimingEvent)> {
        let mut best: Option<(i32, TimingEvent)> = None;
        let mut consider = |row: i32, event: TimingEvent| {
            if best.is_none_or(|(best_row, _)| row < best_row) {
                best = Some((row, event));
            }
        };

        if cursor.is_warping {
            consider(beat_to_note_row(cursor.warp_destination), TimingEvent::WarpDest);
        }
        if let Some(seg) = self.tempos.get(cursor.tempo_idx) {
            consider(seg.row, TimingEvent::Tempo);
        }
        if let Some(seg) = self.delays.get(cursor.delay_idx) {
            consider(seg.row, TimingEvent::Pause(PauseKind::Delay));
        }
        if let Some(row) = marker_row {
            consider(row, TimingEvent::Marker);
        }
        if let Some(seg) = self.stops.get(cursor.stop_idx) {
            consider(seg.row, TimingEvent::Pause(PauseKind::Stop));
        }
        if let Some(seg) = self.warps.get(cursor.warp_idx) {
            consider(seg.row, TimingEvent::Warp);
        }
        best
    }

    fn enter_warp(&self, cursor: &mut SweepCursor) {
        let warp = self.warps.as_slice()[cursor.warp_idx];
        cursor.is_warping = true;
        cursor.warp_destination = cursor.warp_destination.max(warp.end_beat());
        cursor.warp_idx += 1;
    }

    /// Beat, tempo and pause/warp state at `elapsed` seconds, ignoring the
    /// global offset.
    ///
    /// # Panics
    /// If there are no tempo segments (see [`TimingData::tidy_up`]).
    pub fn beat_and_bps_from_elapsed_time_no_offset(&self, elapsed: f64) -> BeatInfo {
        let (mut cursor, mut bps) = self.sweep_start();
        let mut info = BeatInfo::default();

        while let Some((row, event)) = self.find_event(&cursor, None) {
            let next_time = cursor.last_time + cursor.time_to(row, bps);
            if elapsed < next_time {
                break;
            }
            cursor.last_time = next_time;

            match event {
                TimingEvent::WarpDest => cursor.is_warping = false,
                TimingEvent::Tempo => {
                    bps = self.tempos.as_slice()[cursor.tempo_idx].bps;
                    cursor.tempo_idx += 1;
                }
                TimingEvent::Pause(kind) => {
                    let idx = cursor.pause_idx(kind);
                    let pause = self.pauses(kind).as_slice()[*idx];
                    *idx += 1;
                    let pause_end = cursor.last_time + pause.seconds;
                    if elapsed < pause_end {
                        return BeatInfo {
                            beat: pause.beat(),
                            bps,
                            is_in_freeze: kind == PauseKind::Stop,
                            is_in_delay: kind == PauseKind::Delay,
                            ..info
                        };
                    }
                    cursor.last_time = pause_end;
                }
                TimingEvent::Warp => {
                    self.enter_warp(&mut cursor);
                    info.warp_begin_row = Some(row);
                    info.warp_destination = cursor.warp_destination;
                }
                TimingEvent::Marker => {}
            }
            cursor.last_row = row;
        }

        info.beat = note_row_to_beat(cursor.last_row) + (elapsed - cursor.last_time) * bps;
        info.bps = bps;
        info
    }

    /// `beat_and_bps_from_elapsed_time_no_offset` after shifting `elapsed`
    /// by the global audio offset.
    pub fn beat_and_bps_from_elapsed_time(&self, elapsed: f64, global_offset: f64) -> BeatInfo {
        self.beat_and_bps_from_elapsed_time_no_offset(elapsed + global_offset)
    }

    #[inline(always)]
    pub fn beat_from_elapsed_time_no_offset(&self, elapsed: f64) -> f64 {
        self.beat_and_bps_from_elapsed_time_no_offset(elapsed).beat
    }

    #[inline(always)]
    pub fn beat_from_elapsed_time(&self, elapsed: f64, global_offset: f64) -> f64 {
        self.beat_and_bps_from_elapsed_time(elapsed, global_offset).beat
    }

    /// Seconds from the start of the music to `beat`, ignoring the global
    /// offset. Delays on the beat's row count; stops on it do not.
    ///
    /// # Panics
    /// If there are no tempo segments (see [`TimingData::tidy_up`]).
    pub fn elapsed_time_from_beat_no_offset(&self, beat: f64) -> f64 {
        let (mut cursor, mut bps) = self.sweep_start();
        let marker_row = beat_to_note_row(beat);

        while let Some((row, event)) = self.find_event(&cursor, Some(marker_row)) {
            cursor.last_time += cursor.time_to(row, bps);

            match event {
                TimingEvent::WarpDest => cursor.is_warping = false,
                TimingEvent::Tempo => {
                    bps = self.tempos.as_slice()[cursor.tempo_idx].bps;
                    cursor.tempo_idx += 1;
                }
                TimingEvent::Pause(kind) => {
                    let idx = cursor.pause_idx(kind);
                    let seconds = self.pauses(kind).as_slice()[*idx].seconds;
                    *idx += 1;
                    cursor.last_time += seconds;
                }
                TimingEvent::Marker => return cursor.last_time,
                TimingEvent::Warp => self.enter_warp(&mut cursor),
            }
            cursor.last_row = row;
        }
        cursor.last_time
    }

    #[inline(always)]
    pub fn elapsed_time_from_beat(&self, beat: f64, global_offset: f64) -> f64 {
        self.elapsed_time_from_beat_no_offset(beat) - global_offset
    }
}
