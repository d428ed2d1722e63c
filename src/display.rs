use crate::segments::{Segment, SpeedSegment, SpeedUnit};
use crate::timing::TimingData;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollPrefix {
    beat: f64,
    cum_displayed: f64,
    ratio: f64,
}

/// Interpolation window of one speed segment, in no-offset seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRuntime {
    pub start_time: f64,
    pub end_time: f64,
    pub prev_ratio: f64,
}

impl TimingData {
    fn scroll_prefixes(&self) -> Vec<ScrollPrefix> {
        let mut prefixes = Vec::with_capacity(self.scrolls.len());
        let mut cum_displayed = 0.0_f64;
        let mut last_real_beat = 0.0_f64;
        let mut last_ratio = 1.0_f64;
        for seg in &self.scrolls {
            let beat = seg.beat();
            cum_displayed += (beat - last_real_beat) * last_ratio;
            prefixes.push(ScrollPrefix {
                beat,
                cum_displayed,
                ratio: seg.ratio,
            });
            last_real_beat = beat;
            last_ratio = seg.ratio;
        }
        prefixes
    }

    /// Beat position as drawn on the receptor track once scroll segments
    /// have stretched or squashed the beats before it.
    pub fn displayed_beat(&self, beat: f64) -> f64 {
        let prefixes = self.scroll_prefixes();
        let Some(first) = prefixes.first() else {
            return beat;
        };
        if beat < first.beat {
            return beat;
        }
        let idx = prefixes.partition_point(|p| p.beat <= beat);
        let p = prefixes[idx.saturating_sub(1)];
        p.cum_displayed + (beat - p.beat) * p.ratio
    }

    /// Start/end window over which the speed segment at `index` eases in
    /// from the previous ratio.
    pub fn speed_runtime(&self, index: usize) -> Option<SpeedRuntime> {
        let seg = self.speeds.get(index)?;
        let prev_ratio = index
            .checked_sub(1)
            .and_then(|i| self.speeds.get(i))
            .map_or(1.0, |prev| prev.ratio);
        Some(self.runtime_for(seg, prev_ratio))
    }

    fn runtime_for(&self, seg: &SpeedSegment, prev_ratio: f64) -> SpeedRuntime {
        let start_time = self.elapsed_time_from_beat_no_offset(seg.beat());
        let end_time = if seg.wait <= 0.0 {
            start_time
        } else {
            match seg.unit {
                SpeedUnit::Seconds => start_time + seg.wait,
                SpeedUnit::Beats => self.elapsed_time_from_beat_no_offset(seg.beat() + seg.wait),
            }
        };
        SpeedRuntime {
            start_time,
            end_time,
            prev_ratio,
        }
    }

    /// Scroll-speed multiplier at `beat` and no-offset `time`, linearly
    /// easing from the previous segment's ratio across the wait window.
    pub fn speed_percent(&self, beat: f64, time: f64) -> f64 {
        let speeds = self.speeds.as_slice();
        let pos = speeds.partition_point(|seg| seg.beat() <= beat);
        if pos == 0 {
            return 1.0;
        }
        let i = pos - 1;
        let seg = speeds[i];
        if seg.wait <= 0.0 {
            return seg.ratio;
        }
        let prev_ratio = if i > 0 { speeds[i - 1].ratio } else { 1.0 };
        let rt = self.runtime_for(&seg, prev_ratio);

        if time >= rt.end_time {
            return seg.ratio;
        }
        if time < rt.start_time {
            return rt.prev_ratio;
        }
        let progress = (time - rt.start_time) / (rt.end_time - rt.start_time);
        rt.prev_ratio + (seg.ratio - rt.prev_ratio) * progress
    }
}
