use crate::timing::TimingData;

/// Timing a chart plays with: the song's own, or a per-chart override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartTiming {
    own: Option<TimingData>,
}

impl ChartTiming {
    /// A chart carrying its own timing from the start.
    pub fn with_own(timing: TimingData) -> Self {
        Self { own: Some(timing) }
    }

    #[inline(always)]
    pub fn resolve<'a>(&'a self, song: &'a TimingData) -> &'a TimingData {
        self.own.as_ref().unwrap_or(song)
    }

    #[inline(always)]
    pub fn has_own_timing(&self) -> bool {
        self.own.is_some()
    }

    /// Gives the chart its own copy of the song timing to edit, if it
    /// does not have one yet.
    pub fn make_own(&mut self, song: &TimingData) -> &mut TimingData {
        self.own.get_or_insert_with(|| song.clone())
    }

    /// Drops the override so the chart follows the song again.
    pub fn clear(&mut self) {
        self.own = None;
    }
}
