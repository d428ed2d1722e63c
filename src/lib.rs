pub mod chart;
pub mod convert;
pub mod display;
pub mod error;
pub mod json;
pub mod region;
pub mod rows;
pub mod segments;
pub mod store;
pub mod text;
pub mod timing;

// Re-export the primary data structures for library users
pub use chart::ChartTiming;
pub use convert::BeatInfo;
pub use error::{Result, TimingError};
pub use segments::PauseKind;
pub use store::{SegmentList, SetOutcome};
pub use text::TimingTag;
pub use timing::{MeasurePosition, TimingData};

use crate::text::load_timing_tag;

/// Options for loading timing data and converting with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimingOptions {
    /// Audio offset passed to the offset-aware conversions.
    pub global_offset_seconds: f64,
    /// Accept negative BPMs and negative stops when loading.
    pub quirks_mode: bool,
}

/// Builds tidied timing data from `(tag, value)` pairs such as
/// `("BPMS", "0.000=120.000")`. `OFFSET` sets the beat-0 offset.
pub fn load_timing<'a, I>(tags: I, options: &TimingOptions) -> Result<TimingData>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut timing = TimingData::new();
    for (name, value) in tags {
        if name.trim().trim_start_matches('#').eq_ignore_ascii_case("OFFSET") {
            match value.trim().parse::<f64>() {
                Ok(offset) => timing.set_beat0_offset_seconds(offset),
                Err(_) => log::warn!("invalid #OFFSET value \"{value}\", ignored"),
            }
            continue;
        }
        let tag: TimingTag = name.parse()?;
        let added = load_timing_tag(&mut timing, tag, value, options);
        log::debug!("#{tag}: {added} segments");
    }
    timing.tidy_up();
    Ok(timing)
}
