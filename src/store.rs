use crate::rows::{beat_to_note_row, lrint, note_row_to_beat};
use crate::segments::{Segment, SpanSegment, StateSegment};

/// What a `set_*` call did to a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    Updated,
    Removed,
    Unchanged,
}

/// Segments of one kind, sorted by row.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentList<T> {
    items: Vec<T>,
}

impl<T> Default for SegmentList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Segment> SegmentList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline(always)]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[inline(always)]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub(crate) fn first_mut(&mut self) -> Option<&mut T> {
        self.items.first_mut()
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Inserts after every segment starting at or before `seg`'s row, so
    /// segments on the same row keep the order they were added in.
    pub fn add(&mut self, seg: T) {
        let at = self.items.partition_point(|s| s.row() <= seg.row());
        self.items.insert(at, seg);
    }

    /// Index of the segment in effect at `row`.
    ///
    /// Lists are right-open intervals: segment `i` covers
    /// `[row_i, row_{i+1})`. A row before the first segment resolves to the
    /// first segment. `None` only for an empty list.
    pub fn index_at_row(&self, row: i32) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.partition_point(|s| s.row() <= row).saturating_sub(1))
    }

    pub fn segment_at_row(&self, row: i32) -> Option<&T> {
        self.index_at_row(row).map(|i| &self.items[i])
    }

    /// Like `segment_at_row`, for lists that tidy-up keeps non-empty.
    ///
    /// # Panics
    /// If the list is empty.
    pub fn at_row(&self, row: i32) -> &T {
        let Some(seg) = self.segment_at_row(row) else {
            panic!("lookup at row {row} into an empty segment list; tidy_up was not run");
        };
        seg
    }

    pub fn find_exact(&self, row: i32) -> Option<&T> {
        self.position_exact(row).map(|i| &self.items[i])
    }

    #[inline(always)]
    fn position_exact(&self, row: i32) -> Option<usize> {
        let at = self.items.partition_point(|s| s.row() < row);
        (at < self.items.len() && self.items[at].row() == row).then_some(at)
    }

    /// Sets a span segment at its exact row: replaces, inserts, or (when
    /// `valid` is false) deletes. Neighbours are never merged.
    pub fn set_span(&mut self, seg: T, valid: bool) -> SetOutcome {
        match (self.position_exact(seg.row()), valid) {
            (Some(i), true) => {
                self.items[i] = seg;
                SetOutcome::Updated
            }
            (Some(i), false) => {
                self.items.remove(i);
                SetOutcome::Removed
            }
            (None, true) => {
                self.add(seg);
                SetOutcome::Inserted
            }
            (None, false) => SetOutcome::Unchanged,
        }
    }

    /// Shifts every segment at or after `from` by `delta` rows.
    pub fn shift_rows_from(&mut self, from: i32, delta: i32) {
        for seg in &mut self.items {
            if seg.row() >= from {
                seg.set_row(seg.row() + delta);
            }
        }
    }

    /// Drops segments in `[start, end)` and pulls later ones back by
    /// `end - start`.
    pub fn delete_rows(&mut self, start: i32, end: i32) {
        let count = end - start;
        self.items.retain(|s| s.row() < start || s.row() >= end);
        for seg in &mut self.items {
            if seg.row() >= end {
                seg.set_row(seg.row() - count);
            }
        }
    }

    /// Remaps rows for a region scaled by `scale` between `start` and `end`.
    pub fn scale_rows(&mut self, scale: f64, start: i32, end: i32) {
        for seg in &mut self.items {
            seg.set_row(scale_row(seg.row(), scale, start, end));
        }
    }
}

impl<T: StateSegment> SegmentList<T> {
    /// Sets the value in effect from `seg`'s row, keeping the list free of
    /// adjacent segments that carry the same value.
    pub fn set_state(&mut self, seg: T) -> SetOutcome {
        let row = seg.row();
        let i = self.items.partition_point(|s| s.row() < row);
        let matches_prev = i > 0 && self.items[i - 1].same_value(&seg);

        let outcome = if i == self.items.len() || self.items[i].row() != row {
            if matches_prev {
                return SetOutcome::Unchanged;
            }
            self.items.insert(i, seg);
            SetOutcome::Inserted
        } else if matches_prev {
            self.items.remove(i);
            SetOutcome::Removed
        } else {
            self.items[i] = seg;
            SetOutcome::Updated
        };

        let next = if outcome == SetOutcome::Removed { i } else { i + 1 };
        self.drop_repeat_at(next);
        outcome
    }

    /// Removes the segment at `index`, keeping neighbours free of repeats.
    pub(crate) fn remove_state(&mut self, index: usize) -> T {
        let removed = self.items.remove(index);
        self.drop_repeat_at(index);
        removed
    }

    // The segment after an edit may now repeat the value before it.
    fn drop_repeat_at(&mut self, next: usize) {
        if next > 0
            && next < self.items.len()
            && self.items[next - 1].same_value(&self.items[next])
        {
            self.items.remove(next);
        }
    }

    /// Drops every segment that repeats the value of the one before it.
    pub fn merge_adjacent(&mut self) {
        self.items.dedup_by(|next, prev| prev.same_value(next));
    }

    /// Whether any two neighbouring segments carry the same value.
    pub fn has_adjacent_duplicates(&self) -> bool {
        self.items.windows(2).any(|w| w[0].same_value(&w[1]))
    }
}

impl<T: SpanSegment> SegmentList<T> {
    /// `scale_rows` for span segments: both ends of each span are remapped
    /// and the length follows them.
    pub fn scale_spans(&mut self, scale: f64, start: i32, end: i32) {
        for seg in &mut self.items {
            let seg_start = seg.row();
            let seg_end = seg_start + beat_to_note_row(seg.length_beats());
            let new_start = scale_row(seg_start, scale, start, end);
            if seg_end >= start {
                let new_end = scale_row(seg_end, scale, start, end);
                seg.set_length_beats(note_row_to_beat(new_end - new_start));
            }
            seg.set_row(new_start);
        }
    }

    /// Whether `row` falls inside any span starting at or before it. Spans
    /// may overlap, so an earlier long span can cover a row past a later
    /// short one.
    pub fn covers_row(&self, row: i32) -> bool {
        let started = self.items.partition_point(|s| s.row() <= row);
        self.items[..started]
            .iter()
            .any(|s| row < s.row() + beat_to_note_row(s.length_beats()))
    }
}

impl<'a, T> IntoIterator for &'a SegmentList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[inline(always)]
pub(crate) fn scale_row(row: i32, scale: f64, start: i32, end: i32) -> i32 {
    if row < start {
        row
    } else if row > end {
        row + lrint(f64::from(end - start) * (scale - 1.0))
    } else {
        lrint(f64::from(row - start) * scale) + start
    }
}
