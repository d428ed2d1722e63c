use std::cmp::Ordering;

pub const ROWS_PER_BEAT: i32 = 48;
pub const BEATS_PER_MEASURE: i32 = 4;

#[inline(always)]
pub fn note_row_to_beat(row: i32) -> f64 {
    f64::from(row) / f64::from(ROWS_PER_BEAT)
}

#[inline(always)]
pub fn beat_to_note_row(beat: f64) -> i32 {
    (beat * f64::from(ROWS_PER_BEAT)).round() as i32
}

/// Round-half-to-even, matching C `lrint` under the default rounding mode.
#[inline(always)]
pub fn lrint(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    if v.fract() == 0.0 {
        return v as i32;
    }
    let floor = v.floor();
    let frac = v - floor;
    let fi = floor as i32;
    match frac.partial_cmp(&0.5) {
        Some(Ordering::Less) => fi,
        Some(Ordering::Greater) => fi + 1,
        _ => {
            if (fi & 1) == 0 {
                fi
            } else {
                fi + 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_beat_round_trip_is_exact() {
        for row in [-480, -1, 0, 1, 7, 47, 48, 49, 192, 12_345, 1_000_000] {
            assert_eq!(beat_to_note_row(note_row_to_beat(row)), row);
        }
    }

    #[test]
    fn beat_to_row_rounds_to_nearest() {
        assert_eq!(beat_to_note_row(0.01), 0);
        assert_eq!(beat_to_note_row(0.02), 1);
        assert_eq!(beat_to_note_row(4.0), 192);
    }

    #[test]
    fn lrint_breaks_ties_to_even() {
        assert_eq!(lrint(0.5), 0);
        assert_eq!(lrint(1.5), 2);
        assert_eq!(lrint(2.5), 2);
        assert_eq!(lrint(-0.5), 0);
        assert_eq!(lrint(-1.5), -2);
        assert_eq!(lrint(2.4), 2);
        assert_eq!(lrint(2.6), 3);
        assert_eq!(lrint(f64::NAN), 0);
    }
}
