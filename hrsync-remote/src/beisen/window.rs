//! Time-window partitioning.
//!
//! The provider caps a single time-window query at `max_days`. Longer
//! non-incremental spans are cut into consecutive windows. The provider's stop
//! time is inclusive at day granularity, so each window after the first starts
//! one day after the previous window's end.

use chrono::{Duration, NaiveDateTime};

use crate::error::RemoteError;

/// A half-open `[start, end)` query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, RemoteError> {
        if start >= end {
            return Err(RemoteError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole days covered, truncated.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Windows to query for `[start, end)`.
///
/// Incremental fetches and spans of at most `max_days` whole days come back as
/// a single window.
pub fn split_windows(
    start: NaiveDateTime,
    end: NaiveDateTime,
    max_days: i64,
    incremental: bool,
) -> Result<Vec<TimeWindow>, RemoteError> {
    let whole = TimeWindow::new(start, end)?;
    if incremental || whole.days() <= max_days {
        return Ok(vec![whole]);
    }

    let span = Duration::days(max_days.max(1));
    let mut windows = Vec::new();
    let mut segment_start = start;
    while segment_start < end {
        let segment_end = (segment_start + span).min(end);
        windows.push(TimeWindow {
            start: segment_start,
            end: segment_end,
        });
        segment_start = segment_end + Duration::days(1);
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn day(n: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(n)
    }

    #[test]
    fn two_hundred_days_split_into_three_windows() {
        let windows = split_windows(day(0), day(200), 90, false).unwrap();
        let spans: Vec<_> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(
            spans,
            vec![
                (day(0), day(90)),
                (day(91), day(181)),
                (day(182), day(200)),
            ]
        );
    }

    #[rstest]
    #[case(30, 90)]
    #[case(90, 90)]
    #[case(365, 90)]
    #[case(1000, 7)]
    fn windows_cover_span_in_order(#[case] total: i64, #[case] max: i64) {
        let windows = split_windows(day(0), day(total), max, false).unwrap();
        assert_eq!(windows.first().unwrap().start, day(0));
        assert_eq!(windows.last().unwrap().end, day(total));
        for w in &windows {
            assert!(w.start < w.end);
            assert!(w.days() <= max);
        }
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
        }
    }

    #[test]
    fn incremental_never_splits() {
        let windows = split_windows(day(0), day(400), 90, true).unwrap();
        assert_eq!(windows.len(), 1);
    }

    #[rstest]
    #[case(day(5), day(5))]
    #[case(day(6), day(5))]
    fn empty_or_reversed_window_is_invalid(#[case] start: NaiveDateTime, #[case] end: NaiveDateTime) {
        let err = split_windows(start, end, 90, false).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidWindow { .. }));
    }
}
