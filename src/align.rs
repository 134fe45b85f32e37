//! Alignment of per-property interval series onto a common hourly clock.
//!
//! Each requested property gets its own [`PropertyCursor`] that walks forward through the
//! property's sorted points as the clock advances. A cursor never moves backwards, so one
//! alignment run touches every point at most once regardless of how the clock and the point
//! intervals interleave.

use chrono::{DateTime, Duration, FixedOffset};

use crate::error::{Result, TimeError};
use crate::interval::Position;
use crate::series::{PropertySeries, WeatherPoint};
use crate::units::format_value;

/// Truncate to the whole hour in absolute time (independent of the UTC offset).
pub fn truncate_to_hour(t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let into_hour = Duration::seconds(t.timestamp().rem_euclid(3600))
        + Duration::nanoseconds(t.timestamp_subsec_nanos().into());
    t - into_hour
}

/// Inclusive range of whole hours `[start, end]` stepped one hour at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyClock {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl HourlyClock {
    /// Create a clock from `start` to `end`, both truncated to the hour.
    ///
    /// Fails with [`TimeError::InvertedRange`] if the truncated start is after the truncated
    /// end. Equal endpoints give a clock with a single hour.
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        let start = truncate_to_hour(start);
        let end = truncate_to_hour(end);
        if start > end {
            return Err(TimeError::InvertedRange { start, end });
        }
        Ok(HourlyClock { start, end })
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Number of hourly rows, counting both ends.
    pub fn hour_count(&self) -> usize {
        ((self.end - self.start).num_hours() + 1) as usize
    }

    pub fn hours(&self) -> impl Iterator<Item = DateTime<FixedOffset>> {
        let end = self.end;
        std::iter::successors(Some(self.start), |&h| h.checked_add_signed(Duration::hours(1)))
            .take_while(move |&h| h <= end)
    }
}

/// State of a cursor relative to the last hour it was advanced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The current point starts after the hour; a later hour may reach it.
    Scanning,
    /// The current point covers the hour.
    Covering,
    /// Every point has ended.
    Exhausted,
}

/// Forward-only position in one property's sorted points.
#[derive(Debug, Clone)]
pub struct PropertyCursor<'a> {
    points: &'a [WeatherPoint],
    position: usize,
    state: CursorState,
}

impl<'a> PropertyCursor<'a> {
    pub fn new(points: &'a [WeatherPoint]) -> Self {
        let state = if points.is_empty() {
            CursorState::Exhausted
        } else {
            CursorState::Scanning
        };
        PropertyCursor {
            points,
            position: 0,
            state,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Advance to `hour` and return the point covering it, if any.
    ///
    /// Points that ended at or before `hour` are skipped for good. Hours must be passed in
    /// non-decreasing order for the result to be meaningful.
    pub fn advance(&mut self, hour: DateTime<FixedOffset>) -> Option<&'a WeatherPoint> {
        while let Some(point) = self.points.get(self.position) {
            match point.interval.classify(hour) {
                Position::Covered => {
                    self.state = CursorState::Covering;
                    return Some(point);
                }
                Position::Before => {
                    self.state = CursorState::Scanning;
                    return None;
                }
                Position::AtOrAfterEnd => self.position += 1,
            }
        }
        self.state = CursorState::Exhausted;
        None
    }
}

/// One table cell: a value with its unit token, or the no-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value { value: f64, unit: String },
    NoData,
}

impl Cell {
    pub const NO_DATA: &'static str = "No Data";

    /// Render the cell, converting to imperial units if requested.
    pub fn format(&self, imperial: bool) -> String {
        match self {
            Cell::Value { value, unit } => format_value(*value, unit, imperial),
            Cell::NoData => Cell::NO_DATA.to_string(),
        }
    }
}

/// One clock hour with a cell per requested property, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub at: DateTime<FixedOffset>,
    pub cells: Vec<Cell>,
}

/// Align `series` onto every hour of `clock`.
///
/// Produces one row per clock hour. For each property the cell holds the value of the point
/// whose interval covers the hour, or [`Cell::NoData`] when none does. Each series must be
/// sorted by start with non-overlapping intervals, as [`PropertySeries::new`] guarantees for
/// well-formed grid data.
pub fn align(clock: &HourlyClock, series: &[PropertySeries]) -> Vec<Row> {
    let mut cursors: Vec<PropertyCursor> = series
        .iter()
        .map(|s| PropertyCursor::new(&s.points))
        .collect();

    clock
        .hours()
        .map(|hour| {
            let cells = cursors
                .iter_mut()
                .map(|cursor| match cursor.advance(hour) {
                    Some(point) => Cell::Value {
                        value: point.value,
                        unit: point.unit.clone(),
                    },
                    None => Cell::NoData,
                })
                .collect();
            Row { at: hour, cells }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn hour(h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, h, 0, 0)
            .unwrap()
    }

    fn point(valid_time: &str, value: f64) -> WeatherPoint {
        WeatherPoint {
            interval: valid_time.parse().unwrap(),
            value,
            unit: "wmoUnit:degF".to_string(),
        }
    }

    fn values(rows: &[Row], column: usize) -> Vec<Option<f64>> {
        rows.iter()
            .map(|r| match &r.cells[column] {
                Cell::Value { value, .. } => Some(*value),
                Cell::NoData => None,
            })
            .collect()
    }

    #[test]
    fn temperature_with_gap() {
        let temperature = PropertySeries::new(
            "temperature",
            vec![
                point("2024-06-01T10:00:00+00:00/PT1H", 50.0),
                point("2024-06-01T12:00:00+00:00/PT1H", 55.0),
            ],
        );
        let clock = HourlyClock::new(hour(10), hour(13)).unwrap();
        let rows = align(&clock, &[temperature]);

        let times: Vec<_> = rows.iter().map(|r| r.at).collect();
        assert_eq!(times, [hour(10), hour(11), hour(12), hour(13)]);
        assert_eq!(values(&rows, 0), [Some(50.0), None, Some(55.0), None]);
        assert_eq!(rows[1].cells[0].format(false), "No Data");
    }

    #[test]
    fn long_interval_covers_several_hours() {
        let s = PropertySeries::new(
            "skyCover",
            vec![point("2024-06-01T09:00:00+00:00/PT3H", 20.0)],
        );
        let rows = align(&HourlyClock::new(hour(8), hour(12)).unwrap(), &[s]);
        assert_eq!(
            values(&rows, 0),
            [None, Some(20.0), Some(20.0), Some(20.0), None]
        );
    }

    #[test]
    fn stale_points_are_skipped() {
        let s = PropertySeries::new(
            "temperature",
            vec![
                point("2024-06-01T00:00:00+00:00/PT1H", 1.0),
                point("2024-06-01T01:00:00+00:00/PT1H", 2.0),
                point("2024-06-01T02:00:00+00:00/PT4H", 3.0),
                point("2024-06-01T06:00:00+00:00/PT1H", 4.0),
            ],
        );
        let rows = align(&HourlyClock::new(hour(5), hour(7)).unwrap(), &[s]);
        assert_eq!(values(&rows, 0), [Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn independent_columns() {
        let temperature = PropertySeries::new(
            "temperature",
            vec![
                point("2024-06-01T10:00:00+00:00/PT1H", 50.0),
                point("2024-06-01T11:00:00+00:00/PT1H", 51.0),
                point("2024-06-01T12:00:00+00:00/PT1H", 52.0),
            ],
        );
        let wind = PropertySeries::new(
            "windSpeed",
            vec![point("2024-06-01T11:00:00+00:00/PT6H", 7.0)],
        );
        let empty = PropertySeries::new("dewpoint", vec![]);
        let rows = align(
            &HourlyClock::new(hour(10), hour(13)).unwrap(),
            &[temperature, wind, empty],
        );
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.cells.len() == 3));
        assert_eq!(values(&rows, 0), [Some(50.0), Some(51.0), Some(52.0), None]);
        assert_eq!(values(&rows, 1), [None, Some(7.0), Some(7.0), Some(7.0)]);
        assert_eq!(values(&rows, 2), [None; 4]);
    }

    #[test]
    fn no_properties() {
        let rows = align(&HourlyClock::new(hour(1), hour(3)).unwrap(), &[]);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn cursor_states() {
        let points = [
            point("2024-06-01T10:00:00+00:00/PT1H", 1.0),
            point("2024-06-01T12:00:00+00:00/PT1H", 2.0),
        ];
        let mut cursor = PropertyCursor::new(&points);
        assert_eq!(cursor.state(), CursorState::Scanning);

        assert_eq!(cursor.advance(hour(9)), None);
        assert_eq!((cursor.state(), cursor.position()), (CursorState::Scanning, 0));

        assert_eq!(cursor.advance(hour(10)).map(|p| p.value), Some(1.0));
        assert_eq!((cursor.state(), cursor.position()), (CursorState::Covering, 0));

        assert_eq!(cursor.advance(hour(11)), None);
        assert_eq!((cursor.state(), cursor.position()), (CursorState::Scanning, 1));

        assert_eq!(cursor.advance(hour(12)).map(|p| p.value), Some(2.0));
        assert_eq!(cursor.advance(hour(13)), None);
        assert_eq!((cursor.state(), cursor.position()), (CursorState::Exhausted, 2));

        assert_eq!(PropertyCursor::new(&[]).state(), CursorState::Exhausted);
    }

    #[test]
    fn clock_bounds() {
        let err = HourlyClock::new(hour(5), hour(4)).unwrap_err();
        assert!(matches!(err, TimeError::InvertedRange { .. }));

        let single = HourlyClock::new(hour(5), hour(5)).unwrap();
        assert_eq!(single.hour_count(), 1);
        assert_eq!(single.hours().collect::<Vec<_>>(), [hour(5)]);

        // start and end inside the same hour truncate to a single hour
        let clock = HourlyClock::new(
            hour(5) + Duration::minutes(40),
            hour(5) + Duration::minutes(10),
        )
        .unwrap();
        assert_eq!(clock.hour_count(), 1);
        assert_eq!(clock.start(), hour(5));
    }

    #[test]
    fn truncation_is_absolute() {
        let t = FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, 10, 45, 12)
            .unwrap();
        let truncated = truncate_to_hour(t);
        assert_eq!(truncated.timestamp() % 3600, 0);
        assert_eq!(truncated.offset(), t.offset());
        // 10:45:12+05:30 is 05:15:12Z
        assert_eq!(truncated, hour(5));
    }

    fn hourly_points(layout: Vec<(u32, u32)>) -> Vec<WeatherPoint> {
        // (gap, length) pairs laid out back to back from midnight
        let mut start = 0;
        layout
            .into_iter()
            .enumerate()
            .map(|(i, (gap, len))| {
                start += gap;
                let p = WeatherPoint {
                    interval: crate::interval::Interval {
                        start: hour(0) + Duration::hours(start.into()),
                        end: hour(0) + Duration::hours((start + len).into()),
                    },
                    value: i as f64,
                    unit: "wmoUnit:percent".to_string(),
                };
                start += len;
                p
            })
            .collect()
    }

    proptest! {
        #[test]
        fn cursor_never_rewinds(
            layout in prop::collection::vec((0u32..3, 1u32..4), 0..20),
            from in 0i64..30,
            span in 0i64..40,
        ) {
            let points = hourly_points(layout);
            let clock = HourlyClock::new(
                hour(0) + Duration::hours(from),
                hour(0) + Duration::hours(from + span),
            ).unwrap();
            let mut cursor = PropertyCursor::new(&points);
            let mut last = 0;
            for h in clock.hours() {
                let found = cursor.advance(h);
                prop_assert!(cursor.position() >= last);
                last = cursor.position();
                // the cursor answer agrees with a brute-force search
                let expected = points.iter().find(|p| p.interval.covers(h));
                prop_assert_eq!(found, expected);
            }
        }

        #[test]
        fn one_row_per_hour(from in 0i64..1000, span in 0i64..500) {
            let clock = HourlyClock::new(
                hour(0) + Duration::hours(from),
                hour(0) + Duration::hours(from + span),
            ).unwrap();
            let rows = align(&clock, &[]);
            prop_assert_eq!(rows.len() as i64, span + 1);
            prop_assert_eq!(clock.hour_count() as i64, span + 1);
        }
    }
}
