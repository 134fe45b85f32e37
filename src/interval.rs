use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::duration::IsoDuration;
use crate::error::{Result, TimeError};

/// Where an instant falls relative to an [`Interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    Covered,
    AtOrAfterEnd,
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Interval {
    /// Build an interval from a grid `validTime` value such as
    /// `2024-06-01T14:00:00+00:00/PT3H`: an RFC 3339 start and an ISO-8601 duration separated
    /// by a single `/`.
    pub fn from_valid_time(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        let (Some(start), Some(duration), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TimeError::MalformedTimeRange(s.to_string()));
        };

        let start =
            DateTime::parse_from_rfc3339(start).map_err(|source| TimeError::InvalidInstant {
                input: start.to_string(),
                source,
            })?;
        let duration: IsoDuration = duration.parse()?;
        let end = duration
            .apply(start)
            .ok_or_else(|| TimeError::EndOutOfRange(s.to_string()))?;

        Ok(Interval { start, end })
    }

    pub fn classify(&self, t: DateTime<FixedOffset>) -> Position {
        if t < self.start {
            Position::Before
        } else if t >= self.end {
            Position::AtOrAfterEnd
        } else {
            Position::Covered
        }
    }

    pub fn covers(&self, t: DateTime<FixedOffset>) -> bool {
        self.classify(t) == Position::Covered
    }
}

impl FromStr for Interval {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self> {
        Interval::from_valid_time(s)
    }
}
