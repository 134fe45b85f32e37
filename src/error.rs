//! Errors raised while turning grid time encodings into intervals and hourly rows.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error(
        "'{input}' is not a valid ISO-8601 duration{}",
        field.map(|f| format!(" ({f} value out of range)")).unwrap_or_default()
    )]
    InvalidDuration {
        input: String,
        /// Set when the grammar matched but a component did not fit.
        field: Option<&'static str>,
    },

    #[error("malformed time + duration: {0}")]
    MalformedTimeRange(String),

    #[error("could not parse time '{input}': {source}")]
    InvalidInstant {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("end of time range '{0}' is out of range")]
    EndOutOfRange(String),

    #[error("invalid validTime '{valid_time}'")]
    InvalidValidTime {
        valid_time: String,
        #[source]
        source: Box<TimeError>,
    },

    #[error("display start time {start} is after end time {end}")]
    InvertedRange {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

pub type Result<T> = std::result::Result<T, TimeError>;
