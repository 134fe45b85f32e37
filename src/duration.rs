use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Days, Duration, Months, TimeZone};
use regex::Regex;

use crate::error::{Result, TimeError};

/// A calendar + clock delta parsed from an ISO-8601 duration such as `P1DT6H`.
///
/// Only unsigned integer components are supported. The week form `P<n>W` is stored as
/// `7 * n` days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoDuration {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        ^P
        (?:(?P<years>[0-9]+)Y)?
        (?:(?P<months>[0-9]+)M)?
        (?:(?P<days>[0-9]+)D)?
        (?:T
            (?:(?P<hours>[0-9]+)H)?
            (?:(?P<minutes>[0-9]+)M)?
            (?:(?P<seconds>[0-9]+)S)?
        )?
        $
        |
        ^P(?P<weeks>[0-9]+)W$
    "#,
    )
    .unwrap()
});

/// Parse an ISO-8601 duration. Equivalent to `s.parse::<IsoDuration>()`.
pub fn parse_duration(s: &str) -> Result<IsoDuration> {
    s.parse()
}

impl FromStr for IsoDuration {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = DURATION_RE
            .captures(s)
            .ok_or_else(|| TimeError::InvalidDuration {
                input: s.to_string(),
                field: None,
            })?;

        // Parse a single named component, absent components count as zero.
        let field = |name: &'static str| -> Result<u32> {
            match caps.name(name) {
                None => Ok(0),
                Some(m) => m.as_str().parse().map_err(|_| TimeError::InvalidDuration {
                    input: s.to_string(),
                    field: Some(name),
                }),
            }
        };

        if caps.name("weeks").is_some() {
            let days = field("weeks")?
                .checked_mul(7)
                .ok_or_else(|| TimeError::InvalidDuration {
                    input: s.to_string(),
                    field: Some("weeks"),
                })?;
            return Ok(IsoDuration {
                days,
                ..IsoDuration::default()
            });
        }

        Ok(IsoDuration {
            years: field("years")?,
            months: field("months")?,
            days: field("days")?,
            hours: field("hours")?,
            minutes: field("minutes")?,
            seconds: field("seconds")?,
        })
    }
}

impl IsoDuration {
    pub fn is_zero(&self) -> bool {
        *self == IsoDuration::default()
    }

    /// Advance `t` by this duration.
    ///
    /// Calendar components are applied first and in order (years, months, days) against the
    /// nominal date, so month-length and leap-year rollover follow chrono's calendar rules (a
    /// month added to Jan 31 lands on the last day of February). Hours, minutes and seconds
    /// are then added as fixed offsets. Returns `None` if the result is not representable.
    pub fn apply<Tz: TimeZone>(&self, t: DateTime<Tz>) -> Option<DateTime<Tz>> {
        t.checked_add_months(Months::new(self.years.checked_mul(12)?))?
            .checked_add_months(Months::new(self.months))?
            .checked_add_days(Days::new(self.days.into()))?
            .checked_add_signed(Duration::try_hours(self.hours.into())?)?
            .checked_add_signed(Duration::try_minutes(self.minutes.into())?)?
            .checked_add_signed(Duration::try_seconds(self.seconds.into())?)
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        for (value, designator) in [(self.years, 'Y'), (self.months, 'M'), (self.days, 'D')] {
            if value > 0 {
                write!(f, "{value}{designator}")?;
            }
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            f.write_str("T")?;
            for (value, designator) in [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')]
            {
                if value > 0 {
                    write!(f, "{value}{designator}")?;
                }
            }
        }
        Ok(())
    }
}
