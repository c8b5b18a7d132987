//! ISO-8601 duration parsing for item validity windows.
//!
//! # Responsibility
//! - Parse `PnYnMnWnDTnHnMnS` strings supplied by item catalogs.
//! - Project a duration onto a concrete end timestamp.
//!
//! # Invariants
//! - At least one component must be present; a bare `P` or trailing `T` is
//!   malformed.
//! - Years and months are applied on the UTC calendar, all other components
//!   as fixed spans.

use chrono::{DateTime, Duration, Months};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ISO_DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:[.,](\d+))?S)?)?$",
    )
    .expect("valid iso duration regex")
});

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// Parsed ISO-8601 duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoDuration {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    /// Seconds component in milliseconds (fractions below 1 ms are dropped).
    pub seconds_ms: u64,
}

impl IsoDuration {
    /// Returns `start_ms + self` or `None` when the result leaves the
    /// representable calendar range.
    pub fn end_from(&self, start_ms: i64) -> Option<i64> {
        let start = DateTime::from_timestamp_millis(start_ms)?;
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        let shifted = start.checked_add_months(Months::new(months))?;
        let fixed_ms = self.fixed_span_ms()?;
        let end = shifted.checked_add_signed(Duration::milliseconds(fixed_ms))?;
        Some(end.timestamp_millis())
    }

    fn fixed_span_ms(&self) -> Option<i64> {
        let seconds = i64::try_from(self.seconds_ms).ok()?;
        i64::from(self.weeks)
            .checked_mul(MS_PER_WEEK)?
            .checked_add(i64::from(self.days).checked_mul(MS_PER_DAY)?)?
            .checked_add(i64::from(self.hours).checked_mul(MS_PER_HOUR)?)?
            .checked_add(i64::from(self.minutes).checked_mul(MS_PER_MINUTE)?)?
            .checked_add(seconds)
    }
}

/// Duration parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    Empty,
    Malformed(String),
    Overflow(String),
}

impl Display for DurationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "duration is empty"),
            Self::Malformed(value) => write!(f, "malformed ISO-8601 duration `{value}`"),
            Self::Overflow(value) => write!(f, "ISO-8601 duration `{value}` is out of range"),
        }
    }
}

impl Error for DurationParseError {}

/// Parses one ISO-8601 duration string.
pub fn parse_iso_duration(value: &str) -> Result<IsoDuration, DurationParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let malformed = || DurationParseError::Malformed(trimmed.to_string());
    let caps = ISO_DURATION_RE.captures(trimmed).ok_or_else(malformed)?;

    // The regex admits `P` and `P1DT`; both carry no usable component.
    if (1..=7).all(|index| caps.get(index).is_none()) || trimmed.ends_with('T') {
        return Err(malformed());
    }

    let component = |index: usize| -> Result<u32, DurationParseError> {
        match caps.get(index) {
            Some(m) => m
                .as_str()
                .parse::<u32>()
                .map_err(|_| DurationParseError::Overflow(trimmed.to_string())),
            None => Ok(0),
        }
    };

    let whole_seconds = u64::from(component(7)?);
    let fraction_ms = caps.get(8).map_or(0, |m| fraction_to_ms(m.as_str()));
    let seconds_ms = whole_seconds
        .checked_mul(1_000)
        .and_then(|ms| ms.checked_add(fraction_ms))
        .ok_or_else(|| DurationParseError::Overflow(trimmed.to_string()))?;

    Ok(IsoDuration {
        years: component(1)?,
        months: component(2)?,
        weeks: component(3)?,
        days: component(4)?,
        hours: component(5)?,
        minutes: component(6)?,
        seconds_ms,
    })
}

fn fraction_to_ms(digits: &str) -> u64 {
    let mut padded: String = digits.chars().take(3).collect();
    while padded.len() < 3 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{parse_iso_duration, DurationParseError, IsoDuration};
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_full_designator_set() {
        let parsed = parse_iso_duration("P1Y2DT3H4M5S").unwrap();
        assert_eq!(
            parsed,
            IsoDuration {
                years: 1,
                days: 2,
                hours: 3,
                minutes: 4,
                seconds_ms: 5_000,
                ..IsoDuration::default()
            }
        );
    }

    #[test]
    fn minutes_and_months_are_disambiguated_by_time_marker() {
        let months = parse_iso_duration("P3M").unwrap();
        assert_eq!(months.months, 3);
        assert_eq!(months.minutes, 0);

        let minutes = parse_iso_duration("PT3M").unwrap();
        assert_eq!(minutes.minutes, 3);
        assert_eq!(minutes.months, 0);
    }

    #[test]
    fn fractional_seconds_keep_millisecond_precision() {
        assert_eq!(parse_iso_duration("PT1.5S").unwrap().seconds_ms, 1_500);
        assert_eq!(parse_iso_duration("PT0,25S").unwrap().seconds_ms, 250);
    }

    #[test]
    fn rejects_malformed_inputs() {
        for value in ["not-a-duration", "P", "PT", "P1DT", "1D", "P-1D", "PT1H2D"] {
            assert!(
                matches!(
                    parse_iso_duration(value),
                    Err(DurationParseError::Malformed(_))
                ),
                "{value} should be malformed"
            );
        }
        assert_eq!(parse_iso_duration("  "), Err(DurationParseError::Empty));
    }

    #[test]
    fn rejects_component_overflow() {
        assert!(matches!(
            parse_iso_duration("P99999999999D"),
            Err(DurationParseError::Overflow(_))
        ));
    }

    #[test]
    fn end_from_applies_calendar_years_then_fixed_spans() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 1, 3, 3, 4, 5).unwrap();

        let end = parse_iso_duration("P1Y2DT3H4M5S")
            .unwrap()
            .end_from(start.timestamp_millis())
            .unwrap();
        assert_eq!(end, expected.timestamp_millis());
    }

    #[test]
    fn end_from_clamps_month_end() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap();

        let end = parse_iso_duration("P1M")
            .unwrap()
            .end_from(start.timestamp_millis())
            .unwrap();
        assert_eq!(end, expected.timestamp_millis());
    }
}
