use crate::types::InvalidArgument;
use chrono::{DateTime, NaiveDate, NaiveDateTime, ParseError, Utc};
use std::str::FromStr;

/// Naive layouts accepted after RFC 3339, interpreted as UTC
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y:%m:%d %H:%M:%S"];

/// Parse a timestamp
///
/// Accepts RFC 3339, ISO 8601 without offset (UTC assumed), the TIFF
/// `YYYY:MM:DD HH:MM:SS` layout and a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let value = value.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(value) {
        Ok(datetime) => return Ok(datetime.with_timezone(&Utc)),
        Err(e) => e,
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(rfc3339_err)
}

/// Caller-supplied item time: one instant or a `START/END` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatetimeInput {
    Instant(DateTime<Utc>),
    Range { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl FromStr for DatetimeInput {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |value: &str| {
            parse_datetime(value).map_err(|e| InvalidArgument::Datetime {
                value: value.to_string(),
                reason: e.to_string(),
            })
        };

        match s.split_once('/') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start > end {
                    return Err(InvalidArgument::Datetime {
                        value: s.to_string(),
                        reason: "range start is after its end".to_string(),
                    });
                }
                Ok(DatetimeInput::Range { start, end })
            }
            None => Ok(DatetimeInput::Instant(parse(s)?)),
        }
    }
}

impl From<DateTime<Utc>> for DatetimeInput {
    fn from(datetime: DateTime<Utc>) -> Self {
        DatetimeInput::Instant(datetime)
    }
}
