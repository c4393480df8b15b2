//! Schema date-time codec
//!
//! OCIL timestamps are written as `YYYY-MM-DDTHH:MM:SS[.fraction]` with no
//! timezone designator. On input a trailing `Z` or `±HH:MM` offset is also
//! accepted; it is never written back. The zero value is never written at
//! all, neither as an element nor as an attribute.
//!
//! Every field has a fixed width: a 4-digit year, 2-digit month, day, hour,
//! minute and second, and 1 to 9 fraction digits. Text of any other shape is
//! a format error; a well-shaped field holding an impossible value (month
//! 13, February 30, hour 24, second 60) is a range error.

use super::XmlText;
use crate::error::{Error, Result};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike, Utc,
};
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};

/// Primary pattern, no offset
pub const DATETIME_PATTERN: &str = r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]{1,9}))?$";

/// Fallback pattern with a `Z` or `±HH:MM` suffix
pub const DATETIME_OFFSET_PATTERN: &str = r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]{1,9}))?(?:(Z)|([+-])([0-9]{2}):([0-9]{2}))$";

lazy_static::lazy_static! {
    static ref DATETIME_REGEX: Regex = Regex::new(DATETIME_PATTERN).unwrap();
    static ref DATETIME_OFFSET_REGEX: Regex = Regex::new(DATETIME_OFFSET_PATTERN).unwrap();
}

/// Timestamp carried by generator metadata, result windows and artifact
/// results.
///
/// The value keeps the wall-clock offset it was parsed with; equality
/// compares instants. `XsdDateTime::default()` is the zero value.
#[derive(Debug, Clone, Copy, Default)]
pub struct XsdDateTime(Option<DateTime<FixedOffset>>);

impl XsdDateTime {
    /// The zero value, omitted on output
    pub const ZERO: XsdDateTime = XsdDateTime(None);

    /// Wrap an instant
    pub fn new<Tz: TimeZone>(value: DateTime<Tz>) -> Self {
        Self(Some(value.fixed_offset()))
    }

    /// Interpret a naive date-time as UTC
    pub fn from_naive_utc(naive: NaiveDateTime) -> Self {
        Self(Some(Utc.fix().from_utc_datetime(&naive)))
    }

    /// Current time, truncated to whole seconds
    pub fn now() -> Self {
        let now = Utc::now();
        Self::new(now.with_nanosecond(0).unwrap_or(now))
    }

    /// True for the zero value.
    ///
    /// Both the default value and the instant `0001-01-01T00:00:00Z`
    /// count as zero.
    pub fn is_zero(&self) -> bool {
        match self.0 {
            None => true,
            Some(dt) => {
                let utc = dt.naive_utc();
                utc.year() == 1
                    && utc.ordinal() == 1
                    && utc.num_seconds_from_midnight() == 0
                    && utc.nanosecond() == 0
            }
        }
    }

    /// The instant with its original offset, `None` for the zero value
    pub fn get(&self) -> Option<DateTime<FixedOffset>> {
        if self.is_zero() {
            None
        } else {
            self.0
        }
    }

    /// The instant in UTC, `None` for the zero value
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        self.get().map(|dt| dt.with_timezone(&Utc))
    }

    /// Parse schema date-time text.
    ///
    /// The primary pattern is tried first and the offset form only when
    /// the text does not have the primary shape. Surrounding whitespace is
    /// trimmed; whitespace inside the value is not.
    pub fn parse(text: &str) -> Result<Self> {
        let s = text.trim();
        if let Some(caps) = DATETIME_REGEX.captures(s) {
            return wall_clock(&caps, text).map(Self::from_naive_utc);
        }
        let caps = DATETIME_OFFSET_REGEX
            .captures(s)
            .ok_or_else(|| Error::format("not a valid xs:dateTime", text))?;
        let naive = wall_clock(&caps, text)?;
        if caps.get(8).is_some() {
            return Ok(Self::from_naive_utc(naive));
        }
        let hours = number(&caps, 10);
        let minutes = number(&caps, 11);
        if hours > 14 || minutes > 59 {
            return Err(Error::range("timezone offset out of range", text));
        }
        let mut seconds = (hours * 3600 + minutes * 60) as i32;
        if caps.get(9).map(|m| m.as_str()) == Some("-") {
            seconds = -seconds;
        }
        let offset = FixedOffset::east_opt(seconds)
            .ok_or_else(|| Error::range("timezone offset out of range", text))?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| Self(Some(dt)))
            .ok_or_else(|| Error::range("instant out of range", text))
    }

    /// Render with the primary pattern, `None` for the zero value
    pub fn format(&self) -> Option<String> {
        let dt = self.get()?;
        let mut text = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
        let nanos = dt.nanosecond() % 1_000_000_000;
        if nanos != 0 {
            let fraction = format!("{:09}", nanos);
            text.push('.');
            text.push_str(fraction.trim_end_matches('0'));
        }
        Some(text)
    }
}

/// Digits of capture group `i`; the patterns guarantee at most 9 of them
fn number(caps: &Captures, i: usize) -> u32 {
    caps.get(i)
        .map_or(0, |m| m.as_str().bytes().fold(0, |n, b| n * 10 + u32::from(b - b'0')))
}

/// Build the date and time fields of a well-shaped capture
fn wall_clock(caps: &Captures, text: &str) -> Result<NaiveDateTime> {
    let year = number(caps, 1) as i32;
    let date = NaiveDate::from_ymd_opt(year, number(caps, 2), number(caps, 3))
        .ok_or_else(|| Error::range("invalid dateTime value (date out of range)", text))?;
    let nanos = caps.get(7).map_or(0, |m| {
        number(caps, 7) * 10u32.pow(9 - m.as_str().len() as u32)
    });
    let (hour, minute, second) = (number(caps, 4), number(caps, 5), number(caps, 6));
    if second > 59 {
        return Err(Error::range("invalid dateTime value (second out of range)", text));
    }
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| Error::range("invalid dateTime value (time out of range)", text))?;
    Ok(date.and_time(time))
}

impl PartialEq for XsdDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for XsdDateTime {}

impl Hash for XsdDateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

impl XmlText for XsdDateTime {
    fn from_xml_text(text: &str) -> Result<Self> {
        Self::parse(text)
    }

    fn to_xml_text(&self) -> Option<String> {
        self.format()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for XsdDateTime {
    fn from(value: DateTime<Tz>) -> Self {
        Self::new(value)
    }
}

impl Serialize for XsdDateTime {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.format() {
            Some(text) => serializer.serialize_some(&text),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for XsdDateTime {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            None => Ok(Self::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> XsdDateTime {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap();
        XsdDateTime::from_naive_utc(naive)
    }

    #[test]
    fn test_format_has_no_offset() {
        assert_eq!(
            utc(2024, 3, 5, 12, 0, 0).format().as_deref(),
            Some("2024-03-05T12:00:00")
        );
    }

    #[test]
    fn test_parse_primary() {
        let t = XsdDateTime::parse("2024-03-05T12:00:00").unwrap();
        assert_eq!(t, utc(2024, 3, 5, 12, 0, 0));
    }

    #[test]
    fn test_parse_offset_fallback() {
        let t = XsdDateTime::parse("2024-03-05T12:00:00+02:00").unwrap();
        assert_eq!(t, utc(2024, 3, 5, 10, 0, 0));

        let z = XsdDateTime::parse("2024-03-05T12:00:00Z").unwrap();
        assert_eq!(z, utc(2024, 3, 5, 12, 0, 0));

        let west = XsdDateTime::parse("2024-03-05T12:00:00.5-05:30").unwrap();
        assert_eq!(
            west.to_utc().unwrap().to_rfc3339(),
            "2024-03-05T17:30:00.500+00:00"
        );
    }

    #[test]
    fn test_offset_input_keeps_wall_clock_on_output() {
        let t = XsdDateTime::parse("2024-03-05T12:00:00+02:00").unwrap();
        assert_eq!(t.format().as_deref(), Some("2024-03-05T12:00:00"));
    }

    #[test]
    fn test_fraction_without_trailing_zeros() {
        let t = XsdDateTime::parse("2024-03-05T12:00:00.120").unwrap();
        assert_eq!(t.format().as_deref(), Some("2024-03-05T12:00:00.12"));

        let t = XsdDateTime::parse("2024-03-05T12:00:00.000000001").unwrap();
        assert_eq!(t.format().as_deref(), Some("2024-03-05T12:00:00.000000001"));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let t = XsdDateTime::parse("\n  2024-03-05T12:00:00 \n").unwrap();
        assert_eq!(t, utc(2024, 3, 5, 12, 0, 0));
    }

    #[test]
    fn test_malformed_is_format_error() {
        for bad in [
            "not-a-date",
            "",
            "2024-03-05",
            "2024-03-05 12:00:00",
            "2024-03-05T12:00:00+0200x",
            "2024-03-05T12:00:00GMT",
            "2024-3-5T1:2:3",
            "24-03-05T12:00:00",
            "+2024-03-05T12:00:00",
            "2024- 3-05T12:00:00",
            "2024-03-05T12:00:00+0200",
            "2024-03-05T12:00:00+2:00",
            "2024-03-05T12:00:00.",
            "2024-03-05T12:00:00.1234567890",
            "2024-03-05T12:00:00 Z",
            "２０２４-03-05T12:00:00",
        ] {
            assert!(
                matches!(XsdDateTime::parse(bad), Err(Error::Format(_))),
                "{bad:?} should be a format error"
            );
        }
    }

    #[test]
    fn test_impossible_values_are_range_errors() {
        for bad in [
            "2024-13-05T12:00:00",
            "2024-02-30T12:00:00",
            "2024-03-05T25:00:00",
            "2024-13-05T12:00:00+02:00",
            "2024-03-05T12:00:60",
            "2024-03-05T12:60:00",
            "2024-03-05T12:00:00+15:00",
            "2024-03-05T12:00:00+02:60",
        ] {
            assert!(
                matches!(XsdDateTime::parse(bad), Err(Error::Range(_))),
                "{bad:?} should be a range error"
            );
        }
    }

    #[test]
    fn test_zero_value() {
        assert!(XsdDateTime::default().is_zero());
        assert!(XsdDateTime::ZERO.format().is_none());
        assert!(XsdDateTime::ZERO.to_xml_text().is_none());

        let epoch_zero = XsdDateTime::parse("0001-01-01T00:00:00").unwrap();
        assert!(epoch_zero.is_zero());
        assert!(epoch_zero.format().is_none());

        assert!(!utc(1970, 1, 1, 0, 0, 0).is_zero());
    }

    #[test]
    fn test_round_trip_without_fraction() {
        let t = utc(1999, 12, 31, 23, 59, 59);
        let text = t.format().unwrap();
        assert_eq!(XsdDateTime::parse(&text).unwrap(), t);
    }

    #[test]
    fn test_serde_bridge() {
        let t = utc(2024, 3, 5, 12, 0, 0);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"2024-03-05T12:00:00\"");
        assert_eq!(serde_json::to_string(&XsdDateTime::ZERO).unwrap(), "null");
        let back: XsdDateTime = serde_json::from_str("\"2024-03-05T12:00:00\"").unwrap();
        assert_eq!(back, t);
    }
}
