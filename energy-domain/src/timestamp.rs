//! Wall-clock timestamps as they appear in the energy exports.
//!
//! Input timestamps are accepted in the handful of shapes the exports use
//! (`2026-01-22 13:00:00`, `2026-01-22T13:00`, a bare date, or RFC 3339 with
//! an offset such as the client's `2026-01-22T13:00:00.000Z`). The offset,
//! when there is one, is kept next to the local date-time and written back on
//! output as `+HH:MM`.
//!
//! Output is ISO-8601 (`2026-01-22T13:00:00`, `2026-01-22T13:00:00+00:00`),
//! with microseconds only when they are non-zero.

use std::fmt;

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Duration,
    OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised timestamp '{0}'")]
pub struct TimestampParseError(pub String);

/// Local date-time plus the UTC offset it was recorded with, if any.
///
/// Ordering compares `local` first; callers only order timestamps that share
/// an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub local: PrimitiveDateTime,
    pub offset: Option<UtcOffset>,
}

impl Timestamp {
    pub const fn naive(local: PrimitiveDateTime) -> Self {
        Self { local, offset: None }
    }

    pub const fn with_offset(local: PrimitiveDateTime, offset: UtcOffset) -> Self {
        Self {
            local,
            offset: Some(offset),
        }
    }

    pub fn hour(&self) -> u8 {
        self.local.hour()
    }

    pub fn ordinal(&self) -> u16 {
        self.local.ordinal()
    }

    /// Shifts the wall clock; the offset is carried unchanged.
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        Some(Self {
            local: self.local.checked_add(duration)?,
            offset: self.offset,
        })
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.local.cmp(&other.local).then_with(|| {
            self.offset
                .map(UtcOffset::whole_seconds)
                .cmp(&other.offset.map(UtcOffset::whole_seconds))
        })
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<PrimitiveDateTime> for Timestamp {
    fn from(local: PrimitiveDateTime) -> Self {
        Self::naive(local)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format_timestamp(*self).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

pub fn parse_timestamp(raw: &str) -> Result<Timestamp, TimestampParseError> {
    let s = raw.trim();

    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(Timestamp::with_offset(
            PrimitiveDateTime::new(odt.date(), odt.time()),
            odt.offset(),
        ));
    }

    // The date part never contains a `T`, so the first one is the separator.
    let s = s.replacen(['T', 't'], " ", 1);

    PrimitiveDateTime::parse(
        &s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| PrimitiveDateTime::parse(&s, format_description!("[year]-[month]-[day] [hour]:[minute]")))
    .or_else(|_| {
        Date::parse(&s, format_description!("[year]-[month]-[day]"))
            .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT))
    })
    .map(Timestamp::naive)
    .map_err(|_| TimestampParseError(raw.to_string()))
}

pub fn format_timestamp(ts: Timestamp) -> Result<String, time::error::Format> {
    let whole = ts.local.nanosecond() == 0;
    match (ts.offset, whole) {
        (None, true) => ts
            .local
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")),
        (None, false) => ts.local.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]"
        )),
        (Some(offset), true) => ts.local.assume_offset(offset).format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        )),
        (Some(offset), false) => ts.local.assume_offset(offset).format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
        )),
    }
}

/// `#[serde(with = "...")]` adapter for the ISO form above.
pub mod iso {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        let s = super::format_timestamp(*ts).map_err(ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn parses_space_and_t_separated_forms() {
        assert_eq!(parse_timestamp("2026-01-22 13:00:00").unwrap(), Timestamp::naive(datetime!(2026-01-22 13:00:00)));
        assert_eq!(parse_timestamp("2026-01-22T13:00:00").unwrap(), Timestamp::naive(datetime!(2026-01-22 13:00:00)));
        assert_eq!(parse_timestamp(" 2026-01-22T13:30 ").unwrap(), Timestamp::naive(datetime!(2026-01-22 13:30:00)));
    }

    #[test]
    fn bare_date_is_midnight() {
        assert_eq!(parse_timestamp("2026-01-22").unwrap(), Timestamp::naive(datetime!(2026-01-22 00:00:00)));
    }

    #[test]
    fn offset_is_kept_with_wall_clock() {
        assert_eq!(
            parse_timestamp("2026-01-22T13:00:00+01:00").unwrap(),
            Timestamp::with_offset(datetime!(2026-01-22 13:00:00), offset!(+1))
        );
        assert_eq!(
            parse_timestamp("2026-01-22T13:00:00Z").unwrap(),
            Timestamp::with_offset(datetime!(2026-01-22 13:00:00), UtcOffset::UTC)
        );
    }

    #[test]
    fn client_export_timestamp_round_trips_as_utc() {
        let ts = parse_timestamp("2026-01-24T23:00:00.000Z").unwrap();
        assert_eq!(ts.offset, Some(UtcOffset::UTC));
        assert_eq!(format_timestamp(ts).unwrap(), "2026-01-24T23:00:00+00:00");

        let next = ts.checked_add(Duration::HOUR).unwrap();
        assert_eq!(next.to_string(), "2026-01-25T00:00:00+00:00");
        assert_eq!(parse_timestamp(&next.to_string()).unwrap(), next);
    }

    #[test]
    fn negative_offset_and_fraction_are_written_back() {
        let ts = parse_timestamp("2026-01-22T13:00:00.5-05:30").unwrap();
        assert_eq!(format_timestamp(ts).unwrap(), "2026-01-22T13:00:00.500000-05:30");
    }

    #[test]
    fn fractional_seconds_survive() {
        let ts = parse_timestamp("2026-01-22 13:00:00.250").unwrap();
        assert_eq!(ts.local.millisecond(), 250);
        assert_eq!(format_timestamp(ts).unwrap(), "2026-01-22T13:00:00.250000");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_timestamp("yesterday"),
            Err(TimestampParseError("yesterday".to_string()))
        );
        assert!(parse_timestamp("2026-13-01 00:00:00").is_err());
    }

    #[test]
    fn formats_whole_seconds_without_fraction() {
        assert_eq!(
            format_timestamp(Timestamp::naive(datetime!(2026-01-25 00:00:00))).unwrap(),
            "2026-01-25T00:00:00"
        );
    }
}
