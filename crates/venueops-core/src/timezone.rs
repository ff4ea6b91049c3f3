//! Instant normalization.
//!
//! Every instant the service persists is timezone-naive. Offsets supplied by
//! callers are dropped while the wall-clock reading is kept, which matches how
//! the rest of the platform stores datetimes.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::de::{self, Deserialize, Deserializer};
use serde_with::DeserializeAs;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Drops the offset of an aware datetime, keeping its local wall-clock reading.
pub fn strip_offset(dt: DateTime<FixedOffset>) -> NaiveDateTime {
    dt.naive_local()
}

/// Drops sub-second precision.
pub fn truncate_to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Current UTC time as a naive instant with whole-second precision.
pub fn now() -> NaiveDateTime {
    truncate_to_seconds(Utc::now().naive_utc())
}

/// Parses a wire datetime into a naive instant.
///
/// Accepts RFC 3339 (`Z` or `±hh:mm`, offset stripped), `±hhmm` offsets,
/// naive ISO datetimes with either `T` or space separators, and bare dates,
/// which resolve to midnight.
pub fn parse_instant(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(strip_offset(dt));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(strip_offset(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(format!("invalid datetime '{}'", raw))
}

/// `serde_with` adapter that deserializes any accepted wire datetime and strips its offset.
pub struct OffsetStripped;

impl<'de> DeserializeAs<'de, NaiveDateTime> for OffsetStripped {
    fn deserialize_as<D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_instant(&raw).map_err(de::Error::custom)
    }
}

/// Deserializer for instant fields on the partial-update path.
///
/// Absent fields stay `None` through `#[serde(default)]`; `null` and `""` both
/// mean "clear the column" and become `Some(None)`.
pub fn deserialize_patch_instant<'de, D>(
    deserializer: D,
) -> Result<Option<Option<NaiveDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Some(None)),
        Some(value) => parse_instant(value)
            .map(|dt| Some(Some(dt)))
            .map_err(de::Error::custom),
    }
}
