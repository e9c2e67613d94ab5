//! Timestamp helpers shared by the history store and the wire types.
//!
//! Message timestamps travel as RFC 3339 strings and are reconstructed as
//! [`OffsetDateTime`] values on load, never kept as strings.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Returns the current instant in UTC.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Converts a timestamp to whole milliseconds since the unix epoch.
///
/// Pre-epoch timestamps clamp to zero; message ids are derived from this
/// value and must stay unsigned.
pub fn unix_millis(datetime: OffsetDateTime) -> u64 {
    let millis = datetime.unix_timestamp_nanos() / 1_000_000;
    millis.max(0) as u64
}

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime.
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string.
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// Formats a timestamp for transcript output, falling back to the raw unix
/// timestamp if formatting fails.
pub fn display(datetime: OffsetDateTime) -> String {
    datetime
        .format(&Rfc3339)
        .unwrap_or_else(|_| datetime.unix_timestamp().to_string())
}
