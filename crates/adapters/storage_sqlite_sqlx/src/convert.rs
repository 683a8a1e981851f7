//! Row ↔ domain conversion helpers shared by the repositories.

use std::str::FromStr;

use billhub_domain::time::Timestamp;
use chrono::SecondsFormat;

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that SQL
/// comparisons on the column are chronological.
pub(crate) fn encode_ts(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.to_utc())
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn decode_opt_ts(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value.as_deref().map(decode_ts).transpose()
}

pub(crate) fn decode_id<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(value).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn decode_opt_id<T>(value: Option<String>) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.as_deref().map(decode_id).transpose()
}

/// Enums stored through their `as_str` form decode through `FromStr`; their
/// parse errors are plain strings.
pub(crate) fn decode_kind<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    T::from_str(value).map_err(|err| sqlx::Error::Decode(err.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn should_roundtrip_timestamp_through_text() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap();
        let encoded = encode_ts(ts);
        assert_eq!(decode_ts(&encoded).unwrap(), ts);
    }

    #[test]
    fn should_encode_timestamps_in_sortable_form() {
        let early = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(500);
        assert!(encode_ts(early) < encode_ts(late));
        assert!(encode_ts(late) < encode_ts(early + chrono::Duration::seconds(1)));
    }
}
