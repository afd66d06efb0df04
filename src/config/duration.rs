//! Serde support for duration fields.
//!
//! Accepts human-friendly strings (`5s`, `1h30m`, `250ms`, `1.5s`) or an integer
//! count of nanoseconds. `null` decodes to zero.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

/// Parse a duration string such as `30s`, `5m` or `2h30m`. `0` is zero.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(value).map_err(|err| format!("invalid duration {value:?}: {err}"))
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration string like \"5s\" or an integer number of nanoseconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        parse_duration(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        u64::try_from(v)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom(format!("negative duration: {v}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Duration, E> {
        Ok(Duration::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Duration, E> {
        Ok(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        d: Duration,
    }

    fn decode(value: serde_json::Value) -> Result<Duration, serde_json::Error> {
        serde_json::from_value::<Holder>(json!({ "d": value })).map(|h| h.d)
    }

    #[test]
    fn parses_strings() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2h30m").unwrap(), Duration::from_secs(2 * 3600 + 30 * 60));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 0 ").unwrap(), Duration::ZERO);
    }

    #[test]
    fn accepts_fractional_units() {
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(decode(json!("1.5s")).unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn rejects_invalid_input() {
        let err = parse_duration("not-a-duration").unwrap_err();
        assert!(err.contains("invalid duration"), "got: {err}");
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn decodes_strings_integers_and_null() {
        assert_eq!(decode(json!("10s")).unwrap(), Duration::from_secs(10));
        assert_eq!(decode(json!(1_500_000_000u64)).unwrap(), Duration::from_millis(1500));
        assert_eq!(decode(json!(null)).unwrap(), Duration::ZERO);
        assert!(decode(json!(-1)).is_err());
        assert!(decode(json!(true)).is_err());
    }
}
