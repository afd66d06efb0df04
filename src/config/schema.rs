//! Configuration schema definitions.
//!
//! The typed view of a merged config tree. Every field defaults to its zero
//! value, and an explicit `null` is treated the same as an absent key.
//!
//! Scalars are weakly typed: templates render to text, so `version: "7"`,
//! `debug: "true"` and `endpoint: 8080` all decode. A sequence or mapping
//! where a scalar belongs is still an error.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::error::ConfigError;
use crate::config::tree::ConfigTree;

/// An opaque route match rule. Its semantics belong to the router.
pub type MatchRule = Value;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "weak_int")]
    pub version: i64,

    #[serde(deserialize_with = "weak_bool")]
    pub debug: bool,

    #[serde(deserialize_with = "nullable")]
    pub timeouts: Timeouts,

    #[serde(deserialize_with = "nullable")]
    pub routes: Vec<Route>,
}

/// Server-side timeouts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timeouts {
    #[serde(with = "crate::config::duration")]
    pub read_timeout: Duration,

    #[serde(with = "crate::config::duration")]
    pub write_timeout: Duration,

    #[serde(with = "crate::config::duration")]
    pub idle_timeout: Duration,
}

/// A route: match rules plus the backends that serve it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Route {
    #[serde(rename = "match", deserialize_with = "nullable")]
    pub matches: Vec<MatchRule>,

    #[serde(deserialize_with = "nullable")]
    pub backends: Vec<Backend>,
}

/// An upstream backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Backend {
    #[serde(deserialize_with = "weak_string")]
    pub host: String,

    #[serde(deserialize_with = "weak_string")]
    pub endpoint: String,
}

impl Config {
    /// Materialize a merged tree into the typed config.
    pub fn from_tree(tree: ConfigTree) -> Result<Self, ConfigError> {
        serde_json::from_value(tree.into_value()).map_err(|source| ConfigError::Unmarshal { source })
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn weak_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(IntVisitor)
}

fn weak_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    deserializer.deserialize_any(BoolVisitor)
}

fn weak_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(StringVisitor)
}

struct IntVisitor;

impl<'de> Visitor<'de> for IntVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string holding one")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<i64, E> {
        Ok(i64::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(0);
        }
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
        Ok(0)
    }
}

struct BoolVisitor;

impl<'de> Visitor<'de> for BoolVisitor {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, a number, or a string holding one")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
        Ok(v != 0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
        Ok(v != 0)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
        Ok(v != 0.0)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
        match v.trim() {
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
        Ok(false)
    }
}

struct StringVisitor;

impl<'de> Visitor<'de> for StringVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or another scalar")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(if v { "1" } else { "0" }.to_string())
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorKind;
    use serde_json::json;

    fn materialize(value: Value) -> Result<Config, ConfigError> {
        let mut tree = ConfigTree::new();
        tree.merge(value).unwrap();
        Config::from_tree(tree)
    }

    #[test]
    fn test_empty_tree_is_zero_config() {
        let config = Config::from_tree(ConfigTree::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.version, 0);
        assert!(!config.debug);
        assert_eq!(config.timeouts.idle_timeout, Duration::ZERO);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = materialize(json!({
            "version": 3,
            "debug": true,
            "timeouts": {"readTimeout": "5s", "writeTimeout": "1m30s", "idleTimeout": 2_000_000_000u64},
            "routes": [{
                "match": [{"path": "/api"}, "GET"],
                "backends": [{"host": "api.internal", "endpoint": "/v1"}]
            }]
        }))
        .unwrap();

        assert_eq!(config.version, 3);
        assert!(config.debug);
        assert_eq!(config.timeouts.read_timeout, Duration::from_secs(5));
        assert_eq!(config.timeouts.write_timeout, Duration::from_secs(90));
        assert_eq!(config.timeouts.idle_timeout, Duration::from_secs(2));
        assert_eq!(config.routes[0].matches, vec![json!({"path": "/api"}), json!("GET")]);
        assert_eq!(config.routes[0].backends[0].host, "api.internal");
        assert_eq!(config.routes[0].backends[0].endpoint, "/v1");
    }

    #[test]
    fn test_nulls_become_zero_values() {
        let config = materialize(json!({
            "version": null,
            "routes": [{"match": null, "backends": [{"host": null}]}],
            "timeouts": {"readTimeout": null}
        }))
        .unwrap();

        assert_eq!(config.version, 0);
        assert!(config.routes[0].matches.is_empty());
        assert_eq!(config.routes[0].backends[0].host, "");
        assert_eq!(config.timeouts.read_timeout, Duration::ZERO);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = materialize(json!({"version": 1, "listener": {"port": 80}})).unwrap();
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_shape_mismatch_is_unmarshal_failure() {
        let err = materialize(json!({"routes": "not-a-list"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);

        let err = materialize(json!({"timeouts": {"readTimeout": "soon"}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);

        let err = materialize(json!({"version": "two"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);

        let err = materialize(json!({"version": [1]})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);

        let err = materialize(json!({"routes": [{"backends": [{"host": {"name": "x"}}]}]})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);
    }

    #[test]
    fn test_strings_coerce_to_int_and_bool() {
        let config = materialize(json!({"version": "7", "debug": "true"})).unwrap();
        assert_eq!(config.version, 7);
        assert!(config.debug);

        let config = materialize(json!({"version": " ", "debug": "0"})).unwrap();
        assert_eq!(config.version, 0);
        assert!(!config.debug);

        assert!(materialize(json!({"debug": "maybe"})).is_err());
    }

    #[test]
    fn test_numbers_and_bools_cross_coerce() {
        let config = materialize(json!({"version": true, "debug": 1})).unwrap();
        assert_eq!(config.version, 1);
        assert!(config.debug);

        let config = materialize(json!({"version": 3.0})).unwrap();
        assert_eq!(config.version, 3);
        assert!(materialize(json!({"version": 3.5})).is_err());
    }

    #[test]
    fn test_scalars_coerce_to_string() {
        let config = materialize(json!({
            "routes": [{"backends": [
                {"host": 10, "endpoint": 8080},
                {"host": true, "endpoint": 1.5}
            ]}]
        }))
        .unwrap();

        let backends = &config.routes[0].backends;
        assert_eq!(backends[0].host, "10");
        assert_eq!(backends[0].endpoint, "8080");
        assert_eq!(backends[1].host, "1");
        assert_eq!(backends[1].endpoint, "1.5");
    }
}
