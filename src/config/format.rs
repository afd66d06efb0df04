//! Format resolution and decoding.
//!
//! Maps a file extension to one of the structured-text formats and decodes
//! bytes into the generic [`serde_json::Value`] tree used for merging.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::config::error::{ConfigError, ParseError};

/// A structured-text format the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => write!(f, "yaml"),
            Format::Json => write!(f, "json"),
            Format::Toml => write!(f, "toml"),
        }
    }
}

impl Format {
    /// Resolve the format from a file's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension: path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default(),
            }),
        }
    }

    /// Decode a document. An empty YAML document decodes to `Null`, and a
    /// YAML stream decodes to its first document.
    pub fn parse(self, bytes: &[u8]) -> Result<Value, ParseError> {
        match self {
            Format::Json => Ok(serde_json::from_slice(bytes)?),
            Format::Yaml => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Value::Null);
                }
                // Only the first document of a multi-document stream counts.
                match serde_yaml::Deserializer::from_slice(bytes).next() {
                    Some(document) => yaml_to_json(serde_yaml::Value::deserialize(document)?),
                    None => Ok(Value::Null),
                }
            }
            Format::Toml => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| ParseError::Content(format!("invalid UTF-8 in TOML document: {e}")))?;
                let raw: toml::Table = toml::from_str(text)?;
                Ok(toml_to_json(toml::Value::Table(raw)))
            }
        }
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, ParseError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, value) in mapping {
                out.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Scalar keys are stringified; nested keys are rejected.
fn yaml_key(key: serde_yaml::Value) -> Result<String, ParseError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(ParseError::Content(format!(
            "unsupported mapping key: {other:?}"
        ))),
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
