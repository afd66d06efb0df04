//! Cumulative key/value tree built one document at a time.
//!
//! # Design Decisions
//! - Objects merge key by key; any other value replaces what was there
//! - Arrays are leaves: a later array replaces an earlier one wholesale
//! - Dotted keys (`a.b: 1`) are expanded to nested objects before merging,
//!   so flat and nested spellings of the same path land in the same place
//! - Insertion order is preserved (`serde_json` with `preserve_order`)

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Separator between segments of a key path.
pub const DELIMITER: char = '.';

/// An ordered tree of configuration values addressed by dotted key paths.
///
/// The root is always an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    root: Value,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_object().map_or(true, Map::is_empty)
    }

    /// Merge one parsed document into the tree.
    ///
    /// A `null` document contributes nothing. Any other non-object root is
    /// rejected with a reason suitable for a merge error.
    pub fn merge(&mut self, document: Value) -> Result<(), String> {
        match (document, &mut self.root) {
            (Value::Null, _) => Ok(()),
            (Value::Object(map), Value::Object(root)) => {
                merge_maps(root, expand_dotted_keys(map));
                Ok(())
            }
            (other, _) => Err(format!(
                "top-level value must be a mapping, found {}",
                type_name(&other)
            )),
        }
    }

    /// Value at a dotted key path such as `timeouts.readTimeout`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        let segments: Vec<&str> = path.split(DELIMITER).collect();
        self.lookup(&segments)
    }

    /// Value at a path given as individual segments.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        segments
            .iter()
            .try_fold(&self.root, |current, segment| current.as_object()?.get(segment.as_ref()))
            .filter(|_| !segments.is_empty())
    }

    /// Flat snapshot: every leaf keyed by its full dotted path.
    ///
    /// Arrays and empty objects are leaves.
    pub fn flatten(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        if let Value::Object(root) = &self.root {
            flatten_into("", root, &mut out);
        }
        out
    }

    /// The whole tree as a borrowed object value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }
}

/// Deep-merge `src` into `dest`. Objects recurse; everything else overwrites.
pub fn merge_maps(dest: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, value) in src {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = dest.get_mut(&key) {
                merge_maps(existing, incoming);
                continue;
            }
            dest.insert(key, Value::Object(incoming));
        } else {
            dest.insert(key, value);
        }
    }
}

/// Rewrite `{"a.b": v}` as `{"a": {"b": v}}`, recursively through objects.
fn expand_dotted_keys(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        let value = match value {
            Value::Object(inner) => Value::Object(expand_dotted_keys(inner)),
            other => other,
        };

        let mut segments = key.split(DELIMITER).rev();
        let mut nested = value;
        // split always yields at least one segment
        let head = segments.next_back().unwrap_or_default().to_string();
        for segment in segments {
            let mut wrapper = Map::new();
            wrapper.insert(segment.to_string(), nested);
            nested = Value::Object(wrapper);
        }

        let mut single = Map::new();
        single.insert(head, nested);
        merge_maps(&mut out, single);
    }
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut BTreeMap<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{DELIMITER}{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(&path, inner, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
