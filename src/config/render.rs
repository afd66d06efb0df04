//! Renders a config file's bytes as a Go-style text template before parsing.
//!
//! # Responsibilities
//! - Convert the variable tree into a template context once per load
//! - Render each config file against it, keeping parse and execution
//!   failures apart
//!
//! # Design Decisions
//! - Uses gtmpl (Go `text/template` semantics): `{{ .a.b }}`, pipelines,
//!   `if`/`with`/`range`, the standard builtins, plus `default`
//! - Objects become struct-like values, so a reference to a key that
//!   doesn't exist is an execution error, even inside `if`
//! - `default` covers values that exist but are empty (nil, "", false,
//!   empty list or map)

use std::collections::HashMap;
use std::path::Path;

use gtmpl::{Context, FuncError, Template, Value};
use thiserror::Error;

use crate::config::error::ConfigError;

/// Template failure, tagged with the template name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template: {name}: {message}")]
    Parse { name: String, message: String },

    #[error("template: {name}: executing: {message}")]
    Execute { name: String, message: String },
}

/// The variable tree, converted once and shared by every render of a load.
pub struct RenderContext {
    context: Context,
}

impl RenderContext {
    pub fn new(vars: &serde_json::Value) -> Self {
        Self {
            context: Context::from(to_template_value(vars)),
        }
    }
}

/// Render `content` with `ctx` as the root context.
///
/// The file path names the template in error messages.
pub fn render_file(path: &Path, content: &[u8], ctx: &RenderContext) -> Result<Vec<u8>, ConfigError> {
    let name = path.display().to_string();
    let parse_failure = |message: String| ConfigError::TemplateParse {
        path: path.to_path_buf(),
        source: TemplateError::Parse {
            name: name.clone(),
            message,
        },
    };

    let source = std::str::from_utf8(content)
        .map_err(|e| parse_failure(format!("content is not valid UTF-8: {e}")))?;

    let mut template = Template::default();
    template.add_func("default", default);
    template.parse(source).map_err(|e| parse_failure(e.to_string()))?;

    let rendered = template
        .render(&ctx.context)
        .map_err(|e| ConfigError::TemplateExecution {
            path: path.to_path_buf(),
            source: TemplateError::Execute {
                name: name.clone(),
                message: e.to_string(),
            },
        })?;

    Ok(rendered.into_bytes())
}

fn to_template_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => Value::from(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(to_template_value).collect()),
        serde_json::Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_template_value(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// `default FALLBACK VALUE`, usually piped: `{{ .name | default "edge" }}`.
fn default(args: &[Value]) -> Result<Value, FuncError> {
    match args {
        [fallback, value] => Ok(if is_empty(value) { fallback.clone() } else { value.clone() }),
        _ => Err(anyhow::anyhow!("default: want 2 arguments, got {}", args.len()).into()),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Nil | Value::NoValue => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) | Value::Map(map) => map.is_empty(),
        _ => false,
    }
}
