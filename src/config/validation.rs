//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks that serde can't express (empty hosts, routes with no backends)
//! - Report every problem, not just the first
//!
//! # Design Decisions
//! - Pure function: &Config → Result<(), Vec<ValidationError>>
//! - Separate from loading: a config that fails validation still loads

use thiserror::Error;

use crate::config::schema::Config;

/// A single semantic problem, addressed by its key path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a materialized config, collecting every problem found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.version < 0 {
        errors.push(ValidationError::new("version", "must not be negative"));
    }

    for (i, route) in config.routes.iter().enumerate() {
        if route.backends.is_empty() {
            errors.push(ValidationError::new(
                format!("routes[{i}].backends"),
                "route has no backends",
            ));
        }
        for (j, backend) in route.backends.iter().enumerate() {
            if backend.host.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("routes[{i}].backends[{j}].host"),
                    "host must not be empty",
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Backend, Route};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let config = Config {
            version: -1,
            routes: vec![
                Route::default(),
                Route {
                    matches: Vec::new(),
                    backends: vec![
                        Backend {
                            host: "ok.internal".into(),
                            endpoint: String::new(),
                        },
                        Backend::default(),
                    ],
                },
            ],
            ..Config::default()
        };

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["version", "routes[0].backends", "routes[1].backends[1].host"]
        );
        assert_eq!(errors[1].to_string(), "routes[0].backends: route has no backends");
    }
}
