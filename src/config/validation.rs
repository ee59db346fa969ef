//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Sibling check names are unique and non-empty
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HealthConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{CheckConfig, HealthConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("check at {path} has an empty name")]
    EmptyName { path: String },

    #[error("duplicate check name {name:?} in {parent}")]
    DuplicateName { parent: String, name: String },

    #[error("async check {name:?} must have interval_ms > 0")]
    ZeroInterval { name: String },

    #[error("report.{field} must be > 0")]
    ZeroReportSetting { field: &'static str },

    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &HealthConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.report.interval_secs == 0 {
        errors.push(ValidationError::ZeroReportSetting {
            field: "interval_secs",
        });
    }
    if config.report.timeout_secs == 0 {
        errors.push(ValidationError::ZeroReportSetting {
            field: "timeout_secs",
        });
    }

    validate_check(&config.tree, "tree", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_check(check: &CheckConfig, path: &str, errors: &mut Vec<ValidationError>) {
    if check.name().trim().is_empty() {
        errors.push(ValidationError::EmptyName {
            path: path.to_string(),
        });
    }

    match check {
        CheckConfig::Group { name, checks } => {
            let mut seen = HashSet::new();
            for (i, child) in checks.iter().enumerate() {
                if !seen.insert(child.name()) {
                    errors.push(ValidationError::DuplicateName {
                        parent: name.clone(),
                        name: child.name().to_string(),
                    });
                }
                validate_check(child, &format!("{}.checks[{}]", path, i), errors);
            }
        }
        CheckConfig::Async { interval_ms, check } => {
            if *interval_ms == 0 {
                errors.push(ValidationError::ZeroInterval {
                    name: check.name().to_string(),
                });
            }
            validate_check(check, &format!("{}.check", path), errors);
        }
        CheckConfig::Delayed { check, .. } => {
            validate_check(check, &format!("{}.check", path), errors);
        }
        CheckConfig::Static { .. } => {}
    }
}
