//! Configuration schema definitions.
//!
//! This module defines the configuration read by the `service-health` daemon.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::health::Status;

/// Root configuration for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HealthConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// How often the root of the tree is evaluated and printed.
    pub report: ReportConfig,

    /// The check tree.
    pub tree: CheckConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Report loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Seconds between root evaluations.
    pub interval_secs: u64,

    /// Deadline for a single root evaluation in seconds.
    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 5,
        }
    }
}

/// One node of the check tree.
///
/// ```toml
/// [tree]
/// kind = "group"
/// name = "root"
///
/// [[tree.checks]]
/// kind = "async"
/// interval_ms = 5000
/// check = { kind = "static", name = "db" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckConfig {
    /// Concurrent fan-out over named children.
    Group {
        name: String,
        #[serde(default)]
        checks: Vec<CheckConfig>,
    },

    /// Background refresh of the inner check.
    Async {
        interval_ms: u64,
        check: Box<CheckConfig>,
    },

    /// Hide up to `max_ignored_errors` consecutive failures.
    Delayed {
        max_ignored_errors: u32,
        check: Box<CheckConfig>,
    },

    /// Fixed outcome leaf.
    Static {
        name: String,
        #[serde(default = "default_static_status")]
        status: Status,
        #[serde(default)]
        message: String,
    },
}

fn default_static_status() -> Status {
    Status::Healthy
}

impl CheckConfig {
    /// The name the built check reports. Decorators take their inner name.
    pub fn name(&self) -> &str {
        match self {
            CheckConfig::Group { name, .. } | CheckConfig::Static { name, .. } => name,
            CheckConfig::Async { check, .. } | CheckConfig::Delayed { check, .. } => check.name(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig::Group {
            name: "root".to_string(),
            checks: Vec::new(),
        }
    }
}
