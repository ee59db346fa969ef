//! Health status model and status derivation.
//!
//! # Severity
//! ```text
//! Healthy < Degraded < PartiallyUnhealthy < Unhealthy
//! ```
//!
//! # Derivation
//! A composite node with no explicit status takes its status from its
//! children: any degraded child escalates to `Degraded`, any unhealthy-class
//! child to `PartiallyUnhealthy`, and all children unhealthy-class to
//! `Unhealthy`. Unset or unknown child statuses count as unhealthy-class.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Service health, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Healthy,
    Degraded,
    PartiallyUnhealthy,
    Unhealthy,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Healthy => "healthy",
            Status::Degraded => "degraded",
            Status::PartiallyUnhealthy => "partially_unhealthy",
            Status::Unhealthy => "unhealthy",
        }
    }

    /// Parse a status name. Anything unrecognized is `Unhealthy`.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "healthy" => Status::Healthy,
            "degraded" => Status::Degraded,
            "partially_unhealthy" | "partiallyunhealthy" => Status::PartiallyUnhealthy,
            "unhealthy" => Status::Unhealthy,
            other => {
                tracing::warn!(
                    status = %other,
                    "Unrecognized health status, treating as unhealthy"
                );
                Status::Unhealthy
            }
        }
    }

    /// Return true for `Healthy` and `Degraded`, the statuses that come
    /// without an error.
    pub fn is_passing(&self) -> bool {
        matches!(self, Status::Healthy | Status::Degraded)
    }

    /// Numeric severity, used as a gauge value.
    pub fn severity(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Status::parse_lossy(&raw))
    }
}

/// One node of the health tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthResult {
    /// `None` on a composite node means "derive from services".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    /// Diagnostic text, empty on success.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Child results keyed by check name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, HealthResult>,
}

impl HealthResult {
    pub fn healthy() -> Self {
        Self {
            status: Some(Status::Healthy),
            ..Self::default()
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Degraded),
            message: message.into(),
            services: BTreeMap::new(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Unhealthy),
            message: message.into(),
            services: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, result: HealthResult) -> Self {
        self.services.insert(name.into(), result);
        self
    }

    /// Fill in an unset status from the services, recursively.
    pub fn resolve_status(&mut self) {
        if self.status.is_none() && !self.services.is_empty() {
            self.status = Some(derive_overall_status(&mut self.services));
        }
    }

    /// The status this node reports once derivation has run. Unset leaves
    /// are unhealthy.
    pub fn effective_status(&self) -> Status {
        match self.status {
            Some(status) => status,
            None if self.services.is_empty() => Status::Unhealthy,
            None => {
                let mut services = self.services.clone();
                derive_overall_status(&mut services)
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    Healthy,
    Degraded,
    Unhealthy,
}

fn classify(status: Option<Status>) -> Class {
    match status {
        Some(Status::Healthy) => Class::Healthy,
        Some(Status::Degraded) => Class::Degraded,
        _ => Class::Unhealthy,
    }
}

/// Compute a composite status from its children.
///
/// Children with services but no status are resolved first, so nested
/// groups are settled bottom-up before the parent looks at them.
pub fn derive_overall_status(services: &mut BTreeMap<String, HealthResult>) -> Status {
    if services.is_empty() {
        return Status::Healthy;
    }

    let mut overall = Status::Healthy;
    let mut unhealthy = 0;
    for child in services.values_mut() {
        child.resolve_status();
        match classify(child.status) {
            Class::Healthy => {}
            Class::Degraded => overall = overall.max(Status::Degraded),
            Class::Unhealthy => unhealthy += 1,
        }
    }

    if unhealthy > 0 {
        overall = overall.max(Status::PartiallyUnhealthy);
    }
    if unhealthy == services.len() {
        overall = overall.max(Status::Unhealthy);
    }
    overall
}
