//! Error types shared by every check.

use thiserror::Error;

use crate::health::{HealthResult, Status};

/// Why a check did not report a passing status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    /// Failure reported by a leaf probe. Opaque to the combinators.
    #[error("{0}")]
    Probe(String),

    /// The caller's context was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The caller's context deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A background check has not completed its first refresh.
    #[error("check {name:?} has not completed a refresh yet")]
    Pending { name: String },

    /// A child check panicked while being evaluated.
    #[error("check {name:?} panicked")]
    Panicked { name: String },

    /// At least one child of a group failed. Per-child detail lives in the
    /// returned result's services.
    #[error("{failed} of {total} services failed")]
    Aggregate {
        failed: usize,
        total: usize,
        #[source]
        last: Box<HealthError>,
    },
}

impl HealthError {
    /// Create a leaf probe error.
    pub fn probe(message: impl Into<String>) -> Self {
        HealthError::Probe(message.into())
    }

    /// Return true if this error, or the last error an aggregate wraps,
    /// comes from a cancelled or expired context.
    pub fn is_cancellation(&self) -> bool {
        match self {
            HealthError::Cancelled | HealthError::DeadlineExceeded => true,
            HealthError::Aggregate { last, .. } => last.is_cancellation(),
            _ => false,
        }
    }
}

/// A failed check: the error together with the result it produced.
///
/// Error and result are not mutually exclusive. A group that fails still
/// returns its full subtree.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct CheckFailure {
    pub result: HealthResult,
    pub error: HealthError,
}

impl CheckFailure {
    /// Failure whose result is an unhealthy leaf carrying the error text.
    pub fn new(error: HealthError) -> Self {
        Self {
            result: HealthResult::unhealthy(error.to_string()),
            error,
        }
    }

    /// Failure with an explicit result.
    pub fn with_result(result: HealthResult, error: HealthError) -> Self {
        Self { result, error }
    }

    /// Bring the result in line with the error: a failure always carries an
    /// unhealthy-class status and, for leaves, a message.
    pub(crate) fn normalized(mut self) -> Self {
        self.result.resolve_status();
        let passing = matches!(
            self.result.status,
            Some(Status::Healthy) | Some(Status::Degraded)
        );
        if self.result.status.is_none() || passing {
            self.result.status = Some(Status::Unhealthy);
        }
        if self.result.message.is_empty() && self.result.services.is_empty() {
            self.result.message = self.error.to_string();
        }
        self
    }
}

/// Outcome of a single `Check::check` call.
pub type CheckOutcome = Result<HealthResult, CheckFailure>;
