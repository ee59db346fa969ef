//! Last-known result held by the caching decorators.

use crate::error::{CheckFailure, CheckOutcome, HealthError};
use crate::health::HealthResult;

/// A result together with the error, if any, that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentState {
    pub result: HealthResult,
    pub error: Option<HealthError>,
}

impl CurrentState {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Replay this state as the outcome of a check call.
    pub fn to_outcome(&self) -> CheckOutcome {
        match &self.error {
            None => Ok(self.result.clone()),
            Some(error) => Err(CheckFailure::with_result(self.result.clone(), error.clone())),
        }
    }
}

impl From<CheckOutcome> for CurrentState {
    fn from(outcome: CheckOutcome) -> Self {
        match outcome {
            Ok(result) => Self {
                result,
                error: None,
            },
            Err(failure) => Self {
                result: failure.result,
                error: Some(failure.error),
            },
        }
    }
}
