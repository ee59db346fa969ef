//! Transient failure suppression.
//!
//! # Behavior
//! ```text
//! success        → counter = 0, remember result, return it
//! failure        → counter += 1
//!   counter <= N → return last remembered success
//!   counter >  N → return the failure
//! ```
//!
//! The counter starts at N, so the first observation is always reported
//! as-is; suppression only applies after at least one success.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::context::Context;
use crate::error::CheckOutcome;
use crate::health::{Check, HealthResult};
use crate::observability::metrics;

struct DelayState {
    errors_since_success: u32,
    last_success: HealthResult,
}

/// Hides up to `max_ignored_errors` consecutive failures of the inner check.
pub struct DelayedErrorCheck<C> {
    inner: C,
    max_ignored_errors: u32,
    state: Mutex<DelayState>,
}

impl<C: Check> DelayedErrorCheck<C> {
    pub fn new(inner: C, max_ignored_errors: u32) -> Self {
        Self {
            inner,
            max_ignored_errors,
            state: Mutex::new(DelayState {
                errors_since_success: max_ignored_errors,
                last_success: HealthResult::default(),
            }),
        }
    }
}

#[async_trait]
impl<C: Check> Check for DelayedErrorCheck<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn check(&self, ctx: &Context) -> CheckOutcome {
        let outcome = self.inner.check(ctx).await;

        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match outcome {
            Ok(result) => {
                state.errors_since_success = 0;
                state.last_success = result.clone();
                Ok(result)
            }
            Err(failure) => {
                state.errors_since_success = state.errors_since_success.saturating_add(1);
                if state.errors_since_success > self.max_ignored_errors {
                    tracing::warn!(
                        check = %self.name(),
                        consecutive_errors = state.errors_since_success,
                        error = %failure.error,
                        "Health check failing"
                    );
                    Err(failure)
                } else {
                    tracing::debug!(
                        check = %self.name(),
                        consecutive_errors = state.errors_since_success,
                        max_ignored_errors = self.max_ignored_errors,
                        error = %failure.error,
                        "Suppressing transient health check error"
                    );
                    metrics::record_suppressed_error(self.name());
                    Ok(state.last_success.clone())
                }
            }
        }
    }
}
