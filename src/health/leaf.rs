//! Leaf adapters for caller-supplied probes.

use async_trait::async_trait;
use std::future::Future;

use crate::context::Context;
use crate::error::{CheckFailure, CheckOutcome, HealthError};
use crate::health::{Check, HealthResult, Status};

/// A leaf with a fixed outcome.
#[derive(Debug, Clone)]
pub struct StaticCheck {
    name: String,
    status: Status,
    message: String,
}

impl StaticCheck {
    pub fn new(name: impl Into<String>, status: Status, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    pub fn healthy(name: impl Into<String>) -> Self {
        Self::new(name, Status::Healthy, "")
    }

    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Status::Degraded, message)
    }

    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Status::Unhealthy, message)
    }
}

#[async_trait]
impl Check for StaticCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, _ctx: &Context) -> CheckOutcome {
        let result = HealthResult {
            status: Some(self.status),
            message: self.message.clone(),
            ..HealthResult::default()
        };
        if self.status.is_passing() {
            Ok(result)
        } else {
            let message = if self.message.is_empty() {
                format!("{} is {}", self.name, self.status)
            } else {
                self.message.clone()
            };
            Err(CheckFailure::with_result(result, HealthError::Probe(message)))
        }
    }
}

/// A leaf backed by an async closure.
///
/// ```ignore
/// let db = FnCheck::new("db", |ctx: Context| async move {
///     ctx.run(ping()).await
///         .map_err(CheckFailure::new)?
///         .map(|_| HealthResult::healthy())
///         .map_err(|e| CheckFailure::new(HealthError::probe(e.to_string())))
/// });
/// ```
pub struct FnCheck<F> {
    name: String,
    probe: F,
}

impl<F, Fut> FnCheck<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = CheckOutcome> + Send + 'static,
{
    pub fn new(name: impl Into<String>, probe: F) -> Self {
        Self {
            name: name.into(),
            probe,
        }
    }
}

#[async_trait]
impl<F, Fut> Check for FnCheck<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = CheckOutcome> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, ctx: &Context) -> CheckOutcome {
        (self.probe)(ctx.clone()).await
    }
}
