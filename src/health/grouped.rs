//! Concurrent fan-out over named child checks.
//!
//! # Responsibilities
//! - Evaluate every child concurrently against the caller's context
//! - Merge child results by name into one subtree
//! - Derive the subtree status from its children
//!
//! # Design Decisions
//! - One task per child; latency is bounded by the slowest child
//! - A failing, slow or panicking child never blocks its siblings
//! - When the context ends first, unfinished children are aborted and
//!   recorded as unhealthy so the caller still gets a complete tree

use async_trait::async_trait;
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::context::Context;
use crate::error::{CheckFailure, CheckOutcome, HealthError};
use crate::health::{derive_overall_status, Check, HealthResult, Status};

/// A named group of checks evaluated as one subtree.
pub struct GroupedCheck {
    name: String,
    checks: Vec<Arc<dyn Check>>,
}

impl GroupedCheck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Vec::new(),
        }
    }

    /// Add a child check. Builder form of [`GroupedCheck::add_check`].
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.add_check(check);
        self
    }

    pub fn add_check(&mut self, check: impl Check + 'static) {
        self.checks.push(Arc::new(check));
    }

    /// Add an already shared child check.
    pub fn add_shared(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }
}

/// Per-call bookkeeping while children report in.
#[derive(Default)]
struct Collected {
    services: BTreeMap<String, HealthResult>,
    failed: usize,
    last_error: Option<HealthError>,
}

impl Collected {
    fn record(&mut self, name: String, outcome: CheckOutcome) {
        let outcome = match outcome {
            Ok(mut result) => {
                result.resolve_status();
                match result.status {
                    Some(status) if status.is_passing() => Ok(result),
                    Some(status) => {
                        let message = if result.message.is_empty() {
                            format!("{} is {}", name, status)
                        } else {
                            result.message.clone()
                        };
                        Err(CheckFailure::with_result(result, HealthError::Probe(message)))
                    }
                    None => {
                        // A leaf that reported nothing cannot pass.
                        let message = format!("{} reported no status", name);
                        result.status = Some(Status::Unhealthy);
                        if result.message.is_empty() {
                            result.message = message.clone();
                        }
                        Err(CheckFailure::with_result(result, HealthError::Probe(message)))
                    }
                }
            }
            Err(failure) => Err(failure.normalized()),
        };

        match outcome {
            Ok(result) => {
                self.services.insert(name, result);
            }
            Err(failure) => {
                tracing::debug!(check = %name, error = %failure.error, "Grouped child failed");
                self.failed += 1;
                self.last_error = Some(failure.error);
                self.services.insert(name, failure.result);
            }
        }
    }

    async fn join(&mut self, tasks: &mut JoinSet<(String, CheckOutcome)>) {
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, outcome)) => self.record(name, outcome),
                Err(e) => tracing::error!(error = %e, "Grouped child task did not complete"),
            }
        }
    }
}

#[async_trait]
impl Check for GroupedCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, ctx: &Context) -> CheckOutcome {
        if self.checks.is_empty() {
            return Ok(HealthResult::healthy());
        }

        let mut tasks = JoinSet::new();
        for check in &self.checks {
            let check = Arc::clone(check);
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let name = check.name().to_string();
                let outcome = AssertUnwindSafe(check.check(&ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!(check = %name, "Health check panicked");
                        Err(CheckFailure::new(HealthError::Panicked { name: name.clone() }))
                    });
                (name, outcome)
            });
        }

        let mut collected = Collected::default();
        if let Err(cause) = ctx.run(collected.join(&mut tasks)).await {
            tasks.abort_all();
            tracing::warn!(group = %self.name, error = %cause, "Group evaluation interrupted");
            for check in &self.checks {
                if !collected.services.contains_key(check.name()) {
                    collected.record(
                        check.name().to_string(),
                        Err(CheckFailure::new(cause.clone())),
                    );
                }
            }
            // The interruption is what the caller needs to see.
            collected.last_error = Some(cause);
        }

        let Collected {
            mut services,
            failed,
            last_error,
        } = collected;
        let status = derive_overall_status(&mut services);
        let result = HealthResult {
            status: Some(status),
            message: String::new(),
            services,
        };

        match last_error {
            None => Ok(result),
            Some(last) => Err(CheckFailure::with_result(
                result,
                HealthError::Aggregate {
                    failed,
                    total: self.checks.len(),
                    last: Box::new(last),
                },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{FnCheck, StaticCheck};
    use std::time::Duration;
    use tokio::time::{self, Instant};

    fn slow(name: &str, delay: Duration) -> impl Check {
        FnCheck::new(name, move |ctx: Context| async move {
            ctx.run(time::sleep(delay))
                .await
                .map(|_| HealthResult::healthy())
                .map_err(CheckFailure::new)
        })
    }

    #[tokio::test]
    async fn test_empty_group_is_healthy() {
        let group = GroupedCheck::new("empty");
        let result = group.check(&Context::background()).await.unwrap();
        assert_eq!(result.status, Some(Status::Healthy));
        assert!(result.services.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_child_degrades_group() {
        let group = GroupedCheck::new("root")
            .with_check(StaticCheck::degraded("A", "bees are tired"))
            .with_check(StaticCheck::healthy("B"));

        let result = group.check(&Context::background()).await.unwrap();
        let expected = HealthResult::healthy()
            .with_status(Status::Degraded)
            .with_service("A", HealthResult::degraded("bees are tired"))
            .with_service("B", HealthResult::healthy());
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_failing_child_is_isolated() {
        let group = GroupedCheck::new("root")
            .with_check(StaticCheck::healthy("a"))
            .with_check(StaticCheck::failing("b", "disk full"));

        let failure = group.check(&Context::background()).await.unwrap_err();
        assert_eq!(failure.result.status, Some(Status::PartiallyUnhealthy));
        assert_eq!(failure.result.services["a"].status, Some(Status::Healthy));
        assert_eq!(failure.result.services["b"].message, "disk full");
        assert!(matches!(
            failure.error,
            HealthError::Aggregate { failed: 1, total: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_all_failing_is_unhealthy() {
        let group = GroupedCheck::new("root")
            .with_check(StaticCheck::failing("a", "x"))
            .with_check(StaticCheck::failing("b", "y"));
        let failure = group.check(&Context::background()).await.unwrap_err();
        assert_eq!(failure.result.status, Some(Status::Unhealthy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_children_run_concurrently() {
        let group = GroupedCheck::new("root")
            .with_check(slow("a", Duration::from_millis(100)))
            .with_check(slow("b", Duration::from_millis(100)))
            .with_check(slow("c", Duration::from_millis(100)));

        let start = Instant::now();
        group.check(&Context::background()).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_complete_tree() {
        let group = GroupedCheck::new("root")
            .with_check(StaticCheck::healthy("fast"))
            .with_check(slow("stuck", Duration::from_secs(3600)));

        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let start = Instant::now();
        let failure = group.check(&ctx).await.unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(failure.error.is_cancellation());
        assert_eq!(failure.result.services["fast"].status, Some(Status::Healthy));
        assert_eq!(failure.result.services["stuck"].status, Some(Status::Unhealthy));
        assert_eq!(failure.result.status, Some(Status::PartiallyUnhealthy));
    }

    #[tokio::test]
    async fn test_panicking_child_is_contained() {
        let boom = FnCheck::new("boom", |_ctx: Context| async move {
            if true {
                panic!("probe exploded");
            }
            Ok::<_, CheckFailure>(HealthResult::healthy())
        });
        let group = GroupedCheck::new("root")
            .with_check(boom)
            .with_check(StaticCheck::healthy("ok"));

        let failure = group.check(&Context::background()).await.unwrap_err();
        assert_eq!(failure.result.services["boom"].status, Some(Status::Unhealthy));
        assert_eq!(failure.result.services["ok"].status, Some(Status::Healthy));
    }

    #[tokio::test]
    async fn test_ok_child_with_unhealthy_status_counts_as_failure() {
        let liar = FnCheck::new("liar", |_ctx: Context| async move {
            Ok::<_, CheckFailure>(HealthResult::unhealthy("actually down"))
        });
        let group = GroupedCheck::new("root").with_check(liar);
        let failure = group.check(&Context::background()).await.unwrap_err();
        assert_eq!(failure.result.status, Some(Status::Unhealthy));
    }

    #[tokio::test]
    async fn test_child_without_status_counts_as_failure() {
        let blank = FnCheck::new("blank", |_ctx: Context| async move {
            Ok::<_, CheckFailure>(HealthResult::default())
        });
        let group = GroupedCheck::new("root")
            .with_check(blank)
            .with_check(StaticCheck::healthy("ok"));

        let failure = group.check(&Context::background()).await.unwrap_err();
        assert_eq!(failure.result.status, Some(Status::PartiallyUnhealthy));
        let blank = &failure.result.services["blank"];
        assert_eq!(blank.status, Some(Status::Unhealthy));
        assert_eq!(blank.message, "blank reported no status");
        match failure.error {
            HealthError::Aggregate { failed, total, last } => {
                assert_eq!((failed, total), (1, 2));
                assert_eq!(*last, HealthError::probe("blank reported no status"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_nested_groups() {
        let inner = GroupedCheck::new("inner")
            .with_check(StaticCheck::degraded("queue", "backlog"))
            .with_check(StaticCheck::healthy("db"));
        let outer = GroupedCheck::new("outer")
            .with_check(inner)
            .with_check(StaticCheck::healthy("api"));

        let result = outer.check(&Context::background()).await.unwrap();
        assert_eq!(result.status, Some(Status::Degraded));
        assert_eq!(result.services["inner"].status, Some(Status::Degraded));
        assert_eq!(
            result.services["inner"].services["queue"].message,
            "backlog"
        );
    }
}
