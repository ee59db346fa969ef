//! Background-refreshed checks.
//!
//! # Responsibilities
//! - Run the inner check on a fixed interval in a background task
//! - Serve the last completed result without touching the inner check
//! - Bound each refresh to half the interval
//!
//! # Concurrency
//! ```text
//! timer tick ──try_lock──▶ refresh ──store──▶ ArcSwap<CurrentState> ◀──load── check()
//!            └─busy──▶ skip (logged)
//! start / force_update_status ──lock (waits)──▶ refresh
//! ```
//! Only one refresh writes at a time. Readers never wait and always see a
//! state produced by one completed refresh.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::context::Context;
use crate::error::{CheckFailure, CheckOutcome, HealthError};
use crate::health::{Check, CurrentState};
use crate::observability::metrics;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running refresh loop.
struct Worker {
    ctx: Context,
    handle: JoinHandle<()>,
}

struct Shared {
    name: String,
    inner: Arc<dyn Check>,
    interval: Duration,
    state: ArcSwapOption<CurrentState>,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
    reset: Notify,
    worker: Mutex<Option<Worker>>,
}

/// Serves a cached result of its inner check, refreshed in the background.
///
/// Cloning yields another handle to the same cache and refresh loop.
#[derive(Clone)]
pub struct AsyncCheck {
    shared: Arc<Shared>,
}

impl AsyncCheck {
    /// Wrap `inner`, refreshing every `interval` once started.
    pub fn new(inner: impl Check + 'static, interval: Duration) -> Self {
        Self::from_shared(Arc::new(inner), interval)
    }

    pub fn from_shared(inner: Arc<dyn Check>, interval: Duration) -> Self {
        let interval = if interval < MIN_INTERVAL {
            tracing::warn!(
                check = %inner.name(),
                ?interval,
                "Refresh interval too small, clamping"
            );
            MIN_INTERVAL
        } else {
            interval
        };

        Self {
            shared: Arc::new(Shared {
                name: inner.name().to_string(),
                inner,
                interval,
                state: ArcSwapOption::empty(),
                refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
                reset: Notify::new(),
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Last committed state, if any refresh has completed.
    pub fn current_state(&self) -> Option<Arc<CurrentState>> {
        self.shared.state.load_full()
    }

    /// Return true while a refresh loop is running.
    pub fn is_running(&self) -> bool {
        self.shared
            .lock_worker()
            .as_ref()
            .map(Worker::is_live)
            .unwrap_or(false)
    }

    /// Refresh once, then keep refreshing every interval until `ctx` ends or
    /// [`AsyncCheck::stop`] is called.
    ///
    /// Starting an already running check resets its timer instead of
    /// spawning a second loop.
    pub async fn start(&self, ctx: &Context) {
        if let Err(e) = self.shared.refresh_exclusive(ctx).await {
            tracing::debug!(
                check = %self.shared.name,
                error = %e,
                "Initial refresh did not succeed"
            );
        }

        let mut worker = self.shared.lock_worker();
        if let Some(running) = worker.as_ref() {
            if running.is_live() {
                tracing::debug!(
                    check = %self.shared.name,
                    "Refresh loop already running, resetting timer"
                );
                self.shared.reset.notify_one();
                return;
            }
        }

        let loop_ctx = ctx.with_cancel();
        let handle = tokio::spawn(Shared::run(Arc::clone(&self.shared), loop_ctx.clone()));
        *worker = Some(Worker {
            ctx: loop_ctx,
            handle,
        });
    }

    /// Stop the refresh loop. The cached result is kept.
    pub fn stop(&self) {
        if let Some(worker) = self.shared.lock_worker().take() {
            worker.ctx.cancel();
        }
    }

    /// Refresh now, bypassing the timer, and return the refresh error.
    pub async fn force_update_status(&self, ctx: &Context) -> Result<(), HealthError> {
        self.shared.refresh_exclusive(ctx).await
    }
}

impl Worker {
    fn is_live(&self) -> bool {
        !self.ctx.is_done() && !self.handle.is_finished()
    }
}

impl Shared {
    fn lock_worker(&self) -> std::sync::MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(shared: Arc<Shared>, ctx: Context) {
        tracing::info!(
            check = %shared.name,
            interval_ms = shared.interval.as_millis() as u64,
            "Background health refresh starting"
        );

        let mut ticker = time::interval_at(Instant::now() + shared.interval, shared.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    Self::spawn_tick_refresh(&shared, &ctx);
                }
                _ = shared.reset.notified() => {
                    ticker.reset();
                }
                cause = ctx.done() => {
                    tracing::info!(
                        check = %shared.name,
                        reason = %cause,
                        "Background health refresh stopped"
                    );
                    break;
                }
            }
        }
    }

    fn spawn_tick_refresh(shared: &Arc<Shared>, ctx: &Context) {
        match Arc::clone(&shared.refresh_lock).try_lock_owned() {
            Ok(guard) => {
                let shared = Arc::clone(shared);
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let _ = shared.refresh(&ctx).await;
                    drop(guard);
                });
            }
            Err(_) => {
                tracing::debug!(check = %shared.name, "Refresh already in progress, skipping tick");
                metrics::record_refresh_skipped(&shared.name);
            }
        }
    }

    async fn refresh_exclusive(&self, ctx: &Context) -> Result<(), HealthError> {
        let _guard = ctx.run(self.refresh_lock.lock()).await?;
        self.refresh(ctx).await
    }

    /// Evaluate the inner check and commit the outcome. Callers hold the
    /// refresh lock.
    async fn refresh(&self, ctx: &Context) -> Result<(), HealthError> {
        let refresh_ctx = ctx.with_timeout(self.interval / 2);
        let outcome = match refresh_ctx.run(self.inner.check(&refresh_ctx)).await {
            Ok(outcome) => outcome,
            Err(cause) => Err(CheckFailure::new(cause)),
        };

        if let Some(cause) = ctx.err() {
            // Shutting down: keep the last committed state.
            tracing::debug!(
                check = %self.name,
                reason = %cause,
                "Refresh interrupted, cache left unchanged"
            );
            return Err(cause);
        }

        let state = CurrentState::from(outcome);
        match &state.error {
            None => metrics::record_refresh(&self.name, true),
            Some(err) => {
                tracing::warn!(
                    check = %self.name,
                    error = %err,
                    "Background health refresh failed"
                );
                metrics::record_refresh(&self.name, false);
            }
        }
        metrics::record_check_status(&self.name, state.result.effective_status());

        let committed = state.error.clone();
        self.state.store(Some(Arc::new(state)));
        committed.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Check for AsyncCheck {
    fn name(&self) -> &str {
        &self.shared.name
    }

    async fn check(&self, _ctx: &Context) -> CheckOutcome {
        match self.shared.state.load_full() {
            Some(state) => state.to_outcome(),
            None => Err(CheckFailure::new(HealthError::Pending {
                name: self.shared.name.clone(),
            })),
        }
    }
}
