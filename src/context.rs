//! Cancellation and deadline propagation for checks.
//!
//! A [`Context`] travels down the check tree. Cancelling a context cancels
//! every context derived from it, and a derived context never outlives its
//! parent's deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::HealthError;

/// Cancellation signal plus optional deadline.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A root context that never ends on its own.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a context that can be cancelled independently of this one.
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a context that ends after `timeout`, or earlier if this one ends.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context ended, or `None` while it is still live.
    pub fn err(&self) -> Option<HealthError> {
        if self.token.is_cancelled() {
            return Some(HealthError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(HealthError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context ends, yielding the cause.
    pub async fn done(&self) -> HealthError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => HealthError::Cancelled,
                _ = time::sleep_until(deadline) => HealthError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                HealthError::Cancelled
            }
        }
    }

    /// Drive `fut` until it completes or the context ends, whichever is first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, HealthError>
    where
        F: Future,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            out = fut => Ok(out),
            err = self.done() => Err(err),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
