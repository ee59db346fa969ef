//! Shutdown coordination for background checks.

use crate::context::Context;

/// Coordinator for graceful shutdown.
///
/// Owns the root context. Every long-running task runs under a context
/// derived from it and ends when the shutdown is triggered.
pub struct Shutdown {
    root: Context,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            root: Context::background(),
        }
    }

    /// A context that ends when shutdown is triggered.
    pub fn context(&self) -> Context {
        self.root.with_cancel()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.root.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.root.is_done()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
