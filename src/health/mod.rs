//! Health check combinators.
//!
//! # Data Flow
//! ```text
//! Caller
//!     → Check::check(ctx) on the root
//!     → grouped.rs fans out to children concurrently, joins, derives status
//!     → async_check.rs answers from its cache (refreshed on a timer)
//!     → delayed.rs hides a bounded run of consecutive failures
//!     → leaf.rs adapters call caller-supplied probes
//! Results fold bottom-up into one HealthResult tree (status.rs).
//! ```
//!
//! # Design Decisions
//! - Every node implements the same `Check` trait; decorators own their
//!   inner check, so chains of any depth compose
//! - Failure is data: a failed check still returns its result
//! - No global registry; the composed tree is passed to consumers

pub mod async_check;
pub mod delayed;
pub mod grouped;
pub mod leaf;
pub mod state;
pub mod status;
pub mod tree;

use async_trait::async_trait;
use std::sync::Arc;

use crate::context::Context;
use crate::error::CheckOutcome;

pub use async_check::AsyncCheck;
pub use delayed::DelayedErrorCheck;
pub use grouped::GroupedCheck;
pub use leaf::{FnCheck, StaticCheck};
pub use state::CurrentState;
pub use status::{derive_overall_status, HealthResult, Status};
pub use tree::{build_tree, CheckTree};

/// A named unit that reports health.
///
/// `check` returns `Ok` exactly when the status is `Healthy` or `Degraded`.
/// Implementations must return promptly once `ctx` ends.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable identifier, used as the key inside a group.
    fn name(&self) -> &str;

    async fn check(&self, ctx: &Context) -> CheckOutcome;
}

#[async_trait]
impl<T> Check for Arc<T>
where
    T: Check + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn check(&self, ctx: &Context) -> CheckOutcome {
        (**self).check(ctx).await
    }
}

#[async_trait]
impl<T> Check for Box<T>
where
    T: Check + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn check(&self, ctx: &Context) -> CheckOutcome {
        (**self).check(ctx).await
    }
}
