//! Composable service health checks.
//!
//! Build a tree of checks from three combinators and read one overall
//! status from its root:
//! - [`GroupedCheck`]: concurrent fan-out over named children
//! - [`AsyncCheck`]: background refresh, cached answers
//! - [`DelayedErrorCheck`]: debounce of transient failures

pub mod config;
pub mod context;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use context::Context;
pub use error::{CheckFailure, CheckOutcome, HealthError};
pub use health::{
    AsyncCheck, Check, CheckTree, DelayedErrorCheck, FnCheck, GroupedCheck, HealthResult,
    StaticCheck, Status,
};
pub use lifecycle::Shutdown;
