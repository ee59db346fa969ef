//! Lifecycle management for the daemon.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Owns the root Context → background checks run under it
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown → refresh loops stop
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
