//! Configuration for the `service-health` daemon.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HealthConfig (validated, immutable)
//!     → health::tree::build_tree turns `tree` into checks
//! ```
//!
//! # Design Decisions
//! - The library itself is configured programmatically; only the daemon
//!   reads files
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{CheckConfig, HealthConfig, LogFormat, ObservabilityConfig, ReportConfig};
pub use validation::{validate_config, ValidationError};
