//! Utilities shared across fetchline crates.
//!
//! Kept dependency-light so every crate (and integration test) can pull it in:
//!
//! - [`observability`]: centralised `tracing` initialisation
//!
//! ```rust
//! use fetchline_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     emit_stderr: true,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "fetchline");
//! ```

pub mod observability;
