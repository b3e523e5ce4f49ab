//! Error types for engine configuration.
//!
//! This module contains the error returned when an [`EngineConfig`](crate::EngineConfig)
//! fails validation. Errors raised while sending requests live in
//! [`clients`](crate::clients).
//!
//! # Example
//!
//! ```rust
//! use shopify_engine::{ConfigError, EngineConfig};
//!
//! let result = EngineConfig::builder().max_attempts(0).build();
//! assert!(matches!(result, Err(ConfigError::InvalidMaxAttempts)));
//! ```

use thiserror::Error;

/// Errors that can occur while building an engine configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The attempt budget must allow at least one transport call.
    #[error("max_attempts must be at least 1. A request needs at least one attempt to be sent.")]
    InvalidMaxAttempts,

    /// A query cost warning threshold is negative or not a number.
    #[error("Invalid {field} threshold {value}. Cost thresholds must be finite and non-negative.")]
    InvalidCostThreshold {
        /// The name of the offending setting.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}
