//! Configuration types for the request engine.
//!
//! This module provides the settings that govern retries, throttling pauses,
//! query cost warnings and transport timeouts.
//!
//! # Overview
//!
//! - [`EngineConfig`]: The validated configuration shared by all clients
//! - [`EngineConfigBuilder`]: A builder for constructing [`EngineConfig`] instances
//! - [`ExhaustionPolicy`]: What to do when the attempt budget runs out
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use shopify_engine::{EngineConfig, ExhaustionPolicy};
//!
//! let config = EngineConfig::builder()
//!     .max_attempts(5)
//!     .retry_after_grace(Duration::from_millis(500))
//!     .exhaustion_policy(ExhaustionPolicy::Fail)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_attempts(), 5);
//! ```

use std::time::Duration;

use crate::error::ConfigError;

/// Default number of transport calls per logical request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait for a 429 response without a usable `Retry-After` header.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(1);

/// Default ceiling for waits driven by `Retry-After` or GraphQL query cost.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// Default courtesy pause when the REST call-limit bucket is nearly full.
pub const DEFAULT_PROTECTIVE_PAUSE: Duration = Duration::from_secs(1);

/// Default remaining-capacity margin that counts as "nearly full".
pub const DEFAULT_CALL_LIMIT_MARGIN: u32 = 2;

/// Default query cost above which a warning is logged.
pub const DEFAULT_COST_WARNING: f64 = 1000.0;

/// Behavior once every attempt for a request has been used.
///
/// Sustained throttling or server errors eventually exhaust the attempt
/// budget. The engine can either hand back the last response it received, so
/// the caller can inspect its status and body, or fail with
/// [`MaxHttpRetriesExceededError`](crate::clients::MaxHttpRetriesExceededError).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExhaustionPolicy {
    /// Return the last response as-is (e.g. a final 429 or 503).
    #[default]
    ReturnLastResponse,
    /// Fail with `HttpError::MaxRetries`.
    Fail,
}

/// Configuration for the request engine.
///
/// # Thread Safety
///
/// `EngineConfig` is `Clone`, `Send`, and `Sync`.
///
/// # Example
///
/// ```rust
/// use shopify_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.max_attempts(), 3);
/// assert!(!config.strict_call_limit());
/// ```
#[derive(Clone, Debug)]
pub struct EngineConfig {
    max_attempts: u32,
    retry_after_grace: Duration,
    default_retry_wait: Duration,
    max_wait: Duration,
    protective_pause: Duration,
    call_limit_margin: u32,
    strict_call_limit: bool,
    exhaustion_policy: ExhaustionPolicy,
    requested_cost_warning: Option<f64>,
    actual_cost_warning: Option<f64>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_after_grace: Duration::ZERO,
            default_retry_wait: DEFAULT_RETRY_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            protective_pause: DEFAULT_PROTECTIVE_PAUSE,
            call_limit_margin: DEFAULT_CALL_LIMIT_MARGIN,
            strict_call_limit: false,
            exhaustion_policy: ExhaustionPolicy::default(),
            requested_cost_warning: Some(DEFAULT_COST_WARNING),
            actual_cost_warning: Some(DEFAULT_COST_WARNING),
            timeout: None,
            connect_timeout: None,
            user_agent_prefix: None,
        }
    }
}

impl EngineConfig {
    /// Creates a new builder for constructing an `EngineConfig`.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Returns the maximum number of transport calls per logical request.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the grace period added to every `Retry-After` wait.
    #[must_use]
    pub const fn retry_after_grace(&self) -> Duration {
        self.retry_after_grace
    }

    /// Returns the wait used for a 429 response without `Retry-After`.
    #[must_use]
    pub const fn default_retry_wait(&self) -> Duration {
        self.default_retry_wait
    }

    /// Returns the longest wait a `Retry-After` header or query cost can impose.
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Returns the courtesy pause taken when the REST bucket is nearly full.
    #[must_use]
    pub const fn protective_pause(&self) -> Duration {
        self.protective_pause
    }

    /// Returns the remaining-capacity margin that triggers the protective pause.
    #[must_use]
    pub const fn call_limit_margin(&self) -> u32 {
        self.call_limit_margin
    }

    /// Returns whether a full REST bucket fails the request.
    #[must_use]
    pub const fn strict_call_limit(&self) -> bool {
        self.strict_call_limit
    }

    /// Returns the policy applied when attempts run out.
    #[must_use]
    pub const fn exhaustion_policy(&self) -> ExhaustionPolicy {
        self.exhaustion_policy
    }

    /// Returns the requested query cost above which a warning is logged.
    #[must_use]
    pub const fn requested_cost_warning(&self) -> Option<f64> {
        self.requested_cost_warning
    }

    /// Returns the actual query cost above which a warning is logged.
    #[must_use]
    pub const fn actual_cost_warning(&self) -> Option<f64> {
        self.actual_cost_warning
    }

    /// Returns the per-request network timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the connect timeout, if any.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify EngineConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EngineConfig>();
};

/// Builder for constructing [`EngineConfig`] instances.
///
/// Every field is optional; unset fields take the values of
/// [`EngineConfig::default`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use shopify_engine::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .strict_call_limit(true)
///     .timeout(Duration::from_secs(30))
///     .user_agent_prefix("MyApp/1.0")
///     .build()
///     .unwrap();
///
/// assert!(config.strict_call_limit());
/// ```
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    max_attempts: Option<u32>,
    retry_after_grace: Option<Duration>,
    default_retry_wait: Option<Duration>,
    max_wait: Option<Duration>,
    protective_pause: Option<Duration>,
    call_limit_margin: Option<u32>,
    strict_call_limit: Option<bool>,
    exhaustion_policy: Option<ExhaustionPolicy>,
    requested_cost_warning: Option<Option<f64>>,
    actual_cost_warning: Option<Option<f64>>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl EngineConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of transport calls per logical request.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the grace period added to every `Retry-After` wait.
    ///
    /// Some integrations add half a second to compensate for clock skew.
    /// The default is no grace.
    #[must_use]
    pub const fn retry_after_grace(mut self, grace: Duration) -> Self {
        self.retry_after_grace = Some(grace);
        self
    }

    /// Sets the wait used for a 429 response without `Retry-After`.
    #[must_use]
    pub const fn default_retry_wait(mut self, wait: Duration) -> Self {
        self.default_retry_wait = Some(wait);
        self
    }

    /// Caps waits taken from `Retry-After` headers and GraphQL query cost.
    ///
    /// Server-busy backoff is bounded by the attempt budget instead.
    #[must_use]
    pub const fn max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    /// Sets the courtesy pause taken when the REST bucket is nearly full.
    #[must_use]
    pub const fn protective_pause(mut self, pause: Duration) -> Self {
        self.protective_pause = Some(pause);
        self
    }

    /// Sets the remaining-capacity margin that triggers the protective pause.
    #[must_use]
    pub const fn call_limit_margin(mut self, margin: u32) -> Self {
        self.call_limit_margin = Some(margin);
        self
    }

    /// Fails requests with `RateLimitExceeded` when the REST bucket is full.
    #[must_use]
    pub const fn strict_call_limit(mut self, strict: bool) -> Self {
        self.strict_call_limit = Some(strict);
        self
    }

    /// Sets the policy applied when attempts run out.
    #[must_use]
    pub const fn exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion_policy = Some(policy);
        self
    }

    /// Sets the requested query cost warning threshold (`None` disables it).
    #[must_use]
    pub const fn requested_cost_warning(mut self, threshold: Option<f64>) -> Self {
        self.requested_cost_warning = Some(threshold);
        self
    }

    /// Sets the actual query cost warning threshold (`None` disables it).
    #[must_use]
    pub const fn actual_cost_warning(mut self, threshold: Option<f64>) -> Self {
        self.actual_cost_warning = Some(threshold);
        self
    }

    /// Sets the per-request network timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`EngineConfig`], validating the supplied values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxAttempts`] if `max_attempts` is zero,
    /// and [`ConfigError::InvalidCostThreshold`] if a cost threshold is
    /// negative or not finite.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let defaults = EngineConfig::default();

        let max_attempts = self.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }

        let requested_cost_warning = validate_threshold(
            "requested_cost_warning",
            self.requested_cost_warning
                .unwrap_or(defaults.requested_cost_warning),
        )?;
        let actual_cost_warning = validate_threshold(
            "actual_cost_warning",
            self.actual_cost_warning
                .unwrap_or(defaults.actual_cost_warning),
        )?;

        Ok(EngineConfig {
            max_attempts,
            retry_after_grace: self
                .retry_after_grace
                .unwrap_or(defaults.retry_after_grace),
            default_retry_wait: self
                .default_retry_wait
                .unwrap_or(defaults.default_retry_wait),
            max_wait: self.max_wait.unwrap_or(defaults.max_wait),
            protective_pause: self.protective_pause.unwrap_or(defaults.protective_pause),
            call_limit_margin: self.call_limit_margin.unwrap_or(defaults.call_limit_margin),
            strict_call_limit: self.strict_call_limit.unwrap_or(defaults.strict_call_limit),
            exhaustion_policy: self.exhaustion_policy.unwrap_or_default(),
            requested_cost_warning,
            actual_cost_warning,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}

fn validate_threshold(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ConfigError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(ConfigError::InvalidCostThreshold { field, value: v })
        }
        other => Ok(other),
    }
}
