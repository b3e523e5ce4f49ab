//! Throttle policies for Shopify's two rate-limiting schemes.
//!
//! The retry controller classifies server-busy statuses on its own. Everything
//! that depends on which API a request targets is delegated to a
//! [`ThrottlePolicy`]:
//!
//! - [`RestThrottlePolicy`]: reads the `X-Shopify-Shop-Api-Call-Limit` leaky
//!   bucket header and asks for a short protective pause when it is nearly full
//! - [`GraphqlThrottlePolicy`]: reads the query cost block of a GraphQL
//!   response and computes how long the bucket needs to refill after a
//!   `THROTTLED` error

mod graphql;
mod rest;

use std::time::Duration;

pub use graphql::{check_for_throttle, GraphqlCost, GraphqlThrottlePolicy, ThrottleStatus};
pub use rest::RestThrottlePolicy;

use crate::clients::errors::RateLimitExceededError;
use crate::clients::http_response::HttpResponse;
use crate::config::EngineConfig;

/// What a throttle policy concluded about one response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleVerdict {
    /// Nothing to do.
    Clear,
    /// Accept the response after a courtesy pause.
    Pause(Duration),
    /// The request was throttled; retry after the given wait.
    Throttled(Duration),
    /// Strict mode: fail the request instead of proceeding.
    Refuse(RateLimitExceededError),
}

/// A verdict plus any query cost telemetry read along the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Assessment {
    /// How the retry controller should proceed.
    pub verdict: ThrottleVerdict,
    /// GraphQL query cost, when present in the response.
    pub cost: Option<GraphqlCost>,
}

impl Assessment {
    /// An assessment with no verdict and no cost data.
    #[must_use]
    pub const fn clear() -> Self {
        Self {
            verdict: ThrottleVerdict::Clear,
            cost: None,
        }
    }
}

/// Inspects responses for API-specific rate limit signals.
pub trait ThrottlePolicy: Send + Sync {
    /// Assesses a parsed response.
    ///
    /// Called for every response, whatever its status. Absent or malformed
    /// rate limit data must yield [`ThrottleVerdict::Clear`], never an error.
    fn assess(&self, response: &HttpResponse, config: &EngineConfig) -> Assessment;
}

/// Converts a wait in fractional seconds to a whole-second duration.
///
/// Rounds up; negative, zero and non-finite values give no wait.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ceil_seconds(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs(seconds.ceil() as u64)
    } else {
        Duration::ZERO
    }
}
