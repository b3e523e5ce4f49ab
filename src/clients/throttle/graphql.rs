//! Query-cost policy for the GraphQL Admin API.
//!
//! GraphQL requests draw from a bucket of cost points that refills at a fixed
//! restore rate. A rejected request comes back with a `THROTTLED` error and a
//! cost block like:
//!
//! ```json
//! {
//!   "errors": [{ "message": "Throttled", "extensions": { "code": "THROTTLED" } }],
//!   "extensions": {
//!     "cost": {
//!       "requestedQueryCost": 507,
//!       "actualQueryCost": null,
//!       "throttleStatus": {
//!         "maximumAvailable": 1000.0,
//!         "currentlyAvailable": 493,
//!         "restoreRate": 50.0
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The wait before retrying is the time the bucket needs to hold the
//! requested cost again.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::http_response::HttpResponse;
use crate::clients::throttle::{ceil_seconds, Assessment, ThrottlePolicy, ThrottleVerdict};
use crate::config::EngineConfig;

const THROTTLED_CODE: &str = "THROTTLED";

/// Bucket state reported with a GraphQL response.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    /// Bucket size in cost points.
    pub maximum_available: f64,
    /// Points available when the request was evaluated.
    pub currently_available: f64,
    /// Points restored per second.
    pub restore_rate: f64,
}

/// Query cost block from `extensions.cost`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlCost {
    /// Cost estimated before execution.
    pub requested_query_cost: f64,
    /// Cost actually charged; absent when the query did not run.
    #[serde(default)]
    pub actual_query_cost: Option<f64>,
    /// Bucket state.
    pub throttle_status: ThrottleStatus,
}

impl GraphqlCost {
    /// Reads the cost block from a decoded response body.
    ///
    /// Returns `None` when the block is missing or incomplete.
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        body.pointer("/extensions/cost")
            .and_then(|cost| Self::deserialize(cost).ok())
    }

    /// Describes which configured cost thresholds this query exceeded.
    ///
    /// Returns `None` when the cost is within every enabled threshold.
    #[must_use]
    pub fn high_cost_warning(&self, config: &EngineConfig) -> Option<String> {
        let mut exceeded = Vec::new();

        if let Some(limit) = config.requested_cost_warning() {
            if self.requested_query_cost > limit {
                exceeded.push(format!(
                    "requested cost {} exceeds {limit}",
                    self.requested_query_cost
                ));
            }
        }
        if let (Some(limit), Some(actual)) = (config.actual_cost_warning(), self.actual_query_cost)
        {
            if actual > limit {
                exceeded.push(format!("actual cost {actual} exceeds {limit}"));
            }
        }

        if exceeded.is_empty() {
            None
        } else {
            Some(format!("High GraphQL query cost: {}", exceeded.join(", ")))
        }
    }
}

/// Computes the wait, in seconds, before a throttled query can be retried.
///
/// Returns `0.0` when the body has no `errors`, when no error carries the
/// `THROTTLED` code, or when the cost block needed for the computation is
/// missing. Otherwise returns
/// `(requestedQueryCost - currentlyAvailable) / restoreRate`, unrounded and
/// clamped to be non-negative.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use shopify_engine::clients::throttle::check_for_throttle;
///
/// let body = json!({
///     "errors": [{ "extensions": { "code": "THROTTLED" } }],
///     "extensions": { "cost": {
///         "requestedQueryCost": 507,
///         "throttleStatus": { "maximumAvailable": 1000.0, "currentlyAvailable": 493, "restoreRate": 50.0 }
///     }}
/// });
///
/// assert!((check_for_throttle(&body) - 0.28).abs() < 1e-9);
/// assert_eq!(check_for_throttle(&json!({ "data": {} })), 0.0);
/// ```
#[must_use]
pub fn check_for_throttle(body: &Value) -> f64 {
    let Some(errors) = body.get("errors").and_then(Value::as_array) else {
        return 0.0;
    };

    let throttled = errors.iter().any(|error| {
        error.pointer("/extensions/code").and_then(Value::as_str) == Some(THROTTLED_CODE)
    });
    if !throttled {
        return 0.0;
    }

    let Some(cost) = body.pointer("/extensions/cost") else {
        return 0.0;
    };

    let requested = cost.get("requestedQueryCost").and_then(Value::as_f64);
    let available = cost
        .pointer("/throttleStatus/currentlyAvailable")
        .and_then(Value::as_f64);
    let restore_rate = cost
        .pointer("/throttleStatus/restoreRate")
        .and_then(Value::as_f64);

    let (Some(requested), Some(available), Some(restore_rate)) =
        (requested, available, restore_rate)
    else {
        return 0.0;
    };

    let wait = (requested - available) / restore_rate;
    if wait.is_finite() && wait > 0.0 {
        wait
    } else {
        0.0
    }
}

/// Throttle policy for GraphQL responses.
///
/// A `THROTTLED` error arrives with HTTP 200, so this policy is what turns it
/// into a retry. Query cost data is reported back for logging whether or not
/// the request was throttled.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphqlThrottlePolicy;

impl ThrottlePolicy for GraphqlThrottlePolicy {
    fn assess(&self, response: &HttpResponse, _config: &EngineConfig) -> Assessment {
        let Ok(body) = serde_json::from_slice::<Value>(&response.body) else {
            return Assessment::clear();
        };

        let wait = check_for_throttle(&body);
        let verdict = if wait > 0.0 {
            ThrottleVerdict::Throttled(ceil_seconds(wait))
        } else {
            ThrottleVerdict::Clear
        };

        Assessment {
            verdict,
            cost: GraphqlCost::from_body(&body),
        }
    }
}
