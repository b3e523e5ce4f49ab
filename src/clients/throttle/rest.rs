//! Leaky-bucket policy for the REST Admin API.

use crate::clients::errors::RateLimitExceededError;
use crate::clients::http_response::{ApiCallLimit, HttpResponse};
use crate::clients::throttle::{Assessment, ThrottlePolicy, ThrottleVerdict};
use crate::config::EngineConfig;

/// Throttle policy driven by the `X-Shopify-Shop-Api-Call-Limit` header.
///
/// The header is advisory. When fewer than
/// [`call_limit_margin`](EngineConfig::call_limit_margin) calls remain in the
/// bucket, the response is still accepted but only after a
/// [`protective_pause`](EngineConfig::protective_pause). With
/// [`strict_call_limit`](EngineConfig::strict_call_limit) enabled, a full
/// bucket fails the request with [`RateLimitExceededError`] instead.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::time::Duration;
/// use shopify_engine::clients::throttle::{RestThrottlePolicy, ThrottlePolicy, ThrottleVerdict};
/// use shopify_engine::clients::HttpResponse;
/// use shopify_engine::EngineConfig;
///
/// let mut headers = HashMap::new();
/// headers.insert("X-Shopify-Shop-Api-Call-Limit".to_string(), vec!["999/1000".to_string()]);
/// let response = HttpResponse::new(200, headers, Vec::new());
///
/// let assessment = RestThrottlePolicy.assess(&response, &EngineConfig::default());
/// assert_eq!(assessment.verdict, ThrottleVerdict::Pause(Duration::from_secs(1)));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RestThrottlePolicy;

impl RestThrottlePolicy {
    /// Returns the bucket usage reported by a response, if any.
    #[must_use]
    pub const fn check_usage(response: &HttpResponse) -> Option<ApiCallLimit> {
        response.api_call_limit
    }
}

impl ThrottlePolicy for RestThrottlePolicy {
    fn assess(&self, response: &HttpResponse, config: &EngineConfig) -> Assessment {
        let Some(limit) = Self::check_usage(response) else {
            return Assessment::clear();
        };

        let verdict = if config.strict_call_limit() && limit.is_exhausted() {
            ThrottleVerdict::Refuse(RateLimitExceededError {
                used: limit.request_count,
                total: limit.bucket_size,
            })
        } else if limit.remaining() < config.call_limit_margin() {
            ThrottleVerdict::Pause(config.protective_pause())
        } else {
            ThrottleVerdict::Clear
        };

        Assessment {
            verdict,
            cost: None,
        }
    }
}
