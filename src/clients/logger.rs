//! Request telemetry for observability.
//!
//! Every attempt made by the retry controller is reported to a
//! [`RequestLogger`] together with a structured [`LogContext`]. Loggers only
//! observe: nothing they do can change how a request proceeds, and
//! [`NoopLogger`] is a valid choice.
//!
//! The default, [`TracingLogger`], forwards events to `tracing`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;
use crate::clients::throttle::GraphqlCost;

/// Header whose value is masked in log output.
const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Structured telemetry for one attempt.
///
/// Serializable so loggers can emit it as JSON. The access token header is
/// masked.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogContext {
    /// When the attempt completed.
    pub timestamp: DateTime<Utc>,
    /// Upper-case HTTP method.
    pub method: &'static str,
    /// Target URL.
    pub url: String,
    /// Zero-based attempt index.
    pub attempt: u32,
    /// Request headers as sent (access token masked).
    pub request_headers: BTreeMap<String, String>,
    /// Request body as text.
    pub request_body: String,
    /// Response status code.
    pub status: u16,
    /// Time spent in the transport, in milliseconds.
    pub elapsed_ms: u64,
    /// Response headers.
    pub response_headers: HashMap<String, Vec<String>>,
    /// Response body as text.
    pub response_body: String,
    /// GraphQL query cost, when the response carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<GraphqlCost>,
}

impl LogContext {
    /// Builds the context for a completed exchange.
    #[must_use]
    pub fn exchange(
        request: &HttpRequest,
        response: &HttpResponse,
        attempt: u32,
        elapsed: Duration,
    ) -> Self {
        let request_headers = request
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if name.eq_ignore_ascii_case(ACCESS_TOKEN_HEADER) {
                    "*****"
                } else {
                    value
                };
                (name.to_string(), value.to_string())
            })
            .collect();

        Self {
            timestamp: Utc::now(),
            method: request.http_method.as_str(),
            url: request.url.clone(),
            attempt,
            request_headers,
            request_body: request.body_text(),
            status: response.code,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            response_headers: response.headers.clone(),
            response_body: response.body_text(),
            cost: None,
        }
    }

    /// Attaches query cost data.
    #[must_use]
    pub fn with_cost(mut self, cost: Option<GraphqlCost>) -> Self {
        self.cost = cost;
        self
    }
}

/// Receives request telemetry.
///
/// Implementations must be cheap and must not panic; they are invoked on the
/// request path.
pub trait RequestLogger: Send + Sync {
    /// Records a routine event (one per attempt).
    fn info(&self, message: &str, context: &LogContext);

    /// Records an event worth attention, such as a high query cost.
    fn warning(&self, message: &str, context: &LogContext);

    /// Returns `false` when events are discarded, so no context is built.
    fn enabled(&self) -> bool {
        true
    }
}

/// Logger that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl RequestLogger for NoopLogger {
    fn info(&self, _message: &str, _context: &LogContext) {}

    fn warning(&self, _message: &str, _context: &LogContext) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Logger that emits `tracing` events.
///
/// Info events carry method, URL, status, attempt and elapsed time as fields;
/// bodies are logged at `debug` level only. Warnings additionally carry the
/// query cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn info(&self, message: &str, context: &LogContext) {
        tracing::info!(
            method = context.method,
            url = %context.url,
            status = context.status,
            attempt = context.attempt,
            elapsed_ms = context.elapsed_ms,
            "{}",
            message
        );
        tracing::debug!(
            request_body = %context.request_body,
            response_body = %context.response_body,
            "{}",
            message
        );
    }

    fn warning(&self, message: &str, context: &LogContext) {
        let requested = context.cost.as_ref().map(|c| c.requested_query_cost);
        let actual = context.cost.as_ref().and_then(|c| c.actual_query_cost);
        tracing::warn!(
            method = context.method,
            url = %context.url,
            status = context.status,
            requested_query_cost = ?requested,
            actual_query_cost = ?actual,
            "{}",
            message
        );
    }
}
