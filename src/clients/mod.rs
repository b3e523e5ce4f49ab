//! The request engine and its façades.
//!
//! Data flows through the layers in one direction:
//!
//! ```text
//! façade ─► HttpClient (retry loop) ─► Transport ─► HttpResponse::parse ─► ThrottlePolicy
//!    ▲                                                                         │
//!    └──────────────── ApiResponse ◄── accept / retry / refuse ◄───────────────┘
//! ```
//!
//! # Overview
//!
//! - [`HttpClient`]: The retry controller, plus a raw-bytes façade
//! - [`RestClient`]: JSON façade using the REST call-limit policy
//! - [`GraphqlClient`]: POST-only GraphQL façade using the query-cost policy
//! - [`Transport`] / [`ReqwestTransport`]: One raw HTTP exchange
//! - [`HttpRequest`] / [`HttpResponse`]: The request and parsed response
//! - [`ApiResponse`]: Decoded body plus the final status and attempt count
//! - [`throttle`]: The REST and GraphQL throttle policies
//! - [`BodyEncoder`]: JSON and GraphQL body encoding
//! - [`RequestLogger`]: Per-attempt telemetry
//!
//! # Retry Behavior
//!
//! - **502, 503, 520, 406**: retried after 1s, 2s, 4s, ... (by attempt index)
//! - **429**: retried after `Retry-After` (rounded up) plus the configured grace,
//!   or 1 second when the header is absent
//! - **GraphQL `THROTTLED`**: retried after the time the cost bucket needs to
//!   refill, even on HTTP 200
//! - **Nearly full REST bucket**: the response is returned after a 1 second pause
//! - **Transport failure**: returned immediately, never retried
//!
//! At most [`max_attempts`](crate::EngineConfig::max_attempts) transport calls
//! are made per request. When they run out, the last response is returned
//! with [`ApiResponse::exhausted`] set.

mod encoder;
mod errors;
pub mod graphql;
mod http_client;
mod http_request;
mod http_response;
mod logger;
pub mod rest;
pub mod throttle;
mod transport;

pub use encoder::{BodyEncoder, GraphqlEncoder, GraphqlQuery, JsonEncoder};
pub use errors::{
    HttpError, InvalidHttpRequestError, MaxHttpRetriesExceededError, RateLimitExceededError,
    TransportError, TransportErrorKind,
};
pub use http_client::{backoff, Completed, HttpClient, SDK_VERSION, SERVER_BUSY_STATUSES};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder, RequestHeaders};
pub use http_response::{ApiCallLimit, ApiResponse, HttpResponse, CALL_LIMIT_HEADER};
pub use logger::{LogContext, NoopLogger, RequestLogger, TracingLogger};
pub use transport::{RawExchange, ReqwestTransport, Transport};

// Re-export façade types at the clients module level
pub use graphql::{GraphqlClient, GraphqlError};
pub use rest::RestClient;
