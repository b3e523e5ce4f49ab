//! HTTP-specific error types for the request engine.
//!
//! Only two kinds of failure are surfaced by default: transport failures and
//! invalid requests. Throttling and server-busy responses are absorbed by the
//! retry loop, and a request that runs out of attempts hands back its last
//! response. The remaining variants appear only when the matching opt-in
//! behavior is enabled in [`EngineConfig`](crate::EngineConfig).
//!
//! - [`TransportError`]: DNS, connection, TLS or timeout failure (never retried)
//! - [`InvalidHttpRequestError`]: A request rejected before any network I/O
//! - [`MaxHttpRetriesExceededError`]: Attempts exhausted under [`ExhaustionPolicy::Fail`](crate::ExhaustionPolicy::Fail)
//! - [`RateLimitExceededError`]: Full call-limit bucket under strict mode
//! - [`HttpError`]: Unified error type encompassing all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_engine::clients::{HttpClient, HttpError};
//!
//! match client.get("https://shop.myshopify.com/admin/api/2024-10/shop.json", None).await {
//!     Ok(response) if response.is_ok() => println!("{} bytes", response.len()),
//!     Ok(response) => println!("gave up with status {}", response.status()),
//!     Err(HttpError::Transport(e)) => println!("network failure {}: {}", e.code(), e),
//!     Err(other) => println!("{other}"),
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// Category of a transport-level failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The HTTP client could not be constructed (e.g. TLS backend init).
    Builder,
    /// DNS resolution or TCP/TLS connection failed.
    Connect,
    /// The request or connection timed out.
    Timeout,
    /// The request could not be sent.
    Request,
    /// The response body could not be read.
    Body,
    /// A redirect was encountered and could not be handled.
    Redirect,
    /// Any other failure reported by the HTTP stack.
    Other,
}

impl TransportErrorKind {
    /// Returns a stable numeric code for this kind.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Builder => 1,
            Self::Connect => 2,
            Self::Timeout => 3,
            Self::Request => 4,
            Self::Body => 5,
            Self::Redirect => 6,
            Self::Other => 99,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Builder => "builder",
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Request => "request",
            Self::Body => "body",
            Self::Redirect => "redirect",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Error returned when the HTTP exchange itself fails.
///
/// Transport failures are fatal: the engine never retries them.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::{TransportError, TransportErrorKind};
///
/// let error = TransportError::new(TransportErrorKind::Connect, "connection refused");
/// assert_eq!(error.code(), 2);
/// assert!(error.to_string().contains("connection refused"));
/// ```
#[derive(Debug, Error)]
#[error("Transport error ({kind}, code {}): {message}", .kind.code())]
pub struct TransportError {
    /// The category of failure.
    pub kind: TransportErrorKind,
    /// Human readable description from the underlying HTTP stack.
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error without an underlying source.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Returns the numeric code of this failure.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.kind.code()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_builder() {
            TransportErrorKind::Builder
        } else if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_redirect() {
            TransportErrorKind::Redirect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else if error.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        Self {
            kind,
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// Only produced under [`ExhaustionPolicy::Fail`](crate::ExhaustionPolicy::Fail).
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::MaxHttpRetriesExceededError;
///
/// let error = MaxHttpRetriesExceededError {
///     code: 429,
///     tries: 3,
///     error_reference: None,
/// };
///
/// assert!(error.to_string().contains("Exceeded maximum retry count of 3"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Exceeded maximum retry count of {tries}. Last status: {code}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned in strict mode when the REST call-limit bucket is full.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::RateLimitExceededError;
///
/// let error = RateLimitExceededError { used: 40, total: 40 };
/// assert!(error.to_string().contains("40/40"));
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("API call limit exhausted ({used}/{total}).")]
pub struct RateLimitExceededError {
    /// Requests currently counted against the bucket.
    pub used: u32,
    /// Bucket size.
    pub total: u32,
}

/// Error returned when an HTTP request fails validation.
///
/// Raised before a request is sent, so no network I/O takes place.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::MissingBody {
///     method: "post".to_string(),
/// };
///
/// assert_eq!(error.to_string(), "Cannot use post without specifying data.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The target URL is not an absolute URL.
    #[error("Invalid request URL '{url}'.")]
    InvalidUrl {
        /// The URL that was provided.
        url: String,
    },

    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {reason}")]
    Encode {
        /// The serializer's description of the failure.
        reason: String,
    },
}

/// Unified error type for all HTTP-related errors.
///
/// ```rust,ignore
/// match result {
///     Ok(response) => { /* inspect response.status() */ }
///     Err(HttpError::Transport(e)) => { /* network failure */ }
///     Err(HttpError::InvalidRequest(e)) => { /* rejected before sending */ }
///     Err(HttpError::MaxRetries(e)) => { /* only with ExhaustionPolicy::Fail */ }
///     Err(HttpError::RateLimitExceeded(e)) => { /* only in strict mode */ }
/// }
/// ```
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or connection error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// The call-limit bucket has no remaining capacity.
    #[error(transparent)]
    RateLimitExceeded(#[from] RateLimitExceededError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message_includes_kind_and_code() {
        let error = TransportError::new(TransportErrorKind::Timeout, "operation timed out");
        let message = error.to_string();
        assert!(message.contains("timeout"));
        assert!(message.contains("code 3"));
        assert!(message.contains("operation timed out"));
    }

    #[test]
    fn test_transport_error_codes_are_distinct() {
        let kinds = [
            TransportErrorKind::Builder,
            TransportErrorKind::Connect,
            TransportErrorKind::Timeout,
            TransportErrorKind::Request,
            TransportErrorKind::Body,
            TransportErrorKind::Redirect,
            TransportErrorKind::Other,
        ];
        let mut codes: Vec<u16> = kinds.iter().map(|k| k.code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_max_retries_error_includes_retry_count() {
        let error = MaxHttpRetriesExceededError {
            code: 503,
            tries: 4,
            error_reference: Some("req-1".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains('4'));
        assert!(message.contains("503"));
    }

    #[test]
    fn test_invalid_url_error_message() {
        let error = InvalidHttpRequestError::InvalidUrl {
            url: "products.json".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid request URL 'products.json'.");
    }

    #[test]
    fn test_http_error_is_transparent() {
        let error: HttpError = RateLimitExceededError { used: 80, total: 80 }.into();
        assert_eq!(error.to_string(), "API call limit exhausted (80/80).");
    }

    #[test]
    fn test_error_types_implement_std_error() {
        let _: &dyn std::error::Error = &TransportError::new(TransportErrorKind::Other, "x");
        let _: &dyn std::error::Error = &InvalidHttpRequestError::Encode {
            reason: "x".to_string(),
        };
        let _: &dyn std::error::Error = &HttpError::from(MaxHttpRetriesExceededError {
            code: 429,
            tries: 3,
            error_reference: None,
        });
    }
}
