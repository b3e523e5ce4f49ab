//! GraphQL-specific error types.
//!
//! GraphQL-level errors (user errors, validation errors) arrive with HTTP
//! status 200 and stay in the response body. The exception is a `THROTTLED`
//! error, which the engine retries on its own. This module only covers
//! failures of the request itself:
//!
//! - [`GraphqlError::MissingAccessToken`]: rejected before any network I/O
//! - [`GraphqlError::UnsupportedMethod`]: rejected before any network I/O
//! - [`GraphqlError::Http`]: wraps the engine's [`HttpError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_engine::clients::graphql::GraphqlError;
//!
//! match client.post(url, "{ shop { name } }", None, None).await {
//!     Ok(response) => println!("{}", response["data"]),
//!     Err(GraphqlError::MissingAccessToken) => println!("configure a token first"),
//!     Err(e) => println!("{e}"),
//! }
//! ```

use crate::clients::{HttpError, HttpMethod};
use thiserror::Error;

/// Error type for GraphQL façade operations.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::graphql::GraphqlError;
/// use shopify_engine::clients::HttpMethod;
///
/// let error = GraphqlError::UnsupportedMethod { method: HttpMethod::Get };
/// assert_eq!(error.to_string(), "Only POST method is allowed for GraphQL, got get.");
/// ```
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// No `X-Shopify-Access-Token` header was configured or supplied.
    #[error("The GraphQL Admin API requires an access token for making authenticated requests.")]
    MissingAccessToken,

    /// GET, PUT and DELETE are not part of the GraphQL façade.
    #[error("Only POST method is allowed for GraphQL, got {method}.")]
    UnsupportedMethod {
        /// The method that was attempted.
        method: HttpMethod,
    },

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl GraphqlError {
    /// Returns `true` for errors raised before any request was sent.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::MissingAccessToken | Self::UnsupportedMethod { .. })
    }
}
