//! REST client implementation.

use serde_json::Value;

use crate::clients::encoder::JsonEncoder;
use crate::clients::errors::HttpError;
use crate::clients::http_client::HttpClient;
use crate::clients::http_request::{HttpMethod, RequestHeaders};
use crate::clients::http_response::ApiResponse;
use crate::clients::throttle::RestThrottlePolicy;
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::config::EngineConfig;

/// JSON client for the REST Admin API.
///
/// Provides `get`, `post`, `put` and `delete` over the retrying
/// [`HttpClient`]. URLs are used as given and must be absolute.
///
/// # Thread Safety
///
/// `RestClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_engine::{EngineConfig, RestClient};
///
/// let client = RestClient::new(EngineConfig::default())?;
///
/// let response = client
///     .get("https://my-store.myshopify.com/admin/api/2024-10/shop.json", None)
///     .await?;
/// println!("{}", response["shop"]["name"]);
/// ```
#[derive(Debug)]
pub struct RestClient<T: Transport = ReqwestTransport> {
    http_client: HttpClient<T>,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl RestClient<ReqwestTransport> {
    /// Creates a REST client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the underlying HTTP client cannot
    /// be created.
    pub fn new(config: EngineConfig) -> Result<Self, HttpError> {
        Ok(Self::from_http_client(HttpClient::new(config)?))
    }
}

impl<T: Transport> RestClient<T> {
    /// Wraps an existing engine, keeping its transport, logger and config.
    #[must_use]
    pub const fn from_http_client(http_client: HttpClient<T>) -> Self {
        Self { http_client }
    }

    /// Returns the underlying engine.
    #[must_use]
    pub const fn http_client(&self) -> &HttpClient<T> {
        &self.http_client
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failure or an invalid URL.
    pub async fn get(
        &self,
        url: &str,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, HttpError> {
        self.make_request(HttpMethod::Get, url, None, headers).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// POST is not idempotent; it is still retried on throttling and
    /// server-busy statuses, which Shopify returns before processing.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failure or an invalid URL.
    pub async fn post(
        &self,
        url: &str,
        body: &Value,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, HttpError> {
        self.make_request(HttpMethod::Post, url, Some(body), headers)
            .await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failure or an invalid URL.
    pub async fn put(
        &self,
        url: &str,
        body: &Value,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, HttpError> {
        self.make_request(HttpMethod::Put, url, Some(body), headers)
            .await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failure or an invalid URL.
    pub async fn delete(
        &self,
        url: &str,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, HttpError> {
        self.make_request(HttpMethod::Delete, url, None, headers)
            .await
    }

    async fn make_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, HttpError> {
        let completed = self
            .http_client
            .dispatch(method, url, body, &JsonEncoder, headers, &RestThrottlePolicy)
            .await?;
        Ok(completed.into_api_response(|response| response.json_body()))
    }
}
