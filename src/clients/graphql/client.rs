//! GraphQL client implementation.

use serde_json::{Map, Value};

use crate::clients::encoder::{GraphqlEncoder, GraphqlQuery};
use crate::clients::graphql::GraphqlError;
use crate::clients::http_client::HttpClient;
use crate::clients::http_request::{HttpMethod, RequestHeaders};
use crate::clients::http_response::ApiResponse;
use crate::clients::throttle::GraphqlThrottlePolicy;
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::config::EngineConfig;

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// GraphQL client for the Admin API.
///
/// The access token can be configured once with
/// [`with_access_token`](Self::with_access_token) or passed per call in the
/// headers. A call without one fails before any request is made.
///
/// # Thread Safety
///
/// `GraphqlClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_engine::{EngineConfig, GraphqlClient};
///
/// let client = GraphqlClient::new(EngineConfig::default())?.with_access_token("shpat_...");
///
/// let response = client
///     .post(
///         "https://my-store.myshopify.com/admin/api/2024-10/graphql.json",
///         "{ shop { name } }",
///         None,
///         None,
///     )
///     .await?;
/// ```
#[derive(Debug)]
pub struct GraphqlClient<T: Transport = ReqwestTransport> {
    http_client: HttpClient<T>,
    access_token: Option<String>,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient<ReqwestTransport> {
    /// Creates a GraphQL client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::Http`] if the underlying HTTP client cannot be
    /// created.
    pub fn new(config: EngineConfig) -> Result<Self, GraphqlError> {
        Ok(Self::from_http_client(HttpClient::new(config)?))
    }
}

impl<T: Transport> GraphqlClient<T> {
    /// Wraps an existing engine, keeping its transport, logger and config.
    #[must_use]
    pub const fn from_http_client(http_client: HttpClient<T>) -> Self {
        Self {
            http_client,
            access_token: None,
        }
    }

    /// Sends `token` as `X-Shopify-Access-Token` on every query.
    ///
    /// A token in the per-call headers takes precedence.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Returns the underlying engine.
    #[must_use]
    pub const fn http_client(&self) -> &HttpClient<T> {
        &self.http_client
    }

    /// Executes a query or mutation.
    ///
    /// Without `variables` the query text is the request body
    /// (`application/graphql`). With `variables` the body is
    /// `{"query": ..., "variables": ...}` (`application/json`).
    ///
    /// # Errors
    ///
    /// - [`GraphqlError::MissingAccessToken`] if no non-empty access token
    ///   is configured or supplied; no request is made
    /// - [`GraphqlError::Http`] for engine failures
    pub async fn post(
        &self,
        url: &str,
        query: &str,
        headers: Option<RequestHeaders>,
        variables: Option<Map<String, Value>>,
    ) -> Result<ApiResponse<Value>, GraphqlError> {
        let headers = self.authenticated_headers(headers)?;

        let query = GraphqlQuery {
            query: query.to_string(),
            variables,
        };

        let completed = self
            .http_client
            .dispatch(
                HttpMethod::Post,
                url,
                Some(&query),
                &GraphqlEncoder,
                Some(headers),
                &GraphqlThrottlePolicy,
            )
            .await?;

        Ok(completed.into_api_response(|response| response.json_body()))
    }

    /// Always fails: GraphQL queries are sent with POST.
    ///
    /// # Errors
    ///
    /// Always returns [`GraphqlError::UnsupportedMethod`].
    pub fn get(
        &self,
        _url: &str,
        _headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, GraphqlError> {
        Err(GraphqlError::UnsupportedMethod {
            method: HttpMethod::Get,
        })
    }

    /// Always fails: GraphQL queries are sent with POST.
    ///
    /// # Errors
    ///
    /// Always returns [`GraphqlError::UnsupportedMethod`].
    pub fn put(
        &self,
        _url: &str,
        _body: &Value,
        _headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, GraphqlError> {
        Err(GraphqlError::UnsupportedMethod {
            method: HttpMethod::Put,
        })
    }

    /// Always fails: GraphQL queries are sent with POST.
    ///
    /// # Errors
    ///
    /// Always returns [`GraphqlError::UnsupportedMethod`].
    pub fn delete(
        &self,
        _url: &str,
        _headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Value>, GraphqlError> {
        Err(GraphqlError::UnsupportedMethod {
            method: HttpMethod::Delete,
        })
    }

    fn authenticated_headers(
        &self,
        headers: Option<RequestHeaders>,
    ) -> Result<RequestHeaders, GraphqlError> {
        let mut merged = RequestHeaders::new();
        if let Some(token) = &self.access_token {
            merged.insert(ACCESS_TOKEN_HEADER, token.as_str());
        }
        if let Some(headers) = headers {
            merged.extend(headers.iter());
        }

        match merged.get(ACCESS_TOKEN_HEADER) {
            Some(token) if !token.trim().is_empty() => Ok(merged),
            _ => Err(GraphqlError::MissingAccessToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GraphqlClient {
        GraphqlClient::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_graphql_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GraphqlClient>();
    }

    #[test]
    fn test_configured_token_is_added_to_headers() {
        let client = client().with_access_token("shpat_configured");

        let headers = client.authenticated_headers(None).unwrap();
        assert_eq!(headers.get("x-shopify-access-token"), Some("shpat_configured"));
    }

    #[test]
    fn test_per_call_token_takes_precedence() {
        let client = client().with_access_token("shpat_configured");
        let mut headers = RequestHeaders::new();
        headers.insert("x-shopify-access-token", "shpat_call");

        let merged = client.authenticated_headers(Some(headers)).unwrap();
        assert_eq!(merged.get(ACCESS_TOKEN_HEADER), Some("shpat_call"));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_missing_or_blank_token_is_rejected() {
        assert!(matches!(
            client().authenticated_headers(None),
            Err(GraphqlError::MissingAccessToken)
        ));

        let mut headers = RequestHeaders::new();
        headers.insert(ACCESS_TOKEN_HEADER, "  ");
        assert!(matches!(
            client().authenticated_headers(Some(headers)),
            Err(GraphqlError::MissingAccessToken)
        ));
    }

    #[test]
    fn test_non_post_methods_are_rejected() {
        let client = client().with_access_token("shpat_token");
        let url = "https://test-shop.myshopify.com/admin/api/2024-10/graphql.json";

        assert!(matches!(
            client.get(url, None),
            Err(GraphqlError::UnsupportedMethod { method: HttpMethod::Get })
        ));
        assert!(matches!(
            client.put(url, &Value::Null, None),
            Err(GraphqlError::UnsupportedMethod { method: HttpMethod::Put })
        ));
        assert!(matches!(
            client.delete(url, None),
            Err(GraphqlError::UnsupportedMethod { method: HttpMethod::Delete })
        ));
    }
}
