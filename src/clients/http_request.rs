//! HTTP request types for the request engine.
//!
//! This module provides the [`HttpRequest`] type, its builder, and the
//! case-insensitive [`RequestHeaders`] map.

use std::collections::BTreeMap;
use std::fmt;

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods supported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for updating resources.
    Put,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl HttpMethod {
    /// Returns the upper-case wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` for methods that may be repeated without side effects.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Content type for HTTP request bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// JSON content type (`application/json`).
    Json,
    /// GraphQL content type (`application/graphql`).
    GraphQL,
}

impl DataType {
    /// Returns the MIME type string for this data type.
    #[must_use]
    pub const fn as_content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::GraphQL => "application/graphql",
        }
    }
}

/// Request headers with case-insensitive names.
///
/// Inserting a header whose name matches an existing one (ignoring case)
/// replaces it; the most recently supplied spelling of the name is kept.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::RequestHeaders;
///
/// let mut headers = RequestHeaders::new();
/// headers.insert("Content-type", "application/graphql");
/// headers.insert("Content-Type", "application/json");
///
/// assert_eq!(headers.len(), 1);
/// assert_eq!(headers.get("content-type"), Some("application/json"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: BTreeMap<String, (String, String)>,
}

impl RequestHeaders {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any existing value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    /// Returns the value for `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if a header named `name` is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Removes the header named `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries
            .remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Returns the number of distinct headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs using the names as supplied.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for RequestHeaders {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// An HTTP request ready to be dispatched.
///
/// The body is already encoded; `Content-Type` and `Content-Length` in
/// `headers` describe the encoded bytes. A request is never modified once
/// handed to the engine.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::{DataType, HttpMethod, HttpRequest};
///
/// let request = HttpRequest::builder(HttpMethod::Post, "https://shop.myshopify.com/admin/api/2024-10/graphql.json")
///     .body(b"{ shop { name } }".to_vec(), DataType::GraphQL)
///     .header("X-Shopify-Access-Token", "token")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.headers.get("content-type"), Some("application/graphql"));
/// assert_eq!(request.headers.get("content-length"), Some("17"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The absolute target URL.
    pub url: String,
    /// Headers to send.
    pub headers: RequestHeaders,
    /// The encoded request body, if any.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `url` is not an absolute `http`/`https` URL
    /// - `http_method` is `Post` or `Put` but `body` is `None`
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        let valid_url = reqwest::Url::parse(&self.url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid_url {
            return Err(InvalidHttpRequestError::InvalidUrl {
                url: self.url.clone(),
            });
        }

        if matches!(self.http_method, HttpMethod::Post | HttpMethod::Put) && self.body.is_none() {
            return Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            });
        }

        Ok(())
    }

    /// Returns the body as UTF-8 text for logging, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: String,
    headers: RequestHeaders,
    body: Option<(Vec<u8>, DataType)>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            http_method: method,
            url: url.into(),
            headers: RequestHeaders::new(),
            body: None,
        }
    }

    /// Sets the encoded body and the content type describing it.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>, body_type: DataType) -> Self {
        self.body = Some((body, body_type));
        self
    }

    /// Merges a set of headers, later values replacing earlier ones.
    #[must_use]
    pub fn headers(mut self, headers: RequestHeaders) -> Self {
        for (name, value) in headers.iter() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// `Content-Length` is derived from the body. `Content-Type` comes from
    /// the body's [`DataType`] unless one was supplied as a header.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let mut headers = self.headers;
        let body = self.body.map(|(bytes, body_type)| {
            if !headers.contains("Content-Type") {
                headers.insert("Content-Type", body_type.as_content_type());
            }
            headers.insert("Content-Length", bytes.len().to_string());
            bytes
        });

        let request = HttpRequest {
            http_method: self.http_method,
            url: self.url,
            headers,
            body,
        };
        request.verify()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://test-shop.myshopify.com/admin/api/2024-10/products.json";

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "get");
        assert_eq!(HttpMethod::Post.to_string(), "post");
        assert_eq!(HttpMethod::Put.to_string(), "put");
        assert_eq!(HttpMethod::Delete.to_string(), "delete");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_only_post_is_not_idempotent() {
        assert!(HttpMethod::Get.is_idempotent());
        assert!(HttpMethod::Put.is_idempotent());
        assert!(HttpMethod::Delete.is_idempotent());
        assert!(!HttpMethod::Post.is_idempotent());
    }

    #[test]
    fn test_data_type_content_type() {
        assert_eq!(DataType::Json.as_content_type(), "application/json");
        assert_eq!(DataType::GraphQL.as_content_type(), "application/graphql");
    }

    #[test]
    fn test_headers_are_case_insensitive_last_write_wins() {
        let mut headers = RequestHeaders::new();
        headers.insert("X-Custom", "one");
        headers.insert("x-custom", "two");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-CUSTOM"), Some("two"));
        assert_eq!(headers.iter().next(), Some(("x-custom", "two")));
        assert_eq!(headers.remove("X-Custom"), Some("two".to_string()));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_builder_creates_valid_get_request() {
        let request = HttpRequest::builder(HttpMethod::Get, URL).build().unwrap();

        assert_eq!(request.http_method, HttpMethod::Get);
        assert_eq!(request.url, URL);
        assert!(request.body.is_none());
        assert!(!request.headers.contains("Content-Type"));
    }

    #[test]
    fn test_builder_keeps_explicit_content_type() {
        let request = HttpRequest::builder(HttpMethod::Post, URL)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(b"a=1".to_vec(), DataType::Json)
            .build()
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.headers.get("Content-Length"), Some("3"));
    }

    #[test]
    fn test_builder_sets_content_headers_from_encoded_body() {
        let body = br#"{"product":{"title":"Test"}}"#.to_vec();
        let request = HttpRequest::builder(HttpMethod::Post, URL)
            .body(body.clone(), DataType::Json)
            .build()
            .unwrap();

        assert_eq!(request.headers.get("Content-Type"), Some("application/json"));
        assert_eq!(
            request.headers.get("Content-Length"),
            Some(body.len().to_string().as_str())
        );
        assert_eq!(request.body, Some(body));
    }

    #[test]
    fn test_verify_requires_body_for_post_and_put() {
        let result = HttpRequest::builder(HttpMethod::Post, URL).build();
        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::MissingBody { method }) if method == "post"
        ));

        let result = HttpRequest::builder(HttpMethod::Put, URL).build();
        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::MissingBody { method }) if method == "put"
        ));
    }

    #[test]
    fn test_verify_rejects_relative_urls() {
        let result = HttpRequest::builder(HttpMethod::Get, "products.json").build();
        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::InvalidUrl { .. })
        ));

        let result = HttpRequest::builder(HttpMethod::Get, "ftp://example.com/file").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_headers_from_iterator() {
        let headers: RequestHeaders = [("A", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("a"), Some("3"));
    }
}
