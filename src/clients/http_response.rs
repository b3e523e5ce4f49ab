//! HTTP response types for the request engine.
//!
//! This module provides [`HttpResponse`], parsed from the raw bytes produced
//! by a [`Transport`](crate::clients::Transport), the [`ApiCallLimit`] usage
//! value read from Shopify's leaky-bucket header, and [`ApiResponse`], the
//! per-call result handed to façade callers.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Name of the REST leaky-bucket usage header.
pub const CALL_LIMIT_HEADER: &str = "x-shopify-shop-api-call-limit";

/// Rate limit information parsed from the `X-Shopify-Shop-Api-Call-Limit` header.
///
/// The header format is "X/Y" where X is the current request count and Y is
/// the bucket size.
///
/// # Example
///
/// ```rust
/// use shopify_engine::clients::ApiCallLimit;
///
/// let limit = ApiCallLimit::parse("39/40").unwrap();
/// assert_eq!(limit.request_count, 39);
/// assert_eq!(limit.bucket_size, 40);
/// assert_eq!(limit.remaining(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiCallLimit {
    /// The current number of requests made in this bucket.
    pub request_count: u32,
    /// The maximum number of requests allowed in this bucket.
    pub bucket_size: u32,
}

impl ApiCallLimit {
    /// Parses the rate limit header value.
    ///
    /// Returns `None` unless the value is exactly two unsigned integers
    /// separated by a slash (surrounding whitespace is ignored).
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let (used, total) = header_value.trim().split_once('/')?;
        let request_count = used.trim().parse().ok()?;
        let bucket_size = total.trim().parse().ok()?;

        Some(Self {
            request_count,
            bucket_size,
        })
    }

    /// Returns the number of requests that still fit in the bucket.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.bucket_size.saturating_sub(self.request_count)
    }

    /// Returns `true` once the bucket has no remaining capacity.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.request_count >= self.bucket_size
    }
}

/// An HTTP response received from the API.
///
/// Header names are stored lower-cased and every occurrence of a repeated
/// header is kept, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: Vec<u8>,
    /// Rate limit information (from `X-Shopify-Shop-Api-Call-Limit` header).
    pub api_call_limit: Option<ApiCallLimit>,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the Shopify-specific headers.
    ///
    /// Header names are lower-cased; values for names that differ only in
    /// case are merged.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: Vec<u8>) -> Self {
        let mut normalized: HashMap<String, Vec<String>> = HashMap::new();
        for (name, values) in headers {
            normalized
                .entry(name.to_ascii_lowercase())
                .or_default()
                .extend(values);
        }

        let mut response = Self {
            code,
            headers: normalized,
            body,
            api_call_limit: None,
            retry_request_after: None,
        };

        response.api_call_limit = response.header(CALL_LIMIT_HEADER).and_then(ApiCallLimit::parse);
        response.retry_request_after = response
            .header("retry-after")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|seconds| seconds.is_finite());

        response
    }

    /// Parses the raw output of a transport exchange.
    ///
    /// The first `header_size` bytes hold the status line and header block
    /// (CRLF separated, terminated by an empty line); the rest is the body.
    /// When the header section contains several blocks, as with an interim
    /// `100 Continue`, the last block describes the final response.
    ///
    /// Header lines without a `:` are skipped rather than failing the
    /// response. Returns `None` only when no status line can be read.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shopify_engine::clients::HttpResponse;
    ///
    /// let head = "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 2\r\n\r\n";
    /// let raw = format!("{head}{{\"errors\":\"Throttled\"}}");
    ///
    /// let response = HttpResponse::parse(raw.as_bytes(), head.len()).unwrap();
    /// assert_eq!(response.code, 429);
    /// assert_eq!(response.header("retry-after"), Some("2"));
    /// assert_eq!(response.body, br#"{"errors":"Throttled"}"#);
    /// ```
    #[must_use]
    pub fn parse(raw: &[u8], header_size: usize) -> Option<Self> {
        let split = header_size.min(raw.len());
        let (head, body) = raw.split_at(split);
        let head = String::from_utf8_lossy(head);

        let block = head
            .split("\r\n\r\n")
            .filter(|block| !block.trim().is_empty())
            .last()?;

        let mut lines = block.lines().map(|line| line.trim_end_matches('\r'));
        let code = lines
            .next()
            .and_then(|status_line| status_line.split_whitespace().nth(1))
            .and_then(|code| code.parse::<u16>().ok())?;

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            headers
                .entry(name.to_ascii_lowercase())
                .or_default()
                .push(value.trim().to_string());
        }

        Some(Self::new(code, headers, body.to_vec()))
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the value of a header, ignoring case.
    ///
    /// When a header was sent more than once, the last occurrence wins.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns every value received for a header, in arrival order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the `Retry-After` value rounded up to whole seconds.
    ///
    /// Negative values are treated as zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_request_after
            .map(|seconds| Duration::from_secs(seconds.max(0.0).ceil() as u64))
    }

    /// Decodes the body as JSON.
    ///
    /// An empty body decodes to `{}`. A body that is not valid JSON decodes
    /// to `{"raw_body": <text>}` for 5xx responses, so server error pages
    /// stay visible, and to `{}` otherwise.
    #[must_use]
    pub fn json_body(&self) -> serde_json::Value {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::json!({});
        }

        serde_json::from_slice(&self.body).unwrap_or_else(|_| {
            if self.code >= 500 {
                serde_json::json!({ "raw_body": self.body_text() })
            } else {
                serde_json::json!({})
            }
        })
    }

    /// Returns the `X-Request-Id` header value, if present.
    ///
    /// This ID is useful for debugging and should be included in error reports.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `X-Shopify-API-Deprecated-Reason` header value, if present.
    #[must_use]
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.header("x-shopify-api-deprecated-reason")
    }
}

/// The result of a façade call: the decoded body plus call diagnostics.
///
/// `ApiResponse<T>` implements `Deref<Target = T>`, so it can be used like
/// the decoded body directly. The status of the final attempt is kept so
/// callers can tell a success from a response returned after the attempt
/// budget ran out.
///
/// # Example
///
/// ```rust,ignore
/// let response = rest_client.get(url, None).await?;
///
/// if response.exhausted() {
///     println!("still throttled after {} attempts", response.attempts());
/// }
///
/// // Deref to serde_json::Value
/// println!("{}", response["shop"]["name"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
    data: T,
    status: u16,
    attempts: u32,
    exhausted: bool,
    api_call_limit: Option<ApiCallLimit>,
    request_id: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Creates a new response wrapper from the final HTTP response.
    #[must_use]
    pub fn new(data: T, response: &HttpResponse, attempts: u32, exhausted: bool) -> Self {
        Self {
            data,
            status: response.code,
            attempts,
            exhausted,
            api_call_limit: response.api_call_limit,
            request_id: response.request_id().map(String::from),
        }
    }

    /// Consumes the wrapper and returns the decoded body.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns a reference to the decoded body.
    #[must_use]
    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Returns the HTTP status of the final attempt.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns `true` if the final status is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the number of transport calls made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns `true` if the attempt budget ran out before a final answer.
    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns the call-limit usage reported with the final response.
    #[must_use]
    pub const fn api_call_limit(&self) -> Option<ApiCallLimit> {
        self.api_call_limit
    }

    /// Returns the request ID of the final response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Transforms the body, keeping the diagnostics.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            status: self.status,
            attempts: self.attempts,
            exhausted: self.exhausted,
            api_call_limit: self.api_call_limit,
            request_id: self.request_id,
        }
    }
}

impl<T> Deref for ApiResponse<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for ApiResponse<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
