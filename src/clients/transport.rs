//! The transport seam: one raw HTTP exchange.
//!
//! A [`Transport`] sends a single [`HttpRequest`] and returns the raw bytes of
//! the response, status line and headers first, followed by the body. The
//! retry controller in [`HttpClient`](crate::clients::HttpClient) parses that
//! output with [`HttpResponse::parse`](crate::clients::HttpResponse::parse).
//!
//! [`ReqwestTransport`] is the production implementation. Tests and callers
//! with special needs can provide their own.

use std::fmt::Write as _;
use std::future::Future;

use crate::clients::errors::TransportError;
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::config::EngineConfig;

/// The raw output of one HTTP exchange.
///
/// `raw[..header_size]` holds the status line and header block, terminated
/// by an empty line; `raw[header_size..]` is the body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawExchange {
    /// Header block followed by body.
    pub raw: Vec<u8>,
    /// Length in bytes of the header block.
    pub header_size: usize,
}

impl RawExchange {
    /// Assembles an exchange from a status, header pairs and a body.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shopify_engine::clients::{HttpResponse, RawExchange};
    ///
    /// let exchange = RawExchange::from_parts(200, [("X-Request-Id", "abc")], b"{}".to_vec());
    /// let response = HttpResponse::parse(&exchange.raw, exchange.header_size).unwrap();
    ///
    /// assert_eq!(response.code, 200);
    /// assert_eq!(response.request_id(), Some("abc"));
    /// ```
    #[must_use]
    pub fn from_parts<'a>(
        status: u16,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
        body: Vec<u8>,
    ) -> Self {
        let mut head = format!("HTTP/1.1 {status}\r\n");
        for (name, value) in headers {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        head.push_str("\r\n");

        let header_size = head.len();
        let mut raw = head.into_bytes();
        raw.extend_from_slice(&body);

        Self { raw, header_size }
    }
}

/// Performs a single HTTP exchange.
///
/// Implementations must not retry and must not follow redirects. A failure to
/// obtain a response (DNS, connect, TLS, timeout) is reported as a
/// [`TransportError`]; any HTTP status, including 4xx and 5xx, is a
/// successful exchange.
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response.
    fn execute(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<RawExchange, TransportError>> + Send;
}

/// [`Transport`] backed by a `reqwest` client.
///
/// The client uses rustls, never follows redirects, and applies the timeouts
/// from [`EngineConfig`]. Each call owns its connection checkout for the
/// duration of the exchange; it is returned to the pool when the call
/// finishes, on success and failure alike.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] of kind `Builder` if the underlying
    /// client cannot be created (e.g. TLS initialization failure).
    pub fn new(config: &EngineConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none());

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    const fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<RawExchange, TransportError> {
        let mut req_builder = self
            .client
            .request(Self::method(request.http_method), &request.url);

        for (name, value) in request.headers.iter() {
            // reqwest derives the length from the body it sends
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let res = req_builder.send().await?;

        let status = res.status();
        let mut head = format!(
            "{:?} {} {}\r\n",
            res.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        for (name, value) in res.headers() {
            let _ = write!(
                head,
                "{}: {}\r\n",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            );
        }
        head.push_str("\r\n");

        let body = res.bytes().await?;

        let header_size = head.len();
        let mut raw = head.into_bytes();
        raw.extend_from_slice(&body);

        Ok(RawExchange { raw, header_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::errors::TransportErrorKind;
    use crate::clients::http_request::DataType;
    use crate::clients::HttpResponse;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_raw_exchange_from_parts_layout() {
        let exchange = RawExchange::from_parts(503, [("Retry-After", "1")], b"busy".to_vec());
        let text = String::from_utf8(exchange.raw.clone()).unwrap();

        assert!(text.starts_with("HTTP/1.1 503\r\n"));
        assert_eq!(&text[exchange.header_size..], "busy");
        assert!(text[..exchange.header_size].ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_execute_returns_parseable_raw_output() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2024-10/shop.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Shopify-Shop-Api-Call-Limit", "1/40")
                    .set_body_string(r#"{"shop":{"name":"Test"}}"#),
            )
            .mount(&mock_server)
            .await;

        let request = HttpRequest::builder(
            HttpMethod::Get,
            format!("{}/admin/api/2024-10/shop.json", mock_server.uri()),
        )
        .build()
        .unwrap();

        let exchange = transport().execute(&request).await.unwrap();
        let response = HttpResponse::parse(&exchange.raw, exchange.header_size).unwrap();

        assert_eq!(response.code, 200);
        assert_eq!(response.api_call_limit.unwrap().request_count, 1);
        assert_eq!(response.body_text(), r#"{"shop":{"name":"Test"}}"#);
    }

    #[tokio::test]
    async fn test_execute_sends_headers_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql.json"))
            .and(header("content-type", "application/graphql"))
            .and(header("x-shopify-access-token", "secret"))
            .and(body_string("{ shop { name } }"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let request = HttpRequest::builder(
            HttpMethod::Post,
            format!("{}/graphql.json", mock_server.uri()),
        )
        .header("X-Shopify-Access-Token", "secret")
        .body(b"{ shop { name } }".to_vec(), DataType::GraphQL)
        .build()
        .unwrap();

        let exchange = transport().execute(&request).await.unwrap();
        let response = HttpResponse::parse(&exchange.raw, exchange.header_size).unwrap();
        assert_eq!(response.code, 200);
    }

    #[tokio::test]
    async fn test_execute_does_not_follow_redirects() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
            .mount(&mock_server)
            .await;

        let request = HttpRequest::builder(HttpMethod::Get, format!("{}/old", mock_server.uri()))
            .build()
            .unwrap();

        let exchange = transport().execute(&request).await.unwrap();
        let response = HttpResponse::parse(&exchange.raw, exchange.header_size).unwrap();

        assert_eq!(response.code, 301);
        assert_eq!(response.header("location"), Some("/new"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_a_transport_error() {
        // Port 9 (discard) on localhost is not listening in test environments
        let request = HttpRequest::builder(HttpMethod::Get, "http://127.0.0.1:9/unreachable")
            .build()
            .unwrap();

        let error = transport().execute(&request).await.unwrap_err();

        assert_eq!(error.kind, TransportErrorKind::Connect);
        assert!(std::error::Error::source(&error).is_some());
    }
}
