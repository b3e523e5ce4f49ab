//! Integration tests for the request engine.
//!
//! These tests drive [`HttpClient`] through its public seams: the real
//! reqwest transport against a mock server, and a caller-supplied transport
//! and logger with Tokio's paused clock for exact wait timings.

use serde_json::json;
use shopify_engine::clients::throttle::{GraphqlThrottlePolicy, RestThrottlePolicy};
use shopify_engine::clients::{
    DataType, HttpClient, HttpMethod, HttpRequest, LogContext, NoopLogger, RawExchange,
    RequestHeaders, RequestLogger, Transport, TransportError, TransportErrorKind,
};
use shopify_engine::{EngineConfig, HttpError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://test-shop.myshopify.com/admin/api/2024-10/shop.json";

/// A transport that answers every call with the same status and body.
struct FixedTransport {
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Transport for FixedTransport {
    async fn execute(&self, _request: &HttpRequest) -> Result<RawExchange, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawExchange::from_parts(
            self.status,
            self.headers.iter().copied(),
            self.body.as_bytes().to_vec(),
        ))
    }
}

/// A transport whose connection always fails.
struct FailingTransport {
    calls: Arc<AtomicUsize>,
}

impl Transport for FailingTransport {
    async fn execute(&self, _request: &HttpRequest) -> Result<RawExchange, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::new(
            TransportErrorKind::Connect,
            "Could not resolve host: test-shop.myshopify.com",
        ))
    }
}

#[derive(Default)]
struct CollectingLogger {
    attempts: Mutex<Vec<(u32, u16)>>,
}

impl RequestLogger for CollectingLogger {
    fn info(&self, _message: &str, context: &LogContext) {
        self.attempts
            .lock()
            .unwrap()
            .push((context.attempt, context.status));
    }

    fn warning(&self, _message: &str, _context: &LogContext) {}
}

fn fixed(status: u16, body: &'static str) -> (FixedTransport, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = FixedTransport {
        status,
        headers: Vec::new(),
        body,
        calls: Arc::clone(&calls),
    };
    (transport, calls)
}

fn get_request() -> HttpRequest {
    HttpRequest::builder(HttpMethod::Get, URL).build().unwrap()
}

// ============================================================================
// Reqwest Transport Tests
// ============================================================================

#[tokio::test]
async fn test_raw_get_returns_body_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-10/shop.json"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"shop":{"id":1}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(EngineConfig::default()).unwrap();
    let response = client
        .get(&format!("{}/admin/api/2024-10/shop.json", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.into_inner(), br#"{"shop":{"id":1}}"#.to_vec());
}

#[tokio::test]
async fn test_raw_post_sends_content_type_of_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/graphql"))
        .and(body_string("{ shop { id } }"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(EngineConfig::default()).unwrap();
    let response = client
        .post(
            &format!("{}/graphql.json", server.uri()),
            b"{ shop { id } }".to_vec(),
            DataType::GraphQL,
            None,
        )
        .await
        .unwrap();

    assert!(response.is_ok());
}

#[tokio::test]
async fn test_raw_post_keeps_caller_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("a=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = RequestHeaders::new();
    headers.insert("Content-Type", "application/x-www-form-urlencoded");

    let client = HttpClient::new(EngineConfig::default()).unwrap();
    let response = client
        .post(
            &format!("{}/admin/oauth/access_token", server.uri()),
            b"a=1".to_vec(),
            DataType::Json,
            Some(headers),
        )
        .await
        .unwrap();

    assert!(response.is_ok());
}

#[tokio::test]
async fn test_user_agent_prefix_is_sent() {
    let server = MockServer::start().await;
    let config = EngineConfig::builder()
        .user_agent_prefix("MyApp/1.0")
        .build()
        .unwrap();
    let client = HttpClient::new(config).unwrap();
    let user_agent = client
        .default_headers()
        .get("user-agent")
        .unwrap()
        .to_string();
    Mock::given(method("GET"))
        .and(header("user-agent", user_agent.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.get(&server.uri(), None).await.unwrap();

    assert!(user_agent.starts_with("MyApp/1.0 | "));
}

#[tokio::test]
async fn test_redirects_are_returned_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(303).insert_header("Location", "/new"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(EngineConfig::default()).unwrap();
    let completed = client
        .request(
            HttpRequest::builder(HttpMethod::Get, format!("{}/old", server.uri()))
                .build()
                .unwrap(),
            &RestThrottlePolicy,
        )
        .await
        .unwrap();

    assert_eq!(completed.response.code, 303);
    assert_eq!(completed.response.header("location"), Some("/new"));
}

// ============================================================================
// Custom Transport Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_attempts_never_exceed_budget() {
    let (transport, calls) = fixed(503, "busy");
    let config = EngineConfig::builder().max_attempts(5).build().unwrap();
    let client = HttpClient::with_transport(transport, config).with_logger(Arc::new(NoopLogger));
    let started = Instant::now();

    let completed = client
        .request(get_request(), &RestThrottlePolicy)
        .await
        .unwrap();

    // 1 + 2 + 4 + 8 seconds between five attempts
    assert_eq!(started.elapsed(), Duration::from_secs(15));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(completed.attempts, 5);
    assert!(completed.exhausted);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_called_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = FailingTransport {
        calls: Arc::clone(&calls),
    };
    let client = HttpClient::with_transport(transport, EngineConfig::default())
        .with_logger(Arc::new(NoopLogger));

    let error = client
        .request(get_request(), &RestThrottlePolicy)
        .await
        .unwrap_err();

    assert!(matches!(error, HttpError::Transport(ref e) if e.code() == 2));
    assert!(error.to_string().contains("Could not resolve host"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_logger_receives_each_attempt() {
    let (transport, _calls) = fixed(520, "");
    let logger = Arc::new(CollectingLogger::default());
    let client = HttpClient::with_transport(transport, EngineConfig::default())
        .with_logger(logger.clone());

    client
        .request(get_request(), &RestThrottlePolicy)
        .await
        .unwrap();

    assert_eq!(
        *logger.attempts.lock().unwrap(),
        vec![(0, 520), (1, 520), (2, 520)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sustained_graphql_throttle_returns_last_response() {
    let body = json!({
        "errors": [{ "message": "Throttled", "extensions": { "code": "THROTTLED" } }],
        "extensions": { "cost": {
            "requestedQueryCost": 600,
            "throttleStatus": { "maximumAvailable": 1000.0, "currentlyAvailable": 400, "restoreRate": 50.0 }
        }}
    })
    .to_string();
    let body: &'static str = Box::leak(body.into_boxed_str());
    let (transport, calls) = fixed(200, body);
    let client = HttpClient::with_transport(transport, EngineConfig::default())
        .with_logger(Arc::new(NoopLogger));
    let started = Instant::now();

    let completed = client
        .request(get_request(), &GraphqlThrottlePolicy)
        .await
        .unwrap();

    // (600 - 400) / 50 = 4 seconds before each of the two retries
    assert_eq!(started.elapsed(), Duration::from_secs(8));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(completed.response.code, 200);
    assert!(completed.exhausted);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_request_cancels_wait() {
    let (transport, calls) = fixed(503, "");
    let client = HttpClient::with_transport(transport, EngineConfig::default())
        .with_logger(Arc::new(NoopLogger));

    let result = tokio::time::timeout(
        Duration::from_millis(500),
        client.request(get_request(), &RestThrottlePolicy),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
