//! The retrying request engine.
//!
//! [`HttpClient`] drives every logical request through a bounded attempt
//! loop. Each attempt is one [`Transport`] exchange whose parsed response is
//! classified exactly once:
//!
//! - `502`, `503`, `520` and `406` are server-busy and retried after `2^n`
//!   seconds, where `n` is the zero-based attempt index
//! - `429` is retried after the `Retry-After` value rounded up to whole
//!   seconds, plus the configured grace, capped at
//!   [`max_wait`](EngineConfig::max_wait)
//! - anything else is handed to the request's [`ThrottlePolicy`], which may
//!   accept it, accept it after a protective pause, ask for a retry (GraphQL
//!   `THROTTLED`), or refuse it in strict mode
//!
//! Transport failures end the request immediately. When the attempt budget
//! runs out, the last response is returned unless
//! [`ExhaustionPolicy::Fail`] is configured.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::clients::encoder::BodyEncoder;
use crate::clients::errors::{
    HttpError, InvalidHttpRequestError, MaxHttpRetriesExceededError, RateLimitExceededError,
    TransportError, TransportErrorKind,
};
use crate::clients::http_request::{DataType, HttpMethod, HttpRequest, RequestHeaders};
use crate::clients::http_response::{ApiResponse, HttpResponse};
use crate::clients::logger::{LogContext, RequestLogger, TracingLogger};
use crate::clients::throttle::{RestThrottlePolicy, ThrottlePolicy, ThrottleVerdict};
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::config::{EngineConfig, ExhaustionPolicy};

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Statuses treated as "server busy" and retried with exponential backoff.
pub const SERVER_BUSY_STATUSES: [u16; 4] = [502, 503, 520, 406];

/// How one attempt ends, decided once per loop iteration.
#[derive(Debug)]
enum Step {
    Accept,
    AcceptAfter(Duration),
    Retry(Duration),
    Refuse(RateLimitExceededError),
}

/// The final response of a logical request and how it was reached.
#[derive(Clone, Debug, PartialEq)]
pub struct Completed {
    /// The response of the last attempt.
    pub response: HttpResponse,
    /// Number of transport calls made.
    pub attempts: u32,
    /// `true` when the attempt budget ran out on a retryable status.
    pub exhausted: bool,
}

impl Completed {
    /// Wraps the decoded body together with the call diagnostics.
    #[must_use]
    pub fn into_api_response<T>(self, decode: impl FnOnce(HttpResponse) -> T) -> ApiResponse<T> {
        let Self {
            response,
            attempts,
            exhausted,
        } = self;
        ApiResponse::new((), &response, attempts, exhausted).map(|()| decode(response))
    }
}

/// Rate-limit-aware HTTP client for the Shopify Admin APIs.
///
/// The client owns a [`Transport`], the [`EngineConfig`], a
/// [`RequestLogger`] and the default headers merged into every request.
/// It keeps no state between requests, so one client can serve any number
/// of concurrent callers.
///
/// The methods [`get`](Self::get), [`post`](Self::post), [`put`](Self::put)
/// and [`delete`](Self::delete) send raw bytes and apply the REST call-limit
/// policy. [`RestClient`](crate::clients::RestClient) and
/// [`GraphqlClient`](crate::clients::GraphqlClient) build on
/// [`dispatch`](Self::dispatch) with their own encoder and policy.
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_engine::{EngineConfig, HttpClient};
///
/// let client = HttpClient::new(EngineConfig::default())?;
/// let response = client
///     .get("https://my-store.myshopify.com/admin/api/2024-10/shop.json", None)
///     .await?;
///
/// println!("{} after {} attempts", response.status(), response.attempts());
/// ```
pub struct HttpClient<T: Transport = ReqwestTransport> {
    transport: T,
    config: EngineConfig,
    logger: Arc<dyn RequestLogger>,
    default_headers: RequestHeaders,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl<T: Transport> fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl HttpClient<ReqwestTransport> {
    /// Creates a client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the underlying HTTP client cannot
    /// be created (e.g. TLS initialization failure).
    pub fn new(config: EngineConfig) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> HttpClient<T> {
    /// Creates a client that sends requests through `transport`.
    #[must_use]
    pub fn with_transport(transport: T, config: EngineConfig) -> Self {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}Shopify Request Engine v{SDK_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = RequestHeaders::new();
        default_headers.insert("User-Agent", user_agent);
        default_headers.insert("Accept", "application/json");

        Self {
            transport,
            config,
            logger: Arc::new(TracingLogger),
            default_headers,
        }
    }

    /// Replaces the logger that receives per-attempt telemetry.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the headers merged into every request.
    #[must_use]
    pub const fn default_headers(&self) -> &RequestHeaders {
        &self.default_headers
    }

    /// Assembles a request from the default headers, caller headers and an
    /// encoded body.
    ///
    /// Caller headers override defaults. A caller-supplied `Content-Type`
    /// takes precedence over the body's [`DataType`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<(Vec<u8>, DataType)>,
        headers: Option<RequestHeaders>,
    ) -> Result<HttpRequest, InvalidHttpRequestError> {
        let mut builder =
            HttpRequest::builder(method, url).headers(self.default_headers.clone());
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }
        if let Some((bytes, data_type)) = body {
            builder = builder.body(bytes, data_type);
        }
        builder.build()
    }

    /// Encodes a body with `encoder`, builds the request and runs it to
    /// completion under `policy`.
    ///
    /// The encoder decides `Content-Type`; a caller-supplied one is dropped.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request). Encoding failures are reported as
    /// [`HttpError::InvalidRequest`].
    pub async fn dispatch<E: BodyEncoder>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&E::Body>,
        encoder: &E,
        headers: Option<RequestHeaders>,
        policy: &dyn ThrottlePolicy,
    ) -> Result<Completed, HttpError> {
        let encoded = body.map(|body| encoder.encode(body)).transpose()?;
        let headers = match (&encoded, headers) {
            (Some(_), Some(mut headers)) => {
                headers.remove("Content-Type");
                Some(headers)
            }
            (_, headers) => headers,
        };
        let request = self.build_request(method, url, encoded, headers)?;
        self.request(request, policy).await
    }

    /// Runs one logical request through the retry loop.
    ///
    /// At most [`max_attempts`](EngineConfig::max_attempts) transport calls
    /// are made. Every attempt is reported to the logger.
    ///
    /// # Errors
    ///
    /// - [`HttpError::InvalidRequest`] if the request fails validation; no
    ///   transport call is made
    /// - [`HttpError::Transport`] on the first transport failure, or when the
    ///   transport output has no readable status line
    /// - [`HttpError::RateLimitExceeded`] when strict mode finds the call
    ///   limit bucket full
    /// - [`HttpError::MaxRetries`] when attempts run out and
    ///   [`ExhaustionPolicy::Fail`] is configured
    pub async fn request(
        &self,
        request: HttpRequest,
        policy: &dyn ThrottlePolicy,
    ) -> Result<Completed, HttpError> {
        request.verify()?;

        let max_attempts = self.config.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            let started = Instant::now();
            let exchange = self.transport.execute(&request).await?;
            let elapsed = started.elapsed();

            let response =
                HttpResponse::parse(&exchange.raw, exchange.header_size).ok_or_else(|| {
                    TransportError::new(
                        TransportErrorKind::Body,
                        "response has no readable status line",
                    )
                })?;

            if let Some(reason) = response.deprecation_reason() {
                tracing::warn!(
                    "Deprecated request to Shopify API at {}, received reason: {}",
                    request.url,
                    reason
                );
            }

            let assessment = policy.assess(&response, &self.config);
            if self.logger.enabled() {
                let context = LogContext::exchange(&request, &response, attempt, elapsed)
                    .with_cost(assessment.cost);
                self.logger.info("Shopify API request", &context);
                if let Some(warning) = assessment
                    .cost
                    .and_then(|cost| cost.high_cost_warning(&self.config))
                {
                    self.logger.warning(&warning, &context);
                }
            }

            let attempts = attempt + 1;
            match self.classify(&response, attempt, assessment.verdict) {
                Step::Accept => {
                    return Ok(Completed {
                        response,
                        attempts,
                        exhausted: false,
                    });
                }
                Step::AcceptAfter(pause) => {
                    tracing::debug!(
                        status = response.code,
                        pause_ms = duration_ms(pause),
                        "Call limit nearly exhausted, pausing before returning"
                    );
                    tokio::time::sleep(pause).await;
                    return Ok(Completed {
                        response,
                        attempts,
                        exhausted: false,
                    });
                }
                Step::Refuse(error) => {
                    tracing::warn!(
                        used = error.used,
                        total = error.total,
                        "Refusing request: API call limit exhausted"
                    );
                    return Err(error.into());
                }
                Step::Retry(_) if attempts >= max_attempts => {
                    return self.exhausted(response, attempts);
                }
                Step::Retry(wait) => {
                    tracing::debug!(
                        status = response.code,
                        attempt,
                        idempotent = request.http_method.is_idempotent(),
                        wait_ms = duration_ms(wait),
                        "Retrying Shopify API request"
                    );
                    tokio::time::sleep(wait).await;
                    attempt = attempts;
                }
            }
        }
    }

    /// Sends a GET request and returns the raw response body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(
        &self,
        url: &str,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Vec<u8>>, HttpError> {
        self.send_bytes(HttpMethod::Get, url, None, headers).await
    }

    /// Sends a POST request with an encoded body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        data_type: DataType,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Vec<u8>>, HttpError> {
        self.send_bytes(HttpMethod::Post, url, Some((body, data_type)), headers)
            .await
    }

    /// Sends a PUT request with an encoded body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(
        &self,
        url: &str,
        body: Vec<u8>,
        data_type: DataType,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Vec<u8>>, HttpError> {
        self.send_bytes(HttpMethod::Put, url, Some((body, data_type)), headers)
            .await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(
        &self,
        url: &str,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Vec<u8>>, HttpError> {
        self.send_bytes(HttpMethod::Delete, url, None, headers)
            .await
    }

    async fn send_bytes(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<(Vec<u8>, DataType)>,
        headers: Option<RequestHeaders>,
    ) -> Result<ApiResponse<Vec<u8>>, HttpError> {
        let request = self.build_request(method, url, body, headers)?;
        let completed = self.request(request, &RestThrottlePolicy).await?;
        Ok(completed.into_api_response(|response| response.body))
    }

    fn classify(&self, response: &HttpResponse, attempt: u32, verdict: ThrottleVerdict) -> Step {
        match response.code {
            code if SERVER_BUSY_STATUSES.contains(&code) => Step::Retry(backoff(attempt)),
            429 => {
                let header_wait = response.retry_after().map_or_else(
                    || self.config.default_retry_wait(),
                    |wait| wait.saturating_add(self.config.retry_after_grace()),
                );
                let wait = match verdict {
                    ThrottleVerdict::Throttled(body_wait) => header_wait.max(body_wait),
                    _ => header_wait,
                };
                Step::Retry(wait.min(self.config.max_wait()))
            }
            _ => match verdict {
                ThrottleVerdict::Clear => Step::Accept,
                // The courtesy pause only precedes a successful response.
                ThrottleVerdict::Pause(pause) if pause.is_zero() || !response.is_ok() => {
                    Step::Accept
                }
                ThrottleVerdict::Pause(pause) => Step::AcceptAfter(pause),
                ThrottleVerdict::Throttled(wait) => Step::Retry(wait.min(self.config.max_wait())),
                ThrottleVerdict::Refuse(error) => Step::Refuse(error),
            },
        }
    }

    fn exhausted(&self, response: HttpResponse, attempts: u32) -> Result<Completed, HttpError> {
        tracing::warn!(
            status = response.code,
            attempts,
            "Shopify API request still failing after the final attempt"
        );
        match self.config.exhaustion_policy() {
            ExhaustionPolicy::ReturnLastResponse => Ok(Completed {
                response,
                attempts,
                exhausted: true,
            }),
            ExhaustionPolicy::Fail => Err(MaxHttpRetriesExceededError {
                code: response.code,
                tries: attempts,
                error_reference: response.request_id().map(String::from),
            }
            .into()),
        }
    }
}

/// Server-busy wait for a zero-based attempt index: 1s, 2s, 4s, ...
#[must_use]
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
