//! # Shopify Request Engine
//!
//! An async, rate-limit-aware HTTP engine for the Shopify Admin APIs.
//!
//! ## Overview
//!
//! Shopify enforces two rate-limiting schemes: a leaky bucket reported in the
//! `X-Shopify-Shop-Api-Call-Limit` header for REST, and a query-cost bucket
//! reported in the `extensions.cost` block of GraphQL responses. This crate
//! sends one request at a time to completion while honoring both:
//!
//! - Server-busy statuses (502, 503, 520, 406) are retried with exponential backoff
//! - 429 responses are retried after `Retry-After`
//! - GraphQL `THROTTLED` errors are retried once the cost bucket has refilled
//! - A nearly full REST bucket costs a short protective pause
//! - Transport failures are returned immediately as typed errors
//!
//! Authentication, URL construction and pagination are left to the caller:
//! every request targets a complete URL with whatever headers the caller
//! supplies.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use shopify_engine::{EngineConfig, ExhaustionPolicy};
//!
//! let config = EngineConfig::builder()
//!     .max_attempts(4)
//!     .timeout(Duration::from_secs(30))
//!     .exhaustion_policy(ExhaustionPolicy::ReturnLastResponse)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_attempts(), 4);
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use serde_json::json;
//! use shopify_engine::{EngineConfig, GraphqlClient, RestClient};
//!
//! let rest = RestClient::new(EngineConfig::default())?;
//! let products = rest
//!     .get("https://my-store.myshopify.com/admin/api/2024-10/products.json", None)
//!     .await?;
//!
//! if products.exhausted() {
//!     eprintln!("gave up with status {}", products.status());
//! }
//!
//! let graphql = GraphqlClient::new(EngineConfig::default())?.with_access_token("shpat_...");
//! let shop = graphql
//!     .post(
//!         "https://my-store.myshopify.com/admin/api/2024-10/graphql.json",
//!         "{ shop { name } }",
//!         None,
//!         None,
//!     )
//!     .await?;
//! println!("{}", shop["data"]["shop"]["name"]);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Each call returns its own status and attempt count
//! - **Pluggable seams**: [`clients::Transport`], [`clients::throttle::ThrottlePolicy`]
//!   and [`clients::RequestLogger`] are traits
//! - **Thread-safe**: All clients are `Send + Sync`
//! - **Async-first**: Designed for use with the Tokio runtime; dropping a
//!   request future cancels it, including during a wait

pub mod clients;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use config::{EngineConfig, EngineConfigBuilder, ExhaustionPolicy};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiCallLimit, ApiResponse, DataType, GraphqlClient, GraphqlError, HttpClient, HttpError,
    HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse, InvalidHttpRequestError,
    MaxHttpRetriesExceededError, RateLimitExceededError, RequestHeaders, RestClient,
    TransportError,
};
