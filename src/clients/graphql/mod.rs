//! GraphQL façade for the Shopify Admin API.
//!
//! [`GraphqlClient`] only supports POST. A query is sent as the raw document
//! with `Content-Type: application/graphql`, or, when variables are given, as
//! a `{"query", "variables"}` JSON envelope with
//! `Content-Type: application/json`.
//!
//! Requests are throttled with the query-cost policy: a `THROTTLED` error is
//! retried once the cost bucket has refilled enough to cover the requested
//! cost, and query costs above the configured thresholds are logged as
//! warnings.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::{json, Map};
//! use shopify_engine::{EngineConfig, GraphqlClient};
//!
//! let client = GraphqlClient::new(EngineConfig::default())?.with_access_token("shpat_...");
//! let url = "https://my-store.myshopify.com/admin/api/2024-10/graphql.json";
//!
//! let response = client.post(url, "{ shop { name } }", None, None).await?;
//! println!("Shop name: {}", response["data"]["shop"]["name"]);
//!
//! let mut variables = Map::new();
//! variables.insert("id".to_string(), json!("gid://shopify/Product/123"));
//! let response = client
//!     .post(url, "query($id: ID!) { product(id: $id) { title } }", None, Some(variables))
//!     .await?;
//! ```

mod client;
mod errors;

pub use client::{GraphqlClient, ACCESS_TOKEN_HEADER};
pub use errors::GraphqlError;
