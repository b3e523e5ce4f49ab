//! JSON façade for the Shopify REST Admin API.
//!
//! [`RestClient`] sends `serde_json::Value` bodies and decodes responses back
//! to JSON. Requests are throttled with the REST call-limit policy: a nearly
//! full `X-Shopify-Shop-Api-Call-Limit` bucket costs a short pause before the
//! response is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_engine::{EngineConfig, RestClient};
//! use serde_json::json;
//!
//! let client = RestClient::new(EngineConfig::default())?;
//! let url = "https://my-store.myshopify.com/admin/api/2024-10/products.json";
//!
//! let response = client.get(url, None).await?;
//! println!("Products: {}", response["products"]);
//!
//! let body = json!({ "product": { "title": "New Product" } });
//! let created = client.post(url, &body, None).await?;
//! ```
//!
//! # Response Decoding
//!
//! - An empty body decodes to `{}`
//! - A body that is not JSON decodes to `{"raw_body": <text>}` for 5xx
//!   statuses and to `{}` otherwise
//!
//! The status of the final attempt is available on the returned
//! [`ApiResponse`](crate::clients::ApiResponse), so a response handed back
//! after the attempt budget ran out can still be recognized.

mod client;

pub use client::RestClient;
