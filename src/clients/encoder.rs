//! Request body encoders.
//!
//! Each façade pairs a [`BodyEncoder`] with a throttle policy. The encoder
//! turns the caller's body into bytes plus the [`DataType`] that describes
//! them, so `Content-Type` and `Content-Length` always match what is sent.

use serde_json::{Map, Value};

use crate::clients::errors::InvalidHttpRequestError;
use crate::clients::http_request::DataType;

/// Serializes a façade's body type into request bytes.
pub trait BodyEncoder: Send + Sync {
    /// The body type accepted by the façade.
    type Body;

    /// Encodes `body`, returning the bytes and their content type.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::Encode`] if serialization fails.
    fn encode(&self, body: &Self::Body) -> Result<(Vec<u8>, DataType), InvalidHttpRequestError>;
}

/// Encodes JSON values for the REST façade.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl BodyEncoder for JsonEncoder {
    type Body = Value;

    fn encode(&self, body: &Value) -> Result<(Vec<u8>, DataType), InvalidHttpRequestError> {
        let bytes = serde_json::to_vec(body).map_err(|e| InvalidHttpRequestError::Encode {
            reason: e.to_string(),
        })?;
        Ok((bytes, DataType::Json))
    }
}

/// A GraphQL document and its optional variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphqlQuery {
    /// The query or mutation text.
    pub query: String,
    /// Variables referenced by the document.
    pub variables: Option<Map<String, Value>>,
}

impl GraphqlQuery {
    /// Creates a query without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    /// Attaches variables to the query.
    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Encodes GraphQL queries.
///
/// With variables the body is the JSON envelope
/// `{"query": ..., "variables": ...}` sent as `application/json`. Without
/// them the query text is sent verbatim as `application/graphql`.
///
/// # Example
///
/// ```rust
/// use serde_json::{json, Map};
/// use shopify_engine::clients::{BodyEncoder, DataType, GraphqlEncoder, GraphqlQuery};
///
/// let (body, data_type) = GraphqlEncoder.encode(&GraphqlQuery::new("{ shop { name } }")).unwrap();
/// assert_eq!(body, b"{ shop { name } }");
/// assert_eq!(data_type, DataType::GraphQL);
///
/// let mut variables = Map::new();
/// variables.insert("id".to_string(), json!("gid://shopify/Product/1"));
/// let query = GraphqlQuery::new("query($id: ID!) { product(id: $id) { title } }")
///     .with_variables(variables);
///
/// let (body, data_type) = GraphqlEncoder.encode(&query).unwrap();
/// let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
/// assert_eq!(envelope["variables"]["id"], "gid://shopify/Product/1");
/// assert_eq!(data_type, DataType::Json);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphqlEncoder;

impl BodyEncoder for GraphqlEncoder {
    type Body = GraphqlQuery;

    fn encode(&self, body: &GraphqlQuery) -> Result<(Vec<u8>, DataType), InvalidHttpRequestError> {
        match &body.variables {
            Some(variables) => {
                let envelope = serde_json::json!({
                    "query": body.query,
                    "variables": variables,
                });
                JsonEncoder.encode(&envelope)
            }
            None => Ok((body.query.clone().into_bytes(), DataType::GraphQL)),
        }
    }
}
