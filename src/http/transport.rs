//! Transport abstraction consumed by the paginator and the data client

use crate::error::Result;
use crate::types::{JsonValue, Method};
use async_trait::async_trait;

/// Authenticated JSON transport
///
/// Implementations own authentication and envelope handling: `get` returns
/// the decoded `data` member of the response, and `write` wraps the payload
/// in a `data` envelope before sending it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a resource with the given query parameters
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<JsonValue>;

    /// POST/PUT/DELETE a resource
    async fn write(
        &self,
        method: Method,
        url: &str,
        payload: Option<JsonValue>,
    ) -> Result<Option<JsonValue>>;
}
