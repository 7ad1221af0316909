//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::http::request::JsonBody;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::indices::{IndicesCreateParts, IndicesExistsParts};
use opensearch::{BulkParts, OpenSearch};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::{index_body, IndexConfig};
use crate::types::BulkItemOutcome;
use movies_etl_shared::FilmDocument;

/// OpenSearch client for the film index.
///
/// # Example
///
/// ```ignore
/// use movies_etl_repository::{IndexConfig, OpenSearchClient, SearchEngineClient};
///
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::new("movies"))?;
/// let created = client.ensure_index().await?;
/// let outcomes = client.bulk_index(&documents).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing the index name
    pub fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, index = %index_config.name, "Created OpenSearch client");

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Parse the bulk response body into per-document outcomes.
    ///
    /// The engine reports items in submission order; `expected` guards
    /// against a truncated or reshaped response silently dropping outcomes.
    fn parse_bulk_response(body: &Value, expected: usize) -> Result<Vec<BulkItemOutcome>, SearchError> {
        let items = body["items"]
            .as_array()
            .ok_or_else(|| SearchError::parse("bulk response has no 'items' array"))?;

        if items.len() != expected {
            return Err(SearchError::parse(format!(
                "bulk response has {} items, expected {}",
                items.len(),
                expected
            )));
        }

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let op = item
                .as_object()
                .and_then(|o| o.values().next())
                .ok_or_else(|| SearchError::parse("bulk item is not an operation object"))?;

            let status = op["status"]
                .as_u64()
                .ok_or_else(|| SearchError::parse("bulk item has no status"))? as u16;

            let id = op["_id"].as_str().unwrap_or_default().to_string();

            let error = op.get("error").filter(|e| !e.is_null()).map(|e| {
                match (e["type"].as_str(), e["reason"].as_str()) {
                    (Some(t), Some(r)) => format!("{}: {}", t, r),
                    _ => e.to_string(),
                }
            });

            outcomes.push(BulkItemOutcome { id, status, error });
        }

        Ok(outcomes)
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    /// Ensure the film index exists, creating it with the fixed settings and
    /// mapping if absent.
    #[instrument(skip(self), fields(index = %self.index_config.name))]
    async fn ensure_index(&self) -> Result<bool, SearchError> {
        let name = self.index_config.name.as_str();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!("Index already exists");
            return Ok(false);
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(index_body())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "create failed with status {}: {}",
                status, body
            )));
        }

        info!("Created search index");
        Ok(true)
    }

    /// Index a batch of documents through the bulk endpoint.
    #[instrument(skip(self, docs), fields(index = %self.index_config.name, count = docs.len()))]
    async fn bulk_index(&self, docs: &[FilmDocument]) -> Result<Vec<BulkItemOutcome>, SearchError> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(docs.len() * 2);
        for doc in docs {
            body.push(json!({"index": {"_id": doc.id}}).into());
            let source = serde_json::to_value(doc)
                .map_err(|e| SearchError::serialization(e.to_string()))?;
            body.push(source.into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "bulk failed with status {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let outcomes = Self::parse_bulk_response(&body, docs.len())?;
        debug!(
            acknowledged = outcomes.iter().filter(|o| o.is_success()).count(),
            "Bulk request completed"
        );
        Ok(outcomes)
    }

    /// Check that the search engine is reachable.
    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}
