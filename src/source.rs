//! Product data sources feeding the alert engine.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::{self, Config};
use crate::db;
use crate::model::Product;

/// DataSourceUnavailable: the product snapshot could not be obtained. Every
/// variant means the same thing to the engine: skip this cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to reach product source: {0}")]
    Http(#[from] reqwest::Error),
    #[error("product source returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid product payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("product query failed: {0:#}")]
    Query(anyhow::Error),
}

#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Every product with its current stock, in the source's order.
    async fn list_products(&self) -> Result<Vec<Product>, SourceError>;
}

/// Upper bound on one request to the hosted store, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hosted store speaking the PostgREST dialect (`/rest/v1/<table>`).
#[derive(Clone)]
pub struct RestProductSource {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for RestProductSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestProductSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestProductSource {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        // a trailing slash keeps `join` from dropping the last path segment
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).context("invalid product source URL")?;
        let http = Client::builder()
            .user_agent("stock-watch/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn build_request(&self) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join("rest/v1/products")
            .context("invalid product source URL")?;
        self.http
            .get(endpoint)
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .build()
            .context("failed to build product request")
    }
}

#[async_trait]
impl ProductSource for RestProductSource {
    #[instrument(skip_all)]
    async fn list_products(&self) -> Result<Vec<Product>, SourceError> {
        let request = self.build_request().map_err(SourceError::Query)?;
        debug!(url = %request.url(), "fetching products");

        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "product source rejected request");
            return Err(SourceError::Status { status, body });
        }

        let body = res.text().await?;
        let products: Vec<Product> = serde_json::from_str(&body)?;
        debug!(count = products.len(), "fetched products");
        Ok(products)
    }
}

/// Local SQLite catalog.
#[derive(Debug, Clone)]
pub struct SqliteProductSource {
    pool: db::Pool,
}

impl SqliteProductSource {
    pub fn new(pool: db::Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &db::Pool {
        &self.pool
    }
}

#[async_trait]
impl ProductSource for SqliteProductSource {
    async fn list_products(&self) -> Result<Vec<Product>, SourceError> {
        db::list_products(&self.pool)
            .await
            .map_err(SourceError::Query)
    }
}

/// Build the source named in the configuration. The SQLite catalog is
/// opened and migrated here.
pub async fn from_config(cfg: &Config) -> Result<Arc<dyn ProductSource>> {
    match &cfg.source {
        config::Source::Rest { url, api_key } => {
            Ok(Arc::new(RestProductSource::new(url, api_key.clone())?))
        }
        config::Source::Sqlite => {
            let pool = db::init_pool(&cfg.database_url()).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(SqliteProductSource::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_targets_products_table() {
        let source = RestProductSource::new("https://demo.supabase.co/", "anon".into()).unwrap();
        let request = source.build_request().unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/rest/v1/products");
        assert_eq!(
            request.url().query(),
            Some("select=*&order=created_at.asc")
        );
        let headers = request.headers();
        assert_eq!(headers.get("apikey").and_then(|h| h.to_str().ok()), Some("anon"));
        assert_eq!(
            headers.get("Authorization").and_then(|h| h.to_str().ok()),
            Some("Bearer anon")
        );
    }

    #[test]
    fn base_url_with_path_prefix_is_kept() {
        let source = RestProductSource::new("http://localhost:54321/proxy", "k".into()).unwrap();
        let request = source.build_request().unwrap();
        assert_eq!(request.url().path(), "/proxy/rest/v1/products");
    }

    #[test]
    fn products_decode_from_rest_rows() {
        let body = r#"[
            {"id":"p1","name":"Wireless Mouse","category":"Electronics","current_stock":null,
             "reorder_threshold":20,"lead_time_days":5,"created_at":"2024-01-01T00:00:00Z",
             "updated_at":null}
        ]"#;
        let products: Vec<Product> = serde_json::from_str(body).unwrap();
        assert_eq!(products[0].current_stock, None);
        assert_eq!(products[0].stock(), 0);
        assert_eq!(products[0].threshold(), 20);
    }

    #[test]
    fn debug_hides_api_key() {
        let source = RestProductSource::new("https://demo.supabase.co", "secret".into()).unwrap();
        assert!(!format!("{:?}", source).contains("secret"));
    }
}
