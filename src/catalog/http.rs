//! HTTP catalog client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::{
    catalog::{CatalogClient, CatalogError, SearchRequest},
    config::CatalogConfig,
    products::Product,
};

/// Header carrying the catalog API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Catalog client for the remote product search endpoint.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCatalogClient {
    /// Create a client from configuration.
    ///
    /// A missing API key is not an error here; every search then fails with
    /// [`CatalogError::MissingCredentials`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.catalog_url.clone(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
        })
    }

    /// The search endpoint URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(
        name = "catalog.search",
        skip(self, request),
        fields(
            query = %request.query(),
            page = request.page(),
            page_size = request.page_size()
        )
    )]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Product>, CatalogError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CatalogError::MissingCredentials);
        };

        let response = self
            .http
            .get(&self.base_url)
            .header(API_KEY_HEADER, api_key)
            .query(&[
                ("search", request.query().to_string()),
                ("page", request.page().to_string()),
                ("limit", request.page_size().to_string()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        // the endpoint answers `null` rather than `[]` past the last page
        let products = response
            .json::<Option<Vec<Product>>>()
            .await?
            .unwrap_or_default();

        debug!(received = products.len(), "catalog page received");

        Ok(products)
    }
}
