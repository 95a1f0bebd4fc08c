//! Catalog
//!
//! The remote product catalog a picker session searches, behind the
//! [`CatalogClient`] trait.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::products::Product;

pub mod fixture;
pub mod http;

pub use fixture::{FixtureCatalog, FixtureError};
pub use http::HttpCatalogClient;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page the catalog serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors returned by catalog clients.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No API key is configured.
    #[error("API key is missing")]
    MissingCredentials,

    /// The catalog rejected the API key.
    #[error("unauthorized: invalid or missing API key")]
    Unauthorized,

    /// The catalog answered with a non-success status.
    #[error("catalog error: {status} {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Status reason phrase
        reason: String,
    },

    /// Transport or body decoding failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CatalogError {
    /// Whether the failure is caused by missing or rejected credentials.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::Unauthorized)
    }
}

/// One page of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    query: String,
    page: u32,
    page_size: u32,
}

impl SearchRequest {
    /// Create a request. The query is trimmed and the page size clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(query: &str, page: u32, page_size: u32) -> Self {
        Self {
            query: query.trim().to_string(),
            page,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Trimmed search text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Zero-based page index.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Whether a response of `received` products is the final page.
    pub fn is_last_page(&self, received: usize) -> bool {
        received < usize::try_from(self.page_size).unwrap_or(usize::MAX)
    }
}

/// Paginated product search.
#[automock]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of products matching the request's query.
    ///
    /// A page shorter than the page size, or an empty one, is the last.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Product>, CatalogError>;
}
