//! Incremental search result loading.
//!
//! Loads are split into a [`PageRequest`] handed to the caller and a later
//! [`SearchResults::apply`] with whatever the catalog returned. Every request
//! carries a sequence number; only a response to the most recently issued
//! request is applied, so a slow response for superseded search text can
//! never overwrite newer results.

use std::fmt;

use tracing::{debug, warn};

use crate::{
    catalog::{CatalogClient, CatalogError, SearchRequest},
    products::Product,
};

/// Identity of one picker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog load issued by a picker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    session: SessionId,
    seq: u64,
    search: SearchRequest,
}

impl PageRequest {
    /// The issuing session.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Sequence number within the session.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The catalog search to perform.
    pub fn search(&self) -> &SearchRequest {
        &self.search
    }

    /// Run the search against `client`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the catalog client reports.
    #[tracing::instrument(
        skip(self, client),
        fields(session = %self.session, seq = self.seq, page = self.search.page())
    )]
    pub async fn fetch<C>(&self, client: &C) -> Result<Vec<Product>, CatalogError>
    where
        C: CatalogClient + ?Sized,
    {
        client.search(&self.search).await
    }
}

/// A failed load, as shown to the merchant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    message: String,
    credentials: bool,
}

impl LoadFailure {
    /// Human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure is a missing or rejected API key.
    pub fn is_credential_error(&self) -> bool {
        self.credentials
    }
}

impl From<&CatalogError> for LoadFailure {
    fn from(error: &CatalogError) -> Self {
        Self {
            message: error.to_string(),
            credentials: error.is_credential_error(),
        }
    }
}

/// Load state of the result list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No load in flight.
    #[default]
    Idle,

    /// A load is in flight.
    Loading,

    /// The last load failed.
    Failed(LoadFailure),
}

/// What happened to a response handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Products were stored.
    Applied {
        /// Products in the page
        received: usize,
        /// Whether more pages may follow
        has_more: bool,
    },

    /// The load failed and the failure was recorded.
    Failed,

    /// The response belonged to a superseded request or closed session and was ignored.
    Stale,
}

/// Loaded search results of one session.
#[derive(Debug, Clone)]
pub struct SearchResults {
    products: Vec<Product>,
    query: String,
    page_size: u32,
    next_page: u32,
    has_more: bool,
    status: LoadStatus,
    in_flight: bool,
    latest_seq: u64,
}

impl SearchResults {
    /// Create an empty result list.
    pub fn new(page_size: u32) -> Self {
        Self {
            products: Vec::new(),
            query: String::new(),
            page_size,
            next_page: 0,
            has_more: true,
            status: LoadStatus::Idle,
            in_flight: false,
            latest_seq: 0,
        }
    }

    /// Loaded products, in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Search text of the most recent search.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether more pages may be available.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Current load status.
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Whether `request` is the latest one issued.
    pub fn is_current(&self, request: &PageRequest) -> bool {
        request.seq == self.latest_seq
    }

    /// Issue page 0 of a new search, superseding any load in flight.
    pub(crate) fn start_search(&mut self, session: SessionId, text: &str) -> PageRequest {
        self.query = text.trim().to_string();
        self.next_page = 0;
        self.has_more = true;

        self.issue(session, 0)
    }

    /// Issue the next page, unless a load is in flight or the results are exhausted.
    pub(crate) fn load_more(&mut self, session: SessionId) -> Option<PageRequest> {
        if self.in_flight || !self.has_more {
            return None;
        }

        Some(self.issue(session, self.next_page))
    }

    /// Supersede every outstanding request.
    pub(crate) fn invalidate(&mut self) {
        self.latest_seq += 1;
        self.in_flight = false;

        if self.status == LoadStatus::Loading {
            self.status = LoadStatus::Idle;
        }
    }

    /// Supersede outstanding requests and drop the loaded products, ahead of
    /// a search for new text.
    pub(crate) fn discard(&mut self) {
        self.invalidate();
        self.products.clear();
    }

    /// Store the outcome of `request`.
    pub(crate) fn apply(
        &mut self,
        request: &PageRequest,
        result: Result<Vec<Product>, CatalogError>,
    ) -> PageOutcome {
        if !self.is_current(request) {
            debug!(seq = request.seq, latest = self.latest_seq, "ignoring stale page");

            return PageOutcome::Stale;
        }

        self.in_flight = false;

        let page = request.search.page();

        match result {
            Ok(products) => {
                let received = products.len();

                if page == 0 {
                    self.products = products;
                } else {
                    self.products.extend(products);
                }

                self.has_more = !request.search.is_last_page(received);
                self.next_page = page.saturating_add(1);
                self.status = LoadStatus::Idle;

                debug!(page, received, has_more = self.has_more, "applied page");

                PageOutcome::Applied {
                    received,
                    has_more: self.has_more,
                }
            }
            Err(error) => {
                warn!(%error, page, "failed to load products");

                // no stale results next to the error for a fresh search
                if page == 0 {
                    self.products.clear();
                }

                self.status = LoadStatus::Failed(LoadFailure::from(&error));

                PageOutcome::Failed
            }
        }
    }

    fn issue(&mut self, session: SessionId, page: u32) -> PageRequest {
        self.latest_seq += 1;
        self.in_flight = true;
        self.status = LoadStatus::Loading;

        PageRequest {
            session,
            seq: self.latest_seq,
            search: SearchRequest::new(&self.query, page, self.page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::products::{ProductId, Variant, VariantId};

    const SESSION: SessionId = SessionId(1);

    fn products(ids: std::ops::Range<u64>) -> Vec<Product> {
        ids.map(|id| Product {
            id: ProductId(id),
            title: format!("Product {id}"),
            variants: vec![Variant {
                id: VariantId(id * 10),
                product_id: Some(ProductId(id)),
                title: "Default".to_string(),
                price: Decimal::ONE,
            }],
            image: None,
        })
        .collect()
    }

    fn ids(results: &SearchResults) -> Vec<u64> {
        results.products().iter().map(|p| p.id.0).collect()
    }

    #[test]
    fn pages_append_until_a_short_page() -> TestResult {
        let mut results = SearchResults::new(2);

        let first = results.start_search(SESSION, "");
        results.apply(&first, Ok(products(0..2)));

        let second = results.load_more(SESSION).ok_or("expected a second page")?;

        assert_eq!(second.search().page(), 1);

        let outcome = results.apply(&second, Ok(products(2..3)));

        assert_eq!(
            outcome,
            PageOutcome::Applied {
                received: 1,
                has_more: false
            }
        );
        assert_eq!(ids(&results), [0, 1, 2]);
        assert!(!results.has_more());
        assert_eq!(results.load_more(SESSION), None);

        Ok(())
    }

    #[test]
    fn empty_page_ends_results() {
        let mut results = SearchResults::new(2);

        let request = results.start_search(SESSION, "none");
        results.apply(&request, Ok(Vec::new()));

        assert!(!results.has_more());
        assert!(results.products().is_empty());
    }

    #[test]
    fn load_more_is_suppressed_while_in_flight() {
        let mut results = SearchResults::new(2);

        let _first = results.start_search(SESSION, "");

        assert!(results.is_loading());
        assert_eq!(results.load_more(SESSION), None);
    }

    #[test]
    fn stale_responses_are_ignored() {
        let mut results = SearchResults::new(10);

        let old = results.start_search(SESSION, "x");
        let new = results.start_search(SESSION, "y");

        assert_eq!(
            results.apply(&new, Ok(products(5..7))),
            PageOutcome::Applied {
                received: 2,
                has_more: false
            }
        );
        assert_eq!(results.apply(&old, Ok(products(0..3))), PageOutcome::Stale);
        assert_eq!(ids(&results), [5, 6]);
        assert_eq!(results.query(), "y");
    }

    #[test]
    fn failed_first_page_clears_results() {
        let mut results = SearchResults::new(2);

        let request = results.start_search(SESSION, "");
        results.apply(&request, Ok(products(0..2)));

        let request = results.start_search(SESSION, "towel");
        let outcome = results.apply(&request, Err(CatalogError::Unauthorized));

        assert_eq!(outcome, PageOutcome::Failed);
        assert!(results.products().is_empty());

        match results.status() {
            LoadStatus::Failed(failure) => assert!(failure.is_credential_error()),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn failed_later_page_keeps_results_and_cursor() -> TestResult {
        let mut results = SearchResults::new(2);

        let request = results.start_search(SESSION, "");
        results.apply(&request, Ok(products(0..2)));

        let request = results.load_more(SESSION).ok_or("expected a second page")?;

        results.apply(
            &request,
            Err(CatalogError::Status {
                status: 502,
                reason: "Bad Gateway".to_string(),
            }),
        );

        assert_eq!(ids(&results), [0, 1]);

        let retry = results.load_more(SESSION);

        assert_eq!(retry.map(|r| r.search().page()), Some(1));

        Ok(())
    }

    #[test]
    fn invalidate_makes_outstanding_requests_stale() {
        let mut results = SearchResults::new(2);

        let request = results.start_search(SESSION, "");
        results.invalidate();

        assert!(!results.is_loading());
        assert_eq!(results.apply(&request, Ok(products(0..1))), PageOutcome::Stale);
        assert!(results.products().is_empty());
    }

    #[test]
    fn discard_drops_loaded_products() {
        let mut results = SearchResults::new(2);

        let request = results.start_search(SESSION, "towel");
        results.apply(&request, Ok(products(0..2)));

        let pending = results.start_search(SESSION, "towel");
        results.discard();

        assert!(results.products().is_empty());
        assert_eq!(results.apply(&pending, Ok(products(4..6))), PageOutcome::Stale);
        assert!(results.products().is_empty());
    }
}
