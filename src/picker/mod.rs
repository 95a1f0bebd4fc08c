//! Picker Session
//!
//! Transient state for one product selection workflow. A session stages
//! checked products and variants against incrementally loaded catalog
//! results, and on confirmation produces a [`SelectionDelta`] that contains
//! no exact duplicates of entries already in the list.
//!
//! The session does no I/O itself. Loads are handed out as [`PageRequest`]s
//! from [`PickerSession::poll`] and [`PickerSession::load_more`]; the caller
//! fetches them and passes the result back through
//! [`PickerSession::apply_page`].

use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::CatalogError,
    config::PickerConfig,
    products::{Product, ProductId, VariantId},
    selection::{
        DeltaEntry, DeltaTarget, SelectedProduct, SelectionDelta, SelectionKey, SelectionList,
    },
};

pub mod checked;
pub mod debounce;
pub mod loader;

pub use checked::CheckedState;
pub use debounce::Debouncer;
pub use loader::{LoadFailure, LoadStatus, PageOutcome, PageRequest, SearchResults, SessionId};

/// Errors returned by picker session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    /// The session has been confirmed or closed.
    #[error("picker session is closed")]
    Closed,

    /// The product was never loaded in this session.
    #[error("product {0} is not loaded")]
    UnknownProduct(ProductId),

    /// The variant does not belong to the product.
    #[error("variant {variant} does not belong to product {product}")]
    UnknownVariant {
        /// Product id
        product: ProductId,
        /// Variant id
        variant: VariantId,
    },

    /// The product has no variants to select.
    #[error("product {0} has no variants")]
    NoVariants(ProductId),

    /// Confirm was called with nothing checked.
    #[error("no products are checked")]
    NothingChecked,

    /// Checked products exactly match entries already in the list.
    #[error("already in the list: {}", .titles.join(", "))]
    DuplicateSelection {
        /// Titles of the conflicting products
        titles: Vec<String>,
    },

    /// The entry being edited changed or moved since the session opened.
    #[error("entry {0} changed while it was being edited")]
    EditTargetChanged(usize),
}

/// What a session's confirmation does to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    /// Append new entries.
    Add,

    /// Replace an existing entry.
    Edit {
        /// Index of the edited entry
        index: usize,
    },
}

/// One product selection workflow.
#[derive(Debug, Clone)]
pub struct PickerSession {
    id: SessionId,
    mode: PickerMode,
    open: bool,
    search_text: String,
    debouncer: Debouncer,
    reload_queued: bool,
    results: SearchResults,
    known: FxHashMap<ProductId, Product>,
    checked: CheckedState,
    edit_key: Option<SelectionKey>,
}

impl PickerSession {
    /// Open a session for adding new entries. Nothing is checked.
    pub fn add(id: SessionId, config: &PickerConfig) -> Self {
        Self::open(id, PickerMode::Add, config)
    }

    /// Open a session for re-picking the entry at `index`.
    ///
    /// The checked state is seeded from the entry's product and variants, and
    /// the entry itself is excluded from duplicate detection.
    pub fn edit(
        id: SessionId,
        config: &PickerConfig,
        index: usize,
        entry: &SelectedProduct,
    ) -> Self {
        let mut session = Self::open(id, PickerMode::Edit { index }, config);
        let product = entry.product();

        session.checked.seed(product.id, entry.selected_variant_ids());
        session.known.insert(product.id, product.clone());
        session.edit_key = Some(entry.key());

        session
    }

    fn open(id: SessionId, mode: PickerMode, config: &PickerConfig) -> Self {
        debug!(session = %id, ?mode, "opening picker session");

        Self {
            id,
            mode,
            open: true,
            search_text: String::new(),
            debouncer: Debouncer::new(config.debounce()),
            reload_queued: true,
            results: SearchResults::new(config.page_size()),
            known: FxHashMap::default(),
            checked: CheckedState::default(),
            edit_key: None,
        }
    }

    /// Session identity.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Add or edit.
    pub fn mode(&self) -> PickerMode {
        self.mode
    }

    /// Index of the edited entry, in edit mode.
    pub fn edit_index(&self) -> Option<usize> {
        match self.mode {
            PickerMode::Add => None,
            PickerMode::Edit { index } => Some(index),
        }
    }

    /// Whether the session accepts input.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current search text, as typed.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Loaded search results.
    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    /// Checked products and variants.
    pub fn checked(&self) -> &CheckedState {
        &self.checked
    }

    /// A product loaded or seeded during this session.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.known.get(&id)
    }

    /// Replace the search text and restart the debounce quiet period.
    ///
    /// Products loaded for the previous text are discarded and loads still in
    /// flight for it are superseded. Checked products stay checked.
    pub fn set_search_text(&mut self, text: impl Into<String>, now: Instant) {
        if !self.open {
            return;
        }

        self.search_text = text.into();
        self.results.discard();
        self.debouncer.schedule(now);
    }

    /// When [`poll`](Self::poll) will next issue a debounced load.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Issue the page 0 load that is due at `now`, if any.
    ///
    /// The first poll after opening loads immediately; later loads wait for
    /// the search text to settle for the configured quiet period.
    pub fn poll(&mut self, now: Instant) -> Option<PageRequest> {
        if !self.open {
            return None;
        }

        let due = if self.reload_queued {
            self.reload_queued = false;
            self.debouncer.cancel();

            true
        } else {
            self.debouncer.fire(now)
        };

        if !due {
            return None;
        }

        let request = self.results.start_search(self.id, &self.search_text);

        debug!(
            session = %self.id,
            seq = request.seq(),
            query = request.search().query(),
            "issuing search"
        );

        Some(request)
    }

    /// Issue a load for the next page of the current results.
    ///
    /// Returns `None` while a load is in flight, once the results are
    /// exhausted, or while a new search is still pending.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if !self.open || self.reload_queued || self.debouncer.is_pending() {
            return None;
        }

        self.results.load_more(self.id)
    }

    /// Hand back the result of a load.
    ///
    /// Results for another session, a closed session or a superseded request
    /// are ignored.
    pub fn apply_page(
        &mut self,
        request: &PageRequest,
        result: Result<Vec<Product>, CatalogError>,
    ) -> PageOutcome {
        if !self.open || request.session() != self.id {
            debug!(
                session = %self.id,
                from = %request.session(),
                "ignoring page for inactive session"
            );

            return PageOutcome::Stale;
        }

        if self.results.is_current(request) {
            if let Ok(products) = &result {
                for product in products {
                    self.known.insert(product.id, product.clone());
                }
            }
        }

        self.results.apply(request, result)
    }

    /// Toggle a product. Returns whether it is checked afterwards.
    ///
    /// # Errors
    ///
    /// - [`PickerError::Closed`]: the session is closed.
    /// - [`PickerError::UnknownProduct`]: the product was never loaded.
    /// - [`PickerError::NoVariants`]: the product has no variants.
    pub fn toggle_product(&mut self, product: ProductId) -> Result<bool, PickerError> {
        self.ensure_open()?;

        let product = self
            .known
            .get(&product)
            .ok_or(PickerError::UnknownProduct(product))?;

        self.checked.toggle_product(product)
    }

    /// Toggle one variant of a product. Returns whether it is checked afterwards.
    ///
    /// # Errors
    ///
    /// - [`PickerError::Closed`]: the session is closed.
    /// - [`PickerError::UnknownProduct`]: the product was never loaded.
    /// - [`PickerError::UnknownVariant`]: the variant is not the product's.
    pub fn toggle_variant(
        &mut self,
        product: ProductId,
        variant: VariantId,
    ) -> Result<bool, PickerError> {
        self.ensure_open()?;

        let product = self
            .known
            .get(&product)
            .ok_or(PickerError::UnknownProduct(product))?;

        self.checked.toggle_variant(product, variant)
    }

    /// Whether `product` already appears in an entry other than the one being
    /// edited. A different variant subset of a listed product can still be added.
    pub fn is_listed(&self, product: ProductId, list: &SelectionList) -> bool {
        let skip = self.edit_index();

        list.iter()
            .enumerate()
            .any(|(index, entry)| Some(index) != skip && entry.product().id == product)
    }

    /// Validate the checked products against `list` and close the session.
    ///
    /// The whole confirmation is rejected if any checked product exactly
    /// matches an entry other than the one being edited; the session stays
    /// open so the merchant can adjust the selection.
    ///
    /// # Errors
    ///
    /// - [`PickerError::Closed`]: the session is closed.
    /// - [`PickerError::NothingChecked`]: nothing is checked.
    /// - [`PickerError::EditTargetChanged`]: the edited entry no longer matches.
    /// - [`PickerError::DuplicateSelection`]: exact duplicates were found.
    pub fn confirm(&mut self, list: &SelectionList) -> Result<SelectionDelta, PickerError> {
        self.ensure_open()?;

        if self.checked.is_empty() {
            return Err(PickerError::NothingChecked);
        }

        let skip = self.edit_index();

        if let Some(index) = skip {
            let current = list.get(index).map(SelectedProduct::key);

            if current.as_ref() != self.edit_key.as_ref() {
                return Err(PickerError::EditTargetChanged(index));
            }
        }

        let existing: FxHashSet<SelectionKey> = list
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != skip)
            .map(|(_, entry)| entry.key())
            .collect();

        let mut entries = Vec::with_capacity(self.checked.len());
        let mut titles = Vec::new();

        for (id, variants) in self.checked.iter() {
            let product = self.known.get(&id).ok_or(PickerError::UnknownProduct(id))?;

            let variant_ids = if variants.is_empty() {
                product.variant_ids()
            } else {
                variants.iter().copied().collect()
            };

            let entry = DeltaEntry::new(product.clone(), variant_ids);

            if existing.contains(&entry.key()) {
                titles.push(product.title.clone());
            } else {
                entries.push(entry);
            }
        }

        if !titles.is_empty() {
            info!(session = %self.id, ?titles, "rejecting duplicate selection");

            return Err(PickerError::DuplicateSelection { titles });
        }

        let target = match self.mode {
            PickerMode::Add => DeltaTarget::Append,
            PickerMode::Edit { index } => DeltaTarget::Replace(index),
        };

        info!(session = %self.id, entries = entries.len(), "confirmed picker session");

        self.close();

        Ok(SelectionDelta::new(target, entries))
    }

    /// Close the session. Outstanding loads become stale.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }

        self.open = false;
        self.reload_queued = false;
        self.debouncer.cancel();
        self.results.invalidate();

        debug!(session = %self.id, "closed picker session");
    }

    fn ensure_open(&self) -> Result<(), PickerError> {
        if self.open {
            Ok(())
        } else {
            Err(PickerError::Closed)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        products::Variant,
        selection::{DeltaEntry, RemovalPolicy, SelectionError},
    };

    fn product(id: u64, variants: &[u64]) -> Product {
        Product {
            id: ProductId(id),
            title: format!("Product {id}"),
            variants: variants
                .iter()
                .map(|variant| Variant {
                    id: VariantId(*variant),
                    product_id: Some(ProductId(id)),
                    title: format!("Variant {variant}"),
                    price: Decimal::from(25),
                })
                .collect(),
            image: None,
        }
    }

    fn list_with(product: &Product, variants: &[u64]) -> Result<SelectionList, SelectionError> {
        let mut list = SelectionList::new(RemovalPolicy::KeepLast);

        list.add_or_merge([DeltaEntry::new(
            product.clone(),
            variants.iter().copied().map(VariantId).collect(),
        )])?;

        Ok(list)
    }

    /// Open an add session and load `products` as its first page.
    fn loaded(products: Vec<Product>) -> Result<PickerSession, &'static str> {
        let mut session = PickerSession::add(SessionId(1), &PickerConfig::default());
        let request = session.poll(Instant::now()).ok_or("expected an initial load")?;

        session.apply_page(&request, Ok(products));

        Ok(session)
    }

    #[test]
    fn opening_loads_the_first_page_immediately() -> TestResult {
        let mut session = PickerSession::add(SessionId(1), &PickerConfig::default());

        let request = session.poll(Instant::now()).ok_or("expected an initial load")?;

        assert_eq!(request.search().query(), "");
        assert_eq!(request.search().page(), 0);
        assert_eq!(session.poll(Instant::now()), None);

        Ok(())
    }

    #[test]
    fn rapid_typing_issues_one_load() -> TestResult {
        let start = Instant::now();
        let mut session = loaded(vec![product(1, &[10])])?;

        session.set_search_text("a", start);
        session.set_search_text("ab", start + Duration::from_millis(100));
        session.set_search_text("abc", start + Duration::from_millis(200));

        assert_eq!(session.poll(start + Duration::from_millis(450)), None);

        let request = session
            .poll(start + Duration::from_millis(500))
            .ok_or("expected a debounced load")?;

        assert_eq!(request.search().query(), "abc");
        assert_eq!(request.search().page(), 0);
        assert_eq!(session.poll(start + Duration::from_secs(2)), None);

        Ok(())
    }

    #[test]
    fn typing_supersedes_loads_in_flight() -> TestResult {
        let start = Instant::now();
        let mut session = PickerSession::add(SessionId(1), &PickerConfig::default());
        let first = session.poll(start).ok_or("expected an initial load")?;

        session.set_search_text("towel", start);

        assert_eq!(
            session.apply_page(&first, Ok(vec![product(1, &[10])])),
            PageOutcome::Stale
        );
        assert!(session.results().products().is_empty());

        Ok(())
    }

    #[test]
    fn load_more_waits_for_pending_search() -> TestResult {
        let start = Instant::now();
        let mut session = loaded((0..10).map(|id| product(id, &[id * 10])).collect())?;

        session.set_search_text("x", start);

        assert_eq!(session.load_more(), None);

        Ok(())
    }

    #[test]
    fn unknown_products_cannot_be_toggled() -> TestResult {
        let mut session = loaded(vec![product(1, &[10])])?;

        assert_eq!(
            session.toggle_product(ProductId(9)),
            Err(PickerError::UnknownProduct(ProductId(9)))
        );

        Ok(())
    }

    #[test]
    fn subset_of_listed_product_is_not_a_duplicate() -> TestResult {
        let shirt = product(1, &[10, 11]);
        let list = list_with(&shirt, &[10, 11])?;
        let mut session = loaded(vec![shirt])?;

        session.toggle_variant(ProductId(1), VariantId(10))?;

        assert!(session.is_listed(ProductId(1), &list));

        let delta = session.confirm(&list)?;

        assert_eq!(delta.target(), DeltaTarget::Append);
        assert_eq!(delta.len(), 1);
        assert!(!session.is_open());

        Ok(())
    }

    #[test]
    fn exact_duplicates_reject_the_confirmation() -> TestResult {
        let shirt = product(1, &[10, 11]);
        let list = list_with(&shirt, &[10, 11])?;
        let mut session = loaded(vec![shirt, product(2, &[20])])?;

        session.toggle_variant(ProductId(1), VariantId(11))?;
        session.toggle_variant(ProductId(1), VariantId(10))?;
        session.toggle_product(ProductId(2))?;

        assert_eq!(
            session.confirm(&list),
            Err(PickerError::DuplicateSelection {
                titles: vec!["Product 1".to_string()]
            })
        );
        assert!(session.is_open());

        Ok(())
    }

    #[test]
    fn confirming_nothing_is_an_error() -> TestResult {
        let mut session = loaded(vec![product(1, &[10])])?;

        assert_eq!(
            session.confirm(&SelectionList::default()),
            Err(PickerError::NothingChecked)
        );

        Ok(())
    }

    #[test]
    fn edit_sessions_are_seeded_and_exclude_their_entry() -> TestResult {
        let shirt = product(1, &[10, 11]);
        let list = list_with(&shirt, &[11, 10])?;
        let entry = list.get(0).ok_or("missing entry")?;

        let mut session = PickerSession::edit(SessionId(2), &PickerConfig::default(), 0, entry);

        assert_eq!(
            session.checked().variants(ProductId(1)),
            Some([VariantId(11), VariantId(10)].as_slice())
        );
        assert!(!session.is_listed(ProductId(1), &list));

        let delta = session.confirm(&list)?;

        assert_eq!(delta.target(), DeltaTarget::Replace(0));

        Ok(())
    }

    #[test]
    fn edit_target_is_verified() -> TestResult {
        let shirt = product(1, &[10, 11]);
        let list = list_with(&shirt, &[10])?;
        let entry = list.get(0).ok_or("missing entry")?;
        let mut session = PickerSession::edit(SessionId(2), &PickerConfig::default(), 0, entry);

        let other = list_with(&shirt, &[11])?;

        assert_eq!(
            session.confirm(&other),
            Err(PickerError::EditTargetChanged(0))
        );

        Ok(())
    }

    #[test]
    fn typing_discards_results_for_previous_text() -> TestResult {
        let start = Instant::now();
        let mut session = loaded(vec![product(1, &[10]), product(2, &[20])])?;

        session.set_search_text("blanket", start);

        assert!(session.results().products().is_empty());
        assert_eq!(session.load_more(), None);

        Ok(())
    }

    #[test]
    fn checked_products_survive_search_changes() -> TestResult {
        let start = Instant::now();
        let mut session = loaded(vec![product(1, &[10]), product(2, &[20])])?;

        session.toggle_product(ProductId(1))?;
        session.set_search_text("other", start);

        let request = session
            .poll(start + Duration::from_secs(1))
            .ok_or("expected a debounced load")?;

        session.apply_page(&request, Ok(vec![product(2, &[20])]));

        let delta = session.confirm(&SelectionList::default())?;
        let products: Vec<ProductId> = delta.entries().iter().map(|e| e.product.id).collect();

        assert_eq!(products, [ProductId(1)]);

        Ok(())
    }

    #[test]
    fn closed_sessions_ignore_pages_and_input() -> TestResult {
        let mut session = PickerSession::add(SessionId(1), &PickerConfig::default());
        let request = session.poll(Instant::now()).ok_or("expected an initial load")?;

        session.close();

        assert_eq!(
            session.apply_page(&request, Ok(vec![product(1, &[10])])),
            PageOutcome::Stale
        );
        assert_eq!(
            session.toggle_product(ProductId(1)),
            Err(PickerError::Closed)
        );
        assert_eq!(session.poll(Instant::now()), None);

        Ok(())
    }

    #[test]
    fn pages_for_other_sessions_are_stale() -> TestResult {
        let mut first = PickerSession::add(SessionId(1), &PickerConfig::default());
        let mut second = PickerSession::add(SessionId(2), &PickerConfig::default());

        let request = first.poll(Instant::now()).ok_or("expected an initial load")?;
        second.poll(Instant::now());

        assert_eq!(
            second.apply_page(&request, Ok(Vec::new())),
            PageOutcome::Stale
        );

        Ok(())
    }
}
