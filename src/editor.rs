//! Editor
//!
//! The page-level state: one [`SelectionList`] and at most one open
//! [`PickerSession`]. Opening a picker replaces any session already open,
//! which makes that session's outstanding loads stale.

use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::{
    catalog::CatalogError,
    config::PickerConfig,
    picker::{PageOutcome, PageRequest, PickerError, PickerSession, SessionId},
    products::Product,
    selection::{MergeOutcome, SelectionError, SelectionList},
};

/// Errors returned by editor operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    /// No picker session is open.
    #[error("no picker session is open")]
    NoActivePicker,

    /// The picker session rejected the operation.
    #[error(transparent)]
    Picker(#[from] PickerError),

    /// The selection list rejected the operation.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Selection list plus the picker session editing it.
#[derive(Debug, Clone)]
pub struct Editor {
    list: SelectionList,
    picker: Option<PickerSession>,
    config: PickerConfig,
    next_session: u64,
}

impl Editor {
    /// Create an editor around `list`.
    pub fn new(list: SelectionList, config: PickerConfig) -> Self {
        Self {
            list,
            picker: None,
            config,
            next_session: 1,
        }
    }

    /// The selection list.
    pub fn list(&self) -> &SelectionList {
        &self.list
    }

    /// Mutable access for discount, reorder and remove operations.
    pub fn list_mut(&mut self) -> &mut SelectionList {
        &mut self.list
    }

    /// The open picker session.
    pub fn picker(&self) -> Option<&PickerSession> {
        self.picker.as_ref()
    }

    /// The open picker session, mutably.
    pub fn picker_mut(&mut self) -> Option<&mut PickerSession> {
        self.picker.as_mut()
    }

    /// Open a picker for adding entries.
    pub fn open_add(&mut self) -> &mut PickerSession {
        let id = self.session_id();

        self.picker.insert(PickerSession::add(id, &self.config))
    }

    /// Open a picker for re-picking the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfBounds`] if there is no such entry.
    pub fn open_edit(&mut self, index: usize) -> Result<&mut PickerSession, EditorError> {
        let entry = self.list.get(index).ok_or(SelectionError::IndexOutOfBounds {
            index,
            len: self.list.len(),
        })?;

        let session = PickerSession::edit(
            SessionId(self.next_session),
            &self.config,
            index,
            entry,
        );

        self.next_session += 1;
        self.close_picker();

        Ok(self.picker.insert(session))
    }

    /// Close the open picker without changing the list.
    pub fn close_picker(&mut self) {
        if let Some(mut session) = self.picker.take() {
            session.close();
        }
    }

    /// Poll the open picker for a due load.
    pub fn poll(&mut self, now: Instant) -> Option<PageRequest> {
        self.picker.as_mut()?.poll(now)
    }

    /// Request the next page from the open picker.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        self.picker.as_mut()?.load_more()
    }

    /// Route a load result to the open picker.
    ///
    /// Results for a session that has since been closed or replaced are stale.
    pub fn apply_page(
        &mut self,
        request: &PageRequest,
        result: Result<Vec<Product>, CatalogError>,
    ) -> PageOutcome {
        match self.picker.as_mut() {
            Some(session) if session.id() == request.session() => {
                session.apply_page(request, result)
            }
            _ => PageOutcome::Stale,
        }
    }

    /// Confirm the open picker and merge its delta into the list.
    ///
    /// The picker stays open when confirmation is rejected.
    ///
    /// # Errors
    ///
    /// - [`EditorError::NoActivePicker`]: no picker is open.
    /// - [`EditorError::Picker`]: the picker rejected the confirmation.
    /// - [`EditorError::Selection`]: the list rejected the delta.
    pub fn confirm(&mut self) -> Result<MergeOutcome, EditorError> {
        let session = self.picker.as_mut().ok_or(EditorError::NoActivePicker)?;
        let delta = session.confirm(&self.list)?;

        self.picker = None;

        let outcome = self.list.apply(delta)?;

        info!(
            added = outcome.added,
            skipped = outcome.skipped,
            entries = self.list.len(),
            "applied picker selection"
        );

        Ok(outcome)
    }

    fn session_id(&mut self) -> SessionId {
        self.close_picker();

        let id = SessionId(self.next_session);

        self.next_session += 1;

        id
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        products::{ProductId, Variant, VariantId},
        selection::RemovalPolicy,
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
                    price: Decimal::from(40),
                })
                .collect(),
            image: None,
        }
    }

    fn editor() -> Editor {
        Editor::new(
            SelectionList::new(RemovalPolicy::KeepLast),
            PickerConfig::default(),
        )
    }

    #[test]
    fn confirm_without_picker_fails() {
        assert_eq!(editor().confirm(), Err(EditorError::NoActivePicker));
    }

    #[test]
    fn add_then_edit_replaces_in_place() -> TestResult {
        let mut editor = editor();
        let now = Instant::now();

        let request = editor.open_add().poll(now).ok_or("expected a load")?;
        editor.apply_page(&request, Ok(vec![product(1, &[10, 11]), product(2, &[20])]));

        let session = editor.picker_mut().ok_or("picker closed")?;
        session.toggle_product(ProductId(1))?;
        session.toggle_product(ProductId(2))?;

        assert_eq!(
            editor.confirm()?,
            MergeOutcome {
                added: 2,
                skipped: 0
            }
        );
        assert!(editor.picker().is_none());

        editor.open_edit(0)?.toggle_variant(ProductId(1), VariantId(10))?;
        editor.confirm()?;

        let first = editor.list().get(0).ok_or("missing entry")?;

        assert_eq!(first.selected_variant_ids(), [VariantId(11)]);
        assert_eq!(editor.list().len(), 2);

        Ok(())
    }

    #[test]
    fn reopening_makes_old_loads_stale() -> TestResult {
        let mut editor = editor();
        let now = Instant::now();

        let old = editor.open_add().poll(now).ok_or("expected a load")?;
        let new = editor.open_add().poll(now).ok_or("expected a load")?;

        assert_ne!(old.session(), new.session());
        assert_eq!(
            editor.apply_page(&old, Ok(vec![product(1, &[10])])),
            PageOutcome::Stale
        );

        Ok(())
    }

    #[test]
    fn edit_of_missing_entry_fails() {
        let mut editor = editor();

        assert!(matches!(
            editor.open_edit(3),
            Err(EditorError::Selection(SelectionError::IndexOutOfBounds {
                index: 3,
                len: 0
            }))
        ));
    }
}
