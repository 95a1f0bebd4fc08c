//! Selection Deltas

use crate::{
    products::{Product, VariantIds},
    selection::key::SelectionKey,
};

/// One product chosen in a picker session, with its variants in the order
/// they were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEntry {
    /// The catalog product
    pub product: Product,

    /// Chosen variant ids
    pub variant_ids: VariantIds,
}

impl DeltaEntry {
    /// Create a delta entry.
    pub fn new(product: Product, variant_ids: VariantIds) -> Self {
        Self {
            product,
            variant_ids,
        }
    }

    /// Identity of the entry this delta would create.
    pub fn key(&self) -> SelectionKey {
        SelectionKey::new(self.product.id, self.variant_ids.iter().copied())
    }
}

/// Where a delta lands in the selection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaTarget {
    /// Append new entries after the existing ones.
    Append,

    /// Substitute the entry at this index.
    Replace(usize),
}

/// A confirmed picker result, ready to merge into a [`SelectionList`](super::SelectionList).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDelta {
    target: DeltaTarget,
    entries: Vec<DeltaEntry>,
}

impl SelectionDelta {
    /// Create a delta for `target`.
    pub fn new(target: DeltaTarget, entries: Vec<DeltaEntry>) -> Self {
        Self { target, entries }
    }

    /// Where the delta lands.
    pub fn target(&self) -> DeltaTarget {
        self.target
    }

    /// The chosen entries.
    pub fn entries(&self) -> &[DeltaEntry] {
        &self.entries
    }

    /// Consume the delta, returning its entries.
    pub fn into_entries(self) -> Vec<DeltaEntry> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the delta carries no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
