//! Selection
//!
//! The authoritative, ordered list of products a merchant has picked. Every
//! structural edit goes through [`SelectionList`], which keeps the
//! `(product, variant set)` identity of its entries unique.

use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    discounts::Discount,
    products::{ProductId, VariantId},
    utils::move_item,
};

pub mod delta;
pub mod entry;
pub mod key;

pub use delta::{DeltaEntry, DeltaTarget, SelectionDelta};
pub use entry::SelectedProduct;
pub use key::SelectionKey;

/// Errors raised by selection list edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// No entry at the given index.
    #[error("no entry at index {index} (list has {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Current list length
        len: usize,
    },

    /// A variant id does not belong to the product.
    #[error("variant {variant} does not belong to product {product}")]
    UnknownVariant {
        /// Product id
        product: ProductId,
        /// Offending variant id
        variant: VariantId,
    },

    /// An entry was built without any variants.
    #[error("product {0} has no selected variants")]
    EmptyVariantSet(ProductId),

    /// A variant reorder added, dropped or repeated ids.
    #[error("variant order for entry {0} is not a permutation of its selected variants")]
    NotAPermutation(usize),

    /// A discount targeted a variant that is not selected on the entry.
    #[error("variant {variant} is not selected on product {product}")]
    VariantNotSelected {
        /// Product id
        product: ProductId,
        /// Variant id
        variant: VariantId,
    },

    /// The removal policy keeps at least one entry.
    #[error("the last entry cannot be removed")]
    LastEntry,

    /// A replacement carried no entries.
    #[error("replacement has no entries")]
    EmptyReplacement,

    /// Two entries share the same product and variant set.
    #[error("duplicate selection {0}")]
    Duplicate(SelectionKey),
}

/// Whether the list may become empty through removal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// The last remaining entry cannot be removed.
    #[default]
    KeepLast,

    /// Any entry may be removed.
    AllowEmpty,
}

/// Result of merging a delta into the list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Entries added to the list
    pub added: usize,

    /// Entries dropped because an identical entry already existed
    pub skipped: usize,
}

/// Ordered list of selected products.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionList {
    entries: Vec<SelectedProduct>,
    removal: RemovalPolicy,
}

impl SelectionList {
    /// Create an empty list.
    pub fn new(removal: RemovalPolicy) -> Self {
        Self {
            entries: Vec::new(),
            removal,
        }
    }

    /// Create a list from existing entries.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Duplicate`] if two entries share a key.
    pub fn with_entries(
        entries: impl Into<Vec<SelectedProduct>>,
        removal: RemovalPolicy,
    ) -> Result<Self, SelectionError> {
        let entries = entries.into();
        let mut keys = FxHashSet::default();

        for entry in &entries {
            let key = entry.key();

            if !keys.insert(key.clone()) {
                return Err(SelectionError::Duplicate(key));
            }
        }

        Ok(Self { entries, removal })
    }

    /// The removal policy.
    pub fn removal_policy(&self) -> RemovalPolicy {
        self.removal
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&SelectedProduct> {
        self.entries.get(index)
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectedProduct> {
        self.entries.iter()
    }

    /// Whether an entry with this key exists.
    pub fn contains_key(&self, key: &SelectionKey) -> bool {
        self.position_of(key).is_some()
    }

    /// Index of the entry with this key.
    pub fn position_of(&self, key: &SelectionKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key() == key)
    }

    /// Whether [`remove`](Self::remove) would currently succeed for some entry.
    pub fn can_remove(&self) -> bool {
        match self.removal {
            RemovalPolicy::KeepLast => self.entries.len() > 1,
            RemovalPolicy::AllowEmpty => !self.entries.is_empty(),
        }
    }

    /// Merge a confirmed picker delta according to its target.
    ///
    /// # Errors
    ///
    /// See [`add_or_merge`](Self::add_or_merge) and [`replace_at`](Self::replace_at).
    pub fn apply(&mut self, delta: SelectionDelta) -> Result<MergeOutcome, SelectionError> {
        match delta.target() {
            DeltaTarget::Append => self.add_or_merge(delta.into_entries()),
            DeltaTarget::Replace(index) => self.replace_at(index, delta.into_entries()),
        }
    }

    /// Append new entries, silently dropping any whose key already exists.
    ///
    /// The whole delta is validated before anything is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if a delta entry names unknown variants or none at all.
    pub fn add_or_merge(
        &mut self,
        delta: impl IntoIterator<Item = DeltaEntry>,
    ) -> Result<MergeOutcome, SelectionError> {
        let mut keys: FxHashSet<SelectionKey> =
            self.entries.iter().map(SelectedProduct::key).collect();

        let (staged, skipped) = stage(delta, &mut keys)?;
        let outcome = MergeOutcome {
            added: staged.len(),
            skipped,
        };

        self.entries.extend(staged);

        info!(
            added = outcome.added,
            skipped = outcome.skipped,
            "merged selection"
        );

        Ok(outcome)
    }

    /// Substitute the entry at `index` with the entries of a delta.
    ///
    /// The replaced entry's discounts are not carried over. Replacement
    /// entries that duplicate another entry in the list are dropped; if all of
    /// them are dropped the original entry stays in place.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::IndexOutOfBounds`]: no entry at `index`.
    /// - [`SelectionError::EmptyReplacement`]: the delta has no entries.
    /// - Entry validation errors as for [`add_or_merge`](Self::add_or_merge).
    pub fn replace_at(
        &mut self,
        index: usize,
        delta: impl IntoIterator<Item = DeltaEntry>,
    ) -> Result<MergeOutcome, SelectionError> {
        self.check_index(index)?;

        let delta: Vec<DeltaEntry> = delta.into_iter().collect();

        if delta.is_empty() {
            return Err(SelectionError::EmptyReplacement);
        }

        let mut keys: FxHashSet<SelectionKey> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != index)
            .map(|(_, entry)| entry.key())
            .collect();

        let (staged, skipped) = stage(delta, &mut keys)?;
        let outcome = MergeOutcome {
            added: staged.len(),
            skipped,
        };

        if staged.is_empty() {
            debug!(index, skipped, "replacement only held duplicates, keeping entry");

            return Ok(outcome);
        }

        let tail = self.entries.split_off(index + 1);

        self.entries.truncate(index);
        self.entries.extend(staged);
        self.entries.extend(tail);

        info!(
            index,
            added = outcome.added,
            skipped = outcome.skipped,
            "replaced selection entry"
        );

        Ok(outcome)
    }

    /// Remove the entry at `index`.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::IndexOutOfBounds`]: no entry at `index`.
    /// - [`SelectionError::LastEntry`]: the policy keeps the last entry.
    pub fn remove(&mut self, index: usize) -> Result<SelectedProduct, SelectionError> {
        self.check_index(index)?;

        if self.removal == RemovalPolicy::KeepLast && self.entries.len() == 1 {
            return Err(SelectionError::LastEntry);
        }

        let removed = self.entries.remove(index);

        debug!(index, product = %removed.product().id, "removed selection entry");

        Ok(removed)
    }

    /// Move the entry at `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfBounds`] if either index is out of range.
    pub fn reorder_products(&mut self, from: usize, to: usize) -> Result<(), SelectionError> {
        self.check_index(from)?;
        self.check_index(to)?;

        move_item(&mut self.entries, from, to);

        Ok(())
    }

    /// Replace the variant display order of the entry at `index`.
    ///
    /// `order` must hold exactly the entry's current variant ids.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::IndexOutOfBounds`]: no entry at `index`.
    /// - [`SelectionError::NotAPermutation`]: `order` adds, drops or repeats ids.
    pub fn reorder_variants_within(
        &mut self,
        index: usize,
        order: &[VariantId],
    ) -> Result<(), SelectionError> {
        let entry = self.entry_mut(index)?;

        if entry.reorder_variants(order) {
            Ok(())
        } else {
            Err(SelectionError::NotAPermutation(index))
        }
    }

    /// Attach or clear the product level discount of the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfBounds`] if there is no entry at `index`.
    pub fn set_product_discount(
        &mut self,
        index: usize,
        discount: Option<Discount>,
    ) -> Result<(), SelectionError> {
        self.entry_mut(index)?.set_discount(discount);

        Ok(())
    }

    /// Attach or clear the discount of one variant of the entry at `index`.
    ///
    /// Clearing removes the variant from the discount mapping.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::IndexOutOfBounds`]: no entry at `index`.
    /// - [`SelectionError::VariantNotSelected`]: attaching to a variant the entry did not select.
    pub fn set_variant_discount(
        &mut self,
        index: usize,
        variant: VariantId,
        discount: Option<Discount>,
    ) -> Result<(), SelectionError> {
        self.entry_mut(index)?.set_variant_discount(variant, discount)
    }

    fn check_index(&self, index: usize) -> Result<(), SelectionError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(SelectionError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            })
        }
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut SelectedProduct, SelectionError> {
        let len = self.entries.len();

        self.entries
            .get_mut(index)
            .ok_or(SelectionError::IndexOutOfBounds { index, len })
    }
}

/// Build entries from a delta, skipping keys already in `keys`.
fn stage(
    delta: impl IntoIterator<Item = DeltaEntry>,
    keys: &mut FxHashSet<SelectionKey>,
) -> Result<(Vec<SelectedProduct>, usize), SelectionError> {
    let mut staged = Vec::new();
    let mut skipped = 0;

    for DeltaEntry {
        product,
        variant_ids,
    } in delta
    {
        let entry = SelectedProduct::new(product, variant_ids)?;
        let key = entry.key();

        if keys.insert(key.clone()) {
            staged.push(entry);
        } else {
            debug!(%key, "dropping duplicate selection");

            skipped += 1;
        }
    }

    Ok((staged, skipped))
}
