//! Selection Keys

use std::fmt;

use smallvec::SmallVec;

use crate::products::{ProductId, VariantId};

/// Identity of a selection entry: the product plus its variant set.
///
/// Variant ids are stored sorted and deduplicated, so two entries that chose
/// the same variants in a different order share a key. The display order of
/// an entry lives on the entry itself and is never touched by the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey {
    product: ProductId,
    variants: SmallVec<[VariantId; 8]>,
}

impl SelectionKey {
    /// Build a key from a product id and variant ids in any order.
    pub fn new(product: ProductId, variants: impl IntoIterator<Item = VariantId>) -> Self {
        let mut variants: SmallVec<[VariantId; 8]> = variants.into_iter().collect();

        variants.sort_unstable();
        variants.dedup();

        Self { product, variants }
    }

    /// The product id.
    pub fn product(&self) -> ProductId {
        self.product
    }

    /// The variant ids, ascending.
    pub fn variants(&self) -> &[VariantId] {
        &self.variants
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.product)?;

        for (idx, variant) in self.variants.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }

            write!(f, "{variant}")?;
        }

        f.write_str("]")
    }
}
