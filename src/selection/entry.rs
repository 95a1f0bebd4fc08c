//! Selected Products

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::{
    discounts::Discount,
    products::{Product, Variant, VariantId, VariantIds},
    selection::{SelectionError, key::SelectionKey},
};

/// A product in the selection list with its chosen variants and discounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProduct {
    product: Product,

    /// Chosen variants in display order
    selected_variant_ids: VariantIds,

    discount: Option<Discount>,

    /// Per-variant discounts; keys are always a subset of `selected_variant_ids`
    variant_discounts: FxHashMap<VariantId, Discount>,
}

impl SelectedProduct {
    /// Create an entry for `product` with the given variants in display order.
    ///
    /// Repeated ids keep their first position.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::UnknownVariant`]: an id does not belong to `product`.
    /// - [`SelectionError::EmptyVariantSet`]: no variants were given.
    pub fn new(
        product: Product,
        variant_ids: impl IntoIterator<Item = VariantId>,
    ) -> Result<Self, SelectionError> {
        let mut selected_variant_ids = VariantIds::new();

        for variant in variant_ids {
            if !product.has_variant(variant) {
                return Err(SelectionError::UnknownVariant {
                    product: product.id,
                    variant,
                });
            }

            if !selected_variant_ids.contains(&variant) {
                selected_variant_ids.push(variant);
            }
        }

        if selected_variant_ids.is_empty() {
            return Err(SelectionError::EmptyVariantSet(product.id));
        }

        Ok(Self {
            product,
            selected_variant_ids,
            discount: None,
            variant_discounts: FxHashMap::default(),
        })
    }

    /// The catalog product.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Chosen variant ids in display order.
    pub fn selected_variant_ids(&self) -> &[VariantId] {
        &self.selected_variant_ids
    }

    /// Chosen variants in display order.
    pub fn selected_variants(&self) -> impl Iterator<Item = &Variant> {
        self.selected_variant_ids
            .iter()
            .filter_map(|id| self.product.variant(*id))
    }

    /// Whether `variant` is one of the chosen variants.
    pub fn is_selected(&self, variant: VariantId) -> bool {
        self.selected_variant_ids.contains(&variant)
    }

    /// Identity of this entry for duplicate detection.
    pub fn key(&self) -> SelectionKey {
        SelectionKey::new(self.product.id, self.selected_variant_ids.iter().copied())
    }

    /// Product level discount.
    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    /// Discount attached to a single variant.
    pub fn variant_discount(&self, variant: VariantId) -> Option<&Discount> {
        self.variant_discounts.get(&variant)
    }

    /// Number of variants carrying their own discount.
    pub fn variant_discount_count(&self) -> usize {
        self.variant_discounts.len()
    }

    /// The discount that applies to `variant`: its own, else the product's.
    pub fn effective_discount(&self, variant: VariantId) -> Option<&Discount> {
        if !self.is_selected(variant) {
            return None;
        }

        self.variant_discount(variant).or(self.discount.as_ref())
    }

    /// Price of `variant` after its effective discount.
    ///
    /// Returns `None` if the variant is not selected on this entry.
    pub fn discounted_price(&self, variant: VariantId) -> Option<Decimal> {
        if !self.is_selected(variant) {
            return None;
        }

        let price = self.product.variant(variant)?.price;

        Some(
            self.effective_discount(variant)
                .map_or(price, |discount| discount.apply_to(price)),
        )
    }

    pub(super) fn set_discount(&mut self, discount: Option<Discount>) {
        self.discount = discount;
    }

    pub(super) fn set_variant_discount(
        &mut self,
        variant: VariantId,
        discount: Option<Discount>,
    ) -> Result<(), SelectionError> {
        match discount {
            Some(discount) => {
                if !self.is_selected(variant) {
                    return Err(SelectionError::VariantNotSelected {
                        product: self.product.id,
                        variant,
                    });
                }

                self.variant_discounts.insert(variant, discount);
            }
            None => {
                self.variant_discounts.remove(&variant);
            }
        }

        Ok(())
    }

    /// Replace the display order with a permutation of the current ids.
    pub(super) fn reorder_variants(&mut self, order: &[VariantId]) -> bool {
        if order.len() != self.selected_variant_ids.len() {
            return false;
        }

        let mut current: VariantIds = self.selected_variant_ids.clone();
        let mut proposed: VariantIds = order.iter().copied().collect();

        current.sort_unstable();
        proposed.sort_unstable();

        if current != proposed {
            return false;
        }

        self.selected_variant_ids = order.iter().copied().collect();

        true
    }
}
