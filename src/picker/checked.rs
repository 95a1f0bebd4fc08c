//! Checked products and variants of a picker session.

use crate::{
    picker::PickerError,
    products::{Product, ProductId, VariantId, VariantIds},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckedProduct {
    product: ProductId,
    variants: VariantIds,
}

/// Products and variants currently checked, in the order they were checked.
///
/// A product is checked exactly when at least one of its variants is.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckedState {
    products: Vec<CheckedProduct>,
}

impl CheckedState {
    /// Whether `product` is checked.
    pub fn is_checked(&self, product: ProductId) -> bool {
        self.find(product).is_some()
    }

    /// Checked variants of `product`, in check order.
    pub fn variants(&self, product: ProductId) -> Option<&[VariantId]> {
        self.find(product).map(|checked| checked.variants.as_slice())
    }

    /// Whether `variant` of `product` is checked.
    pub fn is_variant_checked(&self, product: ProductId, variant: VariantId) -> bool {
        self.variants(product)
            .is_some_and(|variants| variants.contains(&variant))
    }

    /// Number of checked products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether nothing is checked.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Checked products with their variants, in check order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, &[VariantId])> {
        self.products
            .iter()
            .map(|checked| (checked.product, checked.variants.as_slice()))
    }

    /// Check `product` with exactly `variants`, replacing any previous state.
    pub fn seed(&mut self, product: ProductId, variants: &[VariantId]) {
        self.products.retain(|checked| checked.product != product);

        if !variants.is_empty() {
            self.products.push(CheckedProduct {
                product,
                variants: variants.iter().copied().collect(),
            });
        }
    }

    /// Toggle a product.
    ///
    /// Checking selects all of its variants; unchecking clears them. Returns
    /// whether the product is checked afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PickerError::NoVariants`] when checking a product without variants.
    pub fn toggle_product(&mut self, product: &Product) -> Result<bool, PickerError> {
        if let Some(position) = self.position(product.id) {
            self.products.remove(position);

            return Ok(false);
        }

        if product.variants.is_empty() {
            return Err(PickerError::NoVariants(product.id));
        }

        self.products.push(CheckedProduct {
            product: product.id,
            variants: product.variant_ids(),
        });

        Ok(true)
    }

    /// Toggle one variant.
    ///
    /// Checking a variant checks its product; unchecking the last checked
    /// variant unchecks the product. Returns whether the variant is checked
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PickerError::UnknownVariant`] if `variant` is not one of the product's.
    pub fn toggle_variant(
        &mut self,
        product: &Product,
        variant: VariantId,
    ) -> Result<bool, PickerError> {
        if !product.has_variant(variant) {
            return Err(PickerError::UnknownVariant {
                product: product.id,
                variant,
            });
        }

        let Some(position) = self.position(product.id) else {
            self.products.push(CheckedProduct {
                product: product.id,
                variants: VariantIds::from_slice(&[variant]),
            });

            return Ok(true);
        };

        let Some(checked) = self.products.get_mut(position) else {
            return Ok(false);
        };

        if let Some(idx) = checked.variants.iter().position(|id| *id == variant) {
            checked.variants.remove(idx);

            if checked.variants.is_empty() {
                self.products.remove(position);
            }

            Ok(false)
        } else {
            checked.variants.push(variant);

            Ok(true)
        }
    }

    fn find(&self, product: ProductId) -> Option<&CheckedProduct> {
        self.products.iter().find(|checked| checked.product == product)
    }

    fn position(&self, product: ProductId) -> Option<usize> {
        self.products
            .iter()
            .position(|checked| checked.product == product)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::products::Variant;

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
                    price: Decimal::ONE,
                })
                .collect(),
            image: None,
        }
    }

    #[test]
    fn checking_a_product_selects_all_variants() -> TestResult {
        let mut state = CheckedState::default();
        let towel = product(1, &[10, 11, 12]);

        assert!(state.toggle_product(&towel)?);
        assert_eq!(
            state.variants(towel.id),
            Some([VariantId(10), VariantId(11), VariantId(12)].as_slice())
        );

        Ok(())
    }

    #[test]
    fn unchecking_a_product_clears_variants() -> TestResult {
        let mut state = CheckedState::default();
        let towel = product(1, &[10, 11]);

        state.toggle_product(&towel)?;

        assert!(!state.toggle_product(&towel)?);
        assert!(!state.is_checked(towel.id));
        assert_eq!(state.variants(towel.id), None);

        Ok(())
    }

    #[test]
    fn checking_a_variant_checks_its_product() -> TestResult {
        let mut state = CheckedState::default();
        let towel = product(1, &[10, 11]);

        assert!(state.toggle_variant(&towel, VariantId(11))?);
        assert!(state.is_checked(towel.id));
        assert_eq!(state.variants(towel.id), Some([VariantId(11)].as_slice()));

        Ok(())
    }

    #[test]
    fn unchecking_the_last_variant_unchecks_the_product() -> TestResult {
        let mut state = CheckedState::default();
        let towel = product(1, &[10, 11]);

        state.toggle_variant(&towel, VariantId(10))?;
        state.toggle_variant(&towel, VariantId(11))?;
        state.toggle_variant(&towel, VariantId(10))?;

        assert!(state.is_checked(towel.id));

        assert!(!state.toggle_variant(&towel, VariantId(11))?);
        assert!(!state.is_checked(towel.id));
        assert!(state.is_empty());

        Ok(())
    }

    #[test]
    fn variants_keep_check_order() -> TestResult {
        let mut state = CheckedState::default();
        let towel = product(1, &[10, 11, 12]);

        state.toggle_variant(&towel, VariantId(12))?;
        state.toggle_variant(&towel, VariantId(10))?;

        assert_eq!(
            state.variants(towel.id),
            Some([VariantId(12), VariantId(10)].as_slice())
        );

        Ok(())
    }

    #[test]
    fn products_without_variants_cannot_be_checked() {
        let mut state = CheckedState::default();

        assert_eq!(
            state.toggle_product(&product(3, &[])),
            Err(PickerError::NoVariants(ProductId(3)))
        );
    }

    #[test]
    fn foreign_variants_are_rejected() {
        let mut state = CheckedState::default();

        assert_eq!(
            state.toggle_variant(&product(1, &[10]), VariantId(20)),
            Err(PickerError::UnknownVariant {
                product: ProductId(1),
                variant: VariantId(20)
            })
        );
        assert!(state.is_empty());
    }

    #[test]
    fn seed_replaces_previous_state() {
        let mut state = CheckedState::default();

        state.seed(ProductId(1), &[VariantId(10)]);
        state.seed(ProductId(1), &[VariantId(11), VariantId(10)]);

        assert_eq!(state.len(), 1);
        assert_eq!(
            state.variants(ProductId(1)),
            Some([VariantId(11), VariantId(10)].as_slice())
        );
    }
}
