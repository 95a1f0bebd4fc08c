//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Catalog product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

/// Variant identifier, unique within its parent product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered list of variant ids.
///
/// Most catalog products carry a handful of variants, so the ids stay inline.
pub type VariantIds = SmallVec<[VariantId; 8]>;

/// Product image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image id
    pub id: u64,

    /// Owning product
    pub product_id: ProductId,

    /// Image URL
    pub src: String,
}

/// Purchasable option of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant id
    pub id: VariantId,

    /// Owning product, when the catalog reports it
    #[serde(default)]
    pub product_id: Option<ProductId>,

    /// Variant title, e.g. "S / Blue"
    pub title: String,

    /// Unit price, carried as an exact decimal string on the wire
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product title
    pub title: String,

    /// Variants, in catalog order
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Optional image
    #[serde(default)]
    pub image: Option<ProductImage>,
}

impl Product {
    /// Look up a variant by id.
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.id == id)
    }

    /// Whether `id` names one of this product's variants.
    pub fn has_variant(&self, id: VariantId) -> bool {
        self.variant(id).is_some()
    }

    /// All variant ids in catalog order.
    pub fn variant_ids(&self) -> VariantIds {
        self.variants.iter().map(|variant| variant.id).collect()
    }
}
