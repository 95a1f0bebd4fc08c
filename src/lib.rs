//! Product Picker
//!
//! Selection and reconciliation engine for a product catalog editor: pick
//! products and variants from a paginated remote catalog, keep them in an
//! ordered list without exact duplicates, and attach flat or percentage
//! discounts per product or per variant.

pub mod catalog;
pub mod config;
pub mod discounts;
pub mod editor;
pub mod observability;
pub mod picker;
pub mod prelude;
pub mod products;
pub mod selection;
pub mod utils;
