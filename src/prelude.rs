//! Product picker prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{
        CatalogClient, CatalogError, FixtureCatalog, FixtureError, HttpCatalogClient,
        SearchRequest,
    },
    config::{CatalogConfig, LogFormat, LoggingConfig, PickerConfig},
    discounts::{Discount, DiscountError, DiscountKind, normalize},
    editor::{Editor, EditorError},
    picker::{
        CheckedState, LoadFailure, LoadStatus, PageOutcome, PageRequest, PickerError, PickerMode,
        PickerSession, SessionId,
    },
    products::{Product, ProductId, ProductImage, Variant, VariantId, VariantIds},
    selection::{
        DeltaEntry, DeltaTarget, MergeOutcome, RemovalPolicy, SelectedProduct, SelectionDelta,
        SelectionError, SelectionKey, SelectionList,
    },
};
