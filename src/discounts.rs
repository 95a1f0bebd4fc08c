//! Discounts
//!
//! Validation and normalisation of the discount value + kind pair a merchant
//! attaches to a selected product or to one of its variants.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Highest percentage a presentation layer should accept.
pub const PERCENTAGE_CAP: Decimal = Decimal::ONE_HUNDRED;

/// Errors produced while parsing raw discount input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// The input was not a number.
    #[error("discount value {0:?} is not a number")]
    Unparsable(String),

    /// The input was a negative number.
    #[error("discount value {0} is negative")]
    Negative(Decimal),
}

/// How a discount value is interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Fixed amount off the price.
    Flat,

    /// Percentage off the price.
    #[default]
    Percentage,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountKind::Flat => f.write_str("flat"),
            DiscountKind::Percentage => f.write_str("percentage"),
        }
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "flat" => Ok(DiscountKind::Flat),
            "percentage" => Ok(DiscountKind::Percentage),
            other => Err(format!("unknown discount kind: {other}")),
        }
    }
}

/// A validated, non-negative discount.
///
/// The default value is a zero percentage discount, which is what a merchant
/// starts from when adding a discount to an entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDiscount")]
pub struct Discount {
    kind: DiscountKind,

    #[serde(with = "rust_decimal::serde::str")]
    value: Decimal,
}

/// Unvalidated wire form of a [`Discount`].
#[derive(Debug, Deserialize)]
struct RawDiscount {
    kind: DiscountKind,

    #[serde(with = "rust_decimal::serde::str")]
    value: Decimal,
}

impl TryFrom<RawDiscount> for Discount {
    type Error = DiscountError;

    fn try_from(raw: RawDiscount) -> Result<Self, Self::Error> {
        Discount::new(raw.kind, raw.value)
    }
}

impl Discount {
    /// Create a discount.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::Negative`] when `value` is below zero.
    pub fn new(kind: DiscountKind, value: Decimal) -> Result<Self, DiscountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DiscountError::Negative(value));
        }

        // -0 parses with a negative sign; store a plain zero
        let value = if value.is_zero() { Decimal::ZERO } else { value };

        Ok(Self { kind, value })
    }

    /// The discount kind.
    pub fn kind(&self) -> DiscountKind {
        self.kind
    }

    /// The discount value, an amount for `Flat` or percentage points for `Percentage`.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// The same value reinterpreted under another kind.
    #[must_use]
    pub fn with_kind(self, kind: DiscountKind) -> Self {
        Self { kind, ..self }
    }

    /// Whether a percentage discount is above [`PERCENTAGE_CAP`].
    ///
    /// Flat discounts are never capped here.
    pub fn exceeds_percentage_cap(&self) -> bool {
        self.kind == DiscountKind::Percentage && self.value > PERCENTAGE_CAP
    }

    /// Price after applying this discount, never below zero.
    pub fn apply_to(&self, price: Decimal) -> Decimal {
        let reduction = match self.kind {
            DiscountKind::Flat => self.value,
            DiscountKind::Percentage => price
                .checked_mul(self.value)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .unwrap_or(price),
        };

        price
            .checked_sub(reduction)
            .map_or(Decimal::ZERO, |discounted| discounted.max(Decimal::ZERO))
    }
}

/// Parse raw discount input.
///
/// # Errors
///
/// - [`DiscountError::Unparsable`]: `raw` is not a decimal number.
/// - [`DiscountError::Negative`]: `raw` is below zero.
pub fn parse(raw: &str, kind: DiscountKind) -> Result<Discount, DiscountError> {
    let trimmed = raw.trim();

    let value = Decimal::from_str(trimmed)
        .or_else(|_err| Decimal::from_scientific(trimmed))
        .map_err(|_err| DiscountError::Unparsable(raw.to_string()))?;

    Discount::new(kind, value)
}

/// Normalise raw discount input.
///
/// Invalid input means "remove the discount", so it is reported as `None`
/// rather than as an error. No rounding or upper bound is applied.
pub fn normalize(raw: &str, kind: DiscountKind) -> Option<Discount> {
    match parse(raw, kind) {
        Ok(discount) => Some(discount),
        Err(error) => {
            debug!(%error, %kind, "discarding discount input");

            None
        }
    }
}
