//! # Domain Types
//!
//! Cart-side types shared by the promotion engine and its callers.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Types                                      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────────┐   ┌──────────────┐ │
//! │  │   ProductRef    │◄──│      CartLineItem        │──►│  CartTotals  │ │
//! │  │  ─────────────  │   │  ──────────────────────  │   │ ──────────── │ │
//! │  │  id             │   │  id (opaque)             │   │ gross        │ │
//! │  │  name           │   │  quantity                │   │ discount     │ │
//! │  │  price          │   │  unit_price_override?    │   │ net          │ │
//! │  └─────────────────┘   │  discount     ┐ owned by │   │ (Money)      │ │
//! │                        │  subtotal     │ the      │   └──────────────┘ │
//! │                        │  applied_promo┘ engine   │                    │
//! │                        └──────────────────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership Split
//! The caller creates and destroys line items (add / remove / merge). The
//! engine owns exactly three fields (`discount`, `subtotal`,
//! `applied_promotion_id`) and rewrites them from scratch on every pass.
//!
//! ## Invariant
//! `subtotal = quantity × effective_unit_price − discount` and
//! `0 ≤ discount ≤ quantity × effective_unit_price`.

use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product Reference
// =============================================================================

/// Product identity and price as captured when the line was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Product ID, matched against promotion targets.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Catalog unit price in major units.
    pub price: f64,
}

impl ProductRef {
    /// Creates a product reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        ProductRef {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

// =============================================================================
// Cart Line Item
// =============================================================================

/// One line of a cart.
///
/// Treated as an immutable value by the engine: every pass step returns new
/// line values instead of patching the caller's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Opaque line ID (owned by the caller).
    pub id: String,

    /// Product snapshot.
    #[serde(rename = "productRef")]
    pub product: ProductRef,

    /// Units on this line (positive).
    pub quantity: u32,

    /// Price override (e.g. manager price change); wins over `product.price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_override: Option<f64>,

    /// Cumulative discount for the current pass.
    #[serde(default)]
    pub discount: f64,

    /// `quantity × effective_unit_price − discount`.
    #[serde(default)]
    pub subtotal: f64,

    /// Promotion that discounted this line in the current pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_promotion_id: Option<String>,
}

impl CartLineItem {
    /// Creates an undiscounted line.
    pub fn new(id: impl Into<String>, product: ProductRef, quantity: u32) -> Self {
        let line = CartLineItem {
            id: id.into(),
            product,
            quantity,
            unit_price_override: None,
            discount: 0.0,
            subtotal: 0.0,
            applied_promotion_id: None,
        };
        line.cleared()
    }

    /// Returns the line with a price override applied.
    pub fn with_unit_price_override(self, price: f64) -> Self {
        CartLineItem {
            unit_price_override: Some(price),
            ..self
        }
        .cleared()
    }

    /// `unit_price_override ?? product.price`.
    #[inline]
    pub fn effective_unit_price(&self) -> f64 {
        self.unit_price_override.unwrap_or(self.product.price)
    }

    /// Pre-discount amount: `quantity × effective_unit_price`.
    #[inline]
    pub fn gross_amount(&self) -> f64 {
        f64::from(self.quantity) * self.effective_unit_price()
    }

    /// Whether a promotion already claimed this line in the current pass.
    #[inline]
    pub fn is_attributed(&self) -> bool {
        self.applied_promotion_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }

    /// Returns the line with no discount and no attribution.
    ///
    /// This is the starting state of every pass and the rollback state
    /// for a line whose discount math failed.
    pub fn cleared(&self) -> Self {
        CartLineItem {
            discount: 0.0,
            subtotal: self.gross_amount(),
            applied_promotion_id: None,
            ..self.clone()
        }
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart totals summary, rounded once into cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u64,
    /// Sum of `quantity × effective_unit_price`.
    pub gross: Money,
    /// Sum of line discounts.
    pub discount: Money,
    /// `gross − discount`.
    pub net: Money,
}

impl CartTotals {
    /// Summarises a cart.
    ///
    /// Non-finite amounts (only possible for corrupt caller prices) count as zero.
    /// Sums saturate at the `Money` range.
    pub fn from_items(items: &[CartLineItem]) -> Self {
        let gross: Money = items
            .iter()
            .map(|i| Money::from_amount(i.gross_amount()).unwrap_or_default())
            .sum();
        let discount: Money = items
            .iter()
            .map(|i| Money::from_amount(i.discount).unwrap_or_default())
            .sum();

        CartTotals {
            item_count: items.len(),
            total_quantity: items.iter().map(|i| u64::from(i.quantity)).sum(),
            gross,
            discount,
            net: gross - discount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
