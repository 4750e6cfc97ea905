//! # Promotion Pass
//!
//! One full from-scratch evaluation of a cart against a catalog at an instant.
//!
//! ```text
//! items ──► reset_attribution ──► pre_discount_subtotal ──► filter_eligible
//!                                                                │
//!           PassOutcome ◄── fold apply_promotion ◄── order_by_priority
//! ```
//!
//! The pass never touches promotion state: `uses_so_far` belongs to checkout.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{debug, info};

use super::{apply_promotion, filter_eligible, order_by_priority, DiscountFault, EligibilityContext, Promotion};
use crate::types::{CartLineItem, CartTotals};

/// Everything a pass produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassOutcome {
    /// The recomputed cart.
    pub items: Vec<CartLineItem>,

    /// Promotions that discounted at least one line, in application order.
    pub applied_promotion_ids: Vec<String>,

    /// Lines rolled back by the numeric guard.
    pub faults: Vec<DiscountFault>,

    pub totals: CartTotals,
}

impl PassOutcome {
    /// Outcome that hands `items` back verbatim (the fail-closed result).
    pub fn unchanged(items: Vec<CartLineItem>) -> Self {
        let totals = CartTotals::from_items(&items);
        PassOutcome {
            items,
            applied_promotion_ids: Vec::new(),
            faults: Vec::new(),
            totals,
        }
    }
}

/// Returns the cart with every line undiscounted and unattributed.
pub fn reset_attribution(items: &[CartLineItem]) -> Vec<CartLineItem> {
    items.iter().map(CartLineItem::cleared).collect()
}

/// Sum of `quantity × effective_unit_price`, ignoring any discount present.
///
/// Lines whose gross is non-finite or negative contribute nothing: they can
/// never be discounted, and a NaN or infinite total would slip past the
/// minimum purchase gate.
pub fn pre_discount_subtotal(items: &[CartLineItem]) -> f64 {
    items
        .iter()
        .map(CartLineItem::gross_amount)
        .filter(|gross| gross.is_finite() && *gross >= 0.0)
        .sum()
}

/// Runs one pass.
///
/// Deterministic: the same items, catalog and instant always produce the
/// same outcome, and feeding the outcome's items back in reproduces them.
pub fn run_pass(items: &[CartLineItem], promotions: &[Promotion], now: DateTime<FixedOffset>) -> PassOutcome {
    let mut snapshot = reset_attribution(items);

    let subtotal = pre_discount_subtotal(&snapshot);
    let ctx = EligibilityContext::for_cart(now, subtotal);
    let ordered = order_by_priority(filter_eligible(promotions, &ctx));

    debug!(
        items = snapshot.len(),
        catalog = promotions.len(),
        eligible = ordered.len(),
        subtotal,
        "Starting promotion pass"
    );

    let mut applied_promotion_ids = Vec::new();
    let mut faults = Vec::new();

    for promo in ordered {
        let application = apply_promotion(&snapshot, promo);

        let discounted = application
            .items
            .iter()
            .any(|line| line.applied_promotion_id.as_deref() == Some(promo.id.as_str()));
        if discounted {
            applied_promotion_ids.push(promo.id.clone());
        }

        faults.extend(application.faults);
        snapshot = application.items;
    }

    let totals = CartTotals::from_items(&snapshot);
    info!(
        items = snapshot.len(),
        applied = applied_promotion_ids.len(),
        faults = faults.len(),
        discount = %totals.discount,
        "Promotion pass complete"
    );

    PassOutcome {
        items: snapshot,
        applied_promotion_ids,
        faults,
        totals,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
