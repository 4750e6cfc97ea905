//! Builders shared by the promotion tests.

use chrono::{DateTime, FixedOffset, Utc};

use super::{BundleRules, FixedAmountRules, PercentRules, Promotion, PromotionRules};
use crate::types::{CartLineItem, ProductRef};
use crate::AMOUNT_EPSILON;

/// Parses an RFC 3339 instant keeping its offset.
pub fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

/// Parses an RFC 3339 instant as UTC.
pub fn utc(s: &str) -> DateTime<Utc> {
    at(s).with_timezone(&Utc)
}

/// Monday 2026-03-02, 12:00 UTC.
pub fn monday_noon() -> DateTime<FixedOffset> {
    at("2026-03-02T12:00:00+00:00")
}

pub fn line(id: &str, product_id: &str, price: f64, quantity: u32) -> CartLineItem {
    CartLineItem::new(id, ProductRef::new(product_id, product_id, price), quantity)
}

pub fn bundle(id: &str, buy: u32, get: u32, discount_percent: f64) -> Promotion {
    Promotion::new(
        id,
        format!("Bundle {}", id),
        PromotionRules::Bundle(BundleRules::new(buy, get, discount_percent)),
    )
}

pub fn percent_off(id: &str, discount_percent: f64) -> Promotion {
    Promotion::new(
        id,
        format!("Percent {}", id),
        PromotionRules::Percent(PercentRules { discount_percent }),
    )
}

pub fn fixed(id: &str, amount_per_unit: f64) -> Promotion {
    Promotion::new(
        id,
        format!("Fixed {}", id),
        PromotionRules::FixedAmount(FixedAmountRules { amount_per_unit }),
    )
}

/// Checks the per-line discount/subtotal invariant on every line.
///
/// A line with a non-finite or negative gross can only be left undiscounted
/// and unattributed.
pub fn assert_line_invariants(items: &[CartLineItem]) {
    for item in items {
        let gross = item.gross_amount();
        if !(gross.is_finite() && gross >= 0.0) {
            assert_eq!(item.discount, 0.0, "faulted line {} carries a discount", item.id);
            assert!(!item.is_attributed(), "faulted line {} is attributed", item.id);
            continue;
        }
        assert!(
            item.discount >= 0.0 && item.discount <= gross + AMOUNT_EPSILON,
            "line {} discount {} outside 0..={}",
            item.id,
            item.discount,
            gross
        );
        assert!(
            (item.subtotal - (gross - item.discount)).abs() < AMOUNT_EPSILON,
            "line {} subtotal {} != {} - {}",
            item.id,
            item.subtotal,
            gross,
            item.discount
        );
    }
}

pub fn total_discount(items: &[CartLineItem]) -> f64 {
    items.iter().map(|i| i.discount).sum()
}
