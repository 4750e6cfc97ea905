//! # Discount Applicator
//!
//! Applies ONE promotion to a cart snapshot and returns the next snapshot.
//!
//! ## Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Kind            Discount per candidate line                           │
//! │  ──────────────  ────────────────────────────────────────────────────  │
//! │  bundle          deals   = ⌊Σ qty / (buy + get)⌋                        │
//! │                  units   = deals × get, consumed line by line          │
//! │                  amount  = price × consumed × pct / 100                │
//! │  percent         amount  = price × qty × pct / 100                     │
//! │  timedPercent    (same as percent; the window lives in conditions)     │
//! │  fixedAmount     amount  = min(per_unit × qty, price × qty)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A candidate line matches the promotion's targets and has not been
//! attributed earlier in the pass.
//!
//! ## Numeric Guard
//! Every credit checks the unit price, the amount and the resulting subtotal.
//! If any of them is non-finite or negative, that line goes back to zero
//! discount with no attribution and a [`DiscountFault`] is recorded. Other
//! lines and later promotions are unaffected.

use serde::Serialize;
use tracing::{debug, warn};

use super::{BundleRules, Promotion, PromotionRules};
use crate::error::{CoreError, NumericFault};
use crate::types::CartLineItem;

/// A line whose discount was rolled back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountFault {
    pub promotion_id: String,
    pub line_id: String,
    pub fault: NumericFault,
}

impl From<DiscountFault> for CoreError {
    fn from(fault: DiscountFault) -> Self {
        CoreError::Numeric {
            promotion_id: fault.promotion_id,
            line_id: fault.line_id,
            fault: fault.fault,
        }
    }
}

/// Result of applying one promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// The next cart snapshot.
    pub items: Vec<CartLineItem>,

    /// Lines rolled back by the numeric guard.
    pub faults: Vec<DiscountFault>,
}

impl Application {
    fn unchanged(items: &[CartLineItem]) -> Self {
        Application {
            items: items.to_vec(),
            faults: Vec::new(),
        }
    }
}

/// Applies `promo` to `items`, returning a new snapshot.
///
/// The input is not modified. Lines already attributed in this pass are
/// passed through untouched.
pub fn apply_promotion(items: &[CartLineItem], promo: &Promotion) -> Application {
    match &promo.rules {
        PromotionRules::Bundle(rules) => apply_bundle(items, promo, rules),
        PromotionRules::Percent(rules) | PromotionRules::TimedPercent(rules) => {
            let fraction = rules.discount_percent / 100.0;
            apply_per_line(items, promo, |line| line.gross_amount() * fraction)
        }
        PromotionRules::FixedAmount(rules) => apply_per_line(items, promo, |line| {
            let quantity = f64::from(line.quantity);
            (rules.amount_per_unit * quantity).min(line.gross_amount())
        }),
    }
}

fn is_candidate(line: &CartLineItem, promo: &Promotion) -> bool {
    !line.is_attributed() && promo.targets_product(&line.product.id)
}

/// Percent and fixed-amount: every candidate line on its full quantity.
fn apply_per_line<F>(items: &[CartLineItem], promo: &Promotion, amount_for: F) -> Application
where
    F: Fn(&CartLineItem) -> f64,
{
    let mut application = Application::unchanged(items);

    for line in application.items.iter_mut() {
        if !is_candidate(line, promo) {
            continue;
        }

        let amount = amount_for(line);
        match credit(line, &promo.id, amount) {
            Ok(credited) => *line = credited,
            Err(fault) => {
                application.faults.push(roll_back(line, promo, fault));
            }
        }
    }

    application
}

/// Buy X get Y: discount `deals × get_qty` units, walking candidates in cart order.
fn apply_bundle(items: &[CartLineItem], promo: &Promotion, rules: &BundleRules) -> Application {
    let mut application = Application::unchanged(items);

    let deal_size = rules.deal_size();
    if deal_size == 0 {
        return application;
    }

    let candidates: Vec<usize> = application
        .items
        .iter()
        .enumerate()
        .filter(|(_, line)| is_candidate(line, promo))
        .map(|(index, _)| index)
        .collect();

    let total_quantity: u64 = candidates
        .iter()
        .map(|&index| u64::from(application.items[index].quantity))
        .sum();
    let deals = total_quantity / deal_size;
    let mut remaining = deals * u64::from(rules.get_qty);

    debug!(
        promotion_id = %promo.id,
        total_quantity,
        deals,
        units = remaining,
        "Evaluating bundle"
    );

    let fraction = rules.discount_percent / 100.0;

    for index in candidates {
        if remaining == 0 {
            break;
        }

        let line = &mut application.items[index];
        let consumed = remaining.min(u64::from(line.quantity));
        // consumed ≤ quantity ≤ u32::MAX: exact in f64
        let amount = line.effective_unit_price() * consumed as f64 * fraction;

        match credit(line, &promo.id, amount) {
            Ok(credited) => {
                *line = credited;
                remaining -= consumed;
            }
            Err(fault) => {
                application.faults.push(roll_back(line, promo, fault));
            }
        }
    }

    application
}

/// Adds `amount` to the line's discount, clamped to the line's gross amount.
fn credit(line: &CartLineItem, promotion_id: &str, amount: f64) -> Result<CartLineItem, NumericFault> {
    let unit_price = line.effective_unit_price();
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(NumericFault::InvalidUnitPrice(unit_price));
    }

    if !amount.is_finite() || amount < 0.0 {
        return Err(NumericFault::InvalidDiscount(amount));
    }

    let gross = line.gross_amount();
    let discount = (line.discount + amount).min(gross);
    let subtotal = gross - discount;
    if !subtotal.is_finite() || subtotal < 0.0 {
        return Err(NumericFault::InvalidSubtotal(subtotal));
    }

    Ok(CartLineItem {
        discount,
        subtotal,
        applied_promotion_id: Some(promotion_id.to_string()),
        ..line.clone()
    })
}

/// Resets the line to no discount and reports the fault.
fn roll_back(line: &mut CartLineItem, promo: &Promotion, fault: NumericFault) -> DiscountFault {
    *line = line.cleared();

    let fault = DiscountFault {
        promotion_id: promo.id.clone(),
        line_id: line.id.clone(),
        fault,
    };
    let error = CoreError::from(fault.clone());
    warn!(promotion_id = %promo.id, line_id = %line.id, %error, "Discount rolled back");

    fault
}

// =============================================================================
// Unit Tests
// =============================================================================
