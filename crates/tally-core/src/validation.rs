//! # Validation Module
//!
//! Input validation for cart lines and promotion rule payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storage boundary (tally-db, JSON catalog)                    │
//! │  ├── kind / rules decode into the typed PromotionRules                 │
//! │  └── loosely typed isActive normalised to bool                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── numbers that decode but cannot be evaluated                       │
//! │  │   (deal size 0, 140% off, weekday 9, NaN minimum)                   │
//! │  └── cart input (quantity, unit price)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: DiscountApplicator numeric guards                            │
//! │  └── per-line rollback on non-finite / negative results                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_quantity, validate_unit_price};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_unit_price(f64::NAN).is_err());
//! ```

use crate::error::ValidationError;
use crate::promotions::{Promotion, PromotionRules};
use crate::{MAX_ITEM_QUANTITY, MINUTES_PER_DAY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart Input Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::from(MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

/// Validates a unit price (catalog price or override).
///
/// ## Rules
/// - Finite and non-negative; zero is allowed (free items)
pub fn validate_unit_price(price: f64) -> ValidationResult<()> {
    finite_non_negative("unitPrice", price)
}

// =============================================================================
// Promotion Validators
// =============================================================================

/// Validates that a promotion can be evaluated.
///
/// Missing optional constraints are never errors (they mean "unrestricted");
/// only values that are present but unusable are rejected.
///
/// ## Rules
/// ```text
/// ┌────────────────────┬──────────────────────────────────────────────────┐
/// │ Field              │ Requirement                                      │
/// ├────────────────────┼──────────────────────────────────────────────────┤
/// │ id, name           │ non-empty                                        │
/// │ bundle buy/getQty  │ ≥ 1 each                                         │
/// │ discountPercent    │ finite, 0..=100                                  │
/// │ amountPerUnit      │ finite, ≥ 0                                      │
/// │ minPurchaseAmount  │ finite, ≥ 0 (when present)                       │
/// │ daysOfWeek         │ each 0..=6 (0 = Sunday)                          │
/// │ timeOfDayRange     │ both ends 0..=1439                               │
/// │ startDate/endDate  │ start ≤ end (when both present)                  │
/// └────────────────────┴──────────────────────────────────────────────────┘
/// ```
pub fn validate_promotion(promo: &Promotion) -> ValidationResult<()> {
    if promo.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if promo.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    validate_rules(&promo.rules)?;

    if let Some(min) = promo.min_purchase_amount {
        finite_non_negative("minPurchaseAmount", min)?;
    }

    if let (Some(start), Some(end)) = (promo.start_date, promo.end_date) {
        if start > end {
            return Err(ValidationError::Inconsistent {
                field: "startDate".to_string(),
                reason: format!("{} is after endDate {}", start, end),
            });
        }
    }

    if let Some(conditions) = &promo.conditions {
        if let Some(days) = &conditions.days_of_week {
            if let Some(bad) = days.iter().find(|d| **d > 6) {
                return Err(ValidationError::OutOfRange {
                    field: format!("daysOfWeek[{}]", bad),
                    min: 0,
                    max: 6,
                });
            }
        }

        if let Some(range) = conditions.time_of_day_range {
            for (field, minute) in [("timeOfDayRange.start", range.start), ("timeOfDayRange.end", range.end)] {
                if minute >= MINUTES_PER_DAY {
                    return Err(ValidationError::OutOfRange {
                        field: field.to_string(),
                        min: 0,
                        max: i64::from(MINUTES_PER_DAY - 1),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Validates the kind-specific rule payload.
fn validate_rules(rules: &PromotionRules) -> ValidationResult<()> {
    match rules {
        PromotionRules::Bundle(bundle) => {
            if bundle.buy_qty == 0 {
                return Err(ValidationError::MustBePositive {
                    field: "buyQty".to_string(),
                });
            }
            if bundle.get_qty == 0 {
                return Err(ValidationError::MustBePositive {
                    field: "getQty".to_string(),
                });
            }
            percent("discountPercent", bundle.discount_percent)
        }
        PromotionRules::Percent(rules) | PromotionRules::TimedPercent(rules) => {
            percent("discountPercent", rules.discount_percent)
        }
        PromotionRules::FixedAmount(rules) => {
            finite_non_negative("amountPerUnit", rules.amount_per_unit)
        }
    }
}

fn percent(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::InvalidPercent {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn finite_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::NotFiniteAmount {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotions::fixtures::{bundle, fixed, percent_off, utc};
    use crate::promotions::{PromotionConditions, TimeOfDayRange};

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(0.0).is_ok());
        assert!(validate_unit_price(19.99).is_ok());
        assert!(validate_unit_price(-0.01).is_err());
        assert!(validate_unit_price(f64::INFINITY).is_err());
    }

    #[test]
    fn test_well_formed_promotions_pass() {
        assert!(validate_promotion(&bundle("b", 2, 1, 100.0)).is_ok());
        assert!(validate_promotion(&percent_off("p", 10.0)).is_ok());
        assert!(validate_promotion(&fixed("f", 0.5)).is_ok());
    }

    #[test]
    fn test_zero_deal_size_is_malformed() {
        let err = validate_promotion(&bundle("b", 0, 1, 50.0)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MustBePositive {
                field: "buyQty".to_string()
            }
        );
        assert!(validate_promotion(&bundle("b", 2, 0, 50.0)).is_err());
    }

    #[test]
    fn test_percent_bounds() {
        assert!(validate_promotion(&percent_off("p", 100.0)).is_ok());
        assert!(validate_promotion(&percent_off("p", 100.5)).is_err());
        assert!(validate_promotion(&percent_off("p", -1.0)).is_err());
        assert!(validate_promotion(&percent_off("p", f64::NAN)).is_err());
    }

    #[test]
    fn test_negative_fixed_amount_is_malformed() {
        assert!(validate_promotion(&fixed("f", -2.0)).is_err());
    }

    #[test]
    fn test_missing_optional_fields_are_fine() {
        let mut promo = percent_off("p", 5.0);
        promo.conditions = Some(PromotionConditions::default());
        assert!(validate_promotion(&promo).is_ok());
    }

    #[test]
    fn test_out_of_range_conditions() {
        let mut promo = percent_off("p", 5.0);
        promo.conditions = Some(PromotionConditions {
            days_of_week: Some([1, 7].into_iter().collect()),
            time_of_day_range: None,
        });
        assert!(validate_promotion(&promo).is_err());

        promo.conditions = Some(PromotionConditions {
            days_of_week: None,
            time_of_day_range: Some(TimeOfDayRange::new(600, 1440)),
        });
        assert!(validate_promotion(&promo).is_err());
    }

    #[test]
    fn test_inverted_date_range() {
        let promo = percent_off("p", 5.0)
            .with_window(Some(utc("2026-06-01T00:00:00Z")), Some(utc("2026-05-01T00:00:00Z")));
        assert!(matches!(
            validate_promotion(&promo),
            Err(ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_blank_name() {
        let mut promo = percent_off("p", 5.0);
        promo.name = "  ".to_string();
        assert!(validate_promotion(&promo).is_err());
    }
}
