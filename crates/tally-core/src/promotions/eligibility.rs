//! # Eligibility Filter
//!
//! Narrows the catalog to the promotions that apply right now.
//!
//! ## Gates (all must hold)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  #  Gate               Passes when                                     │
//! │  ─  ─────────────────  ──────────────────────────────────────────────  │
//! │  1  active flag        is_active                                       │
//! │  2  start date         absent or start ≤ now                           │
//! │  3  end date           absent or end ≥ now                             │
//! │  4  usage cap          absent or uses_so_far < max_uses                │
//! │  5  weekday            absent / empty, or contains now's weekday       │
//! │  6  time of day        absent, or now's minute-of-day inside window    │
//! │  7  minimum purchase   absent, or cart subtotal ≥ minimum              │
//! │                                                                         │
//! │  Absent constraint = unrestricted. Never a failure.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A promotion whose present values can't be evaluated (see
//! [`validate_promotion`]) is logged and excluded; the others are still
//! filtered normally.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use super::Promotion;
use crate::error::CoreError;
use crate::validation::validate_promotion;

/// The instant and cart state a promotion is judged against.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext {
    /// Current instant, in the store's offset.
    pub now: DateTime<FixedOffset>,

    /// Pre-discount cart subtotal. `None` skips the minimum purchase gate
    /// (listing promotions with no cart at hand).
    pub cart_subtotal: Option<f64>,
}

impl EligibilityContext {
    /// Context for evaluating against a cart.
    pub fn for_cart(now: DateTime<FixedOffset>, cart_subtotal: f64) -> Self {
        EligibilityContext {
            now,
            cart_subtotal: Some(cart_subtotal),
        }
    }

    /// Context for listing promotions without a cart.
    pub fn without_cart(now: DateTime<FixedOffset>) -> Self {
        EligibilityContext {
            now,
            cart_subtotal: None,
        }
    }

    /// Weekday index, 0 = Sunday.
    fn weekday(&self) -> u8 {
        // num_days_from_sunday is always 0..=6
        self.now.weekday().num_days_from_sunday() as u8
    }

    fn minute_of_day(&self) -> u16 {
        // hour ≤ 23, minute ≤ 59: fits u16
        (self.now.hour() * 60 + self.now.minute()) as u16
    }
}

/// Why a promotion did not pass the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ineligibility {
    #[error("promotion is inactive")]
    Inactive,

    #[error("promotion has not started")]
    NotStarted,

    #[error("promotion has expired")]
    Expired,

    #[error("usage cap reached")]
    UsageExhausted,

    #[error("not valid on this weekday")]
    WrongWeekday,

    #[error("outside the time-of-day window")]
    OutsideTimeWindow,

    #[error("cart subtotal below minimum purchase")]
    BelowMinimumPurchase,
}

/// Checks every gate for a single promotion, in gate order.
///
/// Assumes the promotion passed [`validate_promotion`].
pub fn check_eligibility(promo: &Promotion, ctx: &EligibilityContext) -> Result<(), Ineligibility> {
    let instant = ctx.now.with_timezone(&Utc);

    if !promo.is_active {
        return Err(Ineligibility::Inactive);
    }

    if promo.start_date.is_some_and(|start| start > instant) {
        return Err(Ineligibility::NotStarted);
    }

    if promo.end_date.is_some_and(|end| end < instant) {
        return Err(Ineligibility::Expired);
    }

    if promo.max_uses.is_some_and(|max| promo.uses_so_far >= max) {
        return Err(Ineligibility::UsageExhausted);
    }

    if let Some(conditions) = &promo.conditions {
        if let Some(days) = conditions.days_of_week.as_ref().filter(|d| !d.is_empty()) {
            if !days.contains(&ctx.weekday()) {
                return Err(Ineligibility::WrongWeekday);
            }
        }

        if let Some(range) = conditions.time_of_day_range {
            if !range.contains(ctx.minute_of_day()) {
                return Err(Ineligibility::OutsideTimeWindow);
            }
        }
    }

    if let (Some(min), Some(subtotal)) = (promo.min_purchase_amount, ctx.cart_subtotal) {
        if subtotal.is_nan() || subtotal < min {
            return Err(Ineligibility::BelowMinimumPurchase);
        }
    }

    Ok(())
}

/// Returns the promotions eligible under `ctx`, in catalog order.
pub fn filter_eligible<'a>(promotions: &'a [Promotion], ctx: &EligibilityContext) -> Vec<&'a Promotion> {
    promotions
        .iter()
        .filter(|promo| {
            if let Err(source) = validate_promotion(promo) {
                let error = CoreError::malformed(promo.id.clone(), source);
                warn!(promotion_id = %promo.id, %error, "Skipping malformed promotion");
                return false;
            }

            match check_eligibility(promo, ctx) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(promotion_id = %promo.id, %reason, "Promotion not eligible");
                    false
                }
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotions::fixtures::{at, bundle, monday_noon, percent_off, utc};
    use crate::promotions::{PromotionConditions, TimeOfDayRange};

    fn ctx(subtotal: f64) -> EligibilityContext {
        EligibilityContext::for_cart(monday_noon(), subtotal)
    }

    #[test]
    fn test_unrestricted_promotion_is_eligible() {
        assert_eq!(check_eligibility(&percent_off("p", 10.0), &ctx(0.0)), Ok(()));
    }

    #[test]
    fn test_inactive() {
        let promo = percent_off("p", 10.0).with_active(false);
        assert_eq!(check_eligibility(&promo, &ctx(0.0)), Err(Ineligibility::Inactive));
    }

    #[test]
    fn test_date_window_is_inclusive() {
        let noon = utc("2026-03-02T12:00:00Z");
        let promo = percent_off("p", 10.0).with_window(Some(noon), Some(noon));
        assert_eq!(check_eligibility(&promo, &ctx(0.0)), Ok(()));

        let later = percent_off("p", 10.0).with_window(Some(utc("2026-03-02T12:00:01Z")), None);
        assert_eq!(check_eligibility(&later, &ctx(0.0)), Err(Ineligibility::NotStarted));
    }

    #[test]
    fn test_expired_regardless_of_priority_and_targeting() {
        let promo = percent_off("p", 10.0)
            .with_priority(1_000)
            .with_targets(["p1"])
            .with_window(None, Some(utc("2026-03-01T23:59:59Z")));
        assert_eq!(check_eligibility(&promo, &ctx(500.0)), Err(Ineligibility::Expired));
    }

    #[test]
    fn test_dates_compare_as_instants_across_offsets() {
        // 12:00 UTC is 07:00 at -05:00; an end date of 11:00 UTC has passed
        let now = at("2026-03-02T07:00:00-05:00");
        let promo = percent_off("p", 10.0).with_window(None, Some(utc("2026-03-02T11:00:00Z")));
        let ctx = EligibilityContext::for_cart(now, 0.0);
        assert_eq!(check_eligibility(&promo, &ctx), Err(Ineligibility::Expired));
    }

    #[test]
    fn test_usage_cap() {
        let open = percent_off("p", 10.0).with_usage(5, 4);
        assert_eq!(check_eligibility(&open, &ctx(0.0)), Ok(()));

        let exhausted = percent_off("p", 10.0).with_usage(5, 5);
        assert_eq!(
            check_eligibility(&exhausted, &ctx(0.0)),
            Err(Ineligibility::UsageExhausted)
        );
    }

    #[test]
    fn test_weekday_gate_uses_sunday_zero() {
        // monday_noon is a Monday → index 1
        let monday = percent_off("p", 10.0).with_conditions(PromotionConditions {
            days_of_week: Some([1].into_iter().collect()),
            time_of_day_range: None,
        });
        assert_eq!(check_eligibility(&monday, &ctx(0.0)), Ok(()));

        let weekend = percent_off("p", 10.0).with_conditions(PromotionConditions {
            days_of_week: Some([0, 6].into_iter().collect()),
            time_of_day_range: None,
        });
        assert_eq!(
            check_eligibility(&weekend, &ctx(0.0)),
            Err(Ineligibility::WrongWeekday)
        );

        let empty = percent_off("p", 10.0).with_conditions(PromotionConditions {
            days_of_week: Some(Default::default()),
            time_of_day_range: None,
        });
        assert_eq!(check_eligibility(&empty, &ctx(0.0)), Ok(()));
    }

    #[test]
    fn test_weekday_read_in_store_offset() {
        // Monday 01:00 at +03:00 is still Sunday in UTC
        let now = at("2026-03-02T01:00:00+03:00");
        let monday = percent_off("p", 10.0).with_conditions(PromotionConditions {
            days_of_week: Some([1].into_iter().collect()),
            time_of_day_range: None,
        });
        let ctx = EligibilityContext::for_cart(now, 0.0);
        assert_eq!(check_eligibility(&monday, &ctx), Ok(()));
    }

    #[test]
    fn test_time_of_day_window() {
        let lunch = percent_off("p", 10.0).with_conditions(PromotionConditions {
            days_of_week: None,
            time_of_day_range: Some(TimeOfDayRange::new(11 * 60, 12 * 60)),
        });
        assert_eq!(check_eligibility(&lunch, &ctx(0.0)), Ok(()));

        let evening = percent_off("p", 10.0).with_conditions(PromotionConditions {
            days_of_week: None,
            time_of_day_range: Some(TimeOfDayRange::new(17 * 60, 20 * 60)),
        });
        assert_eq!(
            check_eligibility(&evening, &ctx(0.0)),
            Err(Ineligibility::OutsideTimeWindow)
        );
    }

    #[test]
    fn test_minimum_purchase_gate() {
        let promo = percent_off("p", 10.0).with_min_purchase(50.0);
        assert_eq!(
            check_eligibility(&promo, &ctx(40.0)),
            Err(Ineligibility::BelowMinimumPurchase)
        );
        assert_eq!(check_eligibility(&promo, &ctx(50.0)), Ok(()));
        assert_eq!(
            check_eligibility(&promo, &ctx(f64::NAN)),
            Err(Ineligibility::BelowMinimumPurchase)
        );

        let no_cart = EligibilityContext::without_cart(monday_noon());
        assert_eq!(check_eligibility(&promo, &no_cart), Ok(()));
    }

    #[test]
    fn test_filter_excludes_malformed_and_keeps_the_rest() {
        let promotions = vec![
            percent_off("good", 10.0),
            bundle("broken", 0, 0, 100.0),
            percent_off("expired", 10.0).with_window(None, Some(utc("2020-01-01T00:00:00Z"))),
            bundle("also-good", 2, 1, 50.0),
        ];

        let eligible = filter_eligible(&promotions, &ctx(10.0));
        let ids: Vec<&str> = eligible.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "also-good"]);
    }
}
