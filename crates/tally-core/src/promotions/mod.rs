//! # Promotions
//!
//! The promotion model and the evaluation pipeline.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Promotion Pass                                │
//! │                                                                         │
//! │  cart ──► reset attribution ──► pre-discount subtotal                   │
//! │                                        │                                │
//! │  catalog ──► EligibilityFilter ◄───────┘  (eligibility.rs)             │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │              PriorityResolver             (priority.rs)                 │
//! │                     │  highest priority first, catalog order on ties    │
//! │                     ▼                                                   │
//! │   ┌─────────────────────────────────────────────────────────────┐       │
//! │   │ fold DiscountApplicator over the ordered promotions         │       │
//! │   │   snapshot₀ ─► promo₁ ─► snapshot₁ ─► promo₂ ─► snapshot₂ … │       │
//! │   └─────────────────────────────────────────────────────────────┘       │
//! │                     │                     (discount.rs)                 │
//! │                     ▼                                                   │
//! │               PassOutcome                 (pass.rs)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules as a Sum Type
//! Each campaign kind carries only the fields its algorithm reads. A bundle
//! can't be missing `getQty` and a percent campaign can't carry one.
//!
//! ```json
//! {
//!   "id": "b2g1-cola",
//!   "name": "Cola: buy 2 get 1 free",
//!   "isActive": true,
//!   "priority": 10,
//!   "targetProductIds": ["cola-330"],
//!   "conditions": { "daysOfWeek": [5, 6], "timeOfDayRange": [960, 1200] },
//!   "rules": { "kind": "bundle", "buyQty": 2, "getQty": 1, "discountPercent": 100 }
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub mod discount;
pub mod eligibility;
pub mod pass;
pub mod priority;

#[cfg(test)]
pub(crate) mod fixtures;

pub use discount::{apply_promotion, Application, DiscountFault};
pub use eligibility::{check_eligibility, filter_eligible, EligibilityContext, Ineligibility};
pub use pass::{pre_discount_subtotal, reset_attribution, run_pass, PassOutcome};
pub use priority::order_by_priority;

// =============================================================================
// Promotion Kind
// =============================================================================

/// Campaign kind tag, as stored alongside the rule payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromotionKind {
    /// Buy X get Y at a percentage off.
    Bundle,
    /// Percentage off every matching unit.
    Percent,
    /// Fixed amount off each matching unit.
    FixedAmount,
    /// Percentage off, meant to be paired with weekday / time-of-day conditions.
    TimedPercent,
}

impl PromotionKind {
    /// Storage tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionKind::Bundle => "bundle",
            PromotionKind::Percent => "percent",
            PromotionKind::FixedAmount => "fixedAmount",
            PromotionKind::TimedPercent => "timedPercent",
        }
    }
}

impl fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bundle" => Ok(PromotionKind::Bundle),
            "percent" => Ok(PromotionKind::Percent),
            "fixedAmount" | "fixed_amount" => Ok(PromotionKind::FixedAmount),
            "timedPercent" | "timed_percent" => Ok(PromotionKind::TimedPercent),
            other => Err(CoreError::UnknownPromotionKind(other.to_string())),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Kind-specific rule payload, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PromotionRules {
    Bundle(BundleRules),
    Percent(PercentRules),
    FixedAmount(FixedAmountRules),
    TimedPercent(PercentRules),
}

impl PromotionRules {
    /// The kind tag of this payload.
    pub fn kind(&self) -> PromotionKind {
        match self {
            PromotionRules::Bundle(_) => PromotionKind::Bundle,
            PromotionRules::Percent(_) => PromotionKind::Percent,
            PromotionRules::FixedAmount(_) => PromotionKind::FixedAmount,
            PromotionRules::TimedPercent(_) => PromotionKind::TimedPercent,
        }
    }
}

/// Buy `buy_qty`, get `get_qty` at `discount_percent` off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRules {
    pub buy_qty: u32,
    pub get_qty: u32,
    pub discount_percent: f64,

    /// Single target used when the promotion has no target set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_product_id: Option<String>,
}

impl BundleRules {
    pub fn new(buy_qty: u32, get_qty: u32, discount_percent: f64) -> Self {
        BundleRules {
            buy_qty,
            get_qty,
            discount_percent,
            target_product_id: None,
        }
    }

    /// Sets the rule-level single target.
    pub fn with_target(self, product_id: impl Into<String>) -> Self {
        BundleRules {
            target_product_id: Some(product_id.into()),
            ..self
        }
    }

    /// Units in one complete deal.
    #[inline]
    pub fn deal_size(&self) -> u64 {
        u64::from(self.buy_qty) + u64::from(self.get_qty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentRules {
    pub discount_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedAmountRules {
    pub amount_per_unit: f64,
}

// =============================================================================
// Conditions
// =============================================================================

/// Weekday and time-of-day gates. Absent or empty means unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionConditions {
    /// Weekday indices, 0 = Sunday … 6 = Saturday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<BTreeSet<u8>>,

    /// Inclusive minute-of-day window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day_range: Option<TimeOfDayRange>,
}

/// Inclusive `[start, end]` minute-of-day window, serialized as a pair.
///
/// When `start > end` the window wraps midnight (e.g. `[1320, 120]` is
/// 22:00 through 02:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u16, u16)", into = "(u16, u16)")]
pub struct TimeOfDayRange {
    pub start: u16,
    pub end: u16,
}

impl TimeOfDayRange {
    pub fn new(start: u16, end: u16) -> Self {
        TimeOfDayRange { start, end }
    }

    /// Whether `minute` falls inside the window (both ends inclusive).
    pub fn contains(&self, minute: u16) -> bool {
        if self.start <= self.end {
            (self.start..=self.end).contains(&minute)
        } else {
            minute >= self.start || minute <= self.end
        }
    }
}

impl From<(u16, u16)> for TimeOfDayRange {
    fn from((start, end): (u16, u16)) -> Self {
        TimeOfDayRange { start, end }
    }
}

impl From<TimeOfDayRange> for (u16, u16) {
    fn from(range: TimeOfDayRange) -> Self {
        (range.start, range.end)
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotional campaign definition, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub name: String,

    /// Strict boolean; loosely typed sources are normalised at the boundary.
    pub is_active: bool,

    /// Higher runs first.
    #[serde(default)]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    /// Pre-discount cart subtotal required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_purchase_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,

    /// Incremented by checkout, never by the engine.
    #[serde(default)]
    pub uses_so_far: u32,

    /// Absent or empty = every product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_product_ids: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<PromotionConditions>,

    pub rules: PromotionRules,
}

impl Promotion {
    /// Creates an active, unrestricted promotion with priority 0.
    pub fn new(id: impl Into<String>, name: impl Into<String>, rules: PromotionRules) -> Self {
        Promotion {
            id: id.into(),
            name: name.into(),
            is_active: true,
            priority: 0,
            start_date: None,
            end_date: None,
            min_purchase_amount: None,
            max_uses: None,
            uses_so_far: 0,
            target_product_ids: None,
            conditions: None,
            rules,
        }
    }

    pub fn with_priority(self, priority: i32) -> Self {
        Promotion { priority, ..self }
    }

    pub fn with_targets<I, S>(self, product_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Promotion {
            target_product_ids: Some(product_ids.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    pub fn with_window(self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Promotion {
            start_date: start,
            end_date: end,
            ..self
        }
    }

    pub fn with_min_purchase(self, amount: f64) -> Self {
        Promotion {
            min_purchase_amount: Some(amount),
            ..self
        }
    }

    pub fn with_usage(self, max_uses: u32, uses_so_far: u32) -> Self {
        Promotion {
            max_uses: Some(max_uses),
            uses_so_far,
            ..self
        }
    }

    pub fn with_conditions(self, conditions: PromotionConditions) -> Self {
        Promotion {
            conditions: Some(conditions),
            ..self
        }
    }

    pub fn with_active(self, is_active: bool) -> Self {
        Promotion { is_active, ..self }
    }

    /// The kind tag of this promotion's rules.
    pub fn kind(&self) -> PromotionKind {
        self.rules.kind()
    }

    /// Whether this promotion applies to `product_id`.
    ///
    /// ```text
    /// targetProductIds non-empty ──► membership
    /// else bundle single target  ──► equality
    /// else                       ──► every product
    /// ```
    pub fn targets_product(&self, product_id: &str) -> bool {
        if let Some(targets) = self.target_product_ids.as_ref().filter(|t| !t.is_empty()) {
            return targets.contains(product_id);
        }

        match &self.rules {
            PromotionRules::Bundle(BundleRules {
                target_product_id: Some(target),
                ..
            }) => target == product_id,
            _ => true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
