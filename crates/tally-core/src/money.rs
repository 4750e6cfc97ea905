//! # Money Module
//!
//! Provides the `Money` type used for **reported** cart totals.
//!
//! ## Where Floats Stop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AMOUNTS INSIDE A PASS vs AMOUNTS LEAVING IT                            │
//! │                                                                         │
//! │  Inside a promotion pass, line discounts are f64 so that percentages   │
//! │  and per-unit amounts compose without intermediate rounding:           │
//! │    10.00 × 3 × 33.3% = 9.99 (not 3 × round(3.33) = 9.99 by luck)       │
//! │                                                                         │
//! │  Leaving the pass (totals for the till, receipt, payment) every       │
//! │  amount is rounded ONCE into integer cents:                           │
//! │    Money::from_amount(9.990000000000002) = 999 cents                   │
//! │                                                                         │
//! │  Non-finite amounts never become Money: from_amount returns None.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//!
//! assert_eq!(Money::from_amount(20.0), Some(Money::from_cents(2000)));
//! assert_eq!(Money::from_amount(f64::NAN), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, discounts
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds a major-unit amount (e.g. `12.345` dollars) to cents.
    ///
    /// Rounds half away from zero. Returns `None` for NaN, infinities, and
    /// amounts that do not fit in `i64` cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_amount(10.005).map(|m| m.cents()), Some(1001));
    /// assert_eq!(Money::from_amount(-2.5).map(|m| m.cents()), Some(-250));
    /// assert_eq!(Money::from_amount(f64::INFINITY), None);
    /// ```
    pub fn from_amount(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }

        // Nudge by a tiny epsilon so 10.005 (stored as 10.00499999...) rounds up
        let scaled = (amount * 100.0 + amount.signum() * 1e-7).round();
        if scaled.abs() >= i64::MAX as f64 {
            return None;
        }

        Some(Money(scaled as i64))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as a major-unit float (for display and JSON only).
    #[inline]
    pub fn as_amount(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and the CLI. Presentation layers format for their locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition saturates at the `i64` cent range instead of overflowing.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

/// Subtraction saturates at the `i64` cent range instead of overflowing.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
