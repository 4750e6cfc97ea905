//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Promotion / cart domain errors                 │
//! │  ├── ValidationError  - Input and rule validation failures             │
//! │  └── NumericFault     - Discount math produced an unusable number      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Catalog storage failures                       │
//! │                                                                         │
//! │  tally-engine errors                                                   │
//! │  └── EngineError      - Source/config failures (pass fails closed)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → (logged, promotion skipped)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (promotion ID, field, value)
//! 3. Errors are enum variants, never String
//! 4. Inside a pass, errors are contained: they are reported, not propagated

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core promotion logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A promotion's rule payload cannot be evaluated.
    ///
    /// ## When This Occurs
    /// - Bundle with `buyQty` or `getQty` of zero (no deal size)
    /// - Percent outside 0..=100 or not a finite number
    /// - Weekday index outside 0..=6, minute-of-day outside the day
    ///
    /// ## Handling
    /// ```text
    /// EligibilityFilter
    ///      │
    ///      ▼
    /// validate_promotion(promo) ──► Err(MalformedPromotion)
    ///      │
    ///      ▼
    /// warn!(...) and exclude THIS promotion, keep evaluating the rest
    /// ```
    #[error("Promotion {promotion_id} is malformed: {source}")]
    MalformedPromotion {
        promotion_id: String,
        #[source]
        source: ValidationError,
    },

    /// Unknown promotion kind tag (e.g. from storage).
    #[error("Unknown promotion kind: '{0}'")]
    UnknownPromotionKind(String),

    /// Discount math failed for a line; the line was rolled back.
    #[error("Discount for line {line_id} under promotion {promotion_id} rolled back: {fault}")]
    Numeric {
        promotion_id: String,
        line_id: String,
        fault: NumericFault,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MalformedPromotion error for a promotion ID.
    pub fn malformed(promotion_id: impl Into<String>, source: ValidationError) -> Self {
        CoreError::MalformedPromotion {
            promotion_id: promotion_id.into(),
            source,
        }
    }
}

// =============================================================================
// Numeric Fault
// =============================================================================

/// Why a computed amount was rejected.
///
/// Every variant carries the offending value for the log line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Error)]
#[serde(tag = "reason", content = "value", rename_all = "camelCase")]
pub enum NumericFault {
    /// Effective unit price is NaN, infinite or negative.
    #[error("unit price {0} is not a finite non-negative amount")]
    InvalidUnitPrice(f64),

    /// Computed discount is NaN, infinite or negative.
    #[error("discount {0} is not a finite non-negative amount")]
    InvalidDiscount(f64),

    /// Resulting subtotal is NaN, infinite or negative.
    #[error("subtotal {0} is not a finite non-negative amount")]
    InvalidSubtotal(f64),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for cart input and for promotion rule payloads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Floating value is NaN, infinite or negative.
    #[error("{field} must be a finite non-negative number, got {value}")]
    NotFiniteAmount { field: String, value: f64 },

    /// Percent is not within 0..=100.
    #[error("{field} must be a percentage between 0 and 100, got {value}")]
    InvalidPercent { field: String, value: f64 },

    /// Two fields contradict each other (e.g. start after end).
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
