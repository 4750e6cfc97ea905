//! # tally-core: Pure Promotion Logic for Tally POS
//!
//! This crate is the **pricing heart** of Tally POS. It decides which
//! promotional campaigns apply to a cart and rewrites every line's discount
//! and subtotal, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Cart mutation layer (add / qty / remove / restore) │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ apply_promotions(items)                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tally-engine (PromotionEngine, config, CLI)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │promotions │  │   clock   │  │ validation│  │   │
//! │  │   │ CartLine  │  │ eligible  │  │  Clock    │  │  rules    │  │   │
//! │  │   │ Promotion │  │ priority  │  │  Fixed    │  │  checks   │  │   │
//! │  │   │  Money    │  │ discount  │  │  System   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tally-db (promotion catalog, SQLite)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cart line items, product references, cart totals
//! - [`promotions`] - Promotion model and the evaluation pipeline
//! - [`money`] - Integer-cent `Money` used for reported totals
//! - [`clock`] - Injectable time source
//! - [`error`] - Domain error types
//! - [`validation`] - Cart input and promotion rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart + catalog + instant = same output, bit for bit
//! 2. **From Scratch**: every pass resets attribution; nothing is patched incrementally
//! 3. **Contained Faults**: a bad promotion or a bad number skips one thing, never the pass
//! 4. **Typed Rules**: each campaign kind carries exactly the fields its algorithm needs
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{DateTime, FixedOffset};
//! use tally_core::promotions::{run_pass, BundleRules, Promotion, PromotionRules};
//! use tally_core::types::{CartLineItem, ProductRef};
//!
//! let cola = ProductRef::new("cola", "Cola 330ml", 10.0);
//! let cart = vec![CartLineItem::new("line-1", cola, 3)];
//!
//! let promo = Promotion::new(
//!     "b2g1",
//!     "Buy 2 get 1 free",
//!     PromotionRules::Bundle(BundleRules::new(2, 1, 100.0)),
//! )
//! .with_targets(["cola"]);
//!
//! let now: DateTime<FixedOffset> = "2026-03-02T12:00:00+00:00".parse().unwrap();
//! let outcome = run_pass(&cart, &[promo], now);
//!
//! assert_eq!(outcome.items[0].discount, 10.0);
//! assert_eq!(outcome.items[0].subtotal, 20.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod money;
pub mod promotions;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use promotions::{PassOutcome, Promotion, PromotionKind, PromotionRules};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default workspace (store) ID used when no workspace is configured.
///
/// ## Why a constant?
/// Single-store deployments never configure a workspace, but the catalog
/// schema is keyed by workspace so that multi-store can be added later.
pub const DEFAULT_WORKSPACE_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum quantity of a single line in cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Minutes in a day; minute-of-day values run `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Tolerance used when comparing floating amounts in invariants.
pub const AMOUNT_EPSILON: f64 = 1e-6;
