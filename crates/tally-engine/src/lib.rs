//! # tally-engine: Promotion Engine Service for Tally POS
//!
//! The layer the cart talks to. Every cart mutation (add, quantity change,
//! remove, restore) calls [`PromotionEngine::apply_promotions`] with the whole
//! cart and replaces its lines with the result.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart mutation ──► PromotionEngine::apply_promotions(items)            │
//! │                        │                 │                              │
//! │                        ▼                 ▼                              │
//! │              PromotionSource           Clock                            │
//! │              ├─ PromotionRepository    ├─ SystemClock (config offset)   │
//! │              │  (tally-db)             └─ FixedClock (tests, --at)      │
//! │              └─ StaticCatalog (JSON)                                    │
//! │                        │                                                │
//! │                        ▼                                                │
//! │              tally_core::promotions::run_pass (pure)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - `PromotionEngine`, the orchestrator
//! - [`source`] - `PromotionSource` trait, SQLite and JSON catalogs
//! - [`cart`] - Cart file/JSON input with validation
//! - [`config`] - `EngineConfig` (TOML file + `TALLY_*` env)
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - `EngineError`

pub mod cart;
pub mod config;
pub mod engine;
pub mod error;
pub mod source;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::PromotionEngine;
pub use error::{EngineError, EngineResult};
pub use source::{PromotionSource, StaticCatalog};
