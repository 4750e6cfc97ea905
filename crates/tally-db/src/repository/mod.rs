//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PromotionEngine (via PromotionSource)     seed / checkout             │
//! │       │                                          │                      │
//! │       │  list_promotions(workspace)              │ insert / record_use  │
//! │       ▼                                          ▼                      │
//! │  PromotionRepository                                                   │
//! │  ├── list_promotions(&self, workspace)   catalog order                 │
//! │  ├── get_by_id(&self, workspace, id)                                   │
//! │  ├── insert(&self, workspace, promotion)                               │
//! │  ├── set_active(&self, workspace, id, active)                          │
//! │  ├── record_use(&self, workspace, id)                                  │
//! │  └── count(&self, workspace)                                           │
//! │       │                                                                 │
//! │       │  SQL + row decoding (isActive → bool, kind + rules → enum)     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PromotionRepository`](promotion::PromotionRepository) - Promotion catalog

pub mod promotion;
