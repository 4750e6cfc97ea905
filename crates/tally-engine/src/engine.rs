//! # Promotion Engine
//!
//! Ties a catalog source and a clock to the pure pass in tally-core.
//!
//! ## One Invocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_promotions(items)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  source.list_promotions(workspace) ──Err──► error!(...) ──► items as-is │
//! │       │ Ok(catalog)                                                     │
//! │       ▼                                                                 │
//! │  clock.now() (read once)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  run_pass(items, catalog, now) ──► PassOutcome.items                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine holds no per-cart state: one engine serves every till of a
//! store, and concurrent invocations for different carts never interact.

use chrono::{DateTime, FixedOffset};
use tally_core::promotions::{filter_eligible, pre_discount_subtotal, run_pass, EligibilityContext};
use tally_core::{CartLineItem, Clock, PassOutcome, Promotion};
use tracing::{debug, error};

use crate::error::EngineResult;
use crate::source::PromotionSource;

/// Promotion engine for one workspace.
///
/// ## Example
/// ```rust,ignore
/// let engine = PromotionEngine::new(db.promotions(), SystemClock::new(), workspace_id);
/// let priced = engine.apply_promotions(&cart).await;
/// ```
#[derive(Debug, Clone)]
pub struct PromotionEngine<S, C> {
    source: S,
    clock: C,
    workspace_id: String,
}

impl<S, C> PromotionEngine<S, C>
where
    S: PromotionSource,
    C: Clock,
{
    pub fn new(source: S, clock: C, workspace_id: impl Into<String>) -> Self {
        PromotionEngine {
            source,
            clock,
            workspace_id: workspace_id.into(),
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// Recomputes every line's discount and attribution from scratch.
    ///
    /// Fails closed: if the catalog can't be read the input comes back
    /// unchanged, so a broken source never blocks a sale.
    pub async fn apply_promotions(&self, items: &[CartLineItem]) -> Vec<CartLineItem> {
        match self.try_apply_promotions(items).await {
            Ok(outcome) => outcome.items,
            Err(e) => {
                error!(
                    workspace_id = %self.workspace_id,
                    items = items.len(),
                    error = %e,
                    "Promotion catalog unavailable, cart left unchanged"
                );
                items.to_vec()
            }
        }
    }

    /// Like [`apply_promotions`](Self::apply_promotions) but reports source
    /// failures and returns the full pass outcome.
    pub async fn try_apply_promotions(&self, items: &[CartLineItem]) -> EngineResult<PassOutcome> {
        let catalog = self.source.list_promotions(&self.workspace_id).await?;
        let now = self.clock.now();

        debug!(
            workspace_id = %self.workspace_id,
            catalog = catalog.len(),
            %now,
            "Running promotion pass"
        );

        Ok(run_pass(items, &catalog, now))
    }

    /// Promotions eligible right now, ignoring minimum purchase.
    ///
    /// There is no cart, so `minPurchaseAmount` can't be evaluated; every
    /// other gate (active flag, dates, usage, weekday, time of day) applies.
    pub async fn get_active_promotions(&self) -> EngineResult<Vec<Promotion>> {
        let catalog = self.source.list_promotions(&self.workspace_id).await?;
        Ok(eligible(&catalog, EligibilityContext::without_cart(self.clock.now())))
    }

    /// Promotions eligible right now for a specific cart, minimum purchase included.
    pub async fn get_active_promotions_for(&self, items: &[CartLineItem]) -> EngineResult<Vec<Promotion>> {
        let catalog = self.source.list_promotions(&self.workspace_id).await?;
        let ctx = EligibilityContext::for_cart(self.clock.now(), pre_discount_subtotal(items));
        Ok(eligible(&catalog, ctx))
    }

    /// The instant the next pass would evaluate at.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }
}

fn eligible(catalog: &[Promotion], ctx: EligibilityContext) -> Vec<Promotion> {
    filter_eligible(catalog, &ctx).into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tally_core::promotions::{
        BundleRules, FixedAmountRules, PercentRules, PromotionConditions, TimeOfDayRange,
    };
    use tally_core::{FixedClock, ProductRef, PromotionRules};
    use tally_db::{Database, DbConfig, DbError};

    use crate::error::EngineError;
    use crate::source::StaticCatalog;

    const WS: &str = "store-1";

    /// Monday 2026-03-02 12:00 UTC.
    fn monday_noon() -> FixedClock {
        FixedClock::new("2026-03-02T12:00:00+00:00".parse().unwrap())
    }

    fn line(id: &str, product_id: &str, price: f64, quantity: u32) -> CartLineItem {
        CartLineItem::new(id, ProductRef::new(product_id, product_id, price), quantity)
    }

    fn cola_bundle() -> Promotion {
        Promotion::new(
            "b2g1",
            "Buy 2 get 1",
            PromotionRules::Bundle(BundleRules::new(2, 1, 100.0)),
        )
        .with_targets(["cola"])
        .with_priority(10)
    }

    fn ten_percent() -> Promotion {
        Promotion::new(
            "ten",
            "10% off",
            PromotionRules::Percent(PercentRules {
                discount_percent: 10.0,
            }),
        )
    }

    /// Bundle, fixed, timed and store-wide percent campaigns together.
    fn mixed_catalog() -> Vec<Promotion> {
        let chips_off = Promotion::new(
            "chips-50c",
            "50c off chips",
            PromotionRules::FixedAmount(FixedAmountRules { amount_per_unit: 0.5 }),
        )
        .with_targets(["chips"])
        .with_priority(5);
        let lunch = Promotion::new(
            "lunch",
            "Lunch 15%",
            PromotionRules::TimedPercent(PercentRules {
                discount_percent: 15.0,
            }),
        )
        .with_targets(["sandwich"])
        .with_priority(3)
        .with_conditions(PromotionConditions {
            days_of_week: Some([1].into_iter().collect()),
            time_of_day_range: Some(TimeOfDayRange::new(11 * 60, 14 * 60)),
        });

        vec![ten_percent(), chips_off, cola_bundle(), lunch]
    }

    fn mixed_cart() -> Vec<CartLineItem> {
        vec![
            line("l1", "cola", 10.0, 4),
            line("l2", "chips", 5.0, 2),
            line("l3", "sandwich", 8.0, 1),
            line("l4", "water", 1.25, 2).with_unit_price_override(0.99),
        ]
    }

    /// Discount within `0..=gross` and `subtotal = gross - discount` on every
    /// line; a line with an unusable price must come back undiscounted.
    fn assert_line_invariants(items: &[CartLineItem]) {
        for item in items {
            let gross = item.gross_amount();
            if !(gross.is_finite() && gross >= 0.0) {
                assert_eq!(item.discount, 0.0, "faulted line {} carries a discount", item.id);
                assert!(!item.is_attributed(), "faulted line {} is attributed", item.id);
                continue;
            }
            assert!(
                item.discount >= 0.0 && item.discount <= gross + 1e-9,
                "line {} discount {} outside 0..={}",
                item.id,
                item.discount,
                gross
            );
            assert!(
                (item.subtotal - (gross - item.discount)).abs() < 1e-9,
                "line {} subtotal {} != {} - {}",
                item.id,
                item.subtotal,
                gross,
                item.discount
            );
        }
    }

    struct FailingSource {
        calls: AtomicUsize,
    }

    impl PromotionSource for FailingSource {
        fn list_promotions(
            &self,
            _workspace_id: &str,
        ) -> impl Future<Output = EngineResult<Vec<Promotion>>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::Source(DbError::ConnectionFailed("down".to_string()))) }
        }
    }

    #[tokio::test]
    async fn test_apply_promotions_bundle() {
        let engine = PromotionEngine::new(StaticCatalog::new(vec![cola_bundle()]), monday_noon(), WS);

        let items = engine.apply_promotions(&[line("l1", "cola", 10.0, 3)]).await;

        assert_eq!(items[0].discount, 10.0);
        assert_eq!(items[0].subtotal, 20.0);
        assert_eq!(items[0].applied_promotion_id.as_deref(), Some("b2g1"));
    }

    #[tokio::test]
    async fn test_source_failure_returns_cart_unchanged() {
        let source = FailingSource {
            calls: AtomicUsize::new(0),
        };
        let engine = PromotionEngine::new(source, monday_noon(), WS);

        let mut stale = line("l1", "cola", 10.0, 3);
        stale.discount = 4.0;
        stale.subtotal = 26.0;
        stale.applied_promotion_id = Some("old".to_string());
        let cart = vec![stale];

        let items = engine.apply_promotions(&cart).await;
        assert_eq!(items, cart);

        assert!(matches!(
            engine.try_apply_promotions(&cart).await,
            Err(EngineError::Source(_))
        ));
        assert!(engine.get_active_promotions().await.is_err());
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_try_apply_reports_applied_ids_and_totals() {
        let catalog = StaticCatalog::new(vec![ten_percent(), cola_bundle()]);
        let engine = PromotionEngine::new(catalog, monday_noon(), WS);

        let outcome = engine
            .try_apply_promotions(&[line("l1", "cola", 10.0, 3), line("l2", "chips", 5.0, 2)])
            .await
            .unwrap();

        assert_eq!(outcome.applied_promotion_ids, ["b2g1", "ten"]);
        assert!(outcome.faults.is_empty());
        assert_eq!(outcome.items[1].discount, 1.0);
        assert_eq!(outcome.totals.discount.as_amount(), 11.0);
        assert_eq!(outcome.totals.net.as_amount(), 29.0);
    }

    #[tokio::test]
    async fn test_active_promotions_ignore_min_purchase() {
        let lunch = Promotion::new(
            "lunch",
            "Lunch",
            PromotionRules::TimedPercent(PercentRules {
                discount_percent: 15.0,
            }),
        )
        .with_conditions(PromotionConditions {
            days_of_week: Some([1].into_iter().collect()),
            time_of_day_range: Some(TimeOfDayRange::new(11 * 60, 14 * 60)),
        });
        let big_spender = ten_percent().with_min_purchase(100.0);
        let off = cola_bundle().with_active(false);

        let catalog = StaticCatalog::new(vec![lunch, big_spender, off]);
        let engine = PromotionEngine::new(catalog, monday_noon(), WS);

        let active = engine.get_active_promotions().await.unwrap();
        let ids: Vec<_> = active.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["lunch", "ten"]);

        let for_cart = engine
            .get_active_promotions_for(&[line("l1", "cola", 10.0, 1)])
            .await
            .unwrap();
        let ids: Vec<_> = for_cart.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["lunch"]);
    }

    #[tokio::test]
    async fn test_clock_is_injected() {
        let lunch_only = ten_percent().with_conditions(PromotionConditions {
            days_of_week: None,
            time_of_day_range: Some(TimeOfDayRange::new(11 * 60, 14 * 60)),
        });
        let catalog = Arc::new(StaticCatalog::new(vec![lunch_only]));
        let cart = [line("l1", "cola", 10.0, 1)];

        let noon = PromotionEngine::new(catalog.clone(), monday_noon(), WS);
        let evening = PromotionEngine::new(
            catalog,
            FixedClock::new("2026-03-02T19:00:00+00:00".parse().unwrap()),
            WS,
        );

        assert_eq!(noon.apply_promotions(&cart).await[0].discount, 1.0);
        assert_eq!(evening.apply_promotions(&cart).await[0].discount, 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_carts_are_isolated() {
        let catalog = StaticCatalog::new(vec![cola_bundle(), ten_percent()]);
        let engine = Arc::new(PromotionEngine::new(catalog, monday_noon(), WS));

        let handles: Vec<_> = (1..=8u32)
            .map(|qty| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    let cart = vec![line("l1", "cola", 10.0, qty)];
                    (qty, engine.apply_promotions(&cart).await)
                })
            })
            .collect();

        for handle in handles {
            let (qty, items) = handle.await.unwrap();
            let free_units = f64::from(qty / 3);
            let expected = if free_units > 0.0 {
                free_units * 10.0
            } else {
                f64::from(qty) * 1.0
            };
            assert_eq!(items.len(), 1);
            assert!((items[0].discount - expected).abs() < 1e-9, "qty {}", qty);
        }
    }

    #[tokio::test]
    async fn test_database_backed_engine() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promotions();
        repo.insert(WS, &cola_bundle()).await.unwrap();
        repo.insert(WS, &ten_percent()).await.unwrap();
        repo.insert("other-store", &ten_percent().with_priority(99)).await.unwrap();

        let engine = PromotionEngine::new(repo.clone(), monday_noon(), WS);
        let outcome = engine
            .try_apply_promotions(&[line("l1", "cola", 10.0, 3), line("l2", "chips", 5.0, 2)])
            .await
            .unwrap();

        assert_eq!(outcome.applied_promotion_ids, ["b2g1", "ten"]);

        // The pass never consumes a use; checkout does.
        assert_eq!(repo.get_by_id(WS, "b2g1").await.unwrap().unwrap().uses_so_far, 0);
    }

    #[tokio::test]
    async fn test_closed_database_fails_closed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promotions();
        repo.insert(WS, &ten_percent()).await.unwrap();
        db.close().await;

        let engine = PromotionEngine::new(repo, monday_noon(), WS);
        let cart = vec![line("l1", "cola", 10.0, 1)];

        assert_eq!(engine.apply_promotions(&cart).await, cart);
    }

    #[tokio::test]
    async fn test_reapplying_own_output_is_stable_with_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promotions();
        for promotion in mixed_catalog() {
            repo.insert(WS, &promotion).await.unwrap();
        }

        let engine = PromotionEngine::new(repo, monday_noon(), WS);
        let first = engine.try_apply_promotions(&mixed_cart()).await.unwrap();
        assert_eq!(first.applied_promotion_ids, ["b2g1", "chips-50c", "lunch", "ten"]);
        assert_line_invariants(&first.items);

        let second = engine.try_apply_promotions(&first.items).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(engine.apply_promotions(&second.items).await, first.items);
    }

    #[tokio::test]
    async fn test_faulted_line_is_rolled_back_and_others_hold_invariants() {
        let engine = PromotionEngine::new(StaticCatalog::new(mixed_catalog()), monday_noon(), WS);

        let mut cart = mixed_cart();
        cart.insert(1, line("bad", "gum", f64::NAN, 1));

        let outcome = engine.try_apply_promotions(&cart).await.unwrap();
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.items.len(), cart.len());
        assert_eq!(outcome.items[1].discount, 0.0);
        assert!(!outcome.items[1].is_attributed());
        assert_eq!(outcome.items[0].applied_promotion_id.as_deref(), Some("b2g1"));
        assert_line_invariants(&outcome.items);

        assert_eq!(engine.apply_promotions(&cart).await, outcome.items);
    }
}
