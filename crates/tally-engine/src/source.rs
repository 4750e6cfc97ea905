//! # Promotion Sources
//!
//! Where the engine reads the promotion catalog from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PromotionSource                                 │
//! │                list_promotions(workspace_id) → catalog order            │
//! │                                                                         │
//! │   ┌──────────────────────────┐      ┌──────────────────────────────┐   │
//! │   │  PromotionRepository     │      │  StaticCatalog               │   │
//! │   │  (tally-db, SQLite)      │      │  (JSON file / in memory)     │   │
//! │   │  production tills        │      │  CLI --catalog, tests        │   │
//! │   └──────────────────────────┘      └──────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both sources hand the engine strictly typed promotions: a loosely typed
//! `isActive` is normalised here, never inside the pass.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tally_core::Promotion;
use tally_db::PromotionRepository;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Read-only access to a workspace's promotion catalog.
pub trait PromotionSource: Send + Sync {
    /// Every promotion of the workspace, active or not, in catalog order.
    fn list_promotions(
        &self,
        workspace_id: &str,
    ) -> impl Future<Output = EngineResult<Vec<Promotion>>> + Send;
}

impl PromotionSource for PromotionRepository {
    async fn list_promotions(&self, workspace_id: &str) -> EngineResult<Vec<Promotion>> {
        Ok(PromotionRepository::list_promotions(self, workspace_id).await?)
    }
}

impl<S: PromotionSource> PromotionSource for Arc<S> {
    fn list_promotions(
        &self,
        workspace_id: &str,
    ) -> impl Future<Output = EngineResult<Vec<Promotion>>> + Send {
        (**self).list_promotions(workspace_id)
    }
}

// =============================================================================
// Static Catalog
// =============================================================================

/// An in-memory catalog, the same for every workspace.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    promotions: Vec<Promotion>,
}

impl StaticCatalog {
    pub fn new(promotions: Vec<Promotion>) -> Self {
        StaticCatalog { promotions }
    }

    /// Parses a JSON array of promotions.
    ///
    /// ## Boundary Normalisation
    /// - `isActive`: `true`/`false`, `1`/`0` (any non-zero number is true),
    ///   `"true"`/`"false"`/`"1"`/`"0"`; missing or anything else is inactive
    /// - `kind` may sit next to `rules` (storage layout) or inside it
    ///
    /// Entries that still fail to decode are logged and skipped.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(entries) = value else {
            return Err(EngineError::Catalog(
                "expected a JSON array of promotions".to_string(),
            ));
        };

        let mut promotions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match decode_entry(entry) {
                Ok(promotion) => promotions.push(promotion),
                Err((id, reason)) => warn!(
                    index,
                    promotion_id = %id,
                    %reason,
                    "Skipping undecodable catalog entry"
                ),
            }
        }

        debug!(count = promotions.len(), "Loaded static catalog");
        Ok(StaticCatalog { promotions })
    }

    /// Reads and parses a JSON catalog file.
    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Self::from_json_str(&json)
    }

    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

impl PromotionSource for StaticCatalog {
    async fn list_promotions(&self, _workspace_id: &str) -> EngineResult<Vec<Promotion>> {
        Ok(self.promotions.clone())
    }
}

/// Normalises one catalog entry and decodes it. Errors carry `(id, reason)`.
fn decode_entry(entry: Value) -> Result<Promotion, (String, String)> {
    let Value::Object(mut object) = entry else {
        return Err(("?".to_string(), "entry is not an object".to_string()));
    };

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();

    let is_active = normalize_active(object.get("isActive"));
    object.insert("isActive".to_string(), Value::Bool(is_active));
    hoist_kind(&mut object);

    serde_json::from_value(Value::Object(object)).map_err(|e| (id, e.to_string()))
}

/// Strict boolean from a loosely typed `isActive`.
fn normalize_active(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    }
}

/// Moves a top-level `kind` into `rules` when the rules object lacks one.
fn hoist_kind(object: &mut Map<String, Value>) {
    let Some(kind) = object.remove("kind") else {
        return;
    };
    if let Some(Value::Object(rules)) = object.get_mut("rules") {
        rules.entry("kind").or_insert(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tally_core::{PromotionKind, PromotionRules};

    fn entry(is_active: Value) -> Value {
        json!({
            "id": "p",
            "name": "Ten off",
            "isActive": is_active,
            "rules": { "kind": "percent", "discountPercent": 10.0 }
        })
    }

    #[test]
    fn test_is_active_normalisation() {
        assert!(normalize_active(Some(&json!(true))));
        assert!(normalize_active(Some(&json!(1))));
        assert!(normalize_active(Some(&json!("1"))));
        assert!(!normalize_active(Some(&json!(0))));
        assert!(!normalize_active(Some(&json!(false))));
        assert!(!normalize_active(Some(&json!("yes"))));
        assert!(!normalize_active(Some(&Value::Null)));
        assert!(!normalize_active(None));
    }

    #[test]
    fn test_numeric_is_active_decodes() {
        let catalog = StaticCatalog::from_json_str(&json!([entry(json!(1))]).to_string()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.promotions()[0].is_active);

        let catalog = StaticCatalog::from_json_str(&json!([entry(json!(0))]).to_string()).unwrap();
        assert!(!catalog.promotions()[0].is_active);
    }

    #[test]
    fn test_storage_layout_kind_is_hoisted() {
        let json = json!([{
            "id": "b2g1",
            "name": "Cola deal",
            "kind": "bundle",
            "isActive": true,
            "priority": 3,
            "targetProductIds": ["cola"],
            "rules": { "buyQty": 2, "getQty": 1, "discountPercent": 100.0 }
        }]);

        let catalog = StaticCatalog::from_json_str(&json.to_string()).unwrap();
        let promo = &catalog.promotions()[0];
        assert_eq!(promo.kind(), PromotionKind::Bundle);
        assert_eq!(promo.priority, 3);
        assert!(matches!(&promo.rules, PromotionRules::Bundle(r) if r.buy_qty == 2));
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let json = json!([
            entry(json!(true)),
            { "id": "no-rules", "name": "Broken", "isActive": true },
            { "id": "weird", "name": "Weird", "isActive": true, "rules": { "kind": "lottery" } },
            42
        ]);

        let catalog = StaticCatalog::from_json_str(&json.to_string()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.promotions()[0].id, "p");
    }

    #[test]
    fn test_non_array_is_error() {
        assert!(matches!(
            StaticCatalog::from_json_str("{\"id\": \"p\"}"),
            Err(EngineError::Catalog(_))
        ));
        assert!(matches!(
            StaticCatalog::from_json_str("not json"),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!([entry(json!(true))])).unwrap();

        let catalog = StaticCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StaticCatalog::from_json_file(&dir.path().join("missing.json")),
            Err(EngineError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_static_catalog_keeps_order() {
        let json = json!([
            { "id": "a", "name": "A", "isActive": true, "rules": { "kind": "percent", "discountPercent": 5.0 } },
            { "id": "b", "name": "B", "isActive": false, "rules": { "kind": "fixedAmount", "amountPerUnit": 1.0 } },
        ]);
        let catalog = StaticCatalog::from_json_str(&json.to_string()).unwrap();

        let listed = catalog.list_promotions("any").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}
