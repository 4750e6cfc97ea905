//! # Promotion Repository
//!
//! Database operations for the promotion catalog.
//!
//! ## Row Decoding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 promotions row  ──►  tally_core::Promotion              │
//! │                                                                         │
//! │  is_active INTEGER     ──► bool (any non-zero is active)               │
//! │  kind + rules JSON     ──► PromotionRules (kind re-attached as tag)    │
//! │  start/end_date TEXT   ──► DateTime<Utc> (RFC 3339)                    │
//! │  target_product_ids    ──► BTreeSet<String>                            │
//! │  conditions JSON       ──► PromotionConditions                         │
//! │  priority / uses       ──► range-checked i32 / u32                     │
//! │                                                                         │
//! │  Any failure ──► DbError::Decode for THAT row.                         │
//! │  list_promotions logs it and returns the rest of the catalog.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::promotions::{PromotionConditions, PromotionKind};
use tally_core::{Promotion, PromotionRules};

const SELECT_PROMOTION: &str = r#"
    SELECT
        id,
        name,
        kind,
        is_active,
        priority,
        start_date,
        end_date,
        min_purchase_amount,
        max_uses,
        uses_so_far,
        target_product_ids,
        conditions,
        rules
    FROM promotions
"#;

/// A `promotions` row as stored.
#[derive(Debug, Clone, FromRow)]
struct PromotionRow {
    id: String,
    name: String,
    kind: String,
    is_active: i64,
    priority: i64,
    start_date: Option<String>,
    end_date: Option<String>,
    min_purchase_amount: Option<f64>,
    max_uses: Option<i64>,
    uses_so_far: i64,
    target_product_ids: Option<String>,
    conditions: Option<String>,
    rules: String,
}

impl PromotionRow {
    /// Converts the row into a typed promotion.
    fn into_promotion(self) -> DbResult<Promotion> {
        let id = self.id;

        let kind: PromotionKind = self.kind.parse().map_err(|e| DbError::decode(&id, e))?;
        let rules = decode_rules(kind, &self.rules).map_err(|e| DbError::decode(&id, e))?;

        let priority = i32::try_from(self.priority)
            .map_err(|_| DbError::decode(&id, format!("priority {} out of range", self.priority)))?;
        let max_uses = self
            .max_uses
            .map(|max| {
                u32::try_from(max).map_err(|_| DbError::decode(&id, format!("max_uses {} out of range", max)))
            })
            .transpose()?;
        let uses_so_far = u32::try_from(self.uses_so_far).map_err(|_| {
            DbError::decode(&id, format!("uses_so_far {} out of range", self.uses_so_far))
        })?;

        let start_date = decode_timestamp(&id, "start_date", self.start_date.as_deref())?;
        let end_date = decode_timestamp(&id, "end_date", self.end_date.as_deref())?;

        let target_product_ids = self
            .target_product_ids
            .as_deref()
            .map(|raw| serde_json::from_str::<BTreeSet<String>>(raw))
            .transpose()
            .map_err(|e| DbError::decode(&id, format!("target_product_ids: {}", e)))?;

        let conditions = self
            .conditions
            .as_deref()
            .map(|raw| serde_json::from_str::<PromotionConditions>(raw))
            .transpose()
            .map_err(|e| DbError::decode(&id, format!("conditions: {}", e)))?;

        Ok(Promotion {
            id,
            name: self.name,
            is_active: self.is_active != 0,
            priority,
            start_date,
            end_date,
            min_purchase_amount: self.min_purchase_amount,
            max_uses,
            uses_so_far,
            target_product_ids,
            conditions,
            rules,
        })
    }
}

/// Re-attaches the `kind` column to the stored rule object and decodes it.
fn decode_rules(kind: PromotionKind, json: &str) -> Result<PromotionRules, String> {
    let mut value: Value = serde_json::from_str(json).map_err(|e| format!("rules: {}", e))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| "rules: expected a JSON object".to_string())?;
    object.insert("kind".to_string(), Value::String(kind.as_str().to_string()));

    serde_json::from_value(value).map_err(|e| format!("rules for kind '{}': {}", kind, e))
}

/// Serializes rules without the `kind` tag (stored in its own column).
fn encode_rules(rules: &PromotionRules) -> DbResult<String> {
    let mut value = serde_json::to_value(rules).map_err(|e| DbError::Internal(e.to_string()))?;
    if let Some(object) = value.as_object_mut() {
        object.remove("kind");
    }
    Ok(value.to_string())
}

fn decode_timestamp(id: &str, field: &str, raw: Option<&str>) -> DbResult<Option<DateTime<Utc>>> {
    raw.map(|text| {
        DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|e| DbError::decode(id, format!("{} '{}': {}", field, text, e)))
    })
    .transpose()
}

/// Fixed-width UTC text, so lexical order matches time order.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Repository for promotion catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = PromotionRepository::new(pool);
///
/// // Whole catalog, in catalog order
/// let catalog = repo.list_promotions(workspace_id).await?;
///
/// // Checkout recorded a use
/// repo.record_use(workspace_id, "b2g1-cola").await?;
/// ```
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Lists every promotion of a workspace, in catalog order.
    ///
    /// Catalog order is creation time, then insertion order. Rows that
    /// can't be decoded are logged and left out; one bad row never hides
    /// the rest of the catalog.
    pub async fn list_promotions(&self, workspace_id: &str) -> DbResult<Vec<Promotion>> {
        let sql = format!(
            "{} WHERE workspace_id = ?1 ORDER BY created_at, rowid",
            SELECT_PROMOTION
        );

        let rows = sqlx::query_as::<_, PromotionRow>(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;

        let total = rows.len();
        let mut promotions = Vec::with_capacity(total);
        for row in rows {
            let promotion_id = row.id.clone();
            match row.into_promotion() {
                Ok(promotion) => promotions.push(promotion),
                Err(error) => {
                    warn!(%promotion_id, %error, "Skipping undecodable promotion row");
                }
            }
        }

        debug!(
            workspace_id = %workspace_id,
            rows = total,
            promotions = promotions.len(),
            "Loaded promotion catalog"
        );
        Ok(promotions)
    }

    /// Gets a promotion by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Promotion))` - Promotion found
    /// * `Ok(None)` - Promotion not found
    /// * `Err(DbError::Decode)` - Row exists but can't be decoded
    pub async fn get_by_id(&self, workspace_id: &str, id: &str) -> DbResult<Option<Promotion>> {
        let sql = format!("{} WHERE workspace_id = ?1 AND id = ?2", SELECT_PROMOTION);

        let row = sqlx::query_as::<_, PromotionRow>(&sql)
            .bind(workspace_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PromotionRow::into_promotion).transpose()
    }

    /// Inserts a new promotion at the end of the catalog.
    ///
    /// A promotion with a blank ID is stored under a freshly generated one.
    ///
    /// ## Returns
    /// * `Ok(id)` - Inserted under `id`
    /// * `Err(DbError::UniqueViolation)` - ID already used in this workspace
    pub async fn insert(&self, workspace_id: &str, promotion: &Promotion) -> DbResult<String> {
        let id = if promotion.id.trim().is_empty() {
            generate_promotion_id()
        } else {
            promotion.id.clone()
        };
        debug!(promotion_id = %id, kind = %promotion.kind(), "Inserting promotion");

        let now = encode_timestamp(Utc::now());
        let rules = encode_rules(&promotion.rules)?;
        let targets = promotion
            .target_product_ids
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;
        let conditions = promotion
            .conditions
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO promotions (
                workspace_id, id, name, kind, is_active, priority,
                start_date, end_date, min_purchase_amount,
                max_uses, uses_so_far,
                target_product_ids, conditions, rules,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?15
            )
            "#,
        )
        .bind(workspace_id)
        .bind(&id)
        .bind(&promotion.name)
        .bind(promotion.kind().as_str())
        .bind(promotion.is_active)
        .bind(promotion.priority)
        .bind(promotion.start_date.map(encode_timestamp))
        .bind(promotion.end_date.map(encode_timestamp))
        .bind(promotion.min_purchase_amount)
        .bind(promotion.max_uses)
        .bind(promotion.uses_so_far)
        .bind(targets)
        .bind(conditions)
        .bind(rules)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Turns a promotion on or off.
    pub async fn set_active(&self, workspace_id: &str, id: &str, is_active: bool) -> DbResult<()> {
        debug!(promotion_id = %id, is_active, "Setting promotion active flag");

        let result = sqlx::query(
            r#"
            UPDATE promotions
            SET is_active = ?3, updated_at = ?4
            WHERE workspace_id = ?1 AND id = ?2
            "#,
        )
        .bind(workspace_id)
        .bind(id)
        .bind(is_active)
        .bind(encode_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    /// Records one use of a promotion at checkout.
    ///
    /// The promotion engine never calls this; a pass only reads the catalog.
    ///
    /// ## Returns
    /// * `Ok(n)` - New `uses_so_far`
    /// * `Err(DbError::UsageLimitReached)` - Already at `max_uses`
    /// * `Err(DbError::NotFound)` - No such promotion
    pub async fn record_use(&self, workspace_id: &str, id: &str) -> DbResult<u32> {
        debug!(promotion_id = %id, "Recording promotion use");

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE promotions
            SET uses_so_far = uses_so_far + 1, updated_at = ?3
            WHERE workspace_id = ?1 AND id = ?2
              AND (max_uses IS NULL OR uses_so_far < max_uses)
            RETURNING uses_so_far
            "#,
        )
        .bind(workspace_id)
        .bind(id)
        .bind(encode_timestamp(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(uses) => u32::try_from(uses)
                .map_err(|_| DbError::decode(id, format!("uses_so_far {} out of range", uses))),
            None => {
                let exists: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM promotions WHERE workspace_id = ?1 AND id = ?2",
                )
                .bind(workspace_id)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

                if exists > 0 {
                    Err(DbError::UsageLimitReached { id: id.to_string() })
                } else {
                    Err(DbError::not_found("Promotion", id))
                }
            }
        }
    }

    /// Counts the promotions stored for a workspace (decodable or not).
    pub async fn count(&self, workspace_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE workspace_id = ?1")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new promotion ID.
fn generate_promotion_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
