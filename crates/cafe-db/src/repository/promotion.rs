//! # Promotion Repository
//!
//! Stores promotion rules. Whether a promotion applies to an order is decided
//! by cafe-core at pricing time; this layer only persists and loads them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cafe_core::{DiscountKind, Promotion};

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Inserts a promotion.
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, name = %promotion.name, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, name, kind, value, starts_at, ends_at, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.kind)
        .bind(promotion.value)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a promotion by ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promotion>> {
        let record = sqlx::query_as::<_, PromotionRecord>(
            r#"
            SELECT id, name, kind, value, starts_at, ends_at, is_active
            FROM promotions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Promotion::from))
    }

    /// Lists all promotions, most recent window first.
    pub async fn list(&self) -> DbResult<Vec<Promotion>> {
        let records = sqlx::query_as::<_, PromotionRecord>(
            r#"
            SELECT id, name, kind, value, starts_at, ends_at, is_active
            FROM promotions
            ORDER BY starts_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Promotion::from).collect())
    }

    /// Turns a promotion on or off without touching its window.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<bool> {
        let result = sqlx::query("UPDATE promotions SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PromotionRecord {
    id: String,
    name: String,
    kind: DiscountKind,
    value: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
}

impl From<PromotionRecord> for Promotion {
    fn from(r: PromotionRecord) -> Self {
        Promotion {
            id: r.id,
            name: r.name,
            kind: r.kind,
            value: r.value,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            is_active: r.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;

    fn promo(id: &str, start_day: u32) -> Promotion {
        Promotion {
            id: id.to_string(),
            name: format!("Promo {}", id),
            kind: DiscountKind::Percentage,
            value: 1000,
            starts_at: Utc.with_ymd_and_hms(2026, 3, start_day, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_get_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promotions();

        repo.insert(&promo("a", 1)).await.unwrap();
        repo.insert(&promo("b", 5)).await.unwrap();

        assert_eq!(repo.get_by_id("a").await.unwrap(), Some(promo("a", 1)));
        assert!(repo.get_by_id("zzz").await.unwrap().is_none());

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promotions();
        repo.insert(&promo("a", 1)).await.unwrap();

        assert!(repo.set_active("a", false).await.unwrap());
        assert!(!repo.get_by_id("a").await.unwrap().unwrap().is_active);
        assert!(!repo.set_active("missing", false).await.unwrap());
    }
}
