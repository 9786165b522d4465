use crate::database::error::DatabaseError;
use serde::Serialize;
use sqlx::{types::BigDecimal, FromRow, PgPool};
use uuid::Uuid;

/// Gold price entity; one row is active at a time and supplies the rate used
/// for gram conversion.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldPrice {
    pub id: Uuid,
    pub price_per_gram: BigDecimal,
    pub price_per_ounce: BigDecimal,
    pub currency: String,
    pub source: String,
    pub is_active: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

const PRICE_COLUMNS: &str = "id, price_per_gram, price_per_ounce, currency, source, is_active, \
     metadata, created_at, updated_at";

pub struct GoldPriceRepository {
    pool: PgPool,
}

impl GoldPriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active(&self) -> Result<Option<GoldPrice>, DatabaseError> {
        sqlx::query_as::<_, GoldPrice>(&format!(
            "SELECT {} FROM gold_prices WHERE is_active ORDER BY created_at DESC LIMIT 1",
            PRICE_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Get the active price, seeding a default row when none exists.
    ///
    /// The insert races harmlessly: the partial unique index on `is_active`
    /// rejects a concurrent duplicate and `ON CONFLICT DO NOTHING` swallows
    /// it, after which the re-select observes the winner's row.
    pub async fn find_active_or_seed(&self) -> Result<GoldPrice, DatabaseError> {
        if let Some(price) = self.find_active().await? {
            return Ok(price);
        }

        sqlx::query(
            "INSERT INTO gold_prices (price_per_gram, price_per_ounce, currency, source, is_active) \
             VALUES ($1, $2, 'INR', 'mock', TRUE) \
             ON CONFLICT DO NOTHING",
        )
        .bind(default_price_per_gram())
        .bind(default_price_per_ounce())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        self.find_active().await?.ok_or_else(|| {
            DatabaseError::new(crate::database::error::DatabaseErrorKind::NotFound)
        })
    }

    /// Deactivate the current price and install a new active one. Used by
    /// admin price management (manual/seed sources).
    pub async fn set_active_price(
        &self,
        price_per_gram: BigDecimal,
        price_per_ounce: BigDecimal,
        source: &str,
    ) -> Result<GoldPrice, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DatabaseError::from_sqlx)?;

        sqlx::query("UPDATE gold_prices SET is_active = FALSE, updated_at = NOW() WHERE is_active")
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let price = sqlx::query_as::<_, GoldPrice>(&format!(
            "INSERT INTO gold_prices (price_per_gram, price_per_ounce, currency, source, is_active) \
             VALUES ($1, $2, 'INR', $3, TRUE) \
             RETURNING {}",
            PRICE_COLUMNS
        ))
        .bind(price_per_gram)
        .bind(price_per_ounce)
        .bind(source)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(price)
    }
}

pub fn default_price_per_gram() -> BigDecimal {
    BigDecimal::from(6000)
}

pub fn default_price_per_ounce() -> BigDecimal {
    BigDecimal::from(2200)
}
