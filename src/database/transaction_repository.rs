use crate::database::error::DatabaseError;
use crate::database::repository::{Repository, TransactionalRepository};
use crate::database::user_repository::parse_uuid;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{types::BigDecimal, FromRow, PgPool};
use uuid::Uuid;

/// Transaction entity
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub r#type: String,
    pub status: String,
    pub amount: BigDecimal,
    pub gold_quantity: BigDecimal,
    pub gold_price_per_gram: BigDecimal,
    pub payment_id: Option<String>,
    pub payment_order_id: Option<String>,
    pub payment_provider: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

const TX_COLUMNS: &str = "id, user_id, type, status, amount, gold_quantity, gold_price_per_gram, \
     payment_id, payment_order_id, payment_provider, notes, metadata, \
     created_at, updated_at, completed_at";

/// Repository for managing buy/sell transactions
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new pending transaction
    #[allow(clippy::too_many_arguments)]
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        transaction_type: &str,
        status: &str,
        amount: BigDecimal,
        gold_quantity: BigDecimal,
        gold_price_per_gram: BigDecimal,
        metadata: serde_json::Value,
    ) -> Result<Transaction, DatabaseError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "INSERT INTO transactions \
             (user_id, type, status, amount, gold_quantity, gold_price_per_gram, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            TX_COLUMNS
        ))
        .bind(user_id)
        .bind(transaction_type)
        .bind(status)
        .bind(amount)
        .bind(gold_quantity)
        .bind(gold_price_per_gram)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Finalize a pending transaction as completed.
    ///
    /// The status guard makes finalization a compare-and-swap: only a row
    /// still in 'pending' is updated, so a second success webhook for the
    /// same transaction matches nothing and returns None. Callers must credit
    /// the balance only when this returns Some.
    pub async fn complete_pending(
        &self,
        id: Uuid,
        payment_id: Option<&str>,
        payment_order_id: Option<&str>,
        payment_provider: Option<&str>,
    ) -> Result<Option<Transaction>, DatabaseError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "UPDATE transactions \
             SET status = 'completed', payment_id = $2, payment_order_id = $3, \
                 payment_provider = $4, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {}",
            TX_COLUMNS
        ))
        .bind(id)
        .bind(payment_id)
        .bind(payment_order_id)
        .bind(payment_provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Finalize a pending transaction as failed. Same status guard as
    /// `complete_pending`; repeated failure webhooks are no-ops.
    pub async fn fail_pending(
        &self,
        id: Uuid,
        payment_id: Option<&str>,
        payment_order_id: Option<&str>,
        payment_provider: Option<&str>,
    ) -> Result<Option<Transaction>, DatabaseError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "UPDATE transactions \
             SET status = 'failed', payment_id = $2, payment_order_id = $3, \
                 payment_provider = $4, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {}",
            TX_COLUMNS
        ))
        .bind(id)
        .bind(payment_id)
        .bind(payment_order_id)
        .bind(payment_provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn find_by_uuid(&self, id: Uuid) -> Result<Option<Transaction>, DatabaseError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TX_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Transactions for one user, newest first
    pub async fn find_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, DatabaseError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
            TX_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Paginated admin listing with optional status/type filters
    pub async fn list_paginated(
        &self,
        page: i64,
        limit: i64,
        status: Option<&str>,
        transaction_type: Option<&str>,
    ) -> Result<(Vec<Transaction>, i64), DatabaseError> {
        let offset = (page - 1) * limit;

        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::text IS NULL OR type = $2) \
             ORDER BY created_at DESC \
             OFFSET $3 LIMIT $4",
            TX_COLUMNS
        ))
        .bind(status)
        .bind(transaction_type)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::text IS NULL OR type = $2)",
        )
        .bind(status)
        .bind(transaction_type)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok((transactions, total))
    }
}

#[async_trait]
impl Repository for TransactionRepository {
    type Entity = Transaction;

    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>, DatabaseError> {
        let uuid = parse_uuid(id)?;
        self.find_by_uuid(uuid).await
    }

    async fn find_all(&self) -> Result<Vec<Self::Entity>, DatabaseError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions ORDER BY created_at DESC",
            TX_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let uuid = parse_uuid(id)?;
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

impl TransactionalRepository for TransactionRepository {
    fn pool(&self) -> &PgPool {
        &self.pool
    }
}
