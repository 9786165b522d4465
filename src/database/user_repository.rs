use crate::database::error::DatabaseError;
use crate::database::repository::{Repository, TransactionalRepository};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{types::BigDecimal, FromRow, PgPool};
use uuid::Uuid;

/// User entity
///
/// The password hash column is read for completeness but never serialized;
/// credential handling lives in the external auth service.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub gold_balance: BigDecimal,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, password, role, gold_balance, \
     phone, is_active, is_email_verified, created_at, updated_at";

/// Repository for managing users
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_uuid(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Atomically credit gold grams to a user's balance.
    ///
    /// This is the only write path for `gold_balance`; there is deliberately
    /// no read-modify-write API, so concurrent credits cannot lose updates.
    pub async fn increment_gold_balance(
        &self,
        id: Uuid,
        delta_grams: &BigDecimal,
    ) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET gold_balance = gold_balance + $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(delta_grams)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Paginated admin listing with optional search and role filters
    pub async fn list_paginated(
        &self,
        page: i64,
        limit: i64,
        search: Option<&str>,
        role: Option<&str>,
    ) -> Result<(Vec<User>, i64), DatabaseError> {
        let offset = (page - 1) * limit;
        let pattern = search.map(|s| format!("%{}%", s));

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users \
             WHERE ($1::text IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1) \
               AND ($2::text IS NULL OR role = $2) \
             ORDER BY created_at DESC \
             OFFSET $3 LIMIT $4",
            USER_COLUMNS
        ))
        .bind(pattern.as_deref())
        .bind(role)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users \
             WHERE ($1::text IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1) \
               AND ($2::text IS NULL OR role = $2)",
        )
        .bind(pattern.as_deref())
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok((users, total))
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Entity = User;

    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>, DatabaseError> {
        let uuid = parse_uuid(id)?;
        self.find_by_uuid(uuid).await
    }

    async fn find_all(&self) -> Result<Vec<Self::Entity>, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let uuid = parse_uuid(id)?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

impl TransactionalRepository for UserRepository {
    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn parse_uuid(id: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(id).map_err(|e| {
        DatabaseError::new(crate::database::error::DatabaseErrorKind::Unknown {
            message: format!("Invalid UUID: {}", e),
        })
    })
}
