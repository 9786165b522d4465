use crate::database::error::DatabaseError;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// SIP plan entity. Inert configuration: rows are stored and listed but no
/// scheduler acts on `next_run_at`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub frequency: String,
    pub weekly_day: Option<i16>,
    pub monthly_day: Option<i16>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub status: String,
    pub next_run_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlanPatch {
    pub amount: Option<i32>,
    pub frequency: Option<String>,
    pub weekly_day: Option<i16>,
    pub monthly_day: Option<i16>,
    pub status: Option<String>,
    pub next_run_at: Option<chrono::DateTime<chrono::Utc>>,
}

const PLAN_COLUMNS: &str = "id, user_id, amount, frequency, weekly_day, monthly_day, start_date, \
     status, next_run_at, created_at, updated_at";

pub struct SipPlanRepository {
    pool: PgPool,
}

impl SipPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SipPlan>, DatabaseError> {
        sqlx::query_as::<_, SipPlan>(&format!(
            "SELECT {} FROM sip_plans WHERE user_id = $1 ORDER BY created_at DESC",
            PLAN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn list_all(&self) -> Result<Vec<SipPlan>, DatabaseError> {
        sqlx::query_as::<_, SipPlan>(&format!(
            "SELECT {} FROM sip_plans ORDER BY created_at DESC",
            PLAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        user_id: Uuid,
        amount: i32,
        frequency: &str,
        weekly_day: Option<i16>,
        monthly_day: Option<i16>,
        start_date: chrono::DateTime<chrono::Utc>,
        next_run_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<SipPlan, DatabaseError> {
        sqlx::query_as::<_, SipPlan>(&format!(
            "INSERT INTO sip_plans \
             (user_id, amount, frequency, weekly_day, monthly_day, start_date, status, next_run_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'active', $7) \
             RETURNING {}",
            PLAN_COLUMNS
        ))
        .bind(user_id)
        .bind(amount)
        .bind(frequency)
        .bind(weekly_day)
        .bind(monthly_day)
        .bind(start_date)
        .bind(next_run_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Patch a plan owned by the given user; returns None when no such plan.
    pub async fn patch_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &SipPlanPatch,
    ) -> Result<Option<SipPlan>, DatabaseError> {
        sqlx::query_as::<_, SipPlan>(&format!(
            "UPDATE sip_plans SET \
                 amount = COALESCE($3, amount), \
                 frequency = COALESCE($4, frequency), \
                 weekly_day = COALESCE($5, weekly_day), \
                 monthly_day = COALESCE($6, monthly_day), \
                 status = COALESCE($7, status), \
                 next_run_at = COALESCE($8, next_run_at), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            PLAN_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.amount)
        .bind(patch.frequency.as_deref())
        .bind(patch.weekly_day)
        .bind(patch.monthly_day)
        .bind(patch.status.as_deref())
        .bind(patch.next_run_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn set_status_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: &str,
    ) -> Result<Option<SipPlan>, DatabaseError> {
        sqlx::query_as::<_, SipPlan>(&format!(
            "UPDATE sip_plans SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            PLAN_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sip_plans WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
