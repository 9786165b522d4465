use crate::database::error::DatabaseError;
use serde::{Deserialize, Serialize};
use sqlx::{types::BigDecimal, FromRow, PgPool};
use uuid::Uuid;

/// Auto-dip rule entity. Like SIP plans these are inert configuration rows;
/// `last_triggered_at` is stored but never advanced by this service.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDipRule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trigger_type: String,
    pub threshold_value: BigDecimal,
    pub buy_amount_inr: i32,
    pub cooldown_hours: i32,
    pub last_triggered_at: Option<chrono::DateTime<chrono::Utc>>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDipRulePatch {
    pub trigger_type: Option<String>,
    pub threshold_value: Option<BigDecimal>,
    pub buy_amount_inr: Option<i32>,
    pub cooldown_hours: Option<i32>,
    pub status: Option<String>,
}

const RULE_COLUMNS: &str = "id, user_id, trigger_type, threshold_value, buy_amount_inr, \
     cooldown_hours, last_triggered_at, status, created_at, updated_at";

pub struct AutoDipRuleRepository {
    pool: PgPool,
}

impl AutoDipRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AutoDipRule>, DatabaseError> {
        sqlx::query_as::<_, AutoDipRule>(&format!(
            "SELECT {} FROM auto_dip_rules WHERE user_id = $1 ORDER BY created_at DESC",
            RULE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        trigger_type: &str,
        threshold_value: BigDecimal,
        buy_amount_inr: i32,
        cooldown_hours: i32,
    ) -> Result<AutoDipRule, DatabaseError> {
        sqlx::query_as::<_, AutoDipRule>(&format!(
            "INSERT INTO auto_dip_rules \
             (user_id, trigger_type, threshold_value, buy_amount_inr, cooldown_hours, status) \
             VALUES ($1, $2, $3, $4, $5, 'active') \
             RETURNING {}",
            RULE_COLUMNS
        ))
        .bind(user_id)
        .bind(trigger_type)
        .bind(threshold_value)
        .bind(buy_amount_inr)
        .bind(cooldown_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn patch_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &AutoDipRulePatch,
    ) -> Result<Option<AutoDipRule>, DatabaseError> {
        sqlx::query_as::<_, AutoDipRule>(&format!(
            "UPDATE auto_dip_rules SET \
                 trigger_type = COALESCE($3, trigger_type), \
                 threshold_value = COALESCE($4, threshold_value), \
                 buy_amount_inr = COALESCE($5, buy_amount_inr), \
                 cooldown_hours = COALESCE($6, cooldown_hours), \
                 status = COALESCE($7, status), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            RULE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.trigger_type.as_deref())
        .bind(patch.threshold_value.clone())
        .bind(patch.buy_amount_inr)
        .bind(patch.cooldown_hours)
        .bind(patch.status.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM auto_dip_rules WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
