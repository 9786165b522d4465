use crate::api::AppState;
use crate::auth::AuthUser;
use crate::database::auto_dip_rule_repository::{
    AutoDipRule, AutoDipRulePatch, AutoDipRuleRepository,
};
use crate::error::{AppError, AppErrorKind, AppResult, DomainError};
use axum::{
    extract::{Path, State},
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutoDipRequest {
    pub trigger_type: Option<String>,
    pub threshold_value: Option<f64>,
    #[serde(rename = "buyAmountInINR")]
    pub buy_amount_in_inr: Option<i32>,
    pub cooldown_hours: Option<i32>,
}

/// GET /gold/auto-dip
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<AutoDipRule>>> {
    let repo = AutoDipRuleRepository::new(state.pool.clone());
    Ok(Json(repo.list_for_user(user.id).await?))
}

/// POST /gold/auto-dip
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateAutoDipRequest>,
) -> AppResult<Json<AutoDipRule>> {
    let repo = AutoDipRuleRepository::new(state.pool.clone());

    let trigger_type = body.trigger_type.as_deref().unwrap_or("price_drop_absolute");
    let threshold_value =
        BigDecimal::try_from(body.threshold_value.unwrap_or(50.0)).unwrap_or_else(|_| {
            BigDecimal::from(50)
        });
    let buy_amount_inr = body.buy_amount_in_inr.unwrap_or(200).max(10);
    let cooldown_hours = body.cooldown_hours.unwrap_or(24);

    let rule = repo
        .create(
            user.id,
            trigger_type,
            threshold_value,
            buy_amount_inr,
            cooldown_hours,
        )
        .await?;
    Ok(Json(rule))
}

/// PATCH /gold/auto-dip/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<AutoDipRulePatch>,
) -> AppResult<Json<AutoDipRule>> {
    let repo = AutoDipRuleRepository::new(state.pool.clone());
    repo.patch_for_user(id, user.id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| rule_not_found(id))
}

/// DELETE /gold/auto-dip/{id}
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let repo = AutoDipRuleRepository::new(state.pool.clone());
    if repo.delete_for_user(id, user.id).await? {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(rule_not_found(id))
    }
}

fn rule_not_found(id: Uuid) -> AppError {
    AppError::new(AppErrorKind::Domain(DomainError::PlanNotFound {
        plan_id: id.to_string(),
    }))
}
