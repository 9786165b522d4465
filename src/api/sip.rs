use crate::api::AppState;
use crate::auth::AuthUser;
use crate::database::sip_plan_repository::{SipPlan, SipPlanPatch, SipPlanRepository};
use crate::error::{AppError, AppErrorKind, AppResult, DomainError};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSipRequest {
    pub amount: Option<i32>,
    #[serde(rename = "amountInINR")]
    pub amount_in_inr: Option<i32>,
    pub frequency: Option<String>,
    pub weekly_day: Option<i16>,
    pub monthly_day: Option<i16>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub next_run_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// GET /gold/sip
pub async fn list(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<SipPlan>>> {
    let repo = SipPlanRepository::new(state.pool.clone());
    Ok(Json(repo.list_for_user(user.id).await?))
}

/// POST /gold/sip
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateSipRequest>,
) -> AppResult<Json<SipPlan>> {
    let repo = SipPlanRepository::new(state.pool.clone());
    // Amounts below the platform floor are clamped, not rejected
    let amount = body.amount.or(body.amount_in_inr).unwrap_or(0).max(10);
    let frequency = body.frequency.as_deref().unwrap_or("daily");
    let now = chrono::Utc::now();

    let plan = repo
        .create(
            user.id,
            amount,
            frequency,
            body.weekly_day,
            body.monthly_day,
            body.start_date.unwrap_or(now),
            Some(body.next_run_at.unwrap_or(now)),
        )
        .await?;
    Ok(Json(plan))
}

/// PATCH /gold/sip/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<SipPlanPatch>,
) -> AppResult<Json<SipPlan>> {
    let repo = SipPlanRepository::new(state.pool.clone());
    repo.patch_for_user(id, user.id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| plan_not_found(id))
}

/// POST /gold/sip/{id}/pause
pub async fn pause(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SipPlan>> {
    set_status(state, user, id, "paused").await
}

/// POST /gold/sip/{id}/resume
pub async fn resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SipPlan>> {
    set_status(state, user, id, "active").await
}

async fn set_status(
    state: AppState,
    user: AuthUser,
    id: Uuid,
    status: &str,
) -> AppResult<Json<SipPlan>> {
    let repo = SipPlanRepository::new(state.pool.clone());
    repo.set_status_for_user(id, user.id, status)
        .await?
        .map(Json)
        .ok_or_else(|| plan_not_found(id))
}

/// DELETE /gold/sip/{id}
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let repo = SipPlanRepository::new(state.pool.clone());
    if repo.delete_for_user(id, user.id).await? {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(plan_not_found(id))
    }
}

fn plan_not_found(id: Uuid) -> AppError {
    AppError::new(AppErrorKind::Domain(DomainError::PlanNotFound {
        plan_id: id.to_string(),
    }))
}
