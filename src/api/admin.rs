use crate::api::{AppState, PaginatedResponse};
use crate::auth::AuthUser;
use crate::database::gold_price_repository::{GoldPrice, GoldPriceRepository};
use crate::database::repository::Repository;
use crate::database::settings_repository::{AdminSettings, SettingsPatch, SettingsRepository};
use crate::database::sip_plan_repository::{SipPlan, SipPlanRepository};
use crate::database::transaction_repository::{Transaction, TransactionRepository};
use crate::database::user_repository::{User, UserRepository};
use crate::error::{AppError, AppErrorKind, AppResult, DomainError, ValidationError};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use tracing::info;

/// GET /admin/settings. Public read so the frontend can render feature
/// flags and fee disclosures without a session
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<AdminSettings>> {
    let repo = SettingsRepository::new(state.pool.clone());
    let settings = repo.get_or_create().await?;
    Ok(Json(settings))
}

/// PATCH /admin/settings, admin-only JSON merge patch
pub async fn patch_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(patch): Json<SettingsPatch>,
) -> AppResult<Json<AdminSettings>> {
    user.require_admin()?;
    let repo = SettingsRepository::new(state.pool.clone());
    let settings = repo.patch(&patch).await?;
    info!(admin = %user.id, "platform settings updated");
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPriceRequest {
    pub price_per_gram: f64,
    pub price_per_ounce: Option<f64>,
    pub source: Option<String>,
}

/// POST /admin/price: install a new active gold price (manual override)
pub async fn set_price(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SetPriceRequest>,
) -> AppResult<Json<GoldPrice>> {
    user.require_admin()?;

    if body.price_per_gram <= 0.0 {
        return Err(AppError::new(AppErrorKind::Domain(
            DomainError::InvalidAmount {
                amount: body.price_per_gram.to_string(),
                reason: "Price must be positive".to_string(),
            },
        )));
    }

    let price_per_gram = decimal_from(body.price_per_gram, "pricePerGram")?;
    let price_per_ounce = match body.price_per_ounce {
        Some(v) => decimal_from(v, "pricePerOunce")?,
        None => BigDecimal::from(0),
    };
    let source = body.source.as_deref().unwrap_or("manual");

    let repo = GoldPriceRepository::new(state.pool.clone());
    let price = repo
        .set_active_price(price_per_gram, price_per_ounce, source)
        .await?;
    info!(admin = %user.id, price = %price.price_per_gram, source = source, "active gold price replaced");
    Ok(Json(price))
}

fn decimal_from(value: f64, field: &str) -> AppResult<BigDecimal> {
    BigDecimal::try_from(value).map_err(|_| {
        AppError::new(AppErrorKind::Validation(ValidationError::InvalidAmount {
            amount: value.to_string(),
            reason: format!("{} must be a finite number", field),
        }))
    })
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

impl ListQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 200)
    }
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    user.require_admin()?;
    let repo = UserRepository::new(state.pool.clone());
    let (users, total) = repo
        .list_paginated(
            query.page(),
            query.limit(),
            query.search.as_deref(),
            query.role.as_deref(),
        )
        .await?;
    Ok(Json(PaginatedResponse::new(
        users,
        total,
        query.page(),
        query.limit(),
    )))
}

/// GET /admin/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Transaction>>> {
    user.require_admin()?;
    let repo = TransactionRepository::new(state.pool.clone());
    let (transactions, total) = repo
        .list_paginated(
            query.page(),
            query.limit(),
            query.status.as_deref(),
            query.transaction_type.as_deref(),
        )
        .await?;
    Ok(Json(PaginatedResponse::new(
        transactions,
        total,
        query.page(),
        query.limit(),
    )))
}

/// GET /admin/sip: all SIP plans across users
pub async fn list_sip_plans(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<SipPlan>>> {
    user.require_admin()?;
    let repo = SipPlanRepository::new(state.pool.clone());
    let plans = repo.list_all().await?;
    Ok(Json(plans))
}

/// DELETE /admin/transactions/{id}
pub async fn delete_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    user.require_admin()?;
    let repo = TransactionRepository::new(state.pool.clone());
    let deleted = repo.delete(&id.to_string()).await?;
    if !deleted {
        return Err(AppError::new(AppErrorKind::Domain(
            DomainError::TransactionNotFound {
                transaction_id: id.to_string(),
            },
        )));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
