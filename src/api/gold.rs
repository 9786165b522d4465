use crate::api::AppState;
use crate::auth::AuthUser;
use crate::database::gold_price_repository::GoldPrice;
use crate::error::{AppError, AppErrorKind, AppResult, DomainError};
use crate::services::buy_order::BuyReceipt;
use axum::{extract::State, Json};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub gold_balance: BigDecimal,
}

/// GET /gold/price
pub async fn get_price(State(state): State<AppState>) -> AppResult<Json<GoldPrice>> {
    let price = state.buy_orders().active_price().await?;
    Ok(Json(price))
}

/// GET /gold/balance
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<BalanceResponse>> {
    let gold_balance = state.buy_orders().gold_balance(user.id).await?;
    Ok(Json(BalanceResponse { gold_balance }))
}

/// POST /gold/buy
pub async fn buy(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<BuyRequest>,
) -> AppResult<Json<BuyReceipt>> {
    let amount = BigDecimal::try_from(body.amount).map_err(|_| {
        AppError::new(AppErrorKind::Domain(DomainError::InvalidAmount {
            amount: body.amount.to_string(),
            reason: "Amount must be a finite number".to_string(),
        }))
    })?;

    let receipt = state.buy_orders().initiate_buy(user.id, amount).await?;
    Ok(Json(receipt))
}
