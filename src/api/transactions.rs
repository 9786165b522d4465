use crate::api::AppState;
use crate::auth::AuthUser;
use crate::database::transaction_repository::{Transaction, TransactionRepository};
use crate::error::AppResult;
use axum::{extract::State, Json};

/// GET /transactions: the current user's transactions, newest first
pub async fn list_own(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Transaction>>> {
    let repo = TransactionRepository::new(state.pool.clone());
    let transactions = repo.find_for_user(user.id).await?;
    Ok(Json(transactions))
}
