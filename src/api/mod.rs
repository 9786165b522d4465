pub mod admin;
pub mod auto_dip;
pub mod gold;
pub mod payments;
pub mod sip;
pub mod transactions;

use crate::payments::factory::PaymentGatewayFactory;
use crate::services::buy_order::BuyOrderService;
use crate::services::webhook_processor::WebhookProcessor;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state. Repositories and services are cheap wrappers
/// over the pool and are constructed per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub gateways: Arc<PaymentGatewayFactory>,
    pub frontend_url: String,
}

impl AppState {
    pub fn buy_orders(&self) -> Arc<BuyOrderService> {
        Arc::new(BuyOrderService::new(
            self.pool.clone(),
            self.gateways.clone(),
        ))
    }

    pub fn webhook_processor(&self) -> WebhookProcessor {
        WebhookProcessor::new(self.gateways.clone(), self.buy_orders())
    }
}

/// Standard envelope for paginated admin listings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// All API routes, mounted under /api/v1 by the server
pub fn router(state: AppState) -> Router {
    Router::new()
        // Gold: price, balance, buy
        .route("/gold/price", get(gold::get_price))
        .route("/gold/balance", get(gold::get_balance))
        .route("/gold/buy", post(gold::buy))
        // Payments: webhook + redirect finalization
        .route("/payments/webhook", post(payments::webhook))
        .route("/payments/phonepe/redirect", get(payments::phonepe_redirect))
        // Transactions
        .route("/transactions", get(transactions::list_own))
        // SIP plans
        .route("/gold/sip", get(sip::list).post(sip::create))
        .route("/gold/sip/{id}", patch(sip::update).delete(sip::remove))
        .route("/gold/sip/{id}/pause", post(sip::pause))
        .route("/gold/sip/{id}/resume", post(sip::resume))
        // Auto-dip rules
        .route("/gold/auto-dip", get(auto_dip::list).post(auto_dip::create))
        .route(
            "/gold/auto-dip/{id}",
            patch(auto_dip::update).delete(auto_dip::remove),
        )
        // Admin
        .route(
            "/admin/settings",
            get(admin::get_settings).patch(admin::patch_settings),
        )
        .route("/admin/price", post(admin::set_price))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/transactions", get(admin::list_transactions))
        .route("/admin/sip", get(admin::list_sip_plans))
        .route("/admin/transactions/{id}", delete(admin::delete_transaction))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_computes_total_pages() {
        let page: PaginatedResponse<u32> = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);

        let exact: PaginatedResponse<u32> = PaginatedResponse::new(vec![], 40, 2, 20);
        assert_eq!(exact.total_pages, 2);
    }
}
