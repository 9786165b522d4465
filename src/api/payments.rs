use crate::api::AppState;
use crate::error::{AppError, AppErrorKind, AppResult, ExternalError, ValidationError};
use crate::payments::types::{PaymentOutcome, ProviderName};
use crate::services::buy_order::FinalizeInstruction;
use crate::services::webhook_processor::WebhookProcessorError;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

/// POST /payments/webhook
///
/// Provider-agnostic entry point. Signature and payload failures are client
/// errors; anything after successful dispatch acknowledges the delivery so
/// the provider does not retry a webhook we have already acted on.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let processor = state.webhook_processor();
    match processor.process(&headers, &body).await {
        Ok(()) => Json(serde_json::json!({ "received": true })).into_response(),
        Err(WebhookProcessorError::InvalidSignature) => AppError::new(AppErrorKind::External(
            ExternalError::WebhookVerification {
                message: "invalid signature".to_string(),
            },
        ))
        .into_response(),
        Err(WebhookProcessorError::InvalidPayload(message)) => {
            AppError::new(AppErrorKind::Validation(ValidationError::MissingField {
                field: format!("payload ({})", message),
            }))
            .into_response()
        }
        Err(WebhookProcessorError::ProcessingError(message)) => {
            // Delivery was verified and dispatched; acknowledge it
            tracing::error!(error = %message, "webhook processing failed after dispatch");
            Json(serde_json::json!({ "received": true })).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PhonepeRedirectQuery {
    #[serde(rename = "merchantTransactionId")]
    pub merchant_transaction_id: Option<String>,
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
    pub mtid: Option<String>,
}

/// GET /payments/phonepe/redirect
///
/// PhonePe lands the customer here after hosted checkout. The outcome in the
/// query string is untrusted; resolution goes through the status endpoint
/// before the user is forwarded to the frontend.
pub async fn phonepe_redirect(
    State(state): State<AppState>,
    Query(query): Query<PhonepeRedirectQuery>,
) -> AppResult<Redirect> {
    let merchant_transaction_id = query
        .merchant_transaction_id
        .or(query.transaction_id)
        .or(query.mtid)
        .ok_or_else(|| {
            AppError::new(AppErrorKind::Validation(ValidationError::MissingField {
                field: "merchantTransactionId".to_string(),
            }))
        })?;

    let gateway = state.gateways.get_gateway(ProviderName::Phonepe)?;
    let status = gateway.check_status(&merchant_transaction_id).await?;

    let buy_orders = state.buy_orders();
    let transaction = buy_orders
        .transaction_by_id(&merchant_transaction_id)
        .await?;

    if let Some(transaction) = transaction {
        if status.outcome != PaymentOutcome::Pending {
            buy_orders
                .finalize(FinalizeInstruction {
                    transaction_id: Some(merchant_transaction_id.clone()),
                    user_id: Some(transaction.user_id.to_string()),
                    outcome: Some(status.outcome),
                    payment_id: status.provider_transaction_id.clone(),
                    order_id: Some(merchant_transaction_id.clone()),
                    provider: Some(ProviderName::Phonepe.to_string()),
                })
                .await?;
        }
    }

    let outcome = match status.outcome {
        PaymentOutcome::Success => "success",
        PaymentOutcome::Failed => "failed",
        PaymentOutcome::Pending => "pending",
    };
    info!(
        merchant_transaction_id = %merchant_transaction_id,
        outcome = outcome,
        "phonepe redirect resolved"
    );

    Ok(Redirect::temporary(&format!(
        "{}/?payment={}",
        state.frontend_url, outcome
    )))
}
