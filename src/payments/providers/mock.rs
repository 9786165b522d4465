use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentGateway;
use crate::payments::types::{
    OrderDescriptor, OrderRequest, PaymentOrder, PaymentOutcome, ProviderName, StatusResult,
    WebhookEvent, WebhookVerificationResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Development gateway: orders are fabricated locally and webhook payloads
/// are read verbatim without verification. Never enabled as a fallback in
/// production unless explicitly configured.
pub struct MockGateway;

impl MockGateway {
    pub fn order_for(request: &OrderRequest) -> PaymentOrder {
        PaymentOrder {
            provider: ProviderName::Mock,
            order: OrderDescriptor::Mock {
                id: format!("mock_{}", chrono::Utc::now().timestamp_millis()),
                amount: request.amount_minor,
                currency: request.currency.clone(),
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: OrderRequest) -> PaymentResult<PaymentOrder> {
        Ok(Self::order_for(&request))
    }

    async fn check_status(&self, _merchant_transaction_id: &str) -> PaymentResult<StatusResult> {
        Ok(StatusResult {
            outcome: PaymentOutcome::Pending,
            provider_transaction_id: None,
        })
    }

    fn name(&self) -> ProviderName {
        ProviderName::Mock
    }

    fn verify_webhook(
        &self,
        _payload: &[u8],
        _signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        // Dev payloads are unauthenticated by design
        Ok(WebhookVerificationResult {
            valid: true,
            reason: None,
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let raw: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;
        let parsed: DevPayload = serde_json::from_value(raw.clone()).unwrap_or_default();

        Ok(WebhookEvent {
            provider: ProviderName::Mock,
            transaction_id: parsed.tx_id,
            user_id: parsed.user_id,
            payment_id: parsed.payment_id,
            order_id: parsed.order_id,
            outcome: parsed.status,
            payload: raw,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Generic dev/test webhook body
#[derive(Debug, Clone, Default, Deserialize)]
struct DevPayload {
    #[serde(default, rename = "txId")]
    tx_id: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
    #[serde(default, rename = "paymentId")]
    payment_id: Option<String>,
    #[serde(default, rename = "orderId")]
    order_id: Option<String>,
    #[serde(default)]
    status: Option<PaymentOutcome>,
}
