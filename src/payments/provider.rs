use crate::payments::error::PaymentResult;
use crate::payments::types::{
    OrderRequest, PaymentOrder, ProviderName, StatusResult, WebhookEvent,
    WebhookVerificationResult,
};
use async_trait::async_trait;

/// Contract every payment gateway implements. The orchestrator only sees
/// this trait; provider-specific request/response/signature shapes stay
/// inside each implementation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an external payment order for an amount in minor currency units
    async fn create_order(&self, request: OrderRequest) -> PaymentResult<PaymentOrder>;

    /// Query the provider's status endpoint for a merchant transaction id.
    /// Only meaningful for poll-based providers; others reject the call.
    async fn check_status(&self, merchant_transaction_id: &str) -> PaymentResult<StatusResult>;

    fn name(&self) -> ProviderName;

    /// Verify the signature on a raw webhook payload. Providers without a
    /// verifiable signature return valid=false with a reason so the caller
    /// falls back to an active status query.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult>;

    /// Parse a raw webhook payload into the provider-agnostic event shape
    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent>;
}
