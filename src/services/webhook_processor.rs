//! Provider-agnostic webhook processing
//!
//! Classification happens exactly once, on out-of-band evidence (signature
//! headers first, then the PhonePe marker fields), producing a tagged source
//! before any payload interpretation. Each arm then verifies and parses with
//! its own gateway, so one provider's payload can never be read as another's.

use crate::payments::factory::PaymentGatewayFactory;
use crate::payments::types::{PaymentOutcome, ProviderName};
use crate::services::buy_order::{BuyOrderService, FinalizeInstruction, FinalizeResult};
use http::HeaderMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
pub const RAZORPAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Error)]
pub enum WebhookProcessorError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

/// Webhook source, decided once per delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookSource {
    Stripe { signature: String },
    Razorpay { signature: String },
    Phonepe,
    Dev,
}

impl WebhookSource {
    pub fn provider(&self) -> ProviderName {
        match self {
            WebhookSource::Stripe { .. } => ProviderName::Stripe,
            WebhookSource::Razorpay { .. } => ProviderName::Razorpay,
            WebhookSource::Phonepe => ProviderName::Phonepe,
            WebhookSource::Dev => ProviderName::Mock,
        }
    }
}

/// Classify a webhook delivery. Signature headers take priority; a payload
/// carrying PhonePe's merchant fields is a PhonePe callback; anything else is
/// treated as an unverified dev payload.
pub fn classify_webhook(headers: &HeaderMap, payload: &JsonValue) -> WebhookSource {
    if let Some(signature) = header_value(headers, STRIPE_SIGNATURE_HEADER) {
        return WebhookSource::Stripe { signature };
    }
    if let Some(signature) = header_value(headers, RAZORPAY_SIGNATURE_HEADER) {
        return WebhookSource::Razorpay { signature };
    }
    if payload.get("merchantTransactionId").is_some()
        || payload.get("transactionId").is_some()
        || payload.get("code").is_some()
    {
        return WebhookSource::Phonepe;
    }
    WebhookSource::Dev
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub struct WebhookProcessor {
    gateways: Arc<PaymentGatewayFactory>,
    buy_orders: Arc<BuyOrderService>,
}

impl WebhookProcessor {
    pub fn new(gateways: Arc<PaymentGatewayFactory>, buy_orders: Arc<BuyOrderService>) -> Self {
        Self {
            gateways,
            buy_orders,
        }
    }

    /// Process one webhook delivery end to end: classify, verify, parse,
    /// finalize. Signature failures are the only errors the provider should
    /// see as a client error; everything else acknowledges the delivery.
    pub async fn process(
        &self,
        headers: &HeaderMap,
        raw_body: &[u8],
    ) -> Result<(), WebhookProcessorError> {
        let payload: JsonValue = serde_json::from_slice(raw_body)
            .map_err(|e| WebhookProcessorError::InvalidPayload(e.to_string()))?;

        let source = classify_webhook(headers, &payload);
        info!(provider = %source.provider(), "webhook received");

        match source {
            WebhookSource::Stripe { signature } => {
                self.process_signed(ProviderName::Stripe, raw_body, &signature)
                    .await
            }
            WebhookSource::Razorpay { signature } => {
                self.process_signed(ProviderName::Razorpay, raw_body, &signature)
                    .await
            }
            WebhookSource::Phonepe => self.process_phonepe(raw_body).await,
            WebhookSource::Dev => self.process_dev(raw_body).await,
        }
    }

    /// Signature-bearing providers: fail closed on verification, then trust
    /// the parsed outcome.
    async fn process_signed(
        &self,
        provider: ProviderName,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<(), WebhookProcessorError> {
        let gateway = self
            .gateways
            .get_gateway(provider.clone())
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;

        let verification = gateway
            .verify_webhook(raw_body, signature)
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;
        if !verification.valid {
            warn!(
                provider = %provider,
                reason = verification.reason.as_deref().unwrap_or("unspecified"),
                "webhook signature verification failed"
            );
            return Err(WebhookProcessorError::InvalidSignature);
        }

        let event = gateway
            .parse_webhook_event(raw_body)
            .map_err(|e| WebhookProcessorError::InvalidPayload(e.to_string()))?;

        self.finalize_event(
            event.transaction_id,
            event.user_id,
            event.outcome,
            event.payment_id,
            event.order_id,
            provider,
        )
        .await
    }

    /// PhonePe callbacks are unsigned; the payload only identifies the
    /// transaction and the real outcome comes from an active status query.
    async fn process_phonepe(&self, raw_body: &[u8]) -> Result<(), WebhookProcessorError> {
        let gateway = self
            .gateways
            .get_gateway(ProviderName::Phonepe)
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;

        let event = gateway
            .parse_webhook_event(raw_body)
            .map_err(|e| WebhookProcessorError::InvalidPayload(e.to_string()))?;

        let Some(merchant_transaction_id) =
            event.transaction_id.clone().or(event.order_id.clone())
        else {
            warn!("phonepe callback carries no merchant transaction id");
            return Ok(());
        };

        let status = gateway
            .check_status(&merchant_transaction_id)
            .await
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;

        let transaction = self
            .buy_orders
            .transaction_by_id(&merchant_transaction_id)
            .await
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;
        let user_id = transaction
            .map(|t| t.user_id.to_string())
            .or(event.user_id);

        let outcome = match status.outcome {
            PaymentOutcome::Pending => None,
            resolved => Some(resolved),
        };

        self.finalize_event(
            Some(merchant_transaction_id.clone()),
            user_id,
            outcome,
            status.provider_transaction_id,
            Some(merchant_transaction_id),
            ProviderName::Phonepe,
        )
        .await
    }

    /// Unverified generic payload; dev/test environments only
    async fn process_dev(&self, raw_body: &[u8]) -> Result<(), WebhookProcessorError> {
        let gateway = self
            .gateways
            .get_gateway(ProviderName::Mock)
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;

        let event = gateway
            .parse_webhook_event(raw_body)
            .map_err(|e| WebhookProcessorError::InvalidPayload(e.to_string()))?;

        self.finalize_event(
            event.transaction_id,
            event.user_id,
            event.outcome,
            event.payment_id,
            event.order_id,
            ProviderName::Mock,
        )
        .await
    }

    async fn finalize_event(
        &self,
        transaction_id: Option<String>,
        user_id: Option<String>,
        outcome: Option<PaymentOutcome>,
        payment_id: Option<String>,
        order_id: Option<String>,
        provider: ProviderName,
    ) -> Result<(), WebhookProcessorError> {
        let result = self
            .buy_orders
            .finalize(FinalizeInstruction {
                transaction_id,
                user_id,
                outcome,
                payment_id,
                order_id,
                provider: Some(provider.to_string()),
            })
            .await
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;

        if matches!(result, FinalizeResult::NoOp) {
            info!(provider = %provider, "webhook resolved to no-op");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn stripe_header_wins_classification() {
        let mut headers = HeaderMap::new();
        headers.insert(
            STRIPE_SIGNATURE_HEADER,
            HeaderValue::from_static("t=1,v1=abc"),
        );
        // Even with PhonePe-looking fields in the body
        let payload = serde_json::json!({ "merchantTransactionId": "tx_1" });
        assert_eq!(
            classify_webhook(&headers, &payload),
            WebhookSource::Stripe {
                signature: "t=1,v1=abc".to_string()
            }
        );
    }

    #[test]
    fn razorpay_header_classifies_after_stripe() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RAZORPAY_SIGNATURE_HEADER,
            HeaderValue::from_static("deadbeef"),
        );
        let payload = serde_json::json!({});
        assert_eq!(
            classify_webhook(&headers, &payload),
            WebhookSource::Razorpay {
                signature: "deadbeef".to_string()
            }
        );
    }

    #[test]
    fn phonepe_marker_fields_classify_without_headers() {
        let headers = HeaderMap::new();
        for payload in [
            serde_json::json!({ "merchantTransactionId": "tx_1" }),
            serde_json::json!({ "transactionId": "pp_1" }),
            serde_json::json!({ "code": "PAYMENT_SUCCESS" }),
        ] {
            assert_eq!(classify_webhook(&headers, &payload), WebhookSource::Phonepe);
        }
    }

    #[test]
    fn unmarked_payload_classifies_as_dev() {
        let headers = HeaderMap::new();
        let payload = serde_json::json!({ "txId": "tx_1", "status": "success" });
        assert_eq!(classify_webhook(&headers, &payload), WebhookSource::Dev);
    }
}
