use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentGateway;
use crate::payments::types::{
    OrderRequest, PaymentOrder, PaymentOutcome, ProviderName, StatusResult, WebhookEvent,
    WebhookVerificationResult,
};
use crate::payments::utils::verify_hmac_sha256_hex;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub webhook_secret: Option<String>,
}

impl RazorpayConfig {
    pub fn from_env() -> Self {
        Self {
            webhook_secret: std::env::var("RAZORPAY_WEBHOOK_SECRET").ok(),
        }
    }
}

/// Razorpay is kept for webhook compatibility with historical orders; new
/// orders go through PhonePe.
pub struct RazorpayGateway {
    config: RazorpayConfig,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(RazorpayConfig::from_env())
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, _request: OrderRequest) -> PaymentResult<PaymentOrder> {
        Err(PaymentError::ProviderError {
            provider: "razorpay".to_string(),
            message: "order creation is not enabled for razorpay".to_string(),
            provider_code: None,
            retryable: false,
        })
    }

    async fn check_status(&self, _merchant_transaction_id: &str) -> PaymentResult<StatusResult> {
        Err(PaymentError::ProviderError {
            provider: "razorpay".to_string(),
            message: "status polling is not enabled for razorpay".to_string(),
            provider_code: None,
            retryable: false,
        })
    }

    fn name(&self) -> ProviderName {
        ProviderName::Razorpay
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        let secret = self.config.webhook_secret.as_deref().ok_or(
            PaymentError::WebhookVerificationError {
                message: "RAZORPAY_WEBHOOK_SECRET is not configured".to_string(),
            },
        )?;
        let valid = verify_hmac_sha256_hex(payload, secret, signature);
        Ok(WebhookVerificationResult {
            valid,
            reason: if valid {
                None
            } else {
                Some("invalid razorpay signature".to_string())
            },
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let raw: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;
        let parsed: RazorpayWebhook =
            serde_json::from_value(raw.clone()).map_err(|e| {
                PaymentError::WebhookVerificationError {
                    message: format!("unrecognized razorpay webhook shape: {}", e),
                }
            })?;

        let entity = parsed
            .payload
            .and_then(|p| p.payment)
            .map(|p| p.entity)
            .ok_or(PaymentError::WebhookVerificationError {
                message: "razorpay webhook carries no payment entity".to_string(),
            })?;

        let outcome = match entity.status.as_deref() {
            Some("captured") => PaymentOutcome::Success,
            _ => PaymentOutcome::Failed,
        };

        Ok(WebhookEvent {
            provider: ProviderName::Razorpay,
            transaction_id: entity.notes.as_ref().and_then(|n| n.tx_id.clone()),
            user_id: entity.notes.as_ref().and_then(|n| n.user_id.clone()),
            payment_id: entity.id,
            order_id: entity.order_id,
            outcome: Some(outcome),
            payload: raw,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayWebhook {
    #[serde(default)]
    payload: Option<RazorpayWebhookPayload>,
}

#[derive(Debug, Deserialize)]
struct RazorpayWebhookPayload {
    #[serde(default)]
    payment: Option<RazorpayPaymentWrapper>,
}

#[derive(Debug, Deserialize)]
struct RazorpayPaymentWrapper {
    entity: RazorpayPaymentEntity,
}

#[derive(Debug, Deserialize)]
struct RazorpayPaymentEntity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<RazorpayNotes>,
}

#[derive(Debug, Deserialize)]
struct RazorpayNotes {
    #[serde(default, rename = "txId")]
    tx_id: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::utils::hmac_sha256_hex;

    fn gateway() -> RazorpayGateway {
        RazorpayGateway::new(RazorpayConfig {
            webhook_secret: Some("rzp_whsec_test".to_string()),
        })
    }

    fn captured_payload() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "status": "captured",
                        "notes": { "txId": "tx_1", "userId": "u_1" }
                    }
                }
            }
        }))
        .expect("static payload")
    }

    #[test]
    fn valid_signature_passes_verification() {
        let gateway = gateway();
        let payload = captured_payload();
        let signature = hmac_sha256_hex(&payload, "rzp_whsec_test");
        let result = gateway
            .verify_webhook(&payload, &signature)
            .expect("verification should not error");
        assert!(result.valid);
    }

    #[test]
    fn invalid_signature_fails_closed() {
        let gateway = gateway();
        let result = gateway
            .verify_webhook(&captured_payload(), "bad-signature")
            .expect("verification should not error");
        assert!(!result.valid);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let gateway = RazorpayGateway::new(RazorpayConfig {
            webhook_secret: None,
        });
        assert!(gateway.verify_webhook(b"{}", "sig").is_err());
    }

    #[test]
    fn captured_payment_parses_to_success() {
        let gateway = gateway();
        let event = gateway
            .parse_webhook_event(&captured_payload())
            .expect("parse should succeed");
        assert_eq!(event.transaction_id.as_deref(), Some("tx_1"));
        assert_eq!(event.user_id.as_deref(), Some("u_1"));
        assert_eq!(event.payment_id.as_deref(), Some("pay_29QQoUBi66xm2f"));
        assert_eq!(event.outcome, Some(PaymentOutcome::Success));
    }

    #[test]
    fn non_captured_payment_parses_to_failed() {
        let gateway = gateway();
        let payload = serde_json::to_vec(&serde_json::json!({
            "payload": {
                "payment": {
                    "entity": { "id": "pay_1", "status": "failed", "notes": { "txId": "tx_2" } }
                }
            }
        }))
        .expect("static payload");
        let event = gateway
            .parse_webhook_event(&payload)
            .expect("parse should succeed");
        assert_eq!(event.outcome, Some(PaymentOutcome::Failed));
    }
}
