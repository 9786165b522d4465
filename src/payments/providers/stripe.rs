use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentGateway;
use crate::payments::types::{
    OrderRequest, PaymentOrder, PaymentOutcome, ProviderName, StatusResult, WebhookEvent,
    WebhookVerificationResult,
};
use crate::payments::utils::{hmac_sha256_hex, secure_eq};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub webhook_secret: Option<String>,
    /// Maximum accepted age of a signed event, in seconds
    pub signature_tolerance_secs: i64,
}

impl StripeConfig {
    pub fn from_env() -> Self {
        Self {
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
            signature_tolerance_secs: std::env::var("STRIPE_SIGNATURE_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(300),
        }
    }
}

/// Stripe is webhook-only here: events for historical USD orders are still
/// verified and finalized, but new orders are not created through it.
pub struct StripeGateway {
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(StripeConfig::from_env())
    }

    /// Verify a `Stripe-Signature` header (`t=...,v1=...[,v1=...]`) against
    /// the raw payload, including the timestamp tolerance window.
    fn verify_signature_header(
        &self,
        payload: &[u8],
        header: &str,
        now_unix: i64,
    ) -> PaymentResult<bool> {
        let secret = self.config.webhook_secret.as_deref().ok_or(
            PaymentError::WebhookVerificationError {
                message: "STRIPE_WEBHOOK_SECRET is not configured".to_string(),
            },
        )?;

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = match timestamp {
            Some(t) => t,
            None => return Ok(false),
        };
        if candidates.is_empty() {
            return Ok(false);
        }
        if (now_unix - timestamp).abs() > self.config.signature_tolerance_secs {
            return Ok(false);
        }

        let mut signed_payload = format!("{}.", timestamp).into_bytes();
        signed_payload.extend_from_slice(payload);
        let expected = hmac_sha256_hex(&signed_payload, secret);

        Ok(candidates
            .iter()
            .any(|candidate| secure_eq(expected.as_bytes(), candidate.trim().as_bytes())))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_order(&self, _request: OrderRequest) -> PaymentResult<PaymentOrder> {
        Err(PaymentError::ProviderError {
            provider: "stripe".to_string(),
            message: "order creation is not enabled for stripe".to_string(),
            provider_code: None,
            retryable: false,
        })
    }

    async fn check_status(&self, _merchant_transaction_id: &str) -> PaymentResult<StatusResult> {
        Err(PaymentError::ProviderError {
            provider: "stripe".to_string(),
            message: "status polling is not enabled for stripe".to_string(),
            provider_code: None,
            retryable: false,
        })
    }

    fn name(&self) -> ProviderName {
        ProviderName::Stripe
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        let valid =
            self.verify_signature_header(payload, signature, chrono::Utc::now().timestamp())?;
        Ok(WebhookVerificationResult {
            valid,
            reason: if valid {
                None
            } else {
                Some("invalid stripe signature".to_string())
            },
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let raw: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;
        let parsed: StripeEvent =
            serde_json::from_value(raw.clone()).map_err(|e| {
                PaymentError::WebhookVerificationError {
                    message: format!("unrecognized stripe event shape: {}", e),
                }
            })?;

        let object = parsed
            .data
            .map(|d| d.object)
            .ok_or(PaymentError::WebhookVerificationError {
                message: "stripe event carries no data object".to_string(),
            })?;

        let outcome = match object.status.as_deref() {
            Some("succeeded") => PaymentOutcome::Success,
            _ => PaymentOutcome::Failed,
        };

        Ok(WebhookEvent {
            provider: ProviderName::Stripe,
            transaction_id: object.metadata.as_ref().and_then(|m| m.tx_id.clone()),
            user_id: object.metadata.as_ref().and_then(|m| m.user_id.clone()),
            payment_id: object.id.clone(),
            order_id: object.id,
            outcome: Some(outcome),
            payload: raw,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(default)]
    data: Option<StripeEventData>,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeObject,
}

#[derive(Debug, Deserialize)]
struct StripeObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    metadata: Option<StripeMetadata>,
}

#[derive(Debug, Deserialize)]
struct StripeMetadata {
    #[serde(default, rename = "txId")]
    tx_id: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> StripeGateway {
        StripeGateway::new(StripeConfig {
            webhook_secret: Some("whsec_test".to_string()),
            signature_tolerance_secs: 300,
        })
    }

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let mut signed = format!("{}.", timestamp).into_bytes();
        signed.extend_from_slice(payload);
        format!("t={},v1={}", timestamp, hmac_sha256_hex(&signed, secret))
    }

    #[test]
    fn valid_signed_event_passes() {
        let gateway = gateway();
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let now = 1_700_000_000;
        let header = sign(payload, now, "whsec_test");
        assert!(gateway
            .verify_signature_header(payload, &header, now + 10)
            .expect("verification should not error"));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let gateway = gateway();
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let now = 1_700_000_000;
        let header = sign(payload, now, "whsec_test");
        assert!(!gateway
            .verify_signature_header(payload, &header, now + 301)
            .expect("verification should not error"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let gateway = gateway();
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let now = 1_700_000_000;
        let header = sign(payload, now, "whsec_other");
        assert!(!gateway
            .verify_signature_header(payload, &header, now)
            .expect("verification should not error"));
    }

    #[test]
    fn header_without_signature_is_rejected() {
        let gateway = gateway();
        assert!(!gateway
            .verify_signature_header(b"{}", "t=1700000000", 1_700_000_000)
            .expect("verification should not error"));
    }

    #[test]
    fn succeeded_intent_parses_to_success() {
        let gateway = gateway();
        let payload = serde_json::to_vec(&serde_json::json!({
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_3MtwBwLkdIwHu7ix28a3tqPa",
                    "status": "succeeded",
                    "metadata": { "txId": "tx_1", "userId": "u_1" }
                }
            }
        }))
        .expect("static payload");
        let event = gateway
            .parse_webhook_event(&payload)
            .expect("parse should succeed");
        assert_eq!(event.transaction_id.as_deref(), Some("tx_1"));
        assert_eq!(event.outcome, Some(PaymentOutcome::Success));
    }
}
