use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentGateway;
use crate::payments::types::{
    OrderDescriptor, OrderRequest, PaymentOrder, PaymentOutcome, ProviderName, StatusResult,
    WebhookEvent, WebhookVerificationResult,
};
use crate::payments::utils::{sha256_hex, PaymentHttpClient};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PhonepeConfig {
    pub merchant_id: String,
    pub salt_key: String,
    pub salt_index: String,
    pub base_url: String,
    pub callback_url: String,
    pub redirect_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for PhonepeConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            salt_key: String::new(),
            salt_index: "1".to_string(),
            base_url: "https://api-preprod.phonepe.com/apis/pg-sandbox".to_string(),
            callback_url: String::new(),
            redirect_url: String::new(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl PhonepeConfig {
    pub fn from_env() -> PaymentResult<Self> {
        let merchant_id =
            std::env::var("PHONEPE_MERCHANT_ID").map_err(|_| PaymentError::ValidationError {
                message: "PHONEPE_MERCHANT_ID environment variable is required".to_string(),
                field: Some("PHONEPE_MERCHANT_ID".to_string()),
            })?;
        let salt_key =
            std::env::var("PHONEPE_SALT_KEY").map_err(|_| PaymentError::ValidationError {
                message: "PHONEPE_SALT_KEY environment variable is required".to_string(),
                field: Some("PHONEPE_SALT_KEY".to_string()),
            })?;

        let api_base = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api/v1".to_string());

        Ok(Self {
            merchant_id,
            salt_key,
            salt_index: std::env::var("PHONEPE_SALT_INDEX").unwrap_or_else(|_| "1".to_string()),
            base_url: std::env::var("PHONEPE_BASE_URL").unwrap_or_else(|_| {
                "https://api-preprod.phonepe.com/apis/pg-sandbox".to_string()
            }),
            callback_url: std::env::var("PHONEPE_CALLBACK_URL")
                .unwrap_or_else(|_| format!("{}/payments/webhook", api_base)),
            redirect_url: std::env::var("PHONEPE_REDIRECT_URL")
                .unwrap_or_else(|_| format!("{}/payments/phonepe/redirect", api_base)),
            timeout_secs: std::env::var("PHONEPE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            max_retries: std::env::var("PHONEPE_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.merchant_id.trim().is_empty() && !self.salt_key.trim().is_empty()
    }
}

pub struct PhonepeGateway {
    config: PhonepeConfig,
    http: PaymentHttpClient,
}

impl PhonepeGateway {
    pub fn new(config: PhonepeConfig) -> PaymentResult<Self> {
        let http =
            PaymentHttpClient::new(Duration::from_secs(config.timeout_secs), config.max_retries)?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PhonepeConfig::from_env()?)
    }

    /// X-VERIFY for the pay call: sha256(base64_payload + path + salt) with
    /// the salt index suffixed after "###"
    fn pay_checksum(&self, payload_base64: &str, path: &str) -> String {
        let digest = sha256_hex(
            format!("{}{}{}", payload_base64, path, self.config.salt_key).as_bytes(),
        );
        format!("{}###{}", digest, self.config.salt_index)
    }

    /// X-VERIFY for status calls: sha256(path + salt) with the same suffix
    fn status_checksum(&self, path: &str) -> String {
        let digest = sha256_hex(format!("{}{}", path, self.config.salt_key).as_bytes());
        format!("{}###{}", digest, self.config.salt_index)
    }
}

#[async_trait]
impl PaymentGateway for PhonepeGateway {
    async fn create_order(&self, request: OrderRequest) -> PaymentResult<PaymentOrder> {
        if request.amount_minor <= 0 {
            return Err(PaymentError::ValidationError {
                message: "amount must be greater than zero".to_string(),
                field: Some("amount".to_string()),
            });
        }

        let pay_request = serde_json::json!({
            "merchantId": self.config.merchant_id,
            "merchantTransactionId": request.transaction_id,
            "merchantUserId": request.user_id,
            "amount": request.amount_minor,
            "redirectUrl": self.config.redirect_url,
            "redirectMode": "REDIRECT",
            "callbackUrl": self.config.callback_url,
            "paymentInstrument": { "type": "PAY_PAGE" },
        });

        let payload_base64 = BASE64.encode(
            serde_json::to_vec(&pay_request).map_err(|e| PaymentError::ValidationError {
                message: format!("failed to encode pay request: {}", e),
                field: None,
            })?,
        );
        let path = "/pg/v1/pay";
        let checksum = self.pay_checksum(&payload_base64, path);

        let body = serde_json::json!({ "request": payload_base64 });
        let raw: PhonepePayResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &format!("{}{}", self.config.base_url, path),
                Some(&body),
                &[
                    ("Content-Type", "application/json"),
                    ("X-VERIFY", &checksum),
                    ("X-MERCHANT-ID", &self.config.merchant_id),
                ],
            )
            .await?;

        let redirect_url = raw
            .data
            .as_ref()
            .and_then(|d| d.instrument_response.as_ref())
            .and_then(|i| i.redirect_info.as_ref())
            .map(|r| r.url.clone());

        match redirect_url {
            Some(url) => {
                info!(
                    merchant_transaction_id = %request.transaction_id,
                    "phonepe payment order created"
                );
                Ok(PaymentOrder {
                    provider: ProviderName::Phonepe,
                    order: OrderDescriptor::Redirect {
                        redirect_url: url,
                        merchant_transaction_id: request.transaction_id,
                    },
                })
            }
            None => {
                warn!(
                    code = raw.code.as_deref().unwrap_or("unknown"),
                    "phonepe did not return a redirect url"
                );
                Err(PaymentError::ProviderError {
                    provider: "phonepe".to_string(),
                    message: format!(
                        "no redirect URL in pay response (code: {})",
                        raw.code.as_deref().unwrap_or("unknown")
                    ),
                    provider_code: raw.code,
                    retryable: false,
                })
            }
        }
    }

    /// Active status query. Transport errors are deliberately mapped to a
    /// failed outcome: an unverifiable payment is never credited.
    async fn check_status(&self, merchant_transaction_id: &str) -> PaymentResult<StatusResult> {
        if !self.config.is_configured() {
            return Ok(StatusResult {
                outcome: PaymentOutcome::Failed,
                provider_transaction_id: None,
            });
        }

        let path = format!(
            "/pg/v1/status/{}/{}",
            self.config.merchant_id, merchant_transaction_id
        );
        let checksum = self.status_checksum(&path);

        let response: Result<PhonepeStatusResponse, PaymentError> = self
            .http
            .request_json(
                reqwest::Method::GET,
                &format!("{}{}", self.config.base_url, path),
                None,
                &[
                    ("Content-Type", "application/json"),
                    ("X-VERIFY", &checksum),
                    ("X-MERCHANT-ID", &self.config.merchant_id),
                ],
            )
            .await;

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    merchant_transaction_id = %merchant_transaction_id,
                    error = %e,
                    "phonepe status check failed"
                );
                return Ok(StatusResult {
                    outcome: PaymentOutcome::Failed,
                    provider_transaction_id: None,
                });
            }
        };

        let code = raw
            .code
            .clone()
            .or_else(|| raw.data.as_ref().and_then(|d| d.response_code.clone()))
            .or_else(|| raw.data.as_ref().and_then(|d| d.state.clone()))
            .unwrap_or_default();
        let provider_transaction_id = raw.data.as_ref().and_then(|d| d.transaction_id.clone());

        let outcome = match code.as_str() {
            "SUCCESS" => PaymentOutcome::Success,
            "PENDING" => PaymentOutcome::Pending,
            _ => PaymentOutcome::Failed,
        };

        Ok(StatusResult {
            outcome,
            provider_transaction_id,
        })
    }

    fn name(&self) -> ProviderName {
        ProviderName::Phonepe
    }

    /// PhonePe callbacks carry no verifiable signature; callers must resolve
    /// the real outcome through `check_status`.
    fn verify_webhook(
        &self,
        _payload: &[u8],
        _signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        Ok(WebhookVerificationResult {
            valid: false,
            reason: Some(
                "phonepe callbacks are unsigned; outcome must come from a status query"
                    .to_string(),
            ),
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let raw: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;
        let callback: PhonepeCallback =
            serde_json::from_value(raw.clone()).map_err(|e| {
                PaymentError::WebhookVerificationError {
                    message: format!("unrecognized phonepe callback shape: {}", e),
                }
            })?;

        let claimed_success = callback
            .code
            .as_deref()
            .or(callback.state.as_deref())
            .map(|c| c == "SUCCESS")
            .unwrap_or(callback.success.unwrap_or(false));

        Ok(WebhookEvent {
            provider: ProviderName::Phonepe,
            transaction_id: callback.merchant_transaction_id.clone(),
            user_id: callback.merchant_user_id,
            payment_id: callback.transaction_id,
            order_id: callback.merchant_transaction_id,
            // Claimed outcome only; the processor re-resolves via check_status
            outcome: Some(if claimed_success {
                PaymentOutcome::Success
            } else {
                PaymentOutcome::Failed
            }),
            payload: raw,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Callback body fields PhonePe sends to the webhook/redirect endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonepeCallback {
    #[serde(default)]
    pub merchant_transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub merchant_user_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PhonepePayResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    data: Option<PhonepePayData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhonepePayData {
    #[serde(default)]
    instrument_response: Option<PhonepeInstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhonepeInstrumentResponse {
    #[serde(default)]
    redirect_info: Option<PhonepeRedirectInfo>,
}

#[derive(Debug, Deserialize)]
struct PhonepeRedirectInfo {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PhonepeStatusResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    data: Option<PhonepeStatusData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhonepeStatusData {
    #[serde(default)]
    response_code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> PhonepeGateway {
        PhonepeGateway::new(PhonepeConfig {
            merchant_id: "MERCHANTTEST".to_string(),
            salt_key: "salt-key-test".to_string(),
            salt_index: "1".to_string(),
            base_url: "https://api-preprod.phonepe.com/apis/pg-sandbox".to_string(),
            callback_url: "http://localhost:8000/api/v1/payments/webhook".to_string(),
            redirect_url: "http://localhost:8000/api/v1/payments/phonepe/redirect".to_string(),
            timeout_secs: 5,
            max_retries: 1,
        })
        .expect("gateway init should succeed")
    }

    #[test]
    fn pay_checksum_appends_salt_index() {
        let gateway = gateway();
        let checksum = gateway.pay_checksum("cGF5bG9hZA==", "/pg/v1/pay");
        assert!(checksum.ends_with("###1"));
        assert_eq!(checksum.len(), 64 + 4);
    }

    #[test]
    fn status_checksum_hashes_path_and_salt() {
        let gateway = gateway();
        let path = "/pg/v1/status/MERCHANTTEST/tx_1";
        let expected = format!(
            "{}###1",
            sha256_hex(format!("{}salt-key-test", path).as_bytes())
        );
        assert_eq!(gateway.status_checksum(path), expected);
    }

    #[test]
    fn webhook_verification_always_fails_closed() {
        let gateway = gateway();
        let result = gateway
            .verify_webhook(br#"{"code":"SUCCESS"}"#, "")
            .expect("verification should not error");
        assert!(!result.valid);
    }

    #[test]
    fn parse_webhook_extracts_merchant_transaction_id() {
        let gateway = gateway();
        let payload = br#"{"merchantTransactionId":"tx_1","transactionId":"pp_9","code":"SUCCESS","merchantUserId":"u_1"}"#;
        let event = gateway
            .parse_webhook_event(payload)
            .expect("parse should succeed");
        assert_eq!(event.transaction_id.as_deref(), Some("tx_1"));
        assert_eq!(event.payment_id.as_deref(), Some("pp_9"));
        assert_eq!(event.outcome, Some(PaymentOutcome::Success));
    }
}
