use crate::payments::error::PaymentError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    Phonepe,
    Razorpay,
    Stripe,
    Mock,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Phonepe => "phonepe",
            ProviderName::Razorpay => "razorpay",
            ProviderName::Stripe => "stripe",
            ProviderName::Mock => "mock",
        }
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "phonepe" => Ok(ProviderName::Phonepe),
            "razorpay" => Ok(ProviderName::Razorpay),
            "stripe" => Ok(ProviderName::Stripe),
            "mock" => Ok(ProviderName::Mock),
            _ => Err(PaymentError::ValidationError {
                message: format!("unsupported provider: {}", value),
                field: Some("provider".to_string()),
            }),
        }
    }
}

/// Outcome reported by a provider for a payment order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success,
    Failed,
    Pending,
}

/// Request to create an external payment order. Amount is in minor currency
/// units (paise for INR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub transaction_id: String,
    pub user_id: String,
}

/// Order descriptor returned to the client: either a provider-hosted
/// checkout redirect or a mock order for development.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum OrderDescriptor {
    #[serde(rename_all = "camelCase")]
    Redirect {
        redirect_url: String,
        merchant_transaction_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Mock {
        id: String,
        amount: i64,
        currency: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub provider: ProviderName,
    pub order: OrderDescriptor,
}

impl PaymentOrder {
    pub fn is_mock(&self) -> bool {
        matches!(self.provider, ProviderName::Mock)
    }
}

/// Result of a synchronous status query against a poll-based provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResult {
    pub outcome: PaymentOutcome,
    pub provider_transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookVerificationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

/// Provider-agnostic webhook parse result: everything finalization needs,
/// extracted from provider-specific shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub provider: ProviderName,
    pub transaction_id: Option<String>,
    pub user_id: Option<String>,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub outcome: Option<PaymentOutcome>,
    pub payload: JsonValue,
    pub received_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_parsing_works() {
        assert!(matches!(
            ProviderName::from_str("phonepe"),
            Ok(ProviderName::Phonepe)
        ));
        assert!(matches!(
            ProviderName::from_str("RAZORPAY"),
            Ok(ProviderName::Razorpay)
        ));
        assert!(ProviderName::from_str("unknown").is_err());
    }

    #[test]
    fn redirect_order_serializes_to_camel_case() {
        let order = PaymentOrder {
            provider: ProviderName::Phonepe,
            order: OrderDescriptor::Redirect {
                redirect_url: "https://pay.example/checkout".to_string(),
                merchant_transaction_id: "tx_1".to_string(),
            },
        };
        let json = serde_json::to_value(&order).expect("serialization should succeed");
        assert_eq!(json["provider"], "phonepe");
        assert_eq!(json["order"]["redirectUrl"], "https://pay.example/checkout");
        assert_eq!(json["order"]["merchantTransactionId"], "tx_1");
    }

    #[test]
    fn mock_order_serializes_amount_and_currency() {
        let order = PaymentOrder {
            provider: ProviderName::Mock,
            order: OrderDescriptor::Mock {
                id: "mock_1".to_string(),
                amount: 101530,
                currency: "INR".to_string(),
            },
        };
        assert!(order.is_mock());
        let json = serde_json::to_value(&order).expect("serialization should succeed");
        assert_eq!(json["order"]["amount"], 101530);
        assert_eq!(json["order"]["currency"], "INR");
    }

    #[test]
    fn payment_outcome_round_trips_snake_case() {
        let json = serde_json::to_value(PaymentOutcome::Success).expect("serialize");
        assert_eq!(json, "success");
        let parsed: PaymentOutcome =
            serde_json::from_value(serde_json::json!("failed")).expect("deserialize");
        assert_eq!(parsed, PaymentOutcome::Failed);
    }
}
