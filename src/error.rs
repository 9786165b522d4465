//! Comprehensive error handling for the Aurovest backend
//!
//! This module provides a unified error system with proper HTTP status mapping,
//! user-friendly messages, and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic client handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "INVALID_AMOUNT")]
    InvalidAmount,
    #[serde(rename = "BELOW_MINIMUM_BUY")]
    BelowMinimumBuy,
    #[serde(rename = "TRANSACTION_NOT_FOUND")]
    TransactionNotFound,
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound,
    #[serde(rename = "PLAN_NOT_FOUND")]
    PlanNotFound,
    #[serde(rename = "MAINTENANCE_MODE")]
    MaintenanceMode,

    // Auth errors (401/403)
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,

    // Infrastructure errors (5xx)
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 503, 504)
    #[serde(rename = "PAYMENT_PROVIDER_ERROR")]
    PaymentProviderError,
    #[serde(rename = "PAYMENT_PROVIDER_UNAVAILABLE")]
    PaymentProviderUnavailable,
    #[serde(rename = "WEBHOOK_VERIFICATION_ERROR")]
    WebhookVerificationError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Domain-specific business logic errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// Buy amount is zero or negative
    InvalidAmount { amount: String, reason: String },
    /// Buy amount is below the configured platform minimum
    BelowMinimumBuy { minimum: String },
    /// Transaction with given ID doesn't exist
    TransactionNotFound { transaction_id: String },
    /// User doesn't exist in the system
    UserNotFound { user_id: String },
    /// SIP plan or auto-dip rule doesn't exist for this user
    PlanNotFound { plan_id: String },
    /// Platform is in maintenance mode; buys are disabled
    MaintenanceMode,
}

/// Authentication/authorization errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No usable identity was supplied by the auth gateway
    Unauthorized { reason: String },
    /// Identity is valid but lacks the required role
    Forbidden { required_role: String },
}

/// Infrastructure-level errors (database, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Database connection or query failure
    Database { message: String, is_retryable: bool },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (payment providers)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Payment provider (PhonePe, Razorpay, Stripe) error
    PaymentProvider {
        provider: String,
        message: String,
        is_retryable: bool,
    },
    /// Provider could not be reached or refused the order outright
    ProviderUnavailable { provider: String, message: String },
    /// Webhook carried an invalid or missing signature
    WebhookVerification { message: String },
    /// External service timeout
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Invalid amount (format or value)
    InvalidAmount { amount: String, reason: String },
    /// Required field missing
    MissingField { field: String },
    /// Field value out of acceptable range
    OutOfRange {
        field: String,
        min: Option<String>,
        max: Option<String>,
    },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Auth(AuthError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::InvalidAmount { .. } => 400,
                DomainError::BelowMinimumBuy { .. } => 400,
                DomainError::TransactionNotFound { .. } => 404,
                DomainError::UserNotFound { .. } => 404,
                DomainError::PlanNotFound { .. } => 404,
                DomainError::MaintenanceMode => 503,
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::Unauthorized { .. } => 401,
                AuthError::Forbidden { .. } => 403,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => 502,
                ExternalError::ProviderUnavailable { .. } => 503,
                ExternalError::WebhookVerification { .. } => 400,
                ExternalError::Timeout { .. } => 504,
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
                DomainError::BelowMinimumBuy { .. } => ErrorCode::BelowMinimumBuy,
                DomainError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
                DomainError::UserNotFound { .. } => ErrorCode::UserNotFound,
                DomainError::PlanNotFound { .. } => ErrorCode::PlanNotFound,
                DomainError::MaintenanceMode => ErrorCode::MaintenanceMode,
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::Unauthorized { .. } => ErrorCode::Unauthorized,
                AuthError::Forbidden { .. } => ErrorCode::Forbidden,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => ErrorCode::PaymentProviderError,
                ExternalError::ProviderUnavailable { .. } => {
                    ErrorCode::PaymentProviderUnavailable
                }
                ExternalError::WebhookVerification { .. } => ErrorCode::WebhookVerificationError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                DomainError::BelowMinimumBuy { minimum } => {
                    format!("Minimum purchase amount is ₹{}", minimum)
                }
                DomainError::TransactionNotFound { transaction_id } => {
                    format!("Transaction '{}' not found", transaction_id)
                }
                DomainError::UserNotFound { user_id } => {
                    format!("User '{}' not found", user_id)
                }
                DomainError::PlanNotFound { plan_id } => {
                    format!("Plan '{}' not found", plan_id)
                }
                DomainError::MaintenanceMode => {
                    "Platform is under maintenance. Please try again later".to_string()
                }
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::Unauthorized { reason } => {
                    format!("Authentication required: {}", reason)
                }
                AuthError::Forbidden { required_role } => {
                    format!("This operation requires the '{}' role", required_role)
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider {
                    provider,
                    is_retryable,
                    ..
                } => {
                    if *is_retryable {
                        format!(
                            "Payment provider ({}) is temporarily unavailable. Please try again",
                            provider
                        )
                    } else {
                        "Payment processing failed. Please contact support".to_string()
                    }
                }
                ExternalError::ProviderUnavailable { provider, .. } => {
                    format!(
                        "Payment provider ({}) could not create the order. Please try again",
                        provider
                    )
                }
                ExternalError::WebhookVerification { message } => {
                    format!("Webhook verification failed: {}", message)
                }
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => {
                    format!(
                        "{} request timed out after {} seconds. Please try again",
                        service, timeout_secs
                    )
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::OutOfRange { field, min, max } => match (min, max) {
                    (Some(min), Some(max)) => {
                        format!("Field '{}' must be between {} and {}", field, min, max)
                    }
                    (Some(min), None) => {
                        format!("Field '{}' must be at least {}", field, min)
                    }
                    (None, Some(max)) => {
                        format!("Field '{}' must be at most {}", field, max)
                    }
                    (None, None) => {
                        format!("Field '{}' is out of acceptable range", field)
                    }
                },
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Auth(_) => false,
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { is_retryable, .. } => *is_retryable,
                ExternalError::ProviderUnavailable { .. } => true,
                ExternalError::WebhookVerification { .. } => false,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// Conversions from specific error types
// Note: From<DatabaseError> is implemented in database/error.rs to avoid circular dependency

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_minimum_error() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::BelowMinimumBuy {
            minimum: "10".to_string(),
        }));

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::BelowMinimumBuy);
        assert!(error.user_message().contains("₹10"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_provider_unavailable_error() {
        let error = AppError::new(AppErrorKind::External(ExternalError::ProviderUnavailable {
            provider: "phonepe".to_string(),
            message: "connection refused".to_string(),
        }));

        assert_eq!(error.status_code(), 503);
        assert_eq!(error.error_code(), ErrorCode::PaymentProviderUnavailable);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_webhook_verification_error() {
        let error = AppError::new(AppErrorKind::External(ExternalError::WebhookVerification {
            message: "invalid signature".to_string(),
        }));

        assert_eq!(error.status_code(), 400);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_auth_errors() {
        let unauthorized = AppError::new(AppErrorKind::Auth(AuthError::Unauthorized {
            reason: "missing x-user-id header".to_string(),
        }));
        assert_eq!(unauthorized.status_code(), 401);

        let forbidden = AppError::new(AppErrorKind::Auth(AuthError::Forbidden {
            required_role: "admin".to_string(),
        }));
        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(forbidden.error_code(), ErrorCode::Forbidden);
    }

    #[test]
    fn test_validation_error() {
        let error = AppError::new(AppErrorKind::Validation(ValidationError::InvalidAmount {
            amount: "-100".to_string(),
            reason: "Amount cannot be negative".to_string(),
        }));

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::ValidationError);
        assert!(!error.is_retryable());
    }
}
