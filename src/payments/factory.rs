use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentGateway;
use crate::payments::providers::{
    MockGateway, PhonepeConfig, PhonepeGateway, RazorpayGateway, StripeGateway,
};
use crate::payments::types::{OrderRequest, PaymentOrder, ProviderName};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PaymentFactoryConfig {
    /// Provider used for new checkout orders
    pub checkout_provider: ProviderName,
    /// When true, a failed order-creation call falls back to a mock order
    /// instead of surfacing ProviderUnavailable. Development-only behavior;
    /// defaults to off so real outages are not masked.
    pub degrade_to_mock: bool,
}

impl PaymentFactoryConfig {
    pub fn from_env() -> PaymentResult<Self> {
        let checkout_provider =
            std::env::var("CHECKOUT_PAYMENT_PROVIDER").unwrap_or_else(|_| "phonepe".to_string());
        let checkout_provider = ProviderName::from_str(&checkout_provider)?;

        let degrade_to_mock = std::env::var("PAYMENT_DEGRADE_TO_MOCK")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            checkout_provider,
            degrade_to_mock,
        })
    }
}

/// Holds one instance of every gateway and owns the checkout-order policy.
pub struct PaymentGatewayFactory {
    config: PaymentFactoryConfig,
    phonepe: Option<Arc<PhonepeGateway>>,
    razorpay: Arc<RazorpayGateway>,
    stripe: Arc<StripeGateway>,
    mock: Arc<MockGateway>,
}

impl PaymentGatewayFactory {
    pub fn from_env() -> PaymentResult<Self> {
        let phonepe = match PhonepeConfig::from_env() {
            Ok(config) => Some(Arc::new(PhonepeGateway::new(config)?)),
            Err(_) => {
                warn!("phonepe credentials not configured; checkout degrades to mock orders");
                None
            }
        };

        Ok(Self {
            config: PaymentFactoryConfig::from_env()?,
            phonepe,
            razorpay: Arc::new(RazorpayGateway::from_env()),
            stripe: Arc::new(StripeGateway::from_env()),
            mock: Arc::new(MockGateway),
        })
    }

    pub fn with_parts(
        config: PaymentFactoryConfig,
        phonepe: Option<Arc<PhonepeGateway>>,
        razorpay: Arc<RazorpayGateway>,
        stripe: Arc<StripeGateway>,
    ) -> Self {
        Self {
            config,
            phonepe,
            razorpay,
            stripe,
            mock: Arc::new(MockGateway),
        }
    }

    pub fn get_gateway(&self, provider: ProviderName) -> PaymentResult<Arc<dyn PaymentGateway>> {
        match provider {
            ProviderName::Phonepe => self
                .phonepe
                .clone()
                .map(|g| g as Arc<dyn PaymentGateway>)
                .ok_or(PaymentError::ValidationError {
                    message: "phonepe is not configured".to_string(),
                    field: Some("provider".to_string()),
                }),
            ProviderName::Razorpay => Ok(self.razorpay.clone()),
            ProviderName::Stripe => Ok(self.stripe.clone()),
            ProviderName::Mock => Ok(self.mock.clone()),
        }
    }

    /// Create a checkout order through the configured provider.
    ///
    /// Missing credentials always produce a mock order (pure dev setup).
    /// A provider FAILURE propagates as ProviderUnavailable unless
    /// degrade_to_mock opted into the legacy fallback.
    pub async fn create_checkout_order(
        &self,
        request: OrderRequest,
    ) -> PaymentResult<PaymentOrder> {
        let gateway = match self.config.checkout_provider.clone() {
            ProviderName::Phonepe => match &self.phonepe {
                Some(gateway) => gateway.clone() as Arc<dyn PaymentGateway>,
                None => {
                    warn!("phonepe not configured, returning mock order");
                    return Ok(MockGateway::order_for(&request));
                }
            },
            ProviderName::Mock => return Ok(MockGateway::order_for(&request)),
            other => self.get_gateway(other)?,
        };

        match gateway.create_order(request.clone()).await {
            Ok(order) => Ok(order),
            Err(e) if self.config.degrade_to_mock => {
                warn!(error = %e, "order creation failed, degrading to mock order");
                Ok(MockGateway::order_for(&request))
            }
            Err(e) => Err(PaymentError::ProviderUnavailable {
                provider: gateway.name().to_string(),
                message: e.to_string(),
            }),
        }
    }
}
