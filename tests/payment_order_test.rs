use aurovest_backend::payments::factory::{PaymentFactoryConfig, PaymentGatewayFactory};
use aurovest_backend::payments::providers::{
    RazorpayConfig, RazorpayGateway, StripeConfig, StripeGateway,
};
use aurovest_backend::payments::types::{OrderDescriptor, OrderRequest, ProviderName};
use std::sync::Arc;

fn factory() -> PaymentGatewayFactory {
    PaymentGatewayFactory::with_parts(
        PaymentFactoryConfig {
            checkout_provider: ProviderName::Phonepe,
            degrade_to_mock: false,
        },
        // No PhonePe credentials configured
        None,
        Arc::new(RazorpayGateway::new(RazorpayConfig {
            webhook_secret: Some("secret".to_string()),
        })),
        Arc::new(StripeGateway::new(StripeConfig {
            webhook_secret: Some("whsec".to_string()),
            signature_tolerance_secs: 300,
        })),
    )
}

fn order_request() -> OrderRequest {
    OrderRequest {
        amount_minor: 101530,
        currency: "INR".to_string(),
        transaction_id: "7e2f6f72-52f0-4b5e-8f0a-3f1a2b3c4d5e".to_string(),
        user_id: "u_1".to_string(),
    }
}

#[tokio::test]
async fn missing_credentials_degrade_checkout_to_mock_order() {
    let order = factory()
        .create_checkout_order(order_request())
        .await
        .expect("mock fallback should succeed");

    assert_eq!(order.provider, ProviderName::Mock);
    match order.order {
        OrderDescriptor::Mock {
            id,
            amount,
            currency,
        } => {
            assert!(id.starts_with("mock_"));
            assert_eq!(amount, 101530);
            assert_eq!(currency, "INR");
        }
        other => panic!("expected mock order, got {:?}", other),
    }
}

#[tokio::test]
async fn mock_checkout_provider_always_produces_mock_orders() {
    let factory = PaymentGatewayFactory::with_parts(
        PaymentFactoryConfig {
            checkout_provider: ProviderName::Mock,
            degrade_to_mock: false,
        },
        None,
        Arc::new(RazorpayGateway::new(RazorpayConfig {
            webhook_secret: None,
        })),
        Arc::new(StripeGateway::new(StripeConfig {
            webhook_secret: None,
            signature_tolerance_secs: 300,
        })),
    );

    let order = factory
        .create_checkout_order(order_request())
        .await
        .expect("mock order should succeed");
    assert!(order.is_mock());
}

#[test]
fn phonepe_gateway_is_absent_when_unconfigured() {
    let factory = factory();
    assert!(factory.get_gateway(ProviderName::Phonepe).is_err());
    assert!(factory.get_gateway(ProviderName::Razorpay).is_ok());
    assert!(factory.get_gateway(ProviderName::Stripe).is_ok());
    assert!(factory.get_gateway(ProviderName::Mock).is_ok());
}

#[test]
fn order_response_serializes_like_the_public_api() {
    let order = aurovest_backend::payments::types::PaymentOrder {
        provider: ProviderName::Phonepe,
        order: OrderDescriptor::Redirect {
            redirect_url: "https://mercury.phonepe.com/transact/pg?token=abc".to_string(),
            merchant_transaction_id: "7e2f6f72-52f0-4b5e-8f0a-3f1a2b3c4d5e".to_string(),
        },
    };
    let json = serde_json::to_value(&order).expect("serialize");
    assert_eq!(json["provider"], "phonepe");
    assert_eq!(
        json["order"]["merchantTransactionId"],
        "7e2f6f72-52f0-4b5e-8f0a-3f1a2b3c4d5e"
    );
    assert!(json["order"]["redirectUrl"]
        .as_str()
        .expect("redirect url")
        .starts_with("https://"));
}
