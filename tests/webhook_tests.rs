use aurovest_backend::payments::provider::PaymentGateway;
use aurovest_backend::payments::providers::{
    RazorpayConfig, RazorpayGateway, StripeConfig, StripeGateway,
};
use aurovest_backend::payments::types::PaymentOutcome;
use aurovest_backend::payments::utils::hmac_sha256_hex;
use aurovest_backend::services::webhook_processor::{
    classify_webhook, WebhookSource, RAZORPAY_SIGNATURE_HEADER, STRIPE_SIGNATURE_HEADER,
};
use http::{HeaderMap, HeaderValue};
use serde_json::json;

#[test]
fn classification_prefers_signature_headers_over_body_fields() {
    let mut headers = HeaderMap::new();
    headers.insert(
        STRIPE_SIGNATURE_HEADER,
        HeaderValue::from_static("t=1,v1=aa"),
    );
    // Body looks like a PhonePe callback, but the header decides
    let payload = json!({ "merchantTransactionId": "tx_1", "code": "SUCCESS" });
    assert!(matches!(
        classify_webhook(&headers, &payload),
        WebhookSource::Stripe { .. }
    ));
}

#[test]
fn classification_recognizes_each_source() {
    let empty = HeaderMap::new();

    let mut razorpay = HeaderMap::new();
    razorpay.insert(RAZORPAY_SIGNATURE_HEADER, HeaderValue::from_static("sig"));
    assert!(matches!(
        classify_webhook(&razorpay, &json!({})),
        WebhookSource::Razorpay { .. }
    ));

    assert_eq!(
        classify_webhook(&empty, &json!({ "merchantTransactionId": "tx_1" })),
        WebhookSource::Phonepe
    );
    assert_eq!(
        classify_webhook(&empty, &json!({ "code": "PAYMENT_PENDING" })),
        WebhookSource::Phonepe
    );
    assert_eq!(
        classify_webhook(&empty, &json!({ "txId": "tx_1", "status": "success" })),
        WebhookSource::Dev
    );
}

#[test]
fn razorpay_round_trip_verification_and_parse() {
    let gateway = RazorpayGateway::new(RazorpayConfig {
        webhook_secret: Some("rzp_secret".to_string()),
    });

    let payload = serde_json::to_vec(&json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_123",
                    "order_id": "order_456",
                    "status": "captured",
                    "notes": { "txId": "e4f9b570-9fd1-43c7-a65a-0b8bbe45f9a1", "userId": "u_1" }
                }
            }
        }
    }))
    .expect("payload");

    let signature = hmac_sha256_hex(&payload, "rzp_secret");
    let verification = gateway
        .verify_webhook(&payload, &signature)
        .expect("verification should not error");
    assert!(verification.valid);

    let tampered = gateway
        .verify_webhook(b"{\"different\":true}", &signature)
        .expect("verification should not error");
    assert!(!tampered.valid);

    let event = gateway.parse_webhook_event(&payload).expect("parse");
    assert_eq!(
        event.transaction_id.as_deref(),
        Some("e4f9b570-9fd1-43c7-a65a-0b8bbe45f9a1")
    );
    assert_eq!(event.payment_id.as_deref(), Some("pay_123"));
    assert_eq!(event.order_id.as_deref(), Some("order_456"));
    assert_eq!(event.outcome, Some(PaymentOutcome::Success));
}

#[test]
fn stripe_signed_event_verification_and_parse() {
    let gateway = StripeGateway::new(StripeConfig {
        webhook_secret: Some("whsec_test".to_string()),
        signature_tolerance_secs: 300,
    });

    let payload = serde_json::to_vec(&json!({
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": "pi_abc",
                "status": "succeeded",
                "metadata": { "txId": "tx_42", "userId": "u_42" }
            }
        }
    }))
    .expect("payload");

    // Sign with the current timestamp so the tolerance window passes
    let timestamp = chrono::Utc::now().timestamp();
    let mut signed = format!("{}.", timestamp).into_bytes();
    signed.extend_from_slice(&payload);
    let header = format!(
        "t={},v1={}",
        timestamp,
        hmac_sha256_hex(&signed, "whsec_test")
    );

    let verification = gateway
        .verify_webhook(&payload, &header)
        .expect("verification should not error");
    assert!(verification.valid);

    let bad = gateway
        .verify_webhook(&payload, "t=1,v1=deadbeef")
        .expect("verification should not error");
    assert!(!bad.valid);

    let event = gateway.parse_webhook_event(&payload).expect("parse");
    assert_eq!(event.transaction_id.as_deref(), Some("tx_42"));
    assert_eq!(event.user_id.as_deref(), Some("u_42"));
    assert_eq!(event.outcome, Some(PaymentOutcome::Success));
}

#[test]
fn stripe_failed_intent_maps_to_failed_outcome() {
    let gateway = StripeGateway::new(StripeConfig {
        webhook_secret: Some("whsec_test".to_string()),
        signature_tolerance_secs: 300,
    });

    let payload = serde_json::to_vec(&json!({
        "type": "payment_intent.payment_failed",
        "data": {
            "object": {
                "id": "pi_failed",
                "status": "requires_payment_method",
                "metadata": { "txId": "tx_43", "userId": "u_43" }
            }
        }
    }))
    .expect("payload");

    let event = gateway.parse_webhook_event(&payload).expect("parse");
    assert_eq!(event.outcome, Some(PaymentOutcome::Failed));
}

#[test]
fn missing_webhook_secret_rejects_verification() {
    let gateway = RazorpayGateway::new(RazorpayConfig {
        webhook_secret: None,
    });
    assert!(gateway.verify_webhook(b"{}", "sig").is_err());
}
