use institute_service::config::SmsConfig;
use institute_service::services::notifier::{ProviderError, SmsMessage};
use institute_service::services::{GatewaySmsProvider, SmsProvider};
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer, enabled: bool) -> GatewaySmsProvider {
    GatewaySmsProvider::new(SmsConfig {
        gateway_url: format!("{}/flow", server.uri()),
        auth_key: Secret::new("test-auth-key".to_string()),
        sender_id: "INSTTE".to_string(),
        enabled,
    })
}

#[tokio::test]
async fn sends_through_the_gateway_with_auth_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flow"))
        .and(header("authkey", "test-auth-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "success",
            "message": "queued",
            "request_id": "req-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, true);
    let response = provider
        .send(&SmsMessage {
            to: "+91 98765-43210".to_string(),
            body: "Dear Asha, we have received Rs. 2000.00".to_string(),
        })
        .await
        .expect("send should succeed");

    assert_eq!(response.provider_id.as_deref(), Some("req-42"));
}

#[tokio::test]
async fn gateway_rejection_surfaces_as_send_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "error",
            "message": "invalid sender"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, true);
    let err = provider
        .send(&SmsMessage {
            to: "9876543210".to_string(),
            body: "hello".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::SendFailed(_)));
}

#[tokio::test]
async fn disabled_provider_never_calls_the_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server, false);
    let err = provider
        .send(&SmsMessage {
            to: "9876543210".to_string(),
            body: "hello".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NotEnabled(_)));
    assert!(!provider.is_enabled());
}

#[tokio::test]
async fn empty_recipient_is_rejected_before_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server, true);
    let err = provider
        .send(&SmsMessage {
            to: "---".to_string(),
            body: "hello".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::InvalidRecipient(_)));
}
