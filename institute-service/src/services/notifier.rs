use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::config::SmsConfig;

#[derive(Debug, Clone)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not enabled: {0}")]
    NotEnabled(String),
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub provider_id: Option<String>,
}

impl ProviderResponse {
    pub fn success(provider_id: Option<String>) -> Self {
        Self { provider_id }
    }
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send(&self, sms: &SmsMessage) -> Result<ProviderResponse, ProviderError>;
    fn is_enabled(&self) -> bool;
}

/// Transactional SMS gateway provider.
pub struct GatewaySmsProvider {
    config: SmsConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GatewayRequest {
    sender: String,
    route: String,
    country: String,
    sms: Vec<GatewaySms>,
}

#[derive(Debug, Serialize)]
struct GatewaySms {
    message: String,
    to: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(rename = "type")]
    response_type: String,
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

impl GatewaySmsProvider {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SmsProvider for GatewaySmsProvider {
    async fn send(&self, sms: &SmsMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "SMS gateway provider is not enabled".to_string(),
            ));
        }

        // Normalize phone number (remove non-digits except leading +)
        let normalized_phone = sms
            .to
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect::<String>();

        if normalized_phone.is_empty() {
            return Err(ProviderError::InvalidRecipient(
                "Phone number is empty".to_string(),
            ));
        }

        let request = GatewayRequest {
            sender: self.config.sender_id.clone(),
            route: "4".to_string(),    // Transactional route
            country: "91".to_string(), // Default to India, can be made configurable
            sms: vec![GatewaySms {
                message: sms.body.clone(),
                to: vec![normalized_phone],
            }],
        };

        let response = self
            .client
            .post(&self.config.gateway_url)
            .header("authkey", self.config.auth_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to connect to SMS gateway: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SendFailed(format!(
                "SMS gateway returned error status {}: {}",
                status, body
            )));
        }

        let gateway_response: GatewayResponse = response.json().await.map_err(|e| {
            ProviderError::SendFailed(format!("Failed to parse gateway response: {}", e))
        })?;

        if gateway_response.response_type != "success" {
            return Err(ProviderError::SendFailed(format!(
                "SMS gateway error: {}",
                gateway_response.message
            )));
        }

        tracing::info!(to = %sms.to, "SMS sent via gateway");

        Ok(ProviderResponse::success(gateway_response.request_id))
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mock SMS provider for testing
pub struct MockSmsProvider {
    enabled: bool,
    send_count: AtomicU64,
}

impl MockSmsProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsProvider for MockSmsProvider {
    async fn send(&self, sms: &SmsMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock SMS provider is not enabled".to_string(),
            ));
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            to = %sms.to,
            body_length = %sms.body.len(),
            "[MOCK] SMS would be sent"
        );

        Ok(ProviderResponse::success(Some(format!(
            "mock-sms-{}",
            self.send_count.load(Ordering::SeqCst)
        ))))
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Fire-and-forget notification dispatch.
///
/// Ledger and registration operations must never fail because a message
/// could not be delivered: sends run on a detached task and failures are
/// logged and suppressed. Duplicate recipients are collapsed before
/// sending.
#[derive(Clone)]
pub struct NotificationDispatcher {
    provider: Arc<dyn SmsProvider>,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn SmsProvider>) -> Self {
        Self { provider }
    }

    pub fn dispatch(&self, recipients: Vec<String>, body: String) {
        let recipients = dedupe_recipients(recipients);
        if recipients.is_empty() {
            return;
        }

        let provider = self.provider.clone();
        tokio::spawn(async move {
            for to in recipients {
                let sms = SmsMessage {
                    to: to.clone(),
                    body: body.clone(),
                };
                match provider.send(&sms).await {
                    Ok(response) => {
                        tracing::info!(
                            to = %to,
                            provider_id = ?response.provider_id,
                            "notification dispatched"
                        );
                    }
                    Err(ProviderError::NotEnabled(msg)) => {
                        tracing::debug!(to = %to, "notification skipped: {}", msg);
                    }
                    Err(e) => {
                        tracing::warn!(to = %to, error = %e, "notification dispatch failed");
                    }
                }
            }
        });
    }
}

fn dedupe_recipients(recipients: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    recipients
        .into_iter()
        .filter(|r| !r.trim().is_empty())
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

/// Transactional payment confirmation sent for every receipt.
pub fn payment_message(
    student_name: &str,
    amount: f64,
    purpose: &str,
    receipt_no: &str,
    enrollment_no: Option<&str>,
) -> String {
    match enrollment_no {
        Some(enrollment) => format!(
            "Dear {}, we have received Rs. {:.2} towards {}. Receipt No: {}. Enrollment No: {}.",
            student_name, amount, purpose, receipt_no, enrollment
        ),
        None => format!(
            "Dear {}, we have received Rs. {:.2} towards {}. Receipt No: {}.",
            student_name, amount, purpose, receipt_no
        ),
    }
}

/// Welcome message sent once, when admission completes.
pub fn welcome_message(
    student_name: &str,
    course_name: &str,
    batch_window: Option<(&str, &str)>,
) -> String {
    match batch_window {
        Some((start, end)) => format!(
            "Welcome {}! Your admission to {} is confirmed. Your batch runs {} to {}.",
            student_name, course_name, start, end
        ),
        None => format!(
            "Welcome {}! Your admission to {} is confirmed.",
            student_name, course_name
        ),
    }
}

/// Account-created notice. The password is never put in a message body;
/// students set it through the reset flow.
pub fn credentials_message(student_name: &str, username: &str) -> String {
    format!(
        "Dear {}, your student portal account is ready. Username: {}. Use the password reset option on the portal to set your password.",
        student_name, username
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_counts_sends() {
        let provider = MockSmsProvider::new(true);
        let sms = SmsMessage {
            to: "9876543210".to_string(),
            body: "hello".to_string(),
        };

        provider.send(&sms).await.unwrap();
        let response = provider.send(&sms).await.unwrap();

        assert_eq!(provider.send_count(), 2);
        assert_eq!(response.provider_id.as_deref(), Some("mock-sms-2"));
    }

    #[tokio::test]
    async fn disabled_mock_provider_refuses() {
        let provider = MockSmsProvider::new(false);
        let sms = SmsMessage {
            to: "9876543210".to_string(),
            body: "hello".to_string(),
        };

        let err = provider.send(&sms).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotEnabled(_)));
        assert_eq!(provider.send_count(), 0);
    }

    #[test]
    fn recipients_are_deduplicated_in_order() {
        let deduped = dedupe_recipients(vec![
            "111".to_string(),
            "222".to_string(),
            "111".to_string(),
            "".to_string(),
            "333".to_string(),
        ]);
        assert_eq!(deduped, vec!["111", "222", "333"]);
    }

    #[test]
    fn payment_message_includes_enrollment_when_assigned() {
        let msg = payment_message("Asha", 2000.0, "Admission", "41", Some("7"));
        assert!(msg.contains("Rs. 2000.00"));
        assert!(msg.contains("Receipt No: 41"));
        assert!(msg.contains("Enrollment No: 7"));

        let msg = payment_message("Asha", 500.0, "Installment 2", "42", None);
        assert!(!msg.contains("Enrollment"));
    }

    #[test]
    fn credentials_message_never_contains_a_password() {
        let msg = credentials_message("Asha", "12-MN");
        assert!(msg.contains("12-MN"));
        assert!(!msg.to_lowercase().contains("password:"));
    }
}
