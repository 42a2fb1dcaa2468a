// ==========================================
// mHealth Barangay San Cristobal - SMS Gateway Client
// ==========================================
// Sends the welcome SMS through the iprog gateway. The gateway takes
// its parameters in the query string and reports failures inside a 200
// response body, so both layers are checked.
// ==========================================

use crate::domain::Contact;
use crate::notify::notifier::{NotificationError, Notifier};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://sms.iprogtech.com/api/v1/sms_messages";

pub struct SmsGatewayClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl SmsGatewayClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self::with_base_url(api_token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint; tests use this.
    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

/// The gateway wants `63XXXXXXXXXX` without the plus. A stray local
/// trunk zero is replaced as well.
fn gateway_phone(canonical: &str) -> String {
    let digits = canonical.trim_start_matches('+');
    if let Some(rest) = digits.strip_prefix('0') {
        format!("63{}", rest)
    } else {
        digits.to_string()
    }
}

fn welcome_message(display_name: &str, phone: &str) -> String {
    let date = Utc::now().format("%B %-d, %Y");
    format!(
        "MHealth: Your account has been created on {}. Welcome to MHealth, {}! \
         You can login using your mobile number {}. If you have any questions, \
         please contact our support team.",
        date, display_name, phone
    )
}

#[async_trait]
impl Notifier for SmsGatewayClient {
    async fn notify(&self, contact: &Contact) -> Result<(), NotificationError> {
        let phone = gateway_phone(&contact.phone);
        let message = welcome_message(&contact.display_name, &contact.phone);

        debug!(phone = %phone, "sending welcome sms");
        let response = self
            .http
            .post(&self.base_url)
            .query(&[
                ("api_token", self.api_token.as_str()),
                ("message", message.as_str()),
                ("phone_number", phone.as_str()),
                ("sms_provider", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotificationError::Transport(format!(
                "http status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        if body.get("status").and_then(Value::as_i64) != Some(200) {
            let reason = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown gateway error");
            return Err(NotificationError::Rejected(reason.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_phone_strips_plus() {
        assert_eq!(gateway_phone("+639171234567"), "639171234567");
        assert_eq!(gateway_phone("639171234567"), "639171234567");
        assert_eq!(gateway_phone("09171234567"), "639171234567");
    }

    #[test]
    fn test_welcome_message_mentions_name_and_number() {
        let message = welcome_message("Maria", "+639171234567");
        assert!(message.starts_with("MHealth: Your account has been created on"));
        assert!(message.contains("Welcome to MHealth, Maria!"));
        assert!(message.contains("+639171234567"));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        let client = SmsGatewayClient::with_base_url("token", "http://127.0.0.1:1/sms");
        let contact = Contact {
            phone: "+639171234567".to_string(),
            display_name: "Maria".to_string(),
        };
        let err = client.notify(&contact).await.unwrap_err();
        assert!(matches!(err, NotificationError::Transport(_)));
    }
}
