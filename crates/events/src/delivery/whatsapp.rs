//! WhatsApp delivery through a Fonnte-compatible gateway.

use std::time::Duration;

use async_trait::async_trait;
use rfs_core::phone::normalize_phone;
use serde::{Deserialize, Serialize};

use super::DeliveryResult;

/// Public Fonnte send endpoint.
pub const DEFAULT_API_URL: &str = "https://api.fonnte.com/send";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for gateway calls. Never escapes [`WhatsAppApi`].
#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Fonnte API error: HTTP {0}")]
    HttpStatus(u16),

    /// The gateway answered with a falsy `status`.
    #[error("{0}")]
    Api(String),

    #[error("invalid phone number '{0}'")]
    InvalidPhone(String),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SendBody<'a> {
    target: &'a str,
    message: &'a str,
    #[serde(rename = "countryCode")]
    country_code: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    status: serde_json::Value,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    id: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Sends plain WhatsApp text (`*bold*` markup) to one phone number.
#[async_trait]
pub trait WhatsAppApi: Send + Sync {
    async fn send(&self, phone: &str, text: &str) -> DeliveryResult;
}

// ---------------------------------------------------------------------------
// FonnteClient
// ---------------------------------------------------------------------------

pub struct FonnteClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    country_code: String,
}

impl FonnteClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        country_code: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WhatsAppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
            country_code: country_code.into(),
        })
    }

    async fn try_send(&self, phone: &str, text: &str) -> Result<Option<String>, WhatsAppError> {
        let target = normalize_phone(phone, &self.country_code)
            .ok_or_else(|| WhatsAppError::InvalidPhone(phone.to_string()))?;

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", &self.token)
            .json(&SendBody {
                target: &target,
                message: text,
                country_code: &self.country_code,
            })
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(status, &body)
    }
}

#[async_trait]
impl WhatsAppApi for FonnteClient {
    async fn send(&self, phone: &str, text: &str) -> DeliveryResult {
        let result = DeliveryResult::from(self.try_send(phone, text).await);
        if let Some(error) = &result.error {
            tracing::warn!(phone, error = %error, "WhatsApp send failed");
        }
        result
    }
}

/// Map a gateway response to a message id or error.
fn interpret_response(status: u16, body: &str) -> Result<Option<String>, WhatsAppError> {
    let parsed = match serde_json::from_str::<SendResponse>(body) {
        Ok(parsed) => parsed,
        Err(_) => return Err(WhatsAppError::HttpStatus(status)),
    };

    if !(200..300).contains(&status) || !is_truthy(&parsed.status) {
        return Err(match parsed.reason {
            Some(reason) => WhatsAppError::Api(reason),
            None => WhatsAppError::HttpStatus(status),
        });
    }

    // Fonnte returns `id` as an array with one entry per target.
    let id = match &parsed.id {
        serde_json::Value::Array(ids) => ids.first().cloned(),
        serde_json::Value::Null => None,
        other => Some(other.clone()),
    };
    Ok(id.map(|v| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }))
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn truthy_status_is_success() {
        let body = r#"{"status":true,"detail":"success! message in queue","id":["80367170"]}"#;
        assert_eq!(interpret_response(200, body).unwrap(), Some("80367170".into()));
    }

    #[test]
    fn numeric_id_is_stringified() {
        let body = r#"{"status":true,"id":[80367170]}"#;
        assert_eq!(interpret_response(200, body).unwrap(), Some("80367170".into()));
    }

    #[test]
    fn falsy_status_carries_reason() {
        let body = r#"{"status":false,"reason":"invalid token"}"#;
        assert_matches!(
            interpret_response(200, body),
            Err(WhatsAppError::Api(r)) if r == "invalid token"
        );
    }

    #[test]
    fn error_status_without_reason() {
        assert_matches!(interpret_response(500, "{}"), Err(WhatsAppError::HttpStatus(500)));
        assert_matches!(interpret_response(503, "oops"), Err(WhatsAppError::HttpStatus(503)));
    }

    #[test]
    fn body_uses_gateway_field_names() {
        let body = SendBody {
            target: "6281234567890",
            message: "*hi*",
            country_code: "62",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["target"], "6281234567890");
        assert_eq!(json["countryCode"], "62");
    }

    #[tokio::test]
    async fn unusable_phone_fails_without_request() {
        let client = FonnteClient::new(
            "http://127.0.0.1:9/send",
            "token",
            "62",
            Duration::from_millis(200),
        )
        .unwrap();
        let result = client.send("n/a", "hello").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("invalid phone number 'n/a'"));
    }
}
