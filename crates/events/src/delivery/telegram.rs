//! Telegram Bot API adapter.
//!
//! [`TelegramClient`] posts HTML-formatted messages via `sendMessage` and
//! acknowledges button presses via `answerCallbackQuery`. It also carries the
//! wire types for inbound webhook updates.

use std::time::Duration;

use async_trait::async_trait;
use rfs_core::callback::CallbackAction;
use serde::{Deserialize, Serialize};

use super::DeliveryResult;

/// Public Bot API host.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Header Telegram sends with the webhook secret configured via `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for Bot API calls. Never escapes [`TelegramApi`].
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response without a Bot API error body.
    #[error("Telegram returned HTTP {0}")]
    HttpStatus(u16),

    /// The Bot API answered `ok: false`.
    #[error("{0}")]
    Api(String),
}

// ---------------------------------------------------------------------------
// Outbound wire types
// ---------------------------------------------------------------------------

/// One inline keyboard button: either a callback or a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(action.encode()),
            url: None,
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// `reply_markup` for `sendMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn row(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        if !buttons.is_empty() {
            self.inline_keyboard.push(buttons);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inline_keyboard.is_empty()
    }
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackQueryBody<'a> {
    callback_query_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Inbound wire types
// ---------------------------------------------------------------------------

/// A webhook update. Only the fields this service acts on are modelled.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl User {
    /// Identifier recorded as the verifier of an admin action.
    pub fn actor_label(&self) -> String {
        match &self.username {
            Some(username) => format!("telegram:@{username}"),
            None => format!("telegram:{}", self.id),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The Telegram operations the router, sweeper and webhook depend on.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> DeliveryResult;

    async fn answer_callback_query(&self, callback_query_id: &str, text: &str) -> DeliveryResult;
}

// ---------------------------------------------------------------------------
// TelegramClient
// ---------------------------------------------------------------------------

/// Bot API client bound to one bot token.
pub struct TelegramClient {
    client: reqwest::Client,
    /// `<api_base>/bot<token>`; never logged.
    bot_url: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, bot_token: &str, timeout: Duration) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            bot_url: format!("{}/bot{bot_token}", api_base.trim_end_matches('/')),
        })
    }

    async fn call<B: Serialize>(&self, method: &str, body: &B) -> Result<Option<String>, TelegramError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.bot_url))
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        interpret_response(status, &text)
    }
}

#[async_trait]
impl TelegramApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> DeliveryResult {
        let body = SendMessageBody {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_markup: keyboard.filter(|k| !k.is_empty()),
        };
        let result = DeliveryResult::from(self.call("sendMessage", &body).await);
        if let Some(error) = &result.error {
            tracing::warn!(chat_id, error = %error, "Telegram sendMessage failed");
        }
        result
    }

    async fn answer_callback_query(&self, callback_query_id: &str, text: &str) -> DeliveryResult {
        let body = AnswerCallbackQueryBody {
            callback_query_id,
            text,
        };
        DeliveryResult::from(self.call("answerCallbackQuery", &body).await)
    }
}

/// Map a Bot API response to a message id or error.
///
/// The Bot API reports failures as `{ok: false, description}`, usually with
/// a 4xx status; bodies that do not parse fall back to the HTTP status. A
/// delivery needs both a 2xx status and `ok: true`.
fn interpret_response(status: u16, body: &str) -> Result<Option<String>, TelegramError> {
    let Ok(parsed) = serde_json::from_str::<ApiResponse>(body) else {
        return Err(TelegramError::HttpStatus(status));
    };

    if !(200..300).contains(&status) {
        return Err(match parsed.description {
            Some(description) if !parsed.ok => TelegramError::Api(description),
            _ => TelegramError::HttpStatus(status),
        });
    }

    if !parsed.ok {
        return Err(TelegramError::Api(
            parsed
                .description
                .unwrap_or_else(|| format!("Telegram returned HTTP {status}")),
        ));
    }

    Ok(parsed
        .result
        .as_ref()
        .and_then(|r| r.get("message_id"))
        .and_then(|id| id.as_i64())
        .map(|id| id.to_string()))
}
