//! Outbound messaging channels.
//!
//! Adapters never return errors to their callers. Every provider, transport
//! or timeout failure is folded into a [`DeliveryResult`] so one channel's
//! failure stays local to that dispatch.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rfs_core::channels::ChannelKind;
use serde::Serialize;

pub mod telegram;
pub mod whatsapp;

use telegram::TelegramApi;
use whatsapp::WhatsAppApi;

/// Default upper bound for a single provider call.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// DeliveryResult
// ---------------------------------------------------------------------------

/// Outcome of one dispatch to one recipient on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub success: bool,
    /// Provider-assigned message id, when the provider returns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn sent(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

impl<E: std::fmt::Display> From<Result<Option<String>, E>> for DeliveryResult {
    fn from(outcome: Result<Option<String>, E>) -> Self {
        match outcome {
            Ok(message_id) => DeliveryResult::sent(message_id),
            Err(e) => DeliveryResult::failed(e.to_string()),
        }
    }
}

/// Await a dispatch, turning expiry of `limit` into a failure result.
pub async fn within_timeout<F>(limit: Duration, channel: ChannelKind, send: F) -> DeliveryResult
where
    F: Future<Output = DeliveryResult>,
{
    match tokio::time::timeout(limit, send).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(%channel, timeout_ms = limit.as_millis() as u64, "Dispatch timed out");
            DeliveryResult::failed(format!(
                "{channel} dispatch timed out after {} ms",
                limit.as_millis()
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// The configured adapters. An absent adapter makes that channel a no-op.
#[derive(Clone, Default)]
pub struct Channels {
    pub telegram: Option<Arc<dyn TelegramApi>>,
    pub whatsapp: Option<Arc<dyn WhatsAppApi>>,
}

impl Channels {
    pub fn is_configured(&self, channel: ChannelKind) -> bool {
        match channel {
            ChannelKind::Telegram => self.telegram.is_some(),
            ChannelKind::WhatsApp => self.whatsapp.is_some(),
        }
    }
}
