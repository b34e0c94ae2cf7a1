//! Telegram bot workflow behind the webhook.
//!
//! - [`callbacks`]: admin presses on inline keyboard buttons, which move
//!   invoices and orders along their lifecycle and notify the customer.
//! - [`commands`]: read-only chat commands.
//!
//! Replies to the admin go straight to the chat the update came from and
//! are not written to the notification log.

pub mod callbacks;
pub mod commands;

use rfs_core::channels::ChannelKind;
use rfs_events::delivery::within_timeout;

pub use callbacks::{handle_callback_query, CallbackOutcome};
pub use commands::{handle_message, Command};

use crate::state::AppState;

/// Send an HTML reply into `chat_id`. No-op when Telegram is not configured.
pub(crate) async fn reply(state: &AppState, chat_id: &str, html: &str) {
    let Some(telegram) = &state.notifier.channels().telegram else {
        tracing::warn!(chat_id, "Telegram not configured, reply dropped");
        return;
    };

    let result = within_timeout(
        state.notify_config.provider_timeout(),
        ChannelKind::Telegram,
        telegram.send_message(chat_id, html, None),
    )
    .await;
    if let Some(error) = result.error {
        tracing::warn!(chat_id, error = %error, "Failed to send bot reply");
    }
}
