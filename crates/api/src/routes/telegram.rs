//! Route definitions for the Telegram bot.

use axum::routing::post;
use axum::Router;

use crate::handlers::telegram_webhook;
use crate::state::AppState;

/// Routes mounted at `/telegram`.
///
/// ```text
/// POST   /webhook                 -> telegram_webhook
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(telegram_webhook::telegram_webhook))
}
