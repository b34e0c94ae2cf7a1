//! Inbound Telegram webhook.
//!
//! The shared secret header is checked before the body is parsed. Once the
//! request is authorised the response is always `200 {"ok": true}`, since
//! Telegram redelivers updates that get any other answer.
//!
//! This route sits outside the generic request timeout. Handling is bounded
//! by [`NotifyConfig::webhook_budget`] instead; work still running when the
//! budget elapses is dropped and the update is acknowledged anyway.
//!
//! [`NotifyConfig::webhook_budget`]: crate::config::NotifyConfig::webhook_budget

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use rfs_core::error::CoreError;
use rfs_core::secret::secret_matches;
use rfs_events::delivery::telegram::{Update, SECRET_TOKEN_HEADER};
use serde_json::{json, Value};

use crate::bot;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/telegram/webhook
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let presented = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if !secret_matches(presented, state.notify_config.telegram_webhook_secret.as_deref()) {
        tracing::warn!(
            header_present = presented.is_some(),
            "Rejected Telegram webhook with invalid secret token"
        );
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid secret token".into(),
        )));
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed Telegram update");
            return Ok(Json(json!({ "ok": true })));
        }
    };

    let budget = state.notify_config.webhook_budget();
    if tokio::time::timeout(budget, dispatch(&state, &update))
        .await
        .is_err()
    {
        tracing::warn!(
            update_id = update.update_id,
            budget_secs = budget.as_secs(),
            "Telegram update handling exceeded its budget, acknowledging anyway"
        );
    }

    Ok(Json(json!({ "ok": true })))
}

async fn dispatch(state: &AppState, update: &Update) {
    if let Some(query) = &update.callback_query {
        bot::handle_callback_query(state, query).await;
    } else if let Some(message) = &update.message {
        bot::handle_message(state, message).await;
    } else {
        tracing::debug!(update_id = update.update_id, "Ignoring update without callback or message");
    }
}
