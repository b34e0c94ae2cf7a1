use axum::extract::State;
use axum::{routing::get, Json, Router};
use rfs_core::channels::ChannelKind;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether each outbound channel has credentials.
    pub channels: ChannelHealth,
}

#[derive(Serialize)]
pub struct ChannelHealth {
    pub telegram: bool,
    pub whatsapp: bool,
}

/// GET /health -- returns service, database and channel health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state.commerce.ping().await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };
    let channels = state.notifier.channels();

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        channels: ChannelHealth {
            telegram: channels.is_configured(ChannelKind::Telegram),
            whatsapp: channels.is_configured(ChannelKind::WhatsApp),
        },
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
