pub mod health;
pub mod notify;
pub mod telegram;

use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /telegram/webhook                          Telegram updates (secret header)
///
/// /notify/orders/{id}                        new order -> admins
/// /notify/orders/{id}/status                 status change -> customer
/// /notify/orders/{id}/result                 result + completion -> customer
/// /notify/invoices/{id}                      new invoice -> admins, customer
/// /notify/invoices/{id}/payment-proof        proof uploaded -> admins
/// /notify/sweep                              re-deliver pending log entries
/// ```
///
/// `request_timeout` wraps the notify routes only. The webhook bounds its own
/// handling so that Telegram always gets its acknowledgement.
pub fn api_routes(request_timeout: TimeoutLayer) -> Router<AppState> {
    Router::new()
        .nest("/telegram", telegram::router())
        .nest("/notify", notify::router().layer(request_timeout))
}
