//! Route definitions for the `/notify` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::notify;
use crate::state::AppState;

/// Routes mounted at `/notify`.
///
/// All routes require the internal API key (enforced by handler extractors).
///
/// ```text
/// POST   /orders/{id}                      -> notify_new_order
/// POST   /orders/{id}/status               -> notify_order_status
/// POST   /orders/{id}/result               -> notify_order_result
/// POST   /invoices/{id}                    -> notify_new_invoice
/// POST   /invoices/{id}/payment-proof      -> notify_payment_proof
/// POST   /sweep                            -> sweep
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}", post(notify::notify_new_order))
        .route("/orders/{id}/status", post(notify::notify_order_status))
        .route("/orders/{id}/result", post(notify::notify_order_result))
        .route("/invoices/{id}", post(notify::notify_new_invoice))
        .route(
            "/invoices/{id}/payment-proof",
            post(notify::notify_payment_proof),
        )
        .route("/sweep", post(notify::sweep))
}
