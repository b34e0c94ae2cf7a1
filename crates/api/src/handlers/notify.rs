//! Internal notification endpoints, called by the storefront after it
//! changes an order or invoice.
//!
//! All endpoints require [`ServiceAuth`]. Each one loads the current record,
//! fans the matching event out and returns the dispatch report.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use rfs_core::channels::ChannelKind;
use rfs_core::error::CoreError;
use rfs_core::status::{OrderStatus, TransitionCheck};
use rfs_core::types::RecordId;
use rfs_db::models::invoice::InvoiceSummary;
use rfs_db::models::order::OrderSummary;
use rfs_events::event::{InvoiceDetails, OrderDetails};
use rfs_events::sweeper::SweepReport;
use rfs_events::{AdminDispatch, CustomerDispatch, NotificationEvent};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::service_auth::ServiceAuth;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// What was sent for one event.
#[derive(Debug, Serialize)]
pub struct NotifyReport {
    pub event: &'static str,
    pub subject_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerDispatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admins: Option<Vec<AdminDispatch>>,
}

impl NotifyReport {
    fn new(event: &NotificationEvent) -> Self {
        Self {
            event: event.name(),
            subject_id: event.subject_id(),
            customer: None,
            admins: None,
        }
    }
}

/// Body of `POST /notify/orders/{id}/result`.
#[derive(Debug, Deserialize, Validate)]
pub struct OrderResultInput {
    #[validate(url)]
    pub result_url: Option<String>,
    #[validate(length(max = 4000))]
    pub result_message: Option<String>,
    /// Restrict the customer notification to these channels. All when absent.
    pub channels: Option<Vec<ChannelKind>>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// POST /api/v1/notify/orders/{id}
///
/// Tell the admins about a new order.
pub async fn notify_new_order(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    let order = load_order(&state, id).await?;
    let event = NotificationEvent::NewOrder(OrderDetails::from_summary(&order, order.created_at));

    let mut report = NotifyReport::new(&event);
    report.admins = Some(state.notifier.notify_admins(&event).await);

    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/notify/orders/{id}/status
///
/// Tell the customer their order moved to its current status.
pub async fn notify_order_status(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    let order = load_order(&state, id).await?;
    let event = NotificationEvent::OrderStatusChanged(OrderDetails::from_summary(&order, Utc::now()));

    let mut report = NotifyReport::new(&event);
    report.customer = Some(state.notifier.notify_customer(&order.recipient(), &event).await);

    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/notify/orders/{id}/result
///
/// Record the delivered result, complete the order and tell the customer on
/// the requested channels.
pub async fn notify_order_result(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(input): Json<OrderResultInput>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    input.validate()?;

    let order = load_order(&state, id).await?;
    let check = order.status.check_complete();
    if check == TransitionCheck::Invalid {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Order {} cannot be completed from status {}",
            order.order_number, order.status
        ))));
    }

    let result_url = non_blank(input.result_url.as_deref());
    let result_message = non_blank(input.result_message.as_deref());
    if result_url.is_some() || result_message.is_some() {
        state
            .commerce
            .record_order_result(id, result_url, result_message)
            .await?;
    }

    let now = Utc::now();
    if check == TransitionCheck::Apply && !state.commerce.complete_order(id, now).await? {
        tracing::info!(order_id = %id, "Order changed concurrently while completing");
    }

    let order = load_order(&state, id).await?;
    if order.status != OrderStatus::Completed {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Order {} is {} and was not completed",
            order.order_number, order.status
        ))));
    }
    tracing::info!(order_id = %id, "Order result recorded");

    let recipient = match &input.channels {
        Some(channels) => order.recipient().restricted_to(channels),
        None => order.recipient(),
    };
    let event = NotificationEvent::OrderCompleted(OrderDetails::from_summary(&order, now));

    let mut report = NotifyReport::new(&event);
    report.customer = Some(state.notifier.notify_customer(&recipient, &event).await);

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// POST /api/v1/notify/invoices/{id}
///
/// Tell the admins and the customer that an invoice was issued.
pub async fn notify_new_invoice(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    let invoice = load_invoice(&state, id).await?;
    let event =
        NotificationEvent::NewInvoice(InvoiceDetails::from_summary(&invoice, invoice.created_at));

    let recipient = invoice.recipient();
    let (admins, customer) = tokio::join!(
        state.notifier.notify_admins(&event),
        state.notifier.notify_customer(&recipient, &event),
    );

    let mut report = NotifyReport::new(&event);
    report.admins = Some(admins);
    report.customer = Some(customer);

    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/notify/invoices/{id}/payment-proof
///
/// Ask the admins to verify an uploaded payment proof.
pub async fn notify_payment_proof(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    let invoice = load_invoice(&state, id).await?;
    let event = NotificationEvent::PaymentProofUploaded(InvoiceDetails::from_summary(
        &invoice,
        Utc::now(),
    ));

    let mut report = NotifyReport::new(&event);
    report.admins = Some(state.notifier.notify_admins(&event).await);

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// POST /api/v1/notify/sweep
///
/// Re-deliver stale pending log entries now instead of waiting for the
/// background sweeper.
pub async fn sweep(
    _auth: ServiceAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SweepReport>>> {
    let report = state.sweeper.sweep().await?;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_order(state: &AppState, id: RecordId) -> AppResult<OrderSummary> {
    state
        .commerce
        .order(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))
}

async fn load_invoice(state: &AppState, id: RecordId) -> AppResult<InvoiceSummary> {
    state
        .commerce
        .invoice(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Invoice",
            id,
        }))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
