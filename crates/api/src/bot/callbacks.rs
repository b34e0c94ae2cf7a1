//! Admin actions from inline keyboard buttons.
//!
//! Every verb re-reads the record, checks the requested transition against
//! the current status and only then issues a status-conditional update, so a
//! second press (or a concurrent press by another admin) is a no-op.
//!
//! The callback query is answered as soon as the transition is decided. The
//! chat reply and the customer/admin notifications follow concurrently.

use chrono::Utc;
use rfs_core::callback::CallbackAction;
use rfs_core::channels::ChannelKind;
use rfs_core::markup::escape_html;
use rfs_core::recipient::RecipientSet;
use rfs_core::status::{InvoiceStatus, OrderStatus, TransitionCheck};
use rfs_core::types::RecordId;
use rfs_db::StoreError;
use rfs_events::delivery::telegram::CallbackQuery;
use rfs_events::delivery::within_timeout;
use rfs_events::event::{InvoiceDetails, OrderDetails};
use rfs_events::templates::REJECTION_NOTE;
use rfs_events::NotificationEvent;

use crate::state::AppState;

const VERIFIED_REPLY: &str =
    "✅ Pembayaran berhasil diverifikasi!\n\nInvoice telah diupdate ke status PAID.";
const VERIFY_FAILED_REPLY: &str = "❌ Error: Gagal verifikasi pembayaran";
const REJECTED_REPLY: &str =
    "❌ Pembayaran ditolak.\n\nCustomer akan diminta upload ulang bukti pembayaran yang valid.";
const REJECT_FAILED_REPLY: &str = "❌ Error: Gagal reject pembayaran";
const COMPLETED_REPLY: &str = "✅ Order berhasil di-complete!\n\nCustomer akan menerima notifikasi.";
const COMPLETE_FAILED_REPLY: &str = "❌ Error: Gagal complete order";
const CREATE_INVOICE_FAILED_REPLY: &str = "❌ Error: Gagal membuka pembuatan invoice";
const UNKNOWN_ACTION_REPLY: &str = "❌ Error: Aksi tidak dikenal";

/// Toast shown on the pressed button.
const ANSWER_OK: &str = "Processed";
const ANSWER_FAILED: &str = "Failed";

/// Result of handling one button press, as reported back to the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The transition was applied (or the link was sent).
    Applied(String),
    /// The record was already in the target state; nothing changed.
    AlreadyProcessed(String),
    /// Nothing changed because of an error or a disallowed transition.
    Failed(String),
}

impl CallbackOutcome {
    pub fn reply(&self) -> &str {
        match self {
            CallbackOutcome::Applied(text)
            | CallbackOutcome::AlreadyProcessed(text)
            | CallbackOutcome::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CallbackOutcome::Failed(_))
    }
}

/// Notifications owed after a transition was applied.
struct FollowUp {
    recipient: RecipientSet,
    event: NotificationEvent,
}

/// What a verb decided, and what has to be announced because of it.
struct Decision {
    outcome: CallbackOutcome,
    follow_up: Option<FollowUp>,
}

impl Decision {
    fn only(outcome: CallbackOutcome) -> Self {
        Self {
            outcome,
            follow_up: None,
        }
    }

    fn applied(reply: &str, recipient: RecipientSet, event: NotificationEvent) -> Self {
        Self {
            outcome: CallbackOutcome::Applied(reply.to_string()),
            follow_up: Some(FollowUp { recipient, event }),
        }
    }
}

/// Handle a button press: apply the action, answer the callback query, then
/// reply into the chat the button lives in while the customer and admins are
/// notified.
///
/// The callback query is answered whatever happened, so the admin's client
/// stops showing a spinner.
pub async fn handle_callback_query(state: &AppState, query: &CallbackQuery) -> CallbackOutcome {
    let actor = query.from.actor_label();
    let decision = match query.data.as_deref().map(CallbackAction::parse) {
        Some(Ok(action)) => {
            tracing::info!(action = action.verb(), %actor, "Callback action received");
            apply(state, action, &actor).await
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, %actor, "Unrecognised callback data");
            Decision::only(CallbackOutcome::Failed(UNKNOWN_ACTION_REPLY.to_string()))
        }
        None => {
            tracing::warn!(%actor, "Callback query without data");
            Decision::only(CallbackOutcome::Failed(UNKNOWN_ACTION_REPLY.to_string()))
        }
    };

    answer(state, &query.id, &decision.outcome).await;

    let reply = async {
        match &query.message {
            Some(message) => {
                super::reply(state, &message.chat.id.to_string(), decision.outcome.reply()).await
            }
            None => tracing::debug!("Callback query has no message, reply skipped"),
        }
    };
    let announce = async {
        if let Some(follow_up) = &decision.follow_up {
            tokio::join!(
                state
                    .notifier
                    .notify_customer(&follow_up.recipient, &follow_up.event),
                state.notifier.notify_admins(&follow_up.event),
            );
        }
    };
    tokio::join!(reply, announce);

    decision.outcome
}

async fn answer(state: &AppState, callback_query_id: &str, outcome: &CallbackOutcome) {
    let Some(telegram) = &state.notifier.channels().telegram else {
        return;
    };

    let text = if outcome.is_failure() {
        ANSWER_FAILED
    } else {
        ANSWER_OK
    };
    let result = within_timeout(
        state.notify_config.provider_timeout(),
        ChannelKind::Telegram,
        telegram.answer_callback_query(callback_query_id, text),
    )
    .await;
    if let Some(error) = result.error {
        tracing::warn!(callback_query_id, error = %error, "Failed to answer callback query");
    }
}

async fn apply(state: &AppState, action: CallbackAction, actor: &str) -> Decision {
    let (result, failure_reply) = match action {
        CallbackAction::VerifyPayment { invoice_id } => (
            verify_payment(state, invoice_id, actor).await,
            VERIFY_FAILED_REPLY,
        ),
        CallbackAction::RejectPayment { invoice_id } => (
            reject_payment(state, invoice_id, actor).await,
            REJECT_FAILED_REPLY,
        ),
        CallbackAction::CompleteOrder { order_id } => (
            complete_order(state, order_id).await,
            COMPLETE_FAILED_REPLY,
        ),
        CallbackAction::CreateInvoice { order_id } => (
            create_invoice_link(state, order_id).await,
            CREATE_INVOICE_FAILED_REPLY,
        ),
    };

    result.unwrap_or_else(|e| {
        tracing::error!(action = action.verb(), error = %e, "Callback action failed");
        Decision::only(CallbackOutcome::Failed(failure_reply.to_string()))
    })
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

async fn verify_payment(
    state: &AppState,
    invoice_id: RecordId,
    actor: &str,
) -> Result<Decision, StoreError> {
    let Some(invoice) = state.commerce.invoice(invoice_id).await? else {
        return Ok(Decision::only(invoice_not_found(invoice_id)));
    };

    match invoice.status.check_verify() {
        TransitionCheck::Apply => {}
        TransitionCheck::AlreadyApplied => {
            return Ok(Decision::only(already_processed(
                &invoice.invoice_number,
                invoice.status.as_str(),
            )));
        }
        TransitionCheck::Invalid => {
            return Ok(Decision::only(CallbackOutcome::Failed(format!(
                "⚠️ Invoice {} tidak dapat diverifikasi dari status {}.",
                escape_html(&invoice.invoice_number),
                invoice.status
            ))));
        }
    }

    let now = Utc::now();
    if !state.commerce.mark_invoice_paid(invoice_id, actor, now).await? {
        tracing::info!(invoice_id = %invoice_id, "Invoice decided concurrently, skipping");
        return Ok(Decision::only(already_processed(&invoice.invoice_number, "paid")));
    }
    tracing::info!(invoice_id = %invoice_id, %actor, "Payment verified");

    let mut details = InvoiceDetails::from_summary(&invoice, now);
    details.status = InvoiceStatus::Paid;
    Ok(Decision::applied(
        VERIFIED_REPLY,
        invoice.recipient(),
        NotificationEvent::PaymentVerified(details),
    ))
}

async fn reject_payment(
    state: &AppState,
    invoice_id: RecordId,
    actor: &str,
) -> Result<Decision, StoreError> {
    let Some(invoice) = state.commerce.invoice(invoice_id).await? else {
        return Ok(Decision::only(invoice_not_found(invoice_id)));
    };

    match invoice.status.check_reject() {
        TransitionCheck::Apply => {}
        TransitionCheck::AlreadyApplied => {
            return Ok(Decision::only(already_processed(
                &invoice.invoice_number,
                invoice.status.as_str(),
            )));
        }
        TransitionCheck::Invalid => {
            return Ok(Decision::only(CallbackOutcome::Failed(format!(
                "⚠️ Invoice {} tidak dapat ditolak dari status {}.",
                escape_html(&invoice.invoice_number),
                invoice.status
            ))));
        }
    }

    let now = Utc::now();
    if !state
        .commerce
        .reject_invoice_payment(invoice_id, REJECTION_NOTE, actor, now)
        .await?
    {
        tracing::info!(invoice_id = %invoice_id, "Invoice decided concurrently, skipping");
        return Ok(Decision::only(already_processed(&invoice.invoice_number, "unpaid")));
    }
    tracing::info!(invoice_id = %invoice_id, %actor, "Payment rejected");

    let mut details = InvoiceDetails::from_summary(&invoice, now);
    details.status = InvoiceStatus::Unpaid;
    details.admin_notes = Some(REJECTION_NOTE.to_string());
    Ok(Decision::applied(
        REJECTED_REPLY,
        invoice.recipient(),
        NotificationEvent::PaymentRejected(details),
    ))
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

async fn complete_order(state: &AppState, order_id: RecordId) -> Result<Decision, StoreError> {
    let Some(order) = state.commerce.order(order_id).await? else {
        return Ok(Decision::only(order_not_found(order_id)));
    };

    match order.status.check_complete() {
        TransitionCheck::Apply => {}
        TransitionCheck::AlreadyApplied => {
            return Ok(Decision::only(already_processed(
                &order.order_number,
                order.status.as_str(),
            )));
        }
        TransitionCheck::Invalid => {
            return Ok(Decision::only(CallbackOutcome::Failed(format!(
                "⚠️ Order {} tidak dapat di-complete dari status {}.",
                escape_html(&order.order_number),
                order.status
            ))));
        }
    }

    let now = Utc::now();
    if !state.commerce.complete_order(order_id, now).await? {
        tracing::info!(order_id = %order_id, "Order changed concurrently, skipping");
        return Ok(Decision::only(already_processed(&order.order_number, "completed")));
    }
    tracing::info!(order_id = %order_id, "Order completed from Telegram");

    let mut details = OrderDetails::from_summary(&order, now);
    details.status = OrderStatus::Completed;
    Ok(Decision::applied(
        COMPLETED_REPLY,
        order.recipient(),
        NotificationEvent::OrderCompleted(details),
    ))
}

async fn create_invoice_link(
    state: &AppState,
    order_id: RecordId,
) -> Result<Decision, StoreError> {
    if state.commerce.order(order_id).await?.is_none() {
        return Ok(Decision::only(order_not_found(order_id)));
    }

    Ok(Decision::only(CallbackOutcome::Applied(format!(
        "📝 Silakan buat invoice untuk order ini melalui Admin Panel:\n\n🔗 {}",
        state.notifier.templates().admin_invoices_url()
    ))))
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

fn already_processed(number: &str, status: &str) -> CallbackOutcome {
    CallbackOutcome::AlreadyProcessed(format!(
        "ℹ️ {} sudah diproses sebelumnya (status: {}).",
        escape_html(number),
        status.to_uppercase()
    ))
}

fn invoice_not_found(id: RecordId) -> CallbackOutcome {
    tracing::warn!(invoice_id = %id, "Callback for unknown invoice");
    CallbackOutcome::Failed("❌ Error: Invoice tidak ditemukan".to_string())
}

fn order_not_found(id: RecordId) -> CallbackOutcome {
    tracing::warn!(order_id = %id, "Callback for unknown order");
    CallbackOutcome::Failed("❌ Error: Order tidak ditemukan".to_string())
}
