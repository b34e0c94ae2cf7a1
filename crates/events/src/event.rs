//! Business events that trigger notifications.

use rfs_core::status::{InvoiceStatus, OrderStatus};
use rfs_core::types::{RecordId, Timestamp};
use rfs_db::models::invoice::InvoiceSummary;
use rfs_db::models::order::OrderSummary;

/// Order fields used by templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub id: RecordId,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub service_name: Option<String>,
    pub description: Option<String>,
    pub admin_notes: Option<String>,
    pub result_url: Option<String>,
    pub result_message: Option<String>,
    /// When the event happened; rendered in the message.
    pub at: Timestamp,
}

impl OrderDetails {
    pub fn from_summary(order: &OrderSummary, at: Timestamp) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            service_name: order.service_name.clone(),
            description: order.description.clone(),
            admin_notes: order.admin_notes.clone(),
            result_url: order.result_url.clone(),
            result_message: order.result_message.clone(),
            at,
        }
    }
}

/// Invoice fields used by templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDetails {
    pub id: RecordId,
    pub invoice_number: String,
    pub order_number: Option<String>,
    pub status: InvoiceStatus,
    /// Whole rupiah.
    pub amount: i64,
    pub customer_name: Option<String>,
    pub service_name: Option<String>,
    pub description: Option<String>,
    pub admin_notes: Option<String>,
    pub proof_url: Option<String>,
    pub at: Timestamp,
}

impl InvoiceDetails {
    pub fn from_summary(invoice: &InvoiceSummary, at: Timestamp) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            order_number: invoice.order_number.clone(),
            status: invoice.status,
            amount: invoice.amount,
            customer_name: invoice.customer_name.clone(),
            service_name: invoice.service_name.clone(),
            description: invoice.description.clone(),
            admin_notes: invoice.admin_notes.clone(),
            proof_url: invoice.proof_url.clone(),
            at,
        }
    }
}

/// What happened. Each variant has one admin and one customer template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    NewOrder(OrderDetails),
    NewInvoice(InvoiceDetails),
    PaymentProofUploaded(InvoiceDetails),
    PaymentVerified(InvoiceDetails),
    PaymentRejected(InvoiceDetails),
    OrderStatusChanged(OrderDetails),
    OrderCompleted(OrderDetails),
}

impl NotificationEvent {
    /// Stable tag for logs.
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::NewOrder(_) => "new_order",
            NotificationEvent::NewInvoice(_) => "new_invoice",
            NotificationEvent::PaymentProofUploaded(_) => "payment_proof_uploaded",
            NotificationEvent::PaymentVerified(_) => "payment_verified",
            NotificationEvent::PaymentRejected(_) => "payment_rejected",
            NotificationEvent::OrderStatusChanged(_) => "order_status_changed",
            NotificationEvent::OrderCompleted(_) => "order_completed",
        }
    }

    /// Id of the order or invoice the event is about.
    pub fn subject_id(&self) -> RecordId {
        match self {
            NotificationEvent::NewOrder(o)
            | NotificationEvent::OrderStatusChanged(o)
            | NotificationEvent::OrderCompleted(o) => o.id,
            NotificationEvent::NewInvoice(i)
            | NotificationEvent::PaymentProofUploaded(i)
            | NotificationEvent::PaymentVerified(i)
            | NotificationEvent::PaymentRejected(i) => i.id,
        }
    }
}
