use rfs_core::recipient::RecipientSet;
use rfs_core::status::InvoiceStatus;
use rfs_core::types::{RecordId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// An invoice joined with its order, customer profile and service.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvoiceSummary {
    pub id: RecordId,
    pub invoice_number: String,
    pub order_id: RecordId,
    pub order_number: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    /// Whole rupiah.
    pub amount: i64,
    pub description: Option<String>,
    pub admin_notes: Option<String>,
    pub proof_url: Option<String>,
    pub due_date: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub verified_by: Option<String>,
    pub created_at: Timestamp,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_telegram_id: Option<String>,
    pub service_name: Option<String>,
}

impl InvoiceSummary {
    pub fn recipient(&self) -> RecipientSet {
        RecipientSet::new(self.customer_telegram_id.clone(), self.customer_phone.clone())
    }
}
