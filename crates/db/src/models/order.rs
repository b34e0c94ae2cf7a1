use rfs_core::recipient::RecipientSet;
use rfs_core::status::OrderStatus;
use rfs_core::types::{RecordId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// An order joined with its customer profile and service.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderSummary {
    pub id: RecordId,
    pub order_number: String,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub description: Option<String>,
    pub admin_notes: Option<String>,
    pub result_url: Option<String>,
    pub result_message: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub user_id: RecordId,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_telegram_id: Option<String>,
    pub service_name: Option<String>,
}

impl OrderSummary {
    pub fn recipient(&self) -> RecipientSet {
        RecipientSet::new(self.customer_telegram_id.clone(), self.customer_phone.clone())
    }
}
