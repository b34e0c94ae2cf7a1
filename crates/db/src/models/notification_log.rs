//! Notification log models.

use rfs_core::channels::ChannelKind;
use rfs_core::status::DeliveryStatus;
use rfs_core::types::{RecordId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_logs` table: one dispatch attempt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationEntry {
    pub id: RecordId,
    #[sqlx(try_from = "String")]
    pub service_type: ChannelKind,
    /// Telegram chat id or normalized phone number.
    pub recipient_number: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
}

/// DTO for appending a dispatch to the log.
#[derive(Debug, Clone)]
pub struct NewNotificationEntry {
    pub service_type: ChannelKind,
    pub recipient_number: String,
    pub message: String,
}
