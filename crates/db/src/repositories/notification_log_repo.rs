//! Repository for the `notification_logs` table.

use rfs_core::status::DeliveryStatus;
use rfs_core::types::{RecordId, Timestamp};
use sqlx::PgPool;

use crate::models::notification_log::{NewNotificationEntry, NotificationEntry};

/// Column list for `notification_logs` queries.
const COLUMNS: &str = "id, service_type, recipient_number, message, status, \
                       error_message, created_at, sent_at";

/// Provides append and status updates for the notification log.
///
/// Rows in `sent` are final: every update below excludes them. On a
/// `pending` row, `sent_at` is the time a retry claimed it; the row may be
/// claimed again once that lease is older than the caller's cutoff.
pub struct NotificationLogRepo;

impl NotificationLogRepo {
    /// Append a `pending` entry, returning its id.
    pub async fn create(
        pool: &PgPool,
        input: &NewNotificationEntry,
    ) -> Result<RecordId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_logs (service_type, recipient_number, message, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(input.service_type.as_str())
        .bind(&input.recipient_number)
        .bind(&input.message)
        .bind(DeliveryStatus::Pending.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: RecordId,
    ) -> Result<Option<NotificationEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_logs WHERE id = $1");
        sqlx::query_as::<_, NotificationEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the oldest `pending` entries created before `created_before`.
    pub async fn list_pending(
        pool: &PgPool,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<NotificationEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_logs \
             WHERE status = $1 AND created_at < $2 \
             ORDER BY created_at ASC \
             LIMIT $3"
        );
        sqlx::query_as::<_, NotificationEntry>(&query)
            .bind(DeliveryStatus::Pending.as_str())
            .bind(created_before)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Claim a `pending` entry for redelivery.
    ///
    /// Succeeds for exactly one caller while the lease is fresh. Returns the
    /// claimed row, or `None` if the entry is settled or claimed elsewhere.
    pub async fn claim(
        pool: &PgPool,
        id: RecordId,
        claimed_at: Timestamp,
        lease_expired_before: Timestamp,
    ) -> Result<Option<NotificationEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_logs \
             SET sent_at = $2 \
             WHERE id = $1 AND status = $3 AND (sent_at IS NULL OR sent_at < $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationEntry>(&query)
            .bind(id)
            .bind(claimed_at)
            .bind(DeliveryStatus::Pending.as_str())
            .bind(lease_expired_before)
            .fetch_optional(pool)
            .await
    }

    /// Mark an entry delivered. Returns `false` if it was already `sent`.
    pub async fn mark_sent(
        pool: &PgPool,
        id: RecordId,
        sent_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_logs \
             SET status = $2, sent_at = $3, error_message = NULL \
             WHERE id = $1 AND status <> $2",
        )
        .bind(id)
        .bind(DeliveryStatus::Sent.as_str())
        .bind(sent_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark an entry failed with the provider's error. Never touches `sent` rows.
    pub async fn mark_failed(
        pool: &PgPool,
        id: RecordId,
        error_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_logs \
             SET status = $2, error_message = $3, sent_at = NULL \
             WHERE id = $1 AND status <> $4",
        )
        .bind(id)
        .bind(DeliveryStatus::Failed.as_str())
        .bind(error_message)
        .bind(DeliveryStatus::Sent.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
