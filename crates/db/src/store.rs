//! Store seams consumed by the notification router, sweeper and webhook.
//!
//! The traits describe the record reads and status-conditional updates the
//! core needs from the system of record. [`PgStore`] implements them on top
//! of the repositories; tests substitute in-memory implementations.

use async_trait::async_trait;
use rfs_core::types::{RecordId, Timestamp};

use crate::models::invoice::InvoiceSummary;
use crate::models::notification_log::{NewNotificationEntry, NotificationEntry};
use crate::models::order::OrderSummary;
use crate::repositories::{InvoiceRepo, NotificationLogRepo, OrderRepo, PaymentProofRepo};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store is unavailable for a non-database reason.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Orders, invoices and payment proofs.
///
/// Every mutation is conditional on the record's current status and returns
/// `true` only when this call performed the transition.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    async fn order(&self, id: RecordId) -> Result<Option<OrderSummary>, StoreError>;

    async fn invoice(&self, id: RecordId) -> Result<Option<InvoiceSummary>, StoreError>;

    /// `unpaid|pending -> paid`, stamping verifier and time on the invoice
    /// and its undecided payment proofs.
    async fn mark_invoice_paid(
        &self,
        id: RecordId,
        verified_by: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// `pending -> unpaid` with an admin note; undecided proofs are marked
    /// not verified.
    async fn reject_invoice_payment(
        &self,
        id: RecordId,
        admin_note: &str,
        rejected_by: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// `pending|processing -> completed`, stamping completion time.
    async fn complete_order(&self, id: RecordId, at: Timestamp) -> Result<bool, StoreError>;

    /// Attach a result link and/or message to an order.
    async fn record_order_result(
        &self,
        id: RecordId,
        result_url: Option<&str>,
        result_message: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Reachability check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The notification log. Entries in `sent` are never modified.
#[async_trait]
pub trait NotificationLogStore: Send + Sync {
    async fn append(&self, entry: NewNotificationEntry) -> Result<RecordId, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<NotificationEntry>, StoreError>;

    async fn list_pending(
        &self,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<NotificationEntry>, StoreError>;

    /// Take a `pending` entry for redelivery. At most one caller gets
    /// `Some` until the claim is older than `lease_expired_before`.
    async fn claim(
        &self,
        id: RecordId,
        at: Timestamp,
        lease_expired_before: Timestamp,
    ) -> Result<Option<NotificationEntry>, StoreError>;

    async fn mark_sent(&self, id: RecordId, at: Timestamp) -> Result<bool, StoreError>;

    async fn mark_failed(&self, id: RecordId, error: &str) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// Postgres-backed implementation of both store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CommerceStore for PgStore {
    async fn order(&self, id: RecordId) -> Result<Option<OrderSummary>, StoreError> {
        Ok(OrderRepo::find_summary(&self.pool, id).await?)
    }

    async fn invoice(&self, id: RecordId) -> Result<Option<InvoiceSummary>, StoreError> {
        Ok(InvoiceRepo::find_summary(&self.pool, id).await?)
    }

    async fn mark_invoice_paid(
        &self,
        id: RecordId,
        verified_by: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !InvoiceRepo::mark_paid(&mut *tx, id, verified_by, at).await? {
            tx.rollback().await?;
            return Ok(false);
        }
        let proofs =
            PaymentProofRepo::decide_for_invoice(&mut *tx, id, true, verified_by, at).await?;

        tx.commit().await?;
        tracing::debug!(invoice_id = %id, proofs, "Invoice marked paid");
        Ok(true)
    }

    async fn reject_invoice_payment(
        &self,
        id: RecordId,
        admin_note: &str,
        rejected_by: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !InvoiceRepo::mark_rejected(&mut *tx, id, admin_note).await? {
            tx.rollback().await?;
            return Ok(false);
        }
        let proofs =
            PaymentProofRepo::decide_for_invoice(&mut *tx, id, false, rejected_by, at).await?;

        tx.commit().await?;
        tracing::debug!(invoice_id = %id, proofs, "Invoice payment rejected");
        Ok(true)
    }

    async fn complete_order(&self, id: RecordId, at: Timestamp) -> Result<bool, StoreError> {
        Ok(OrderRepo::complete(&self.pool, id, at).await?)
    }

    async fn record_order_result(
        &self,
        id: RecordId,
        result_url: Option<&str>,
        result_message: Option<&str>,
    ) -> Result<bool, StoreError> {
        Ok(OrderRepo::record_result(&self.pool, id, result_url, result_message).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

#[async_trait]
impl NotificationLogStore for PgStore {
    async fn append(&self, entry: NewNotificationEntry) -> Result<RecordId, StoreError> {
        Ok(NotificationLogRepo::create(&self.pool, &entry).await?)
    }

    async fn get(&self, id: RecordId) -> Result<Option<NotificationEntry>, StoreError> {
        Ok(NotificationLogRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_pending(
        &self,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<NotificationEntry>, StoreError> {
        Ok(NotificationLogRepo::list_pending(&self.pool, created_before, limit).await?)
    }

    async fn claim(
        &self,
        id: RecordId,
        at: Timestamp,
        lease_expired_before: Timestamp,
    ) -> Result<Option<NotificationEntry>, StoreError> {
        Ok(NotificationLogRepo::claim(&self.pool, id, at, lease_expired_before).await?)
    }

    async fn mark_sent(&self, id: RecordId, at: Timestamp) -> Result<bool, StoreError> {
        Ok(NotificationLogRepo::mark_sent(&self.pool, id, at).await?)
    }

    async fn mark_failed(&self, id: RecordId, error: &str) -> Result<bool, StoreError> {
        Ok(NotificationLogRepo::mark_failed(&self.pool, id, error).await?)
    }
}
