//! Repository for the `invoices` table.

use rfs_core::status::InvoiceStatus;
use rfs_core::types::{RecordId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use super::status_list;
use crate::models::invoice::InvoiceSummary;

/// Joined select for [`InvoiceSummary`]. Amounts are cast so both integer
/// and numeric columns decode as whole rupiah.
const SUMMARY_SELECT: &str = "\
    SELECT i.id, i.invoice_number, i.order_id, o.order_number, i.status, \
           i.amount::BIGINT AS amount, i.description, i.admin_notes, i.proof_url, \
           i.due_date, i.paid_at, i.verified_by, i.created_at, \
           p.full_name AS customer_name, p.phone AS customer_phone, \
           p.telegram_id AS customer_telegram_id, s.name AS service_name \
    FROM invoices i \
    LEFT JOIN orders o ON o.id = i.order_id \
    LEFT JOIN profiles p ON p.id = o.user_id \
    LEFT JOIN services s ON s.id = o.service_id";

pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Find an invoice with its order, customer and service details.
    pub async fn find_summary(
        pool: &PgPool,
        id: RecordId,
    ) -> Result<Option<InvoiceSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE i.id = $1");
        sqlx::query_as::<_, InvoiceSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark an invoice `paid` if it is still awaiting payment.
    ///
    /// Returns `true` if this call performed the transition.
    pub async fn mark_paid<'e>(
        executor: impl PgExecutor<'e>,
        id: RecordId,
        verified_by: &str,
        paid_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invoices \
             SET status = $2, paid_at = $3, verified_by = $4, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($5)",
        )
        .bind(id)
        .bind(InvoiceStatus::Paid.as_str())
        .bind(paid_at)
        .bind(verified_by)
        .bind(status_list(InvoiceStatus::VERIFIABLE_FROM, InvoiceStatus::as_str))
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Send an invoice back to `unpaid` with an admin note, if a proof is
    /// still awaiting verification.
    ///
    /// Returns `true` if this call performed the transition.
    pub async fn mark_rejected<'e>(
        executor: impl PgExecutor<'e>,
        id: RecordId,
        admin_note: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invoices \
             SET status = $2, admin_notes = $3, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($4)",
        )
        .bind(id)
        .bind(InvoiceStatus::Unpaid.as_str())
        .bind(admin_note)
        .bind(status_list(InvoiceStatus::REJECTABLE_FROM, InvoiceStatus::as_str))
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
