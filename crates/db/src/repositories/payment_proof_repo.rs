//! Repository for the `payment_proofs` table.

use rfs_core::types::{RecordId, Timestamp};
use sqlx::PgExecutor;

pub struct PaymentProofRepo;

impl PaymentProofRepo {
    /// Record the admin decision on every undecided proof of an invoice.
    ///
    /// Proofs that already carry a decision are left alone. Returns the
    /// number of proofs updated.
    pub async fn decide_for_invoice<'e>(
        executor: impl PgExecutor<'e>,
        invoice_id: RecordId,
        verified: bool,
        verified_by: &str,
        decided_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payment_proofs \
             SET verified = $2, verified_by = $3, verified_at = $4 \
             WHERE invoice_id = $1 AND verified IS NULL",
        )
        .bind(invoice_id)
        .bind(verified)
        .bind(verified_by)
        .bind(decided_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
