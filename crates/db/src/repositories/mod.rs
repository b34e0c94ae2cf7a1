//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Read methods take `&PgPool`; mutations that may run inside a transaction
//! take any [`sqlx::PgExecutor`].

pub mod invoice_repo;
pub mod notification_log_repo;
pub mod order_repo;
pub mod payment_proof_repo;

pub use invoice_repo::InvoiceRepo;
pub use notification_log_repo::NotificationLogRepo;
pub use order_repo::OrderRepo;
pub use payment_proof_repo::PaymentProofRepo;

/// Convert a list of statuses into the text array bound to `status = ANY($n)`.
pub(crate) fn status_list<T: Copy>(statuses: &[T], as_str: fn(T) -> &'static str) -> Vec<String> {
    statuses.iter().map(|s| as_str(*s).to_string()).collect()
}
