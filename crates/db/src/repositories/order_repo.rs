//! Repository for the `orders` table.

use rfs_core::status::OrderStatus;
use rfs_core::types::{RecordId, Timestamp};
use sqlx::PgPool;

use super::status_list;
use crate::models::order::OrderSummary;

/// Joined select for [`OrderSummary`].
const SUMMARY_SELECT: &str = "\
    SELECT o.id, o.order_number, o.status, o.description, o.admin_notes, \
           o.result_url, o.result_message, o.created_at, o.completed_at, \
           o.user_id, p.full_name AS customer_name, p.phone AS customer_phone, \
           p.email AS customer_email, p.telegram_id AS customer_telegram_id, \
           s.name AS service_name \
    FROM orders o \
    LEFT JOIN profiles p ON p.id = o.user_id \
    LEFT JOIN services s ON s.id = o.service_id";

pub struct OrderRepo;

impl OrderRepo {
    /// Find an order with its customer and service details.
    pub async fn find_summary(
        pool: &PgPool,
        id: RecordId,
    ) -> Result<Option<OrderSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE o.id = $1");
        sqlx::query_as::<_, OrderSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move an order to `completed` if it is still in a completable status.
    ///
    /// Returns `true` if this call performed the transition.
    pub async fn complete(
        pool: &PgPool,
        id: RecordId,
        completed_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders \
             SET status = $2, completed_at = $3, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($4)",
        )
        .bind(id)
        .bind(OrderStatus::Completed.as_str())
        .bind(completed_at)
        .bind(status_list(OrderStatus::COMPLETABLE_FROM, OrderStatus::as_str))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach a delivered result (download link and/or admin message).
    ///
    /// Absent values leave the stored columns untouched.
    pub async fn record_result(
        pool: &PgPool,
        id: RecordId,
        result_url: Option<&str>,
        result_message: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders \
             SET result_url = COALESCE($2, result_url), \
                 result_message = COALESCE($3, result_message), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(result_url)
        .bind(result_message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
