//! Persistence layer for the notification service.
//!
//! The storefront's tables (`orders`, `invoices`, `payment_proofs`,
//! `profiles`, `services`, `notification_logs`) are owned by the managed
//! backend. This crate only reads them and issues status-conditional
//! updates; `schema.sql` documents the columns it relies on.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod store;

pub use store::{CommerceStore, NotificationLogStore, PgStore, StoreError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}
