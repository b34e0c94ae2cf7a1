use std::sync::Arc;

use rfs_db::CommerceStore;
use rfs_events::{NotificationRouter, RetrySweeper};

use crate::config::{NotifyConfig, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Orders, invoices and payment proofs.
    pub commerce: Arc<dyn CommerceStore>,
    /// Customer and admin fan-out.
    pub notifier: Arc<NotificationRouter>,
    /// On-demand and background re-delivery of pending log entries.
    pub sweeper: Arc<RetrySweeper>,
    pub config: Arc<ServerConfig>,
    pub notify_config: Arc<NotifyConfig>,
}
