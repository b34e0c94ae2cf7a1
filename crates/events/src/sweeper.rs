//! Re-delivery of notifications stuck in `pending`.
//!
//! An entry stays `pending` when the process died between appending it and
//! recording the provider's answer. [`RetrySweeper`] picks up entries older
//! than a grace period, re-sends them on their original channel and records
//! the outcome. It runs on an interval in the background and can also be
//! triggered on demand.
//!
//! Each entry is claimed in the log before it is sent, so overlapping sweeps
//! (the background loop and an on-demand run, or two instances) deliver it
//! at most once. A claim whose sweep died is taken over after `claim_lease`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rfs_core::channels::ChannelKind;
use rfs_core::status::DeliveryStatus;
use rfs_core::types::RecordId;
use rfs_db::models::notification_log::NotificationEntry;
use rfs_db::{NotificationLogStore, StoreError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::delivery::{within_timeout, Channels, DeliveryResult, DEFAULT_DISPATCH_TIMEOUT};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// Maximum entries handled per sweep.
    pub batch_size: i64,
    /// Entries younger than this are left for the in-flight dispatch.
    pub min_age: Duration,
    /// Pause between consecutive deliveries.
    pub item_delay: Duration,
    pub dispatch_timeout: Duration,
    /// How long a claimed entry is reserved for the sweep that claimed it.
    pub claim_lease: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            min_age: Duration::from_secs(30),
            item_delay: Duration::from_millis(100),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
            claim_lease: Duration::from_secs(300),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Sent,
    Failed { error: String },
    /// Another writer settled or claimed the entry after it was listed.
    Skipped { status: DeliveryStatus },
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepItem {
    pub id: RecordId,
    pub channel: ChannelKind,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Entries listed as pending.
    pub total: usize,
    /// Entries a delivery was attempted for.
    pub processed: usize,
    pub skipped: usize,
    pub results: Vec<SweepItem>,
}

// ---------------------------------------------------------------------------
// RetrySweeper
// ---------------------------------------------------------------------------

pub struct RetrySweeper {
    log: Arc<dyn NotificationLogStore>,
    channels: Channels,
    settings: SweepSettings,
}

impl RetrySweeper {
    pub fn new(
        log: Arc<dyn NotificationLogStore>,
        channels: Channels,
        settings: SweepSettings,
    ) -> Self {
        Self {
            log,
            channels,
            settings,
        }
    }

    /// Run the sweep loop every `period` until `cancel` fires.
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = period.as_secs(),
            batch_size = self.settings.batch_size,
            "Retry sweeper started"
        );

        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Retry sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep().await {
                        Ok(report) if report.total > 0 => {
                            tracing::info!(
                                total = report.total,
                                processed = report.processed,
                                skipped = report.skipped,
                                "Retry sweep finished"
                            );
                        }
                        Ok(_) => tracing::debug!("Retry sweep: nothing pending"),
                        Err(e) => tracing::error!(error = %e, "Retry sweep failed"),
                    }
                }
            }
        }
    }

    /// Re-deliver one batch of stale `pending` entries.
    ///
    /// Only listing the batch can fail the sweep; per-entry store errors are
    /// logged and the sweep moves on.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let now = Utc::now();
        let cutoff = now - to_chrono(self.settings.min_age);
        let pending = self
            .log
            .list_pending(cutoff, self.settings.batch_size)
            .await?;

        let mut report = SweepReport {
            total: pending.len(),
            ..SweepReport::default()
        };

        for (i, listed) in pending.into_iter().enumerate() {
            if i > 0 && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }

            let outcome = match self.claim(&listed).await {
                Ok(Some(entry)) => {
                    report.processed += 1;
                    self.redeliver(&entry).await
                }
                Ok(None) => {
                    report.skipped += 1;
                    SweepOutcome::Skipped {
                        status: self.current_status(&listed).await,
                    }
                }
                Err(e) => {
                    tracing::error!(log_id = %listed.id, error = %e, "Failed to claim log entry");
                    continue;
                }
            };
            report.results.push(SweepItem {
                id: listed.id,
                channel: listed.service_type,
                outcome,
            });
        }

        Ok(report)
    }

    async fn claim(
        &self,
        listed: &NotificationEntry,
    ) -> Result<Option<NotificationEntry>, StoreError> {
        let now = Utc::now();
        let lease_expired_before = now - to_chrono(self.settings.claim_lease);
        self.log.claim(listed.id, now, lease_expired_before).await
    }

    /// Status of an entry this sweep could not claim. A row still `pending`
    /// here is held by another sweep.
    async fn current_status(&self, listed: &NotificationEntry) -> DeliveryStatus {
        match self.log.get(listed.id).await {
            Ok(Some(entry)) => entry.status,
            Ok(None) => listed.status,
            Err(e) => {
                tracing::warn!(log_id = %listed.id, error = %e, "Failed to reload log entry");
                listed.status
            }
        }
    }

    async fn redeliver(&self, entry: &NotificationEntry) -> SweepOutcome {
        let result = self.deliver(entry).await;

        let update = if result.success {
            self.log.mark_sent(entry.id, Utc::now()).await
        } else {
            let error = result.error.as_deref().unwrap_or("delivery failed");
            self.log.mark_failed(entry.id, error).await
        };
        if let Err(e) = update {
            tracing::error!(log_id = %entry.id, error = %e, "Failed to update log entry after retry");
        }

        match result.error {
            None if result.success => SweepOutcome::Sent,
            error => SweepOutcome::Failed {
                error: error.unwrap_or_else(|| "delivery failed".into()),
            },
        }
    }

    async fn deliver(&self, entry: &NotificationEntry) -> DeliveryResult {
        let channel = entry.service_type;
        let timeout = self.settings.dispatch_timeout;
        match channel {
            ChannelKind::Telegram => match &self.channels.telegram {
                // Retries carry no keyboard; it is not stored in the log.
                Some(telegram) => {
                    within_timeout(
                        timeout,
                        channel,
                        telegram.send_message(&entry.recipient_number, &entry.message, None),
                    )
                    .await
                }
                None => DeliveryResult::failed("telegram channel not configured"),
            },
            ChannelKind::WhatsApp => match &self.channels.whatsapp {
                Some(whatsapp) => {
                    within_timeout(
                        timeout,
                        channel,
                        whatsapp.send(&entry.recipient_number, &entry.message),
                    )
                    .await
                }
                None => DeliveryResult::failed("whatsapp channel not configured"),
            },
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}
