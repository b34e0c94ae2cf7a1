//! Channel selection and fan-out.
//!
//! [`NotificationRouter`] renders an event for its audience, sends it on
//! every applicable channel concurrently and waits for all dispatches to
//! settle. Each dispatch is appended to the notification log as `pending`
//! before sending and marked `sent` or `failed` afterwards.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use rfs_core::channels::ChannelKind;
use rfs_core::phone::{normalize_phone, DEFAULT_COUNTRY_CODE};
use rfs_core::recipient::RecipientSet;
use rfs_core::types::RecordId;
use rfs_db::models::notification_log::NewNotificationEntry;
use rfs_db::NotificationLogStore;
use serde::Serialize;

use crate::delivery::telegram::InlineKeyboardMarkup;
use crate::delivery::{within_timeout, Channels, DeliveryResult, DEFAULT_DISPATCH_TIMEOUT};
use crate::event::NotificationEvent;
use crate::templates::TemplateContext;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One admin reachable on WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminWhatsApp {
    /// Display name used in dispatch reports.
    pub label: String,
    pub number: String,
}

/// The fixed admin contact list.
#[derive(Debug, Clone, Default)]
pub struct AdminContacts {
    pub telegram_chat_ids: Vec<String>,
    pub whatsapp: Vec<AdminWhatsApp>,
}

impl AdminContacts {
    pub fn is_empty(&self) -> bool {
        self.telegram_chat_ids.is_empty() && self.whatsapp.is_empty()
    }
}

/// Everything about routing that is fixed at startup.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub admins: AdminContacts,
    pub templates: TemplateContext,
    pub country_code: String,
    pub dispatch_timeout: Duration,
}

impl RouterSettings {
    pub fn new(templates: TemplateContext) -> Self {
        Self {
            admins: AdminContacts::default(),
            templates,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-channel outcome of a customer notification. `None` means skipped:
/// either the contact is absent or the channel is not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerDispatch {
    pub telegram: Option<DeliveryResult>,
    pub whatsapp: Option<DeliveryResult>,
}

impl CustomerDispatch {
    /// At least one channel succeeded.
    pub fn delivered(&self) -> bool {
        [&self.telegram, &self.whatsapp]
            .into_iter()
            .flatten()
            .any(|r| r.success)
    }
}

/// Outcome of one admin dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminDispatch {
    /// Chat id for Telegram, label for WhatsApp.
    pub admin: String,
    pub channel: ChannelKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// NotificationRouter
// ---------------------------------------------------------------------------

pub struct NotificationRouter {
    channels: Channels,
    log: Arc<dyn NotificationLogStore>,
    settings: RouterSettings,
}

impl NotificationRouter {
    pub fn new(
        channels: Channels,
        log: Arc<dyn NotificationLogStore>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            channels,
            log,
            settings,
        }
    }

    pub fn templates(&self) -> &TemplateContext {
        &self.settings.templates
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Notify a customer on every channel they have a contact for.
    ///
    /// Telegram and WhatsApp are sent concurrently; an absent contact or
    /// unconfigured channel is reported as skipped.
    pub async fn notify_customer(
        &self,
        recipient: &RecipientSet,
        event: &NotificationEvent,
    ) -> CustomerDispatch {
        if recipient.is_empty() {
            tracing::info!(
                event = event.name(),
                subject_id = %event.subject_id(),
                "Customer has no contact details, notification dropped"
            );
            return CustomerDispatch::default();
        }

        let message = self.settings.templates.customer_message(event);
        let whatsapp_text = message.whatsapp();

        let telegram = async {
            match &recipient.telegram_id {
                Some(chat_id) => {
                    self.send_telegram(chat_id, &message.html, message.keyboard.as_ref())
                        .await
                }
                None => None,
            }
        };
        let whatsapp = async {
            match &recipient.phone {
                Some(phone) => self.send_whatsapp(phone, &whatsapp_text).await,
                None => None,
            }
        };
        let (telegram, whatsapp) = tokio::join!(telegram, whatsapp);

        let dispatch = CustomerDispatch { telegram, whatsapp };
        tracing::info!(
            event = event.name(),
            subject_id = %event.subject_id(),
            delivered = dispatch.delivered(),
            "Customer notification dispatched"
        );
        dispatch
    }

    /// Notify every configured admin on every configured channel.
    ///
    /// All dispatches run concurrently and the report has one entry per
    /// attempted dispatch, whatever the individual outcomes.
    pub async fn notify_admins(&self, event: &NotificationEvent) -> Vec<AdminDispatch> {
        if self.settings.admins.is_empty() {
            tracing::warn!(event = event.name(), "No admin contacts configured");
            return Vec::new();
        }

        let message = self.settings.templates.admin_message(event);
        let whatsapp_text = message.whatsapp();

        let mut sends: Vec<BoxFuture<'_, Option<AdminDispatch>>> = Vec::new();
        for chat_id in &self.settings.admins.telegram_chat_ids {
            let message = &message;
            sends.push(
                async move {
                    let result = self
                        .send_telegram(chat_id, &message.html, message.keyboard.as_ref())
                        .await?;
                    Some(admin_dispatch(chat_id.clone(), ChannelKind::Telegram, result))
                }
                .boxed(),
            );
        }
        for admin in &self.settings.admins.whatsapp {
            let text = whatsapp_text.as_str();
            sends.push(
                async move {
                    let result = self.send_whatsapp(&admin.number, text).await?;
                    Some(admin_dispatch(admin.label.clone(), ChannelKind::WhatsApp, result))
                }
                .boxed(),
            );
        }

        let report: Vec<AdminDispatch> = join_all(sends).await.into_iter().flatten().collect();
        let failed = report.iter().filter(|d| !d.success).count();
        tracing::info!(
            event = event.name(),
            subject_id = %event.subject_id(),
            dispatched = report.len(),
            failed,
            "Admin notification dispatched"
        );
        report
    }

    /// `None` when Telegram is not configured.
    async fn send_telegram(
        &self,
        chat_id: &str,
        html: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Option<DeliveryResult> {
        let Some(telegram) = &self.channels.telegram else {
            tracing::debug!(chat_id, "Telegram not configured, skipping");
            return None;
        };

        let log_id = self.append_log(ChannelKind::Telegram, chat_id, html).await;
        let result = within_timeout(
            self.settings.dispatch_timeout,
            ChannelKind::Telegram,
            telegram.send_message(chat_id, html, keyboard),
        )
        .await;
        self.record_outcome(log_id, &result).await;
        Some(result)
    }

    /// `None` when WhatsApp is not configured.
    async fn send_whatsapp(&self, phone: &str, text: &str) -> Option<DeliveryResult> {
        let Some(whatsapp) = &self.channels.whatsapp else {
            tracing::debug!("WhatsApp not configured, skipping");
            return None;
        };

        let Some(target) = normalize_phone(phone, &self.settings.country_code) else {
            return Some(DeliveryResult::failed(format!("invalid phone number '{phone}'")));
        };

        let log_id = self.append_log(ChannelKind::WhatsApp, &target, text).await;
        let result = within_timeout(
            self.settings.dispatch_timeout,
            ChannelKind::WhatsApp,
            whatsapp.send(&target, text),
        )
        .await;
        self.record_outcome(log_id, &result).await;
        Some(result)
    }

    async fn append_log(
        &self,
        channel: ChannelKind,
        recipient: &str,
        message: &str,
    ) -> Option<RecordId> {
        let entry = NewNotificationEntry {
            service_type: channel,
            recipient_number: recipient.to_string(),
            message: message.to_string(),
        };
        match self.log.append(entry).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(%channel, error = %e, "Failed to append notification log entry");
                None
            }
        }
    }

    async fn record_outcome(&self, log_id: Option<RecordId>, result: &DeliveryResult) {
        let Some(id) = log_id else { return };

        let update = match &result.error {
            None if result.success => self.log.mark_sent(id, Utc::now()).await,
            error => {
                let error = error.as_deref().unwrap_or("delivery failed");
                self.log.mark_failed(id, error).await
            }
        };
        if let Err(e) = update {
            tracing::error!(log_id = %id, error = %e, "Failed to update notification log entry");
        }
    }
}

fn admin_dispatch(admin: String, channel: ChannelKind, result: DeliveryResult) -> AdminDispatch {
    AdminDispatch {
        admin,
        channel,
        success: result.success,
        error: result.error,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rfs_core::status::DeliveryStatus;

    use super::*;
    use crate::test_support::{
        sample_invoice, sample_order, MemoryLog, RecordingTelegram, RecordingWhatsApp,
    };

    struct Harness {
        router: NotificationRouter,
        telegram: Arc<RecordingTelegram>,
        whatsapp: Arc<RecordingWhatsApp>,
        log: Arc<MemoryLog>,
    }

    fn harness(admins: AdminContacts) -> Harness {
        let telegram = Arc::new(RecordingTelegram::default());
        let whatsapp = Arc::new(RecordingWhatsApp::default());
        let log = Arc::new(MemoryLog::default());
        let channels = Channels {
            telegram: Some(telegram.clone()),
            whatsapp: Some(whatsapp.clone()),
        };
        let mut settings = RouterSettings::new(TemplateContext::new("https://rfs.example", 7));
        settings.admins = admins;
        Harness {
            router: NotificationRouter::new(channels, log.clone(), settings),
            telegram,
            whatsapp,
            log,
        }
    }

    fn both_contacts() -> RecipientSet {
        RecipientSet::new(Some("5551".into()), Some("0812-3456-7890".into()))
    }

    #[tokio::test]
    async fn customer_with_both_contacts_gets_both_channels() {
        let h = harness(AdminContacts::default());
        let event = NotificationEvent::PaymentVerified(sample_invoice());

        let dispatch = h.router.notify_customer(&both_contacts(), &event).await;

        assert!(dispatch.telegram.as_ref().unwrap().success);
        assert!(dispatch.whatsapp.as_ref().unwrap().success);
        assert!(dispatch.delivered());
        assert_eq!(h.telegram.sent().len(), 1);
        let wa = h.whatsapp.sent();
        assert_eq!(wa.len(), 1);
        assert_eq!(wa[0].0, "6281234567890");
        assert!(wa[0].1.starts_with("✅ *PEMBAYARAN DIKONFIRMASI*"));
    }

    #[tokio::test]
    async fn customer_without_contacts_is_skipped() {
        let h = harness(AdminContacts::default());
        let event = NotificationEvent::NewOrder(sample_order());

        let dispatch = h
            .router
            .notify_customer(&RecipientSet::new(None, Some(" ".into())), &event)
            .await;

        assert_eq!(dispatch, CustomerDispatch::default());
        assert!(!dispatch.delivered());
        assert!(h.telegram.sent().is_empty());
        assert!(h.whatsapp.sent().is_empty());
        assert!(h.log.entries().is_empty());
    }

    #[tokio::test]
    async fn one_channel_failing_does_not_affect_the_other() {
        let h = harness(AdminContacts::default());
        h.telegram.fail_for("5551", "Forbidden: bot was blocked by the user");
        let event = NotificationEvent::OrderCompleted(sample_order());

        let dispatch = h.router.notify_customer(&both_contacts(), &event).await;

        let tg = dispatch.telegram.unwrap();
        assert!(!tg.success);
        assert_eq!(tg.error.as_deref(), Some("Forbidden: bot was blocked by the user"));
        assert!(dispatch.whatsapp.unwrap().success);
    }

    #[tokio::test]
    async fn every_dispatch_is_logged_with_its_outcome() {
        let h = harness(AdminContacts::default());
        h.whatsapp.fail_for("6281234567890", "device disconnected");
        let event = NotificationEvent::NewInvoice(sample_invoice());

        h.router.notify_customer(&both_contacts(), &event).await;

        let entries = h.log.entries();
        assert_eq!(entries.len(), 2);
        let tg = entries.iter().find(|e| e.service_type == ChannelKind::Telegram).unwrap();
        assert_eq!(tg.status, DeliveryStatus::Sent);
        assert!(tg.sent_at.is_some());
        assert_eq!(tg.recipient_number, "5551");
        let wa = entries.iter().find(|e| e.service_type == ChannelKind::WhatsApp).unwrap();
        assert_eq!(wa.status, DeliveryStatus::Failed);
        assert_eq!(wa.error_message.as_deref(), Some("device disconnected"));
        assert!(!wa.message.contains("<b>"));
    }

    #[tokio::test]
    async fn log_failure_does_not_block_delivery() {
        let h = harness(AdminContacts::default());
        h.log.set_unavailable(true);
        let event = NotificationEvent::NewOrder(sample_order());

        let dispatch = h.router.notify_customer(&both_contacts(), &event).await;

        assert!(dispatch.delivered());
        assert_eq!(h.telegram.sent().len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_channel_is_skipped() {
        let log = Arc::new(MemoryLog::default());
        let whatsapp = Arc::new(RecordingWhatsApp::default());
        let channels = Channels {
            telegram: None,
            whatsapp: Some(whatsapp.clone()),
        };
        let router = NotificationRouter::new(
            channels,
            log,
            RouterSettings::new(TemplateContext::new("https://rfs.example", 7)),
        );

        let dispatch = router
            .notify_customer(&both_contacts(), &NotificationEvent::NewOrder(sample_order()))
            .await;

        assert!(dispatch.telegram.is_none());
        assert!(dispatch.whatsapp.unwrap().success);
    }

    #[tokio::test]
    async fn failing_admin_does_not_stop_the_others() {
        let h = harness(AdminContacts {
            telegram_chat_ids: vec!["100".into(), "200".into(), "300".into()],
            whatsapp: vec![AdminWhatsApp {
                label: "owner".into(),
                number: "081111111111".into(),
            }],
        });
        h.telegram.fail_for("200", "Bad Request: chat not found");
        let event = NotificationEvent::PaymentProofUploaded(sample_invoice());

        let report = h.router.notify_admins(&event).await;

        assert_eq!(report.len(), 4);
        let failed: Vec<_> = report.iter().filter(|d| !d.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].admin, "200");
        assert_eq!(failed[0].error.as_deref(), Some("Bad Request: chat not found"));
        assert!(report
            .iter()
            .any(|d| d.admin == "owner" && d.channel == ChannelKind::WhatsApp && d.success));
        assert_eq!(h.telegram.sent().len(), 3);
        // Keyboards go to Telegram admins only.
        assert!(h.telegram.keyboards().iter().all(Option::is_some));
    }

    #[tokio::test]
    async fn no_admins_means_empty_report() {
        let h = harness(AdminContacts::default());
        let report = h.router.notify_admins(&NotificationEvent::NewOrder(sample_order())).await;
        assert!(report.is_empty());
        assert!(h.telegram.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_becomes_timeout_failure() {
        let mut h = harness(AdminContacts::default());
        h.router.settings.dispatch_timeout = Duration::from_secs(2);
        h.telegram.hang_for("5551");

        let dispatch = h
            .router
            .notify_customer(&both_contacts(), &NotificationEvent::NewOrder(sample_order()))
            .await;

        let tg = dispatch.telegram.unwrap();
        assert!(!tg.success);
        assert!(tg.error.unwrap().contains("timed out"));
        assert!(dispatch.whatsapp.unwrap().success);
    }
}
