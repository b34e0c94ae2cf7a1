//! In-memory fakes and fixtures shared by this crate's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rfs_core::status::{DeliveryStatus, InvoiceStatus, OrderStatus};
use rfs_core::types::{RecordId, Timestamp};
use rfs_db::models::notification_log::{NewNotificationEntry, NotificationEntry};
use rfs_db::{NotificationLogStore, StoreError};
use uuid::Uuid;

use crate::delivery::telegram::{InlineKeyboardMarkup, TelegramApi};
use crate::delivery::whatsapp::WhatsAppApi;
use crate::delivery::DeliveryResult;
use crate::event::{InvoiceDetails, OrderDetails};

/// 19/10/2026 16.30 at UTC+7.
pub fn event_time() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

pub fn sample_order() -> OrderDetails {
    OrderDetails {
        id: Uuid::new_v4(),
        order_number: "ORD-20261019-001".into(),
        status: OrderStatus::Pending,
        customer_name: Some("Budi Santoso".into()),
        customer_phone: Some("081234567890".into()),
        service_name: Some("Desain Logo".into()),
        description: Some("Logo untuk kedai kopi".into()),
        admin_notes: None,
        result_url: None,
        result_message: None,
        at: event_time(),
    }
}

pub fn sample_invoice() -> InvoiceDetails {
    InvoiceDetails {
        id: Uuid::new_v4(),
        invoice_number: "INV-20261019-001".into(),
        order_number: Some("ORD-20261019-001".into()),
        status: InvoiceStatus::Pending,
        amount: 150_000,
        customer_name: Some("Budi Santoso".into()),
        service_name: Some("Desain Logo".into()),
        description: Some("Pembayaran desain logo".into()),
        admin_notes: None,
        proof_url: Some("https://storage.example/proofs/1.jpg".into()),
        at: event_time(),
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingTelegram {
    sent: Mutex<Vec<(String, String, Option<InlineKeyboardMarkup>)>>,
    failures: Mutex<HashMap<String, String>>,
    hanging: Mutex<Vec<String>>,
    latency: Mutex<Option<Duration>>,
}

impl RecordingTelegram {
    pub fn fail_for(&self, chat_id: &str, error: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), error.to_string());
    }

    /// Delay every send by `latency` before it completes.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn hang_for(&self, chat_id: &str) {
        self.hanging.lock().unwrap().push(chat_id.to_string());
    }

    /// `(chat_id, text)` of every attempted send.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(chat, text, _)| (chat.clone(), text.clone()))
            .collect()
    }

    pub fn keyboards(&self) -> Vec<Option<InlineKeyboardMarkup>> {
        self.sent.lock().unwrap().iter().map(|(_, _, k)| k.clone()).collect()
    }
}

#[async_trait]
impl TelegramApi for RecordingTelegram {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> DeliveryResult {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string(), keyboard.cloned()));
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let hang = self.hanging.lock().unwrap().iter().any(|c| c == chat_id);
        if hang {
            std::future::pending::<()>().await;
        }
        match self.failures.lock().unwrap().get(chat_id) {
            Some(error) => DeliveryResult::failed(error.clone()),
            None => DeliveryResult::sent(Some("1".into())),
        }
    }

    async fn answer_callback_query(&self, _callback_query_id: &str, _text: &str) -> DeliveryResult {
        DeliveryResult::sent(None)
    }
}

#[derive(Default)]
pub struct RecordingWhatsApp {
    sent: Mutex<Vec<(String, String)>>,
    failures: Mutex<HashMap<String, String>>,
}

impl RecordingWhatsApp {
    pub fn fail_for(&self, phone: &str, error: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(phone.to_string(), error.to_string());
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WhatsAppApi for RecordingWhatsApp {
    async fn send(&self, phone: &str, text: &str) -> DeliveryResult {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), text.to_string()));
        match self.failures.lock().unwrap().get(phone) {
            Some(error) => DeliveryResult::failed(error.clone()),
            None => DeliveryResult::sent(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification log
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<NotificationEntry>>,
    unavailable: Mutex<bool>,
}

impl MemoryLog {
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn entries(&self) -> Vec<NotificationEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn insert(&self, entry: NotificationEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn status_of(&self, id: RecordId) -> Option<DeliveryStatus> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.status)
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable("log store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationLogStore for MemoryLog {
    async fn append(&self, entry: NewNotificationEntry) -> Result<RecordId, StoreError> {
        self.check()?;
        let id = Uuid::new_v4();
        self.entries.lock().unwrap().push(NotificationEntry {
            id,
            service_type: entry.service_type,
            recipient_number: entry.recipient_number,
            message: entry.message,
            status: DeliveryStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
            sent_at: None,
        });
        Ok(id)
    }

    async fn get(&self, id: RecordId) -> Result<Option<NotificationEntry>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn list_pending(
        &self,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<NotificationEntry>, StoreError> {
        self.check()?;
        let mut pending: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status == DeliveryStatus::Pending && e.created_at < created_before)
            .cloned()
            .collect();
        pending.sort_by_key(|e| e.created_at);
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn claim(
        &self,
        id: RecordId,
        at: Timestamp,
        lease_expired_before: Timestamp,
    ) -> Result<Option<NotificationEntry>, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|e| {
            e.id == id
                && e.status == DeliveryStatus::Pending
                && e.sent_at.map_or(true, |claimed| claimed < lease_expired_before)
        }) {
            Some(entry) => {
                entry.sent_at = Some(at);
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn mark_sent(&self, id: RecordId, at: Timestamp) -> Result<bool, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|e| e.id == id && e.status != DeliveryStatus::Sent)
        {
            Some(entry) => {
                entry.status = DeliveryStatus::Sent;
                entry.sent_at = Some(at);
                entry.error_message = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_failed(&self, id: RecordId, error: &str) -> Result<bool, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|e| e.id == id && e.status != DeliveryStatus::Sent)
        {
            Some(entry) => {
                entry.status = DeliveryStatus::Failed;
                entry.error_message = Some(error.to_string());
                entry.sent_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
