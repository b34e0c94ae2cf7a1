#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use rfs_api::config::{NotifyConfig, ServerConfig};
use rfs_api::router::build_app_router;
use rfs_api::state::AppState;
use rfs_core::status::{DeliveryStatus, InvoiceStatus, OrderStatus};
use rfs_core::types::{RecordId, Timestamp};
use rfs_db::models::invoice::InvoiceSummary;
use rfs_db::models::notification_log::{NewNotificationEntry, NotificationEntry};
use rfs_db::models::order::OrderSummary;
use rfs_db::{CommerceStore, NotificationLogStore, StoreError};
use rfs_events::delivery::telegram::{InlineKeyboardMarkup, TelegramApi};
use rfs_events::{Channels, DeliveryResult, NotificationRouter, RetrySweeper, WhatsAppApi};
use tower::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "webhook-secret";
pub const API_KEY: &str = "internal-key";
pub const ADMIN_CHAT: &str = "-100777";
pub const ADMIN_WHATSAPP: &str = "081299990000";
pub const CUSTOMER_CHAT: &str = "555001";
pub const CUSTOMER_PHONE: &str = "081234567890";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
    }
}

/// Notification config with one admin per channel and both secrets set.
pub fn test_notify_config() -> NotifyConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("TELEGRAM_ADMIN_CHAT_IDS", ADMIN_CHAT),
        ("WHATSAPP_ADMIN_NUMBERS", "owner=081299990000"),
        ("TELEGRAM_WEBHOOK_SECRET", WEBHOOK_SECRET),
        ("INTERNAL_API_KEY", API_KEY),
        ("FRONTEND_URL", "https://rfs-store.example"),
        ("SWEEP_MIN_AGE_SECS", "0"),
        ("SWEEP_ITEM_DELAY_MS", "0"),
    ]);
    NotifyConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn created_at() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
}

pub fn order(status: OrderStatus) -> OrderSummary {
    OrderSummary {
        id: Uuid::new_v4(),
        order_number: "ORD-20261019-001".into(),
        status,
        description: Some("Logo untuk kedai kopi".into()),
        admin_notes: None,
        result_url: None,
        result_message: None,
        created_at: created_at(),
        completed_at: None,
        user_id: Uuid::new_v4(),
        customer_name: Some("Budi Santoso".into()),
        customer_phone: Some(CUSTOMER_PHONE.into()),
        customer_email: Some("budi@example.com".into()),
        customer_telegram_id: Some(CUSTOMER_CHAT.into()),
        service_name: Some("Desain Logo".into()),
    }
}

pub fn invoice(status: InvoiceStatus) -> InvoiceSummary {
    InvoiceSummary {
        id: Uuid::new_v4(),
        invoice_number: "INV-20261019-001".into(),
        order_id: Uuid::new_v4(),
        order_number: Some("ORD-20261019-001".into()),
        status,
        amount: 150_000,
        description: Some("Pembayaran desain logo".into()),
        admin_notes: None,
        proof_url: Some("https://storage.example/proofs/1.jpg".into()),
        due_date: None,
        paid_at: None,
        verified_by: None,
        created_at: created_at(),
        customer_name: Some("Budi Santoso".into()),
        customer_phone: Some(CUSTOMER_PHONE.into()),
        customer_telegram_id: Some(CUSTOMER_CHAT.into()),
        service_name: Some("Desain Logo".into()),
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Orders and invoices held in memory with the same status-conditional
/// update rules as the Postgres store.
#[derive(Default)]
pub struct MemoryCommerce {
    orders: Mutex<HashMap<RecordId, OrderSummary>>,
    invoices: Mutex<HashMap<RecordId, InvoiceSummary>>,
    unavailable: Mutex<bool>,
}

impl MemoryCommerce {
    pub fn insert_order(&self, order: OrderSummary) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn insert_invoice(&self, invoice: InvoiceSummary) {
        self.invoices.lock().unwrap().insert(invoice.id, invoice);
    }

    pub fn stored_order(&self, id: RecordId) -> OrderSummary {
        self.orders.lock().unwrap()[&id].clone()
    }

    pub fn stored_invoice(&self, id: RecordId) -> InvoiceSummary {
        self.invoices.lock().unwrap()[&id].clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CommerceStore for MemoryCommerce {
    async fn order(&self, id: RecordId) -> Result<Option<OrderSummary>, StoreError> {
        self.check()?;
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn invoice(&self, id: RecordId) -> Result<Option<InvoiceSummary>, StoreError> {
        self.check()?;
        Ok(self.invoices.lock().unwrap().get(&id).cloned())
    }

    async fn mark_invoice_paid(
        &self,
        id: RecordId,
        verified_by: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut invoices = self.invoices.lock().unwrap();
        match invoices.get_mut(&id) {
            Some(invoice) if InvoiceStatus::VERIFIABLE_FROM.contains(&invoice.status) => {
                invoice.status = InvoiceStatus::Paid;
                invoice.paid_at = Some(at);
                invoice.verified_by = Some(verified_by.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reject_invoice_payment(
        &self,
        id: RecordId,
        admin_note: &str,
        _rejected_by: &str,
        _at: Timestamp,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut invoices = self.invoices.lock().unwrap();
        match invoices.get_mut(&id) {
            Some(invoice) if InvoiceStatus::REJECTABLE_FROM.contains(&invoice.status) => {
                invoice.status = InvoiceStatus::Unpaid;
                invoice.admin_notes = Some(admin_note.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_order(&self, id: RecordId, at: Timestamp) -> Result<bool, StoreError> {
        self.check()?;
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) if OrderStatus::COMPLETABLE_FROM.contains(&order.status) => {
                order.status = OrderStatus::Completed;
                order.completed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_order_result(
        &self,
        id: RecordId,
        result_url: Option<&str>,
        result_message: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(url) = result_url {
            order.result_url = Some(url.to_string());
        }
        if let Some(message) = result_message {
            order.result_message = Some(message.to_string());
        }
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

/// Notification log held in memory.
#[derive(Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<NotificationEntry>>,
}

impl MemoryLog {
    pub fn entries(&self) -> Vec<NotificationEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn insert(&self, entry: NotificationEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl NotificationLogStore for MemoryLog {
    async fn append(&self, entry: NewNotificationEntry) -> Result<RecordId, StoreError> {
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
        Ok(self.entries.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn list_pending(
        &self,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<NotificationEntry>, StoreError> {
        let mut pending: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status == DeliveryStatus::Pending && e.created_at <= created_before)
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
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.status != DeliveryStatus::Sent => {
                entry.status = DeliveryStatus::Sent;
                entry.sent_at = Some(at);
                entry.error_message = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, id: RecordId, error: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.status != DeliveryStatus::Sent => {
                entry.status = DeliveryStatus::Failed;
                entry.error_message = Some(error.to_string());
                entry.sent_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingTelegram {
    sent: Mutex<Vec<(String, String, Option<InlineKeyboardMarkup>)>>,
    answers: Mutex<Vec<(String, String)>>,
    failing: Mutex<Vec<String>>,
    sends_hang: Mutex<bool>,
    answers_hang: Mutex<bool>,
}

impl RecordingTelegram {
    pub fn fail_for(&self, chat_id: &str) {
        self.failing.lock().unwrap().push(chat_id.to_string());
    }

    /// Every `sendMessage` is recorded and then never completes.
    pub fn hang_sends(&self) {
        *self.sends_hang.lock().unwrap() = true;
    }

    /// Every `answerCallbackQuery` is recorded and then never completes.
    pub fn hang_answers(&self) {
        *self.answers_hang.lock().unwrap() = true;
    }

    /// Texts sent to `chat_id`, in order.
    pub fn sent_to(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == chat_id)
            .map(|(_, text, _)| text.clone())
            .collect()
    }

    pub fn keyboard_sent_to(&self, chat_id: &str) -> Option<InlineKeyboardMarkup> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _, _)| id == chat_id)
            .and_then(|(_, _, keyboard)| keyboard.clone())
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// `(callback_query_id, text)` of every answer.
    pub fn answers(&self) -> Vec<(String, String)> {
        self.answers.lock().unwrap().clone()
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
        let hang = *self.sends_hang.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().iter().any(|id| id == chat_id) {
            return DeliveryResult::failed("Bad Request: chat not found");
        }
        DeliveryResult::sent(Some("1".into()))
    }

    async fn answer_callback_query(&self, callback_query_id: &str, text: &str) -> DeliveryResult {
        self.answers
            .lock()
            .unwrap()
            .push((callback_query_id.to_string(), text.to_string()));
        let hang = *self.answers_hang.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }
        DeliveryResult::sent(None)
    }
}

#[derive(Default)]
pub struct RecordingWhatsApp {
    sent: Mutex<Vec<(String, String)>>,
    hang: Mutex<bool>,
}

impl RecordingWhatsApp {
    /// Every send is recorded and then never completes.
    pub fn hang_sends(&self) {
        *self.hang.lock().unwrap() = true;
    }

    /// `(phone, text)` of every send.
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
        let hang = *self.hang.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }
        DeliveryResult::sent(None)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The full router plus handles on every fake behind it.
pub struct TestApp {
    pub router: Router,
    pub commerce: Arc<MemoryCommerce>,
    pub log: Arc<MemoryLog>,
    pub telegram: Arc<RecordingTelegram>,
    pub whatsapp: Arc<RecordingWhatsApp>,
}

/// Build the full application router with all middleware layers on top of
/// in-memory stores and recording channels.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_notify_config())
}

pub fn build_test_app_with(notify_config: NotifyConfig) -> TestApp {
    let config = test_config();
    let commerce = Arc::new(MemoryCommerce::default());
    let log = Arc::new(MemoryLog::default());
    let telegram = Arc::new(RecordingTelegram::default());
    let whatsapp = Arc::new(RecordingWhatsApp::default());

    let channels = Channels {
        telegram: Some(telegram.clone()),
        whatsapp: Some(whatsapp.clone()),
    };
    let notifier = NotificationRouter::new(
        channels.clone(),
        log.clone(),
        notify_config.router_settings(),
    );
    let sweeper = RetrySweeper::new(log.clone(), channels, notify_config.sweep_settings());

    let state = AppState {
        commerce: commerce.clone(),
        notifier: Arc::new(notifier),
        sweeper: Arc::new(sweeper),
        config: Arc::new(config.clone()),
        notify_config: Arc::new(notify_config),
    };

    TestApp {
        router: build_app_router(state, &config),
        commerce,
        log,
        telegram,
        whatsapp,
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

/// POST a JSON body with extra headers.
pub async fn post_json(
    app: &TestApp,
    uri: &str,
    headers: &[(&str, &str)],
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

/// POST to an internal endpoint with the API key.
pub async fn post_internal(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let auth = format!("Bearer {API_KEY}");
    post_json(app, uri, &[("authorization", auth.as_str())], body).await
}

/// POST a Telegram update with the webhook secret.
pub async fn post_update(app: &TestApp, update: serde_json::Value) -> Response<Body> {
    post_json(
        app,
        "/api/v1/telegram/webhook",
        &[("x-telegram-bot-api-secret-token", WEBHOOK_SECRET)],
        update,
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A `callback_query` update pressed by an admin in `ADMIN_CHAT`.
pub fn callback_update(data: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": 1001,
        "callback_query": {
            "id": "cbq-1",
            "from": { "id": 4242, "username": "rfs_admin", "first_name": "Admin" },
            "message": {
                "message_id": 77,
                "chat": { "id": ADMIN_CHAT.parse::<i64>().unwrap() },
                "text": "original notification"
            },
            "data": data
        }
    })
}

/// A text `message` update from `chat_id`.
pub fn message_update(chat_id: i64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": 1002,
        "message": {
            "message_id": 12,
            "chat": { "id": chat_id },
            "from": { "id": chat_id, "first_name": "Someone" },
            "text": text
        }
    })
}
