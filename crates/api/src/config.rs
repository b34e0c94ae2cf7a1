use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rfs_core::phone::DEFAULT_COUNTRY_CODE;
use rfs_events::delivery::telegram::{TelegramError, DEFAULT_API_BASE};
use rfs_events::delivery::whatsapp::{WhatsAppError, DEFAULT_API_URL};
use rfs_events::router::AdminWhatsApp;
use rfs_events::{
    AdminContacts, Channels, FonnteClient, RouterSettings, SweepSettings, TelegramClient,
    TemplateContext,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Request timeout for the health and notify routes in seconds
    /// (default: `30`). The Telegram webhook is bounded by
    /// [`NotifyConfig::webhook_budget`] instead.
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `10`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `10`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            request_timeout_secs,
            shutdown_timeout_secs,
        }
    }
}

/// Channel credentials, admin contacts and delivery tuning.
///
/// Every credential is optional: a missing bot token or gateway token turns
/// that channel into a no-op, and a missing webhook secret or internal API
/// key makes the matching endpoint reject every request.
///
/// `Debug` output redacts every credential.
#[derive(Clone)]
pub struct NotifyConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_api_base: String,
    pub telegram_admin_chat_ids: Vec<String>,
    pub telegram_webhook_secret: Option<String>,
    pub fonnte_token: Option<String>,
    pub fonnte_api_url: String,
    pub whatsapp_admins: Vec<AdminWhatsApp>,
    pub country_code: String,
    pub frontend_url: String,
    pub utc_offset_hours: i32,
    pub provider_timeout_secs: u64,
    pub internal_api_key: Option<String>,
    pub sweep_interval_secs: u64,
    pub sweep_min_age_secs: u64,
    pub sweep_batch_size: i64,
    pub sweep_item_delay_ms: u64,
    pub sweep_claim_lease_secs: u64,
}

/// Offsets outside this range are not real time zones.
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -12..=14;

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");

        f.debug_struct("NotifyConfig")
            .field("telegram_bot_token", &redacted(&self.telegram_bot_token))
            .field("telegram_api_base", &self.telegram_api_base)
            .field("telegram_admin_chat_ids", &self.telegram_admin_chat_ids)
            .field("telegram_webhook_secret", &redacted(&self.telegram_webhook_secret))
            .field("fonnte_token", &redacted(&self.fonnte_token))
            .field("fonnte_api_url", &self.fonnte_api_url)
            .field("whatsapp_admins", &self.whatsapp_admins)
            .field("country_code", &self.country_code)
            .field("frontend_url", &self.frontend_url)
            .field("utc_offset_hours", &self.utc_offset_hours)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("internal_api_key", &redacted(&self.internal_api_key))
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("sweep_min_age_secs", &self.sweep_min_age_secs)
            .field("sweep_batch_size", &self.sweep_batch_size)
            .field("sweep_item_delay_ms", &self.sweep_item_delay_ms)
            .field("sweep_claim_lease_secs", &self.sweep_claim_lease_secs)
            .finish()
    }
}

/// Failure to construct a channel client at startup.
#[derive(Debug, thiserror::Error)]
pub enum ChannelSetupError {
    #[error("Telegram client: {0}")]
    Telegram(#[from] TelegramError),

    #[error("WhatsApp client: {0}")]
    WhatsApp(#[from] WhatsAppError),
}

impl NotifyConfig {
    /// Load from the process environment.
    ///
    /// | Env Var                   | Default                       |
    /// |---------------------------|-------------------------------|
    /// | `TELEGRAM_BOT_TOKEN`      | unset (Telegram disabled)     |
    /// | `TELEGRAM_API_BASE`       | `https://api.telegram.org`    |
    /// | `TELEGRAM_ADMIN_CHAT_IDS` | empty                         |
    /// | `TELEGRAM_WEBHOOK_SECRET` | unset (webhook rejects all)   |
    /// | `FONNTE_TOKEN`            | `FONNTE_DEVICE_TOKEN`, unset  |
    /// | `FONNTE_API_URL`          | `https://api.fonnte.com/send` |
    /// | `WHATSAPP_ADMIN_NUMBERS`  | empty (`label=number,...`)    |
    /// | `WHATSAPP_COUNTRY_CODE`   | `62`                          |
    /// | `FRONTEND_URL`            | `http://localhost:5173`       |
    /// | `NOTIFY_UTC_OFFSET_HOURS` | `7`                           |
    /// | `PROVIDER_TIMEOUT_SECS`   | `10`                          |
    /// | `INTERNAL_API_KEY`        | unset (notify API rejects all)|
    /// | `SWEEP_INTERVAL_SECS`     | `60`                          |
    /// | `SWEEP_MIN_AGE_SECS`      | `30`                          |
    /// | `SWEEP_BATCH_SIZE`        | `50`                          |
    /// | `SWEEP_ITEM_DELAY_MS`     | `100`                         |
    /// | `SWEEP_CLAIM_LEASE_SECS`  | `300`                         |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables. Blank values count as unset.
    ///
    /// Panics on unparseable numbers and on a UTC offset outside
    /// [`UTC_OFFSET_RANGE`], like [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| -> String { get(key).unwrap_or_else(|| default.into()) };

        let utc_offset_hours: i32 = or_default("NOTIFY_UTC_OFFSET_HOURS", "7")
            .parse()
            .expect("NOTIFY_UTC_OFFSET_HOURS must be a valid i32");
        assert!(
            UTC_OFFSET_RANGE.contains(&utc_offset_hours),
            "NOTIFY_UTC_OFFSET_HOURS must be between -12 and 14, got {utc_offset_hours}"
        );

        Self {
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_api_base: or_default("TELEGRAM_API_BASE", DEFAULT_API_BASE),
            telegram_admin_chat_ids: get("TELEGRAM_ADMIN_CHAT_IDS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            telegram_webhook_secret: get("TELEGRAM_WEBHOOK_SECRET"),
            fonnte_token: get("FONNTE_TOKEN").or_else(|| get("FONNTE_DEVICE_TOKEN")),
            fonnte_api_url: or_default("FONNTE_API_URL", DEFAULT_API_URL),
            whatsapp_admins: get("WHATSAPP_ADMIN_NUMBERS")
                .map(|v| parse_admin_numbers(&v))
                .unwrap_or_default(),
            country_code: or_default("WHATSAPP_COUNTRY_CODE", DEFAULT_COUNTRY_CODE),
            frontend_url: or_default("FRONTEND_URL", "http://localhost:5173"),
            utc_offset_hours,
            provider_timeout_secs: or_default("PROVIDER_TIMEOUT_SECS", "10")
                .parse()
                .expect("PROVIDER_TIMEOUT_SECS must be a valid u64"),
            internal_api_key: get("INTERNAL_API_KEY"),
            sweep_interval_secs: or_default("SWEEP_INTERVAL_SECS", "60")
                .parse()
                .expect("SWEEP_INTERVAL_SECS must be a valid u64"),
            sweep_min_age_secs: or_default("SWEEP_MIN_AGE_SECS", "30")
                .parse()
                .expect("SWEEP_MIN_AGE_SECS must be a valid u64"),
            sweep_batch_size: or_default("SWEEP_BATCH_SIZE", "50")
                .parse()
                .expect("SWEEP_BATCH_SIZE must be a valid i64"),
            sweep_item_delay_ms: or_default("SWEEP_ITEM_DELAY_MS", "100")
                .parse()
                .expect("SWEEP_ITEM_DELAY_MS must be a valid u64"),
            sweep_claim_lease_secs: or_default("SWEEP_CLAIM_LEASE_SECS", "300")
                .parse()
                .expect("SWEEP_CLAIM_LEASE_SECS must be a valid u64"),
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Upper bound on handling one webhook update: the callback answer, then
    /// the chat reply and follow-up notifications running side by side.
    pub fn webhook_budget(&self) -> Duration {
        self.provider_timeout() * 2 + Duration::from_secs(5)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn templates(&self) -> TemplateContext {
        TemplateContext::new(&self.frontend_url, self.utc_offset_hours)
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            admins: AdminContacts {
                telegram_chat_ids: self.telegram_admin_chat_ids.clone(),
                whatsapp: self.whatsapp_admins.clone(),
            },
            templates: self.templates(),
            country_code: self.country_code.clone(),
            dispatch_timeout: self.provider_timeout(),
        }
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            batch_size: self.sweep_batch_size,
            min_age: Duration::from_secs(self.sweep_min_age_secs),
            item_delay: Duration::from_millis(self.sweep_item_delay_ms),
            dispatch_timeout: self.provider_timeout(),
            claim_lease: Duration::from_secs(self.sweep_claim_lease_secs),
        }
    }

    /// Build the provider clients for every channel with credentials.
    pub fn build_channels(&self) -> Result<Channels, ChannelSetupError> {
        let mut channels = Channels::default();

        match &self.telegram_bot_token {
            Some(token) => {
                let client =
                    TelegramClient::new(&self.telegram_api_base, token, self.provider_timeout())?;
                channels.telegram = Some(Arc::new(client));
            }
            None => tracing::warn!("TELEGRAM_BOT_TOKEN not set, Telegram channel disabled"),
        }

        match &self.fonnte_token {
            Some(token) => {
                let client = FonnteClient::new(
                    self.fonnte_api_url.clone(),
                    token.clone(),
                    self.country_code.clone(),
                    self.provider_timeout(),
                )?;
                channels.whatsapp = Some(Arc::new(client));
            }
            None => tracing::warn!("FONNTE_TOKEN not set, WhatsApp channel disabled"),
        }

        Ok(channels)
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `label=number` pairs. A bare number is labelled with itself.
pub fn parse_admin_numbers(raw: &str) -> Vec<AdminWhatsApp> {
    parse_list(raw)
        .into_iter()
        .filter_map(|pair| {
            let (label, number) = match pair.split_once('=') {
                Some((label, number)) => (label.trim(), number.trim()),
                None => (pair.as_str(), pair.as_str()),
            };
            if number.is_empty() {
                return None;
            }
            let label = if label.is_empty() { number } else { label };
            Some(AdminWhatsApp {
                label: label.to_string(),
                number: number.to_string(),
            })
        })
        .collect()
}
