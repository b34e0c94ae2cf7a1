pub mod notify;
pub mod telegram_webhook;
