//! RFS Store notification delivery.
//!
//! - [`delivery`]: Telegram Bot API and Fonnte WhatsApp adapters, each
//!   returning a [`DeliveryResult`] instead of an error.
//! - [`NotificationEvent`]: what happened, with the fields templates need.
//! - [`templates`]: Telegram HTML renderings per event and audience.
//! - [`NotificationRouter`]: customer and admin fan-out with per-dispatch
//!   logging.
//! - [`RetrySweeper`]: periodic re-delivery of log entries left `pending`.

pub mod delivery;
pub mod event;
pub mod router;
pub mod sweeper;
pub mod templates;

pub use delivery::telegram::{TelegramApi, TelegramClient};
pub use delivery::whatsapp::{FonnteClient, WhatsAppApi};
pub use delivery::{Channels, DeliveryResult};
pub use event::NotificationEvent;
pub use router::{AdminContacts, AdminDispatch, CustomerDispatch, NotificationRouter, RouterSettings};
pub use sweeper::{RetrySweeper, SweepReport, SweepSettings};
pub use templates::TemplateContext;

#[cfg(test)]
pub(crate) mod test_support;
