//! Outbound messaging channels.
//!
//! The string forms must match the `service_type` values stored in the
//! `notification_logs` table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Telegram Bot API channel.
pub const CHANNEL_TELEGRAM: &str = "telegram";

/// WhatsApp gateway channel (Fonnte-compatible).
pub const CHANNEL_WHATSAPP: &str = "whatsapp";

/// One delivery mechanism for outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Telegram,
    WhatsApp,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Telegram, ChannelKind::WhatsApp];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Telegram => CHANNEL_TELEGRAM,
            ChannelKind::WhatsApp => CHANNEL_WHATSAPP,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHANNEL_TELEGRAM => Ok(ChannelKind::Telegram),
            CHANNEL_WHATSAPP => Ok(ChannelKind::WhatsApp),
            other => Err(CoreError::Validation(format!(
                "unknown service type '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for ChannelKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_service_types() {
        assert_eq!("telegram".parse::<ChannelKind>().unwrap(), ChannelKind::Telegram);
        assert_eq!("whatsapp".parse::<ChannelKind>().unwrap(), ChannelKind::WhatsApp);
    }

    #[test]
    fn rejects_unknown_service_type() {
        let err = "sms".parse::<ChannelKind>().unwrap_err();
        assert!(err.to_string().contains("unknown service type 'sms'"));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ChannelKind::WhatsApp).unwrap();
        assert_eq!(json, "\"whatsapp\"");
    }
}
