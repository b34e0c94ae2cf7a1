//! Contact details a notification can be delivered to.

use serde::Serialize;

use crate::channels::ChannelKind;

/// The contact methods known for one recipient.
///
/// Blank values are treated as absent, so a profile with `phone = ""` has no
/// WhatsApp contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipientSet {
    pub telegram_id: Option<String>,
    pub phone: Option<String>,
}

impl RecipientSet {
    pub fn new(telegram_id: Option<String>, phone: Option<String>) -> Self {
        Self {
            telegram_id: non_blank(telegram_id),
            phone: non_blank(phone),
        }
    }

    /// True when no contact method can be resolved.
    pub fn is_empty(&self) -> bool {
        self.telegram_id.is_none() && self.phone.is_none()
    }

    /// Keep only the contacts for the given channels.
    pub fn restricted_to(&self, channels: &[ChannelKind]) -> Self {
        Self {
            telegram_id: self
                .telegram_id
                .clone()
                .filter(|_| channels.contains(&ChannelKind::Telegram)),
            phone: self
                .phone
                .clone()
                .filter(|_| channels.contains(&ChannelKind::WhatsApp)),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contacts_are_absent() {
        let r = RecipientSet::new(Some("  ".into()), Some(String::new()));
        assert!(r.is_empty());
    }

    #[test]
    fn restriction_drops_unrequested_channels() {
        let r = RecipientSet::new(Some("12345".into()), Some("0812".into()));
        let only_wa = r.restricted_to(&[ChannelKind::WhatsApp]);
        assert_eq!(only_wa.telegram_id, None);
        assert_eq!(only_wa.phone.as_deref(), Some("0812"));
        assert_eq!(r.restricted_to(&ChannelKind::ALL), r);
    }
}
