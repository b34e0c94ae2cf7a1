//! Chat commands: `/start`, `/help`, `/chatid`, `/status`.

use rfs_events::delivery::telegram::Message;

use crate::state::AppState;

/// A recognised chat command. Anything else is [`Command::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    ChatId,
    Status,
    Unknown,
}

impl Command {
    /// Parse the first word of a message. A bot suffix (`/start@rfs_bot`) is
    /// ignored.
    pub fn parse(text: &str) -> Self {
        let word = text.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();

        match name.to_ascii_lowercase().as_str() {
            "/start" => Command::Start,
            "/help" => Command::Help,
            "/chatid" => Command::ChatId,
            "/status" => Command::Status,
            _ => Command::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::ChatId => "chatid",
            Command::Status => "status",
            Command::Unknown => "unknown",
        }
    }

    /// HTML reply for this command sent from `chat_id`.
    pub fn reply(self, chat_id: i64) -> String {
        match self {
            Command::Start => format!(
                "🎉 <b>Welcome to RFS_STORE Bot!</b>\n\n\
                 Your Chat ID: <code>{chat_id}</code>\n\n\
                 Bot ini akan mengirimkan notifikasi untuk:\n\
                 • 🆕 Pesanan baru\n\
                 • 📄 Invoice baru\n\
                 • 💰 Pembayaran masuk\n\
                 • ✅ Status pesanan\n\n\
                 Simpan Chat ID Anda untuk konfigurasi admin!"
            ),
            Command::Help => "📚 <b>RFS_STORE Bot Commands:</b>\n\n\
                 /start - Start bot &amp; get Chat ID\n\
                 /help - Show this help message\n\
                 /chatid - Get your Chat ID\n\
                 /status - Check bot status\n\n\
                 Need help? Contact admin."
                .to_string(),
            Command::ChatId => format!(
                "🆔 Your Chat ID: <code>{chat_id}</code>\n\n\
                 Use this ID for admin configuration."
            ),
            Command::Status => "✅ <b>Bot Status: Online</b>\n\n\
                 Bot is running and ready to send notifications!"
                .to_string(),
            Command::Unknown => "❓ Perintah tidak dikenal.\n\n\
                 Ketik /help untuk melihat daftar perintah."
                .to_string(),
        }
    }
}

/// Answer a chat message. Messages without text are ignored.
pub async fn handle_message(state: &AppState, message: &Message) -> Option<Command> {
    let text = message.text.as_deref()?;
    let command = Command::parse(text);
    let chat_id = message.chat.id;

    tracing::info!(chat_id, command = command.name(), "Bot command received");
    super::reply(state, &chat_id.to_string(), &command.reply(chat_id)).await;
    Some(command)
}
