use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, Recipient},
};
use tracing::{debug, warn};

use common::{Error, Notifier, Result};

/// Sends alert text to one Telegram chat through the Bot API.
///
/// One `sendMessage` call per alert. Failures are logged and reported as
/// `false`; nothing is retried or queued.
pub struct TelegramNotifier {
    bot: Bot,
    chat: Recipient,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: &str) -> Self {
        Self {
            bot: Bot::new(token),
            chat: parse_recipient(chat_id),
        }
    }

    /// Use another Bot API host, e.g. a local `telegram-bot-api` server.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        let url = url::Url::parse(api_url)
            .map_err(|e| Error::Config(format!("invalid Telegram API url '{api_url}': {e}")))?;
        self.bot = self.bot.set_api_url(url);
        Ok(self)
    }
}

/// Numeric ids address users, groups and channels; anything else is taken as a
/// public `@channel` username.
fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if chat_id.starts_with('@') => Recipient::ChannelUsername(chat_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{chat_id}")),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> bool {
        match self.bot.send_message(self.chat.clone(), text).await {
            Ok(_) => {
                debug!("Telegram notification sent");
                true
            }
            Err(e) => {
                warn!(chat = ?self.chat, error = %e, "Failed to send Telegram notification");
                false
            }
        }
    }
}
