//! Telegram configuration.

use serde::Deserialize;

/// Default Telegram Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Where and how to deliver Telegram messages.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Target chat (group or user) ID
    pub chat_id: String,
    /// Forum topic inside the group, if the group uses topics
    pub thread_id: Option<i64>,
    /// API base URL, overridable for self-hosted Bot API servers
    pub api_base: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("thread_id", &self.thread_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            thread_id: None,
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_thread_id(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Create config from environment variables.
    /// Uses TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID and optionally TELEGRAM_THREAD_ID
    /// and TELEGRAM_API_BASE.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")?;
        let chat_id = lookup("TELEGRAM_CHAT_ID")?;

        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return None;
        }

        let mut config = Self::new(bot_token.trim(), chat_id.trim());
        config.thread_id = lookup("TELEGRAM_THREAD_ID").and_then(|t| t.trim().parse().ok());
        if let Some(base) = lookup("TELEGRAM_API_BASE").filter(|b| !b.trim().is_empty()) {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }
        Some(config)
    }

    /// `sendMessage` endpoint for this bot.
    pub fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    /// Chat ID with all but the first few characters hidden, for logs.
    pub fn masked_chat_id(&self) -> String {
        let visible = self.chat_id.chars().take(6).collect::<String>();
        format!("{}…", visible)
    }
}
