//! Telegram Bot API client.

use crate::config::TelegramConfig;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error {code}: {description}")]
    Api { code: u16, description: String },
}

/// Escape the characters legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Body of a `sendMessage` call.
pub fn send_message_payload(config: &TelegramConfig, text: &str) -> Value {
    let mut payload = json!({
        "chat_id": config.chat_id,
        "text": text,
        "parse_mode": "Markdown",
        "disable_web_page_preview": true,
    });
    if let Some(thread_id) = config.thread_id {
        payload["message_thread_id"] = json!(thread_id);
    }
    payload
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

/// Sends Markdown messages to one chat through the Bot API.
pub struct TelegramNotifier {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Send a message with Markdown parse mode.
    pub async fn send_markdown(&self, text: &str) -> Result<(), TelegramError> {
        let payload = send_message_payload(&self.config, text);
        let response = self
            .http_client
            .post(self.config.send_message_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        check_send_response(status, &body)?;
        debug!(chat = %self.config.masked_chat_id(), "Telegram message sent");
        Ok(())
    }
}

/// Classify a `sendMessage` reply. Success needs both a 2xx status and `ok: true`.
pub fn check_send_response(status: StatusCode, body: &str) -> Result<(), TelegramError> {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(api) if api.ok && status.is_success() => Ok(()),
        Ok(api) => Err(TelegramError::Api {
            code: api.error_code.unwrap_or(status.as_u16()),
            description: api.description.unwrap_or_else(|| body.to_string()),
        }),
        Err(_) => {
            warn!("Telegram API returned non-JSON body with status {}", status);
            Err(TelegramError::Api {
                code: status.as_u16(),
                description: body.to_string(),
            })
        }
    }
}
