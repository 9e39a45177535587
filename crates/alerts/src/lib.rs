//! Telegram alerts for the Sui ops tools.
//!
//! This crate provides:
//! - Telegram Bot API configuration from the environment
//! - A `sendMessage` client with Markdown escaping
//! - Profit alert formatting and the `Notifier` seam used by the monitor

pub mod config;
pub mod notifier;
pub mod telegram;

pub use config::TelegramConfig;
pub use notifier::{
    format_profit_message, local_hostname, LogNotifier, Notifier, NotifierError, ProfitAlert,
    RecordingNotifier,
};
pub use telegram::{
    check_send_response, escape_markdown, send_message_payload, TelegramError, TelegramNotifier,
};
