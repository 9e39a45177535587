//! Profit alert formatting and delivery.

use crate::telegram::{escape_markdown, TelegramError, TelegramNotifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use sui_ops_core::Mist;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

/// A balance gain that crossed the alert threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitAlert {
    pub previous: Mist,
    pub current: Mist,
    pub profit: Mist,
    /// Explorer link to the transaction that most likely produced the gain
    pub tx_url: Option<String>,
    /// Machine the monitor runs on
    pub host: String,
    pub timestamp: DateTime<Utc>,
}

impl ProfitAlert {
    pub fn new(previous: Mist, current: Mist, profit: Mist) -> Self {
        Self {
            previous,
            current,
            profit,
            tx_url: None,
            host: local_hostname(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_tx_url(mut self, tx_url: Option<String>) -> Self {
        self.tx_url = tx_url;
        self
    }
}

/// Hostname of this machine, or "unknown".
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Render an alert as a Telegram Markdown message.
pub fn format_profit_message(alert: &ProfitAlert) -> String {
    let headline = match &alert.tx_url {
        Some(url) => {
            let url = escape_markdown(url);
            format!("*Large profit detected*: [{}]({})", url, url)
        }
        None => "*Large profit detected*".to_string(),
    };

    format!(
        "{}\n\
         *Previous balance*: `{}` SUI\n\
         *Current balance*: `{}` SUI\n\
         *Profit*: `{}` SUI\n\
         _{}_ · {}",
        headline,
        alert.previous.to_sui_string(),
        alert.current.to_sui_string(),
        alert.profit.to_sui_string(),
        escape_markdown(&alert.host),
        alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Destination for profit alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, alert: &ProfitAlert) -> Result<(), NotifierError>;
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify(&self, alert: &ProfitAlert) -> Result<(), NotifierError> {
        self.send_markdown(&format_profit_message(alert)).await?;
        Ok(())
    }
}

/// Writes alerts to the log only. Used when Telegram is not configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, alert: &ProfitAlert) -> Result<(), NotifierError> {
        info!(
            previous = %alert.previous.to_sui_string(),
            current = %alert.current.to_sui_string(),
            profit = %alert.profit.to_sui_string(),
            tx = alert.tx_url.as_deref().unwrap_or("-"),
            "💰 Large profit detected"
        );
        Ok(())
    }
}

/// Keeps every alert in memory. For tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<ProfitAlert>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record alerts but report every delivery as failed.
    pub fn failing() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn alerts(&self) -> Vec<ProfitAlert> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, alert: &ProfitAlert) -> Result<(), NotifierError> {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(alert.clone());
        }
        if self.fail {
            return Err(NotifierError::Telegram(TelegramError::Api {
                code: 500,
                description: "recording notifier set to fail".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn alert() -> ProfitAlert {
        ProfitAlert {
            previous: Mist(10_000_000_000),
            current: Mist(10_750_000_000),
            profit: Mist(750_000_000),
            tx_url: Some("https://suivision.xyz/txblock/Ab_c".to_string()),
            host: "arb_node".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_with_tx_link() {
        let msg = format_profit_message(&alert());
        assert_eq!(
            msg,
            "*Large profit detected*: [https://suivision.xyz/txblock/Ab\\_c](https://suivision.xyz/txblock/Ab\\_c)\n\
             *Previous balance*: `10.000000000` SUI\n\
             *Current balance*: `10.750000000` SUI\n\
             *Profit*: `0.750000000` SUI\n\
             _arb\\_node_ · 2026-10-19 08:30:00 UTC"
        );
    }

    #[test]
    fn test_format_without_tx_link() {
        let msg = format_profit_message(&alert().with_tx_url(None));
        assert!(msg.starts_with("*Large profit detected*\n"));
        assert!(!msg.contains("]("));
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&alert()).await.unwrap();
        assert_eq!(notifier.alerts(), vec![alert()]);

        let failing = RecordingNotifier::failing();
        assert!(failing.notify(&alert()).await.is_err());
        assert_eq!(failing.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify(&alert()).await.is_ok());
        assert_eq!(LogNotifier.name(), "log");
    }
}
