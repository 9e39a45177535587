//! Periodic bot restart loop.

use crate::config::RestarterConfig;
use crate::tmux::{TmuxError, TmuxSession};
use chrono::{DateTime, Local};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Counters reported on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartStats {
    pub attempts: u64,
    pub failures: u64,
}

/// Restarts the bot's tmux session on a fixed schedule.
pub struct Restarter {
    config: RestarterConfig,
    session: TmuxSession,
    stats: RestartStats,
}

impl Restarter {
    pub fn new(config: RestarterConfig, session: TmuxSession) -> Self {
        Self {
            config,
            session,
            stats: RestartStats::default(),
        }
    }

    pub fn stats(&self) -> RestartStats {
        self.stats
    }

    /// Run one kill / create / start cycle.
    pub async fn restart_once(&mut self) -> Result<(), TmuxError> {
        self.stats.attempts += 1;
        info!("Restarting bot in tmux session `{}`...", self.session.name());

        let result = self.session.restart(&self.config.full_command()).await;
        if let Err(e) = &result {
            self.stats.failures += 1;
            log_tmux_error(e);
        }
        result
    }

    /// How long to wait after a cycle with the given outcome.
    pub fn delay_after(&self, result: &Result<(), TmuxError>) -> Duration {
        match result {
            Ok(()) => self.config.interval(),
            Err(_) => self.config.retry_delay(),
        }
    }

    /// Restart, sleep, repeat until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let result = self.restart_once().await;
            let delay = self.delay_after(&result);

            match result {
                Ok(()) => info!(
                    "Restart complete. Next restart at {}",
                    format_next_run(Local::now(), delay)
                ),
                Err(_) => info!("Retrying in {:?}", delay),
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Restarter stopped");
    }
}

fn log_tmux_error(err: &TmuxError) {
    match err {
        TmuxError::CommandFailed {
            command,
            status,
            stderr,
        } => {
            error!("tmux command failed: {}", command);
            error!("  exit status: {:?}", status);
            if !stderr.is_empty() {
                error!("  stderr: {}", stderr);
            }
        }
        TmuxError::Spawn { .. } => error!("{}", err),
    }
}

/// Local wall-clock time `delay` after `now`, as `%Y-%m-%d %H:%M:%S`.
/// Returns "unknown" when the result is outside the representable range.
pub fn format_next_run(now: DateTime<Local>, delay: Duration) -> String {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay))
        .map(|next| next.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
