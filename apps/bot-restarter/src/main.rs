//! Bot Restarter
//!
//! Kills and relaunches the arbitrage bot inside a tmux session on a fixed
//! schedule, so a wedged or leaking bot never runs for more than one interval.

mod config;
mod restarter;
mod tmux;

use clap::Parser;
use config::RestarterConfig;
use restarter::Restarter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tmux::{SystemRunner, TmuxSession};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Bot Restarter CLI
#[derive(Parser, Debug)]
#[command(name = "bot-restarter")]
#[command(about = "Periodically restart the arbitrage bot in tmux", long_about = None)]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// tmux session name
    #[arg(short, long)]
    session: Option<String>,

    /// Seconds between restarts
    #[arg(short, long)]
    interval_secs: Option<u64>,

    /// Log file path ("none" disables file logging)
    #[arg(long)]
    log_file: Option<String>,

    /// Restart once and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Console plus optional plain-text file output.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_logging(level: &str, log_file: Option<&str>) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = tracing_subscriber::fmt::layer().with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|f| f.to_os_string())
                .unwrap_or_else(|| config::DEFAULT_LOG_FILE.into());

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn build_config(args: &Args) -> Result<RestarterConfig, config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => RestarterConfig::load(path)?,
        None => RestarterConfig::default(),
    };

    if let Some(session) = &args.session {
        config.session_name = session.clone();
    }
    if let Some(interval) = args.interval_secs {
        config.interval_secs = interval;
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = if log_file.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(log_file.clone())
        };
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let log_guard = init_logging(&args.log_level, config.log_file.as_deref());

    info!("🚀 Bot restarter starting...");
    info!("  Session: {}", config.session_name);
    info!("  Command: {}", config.full_command());
    info!("  Interval: {}s", config.interval_secs);
    if let Some(log_file) = &config.log_file {
        info!("  Log file: {}", log_file);
    }

    let session = TmuxSession::new(
        config.tmux_bin.clone(),
        config.session_name.clone(),
        Arc::new(SystemRunner),
    )
    .with_working_dir(config.working_dir.clone());
    let mut restarter = Restarter::new(config, session);

    if args.once {
        let ok = restarter.restart_once().await.is_ok();
        drop(log_guard);
        std::process::exit(if ok { 0 } else { 1 });
    }

    restarter
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            warn!("Shutdown signal received");
        })
        .await;

    let stats = restarter.stats();
    info!(
        "👋 Bot restarter stopped after {} restarts ({} failed)",
        stats.attempts, stats.failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "bot-restarter",
            "--session",
            "arb-2",
            "--interval-secs",
            "900",
            "--log-file",
            "none",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.session_name, "arb-2");
        assert_eq!(config.interval_secs, 900);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_defaults_without_config_file() {
        let args = Args::parse_from(["bot-restarter"]);
        assert!(!args.once);
        assert_eq!(build_config(&args).unwrap(), RestarterConfig::default());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::parse_from(["bot-restarter", "--interval-secs", "0"]);
        assert!(build_config(&args).is_err());
    }
}
