//! Profit Monitor
//!
//! Polls a Sui address's balance and posts a Telegram alert when it grows by
//! more than a threshold between two polls.

mod config;
mod monitor;

use clap::Parser;
use config::MonitorConfig;
use monitor::ProfitMonitor;
use std::sync::Arc;
use std::time::Duration;
use sui_ops_alerts::{LogNotifier, Notifier, TelegramConfig, TelegramNotifier};
use sui_ops_core::{Mist, SuiAddress, DEFAULT_EXPLORER_TX_URL};
use sui_ops_rpc::{SuiRpcClient, SuiRpcConfig};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Profit Monitor CLI
#[derive(Parser, Debug)]
#[command(name = "profit-monitor")]
#[command(about = "Alert on large balance gains of a Sui address", long_about = None)]
struct Args {
    /// Sui fullnode JSON-RPC URL
    #[arg(short, long, env = "SUI_RPC_URL")]
    rpc_url: String,

    /// Address to watch
    #[arg(short, long, env = "PROFIT_ADDRESS")]
    address: String,

    /// Minimum gain between two polls that triggers an alert, in MIST
    #[arg(short, long, default_value_t = 500_000_000)]
    threshold_mist: u64,

    /// Poll interval in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Explorer URL prefix for transaction links
    #[arg(long, default_value = DEFAULT_EXPLORER_TX_URL)]
    explorer_url: String,

    /// Coin type to watch instead of SUI
    #[arg(long)]
    coin_type: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(level: &str) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn build_config(args: &Args) -> Result<MonitorConfig, config::ConfigError> {
    let address = SuiAddress::parse(&args.address)?;
    let mut config = MonitorConfig::new(address, args.rpc_url.trim());
    config.threshold = Mist(args.threshold_mist);
    config.interval = Duration::from_millis(args.interval_ms);
    config.explorer_tx_url = args.explorer_url.clone();
    config.coin_type = args.coin_type.clone();
    config.validate()?;
    Ok(config)
}

fn build_notifier() -> Arc<dyn Notifier> {
    let Some(telegram) = TelegramConfig::from_env() else {
        warn!("Telegram disabled (TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set), alerts go to the log");
        return Arc::new(LogNotifier);
    };

    info!(
        "Telegram alerts enabled (chat_id: {}, thread: {:?})",
        telegram.masked_chat_id(),
        telegram.thread_id
    );
    match TelegramNotifier::new(telegram) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!("Failed to create Telegram client, alerts go to the log: {}", e);
            Arc::new(LogNotifier)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    info!("🚀 Profit monitor starting...");
    info!("  Address: {}", config.address);
    info!("  RPC URL: {}", config.rpc_url);
    info!(
        "  Threshold: {} ({} SUI)",
        config.threshold,
        config.threshold.to_sui_string()
    );
    info!("  Interval: {:?}", config.interval);

    let mut rpc_config = SuiRpcConfig::new(config.rpc_url.clone());
    rpc_config.coin_type = config.coin_type.clone();
    let chain = match SuiRpcClient::new(rpc_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create RPC client: {}", e);
            std::process::exit(1);
        }
    };

    let notifier = build_notifier();

    let mut monitor = ProfitMonitor::new(config, chain, notifier);
    monitor.initialize().await;

    info!("Press Ctrl+C to stop...");
    monitor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            warn!("Shutdown signal received");
        })
        .await;

    let stats = monitor.stats();
    info!("📈 Final Stats:");
    info!("  Polls: {}", stats.ticks);
    info!("  Failed reads: {}", stats.failed_reads);
    info!("  Profits detected: {}", stats.profits_detected);
    info!("  Alerts sent: {} (failed: {})", stats.alerts_sent, stats.alerts_failed);
    if let Some(balance) = monitor.tracker().last_balance() {
        info!("  Last balance: {} SUI", balance.to_sui_string());
    }

    info!("👋 Profit monitor stopped");
}
