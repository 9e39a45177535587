//! Balance polling loop.

use crate::config::MonitorConfig;
use std::future::Future;
use std::sync::Arc;
use sui_ops_alerts::{Notifier, ProfitAlert};
use sui_ops_core::{explorer_tx_url, Observation, ProfitTracker};
use sui_ops_rpc::{ChainClient, RpcResult};
use tracing::{debug, error, info, warn};

/// Counters reported on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub ticks: u64,
    pub failed_reads: u64,
    pub profits_detected: u64,
    pub alerts_sent: u64,
    pub alerts_failed: u64,
}

/// Polls one address and alerts when its balance jumps by at least the threshold.
pub struct ProfitMonitor {
    config: MonitorConfig,
    chain: Arc<dyn ChainClient>,
    notifier: Arc<dyn Notifier>,
    tracker: ProfitTracker,
    stats: MonitorStats,
}

impl ProfitMonitor {
    pub fn new(
        config: MonitorConfig,
        chain: Arc<dyn ChainClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tracker = ProfitTracker::new(config.threshold);
        Self {
            config,
            chain,
            notifier,
            tracker,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn tracker(&self) -> &ProfitTracker {
        &self.tracker
    }

    /// Seed the baseline from the current balance so startup is not reported as profit.
    pub async fn initialize(&mut self) {
        match self.chain.balance(&self.config.address).await {
            Ok(balance) if !balance.is_zero() => {
                self.tracker.seed(balance);
                info!(
                    "Initial balance: {} ({} SUI)",
                    balance,
                    balance.to_sui_string()
                );
            }
            Ok(_) => {
                info!("Initial balance is zero; waiting for the first non-zero reading");
            }
            Err(e) => {
                warn!("Failed to fetch initial balance, starting without baseline: {}", e);
            }
        }
    }

    /// One poll: read the balance, update the tracker, alert on profit.
    pub async fn tick(&mut self) -> RpcResult<Observation> {
        self.stats.ticks += 1;

        let balance = match self.chain.balance(&self.config.address).await {
            Ok(balance) => balance,
            Err(e) => {
                self.stats.failed_reads += 1;
                return Err(e);
            }
        };

        let observation = self.tracker.observe(balance);
        match observation {
            Observation::Unavailable => match self.tracker.last_balance() {
                Some(previous) => debug!(
                    "Balance read as zero (previous {}), skipping",
                    previous
                ),
                None => debug!("Balance read as zero and no baseline yet, skipping"),
            },
            Observation::Baseline(balance) => {
                info!("Baseline balance set: {} SUI", balance.to_sui_string());
            }
            Observation::Unchanged(_) => {}
            Observation::Changed { previous, current } => {
                debug!(
                    previous = %previous,
                    current = %current,
                    "Balance changed below threshold"
                );
            }
            Observation::Profit {
                previous,
                current,
                profit,
            } => {
                self.stats.profits_detected += 1;
                info!(
                    previous = %previous.to_sui_string(),
                    current = %current.to_sui_string(),
                    profit = %profit.to_sui_string(),
                    "🎯 Profit above threshold"
                );

                let tx_url = self.lookup_tx_url().await;
                let alert = ProfitAlert::new(previous, current, profit).with_tx_url(tx_url);
                self.send_alert(&alert).await;
            }
        }

        Ok(observation)
    }

    async fn lookup_tx_url(&self) -> Option<String> {
        match self.chain.latest_incoming_tx(&self.config.address).await {
            Ok(Some(digest)) => Some(explorer_tx_url(&self.config.explorer_tx_url, &digest)),
            Ok(None) => {
                warn!("No incoming transaction found for profit");
                None
            }
            Err(e) => {
                warn!("Failed to look up profit transaction: {}", e);
                None
            }
        }
    }

    async fn send_alert(&mut self, alert: &ProfitAlert) {
        match self.notifier.notify(alert).await {
            Ok(()) => {
                self.stats.alerts_sent += 1;
                debug!(notifier = self.notifier.name(), "Alert delivered");
            }
            Err(e) => {
                self.stats.alerts_failed += 1;
                error!(notifier = self.notifier.name(), "Failed to send profit alert: {}", e);
            }
        }
    }

    /// Poll until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            "Monitoring {} every {:?}",
            self.config.address.short(),
            self.config.interval
        );

        loop {
            let mut delay = self.config.interval;
            if let Err(e) = self.tick().await {
                warn!("Balance read failed: {}", e);
                if let Some(extra) = e.suggested_retry_delay() {
                    delay = delay.max(extra);
                }
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Profit monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use sui_ops_alerts::RecordingNotifier;
    use sui_ops_core::{Mist, SuiAddress};
    use sui_ops_rpc::{MockChainClient, RpcError};

    fn config() -> MonitorConfig {
        let mut config = MonitorConfig::new(
            SuiAddress::parse("0xfeed").unwrap(),
            "http://localhost:9000",
        );
        config.threshold = Mist(500_000_000);
        config.interval = Duration::from_millis(5);
        config
    }

    fn monitor(
        chain: Arc<MockChainClient>,
        notifier: Arc<RecordingNotifier>,
    ) -> ProfitMonitor {
        ProfitMonitor::new(config(), chain, notifier)
    }

    #[tokio::test]
    async fn test_initialize_seeds_baseline() {
        let chain = Arc::new(MockChainClient::new().with_balances([Ok(Mist::from_sui(10))]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain, notifier);

        monitor.initialize().await;
        assert_eq!(monitor.tracker().last_balance(), Some(Mist::from_sui(10)));
    }

    #[tokio::test]
    async fn test_initialize_failure_leaves_no_baseline() {
        let chain = Arc::new(
            MockChainClient::new().with_balances([Err(RpcError::Transport("down".into()))]),
        );
        let mut monitor = monitor(chain, Arc::new(RecordingNotifier::new()));

        monitor.initialize().await;
        assert_eq!(monitor.tracker().last_balance(), None);
    }

    #[tokio::test]
    async fn test_profit_sends_alert_with_tx_link() {
        let chain = Arc::new(
            MockChainClient::new()
                .with_balances([Ok(Mist(10_000_000_000)), Ok(Mist(10_600_000_000))])
                .with_latest_tx("9kDigest"),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain, notifier.clone());

        monitor.initialize().await;
        let observation = monitor.tick().await.unwrap();
        assert!(observation.is_profit());

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].previous, Mist(10_000_000_000));
        assert_eq!(alerts[0].current, Mist(10_600_000_000));
        assert_eq!(alerts[0].profit, Mist(600_000_000));
        assert_eq!(
            alerts[0].tx_url.as_deref(),
            Some("https://suivision.xyz/txblock/9kDigest")
        );
        assert_eq!(monitor.stats().alerts_sent, 1);
    }

    #[tokio::test]
    async fn test_small_gain_does_not_alert() {
        let chain = Arc::new(MockChainClient::new().with_balances([
            Ok(Mist(10_000_000_000)),
            Ok(Mist(10_400_000_000)),
        ]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain, notifier.clone());

        monitor.initialize().await;
        monitor.tick().await.unwrap();
        assert!(notifier.alerts().is_empty());
        assert_eq!(monitor.tracker().last_balance(), Some(Mist(10_400_000_000)));
    }

    #[tokio::test]
    async fn test_first_reading_after_failed_init_is_baseline_not_profit() {
        let chain = Arc::new(MockChainClient::new().with_balances([
            Err(RpcError::Transport("down".into())),
            Ok(Mist::from_sui(50)),
        ]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain, notifier.clone());

        monitor.initialize().await;
        assert_eq!(
            monitor.tick().await.unwrap(),
            Observation::Baseline(Mist::from_sui(50))
        );
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_read_error_keeps_baseline() {
        let chain = Arc::new(MockChainClient::new().with_balances([
            Ok(Mist::from_sui(10)),
            Err(RpcError::HttpStatus { status: 502, body: String::new() }),
            Ok(Mist::from_sui(11)),
        ]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain, notifier.clone());

        monitor.initialize().await;
        assert!(monitor.tick().await.is_err());
        assert_eq!(monitor.tracker().last_balance(), Some(Mist::from_sui(10)));

        assert!(monitor.tick().await.unwrap().is_profit());
        assert_eq!(notifier.alerts().len(), 1);
        assert_eq!(monitor.stats().failed_reads, 1);
    }

    #[tokio::test]
    async fn test_alert_sent_without_link_when_tx_lookup_fails() {
        let chain = Arc::new(
            MockChainClient::new()
                .with_balances([Ok(Mist::from_sui(1)), Ok(Mist::from_sui(2))])
                .with_failing_tx_lookup(),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain, notifier.clone());

        monitor.initialize().await;
        monitor.tick().await.unwrap();

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].tx_url, None);
    }

    #[tokio::test]
    async fn test_notifier_failure_is_counted_not_fatal() {
        let chain = Arc::new(MockChainClient::new().with_balances([
            Ok(Mist::from_sui(1)),
            Ok(Mist::from_sui(2)),
            Ok(Mist::from_sui(3)),
        ]));
        let notifier = Arc::new(RecordingNotifier::failing());
        let mut monitor = monitor(chain, notifier.clone());

        monitor.initialize().await;
        monitor.tick().await.unwrap();
        monitor.tick().await.unwrap();

        let stats = monitor.stats();
        assert_eq!(stats.profits_detected, 2);
        assert_eq!(stats.alerts_failed, 2);
        assert_eq!(stats.alerts_sent, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let chain = Arc::new(MockChainClient::new().with_balances([Ok(Mist::from_sui(1))]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut monitor = monitor(chain.clone(), notifier);

        monitor
            .run(tokio::time::sleep(Duration::from_millis(40)))
            .await;

        assert!(chain.balance_calls() >= 2);
        assert_eq!(monitor.stats().ticks as u32, chain.balance_calls());
    }
}
