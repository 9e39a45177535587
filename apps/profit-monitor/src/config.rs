//! Monitor configuration.

use std::time::Duration;
use sui_ops_core::{
    AddressError, Mist, SuiAddress, DEFAULT_EXPLORER_TX_URL, DEFAULT_PROFIT_THRESHOLD,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid profit address: {0}")]
    Address(#[from] AddressError),

    #[error("RPC URL must be an http(s) URL: {0}")]
    RpcUrl(String),

    #[error("Poll interval must be at least 1 ms")]
    ZeroInterval,

    #[error("Profit threshold must be at least 1 MIST")]
    ZeroThreshold,
}

/// Settings for one profit monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Address whose balance is watched
    pub address: SuiAddress,
    /// Fullnode JSON-RPC endpoint
    pub rpc_url: String,
    /// Minimum gain between two readings that triggers an alert
    pub threshold: Mist,
    /// Delay between polls
    pub interval: Duration,
    /// Explorer prefix for transaction links
    pub explorer_tx_url: String,
    /// Coin type to watch (None = SUI)
    pub coin_type: Option<String>,
}

impl MonitorConfig {
    pub fn new(address: SuiAddress, rpc_url: impl Into<String>) -> Self {
        Self {
            address,
            rpc_url: rpc_url.into(),
            threshold: DEFAULT_PROFIT_THRESHOLD,
            interval: Duration::from_secs(1),
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
            coin_type: None,
        }
    }

    /// Check the pieces that can be wrong on the command line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.rpc_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::RpcUrl(self.rpc_url.clone()));
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.threshold.is_zero() {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> MonitorConfig {
        MonitorConfig::new(
            SuiAddress::parse("0x1").unwrap(),
            "https://fullnode.mainnet.sui.io:443",
        )
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.threshold, Mist(500_000_000));
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.explorer_tx_url, "https://suivision.xyz/txblock/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = config();
        config.rpc_url = "fullnode.mainnet.sui.io".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::RpcUrl(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = config();
        config.interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = config();
        config.threshold = Mist::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroThreshold)));

        config.threshold = Mist(1);
        assert!(config.validate().is_ok());
    }
}
