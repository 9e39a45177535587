//! Balance-delta tracking for profit detection.

use crate::Mist;
use serde::{Deserialize, Serialize};

/// Default profit threshold: 0.5 SUI.
pub const DEFAULT_PROFIT_THRESHOLD: Mist = Mist(500_000_000);

/// Default block explorer transaction URL prefix.
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://suivision.xyz/txblock/";

/// Outcome of feeding one balance reading into a [`ProfitTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observation {
    /// Zero balance; treated as an unusable reading, baseline untouched.
    Unavailable,
    /// First usable reading; stored as the baseline.
    Baseline(Mist),
    /// Same balance as last time.
    Unchanged(Mist),
    /// Balance moved but the gain is below the threshold (or it dropped).
    Changed { previous: Mist, current: Mist },
    /// Gain reached the threshold.
    Profit {
        previous: Mist,
        current: Mist,
        profit: Mist,
    },
}

impl Observation {
    pub fn is_profit(&self) -> bool {
        matches!(self, Observation::Profit { .. })
    }
}

/// Remembers the last seen balance and flags gains at or above a threshold.
#[derive(Debug, Clone)]
pub struct ProfitTracker {
    threshold: Mist,
    last: Option<Mist>,
}

impl Default for ProfitTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PROFIT_THRESHOLD)
    }
}

impl ProfitTracker {
    pub fn new(threshold: Mist) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    pub fn threshold(&self) -> Mist {
        self.threshold
    }

    pub fn last_balance(&self) -> Option<Mist> {
        self.last
    }

    /// Set the starting baseline. Zero leaves the tracker unseeded.
    pub fn seed(&mut self, balance: Mist) {
        if !balance.is_zero() {
            self.last = Some(balance);
        }
    }

    /// Record a reading. Every non-zero reading replaces the baseline,
    /// including decreases, so a later recovery is not counted as profit.
    pub fn observe(&mut self, current: Mist) -> Observation {
        if current.is_zero() {
            return Observation::Unavailable;
        }

        let Some(previous) = self.last.replace(current) else {
            return Observation::Baseline(current);
        };

        if current == previous {
            return Observation::Unchanged(current);
        }

        match current.checked_gain(previous) {
            Some(profit) if profit >= self.threshold => Observation::Profit {
                previous,
                current,
                profit,
            },
            _ => Observation::Changed { previous, current },
        }
    }
}

/// Explorer link for a transaction digest.
pub fn explorer_tx_url(base: &str, digest: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, digest)
    } else {
        format!("{}/{}", base, digest)
    }
}
