//! SUI amounts in MIST.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Number of MIST in one SUI.
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Error parsing an amount string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid MIST amount: {0:?}")]
pub struct AmountParseError(pub String);

/// Amount of SUI expressed in MIST (10^-9 SUI).
/// Integer arithmetic only, so balances never pick up floating-point noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mist(pub u64);

impl Mist {
    pub const ZERO: Mist = Mist(0);

    /// Create from whole SUI.
    pub const fn from_sui(sui: u64) -> Self {
        Self(sui * MIST_PER_SUI)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Gain over `previous`, or None if the amount did not grow.
    pub fn checked_gain(self, previous: Mist) -> Option<Mist> {
        match self.0.checked_sub(previous.0) {
            Some(0) | None => None,
            Some(diff) => Some(Mist(diff)),
        }
    }

    /// Render as SUI with all 9 decimal places, e.g. `1.500000000`.
    pub fn to_sui_string(self) -> String {
        format!("{}.{:09}", self.0 / MIST_PER_SUI, self.0 % MIST_PER_SUI)
    }
}

impl fmt::Display for Mist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MIST", self.0)
    }
}

impl FromStr for Mist {
    type Err = AmountParseError;

    /// Parse the decimal integer string the RPC returns for balances.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError(s.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Mist)
            .map_err(|_| AmountParseError(s.to_string()))
    }
}

impl From<u64> for Mist {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Add for Mist {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Mist {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}
