//! Sui account addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex digits in a full Sui address.
const ADDRESS_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Address is empty")]
    Empty,

    #[error("Address is longer than 32 bytes: {0}")]
    TooLong(String),

    #[error("Address contains non-hex characters: {0}")]
    InvalidHex(String),
}

/// A Sui address, normalised to lowercase `0x` + 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuiAddress(String);

impl SuiAddress {
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;

        if hex.is_empty() {
            return Err(AddressError::Empty);
        }
        if hex.len() > ADDRESS_HEX_LEN {
            return Err(AddressError::TooLong(trimmed.to_string()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(trimmed.to_string()));
        }

        Ok(Self(format!(
            "0x{:0>width$}",
            hex.to_ascii_lowercase(),
            width = ADDRESS_HEX_LEN
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First and last 4 hex digits, for log lines.
    pub fn short(&self) -> String {
        format!("0x{}…{}", &self.0[2..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SuiAddress {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SuiAddress {
    type Error = AddressError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SuiAddress> for String {
    fn from(address: SuiAddress) -> Self {
        address.0
    }
}
