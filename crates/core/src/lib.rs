//! Core types for the Sui arbitrage ops tools.

pub mod address;
pub mod amount;
pub mod profit;

pub use address::*;
pub use amount::*;
pub use profit::*;
