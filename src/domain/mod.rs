//! Domain Layer - Core types for the fixed-rate swap
//!
//! Pure types and logic with no external dependencies.
//! All external interactions happen through the ports layer.

pub mod units;
pub mod market;
pub mod balances;
pub mod trade;

pub use balances::WalletBalances;
pub use market::{MarketDecodeError, MarketState, MarketStats};
pub use trade::{
    FailureKind, TradeAmount, TradeDirection, TradeInput, TradeLimits, TradeValidationError,
};
