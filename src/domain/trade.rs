use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::balances::WalletBalances;
use super::units::{
    format_sol, format_usdc, lamports_to_usdc_units, parse_decimal, parse_sol, parse_usdc,
    usdc_units_to_lamports, MAX_SOL_AMOUNT_LAMPORTS,
};

/// Which side of the fixed-rate market a trade hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Spend SOL, receive USDC
    Buy,
    /// Spend USDC, receive SOL
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for TradeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(TradeDirection::Buy),
            "sell" => Ok(TradeDirection::Sell),
            other => Err(format!("Unknown trade direction: {}", other)),
        }
    }
}

/// Input validation failures, worded for display in the trade form
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeValidationError {
    #[error("Amount is required")]
    Required,
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Maximum {max} SOL per transaction")]
    ExceedsMaxSol { max: String },
    #[error("Insufficient SOL balance. Available: {available}")]
    InsufficientSol { available: String },
    #[error("Please enter a valid USDC amount")]
    InvalidUsdcAmount,
    #[error("Insufficient USDC balance. Available: {available}")]
    InsufficientUsdc { available: String },
}

/// Static per-transaction limits checked before building a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeLimits {
    pub max_sol_lamports: u64,
}

impl Default for TradeLimits {
    fn default() -> Self {
        Self {
            max_sol_lamports: MAX_SOL_AMOUNT_LAMPORTS,
        }
    }
}

/// A validated trade, in base units on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAmount {
    pub direction: TradeDirection,
    /// USDC bought or sold
    pub usdc_units: u64,
    /// Lamports spent (buy) or received (sell)
    pub lamports: u64,
}

impl TradeAmount {
    pub fn buy(usdc_units: u64) -> Self {
        Self {
            direction: TradeDirection::Buy,
            usdc_units,
            lamports: usdc_units_to_lamports(usdc_units),
        }
    }

    pub fn sell(usdc_units: u64) -> Self {
        Self {
            direction: TradeDirection::Sell,
            usdc_units,
            lamports: usdc_units_to_lamports(usdc_units),
        }
    }

    /// Human-readable summary used in success banners
    pub fn describe(&self) -> String {
        match self.direction {
            TradeDirection::Buy => format!(
                "bought {} USDC for {} SOL",
                format_usdc(self.usdc_units),
                format_sol(self.lamports)
            ),
            TradeDirection::Sell => format!(
                "sold {} USDC for {} SOL",
                format_usdc(self.usdc_units),
                format_sol(self.lamports)
            ),
        }
    }
}

/// Raw trade form input. Buy amounts are SOL, sell amounts are USDC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeInput {
    pub amount: String,
    pub direction: TradeDirection,
}

impl TradeInput {
    pub fn new(direction: TradeDirection, amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            direction,
        }
    }

    pub fn buy(amount: impl Into<String>) -> Self {
        Self::new(TradeDirection::Buy, amount)
    }

    pub fn sell(amount: impl Into<String>) -> Self {
        Self::new(TradeDirection::Sell, amount)
    }

    /// Validate against static limits and, when known, the cached balances.
    ///
    /// Balance checks are skipped when no balances have been fetched yet;
    /// the remote client re-checks fresh balances before sending anyway.
    pub fn validate(
        &self,
        limits: &TradeLimits,
        cached: Option<&WalletBalances>,
    ) -> Result<TradeAmount, TradeValidationError> {
        if self.amount.trim().is_empty() {
            return Err(TradeValidationError::Required);
        }

        let value = parse_decimal(&self.amount).ok_or(TradeValidationError::InvalidAmount)?;
        if value <= Decimal::ZERO {
            return Err(TradeValidationError::InvalidAmount);
        }

        match self.direction {
            TradeDirection::Buy => {
                let lamports =
                    parse_sol(&self.amount).ok_or(TradeValidationError::InvalidAmount)?;
                if lamports > limits.max_sol_lamports {
                    return Err(TradeValidationError::ExceedsMaxSol {
                        max: format_sol(limits.max_sol_lamports),
                    });
                }
                if let Some(balances) = cached {
                    if lamports > balances.sol_lamports {
                        return Err(TradeValidationError::InsufficientSol {
                            available: format_sol(balances.sol_lamports),
                        });
                    }
                }

                let usdc_units = lamports_to_usdc_units(lamports);
                if usdc_units == 0 {
                    return Err(TradeValidationError::InvalidAmount);
                }
                Ok(TradeAmount::buy(usdc_units))
            }
            TradeDirection::Sell => {
                let usdc_units =
                    parse_usdc(&self.amount).ok_or(TradeValidationError::InvalidUsdcAmount)?;
                if usdc_units == 0 {
                    return Err(TradeValidationError::InvalidUsdcAmount);
                }
                if let Some(balances) = cached {
                    if usdc_units > balances.usdc_units {
                        return Err(TradeValidationError::InsufficientUsdc {
                            available: format_usdc(balances.usdc_units),
                        });
                    }
                }
                Ok(TradeAmount::sell(usdc_units))
            }
        }
    }
}

/// Coarse category of a failed trade, derived from the error text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Cancelled,
    InsufficientFunds,
    Network,
    Wallet(String),
    Other(String),
}

impl FailureKind {
    /// Classify by substring, first match wins
    pub fn classify(message: &str) -> Self {
        if message.contains("User rejected") {
            FailureKind::Cancelled
        } else if message.contains("Insufficient funds") {
            FailureKind::InsufficientFunds
        } else if message.contains("Network") {
            FailureKind::Network
        } else if message.contains("Wallet") {
            FailureKind::Wallet(message.to_string())
        } else {
            FailureKind::Other(message.to_string())
        }
    }

    /// Banner text for the trade form
    pub fn user_message(&self) -> String {
        match self {
            FailureKind::Cancelled => "Transaction was cancelled by user".to_string(),
            FailureKind::InsufficientFunds => "Insufficient funds for this transaction".to_string(),
            FailureKind::Network => {
                "Network error. Please check your connection and try again.".to_string()
            }
            FailureKind::Wallet(_) => {
                "Wallet error. Please check your wallet connection.".to_string()
            }
            FailureKind::Other(msg) => msg.clone(),
        }
    }

    /// Extra detail shown under a wallet banner
    pub fn wallet_detail(&self) -> Option<String> {
        match self {
            FailureKind::Wallet(msg) => Some(format!("Wallet error: {}", msg)),
            _ => None,
        }
    }
}
