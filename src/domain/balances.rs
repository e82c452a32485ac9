use serde::{Deserialize, Serialize};
use std::fmt;

use super::units::{format_sol, format_usdc};

/// Balances of the connected wallet, recomputed on every poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalances {
    /// SOL balance in lamports
    pub sol_lamports: u64,
    /// USDC balance in base units (0 when the token account does not exist)
    pub usdc_units: u64,
}

impl WalletBalances {
    pub fn new(sol_lamports: u64, usdc_units: u64) -> Self {
        Self {
            sol_lamports,
            usdc_units,
        }
    }

    pub fn has_sol(&self, lamports: u64) -> bool {
        self.sol_lamports >= lamports
    }

    pub fn has_usdc(&self, units: u64) -> bool {
        self.usdc_units >= units
    }
}

impl fmt::Display for WalletBalances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} SOL | {} USDC",
            format_sol(self.sol_lamports),
            format_usdc(self.usdc_units)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_checks() {
        let balances = WalletBalances::new(1_000, 50);
        assert!(balances.has_sol(1_000));
        assert!(!balances.has_sol(1_001));
        assert!(balances.has_usdc(50));
        assert!(!balances.has_usdc(51));
    }

    #[test]
    fn test_display() {
        let balances = WalletBalances::new(1_500_000_000, 12_340_000);
        assert_eq!(balances.to_string(), "1.5000 SOL | 12.34 USDC");
    }
}
