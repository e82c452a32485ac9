//! Market State
//!
//! Read-only mirror of the swap program's `MarketState` account and the
//! statistics derived from it. The program owns and mutates the account;
//! this crate only decodes snapshots.

use serde::{Deserialize, Serialize};
use solana_sdk::hash::hash;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Anchor account name used for the discriminator
pub const MARKET_STATE_ACCOUNT_NAME: &str = "MarketState";

/// Discriminator + mint + bump + three u64 counters
pub const MARKET_STATE_LEN: usize = 8 + 32 + 1 + 8 + 8 + 8;

#[derive(Debug, Error, PartialEq)]
pub enum MarketDecodeError {
    #[error("Account data too short: {len} bytes, need {expected}")]
    TooShort { len: usize, expected: usize },
    #[error("Account discriminator mismatch")]
    WrongDiscriminator,
}

/// Anchor account discriminator: first 8 bytes of sha256("account:<Name>")
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = hash(format!("account:{}", name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

/// Snapshot of the program's supply counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub usdc_mint: Pubkey,
    pub vault_authority_bump: u8,
    pub total_bought: u64,
    pub total_sold: u64,
    pub max_supply: u64,
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

impl MarketState {
    /// Decode raw account data (Anchor layout, little-endian)
    pub fn decode(data: &[u8]) -> Result<Self, MarketDecodeError> {
        if data.len() < MARKET_STATE_LEN {
            return Err(MarketDecodeError::TooShort {
                len: data.len(),
                expected: MARKET_STATE_LEN,
            });
        }
        if data[..8] != account_discriminator(MARKET_STATE_ACCOUNT_NAME) {
            return Err(MarketDecodeError::WrongDiscriminator);
        }

        let mut mint = [0u8; 32];
        mint.copy_from_slice(&data[8..40]);

        Ok(Self {
            usdc_mint: Pubkey::new_from_array(mint),
            vault_authority_bump: data[40],
            total_bought: read_u64(data, 41),
            total_sold: read_u64(data, 49),
            max_supply: read_u64(data, 57),
        })
    }

    /// Encode into the on-chain layout
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(MARKET_STATE_LEN);
        data.extend_from_slice(&account_discriminator(MARKET_STATE_ACCOUNT_NAME));
        data.extend_from_slice(self.usdc_mint.as_ref());
        data.push(self.vault_authority_bump);
        data.extend_from_slice(&self.total_bought.to_le_bytes());
        data.extend_from_slice(&self.total_sold.to_le_bytes());
        data.extend_from_slice(&self.max_supply.to_le_bytes());
        data
    }

    /// USDC currently held by traders (bought minus sold)
    pub fn outstanding(&self) -> u64 {
        self.total_bought.saturating_sub(self.total_sold)
    }
}

/// Aggregated market view shown by the stats panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    /// USDC base units left in the vault
    pub total_usdc_left: u64,
    /// Lamports held by the program account
    pub total_sol_in_program: u64,
    pub total_bought: u64,
    pub total_sold: u64,
    pub max_supply: u64,
}

impl MarketStats {
    pub fn new(state: &MarketState, total_usdc_left: u64, total_sol_in_program: u64) -> Self {
        Self {
            total_usdc_left,
            total_sol_in_program,
            total_bought: state.total_bought,
            total_sold: state.total_sold,
            max_supply: state.max_supply,
        }
    }

    pub fn outstanding(&self) -> u64 {
        self.total_bought.saturating_sub(self.total_sold)
    }

    /// Outstanding supply as a percentage of max supply (0 when max is 0)
    pub fn utilization_pct(&self) -> f64 {
        if self.max_supply == 0 {
            return 0.0;
        }
        self.outstanding() as f64 / self.max_supply as f64 * 100.0
    }

    /// Utilization clamped for progress-bar rendering
    pub fn utilization_bar_pct(&self) -> f64 {
        self.utilization_pct().min(100.0)
    }

    /// Client-side check of the supply invariant
    pub fn within_supply(&self) -> bool {
        self.outstanding() <= self.max_supply
    }
}
