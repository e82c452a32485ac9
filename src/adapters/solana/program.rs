//! Swap Program Instructions
//!
//! Addresses and instruction builders for the external fixed-rate swap
//! program. The program is an Anchor program: instruction data is an
//! 8-byte method discriminator followed by borsh-encoded arguments.

use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program,
    sysvar,
};
use spl_associated_token_account::get_associated_token_address;
use thiserror::Error;

/// Deployed swap program
pub const DEFAULT_PROGRAM_ID: Pubkey = pubkey!("9HzagBuheBCfbbXWVhqkYVArBzepy8Mif5rbe7gM257n");

/// USDC mint used by the program on devnet
pub const DEFAULT_USDC_MINT: Pubkey = pubkey!("4f3XEdxWDzxAadHfXyqofXUg1Qsz5kwLCrABp64JqS7h");

/// Market state PDA as deployed
pub const DEFAULT_MARKET_STATE: Pubkey = pubkey!("2W1sWniYNwLg7LoWfZtKgeBTmXsy3GyDuCcd4ewLAHYA");

/// Vault authority PDA as deployed
pub const DEFAULT_VAULT_AUTHORITY: Pubkey = pubkey!("D2rns2sJNRyxA1DJVSwux9NcKb79h2dBrFP2y53yyQJa");

/// Vault token account holding swap liquidity
pub const DEFAULT_VAULT_TOKEN: Pubkey = pubkey!("5Dcg7FqrJTiC1mb39exEjnxANXTzVZFLgXvabcDqCjd7");

pub const MARKET_STATE_SEED: &[u8] = b"market_state";
pub const VAULT_SEED: &[u8] = b"vault";

pub const BUY_USDC: &str = "buy_usdc";
pub const SELL_USDC: &str = "sell_usdc";

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("Failed to build instruction: {0}")]
    InstructionError(String),
}

/// Fixed addresses every swap instruction references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramAddresses {
    pub program_id: Pubkey,
    pub usdc_mint: Pubkey,
    pub market_state: Pubkey,
    pub vault_authority: Pubkey,
    pub vault_token: Pubkey,
}

impl Default for ProgramAddresses {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            usdc_mint: DEFAULT_USDC_MINT,
            market_state: DEFAULT_MARKET_STATE,
            vault_authority: DEFAULT_VAULT_AUTHORITY,
            vault_token: DEFAULT_VAULT_TOKEN,
        }
    }
}

impl ProgramAddresses {
    /// Market state PDA derived from the program id
    pub fn derive_market_state(&self) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[MARKET_STATE_SEED], &self.program_id)
    }

    /// Vault authority PDA derived from the program id
    pub fn derive_vault_authority(&self) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[VAULT_SEED], &self.program_id)
    }

    /// Names of configured PDAs that differ from their seed derivation.
    /// A mismatch is only reported; the configured address is still used.
    pub fn derivation_mismatches(&self) -> Vec<&'static str> {
        let mut mismatches = Vec::new();
        if self.derive_market_state().0 != self.market_state {
            mismatches.push("market_state");
        }
        if self.derive_vault_authority().0 != self.vault_authority {
            mismatches.push("vault_authority");
        }
        mismatches
    }

    /// The trader's USDC associated token account
    pub fn usdc_account_for(&self, owner: &Pubkey) -> Pubkey {
        associated_token_address(owner, &self.usdc_mint)
    }
}

/// Associated token account address for `owner` and `mint`
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

/// Anchor method discriminator: first 8 bytes of sha256("global:<name>")
pub fn instruction_discriminator(method: &str) -> [u8; 8] {
    let digest = hash(format!("global:{}", method).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

fn amount_instruction_data(method: &str, amount: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&instruction_discriminator(method));
    data.extend_from_slice(&amount.to_le_bytes());
    data
}

/// Account list shared by buy and sell, trader first
fn swap_accounts(addresses: &ProgramAddresses, trader: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*trader, true),
        AccountMeta::new_readonly(addresses.usdc_mint, false),
        AccountMeta::new(addresses.usdc_account_for(trader), false),
        AccountMeta::new(addresses.vault_token, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new(addresses.market_state, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(spl_associated_token_account::id(), false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
    ]
}

/// `buy_usdc(amount)`: pay `amount * 10` lamports, receive `amount` USDC base units
pub fn buy_usdc_instruction(
    addresses: &ProgramAddresses,
    buyer: &Pubkey,
    usdc_units: u64,
) -> Instruction {
    Instruction {
        program_id: addresses.program_id,
        accounts: swap_accounts(addresses, buyer),
        data: amount_instruction_data(BUY_USDC, usdc_units),
    }
}

/// `sell_usdc(amount)`: return `amount` USDC base units, receive `amount * 10` lamports
pub fn sell_usdc_instruction(
    addresses: &ProgramAddresses,
    seller: &Pubkey,
    usdc_units: u64,
) -> Instruction {
    Instruction {
        program_id: addresses.program_id,
        accounts: swap_accounts(addresses, seller),
        data: amount_instruction_data(SELL_USDC, usdc_units),
    }
}

/// Plain SPL transfer from the payer's USDC account into the vault
pub fn fund_vault_instruction(
    addresses: &ProgramAddresses,
    payer: &Pubkey,
    usdc_units: u64,
) -> Result<Instruction, ProgramError> {
    spl_token::instruction::transfer(
        &spl_token::id(),
        &addresses.usdc_account_for(payer),
        &addresses.vault_token,
        payer,
        &[],
        usdc_units,
    )
    .map_err(|e| ProgramError::InstructionError(e.to_string()))
}
