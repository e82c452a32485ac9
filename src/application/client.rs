//! Swap Client
//!
//! Assembles calls against the fixed-rate swap program and reads the state
//! the views display. Balance and state reads are best-effort: missing
//! token accounts read as zero. Buy and sell re-check fresh balances,
//! stamp a new blockhash, hand the transaction to the connected wallet for
//! signing, submit, and wait for confirmation.

use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use std::sync::Arc;
use thiserror::Error;

use crate::adapters::solana::program::{
    buy_usdc_instruction, fund_vault_instruction, sell_usdc_instruction, ProgramAddresses,
    ProgramError,
};
use crate::domain::balances::WalletBalances;
use crate::domain::market::{MarketState, MarketStats};
use crate::domain::trade::{TradeAmount, TradeDirection};
use crate::domain::units::{format_sol, format_usdc, usdc_units_to_lamports};
use crate::ports::{ChainError, ChainPort, SignerError, WalletSigner};

#[derive(Debug, Error)]
pub enum SwapClientError {
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient SOL balance. Required: {required} SOL, Available: {available} SOL")]
    InsufficientSol { required: String, available: String },
    #[error("Insufficient USDC balance. Required: {required} USDC, Available: {available} USDC")]
    InsufficientUsdc { required: String, available: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Wallet error: {0}")]
    Signing(#[from] SignerError),
    #[error("Transaction failed: {0}")]
    Transaction(String),
    #[error(transparent)]
    Instruction(#[from] ProgramError),
}

impl From<ChainError> for SwapClientError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rpc(msg) => SwapClientError::Network(msg),
            ChainError::AccountNotFound(key) => {
                SwapClientError::Network(format!("account {} not found", key))
            }
            ChainError::Transaction(msg) => SwapClientError::Transaction(msg),
            ChainError::ConfirmationTimeout(sig) => {
                SwapClientError::Transaction(format!("confirmation timed out for {}", sig))
            }
        }
    }
}

/// Remote client for the swap program
pub struct SwapClient<C: ChainPort> {
    chain: Arc<C>,
    addresses: ProgramAddresses,
    wallet: Option<Arc<dyn WalletSigner>>,
}

impl<C: ChainPort> Clone for SwapClient<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            addresses: self.addresses,
            wallet: self.wallet.clone(),
        }
    }
}

impl<C: ChainPort> SwapClient<C> {
    /// Create a read-only client with no wallet attached
    pub fn new(chain: Arc<C>, addresses: ProgramAddresses) -> Self {
        Self {
            chain,
            addresses,
            wallet: None,
        }
    }

    /// Attach the connected wallet's signer
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletSigner>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn addresses(&self) -> &ProgramAddresses {
        &self.addresses
    }

    pub fn wallet_pubkey(&self) -> Option<Pubkey> {
        self.wallet.as_ref().map(|w| w.pubkey())
    }

    fn require_wallet(&self) -> Result<&Arc<dyn WalletSigner>, SwapClientError> {
        self.wallet.as_ref().ok_or(SwapClientError::WalletNotConnected)
    }

    /// Fetch and decode the market state account
    pub async fn get_market_state(&self) -> Option<MarketState> {
        let data = match self.chain.get_account_data(&self.addresses.market_state).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Error fetching market state: {}", e);
                return None;
            }
        };

        match MarketState::decode(&data) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("Error decoding market state: {}", e);
                None
            }
        }
    }

    /// Market counters plus program SOL and vault USDC holdings
    pub async fn get_market_stats(&self) -> Option<MarketStats> {
        let state = self.get_market_state().await?;

        let total_sol_in_program = match self.chain.get_balance(&self.addresses.program_id).await {
            Ok(lamports) => lamports,
            Err(e) => {
                tracing::warn!("Error fetching program balance: {}", e);
                return None;
            }
        };

        let total_usdc_left = match self
            .chain
            .get_token_account_balance(&self.addresses.vault_token)
            .await
        {
            Ok(amount) => {
                tracing::debug!(
                    vault = %self.addresses.vault_token,
                    amount,
                    "Vault token account balance"
                );
                amount
            }
            Err(e) => {
                tracing::info!("Vault token account unavailable, counting as 0: {}", e);
                0
            }
        };

        Some(MarketStats::new(&state, total_usdc_left, total_sol_in_program))
    }

    /// SOL and USDC balances of the connected wallet
    pub async fn get_wallet_balances(&self) -> Result<WalletBalances, SwapClientError> {
        let owner = self.require_wallet()?.pubkey();
        self.balances_of(&owner).await
    }

    async fn balances_of(&self, owner: &Pubkey) -> Result<WalletBalances, SwapClientError> {
        let sol_lamports = self.chain.get_balance(owner).await?;

        let usdc_account = self.addresses.usdc_account_for(owner);
        let usdc_units = match self.chain.get_token_account_balance(&usdc_account).await {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!("USDC token account not found, balance is 0: {}", e);
                0
            }
        };

        Ok(WalletBalances::new(sol_lamports, usdc_units))
    }

    /// Buy `usdc_units` USDC base units for `usdc_units * 10` lamports
    pub async fn buy_usdc(&self, usdc_units: u64) -> Result<Signature, SwapClientError> {
        let wallet = Arc::clone(self.require_wallet()?);
        if usdc_units == 0 {
            return Err(SwapClientError::InvalidAmount("amount must be > 0".to_string()));
        }
        tracing::info!("Buy USDC - amount requested: {} base units", usdc_units);

        let balances = self.get_wallet_balances().await?;
        let required = usdc_units_to_lamports(usdc_units);
        if !balances.has_sol(required) {
            return Err(SwapClientError::InsufficientSol {
                required: format_sol(required),
                available: format_sol(balances.sol_lamports),
            });
        }

        let ix = buy_usdc_instruction(&self.addresses, &wallet.pubkey(), usdc_units);
        let signature = self.submit(wallet.as_ref(), ix).await?;
        tracing::info!("Buy USDC transaction signature: {}", signature);
        Ok(signature)
    }

    /// Sell `usdc_units` USDC base units for `usdc_units * 10` lamports
    pub async fn sell_usdc(&self, usdc_units: u64) -> Result<Signature, SwapClientError> {
        let wallet = Arc::clone(self.require_wallet()?);
        if usdc_units == 0 {
            return Err(SwapClientError::InvalidAmount("amount must be > 0".to_string()));
        }
        tracing::info!("Sell USDC - amount requested: {} base units", usdc_units);

        let balances = self.get_wallet_balances().await?;
        if !balances.has_usdc(usdc_units) {
            return Err(SwapClientError::InsufficientUsdc {
                required: format_usdc(usdc_units),
                available: format_usdc(balances.usdc_units),
            });
        }

        let ix = sell_usdc_instruction(&self.addresses, &wallet.pubkey(), usdc_units);
        let signature = self.submit(wallet.as_ref(), ix).await?;
        tracing::info!("Sell USDC transaction signature: {}", signature);
        Ok(signature)
    }

    /// Dispatch a validated trade
    pub async fn execute(&self, trade: &TradeAmount) -> Result<Signature, SwapClientError> {
        match trade.direction {
            TradeDirection::Buy => self.buy_usdc(trade.usdc_units).await,
            TradeDirection::Sell => self.sell_usdc(trade.usdc_units).await,
        }
    }

    /// Build the unsigned transaction for a trade, stamped with a fresh blockhash
    pub async fn build_trade_transaction(
        &self,
        trade: &TradeAmount,
    ) -> Result<Transaction, SwapClientError> {
        let payer = self.require_wallet()?.pubkey();
        let ix = match trade.direction {
            TradeDirection::Buy => buy_usdc_instruction(&self.addresses, &payer, trade.usdc_units),
            TradeDirection::Sell => {
                sell_usdc_instruction(&self.addresses, &payer, trade.usdc_units)
            }
        };
        self.build_transaction(&payer, ix).await
    }

    /// Move USDC from the wallet's token account into the vault
    pub async fn fund_vault(&self, usdc_units: u64) -> Result<Signature, SwapClientError> {
        let wallet = Arc::clone(self.require_wallet()?);
        if usdc_units == 0 {
            return Err(SwapClientError::InvalidAmount("amount must be > 0".to_string()));
        }

        let payer = wallet.pubkey();
        tracing::info!(
            payer = %payer,
            usdc_mint = %self.addresses.usdc_mint,
            vault_authority = %self.addresses.vault_authority,
            vault_token = %self.addresses.vault_token,
            "Funding vault with {} USDC ({} base units)",
            format_usdc(usdc_units),
            usdc_units
        );

        let balances = self.balances_of(&payer).await?;
        if !balances.has_usdc(usdc_units) {
            return Err(SwapClientError::InsufficientUsdc {
                required: format_usdc(usdc_units),
                available: format_usdc(balances.usdc_units),
            });
        }

        self.log_vault_balance("before").await;
        let ix = fund_vault_instruction(&self.addresses, &payer, usdc_units)?;
        let signature = self.submit(wallet.as_ref(), ix).await?;
        tracing::info!("Vault funded, signature: {}", signature);
        self.log_vault_balance("after").await;

        Ok(signature)
    }

    async fn log_vault_balance(&self, when: &str) {
        match self
            .chain
            .get_token_account_balance(&self.addresses.vault_token)
            .await
        {
            Ok(amount) => tracing::info!("Vault USDC balance ({}): {}", when, amount),
            Err(e) => tracing::info!("Vault USDC balance ({}) unavailable: {}", when, e),
        }
    }

    async fn build_transaction(
        &self,
        payer: &Pubkey,
        ix: Instruction,
    ) -> Result<Transaction, SwapClientError> {
        let blockhash = self.chain.get_latest_blockhash().await?;
        let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
        tx.message.recent_blockhash = blockhash;
        Ok(tx)
    }

    /// Blockhash, sign, send, confirm
    async fn submit(
        &self,
        wallet: &dyn WalletSigner,
        ix: Instruction,
    ) -> Result<Signature, SwapClientError> {
        let mut tx = self.build_transaction(&wallet.pubkey(), ix).await?;
        wallet.sign_transaction(&mut tx)?;

        let signature = self.chain.send_transaction(&tx).await?;
        tracing::debug!("Submitted {}, awaiting confirmation", signature);
        self.chain.confirm_transaction(&signature).await?;
        Ok(signature)
    }
}
