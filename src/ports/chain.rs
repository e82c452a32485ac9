use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use thiserror::Error;

/// Chain access error type
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Timeout waiting for confirmation of {0}")]
    ConfirmationTimeout(Signature),
}

/// Read/write surface of the cluster used by the swap client.
///
/// Every method is a single best-effort RPC round trip; callers decide
/// whether a failure is fatal or reads as zero.
#[async_trait]
pub trait ChainPort: Send + Sync {
    /// Lamport balance of any account
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ChainError>;

    /// Raw amount held by an SPL token account
    async fn get_token_account_balance(&self, token_account: &Pubkey) -> Result<u64, ChainError>;

    /// Raw data of an account
    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Vec<u8>, ChainError>;

    /// Blockhash to stamp a new transaction with
    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError>;

    /// Submit a signed transaction without waiting
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError>;

    /// Wait until the signature reaches the client's commitment level
    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), ChainError>;
}
