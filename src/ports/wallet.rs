use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("User rejected the request")]
    Rejected,
    #[error("Wallet failed to sign transaction: {0}")]
    Failed(String),
}

/// Signing capability supplied by whatever wallet is connected.
///
/// The swap client never holds key material itself; it hands a fully
/// built transaction (blockhash and fee payer set) to the signer.
pub trait WalletSigner: Send + Sync {
    /// Public key of the connected account
    fn pubkey(&self) -> Pubkey;

    /// Sign in place with the connected account's key
    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), SignerError>;
}
