use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tokio::sync::watch;

use crate::ports::{SignerError, WalletSigner};

/// Env var holding a base58 secret key as an alternative to a keypair file
pub const WALLET_SECRET_ENV: &str = "WALLET_SECRET_BASE58";

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
}

/// Local keypair wallet; the adapter behind `WalletSigner`
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load keypair from a file path (JSON array format, as written by solana-keygen)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;

        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Load keypair from a base58-encoded 64-byte secret
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKeypair(format!("Invalid base58: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Load from `WALLET_SECRET_BASE58` if set
    pub fn from_env() -> Option<Result<Self, WalletError>> {
        std::env::var(WALLET_SECRET_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Self::from_base58(&s))
    }
}

impl WalletSigner for WalletManager {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), SignerError> {
        transaction
            .try_sign(&[&self.keypair], transaction.message.recent_blockhash)
            .map_err(|e| SignerError::Failed(e.to_string()))
    }
}

/// Connect/disconnect state of the wallet, observed by the polling views.
///
/// `None` means disconnected. Dropping the connection closes the channel
/// and every subscribed view exits.
#[derive(Debug)]
pub struct WalletConnection {
    state: watch::Sender<Option<Pubkey>>,
}

impl WalletConnection {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    pub fn connect(&self, pubkey: Pubkey) {
        tracing::info!("Wallet connected: {}", pubkey);
        self.state.send_replace(Some(pubkey));
    }

    pub fn disconnect(&self) {
        if self.state.send_replace(None).is_some() {
            tracing::info!("Wallet disconnected");
        }
    }

    pub fn current(&self) -> Option<Pubkey> {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Pubkey>> {
        self.state.subscribe()
    }
}

impl Default for WalletConnection {
    fn default() -> Self {
        Self::new()
    }
}
