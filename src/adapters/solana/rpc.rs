use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{ChainError, ChainPort};

/// How often to poll a signature while waiting for confirmation
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default time to wait before giving up on confirmation
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// Parse a commitment level name from config
pub fn parse_commitment(level: &str) -> Option<CommitmentConfig> {
    match level.to_lowercase().as_str() {
        "processed" => Some(CommitmentConfig::processed()),
        "confirmed" => Some(CommitmentConfig::confirmed()),
        "finalized" => Some(CommitmentConfig::finalized()),
        _ => None,
    }
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
    confirm_timeout: Duration,
}

impl SolanaClient {
    /// Create a new Solana RPC client at `confirmed` commitment
    pub fn new(rpc_url: String) -> Self {
        Self::with_commitment(rpc_url, CommitmentConfig::confirmed())
    }

    pub fn with_commitment(rpc_url: String, commitment: CommitmentConfig) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self {
            client,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    /// Set how long `confirm_transaction` waits
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Run a blocking RPC call on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T, ChainError>
    where
        T: Send + 'static,
        F: FnOnce(&RpcClient) -> Result<T, ChainError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(|e| ChainError::Rpc(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl ChainPort for SolanaClient {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ChainError> {
        let pubkey = *pubkey;
        self.blocking(move |client| {
            client
                .get_balance(&pubkey)
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn get_token_account_balance(&self, token_account: &Pubkey) -> Result<u64, ChainError> {
        let pubkey = *token_account;
        self.blocking(move |client| {
            client
                .get_token_account_balance(&pubkey)
                .map_err(|e| ChainError::Rpc(e.to_string()))
                .and_then(|balance| {
                    balance
                        .amount
                        .parse::<u64>()
                        .map_err(|e| ChainError::Rpc(format!("Parse error: {}", e)))
                })
        })
        .await
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Vec<u8>, ChainError> {
        let pubkey = *pubkey;
        self.blocking(move |client| {
            client
                .get_account_data(&pubkey)
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.blocking(|client| {
            client
                .get_latest_blockhash()
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let tx = transaction.clone();
        self.blocking(move |client| {
            client
                .send_transaction(&tx)
                .map_err(|e| ChainError::Transaction(e.to_string()))
        })
        .await
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), ChainError> {
        let deadline = tokio::time::Instant::now() + self.confirm_timeout;

        loop {
            let sig = *signature;
            let status = self
                .blocking(move |client| {
                    client
                        .get_signature_status(&sig)
                        .map_err(|e| ChainError::Rpc(e.to_string()))
                })
                .await?;

            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(e)) => return Err(ChainError::Transaction(e.to_string())),
                None => {
                    tracing::debug!("Signature {} not yet confirmed", signature);
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout(*signature));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SolanaClient::new("https://api.devnet.solana.com".to_string());
        assert_eq!(client.url(), "https://api.devnet.solana.com");
    }

    #[test]
    fn test_parse_commitment() {
        assert_eq!(parse_commitment("confirmed"), Some(CommitmentConfig::confirmed()));
        assert_eq!(parse_commitment("Finalized"), Some(CommitmentConfig::finalized()));
        assert_eq!(parse_commitment("processed"), Some(CommitmentConfig::processed()));
        assert_eq!(parse_commitment("eventual"), None);
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Rpc("test".to_string());
        assert!(err.to_string().contains("RPC request failed"));

        let err = ChainError::ConfirmationTimeout(Signature::default());
        assert!(err.to_string().contains("Timeout"));
    }
}
