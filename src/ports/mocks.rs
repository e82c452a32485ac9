use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::chain::{ChainError, ChainPort};
use super::wallet::{SignerError, WalletSigner};

/// In-memory chain that records calls and serves configured state
#[derive(Debug, Default)]
pub struct MockChain {
    calls: Arc<Mutex<Vec<String>>>,
    balances: Arc<Mutex<HashMap<Pubkey, u64>>>,
    token_balances: Arc<Mutex<HashMap<Pubkey, u64>>>,
    accounts: Arc<Mutex<HashMap<Pubkey, Vec<u8>>>>,
    sent: Arc<Mutex<Vec<Transaction>>>,
    blockhash: Hash,
    send_error: Option<String>,
    balance_error: Arc<Mutex<Option<String>>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            ..Self::default()
        }
    }

    /// Builder method to set a lamport balance
    pub fn with_balance(self, pubkey: Pubkey, lamports: u64) -> Self {
        self.balances.lock().unwrap().insert(pubkey, lamports);
        self
    }

    /// Builder method to set an SPL token account amount
    pub fn with_token_balance(self, token_account: Pubkey, amount: u64) -> Self {
        self.token_balances.lock().unwrap().insert(token_account, amount);
        self
    }

    /// Builder method to set raw account data
    pub fn with_account(self, pubkey: Pubkey, data: Vec<u8>) -> Self {
        self.accounts.lock().unwrap().insert(pubkey, data);
        self
    }

    /// Make every send fail with the given message
    pub fn with_send_error(mut self, message: &str) -> Self {
        self.send_error = Some(message.to_string());
        self
    }

    /// Make every SOL balance read fail with the given message
    pub fn with_balance_error(self, message: &str) -> Self {
        self.fail_balances(message);
        self
    }

    /// Start failing SOL balance reads from now on
    pub fn fail_balances(&self, message: &str) {
        *self.balance_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get all submitted transactions
    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChainPort for MockChain {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ChainError> {
        self.record(format!("get_balance:{}", pubkey));
        if let Some(msg) = self.balance_error.lock().unwrap().clone() {
            return Err(ChainError::Rpc(msg));
        }
        Ok(self.balances.lock().unwrap().get(pubkey).copied().unwrap_or(0))
    }

    async fn get_token_account_balance(&self, token_account: &Pubkey) -> Result<u64, ChainError> {
        self.record(format!("get_token_account_balance:{}", token_account));
        self.token_balances
            .lock()
            .unwrap()
            .get(token_account)
            .copied()
            .ok_or(ChainError::AccountNotFound(*token_account))
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Vec<u8>, ChainError> {
        self.record(format!("get_account_data:{}", pubkey));
        self.accounts
            .lock()
            .unwrap()
            .get(pubkey)
            .cloned()
            .ok_or(ChainError::AccountNotFound(*pubkey))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.record("get_latest_blockhash".to_string());
        Ok(self.blockhash)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        self.record("send_transaction".to_string());
        if let Some(ref msg) = self.send_error {
            return Err(ChainError::Transaction(msg.clone()));
        }
        self.sent.lock().unwrap().push(transaction.clone());
        transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| ChainError::Transaction("unsigned transaction".to_string()))
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), ChainError> {
        self.record(format!("confirm_transaction:{}", signature));
        Ok(())
    }
}

/// Signer backed by a throwaway keypair; can be told to reject
pub struct MockSigner {
    keypair: Keypair,
    reject: bool,
    signed: Arc<Mutex<usize>>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self {
            keypair: Keypair::new(),
            reject: false,
            signed: Arc::new(Mutex::new(0)),
        }
    }

    /// Simulate the user declining the signature prompt
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new()
        }
    }

    pub fn signed_count(&self) -> usize {
        *self.signed.lock().unwrap()
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletSigner for MockSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), SignerError> {
        if self.reject {
            return Err(SignerError::Rejected);
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| SignerError::Failed(e.to_string()))?;
        *self.signed.lock().unwrap() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_chain_balances() {
        let key = Pubkey::new_unique();
        let mock = MockChain::new().with_balance(key, 42);

        assert_eq!(mock.get_balance(&key).await.unwrap(), 42);
        assert_eq!(mock.get_balance(&Pubkey::new_unique()).await.unwrap(), 0);
        assert_eq!(mock.get_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_chain_missing_token_account() {
        let mock = MockChain::new();
        let result = mock.get_token_account_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(ChainError::AccountNotFound(_))));
    }

    #[test]
    fn test_rejecting_signer() {
        let signer = MockSigner::rejecting();
        let mut tx = Transaction::new_with_payer(&[], Some(&signer.pubkey()));
        let err = signer.sign_transaction(&mut tx).unwrap_err();
        assert!(err.to_string().contains("User rejected"));
        assert_eq!(signer.signed_count(), 0);
    }
}
