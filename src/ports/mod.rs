//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Chain access (balances, account data, transaction submission)
//! - Wallet signing

pub mod chain;
pub mod wallet;
pub mod mocks;

pub use chain::{ChainError, ChainPort};
pub use wallet::{SignerError, WalletSigner};
