//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Solana: RPC client, wallet management and swap program instructions
//! - CLI: Command-line interface definitions

pub mod solana;
pub mod cli;

pub use solana::{SolanaClient, WalletConnection, WalletManager};
pub use cli::CliApp;
