//! usdc-swap - Fixed-rate USDC/SOL swap client library
//!
//! Trades against an on-chain market that exchanges 1 USDC for 0.01 SOL.
//!
//! # Modules
//!
//! - `domain`: Core types (MarketState, WalletBalances, TradeInput)
//! - `ports`: Trait abstractions (ChainPort, WalletSigner)
//! - `adapters`: External implementations (Solana RPC, wallet, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Swap client and polling views

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
