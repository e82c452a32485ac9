//! Swap Flow Integration Tests
//!
//! Drives the public API end to end against the in-memory chain:
//! 1. Shipped config -> program addresses
//! 2. Market statistics from raw account data
//! 3. Trade form validation -> signed buy/sell instructions
//! 4. Polling views following the wallet connection
//!
//! All tests are deterministic (no real network calls).

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc;

use usdc_swap::adapters::solana::program::{instruction_discriminator, BUY_USDC, SELL_USDC};
use usdc_swap::adapters::solana::{ProgramAddresses, WalletConnection};
use usdc_swap::application::poller::{spawn_view, ViewUpdate};
use usdc_swap::application::views::{BalancesView, MarketStatsView, TradeForm, TradeOutcome};
use usdc_swap::application::SwapClient;
use usdc_swap::config::parse_config;
use usdc_swap::domain::market::MarketState;
use usdc_swap::domain::trade::{TradeInput, TradeValidationError};
use usdc_swap::ports::mocks::{MockChain, MockSigner};
use usdc_swap::ports::WalletSigner;

// ============================================================================
// Test Fixtures
// ============================================================================

fn devnet_addresses() -> ProgramAddresses {
    let config = parse_config(include_str!("../config/devnet.toml")).unwrap();
    config.program.addresses().unwrap()
}

fn market_state(addresses: &ProgramAddresses) -> MarketState {
    MarketState {
        usdc_mint: addresses.usdc_mint,
        vault_authority_bump: 254,
        total_bought: 400_000_000,
        total_sold: 100_000_000,
        max_supply: 1_000_000_000,
    }
}

/// Chain with a funded market and a trader holding 1.5 SOL and 40 USDC
fn funded_chain(addresses: &ProgramAddresses, trader: &Pubkey) -> MockChain {
    MockChain::new()
        .with_account(addresses.market_state, market_state(addresses).encode())
        .with_balance(addresses.program_id, 3_000_000_000)
        .with_token_balance(addresses.vault_token, 700_000_000)
        .with_balance(*trader, 1_500_000_000)
        .with_token_balance(addresses.usdc_account_for(trader), 40_000_000)
}

fn drain(rx: &mut mpsc::Receiver<ViewUpdate>) -> Vec<ViewUpdate> {
    let mut out = Vec::new();
    while let Ok(update) = rx.try_recv() {
        out.push(update);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_shipped_config_matches_devnet_deployment() {
    assert_eq!(devnet_addresses(), ProgramAddresses::default());
}

#[tokio::test]
async fn test_market_stats_from_chain() {
    let addresses = devnet_addresses();
    let trader = Pubkey::new_unique();
    let client = SwapClient::new(Arc::new(funded_chain(&addresses, &trader)), addresses);

    let stats = client.get_market_stats().await.unwrap();

    assert_eq!(stats.total_usdc_left, 700_000_000);
    assert_eq!(stats.total_sol_in_program, 3_000_000_000);
    assert_eq!(stats.outstanding(), 300_000_000);
    assert!((stats.utilization_pct() - 30.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_buy_then_sell_through_form() {
    let addresses = devnet_addresses();
    let signer = Arc::new(MockSigner::new());
    let chain = Arc::new(funded_chain(&addresses, &signer.pubkey()));
    let client = SwapClient::new(Arc::clone(&chain), addresses).with_wallet(signer.clone());
    let form = TradeForm::new(client, Default::default());

    form.refresh_balances().await;

    // 1.5 SOL -> 150 USDC
    let buy = form.submit(&TradeInput::buy("1.5")).await;
    assert!(matches!(buy, TradeOutcome::Success { .. }));

    // Cached balance still holds 40 USDC
    let too_much = form.submit(&TradeInput::sell("41")).await;
    assert_eq!(
        too_much,
        TradeOutcome::Invalid(TradeValidationError::InsufficientUsdc {
            available: "40.00".to_string()
        })
    );

    let sell = form.submit(&TradeInput::sell("12.5")).await;
    assert!(sell.is_success());

    let sent = chain.sent_transactions();
    assert_eq!(sent.len(), 2);
    assert_eq!(signer.signed_count(), 2);

    let buy_data = &sent[0].message.instructions[0].data;
    assert_eq!(&buy_data[..8], &instruction_discriminator(BUY_USDC));
    assert_eq!(u64::from_le_bytes(buy_data[8..16].try_into().unwrap()), 150_000_000);

    let sell_data = &sent[1].message.instructions[0].data;
    assert_eq!(&sell_data[..8], &instruction_discriminator(SELL_USDC));
    assert_eq!(u64::from_le_bytes(sell_data[8..16].try_into().unwrap()), 12_500_000);

    for tx in &sent {
        assert!(tx.verify().is_ok());
        assert_eq!(tx.message.recent_blockhash, chain.blockhash());
    }
}

#[tokio::test]
async fn test_over_limit_buy_never_reaches_chain() {
    let addresses = devnet_addresses();
    let signer = Arc::new(MockSigner::new());
    let chain = Arc::new(funded_chain(&addresses, &signer.pubkey()));
    let client = SwapClient::new(Arc::clone(&chain), addresses).with_wallet(signer);
    let form = TradeForm::new(client, Default::default());

    let outcome = form.submit(&TradeInput::buy("2.5")).await;

    assert_eq!(outcome.banner(), "Transaction Error: Maximum 2.0000 SOL per transaction");
    assert!(chain.sent_transactions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_views_follow_wallet_connection() {
    let addresses = devnet_addresses();
    let signer = Arc::new(MockSigner::new());
    let pubkey = signer.pubkey();
    let chain = Arc::new(funded_chain(&addresses, &pubkey));
    let client = SwapClient::new(Arc::clone(&chain), addresses).with_wallet(signer);

    let connection = WalletConnection::new();
    connection.connect(pubkey);
    let (tx, mut rx) = mpsc::channel(64);

    spawn_view(
        BalancesView::new(client.clone()),
        Duration::from_secs(10),
        connection.subscribe(),
        tx.clone(),
    );
    spawn_view(
        MarketStatsView::new(client),
        Duration::from_secs(5),
        connection.subscribe(),
        tx,
    );

    // Balances at 0s and 10s; market at 0s, 5s, 10s
    tokio::time::sleep(Duration::from_secs(11)).await;
    let updates = drain(&mut rx);
    assert_eq!(updates.iter().filter(|u| u.view == "balances").count(), 2);
    assert_eq!(updates.iter().filter(|u| u.view == "market").count(), 3);
    assert!(updates
        .iter()
        .any(|u| u.view == "balances" && u.rendered.contains("1.5000")));

    connection.disconnect();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let reads_after_disconnect = chain.get_calls().len();
    let paused = drain(&mut rx);
    assert_eq!(paused.len(), 2);
    assert!(paused
        .iter()
        .all(|u| u.rendered.to_lowercase().contains("connect your wallet")));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(chain.get_calls().len(), reads_after_disconnect);
    assert!(drain(&mut rx).is_empty());
}
