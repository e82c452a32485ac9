//! usdc-swap - Fixed-rate USDC/SOL swap client
//!
//! Trades against the on-chain fixed-rate market from the terminal.

use anyhow::{bail, Context, Result};
use base64::Engine;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use usdc_swap::adapters::cli::{
    self, BalancesCmd, Command, FundVaultCmd, OutputFormat, StatsCmd, TradeCmd, WatchCmd,
};
use usdc_swap::adapters::solana::rpc::parse_commitment;
use usdc_swap::adapters::solana::{SolanaClient, WalletConnection, WalletManager};
use usdc_swap::application::poller::{spawn_trade, spawn_view, ViewUpdate};
use usdc_swap::application::views::{
    parse_form_command, render_balances, render_market_stats, BalancesView, FormCommand,
    MarketStatsView, TradeForm, TradeFormView,
};
use usdc_swap::application::SwapClient;
use usdc_swap::config::{load_config, Config};
use usdc_swap::domain::trade::{TradeDirection, TradeInput};
use usdc_swap::domain::units::{format_sol, format_usdc, parse_usdc};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = cli::init();
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;
    init_logging(app.verbose, app.debug, &config.logging.level);

    let rpc_url = app
        .rpc_url
        .clone()
        .unwrap_or_else(|| config.solana.get_rpc_url());
    let commitment = parse_commitment(&config.solana.commitment)
        .with_context(|| format!("Invalid commitment '{}'", config.solana.commitment))?;
    let solana = SolanaClient::with_commitment(rpc_url, commitment)
        .with_confirm_timeout(config.solana.confirm_timeout());
    tracing::info!("Using RPC endpoint {}", solana.url());

    let addresses = config.program.addresses().context("Invalid program addresses")?;
    for name in addresses.derivation_mismatches() {
        tracing::warn!("Configured {} does not match its seed derivation", name);
    }

    let client = SwapClient::new(Arc::new(solana), addresses);
    let keypair = app.keypair.as_deref();

    match app.command {
        Command::Stats(cmd) => stats_command(cmd, client).await,
        Command::Balances(cmd) => {
            let wallet = load_wallet(keypair, &config)?;
            balances_command(cmd, client.with_wallet(wallet)).await
        }
        Command::Buy(cmd) => {
            let wallet = load_wallet(keypair, &config)?;
            trade_command(TradeDirection::Buy, cmd, client.with_wallet(wallet), &config).await
        }
        Command::Sell(cmd) => {
            let wallet = load_wallet(keypair, &config)?;
            trade_command(TradeDirection::Sell, cmd, client.with_wallet(wallet), &config).await
        }
        Command::Watch(cmd) => {
            let wallet = load_wallet(keypair, &config)?;
            watch_command(cmd, client.with_wallet(wallet), &config).await
        }
        Command::FundVault(cmd) => {
            let wallet = load_wallet(keypair, &config)?;
            fund_vault_command(cmd, client.with_wallet(wallet)).await
        }
    }
}

fn init_logging(verbose: bool, debug: bool, config_level: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = log_directive(rust_log, verbose, debug, config_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log filter '{}': {}", directive, e);
        EnvFilter::new("info")
    });

    fmt().with_env_filter(filter).with_target(false).init();
}

/// RUST_LOG wins when set, then `--debug`, then `--verbose`, then the config level
fn log_directive(
    rust_log: Option<String>,
    verbose: bool,
    debug: bool,
    config_level: &str,
) -> String {
    match rust_log.filter(|s| !s.trim().is_empty()) {
        Some(directive) => directive,
        None if debug => "debug".to_string(),
        None if verbose => "info".to_string(),
        None => config_level.to_string(),
    }
}

/// Resolve the signing wallet: `--keypair`, then WALLET_SECRET_BASE58, then config
fn load_wallet(keypair: Option<&Path>, config: &Config) -> Result<Arc<WalletManager>> {
    if let Some(path) = keypair {
        let path = shellexpand::tilde(&path.to_string_lossy()).to_string();
        return load_wallet_with_context(&path).map(Arc::new);
    }

    if let Some(result) = WalletManager::from_env() {
        let wallet = result.context("WALLET_SECRET_BASE58 is set but is not a valid keypair")?;
        tracing::info!("Using wallet from WALLET_SECRET_BASE58");
        return Ok(Arc::new(wallet));
    }

    let path = shellexpand::tilde(&config.solana.get_keypair_path()).to_string();
    load_wallet_with_context(&path).map(Arc::new)
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(keypair_path: &str) -> Result<WalletManager> {
    let path = Path::new(keypair_path);

    if !path.exists() {
        bail!(
            "Wallet file not found: {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}\n\n\
             Or point 'keypair_path' in your config at an existing wallet, \
             pass --keypair, or set WALLET_SECRET_BASE58",
            keypair_path,
            keypair_path
        );
    }

    if let Err(e) = std::fs::metadata(path) {
        bail!(
            "Cannot access wallet file '{}': {}\n\n\
             Check file permissions and ensure the path is correct.",
            keypair_path,
            e
        );
    }

    WalletManager::from_file(keypair_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             The file exists but may be corrupted or in the wrong format.\n\
             Expected format: JSON array of bytes (e.g., [1,2,3,...])",
            keypair_path,
            e
        )
    })
}

/// Ask for a yes/no confirmation on stdin
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn stats_command(cmd: StatsCmd, client: SwapClient<SolanaClient>) -> Result<()> {
    let Some(stats) = client.get_market_stats().await else {
        bail!("Failed to fetch market statistics");
    };

    match cmd.format {
        OutputFormat::Text => print!("{}", render_market_stats(&stats)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(())
}

async fn balances_command(cmd: BalancesCmd, client: SwapClient<SolanaClient>) -> Result<()> {
    let balances = client
        .get_wallet_balances()
        .await
        .context("Failed to fetch wallet balances")?;

    match cmd.format {
        OutputFormat::Text => {
            if let Some(pubkey) = client.wallet_pubkey() {
                println!("Wallet: {}", pubkey);
            }
            print!("{}", render_balances(&balances));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&balances)?),
    }
    Ok(())
}

async fn trade_command(
    direction: TradeDirection,
    cmd: TradeCmd,
    client: SwapClient<SolanaClient>,
    config: &Config,
) -> Result<()> {
    let form = TradeForm::new(client.clone(), config.trading.limits());
    form.refresh_balances().await;

    let input = TradeInput::new(direction, cmd.amount);
    let amount = form.validate(&input).await?;

    if cmd.dry_run {
        let tx = client
            .build_trade_transaction(&amount)
            .await
            .context("Failed to build transaction")?;
        let bytes = bincode::serialize(&tx).context("Failed to serialize transaction")?;
        println!("{}", base64::engine::general_purpose::STANDARD.encode(bytes));
        return Ok(());
    }

    if !cmd.yes {
        let prompt = match direction {
            TradeDirection::Buy => format!(
                "Buy {} USDC for {} SOL?",
                format_usdc(amount.usdc_units),
                format_sol(amount.lamports)
            ),
            TradeDirection::Sell => format!(
                "Sell {} USDC for {} SOL?",
                format_usdc(amount.usdc_units),
                format_sol(amount.lamports)
            ),
        };
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let outcome = form.submit(&input).await;
    if !outcome.is_success() {
        bail!(outcome.banner());
    }
    println!("{}", outcome.banner());

    tokio::time::sleep(config.trading.post_trade_refresh()).await;
    if let Some(balances) = form.refresh_balances().await {
        print!("{}", render_balances(&balances));
    }
    Ok(())
}

async fn watch_command(
    cmd: WatchCmd,
    client: SwapClient<SolanaClient>,
    config: &Config,
) -> Result<()> {
    let pubkey = client
        .wallet_pubkey()
        .context("A wallet is required for watch mode")?;

    let connection = WalletConnection::new();
    if !cmd.disconnected {
        connection.connect(pubkey);
    }

    let (tx, mut rx) = mpsc::channel::<ViewUpdate>(64);
    let form = Arc::new(TradeForm::new(client.clone(), config.trading.limits()));
    let polling = &config.polling;

    spawn_view(
        BalancesView::new(client.clone()),
        Duration::from_secs(polling.balances_secs),
        connection.subscribe(),
        tx.clone(),
    );
    spawn_view(
        MarketStatsView::new(client.clone()),
        Duration::from_secs(polling.market_stats_secs),
        connection.subscribe(),
        tx.clone(),
    );
    spawn_view(
        TradeFormView::new(Arc::clone(&form)),
        Duration::from_secs(polling.trade_form_secs),
        connection.subscribe(),
        tx.clone(),
    );

    println!("Watching wallet {} (Ctrl+C to exit)", pubkey);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            Some(update) = rx.recv() => {
                println!("\n[{}] {}", update.at.format("%H:%M:%S"), update.view);
                print!("{}", update.rendered);
                println!();
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_form_command(&line) {
                    Ok(FormCommand::Trade(input)) => {
                        if !connection.is_connected() {
                            println!("Please connect your wallet to start trading");
                            continue;
                        }
                        spawn_trade(
                            Arc::clone(&form),
                            input,
                            config.trading.post_trade_refresh(),
                            tx.clone(),
                        );
                    }
                    Ok(FormCommand::Connect) => connection.connect(pubkey),
                    Ok(FormCommand::Disconnect) => {
                        connection.disconnect();
                        form.clear().await;
                    }
                    Ok(FormCommand::Quit) => break,
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    connection.disconnect();
    tracing::info!("Stopped watching");
    Ok(())
}

async fn fund_vault_command(cmd: FundVaultCmd, client: SwapClient<SolanaClient>) -> Result<()> {
    let Some(units) = parse_usdc(&cmd.amount).filter(|u| *u > 0) else {
        bail!("Invalid USDC amount: {}", cmd.amount);
    };

    let vault = client.addresses().vault_token;
    let prompt = format!("Transfer {} USDC into vault {}?", format_usdc(units), vault);
    if !cmd.yes && !confirm(&prompt)? {
        println!("Aborted.");
        return Ok(());
    }

    let signature = client
        .fund_vault(units)
        .await
        .context("Failed to fund vault")?;
    println!("Vault funded with {} USDC", format_usdc(units));
    println!("Signature: {}", signature);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        let directive = log_directive(Some("usdc_swap=trace".to_string()), true, true, "warn");
        assert_eq!(directive, "usdc_swap=trace");
    }

    #[test]
    fn test_flags_without_rust_log() {
        assert_eq!(log_directive(None, false, true, "warn"), "debug");
        assert_eq!(log_directive(None, true, false, "warn"), "info");
        assert_eq!(log_directive(Some("  ".to_string()), true, false, "warn"), "info");
    }

    #[test]
    fn test_config_level_fallback() {
        assert_eq!(log_directive(None, false, false, "warn"), "warn");
    }
}
