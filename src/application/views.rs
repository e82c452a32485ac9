//! Terminal Views
//!
//! The three panels of the trading screen: wallet balances, market
//! statistics and the trade form. Each view owns its own reads against the
//! swap client; nothing is shared or deduplicated between them.

use async_trait::async_trait;
use solana_sdk::signature::Signature;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::client::SwapClient;
use crate::domain::balances::WalletBalances;
use crate::domain::market::MarketStats;
use crate::domain::trade::{
    FailureKind, TradeAmount, TradeDirection, TradeInput, TradeLimits, TradeValidationError,
};
use crate::domain::units::{format_number, format_sol, format_usdc, lamports_to_usdc_units};
use crate::ports::ChainPort;

const BAR_WIDTH: usize = 30;

/// A panel refreshed on a timer by the poller
#[async_trait]
pub trait View: Send {
    fn name(&self) -> &'static str;

    /// Fetch fresh data and render the panel
    async fn refresh(&mut self) -> String;

    /// Panel shown while no wallet is connected
    fn render_disconnected(&self) -> String;
}

fn panel(title: &str, body: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", title);
    out.push_str(body);
    out
}

/// Text progress bar for a percentage already clamped to 0-100
pub fn utilization_bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn render_balances(balances: &WalletBalances) -> String {
    let usdc_badge = if balances.usdc_units > 0 { "" } else { " (no USDC)" };
    panel(
        "Wallet Balances",
        &format!(
            "  SOL:  {}\n  USDC: {}{}\n",
            format_sol(balances.sol_lamports),
            format_usdc(balances.usdc_units),
            usdc_badge
        ),
    )
}

pub fn render_market_stats(stats: &MarketStats) -> String {
    let pct = stats.utilization_pct();
    let mut body = String::new();
    let _ = writeln!(body, "  USDC Available:   {}", format_usdc(stats.total_usdc_left));
    let _ = writeln!(body, "  SOL in Program:   {}", format_sol(stats.total_sol_in_program));
    let _ = writeln!(body, "  Total Bought:     {}", format_usdc(stats.total_bought));
    let _ = writeln!(body, "  Total Sold:       {}", format_usdc(stats.total_sold));
    let _ = writeln!(
        body,
        "  Max Supply:       {} ({} base units)",
        format_usdc(stats.max_supply),
        format_number(stats.max_supply)
    );
    let _ = writeln!(
        body,
        "  Utilization:      {:.2}% {}",
        pct,
        utilization_bar(stats.utilization_bar_pct(), BAR_WIDTH)
    );
    if !stats.within_supply() {
        let _ = writeln!(body, "  Warning: outstanding supply exceeds max supply");
    }
    panel("Market Statistics", &body)
}

/// Wallet balances panel
pub struct BalancesView<C: ChainPort> {
    client: SwapClient<C>,
}

impl<C: ChainPort> BalancesView<C> {
    pub fn new(client: SwapClient<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ChainPort + 'static> View for BalancesView<C> {
    fn name(&self) -> &'static str {
        "balances"
    }

    async fn refresh(&mut self) -> String {
        match self.client.get_wallet_balances().await {
            Ok(balances) => render_balances(&balances),
            Err(e) => {
                tracing::warn!("Error fetching wallet balances: {}", e);
                panel("Wallet Balances", &format!("  Error: {}\n", e))
            }
        }
    }

    fn render_disconnected(&self) -> String {
        panel("Wallet Balances", "  Connect your wallet to view balances\n")
    }
}

/// Market statistics panel
pub struct MarketStatsView<C: ChainPort> {
    client: SwapClient<C>,
}

impl<C: ChainPort> MarketStatsView<C> {
    pub fn new(client: SwapClient<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ChainPort + 'static> View for MarketStatsView<C> {
    fn name(&self) -> &'static str {
        "market"
    }

    async fn refresh(&mut self) -> String {
        match self.client.get_market_stats().await {
            Some(stats) => render_market_stats(&stats),
            None => panel(
                "Market Statistics",
                "  Error Loading Market Data\n  Failed to fetch market statistics\n",
            ),
        }
    }

    fn render_disconnected(&self) -> String {
        panel(
            "Market Statistics",
            "  Wallet Connection Required\n  \
             Please connect your wallet to view market statistics\n",
        )
    }
}

/// Result of submitting the trade form
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Success { amount: TradeAmount, signature: Signature },
    Invalid(TradeValidationError),
    Failed(FailureKind),
}

impl TradeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TradeOutcome::Success { .. })
    }

    /// Banner text shown under the form
    pub fn banner(&self) -> String {
        match self {
            TradeOutcome::Success { amount, signature } => format!(
                "Success: Successfully {}!\n  Signature: {}",
                amount.describe(),
                signature
            ),
            TradeOutcome::Invalid(err) => format!("Transaction Error: {}", err),
            TradeOutcome::Failed(kind) => match kind.wallet_detail() {
                Some(detail) => format!(
                    "Wallet Error: {}\nTransaction Error: {}",
                    detail,
                    kind.user_message()
                ),
                None => format!("Transaction Error: {}", kind.user_message()),
            },
        }
    }
}

/// Trade form state: static limits plus balances cached by its own polling
pub struct TradeForm<C: ChainPort> {
    client: SwapClient<C>,
    limits: TradeLimits,
    cached: RwLock<Option<WalletBalances>>,
}

impl<C: ChainPort> TradeForm<C> {
    pub fn new(client: SwapClient<C>, limits: TradeLimits) -> Self {
        Self {
            client,
            limits,
            cached: RwLock::new(None),
        }
    }

    pub fn limits(&self) -> &TradeLimits {
        &self.limits
    }

    pub async fn cached_balances(&self) -> Option<WalletBalances> {
        *self.cached.read().await
    }

    /// Refetch balances into the cache; failures keep the last value
    pub async fn refresh_balances(&self) -> Option<WalletBalances> {
        match self.client.get_wallet_balances().await {
            Ok(balances) => {
                *self.cached.write().await = Some(balances);
                Some(balances)
            }
            Err(e) => {
                tracing::warn!("Error fetching wallet balances: {}", e);
                self.cached_balances().await
            }
        }
    }

    /// Drop cached balances, e.g. on disconnect
    pub async fn clear(&self) {
        *self.cached.write().await = None;
    }

    /// Validate against cached balances and limits without sending
    pub async fn validate(&self, input: &TradeInput) -> Result<TradeAmount, TradeValidationError> {
        let cached = self.cached_balances().await;
        input.validate(&self.limits, cached.as_ref())
    }

    /// Validate, then buy or sell through the swap client
    pub async fn submit(&self, input: &TradeInput) -> TradeOutcome {
        let amount = match self.validate(input).await {
            Ok(amount) => amount,
            Err(e) => return TradeOutcome::Invalid(e),
        };

        match self.client.execute(&amount).await {
            Ok(signature) => TradeOutcome::Success { amount, signature },
            Err(e) => {
                tracing::error!("Transaction failed: {}", e);
                TradeOutcome::Failed(FailureKind::classify(&e.to_string()))
            }
        }
    }

    pub fn render(&self, cached: Option<&WalletBalances>) -> String {
        let mut body = String::new();
        let _ = writeln!(body, "  Rate: 1 USDC = 0.01 SOL");
        let _ = writeln!(
            body,
            "  Buy:  max {} SOL per transaction",
            format_sol(self.limits.max_sol_lamports)
        );
        if let Some(balances) = cached {
            let spendable = balances.sol_lamports.min(self.limits.max_sol_lamports);
            let _ = writeln!(
                body,
                "        up to {} USDC with current SOL",
                format_usdc(lamports_to_usdc_units(spendable))
            );
            let _ = writeln!(body, "  Sell: up to {} USDC", format_usdc(balances.usdc_units));
        }
        let _ = writeln!(body, "  Commands: buy <SOL> | sell <USDC> | disconnect | connect | quit");
        panel("Trade USDC", &body)
    }
}

/// Trade form panel; refreshes the form's balance cache
pub struct TradeFormView<C: ChainPort> {
    form: Arc<TradeForm<C>>,
}

impl<C: ChainPort> TradeFormView<C> {
    pub fn new(form: Arc<TradeForm<C>>) -> Self {
        Self { form }
    }
}

#[async_trait]
impl<C: ChainPort + 'static> View for TradeFormView<C> {
    fn name(&self) -> &'static str {
        "trade"
    }

    async fn refresh(&mut self) -> String {
        let cached = self.form.refresh_balances().await;
        self.form.render(cached.as_ref())
    }

    fn render_disconnected(&self) -> String {
        panel(
            "Trade USDC",
            "  Wallet Required\n  Please connect your wallet to start trading\n",
        )
    }
}

/// A line typed into the interactive trade form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    Trade(TradeInput),
    Connect,
    Disconnect,
    Quit,
}

/// Parse one line of interactive input
pub fn parse_form_command(line: &str) -> Result<FormCommand, String> {
    let mut parts = line.split_whitespace();
    let head = parts.next().ok_or_else(|| "empty command".to_string())?;

    match head.to_lowercase().as_str() {
        "connect" => Ok(FormCommand::Connect),
        "disconnect" => Ok(FormCommand::Disconnect),
        "quit" | "exit" | "q" => Ok(FormCommand::Quit),
        other => {
            let direction: TradeDirection = other.parse()?;
            let amount = parts.next().unwrap_or("");
            Ok(FormCommand::Trade(TradeInput::new(direction, amount)))
        }
    }
}
