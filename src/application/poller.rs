//! View Poller
//!
//! Drives one view on its own interval while a wallet is connected.
//! Polling pauses on disconnect and resumes, with an immediate refresh,
//! when a wallet connects again.

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::views::{TradeForm, TradeOutcome, View};
use crate::domain::trade::TradeInput;
use crate::ports::ChainPort;

/// A freshly rendered panel
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    pub view: &'static str,
    pub rendered: String,
    pub at: DateTime<Utc>,
}

impl ViewUpdate {
    pub fn new(view: &'static str, rendered: String) -> Self {
        Self {
            view,
            rendered,
            at: Utc::now(),
        }
    }
}

/// Spawn the polling task for `view`.
///
/// The task exits when the connection sender or the update receiver is
/// dropped.
pub fn spawn_view<V>(
    mut view: V,
    period: Duration,
    mut connection: watch::Receiver<Option<Pubkey>>,
    updates: mpsc::Sender<ViewUpdate>,
) -> JoinHandle<()>
where
    V: View + 'static,
{
    tokio::spawn(async move {
        loop {
            if connection.borrow_and_update().is_none() {
                let idle = ViewUpdate::new(view.name(), view.render_disconnected());
                if updates.send(idle).await.is_err() {
                    return;
                }
                if connection.wait_for(|c| c.is_some()).await.is_err() {
                    return;
                }
            }

            tracing::debug!(view = view.name(), "Polling every {:?}", period);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let rendered = view.refresh().await;
                        if updates.send(ViewUpdate::new(view.name(), rendered)).await.is_err() {
                            return;
                        }
                    }
                    changed = connection.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if connection.borrow_and_update().is_none() {
                            tracing::debug!(
                                view = view.name(),
                                "Wallet disconnected, polling paused"
                            );
                            break;
                        }
                    }
                }
            }
        }
    })
}

/// Submit a trade from the form in the background.
///
/// The outcome banner is sent as a `trade` update. On success the form's
/// balances are refetched once more after `refresh_delay`.
pub fn spawn_trade<C>(
    form: Arc<TradeForm<C>>,
    input: TradeInput,
    refresh_delay: Duration,
    updates: mpsc::Sender<ViewUpdate>,
) -> JoinHandle<TradeOutcome>
where
    C: ChainPort + 'static,
{
    tokio::spawn(async move {
        let outcome = form.submit(&input).await;
        let _ = updates.send(ViewUpdate::new("trade", outcome.banner())).await;

        if outcome.is_success() {
            tokio::time::sleep(refresh_delay).await;
            let cached = form.refresh_balances().await;
            let _ = updates
                .send(ViewUpdate::new("trade", form.render(cached.as_ref())))
                .await;
        }
        outcome
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::solana::program::ProgramAddresses;
    use crate::application::client::SwapClient;
    use crate::domain::trade::TradeLimits;
    use crate::ports::mocks::{MockChain, MockSigner};
    use crate::ports::WalletSigner;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingView {
        refreshes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl View for CountingView {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn refresh(&mut self) -> String {
            let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            format!("refresh {}", n)
        }

        fn render_disconnected(&self) -> String {
            "disconnected".to_string()
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ViewUpdate>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(update) = rx.try_recv() {
            out.push(update.rendered);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval_while_connected() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let (conn_tx, conn_rx) = watch::channel(Some(Pubkey::new_unique()));
        let (tx, mut rx) = mpsc::channel(32);

        let handle = spawn_view(
            CountingView { refreshes: Arc::clone(&refreshes) },
            Duration::from_secs(5),
            conn_rx,
            tx,
        );

        // Immediate refresh, then at 5s and 10s
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(refreshes.load(Ordering::SeqCst), 3);
        assert_eq!(drain(&mut rx), vec!["refresh 1", "refresh 2", "refresh 3"]);

        drop(conn_tx);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_on_disconnect_and_resumes() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let (conn_tx, conn_rx) = watch::channel(None);
        let (tx, mut rx) = mpsc::channel(32);

        let _handle = spawn_view(
            CountingView { refreshes: Arc::clone(&refreshes) },
            Duration::from_secs(10),
            conn_rx,
            tx,
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(drain(&mut rx), vec!["disconnected"]);

        conn_tx.send_replace(Some(Pubkey::new_unique()));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        conn_tx.send_replace(None);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(drain(&mut rx), vec!["refresh 1", "disconnected"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_receiver_dropped() {
        let (_conn_tx, conn_rx) = watch::channel(Some(Pubkey::new_unique()));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let handle = spawn_view(
            CountingView { refreshes: Arc::new(AtomicUsize::new(0)) },
            Duration::from_secs(5),
            conn_rx,
            tx,
        );
        assert!(handle.await.is_ok());
    }

    fn trade_form(
        chain: MockChain,
        signer: Arc<MockSigner>,
    ) -> (Arc<TradeForm<MockChain>>, Arc<MockChain>) {
        let chain = Arc::new(chain);
        let client = SwapClient::new(Arc::clone(&chain), ProgramAddresses::default())
            .with_wallet(signer);
        (Arc::new(TradeForm::new(client, TradeLimits::default())), chain)
    }

    #[tokio::test(start_paused = true)]
    async fn test_trade_refreshes_balances_after_delay() {
        let signer = Arc::new(MockSigner::new());
        let chain = MockChain::new().with_balance(signer.pubkey(), 1_000_000_000);
        let (form, chain) = trade_form(chain, signer);
        let (tx, mut rx) = mpsc::channel(8);

        let handle = spawn_trade(
            Arc::clone(&form),
            TradeInput::buy("0.25"),
            Duration::from_secs(2),
            tx,
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        let first = drain(&mut rx);
        assert_eq!(first.len(), 1);
        assert!(first[0].starts_with("Success: Successfully bought 25.00 USDC"));
        assert_eq!(form.cached_balances().await, None);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.await.unwrap().is_success());
        let second = drain(&mut rx);
        assert_eq!(second.len(), 1);
        assert!(second[0].contains("Trade USDC"));
        assert!(form.cached_balances().await.is_some());
        assert_eq!(chain.sent_transactions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trade_skips_refresh() {
        let signer = Arc::new(MockSigner::new());
        let chain = MockChain::new()
            .with_balance(signer.pubkey(), 1_000_000_000)
            .with_send_error("Network request failed");
        let (form, _) = trade_form(chain, signer);
        let (tx, mut rx) = mpsc::channel(8);

        let outcome = spawn_trade(form, TradeInput::buy("0.25"), Duration::from_secs(2), tx)
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            drain(&mut rx),
            vec!["Transaction Error: Network error. Please check your connection and try again."]
        );
    }
}
