pub mod client;
pub mod poller;
pub mod views;

pub use client::{SwapClient, SwapClientError};
pub use poller::{spawn_view, ViewUpdate};
pub use views::{
    BalancesView, FormCommand, MarketStatsView, TradeForm, TradeFormView, TradeOutcome, View,
};
