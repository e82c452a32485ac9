//! CLI Adapter
//!
//! Command-line interface for the swap client.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    BalancesCmd, CliApp, Command, FundVaultCmd, OutputFormat, StatsCmd, TradeCmd, WatchCmd,
    DEFAULT_FUND_AMOUNT,
};

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
