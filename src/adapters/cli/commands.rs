//! CLI Commands
//!
//! Argument definitions for the `usdc-swap` binary.
//! Uses clap derive macros for argument parsing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default amount moved by `fund-vault`, in whole USDC
pub const DEFAULT_FUND_AMOUNT: &str = "1000";

/// usdc-swap - Fixed-rate USDC/SOL swap client for Solana
#[derive(Parser, Debug)]
#[command(
    name = "usdc-swap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fixed-rate USDC/SOL swap client for Solana",
    long_about = "usdc-swap trades against an on-chain fixed-rate market \
                  (1 USDC = 0.01 SOL), showing wallet balances and market \
                  statistics from a live terminal view."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/devnet.toml", global = true)]
    pub config: PathBuf,

    /// Override RPC URL
    #[arg(long, value_name = "URL", global = true)]
    pub rpc_url: Option<String>,

    /// Override keypair path
    #[arg(long, value_name = "FILE", global = true)]
    pub keypair: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show market statistics once
    Stats(StatsCmd),

    /// Show wallet SOL and USDC balances once
    Balances(BalancesCmd),

    /// Buy USDC with SOL
    Buy(TradeCmd),

    /// Sell USDC for SOL
    Sell(TradeCmd),

    /// Live view of balances, market and trade form
    Watch(WatchCmd),

    /// Transfer USDC from the wallet into the swap vault
    FundVault(FundVaultCmd),
}

/// Output format for one-shot reads
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct StatsCmd {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct BalancesCmd {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Buy or sell; the amount is SOL for `buy` and USDC for `sell`
#[derive(Parser, Debug)]
pub struct TradeCmd {
    /// Amount as a decimal string (e.g. 0.5)
    #[arg(value_name = "AMOUNT", allow_hyphen_values = true)]
    pub amount: String,

    /// Confirm trade without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Build and print the unsigned transaction without sending
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Start with the wallet disconnected
    #[arg(long)]
    pub disconnected: bool,
}

#[derive(Parser, Debug)]
pub struct FundVaultCmd {
    /// Whole USDC to transfer
    #[arg(value_name = "USDC", default_value = DEFAULT_FUND_AMOUNT)]
    pub amount: String,

    /// Confirm transfer without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_app_parse_stats() {
        let args = vec!["usdc-swap", "stats"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Stats(cmd) => assert_eq!(cmd.format, OutputFormat::Text),
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_app_parse_balances_json() {
        let args = vec!["usdc-swap", "balances", "--format", "json"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Balances(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            _ => panic!("Expected Balances command"),
        }
    }

    #[test]
    fn test_cli_app_parse_buy() {
        let args = vec!["usdc-swap", "buy", "0.5"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Buy(cmd) => {
                assert_eq!(cmd.amount, "0.5");
                assert!(!cmd.yes);
                assert!(!cmd.dry_run);
            }
            _ => panic!("Expected Buy command"),
        }
    }

    #[test]
    fn test_cli_app_parse_sell_with_flags() {
        let args = vec!["usdc-swap", "sell", "25", "-y", "--dry-run"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Sell(cmd) => {
                assert_eq!(cmd.amount, "25");
                assert!(cmd.yes);
                assert!(cmd.dry_run);
            }
            _ => panic!("Expected Sell command"),
        }
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let args = vec!["usdc-swap", "buy", "-1"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Buy(cmd) => assert_eq!(cmd.amount, "-1"),
            _ => panic!("Expected Buy command"),
        }
    }

    #[test]
    fn test_buy_requires_amount() {
        assert!(CliApp::try_parse_from(vec!["usdc-swap", "buy"]).is_err());
    }

    #[test]
    fn test_fund_vault_default_amount() {
        let args = vec!["usdc-swap", "fund-vault"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::FundVault(cmd) => {
                assert_eq!(cmd.amount, DEFAULT_FUND_AMOUNT);
                assert!(!cmd.yes);
            }
            _ => panic!("Expected FundVault command"),
        }
    }

    #[test]
    fn test_cli_app_parse_watch() {
        let args = vec!["usdc-swap", "watch", "--disconnected"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Watch(cmd) => assert!(cmd.disconnected),
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec![
            "usdc-swap",
            "stats",
            "-v",
            "--debug",
            "--rpc-url",
            "http://localhost:8899",
            "--keypair",
            "/tmp/id.json",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
        assert_eq!(app.rpc_url.as_deref(), Some("http://localhost:8899"));
        assert_eq!(app.keypair, Some(PathBuf::from("/tmp/id.json")));
    }

    #[test]
    fn test_default_config_path() {
        let app = CliApp::try_parse_from(vec!["usdc-swap", "balances"]).unwrap();
        assert_eq!(app.config, PathBuf::from("config/devnet.toml"));

        let app =
            CliApp::try_parse_from(vec!["usdc-swap", "balances", "-c", "local.toml"]).unwrap();
        assert_eq!(app.config, PathBuf::from("local.toml"));
    }
}
