//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/devnet.toml.

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::solana::program::ProgramAddresses;
use crate::adapters::solana::rpc::parse_commitment;
use crate::domain::trade::TradeLimits;
use crate::domain::units::MAX_SOL_AMOUNT_LAMPORTS;

/// Main configuration structure matching config/devnet.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solana: SolanaSection,
    #[serde(default)]
    pub program: ProgramSection,
    #[serde(default)]
    pub trading: TradingSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint
    pub rpc_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Wallet keypair path (NEVER commit this file!)
    pub keypair_path: String,
    /// Seconds to wait for a transaction to confirm
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Get keypair path with environment variable override
    /// Checks SOLANA_KEYPAIR_PATH env var first, falls back to config value
    pub fn get_keypair_path(&self) -> String {
        std::env::var("SOLANA_KEYPAIR_PATH").unwrap_or_else(|_| self.keypair_path.clone())
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}

/// Swap program addresses (base58). Defaults are the devnet deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramSection {
    pub program_id: String,
    pub usdc_mint: String,
    pub market_state: String,
    pub vault_authority: String,
    pub vault_token: String,
}

impl Default for ProgramSection {
    fn default() -> Self {
        let defaults = ProgramAddresses::default();
        Self {
            program_id: defaults.program_id.to_string(),
            usdc_mint: defaults.usdc_mint.to_string(),
            market_state: defaults.market_state.to_string(),
            vault_authority: defaults.vault_authority.to_string(),
            vault_token: defaults.vault_token.to_string(),
        }
    }
}

impl ProgramSection {
    /// Parse every address, naming the first bad field
    pub fn addresses(&self) -> Result<ProgramAddresses, ConfigError> {
        fn parse(field: &str, value: &str) -> Result<Pubkey, ConfigError> {
            Pubkey::from_str(value).map_err(|e| {
                ConfigError::ValidationError(format!("{} is not a valid address: {}", field, e))
            })
        }

        Ok(ProgramAddresses {
            program_id: parse("program_id", &self.program_id)?,
            usdc_mint: parse("usdc_mint", &self.usdc_mint)?,
            market_state: parse("market_state", &self.market_state)?,
            vault_authority: parse("vault_authority", &self.vault_authority)?,
            vault_token: parse("vault_token", &self.vault_token)?,
        })
    }
}

/// Trade limits section
#[derive(Debug, Clone, Deserialize)]
pub struct TradingSection {
    /// Maximum lamports a single buy may spend
    #[serde(default = "default_max_sol_lamports")]
    pub max_sol_lamports: u64,
    /// Delay before refreshing balances after a trade
    #[serde(default = "default_post_trade_refresh_secs")]
    pub post_trade_refresh_secs: u64,
}

fn default_max_sol_lamports() -> u64 {
    MAX_SOL_AMOUNT_LAMPORTS
}

fn default_post_trade_refresh_secs() -> u64 {
    2
}

impl Default for TradingSection {
    fn default() -> Self {
        Self {
            max_sol_lamports: default_max_sol_lamports(),
            post_trade_refresh_secs: default_post_trade_refresh_secs(),
        }
    }
}

impl TradingSection {
    pub fn limits(&self) -> TradeLimits {
        TradeLimits {
            max_sol_lamports: self.max_sol_lamports,
        }
    }

    pub fn post_trade_refresh(&self) -> Duration {
        Duration::from_secs(self.post_trade_refresh_secs)
    }
}

/// Refresh intervals of the polling views
#[derive(Debug, Clone, Deserialize)]
pub struct PollingSection {
    #[serde(default = "default_balances_secs")]
    pub balances_secs: u64,
    #[serde(default = "default_market_stats_secs")]
    pub market_stats_secs: u64,
    #[serde(default = "default_trade_form_secs")]
    pub trade_form_secs: u64,
}

fn default_balances_secs() -> u64 {
    10
}

fn default_market_stats_secs() -> u64 {
    5
}

fn default_trade_form_secs() -> u64 {
    10
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            balances_secs: default_balances_secs(),
            market_stats_secs: default_market_stats_secs(),
            trade_form_secs: default_trade_form_secs(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.solana.keypair_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "keypair_path cannot be empty".to_string(),
            ));
        }

        if parse_commitment(&self.solana.commitment).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "commitment must be processed, confirmed or finalized, got {}",
                self.solana.commitment
            )));
        }

        if self.solana.confirm_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "confirm_timeout_secs must be > 0".to_string(),
            ));
        }

        self.program.addresses()?;

        if self.trading.max_sol_lamports == 0 {
            return Err(ConfigError::ValidationError(
                "max_sol_lamports must be > 0".to_string(),
            ));
        }

        for (name, secs) in [
            ("balances_secs", self.polling.balances_secs),
            ("market_stats_secs", self.polling.market_stats_secs),
            ("trade_form_secs", self.polling.trade_form_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be > 0",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[solana]
rpc_url = "https://api.devnet.solana.com"
commitment = "confirmed"
keypair_path = "~/.config/solana/id.json"

[program]
program_id = "9HzagBuheBCfbbXWVhqkYVArBzepy8Mif5rbe7gM257n"
usdc_mint = "4f3XEdxWDzxAadHfXyqofXUg1Qsz5kwLCrABp64JqS7h"
market_state = "2W1sWniYNwLg7LoWfZtKgeBTmXsy3GyDuCcd4ewLAHYA"
vault_authority = "D2rns2sJNRyxA1DJVSwux9NcKb79h2dBrFP2y53yyQJa"
vault_token = "5Dcg7FqrJTiC1mb39exEjnxANXTzVZFLgXvabcDqCjd7"

[trading]
max_sol_lamports = 2000000000
post_trade_refresh_secs = 2

[polling]
balances_secs = 10
market_stats_secs = 5
trade_form_secs = 10

[logging]
level = "info"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.solana.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.trading.max_sol_lamports, 2_000_000_000);
        assert_eq!(config.polling.market_stats_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.program.addresses().unwrap(), ProgramAddresses::default());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(
            r#"
[solana]
rpc_url = "http://127.0.0.1:8899"
keypair_path = "id.json"
"#,
        )
        .unwrap();

        assert_eq!(config.solana.commitment, "confirmed");
        assert_eq!(config.solana.confirm_timeout(), Duration::from_secs(60));
        assert_eq!(config.trading.limits(), TradeLimits::default());
        assert_eq!(config.trading.post_trade_refresh(), Duration::from_secs(2));
        assert_eq!(config.polling.balances_secs, 10);
        assert_eq!(config.polling.market_stats_secs, 5);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.program.addresses().unwrap(), ProgramAddresses::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let result = parse_config("[solana\nrpc_url = ");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_address() {
        let invalid = create_valid_config().replace(
            "vault_token = \"5Dcg7FqrJTiC1mb39exEjnxANXTzVZFLgXvabcDqCjd7\"",
            "vault_token = \"not-a-key\"",
        );
        let err = parse_config(&invalid).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError(ref msg) if msg.contains("vault_token"))
        );
    }

    #[test]
    fn test_invalid_commitment() {
        let invalid = create_valid_config()
            .replace("commitment = \"confirmed\"", "commitment = \"soon\"");
        assert!(matches!(
            parse_config(&invalid).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let invalid =
            create_valid_config().replace("market_stats_secs = 5", "market_stats_secs = 0");
        let err = parse_config(&invalid).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError(ref msg) if msg.contains("market_stats_secs")
        ));
    }

    #[test]
    fn test_zero_max_sol_rejected() {
        let invalid = create_valid_config()
            .replace("max_sol_lamports = 2000000000", "max_sol_lamports = 0");
        assert!(parse_config(&invalid).is_err());
    }

    #[test]
    fn test_empty_rpc_url() {
        let invalid = create_valid_config().replace(
            "rpc_url = \"https://api.devnet.solana.com\"",
            "rpc_url = \"\"",
        );
        assert!(parse_config(&invalid).is_err());
    }
}
