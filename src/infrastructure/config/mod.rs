//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Default public Celo RPC endpoint
pub const DEFAULT_RPC_ENDPOINT: &str = "https://forno.celo.org";

/// G$ (GoodDollar) token contract on Celo
pub const DEFAULT_TOKEN_CONTRACT: &str = "0xE4C4cF3cB472F1417924C73Ff98fB7059A93D692";

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub adapters: AdaptersConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

/// Payment verification settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaymentConfig {
    /// Public JSON-RPC endpoint for read-only balance queries
    pub rpc_endpoint: String,
    /// Token contract whose balance is treated as proof of payment
    pub token_contract: String,
    /// Wallet shown to buyers as the payment destination
    pub receiver_address: Option<String>,
    /// Whole tokens asked for in the buy prompt
    pub price: f64,
    /// Whole-token balance threshold the check must meet
    pub min_amount: f64,
    /// Upper bound on a single RPC round trip, in seconds
    pub rpc_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "goodmarket-bot".to_string(),
                prefix: "/".to_string(),
            },
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                }),
                console: Some(ConsoleConfig { enabled: true }),
            },
            payment: PaymentConfig {
                rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
                token_contract: DEFAULT_TOKEN_CONTRACT.to_string(),
                receiver_address: None,
                price: 10.0,
                min_amount: 1.0,
                rpc_timeout_seconds: 10,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables override file settings
    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if let Some(ref mut tg) = self.adapters.telegram {
                tg.token = Some(token);
                tg.enabled = true;
            } else {
                self.adapters.telegram = Some(TelegramConfig {
                    enabled: true,
                    token: Some(token),
                });
            }
        }

        if let Ok(receiver) = std::env::var("RECEIVER_ADDRESS") {
            self.payment.receiver_address = Some(receiver);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }
    }

    /// The Telegram bot token, if configured
    pub fn telegram_token(&self) -> Option<String> {
        self.adapters.telegram.as_ref().and_then(|t| t.token.clone())
    }

    /// The receiving wallet, required before any adapter can start
    pub fn receiver_address(&self) -> Result<String, ConfigError> {
        self.payment
            .receiver_address
            .clone()
            .ok_or_else(|| ConfigError::MissingField("receiver-address (or RECEIVER_ADDRESS)".to_string()))
    }
}
