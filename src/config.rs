use crate::domain::Token;
use crate::emulator::DEFAULT_PAYOUT_OP_CODES;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SENDER_WALLET: &str = "UQCJoBrHlYgNgKMAMT5howVjiOXWbU7FewzGSzzN54rvxZIF";

#[derive(Debug, Clone)]
pub struct Config {
    /// Input sizes in whole native units.
    pub input_amounts: Vec<u64>,
    pub pairs_file: PathBuf,
    pub pairs_limit: usize,
    pub sender_wallet: String,
    pub slippage: f64,
    pub max_splits: u32,
    pub max_length: u32,
    /// Providers that get a second run with `wide_max_splits`.
    pub wide_split_providers: Vec<String>,
    pub wide_max_splits: u32,
    pub exclude_providers: Vec<String>,
    /// Delegating providers to enable; they are off unless listed.
    pub delegated_providers: Vec<String>,
    pub delegate_emulation: bool,
    pub results_dir: PathBuf,
    pub http_timeout: Duration,
    pub http_max_connections: usize,
    pub rate_limit_interval: Duration,
    pub group_pause: Duration,
    pub payout_op_codes: Vec<String>,
    pub emulator_url: String,
    pub indexer_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("Failed to load pairs from {0}: {1}")]
    Pairs(String, String),
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), reason.into())
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    reason: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| invalid(key, reason)),
        None => Ok(default),
    }
}

fn string_or(env_map: &HashMap<String, String>, key: &str, default: &str) -> String {
    env_map
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Comma separated list, blanks dropped.
fn list_or(env_map: &HashMap<String, String>, key: &str, default: &[&str]) -> Vec<String> {
    match env_map.get(key) {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn millis_or(env_map: &HashMap<String, String>, key: &str, default: u64) -> Result<Duration, ConfigError> {
    parse_or(env_map, key, default, "must be a whole number of milliseconds").map(Duration::from_millis)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let input_amounts = list_or(&env_map, "INPUT_AMOUNTS", &["1000"])
            .iter()
            .map(|s| match s.parse::<u64>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(invalid("INPUT_AMOUNTS", format!("not a positive integer: {}", s))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if input_amounts.is_empty() {
            return Err(invalid("INPUT_AMOUNTS", "must list at least one amount"));
        }

        // 1.0 disables slippage rejection during emulation.
        let slippage = parse_or(&env_map, "SLIPPAGE", 1.0, "must be a number")?;
        if !(0.0..=1.0).contains(&slippage) {
            return Err(invalid("SLIPPAGE", "must be a fraction in [0, 1]"));
        }

        let delegate_emulation = match env_map
            .get("DELEGATE_EMULATION")
            .map(|s| s.as_str())
            .unwrap_or("true")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(invalid(
                    "DELEGATE_EMULATION",
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let http_timeout = Duration::from_secs(parse_or(
            &env_map,
            "HTTP_TIMEOUT_SECS",
            6u64,
            "must be a whole number of seconds",
        )?);
        if http_timeout.is_zero() {
            return Err(invalid("HTTP_TIMEOUT_SECS", "must be greater than zero"));
        }

        let payout_op_codes = list_or(&env_map, "PAYOUT_OP_CODES", DEFAULT_PAYOUT_OP_CODES);
        if let Some(code) = payout_op_codes.iter().find(|c| !c.starts_with("0x")) {
            return Err(invalid("PAYOUT_OP_CODES", format!("op code must be hex, got {}", code)));
        }

        Ok(Config {
            input_amounts,
            pairs_file: PathBuf::from(string_or(&env_map, "PAIRS_FILE", "jettons.json")),
            pairs_limit: parse_or(&env_map, "PAIRS_LIMIT", 100, "must be a valid usize")?,
            sender_wallet: string_or(&env_map, "SENDER_WALLET", DEFAULT_SENDER_WALLET),
            slippage,
            max_splits: parse_or(&env_map, "MAX_SPLITS", 4, "must be a valid u32")?,
            max_length: parse_or(&env_map, "MAX_LENGTH", 5, "must be a valid u32")?,
            wide_split_providers: list_or(&env_map, "WIDE_SPLIT_PROVIDERS", &["swap.coffee"]),
            wide_max_splits: parse_or(&env_map, "WIDE_MAX_SPLITS", 20, "must be a valid u32")?,
            exclude_providers: list_or(&env_map, "EXCLUDE_PROVIDERS", &[]),
            delegated_providers: list_or(&env_map, "DELEGATED_PROVIDERS", &[]),
            delegate_emulation,
            results_dir: PathBuf::from(string_or(&env_map, "RESULTS_DIR", "results")),
            http_timeout,
            http_max_connections: parse_or(&env_map, "HTTP_MAX_CONNECTIONS", 100, "must be a valid usize")?,
            rate_limit_interval: millis_or(&env_map, "RATE_LIMIT_INTERVAL_MS", 1_000)?,
            group_pause: millis_or(&env_map, "GROUP_PAUSE_MS", 2_000)?,
            payout_op_codes,
            emulator_url: string_or(&env_map, "EMULATOR_URL", crate::emulator::client::DEFAULT_EMULATOR_URL),
            indexer_url: string_or(&env_map, "INDEXER_URL", crate::indexer::tonapi::DEFAULT_INDEXER_URL),
        })
    }

    pub fn is_excluded(&self, provider: &str) -> bool {
        self.exclude_providers.iter().any(|p| p == provider)
    }

    pub fn is_delegated_enabled(&self, provider: &str) -> bool {
        self.delegated_providers.iter().any(|p| p == provider)
    }
}

/// Read the token universe and keep the first `limit` entries.
pub fn load_tokens(path: &Path, limit: usize) -> Result<Vec<Token>, ConfigError> {
    let pairs_error = |reason: String| ConfigError::Pairs(path.display().to_string(), reason);

    let content = std::fs::read_to_string(path).map_err(|e| pairs_error(e.to_string()))?;
    let mut tokens: Vec<Token> =
        serde_json::from_str(&content).map_err(|e| pairs_error(e.to_string()))?;
    tokens.truncate(limit);
    Ok(tokens)
}
