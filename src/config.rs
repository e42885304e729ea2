use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::PRIVATE_KEY_VAR;
use crate::retry::RetryPolicy;

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Account credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Hex-encoded private key (with or without 0x prefix).
    pub private_key: String,
}

/// Retry tuning. The probes historically disagreed on constants, so both
/// knobs are explicit here instead of baked into any one call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub backoff: BackoffKind,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Linear,
}

/// Minimum interval between successive call starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_pacing_secs")]
    pub interval_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    3
}

fn default_pacing_secs() -> u64 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff: BackoffKind::default(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_pacing_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::from_secs(self.backoff_secs);
        match self.backoff {
            BackoffKind::Fixed => RetryPolicy::fixed(self.max_retries, delay),
            BackoffKind::Linear => RetryPolicy::linear(self.max_retries, delay),
        }
    }
}

impl PacingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load config, or fall back to defaults when no file exists yet.
    /// Probes can run on the env key alone without a `config.toml`.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Resolve the payment key: environment first, then `config.toml`.
    pub fn private_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(PRIVATE_KEY_VAR) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok(key);
            }
        }
        if let Some(account) = &self.account {
            let key = account.private_key.trim();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }
        bail!("no payment key found — set {PRIVATE_KEY_VAR} or run setup-account")
    }
}
