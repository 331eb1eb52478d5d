//! Configuration loading from TOML, with credentials resolved from the environment.

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use std::{fs, path::Path, path::PathBuf};

use crate::exchanges::DexLabel;
use crate::shared::errors::ConfigError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamCfg {
    pub backoff_secs: u64,
    pub backoff_jitter_secs: u64,
    /// A subscription silent for this long is treated as dead and reopened
    pub idle_timeout_secs: u64,
    pub commitment: String,
}

impl Default for StreamCfg {
    fn default() -> Self {
        Self {
            backoff_secs: 30,
            backoff_jitter_secs: 5,
            idle_timeout_secs: 120,
            commitment: "confirmed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgramsCfg {
    pub raydium_v4: String,
    pub meteora_dlmm: String,
}

impl Default for ProgramsCfg {
    fn default() -> Self {
        Self {
            raydium_v4: DexLabel::RaydiumV4.program_id().to_string(),
            meteora_dlmm: DexLabel::MeteoraDlmm.program_id().to_string(),
        }
    }
}

impl ProgramsCfg {
    pub fn program_id(&self, dex: DexLabel) -> &str {
        match dex {
            DexLabel::RaydiumV4 => &self.raydium_v4,
            DexLabel::MeteoraDlmm => &self.meteora_dlmm,
        }
    }
}

/// Candidate filter thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FiltersCfg {
    pub min_locked_fraction: f64,
    /// Strict lower bound
    pub min_liquidity: f64,
    /// Strict lower bound
    pub min_holders: u64,
}

impl Default for FiltersCfg {
    fn default() -> Self {
        Self {
            min_locked_fraction: 0.90,
            min_liquidity: 7500.0,
            min_holders: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurvivalCfg {
    pub interval_secs: u64,
    pub first_checkpoint_secs: i64,
    pub second_checkpoint_secs: i64,
    /// Survival alert requires liquidity change strictly above this
    pub max_liquidity_drop_pct: f64,
    /// Survival alert requires holders change strictly above this
    pub max_holders_drop_pct: f64,
}

impl Default for SurvivalCfg {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            first_checkpoint_secs: 86_400,
            second_checkpoint_secs: 172_800,
            max_liquidity_drop_pct: -50.0,
            max_holders_drop_pct: -10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    pub watchlist_path: PathBuf,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            watchlist_path: PathBuf::from("watchlist.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServicesCfg {
    pub goplus_url: String,
    pub birdeye_url: String,
    pub telegram_api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServicesCfg {
    fn default() -> Self {
        Self {
            goplus_url: "https://api.gopluslabs.io/api/v1/token_security/1".to_string(),
            birdeye_url: "https://public-api.birdeye.so/defi/token_overview".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramCfg {
    /// Default alert destination for headless `hunt`
    pub chat_id: Option<String>,
    pub poll_timeout_secs: u64,
}

impl Default for TelegramCfg {
    fn default() -> Self {
        Self {
            chat_id: None,
            poll_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stream: StreamCfg,
    pub programs: ProgramsCfg,
    pub filters: FiltersCfg,
    pub survival: SurvivalCfg,
    pub storage: StorageCfg,
    pub services: ServicesCfg,
    pub telegram: TelegramCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&s)?;
        Ok(cfg)
    }

    /// Load from `path` if given, otherwise use defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for dex in DexLabel::ALL {
            let program_id = self.programs.program_id(dex);
            Pubkey::from_str(program_id).map_err(|e| {
                ConfigError::Invalid(format!("{} program id {}: {}", dex, program_id, e))
            })?;
        }
        if self.stream.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid("stream.idle_timeout_secs must be positive".to_string()));
        }
        if self.survival.interval_secs == 0 {
            return Err(ConfigError::Invalid("survival.interval_secs must be positive".to_string()));
        }
        if self.survival.second_checkpoint_secs <= self.survival.first_checkpoint_secs {
            return Err(ConfigError::Invalid(
                "survival.second_checkpoint_secs must exceed first_checkpoint_secs".to_string(),
            ));
        }
        if self.stream.backoff_secs == 0 {
            return Err(ConfigError::Invalid("stream.backoff_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.services.request_timeout_secs)
    }
}

/// Secrets, read from the environment only
#[derive(Clone)]
pub struct Credentials {
    pub rpc_ws_url: String,
    pub birdeye_api_key: String,
    pub goplus_api_key: String,
    pub telegram_bot_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("rpc_ws_url", &self.rpc_ws_url)
            .field("birdeye_api_key", &"***")
            .field("goplus_api_key", &"***")
            .field("telegram_bot_token", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };

        Ok(Self {
            rpc_ws_url: require("HELIUS_RPC_URL")?,
            birdeye_api_key: require("BIRDEYE_API_KEY")?,
            goplus_api_key: require("GOPLUS_API_KEY")?,
            telegram_bot_token: require("TELEGRAM_BOT_TOKEN")?,
        })
    }
}
