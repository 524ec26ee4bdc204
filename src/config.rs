//! ClickDealer API credentials: environment layer over a JSON config file
//!
//! Bootstrap order: complete `CLICKDEALER_*` environment variables are
//! validated and saved to the config file (the one-time "settings save"),
//! otherwise the previously saved file is loaded. With neither present the
//! dashboard runs unconfigured and syncing stays gated off.

use {
    serde::{Deserialize, Serialize},
    std::{env, fs, path::Path},
};

/// Default upstream endpoint when none is configured
pub const DEFAULT_API_ENDPOINT: &str = "https://api.clickdealer.com/api/v1";

/// File the configuration persists to between runs
pub const CONFIG_FILE: &str = "clickdealer_config.json";

/// API credentials and endpoint for the upstream tracker
///
/// The API key is a secret: `Debug` masks it and nothing in the crate logs
/// or renders it in clear text.
#[derive(Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub api_key: String,
    pub affiliate_id: String,
    #[serde(default = "default_endpoint")]
    pub api_endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("api_key", &self.masked_key())
            .field("affiliate_id", &self.affiliate_id)
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A required field was empty on save; the save is blocked
    MissingField(&'static str),
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingField(field) => {
                write!(f, "Please fill in all required fields (missing: {})", field)
            }
            ConfigError::Io(e) => write!(f, "Config file error: {}", e),
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl TrackerConfig {
    /// Build a configuration from `CLICKDEALER_*` environment variables.
    ///
    /// Returns `None` when no ClickDealer variables are set at all;
    /// otherwise the partial set is validated like a settings-form save.
    pub fn from_env() -> Option<Result<Self, ConfigError>> {
        let api_key = env::var("CLICKDEALER_API_KEY").ok();
        let affiliate_id = env::var("CLICKDEALER_AFFILIATE_ID").ok();
        let api_endpoint = env::var("CLICKDEALER_API_ENDPOINT").ok();

        if api_key.is_none() && affiliate_id.is_none() && api_endpoint.is_none() {
            return None;
        }

        let config = Self {
            api_key: api_key.unwrap_or_default(),
            affiliate_id: affiliate_id.unwrap_or_default(),
            api_endpoint: api_endpoint.unwrap_or_else(default_endpoint),
        };

        Some(config.validate().map(|_| config))
    }

    /// Enforce the required fields. Called before every save.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("api_key"));
        }
        if self.affiliate_id.trim().is_empty() {
            return Err(ConfigError::MissingField("affiliate_id"));
        }
        Ok(())
    }

    /// Persist to `path` as pretty JSON. Validation failures block the save.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("Saved configuration for affiliate {} to {}", self.affiliate_id, path.display());
        Ok(())
    }

    /// Load a previously saved configuration; `None` when the file is absent.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(Some(config))
    }

    /// The API key with everything but the edges hidden, for logs and the UI.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 8 {
            return "••••••••".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}••••{}", head, tail)
    }
}

/// Resolve the startup configuration: environment first, saved file second.
///
/// A complete environment set behaves like a settings-form save and is
/// persisted to `path` for the next run. `None` means the dashboard starts
/// unconfigured.
pub fn bootstrap(path: &Path) -> Result<Option<TrackerConfig>, ConfigError> {
    match TrackerConfig::from_env() {
        Some(result) => {
            let config = result?;
            config.save(path)?;
            log::info!("💾 Saved ClickDealer configuration from environment to {}", path.display());
            Ok(Some(config))
        }
        None => match TrackerConfig::load(path)? {
            Some(config) => {
                config.validate()?;
                log::info!("🔑 Loaded ClickDealer configuration from {}", path.display());
                Ok(Some(config))
            }
            None => Ok(None),
        },
    }
}
