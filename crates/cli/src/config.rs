use std::path::{Path, PathBuf};
use std::time::Duration;

use proto::{ConfigError, ModelChoice};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Directory under `$HOME` holding config, logs and TUI state.
pub const APP_DIR: &str = ".multichat";

/// `~/.multichat`, or `./.multichat` when `HOME` is unset.
pub fn app_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(APP_DIR)
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat backend connection settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat defaults.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:5000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; expiry surfaces as a network error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[chat]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model used for new sessions unless the TUI remembers another one.
    #[serde(default)]
    pub model: ModelChoice,
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Look in current dir, then home dir
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home_config = app_dir().join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        debug!(
            base_url = %config.server.base_url,
            timeout_secs = config.server.timeout_secs,
            model = %config.chat.model,
            "Config loaded"
        );
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("MULTICHAT_SERVER_URL") {
            self.server.base_url = url;
        }
        if let Ok(model) = std::env::var("MULTICHAT_MODEL") {
            self.chat.model = model
                .parse()
                .map_err(|e: proto::ProtoError| ConfigError::InvalidValue {
                    field: "MULTICHAT_MODEL".to_string(),
                    reason: e.to_string(),
                })?;
        }
        if let Ok(secs) = std::env::var("MULTICHAT_TIMEOUT_SECS") {
            self.server.timeout_secs =
                secs.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "MULTICHAT_TIMEOUT_SECS".to_string(),
                    reason: format!("'{secs}' is not a whole number of seconds"),
                })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("server.base_url".to_string()));
        }
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ─── TuiState ───────────────────────────────────────────────

/// Lightweight state persisted across TUI sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuiState {
    /// Last model selected with F2.
    #[serde(default)]
    pub last_model: Option<ModelChoice>,
}

impl TuiState {
    /// Default file path: `~/.multichat/state.toml`.
    pub fn path() -> PathBuf {
        app_dir().join("state.toml")
    }

    /// Load from the default path, returning `Default` on any error.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Persist to the default path.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::path())
    }

    /// Persist to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }
}
