use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::use_cases::default_provider::DefaultProviderConfig;
use crate::application::use_cases::investigation::InvestigationConfig;
use crate::domain::error::{AppError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "sar-assistant.toml";
pub const ENV_PREFIX: &str = "SAR_";

/// Application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file,
/// `SAR_`-prefixed environment variables (`SAR_SERVER__PORT=8080`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub narrative: DefaultProviderConfig,
    pub investigation: InvestigationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            narrative: DefaultProviderConfig::default(),
            investigation: InvestigationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

/// External analysis command. Leaving `command` unset disables it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Program path, or a bare name looked up on `PATH`.
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl AppConfig {
    /// Load `.env`, then the layered configuration.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        if let Some(path) = path {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        Ok(Self::figment(path).extract()?)
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
