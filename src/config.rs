// ⚙️ Configuration - which store, which registry, which clock offset

use crate::error::{LedgerError, Result};
use crate::registry::RegistrySource;
use crate::store::StoreBackend;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "INVENTORY_LEDGER_CONFIG";

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "inventory.toml";

/// Application configuration
///
/// ```toml
/// operator = "almoxarifado"
/// utc_offset = "-03:00"
///
/// [store]
/// backend = "sqlite"
/// path = "estoque.db"
///
/// [registry]
/// source = "list"
/// path = "produtos.txt"
///
/// [server]
/// bind = "127.0.0.1:3000"
/// api_token = "troque-me"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operator name recorded in CLI sessions
    pub operator: String,
    /// Fixed offset used to stamp "now" (e.g. "-03:00")
    pub utc_offset: String,
    pub store: StoreBackend,
    pub registry: RegistrySource,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// When set, requests must carry `Authorization: Bearer <token>`
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            operator: "operador".to_string(),
            utc_offset: "-03:00".to_string(),
            store: StoreBackend::default(),
            registry: RegistrySource::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
            api_token: None,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text).map_err(|e| LedgerError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.offset()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| LedgerError::InvalidConfig {
            reason: format!("read {}: {e}", path.display()),
        })?;
        let config = Config::from_toml_str(&text)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Resolve the config file and load it.
    ///
    /// Order: explicit path, `INVENTORY_LEDGER_CONFIG`, `./inventory.toml`,
    /// then built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            return Config::load(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Config::load(&PathBuf::from(path));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Config::load(local);
        }

        debug!("no config file found, using defaults");
        Ok(Config::default())
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset
            .parse::<FixedOffset>()
            .map_err(|e| LedgerError::InvalidConfig {
                reason: format!("utc_offset '{}': {e}", self.utc_offset),
            })
    }
}
