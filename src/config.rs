//! Application configuration.
//!
//! Loaded with priority:
//! 1. `--config <path>` (errors are fatal)
//! 2. `./halalapi.toml` when present (errors fall back to defaults)
//! 3. Defaults
//!
//! `HALALAPI_ASSETS` (JSON) then replaces the `[assets]` section.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::HalalError;

pub const DEFAULT_CONFIG_FILE: &str = "halalapi.toml";
pub const ASSETS_ENV_VAR: &str = "HALALAPI_ASSETS";

pub const DEFAULT_MODEL_URL: &str =
    "https://github.com/alaa-sanad/halalapi/releases/download/v1/model.json";
pub const DEFAULT_VOCABULARY_URL: &str =
    "https://github.com/alaa-sanad/halalapi/releases/download/v1/tokenizer.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum request body size
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Where the model and vocabulary come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AssetsConfig {
    /// Files already on disk, loaded at startup by default.
    Local {
        #[serde(default = "default_model_path")]
        model_path: PathBuf,
        #[serde(default = "default_vocabulary_path")]
        vocabulary_path: PathBuf,
        #[serde(default = "default_true")]
        preload: bool,
    },
    /// Downloaded once into `cache_dir`, loaded on first request by default.
    Remote {
        #[serde(default = "default_model_url")]
        model_url: String,
        #[serde(default = "default_vocabulary_url")]
        vocabulary_url: String,
        #[serde(default)]
        cache_dir: Option<PathBuf>,
        #[serde(default)]
        preload: bool,
    },
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self::Local {
            model_path: default_model_path(),
            vocabulary_path: default_vocabulary_path(),
            preload: true,
        }
    }
}

impl AssetsConfig {
    /// Whether `serve` should load assets before accepting requests.
    pub fn preload(&self) -> bool {
        match self {
            AssetsConfig::Local { preload, .. } | AssetsConfig::Remote { preload, .. } => *preload,
        }
    }

    pub fn source_name(&self) -> &'static str {
        match self {
            AssetsConfig::Local { .. } => "local",
            AssetsConfig::Remote { .. } => "remote",
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model/model.json")
}

fn default_vocabulary_path() -> PathBuf {
    PathBuf::from("tokenizer.json")
}

fn default_model_url() -> String {
    DEFAULT_MODEL_URL.to_string()
}

fn default_vocabulary_url() -> String {
    DEFAULT_VOCABULARY_URL.to_string()
}

/// Default download cache: `<user cache dir>/halalapi`, else `<tmp>/halalapi`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("halalapi")
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, HalalError> {
        toml::from_str(contents).map_err(|e| HalalError::Config(e.to_string()))
    }

    /// Load configuration following the module-level priority.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, HalalError> {
        let mut config = match explicit_path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    HalalError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                let config = Self::from_toml_str(&contents)?;
                info!("Loaded config from {}", path.display());
                config
            }
            None => Self::load_default_file(Path::new(DEFAULT_CONFIG_FILE)),
        };

        if let Ok(json) = std::env::var(ASSETS_ENV_VAR) {
            config.apply_assets_override(&json);
        }

        Ok(config)
    }

    fn load_default_file(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Replace the assets section from a JSON document, keeping the current
    /// one if it does not parse.
    pub fn apply_assets_override(&mut self, json: &str) {
        match serde_json::from_str::<AssetsConfig>(json) {
            Ok(assets) => {
                info!("Loaded assets config from {} env", ASSETS_ENV_VAR);
                self.assets = assets;
            }
            Err(e) => {
                warn!("Failed to parse {}: {}. Keeping file config.", ASSETS_ENV_VAR, e);
            }
        }
    }
}
