//! Configuration module for the voxgate server
//!
//! Configuration comes from environment variables (optionally seeded from a
//! `.env` file) and an optional YAML file. Priority: YAML > ENV vars > .env
//! values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voxgate::config::ServerConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallbacks
//! let config = ServerConfig::from_file(Path::new("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::tts::{Engine, EngineRegistry, VoiceDefaults};
use crate::utils::url_validation::validate_endpoint_url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATA_DIR: &str = "/data";
pub const DEFAULT_VOICE: &str = "es_ES";
pub const DEFAULT_PIPER_BIN: &str = "piper";
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse YAML config: {0}")]
    Parse(String),

    #[error("Invalid value for {key} ('{value}'): {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Root of `models/`, `config/` and `audio/`
    pub data_dir: PathBuf,

    pub default_voice: String,
    pub default_voice_onnx_url: Option<String>,
    pub default_voice_json_url: Option<String>,

    pub piper_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub mp3_bitrate: String,

    // Remote engine endpoints
    pub xtts_url: Option<String>,
    pub bark_url: Option<String>,
    pub styletts2_url: Option<String>,

    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `.env` is loaded by `main.rs` before this is called.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, using environment variables for
    /// anything the file does not set
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// The address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Voice asset root
    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    /// Config store root
    pub fn config_dir(&self) -> PathBuf {
        self.data_dir.join("config")
    }

    /// Scratch space for synthesis and post-processing
    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir.join("audio")
    }

    /// Configured endpoint of a remote engine
    pub fn engine_endpoint(&self, engine: Engine) -> Option<&str> {
        match engine {
            Engine::Piper => None,
            Engine::Xtts => self.xtts_url.as_deref(),
            Engine::Bark => self.bark_url.as_deref(),
            Engine::StyleTts2 => self.styletts2_url.as_deref(),
        }
    }

    /// Registry with every configured remote endpoint
    pub fn engine_registry(&self) -> Result<EngineRegistry, ConfigError> {
        let mut registry = EngineRegistry::new();
        for engine in Engine::ALL {
            let Some(raw) = self.engine_endpoint(engine) else {
                continue;
            };
            let url: Url = validate_endpoint_url(raw).map_err(|e| ConfigError::InvalidValue {
                key: engine.endpoint_env_var().unwrap_or_default().to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            })?;
            registry = registry.with_remote(engine, url);
        }
        Ok(registry)
    }

    pub fn voice_defaults(&self) -> VoiceDefaults {
        VoiceDefaults {
            voice: self.default_voice.clone(),
            onnx_url: self.default_voice_onnx_url.clone(),
            json_url: self.default_voice_json_url.clone(),
        }
    }
}
