use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// Every field is optional so a file can set only what it needs. Values found
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// storage:
///   data_dir: "/data"
///
/// voices:
///   default_voice: "es_ES"
///   default_onnx_url: "https://huggingface.co/rhasspy/piper-voices/resolve/main/es/es_ES/davefx/medium/es_ES-davefx-medium.onnx"
///   default_json_url: "https://huggingface.co/rhasspy/piper-voices/resolve/main/es/es_ES/davefx/medium/es_ES-davefx-medium.onnx.json"
///
/// engines:
///   piper_bin: "/usr/local/bin/piper"
///   xtts_url: "http://xtts:8000/generate"
///   bark_url: "http://bark:8000/generate"
///   styletts2_url: "http://styletts2:8000/generate"
///
/// audio:
///   ffmpeg_bin: "ffmpeg"
///   mp3_bitrate: "192k"
///
/// security:
///   cors_allowed_origins: "https://portal.example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub storage: Option<StorageYaml>,
    pub voices: Option<VoicesYaml>,
    pub engines: Option<EnginesYaml>,
    pub audio: Option<AudioYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Persistent storage from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    /// Root of `models/`, `config/` and `audio/`
    pub data_dir: Option<String>,
}

/// Default voice from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoicesYaml {
    pub default_voice: Option<String>,
    pub default_onnx_url: Option<String>,
    pub default_json_url: Option<String>,
}

/// Synthesis engines from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EnginesYaml {
    pub piper_bin: Option<String>,
    pub xtts_url: Option<String>,
    pub bark_url: Option<String>,
    pub styletts2_url: Option<String>,
}

/// Post-processing and transcoding from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub ffmpeg_bin: Option<String>,
    pub mp3_bitrate: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        // An empty file is an empty config, not an error
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
