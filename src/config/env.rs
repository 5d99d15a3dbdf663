//! Environment variable loading

use std::env;
use std::path::PathBuf;

use super::{
    ConfigError, DEFAULT_DATA_DIR, DEFAULT_FFMPEG_BIN, DEFAULT_HOST, DEFAULT_PIPER_BIN,
    DEFAULT_PORT, DEFAULT_VOICE, ServerConfig,
};
use crate::core::audio::DEFAULT_MP3_BITRATE;

/// Non-empty value of an environment variable
pub(super) fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build a configuration from environment variables and defaults
pub(super) fn load_from_env() -> Result<ServerConfig, ConfigError> {
    let port = match env_var("PORT") {
        Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
            key: "PORT".to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })?,
        None => DEFAULT_PORT,
    };

    Ok(ServerConfig {
        host: env_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port,
        data_dir: env_var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        default_voice: env_var("DEFAULT_VOICE").unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        default_voice_onnx_url: env_var("DEFAULT_VOICE_ONNX_URL"),
        default_voice_json_url: env_var("DEFAULT_VOICE_JSON_URL"),
        piper_bin: env_var("PIPER_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PIPER_BIN)),
        ffmpeg_bin: env_var("FFMPEG_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG_BIN)),
        mp3_bitrate: env_var("MP3_BITRATE").unwrap_or_else(|| DEFAULT_MP3_BITRATE.to_string()),
        xtts_url: env_var("XTTS_URL"),
        bark_url: env_var("BARK_URL"),
        styletts2_url: env_var("STYLETTS2_URL"),
        cors_allowed_origins: env_var("CORS_ALLOWED_ORIGINS"),
    })
}
