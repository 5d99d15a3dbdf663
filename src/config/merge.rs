//! Merging YAML on top of environment configuration

use std::path::PathBuf;

use super::env::load_from_env;
use super::yaml::YamlConfig;
use super::{ConfigError, ServerConfig};

/// Environment values form the base; any value present in YAML replaces them
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let mut config = load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
    }

    if let Some(data_dir) = yaml.storage.and_then(|s| s.data_dir) {
        config.data_dir = PathBuf::from(data_dir);
    }

    if let Some(voices) = yaml.voices {
        if let Some(voice) = voices.default_voice {
            config.default_voice = voice;
        }
        if voices.default_onnx_url.is_some() {
            config.default_voice_onnx_url = voices.default_onnx_url;
        }
        if voices.default_json_url.is_some() {
            config.default_voice_json_url = voices.default_json_url;
        }
    }

    if let Some(engines) = yaml.engines {
        if let Some(bin) = engines.piper_bin {
            config.piper_bin = PathBuf::from(bin);
        }
        if engines.xtts_url.is_some() {
            config.xtts_url = engines.xtts_url;
        }
        if engines.bark_url.is_some() {
            config.bark_url = engines.bark_url;
        }
        if engines.styletts2_url.is_some() {
            config.styletts2_url = engines.styletts2_url;
        }
    }

    if let Some(audio) = yaml.audio {
        if let Some(bin) = audio.ffmpeg_bin {
            config.ffmpeg_bin = PathBuf::from(bin);
        }
        if let Some(bitrate) = audio.mp3_bitrate {
            config.mp3_bitrate = bitrate;
        }
    }

    if let Some(origins) = yaml.security.and_then(|s| s.cors_allowed_origins) {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(config)
}
