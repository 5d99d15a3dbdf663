//! Configuration validation logic

use super::{ConfigError, ServerConfig};
use crate::core::tts::Engine;
use crate::utils::url_validation::{validate_asset_url, validate_endpoint_url};

pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::InvalidValue {
            key: "PORT".to_string(),
            value: "0".to_string(),
            reason: "port must be non-zero".to_string(),
        });
    }

    if config.default_voice.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "DEFAULT_VOICE".to_string(),
            value: config.default_voice.clone(),
            reason: "default voice must not be empty".to_string(),
        });
    }

    for engine in Engine::ALL {
        let (Some(key), Some(url)) = (engine.endpoint_env_var(), config.engine_endpoint(engine))
        else {
            continue;
        };
        validate_endpoint_url(url).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: url.to_string(),
            reason: e.to_string(),
        })?;
    }

    for (key, url) in [
        ("DEFAULT_VOICE_ONNX_URL", &config.default_voice_onnx_url),
        ("DEFAULT_VOICE_JSON_URL", &config.default_voice_json_url),
    ] {
        if let Some(url) = url {
            validate_asset_url(url).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: url.clone(),
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}
