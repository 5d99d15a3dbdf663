//! Initialization helpers for preparing runtime assets before starting the
//! voxgate server.
//!
//! This module hosts the logic that powers the `voxgate init` CLI command. The
//! command downloads the default voice model and its config into the asset
//! root so that the first speak request does not have to fetch them.
//!
//! Typical usage from the CLI:
//!
//! ```text
//! $ DATA_DIR=/data DEFAULT_VOICE_ONNX_URL=... DEFAULT_VOICE_JSON_URL=... voxgate init
//! ```
//!
//! If you prefer to invoke the initialization routine programmatically, call
//! [`run`] inside an async context:
//!
//! ```rust,no_run
//! use voxgate::{ServerConfig, init};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let config = ServerConfig::from_env().unwrap();
//!     init::run(&config).await.expect("failed to download assets");
//! });
//! ```

use anyhow::{Context, Result};
use tracing::info;

use crate::config::ServerConfig;
use crate::core::voices::VoiceAssetResolver;

/// Download and prepare the default voice.
pub async fn run(config: &ServerConfig) -> Result<()> {
    let models_dir = config.models_dir();
    info!(
        voice = %config.default_voice,
        models_dir = %models_dir.display(),
        "Preparing default voice"
    );

    let resolver = VoiceAssetResolver::new(&models_dir, reqwest::Client::new());
    let voice = resolver
        .resolve(
            &config.default_voice,
            config.default_voice_onnx_url.as_deref(),
            config.default_voice_json_url.as_deref(),
        )
        .await
        .with_context(|| {
            format!(
                "Could not prepare voice '{}'. Set DEFAULT_VOICE_ONNX_URL and \
                 DEFAULT_VOICE_JSON_URL or place the files under {}",
                config.default_voice,
                models_dir.display()
            )
        })?;

    info!(
        model = %voice.model_path.display(),
        config = %voice.config_path.display(),
        "Default voice ready"
    );

    Ok(())
}
