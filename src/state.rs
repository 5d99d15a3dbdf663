//! Shared application state

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, ServerConfig};
use crate::core::audio::{AudioPostProcessor, FfmpegPostProcessor};
use crate::core::store::ConfigStore;
use crate::core::tts::{EngineRouter, PiperSynthesizer, Synthesizer};
use crate::core::voices::VoiceAssetResolver;

/// Stores and the router, built once at startup and shared by every handler
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<ConfigStore>,
    pub voices: Arc<VoiceAssetResolver>,
    pub router: EngineRouter,
}

impl AppState {
    /// Production state: piper for synthesis, ffmpeg for post-processing
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, ConfigError> {
        let synthesizer = Arc::new(PiperSynthesizer::new(
            config.piper_bin.clone(),
            config.audio_dir(),
        ));
        let post_processor = Arc::new(FfmpegPostProcessor::new(
            config.ffmpeg_bin.clone(),
            config.audio_dir(),
        ));
        Self::with_collaborators(config, synthesizer, post_processor)
    }

    /// State with caller-supplied synthesis and post-processing backends
    pub fn with_collaborators(
        config: ServerConfig,
        synthesizer: Arc<dyn Synthesizer>,
        post_processor: Arc<dyn AudioPostProcessor>,
    ) -> Result<Arc<Self>, ConfigError> {
        let registry = config.engine_registry()?;
        let client = reqwest::Client::new();

        let store = Arc::new(ConfigStore::new(config.config_dir()));
        let voices = Arc::new(VoiceAssetResolver::new(config.models_dir(), client.clone()));

        let router = EngineRouter::new(
            registry,
            store.clone(),
            voices.clone(),
            synthesizer,
            post_processor,
        )
        .with_http_client(client)
        .with_voice_defaults(config.voice_defaults())
        .with_mp3_bitrate(config.mp3_bitrate.clone());

        info!(
            data_dir = %config.data_dir.display(),
            default_voice = %config.default_voice,
            engines = ?router.registry().available(),
            "Application state ready"
        );

        Ok(Arc::new(Self {
            config,
            store,
            voices,
            router,
        }))
    }
}
