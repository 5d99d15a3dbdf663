//! Engine routing: local pipeline or remote proxy.

use std::sync::Arc;

use tracing::{debug, info};

use super::engine::{Engine, EngineRegistry, EngineTarget};
use super::piper::Synthesizer;
use super::remote::RemoteEngineClient;
use super::request::{AudioFormat, SpeakRequest, SynthesizedAudio};
use crate::core::audio::{AudioPostProcessor, DEFAULT_MP3_BITRATE, FilterChain};
use crate::core::markup;
use crate::core::params::{JitterSource, ParameterResolver, RandomJitter};
use crate::core::store::ConfigStore;
use crate::core::voices::VoiceAssetResolver;
use crate::errors::{AppError, AppResult};

/// Builds the jitter source for one request
pub type JitterFactory = Arc<dyn Fn() -> Box<dyn JitterSource> + Send + Sync>;

/// Voice used when a request names none, with optional download sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDefaults {
    pub voice: String,
    pub onnx_url: Option<String>,
    pub json_url: Option<String>,
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            voice: "es_ES".to_string(),
            onnx_url: None,
            json_url: None,
        }
    }
}

pub struct EngineRouter {
    registry: EngineRegistry,
    remote: RemoteEngineClient,
    store: Arc<ConfigStore>,
    voices: Arc<VoiceAssetResolver>,
    synthesizer: Arc<dyn Synthesizer>,
    post_processor: Arc<dyn AudioPostProcessor>,
    parameters: ParameterResolver,
    voice_defaults: VoiceDefaults,
    filter_chain: FilterChain,
    mp3_bitrate: String,
    jitter: JitterFactory,
}

impl EngineRouter {
    pub fn new(
        registry: EngineRegistry,
        store: Arc<ConfigStore>,
        voices: Arc<VoiceAssetResolver>,
        synthesizer: Arc<dyn Synthesizer>,
        post_processor: Arc<dyn AudioPostProcessor>,
    ) -> Self {
        Self {
            registry,
            remote: RemoteEngineClient::new(reqwest::Client::new()),
            store,
            voices,
            synthesizer,
            post_processor,
            parameters: ParameterResolver::default(),
            voice_defaults: VoiceDefaults::default(),
            filter_chain: FilterChain::default(),
            mp3_bitrate: DEFAULT_MP3_BITRATE.to_string(),
            jitter: Arc::new(|| Box::new(RandomJitter::new())),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.remote = RemoteEngineClient::new(client);
        self
    }

    pub fn with_voice_defaults(mut self, defaults: VoiceDefaults) -> Self {
        self.voice_defaults = defaults;
        self
    }

    pub fn with_mp3_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.mp3_bitrate = bitrate.into();
        self
    }

    pub fn with_filter_chain(mut self, chain: FilterChain) -> Self {
        self.filter_chain = chain;
        self
    }

    pub fn with_jitter(mut self, factory: JitterFactory) -> Self {
        self.jitter = factory;
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn voice_defaults(&self) -> &VoiceDefaults {
        &self.voice_defaults
    }

    /// Dispatch a speak request to its engine
    pub async fn route(&self, request: &SpeakRequest) -> AppResult<SynthesizedAudio> {
        let engine = request.engine()?;
        let format = request.format()?;
        if request.text.trim().is_empty() {
            return Err(AppError::InvalidRequest("text must not be empty".to_string()));
        }

        match self.registry.target(engine)? {
            EngineTarget::Remote(endpoint) => {
                self.remote
                    .synthesize(engine, &endpoint, request, format)
                    .await
            }
            EngineTarget::Local => self.synthesize_local(engine, request, format).await,
        }
    }

    /// Markup, parameters, assets, synthesis, then optional filtering and
    /// transcoding. The first failing stage aborts the request.
    async fn synthesize_local(
        &self,
        engine: Engine,
        request: &SpeakRequest,
        format: AudioFormat,
    ) -> AppResult<SynthesizedAudio> {
        let replacer = self.store.pronunciation_replacer().await?;
        let normalized = markup::normalize(&request.text, Some(&replacer))?;
        if normalized.text.is_empty() {
            return Err(AppError::InvalidRequest(
                "text is empty once markup is removed".to_string(),
            ));
        }
        debug!(text = %normalized.text, adjustment = ?normalized.adjustment, "Normalized text");

        let stored_preset = match request.user() {
            Some(user_id) => self.store.user_preset(user_id).await?,
            None => None,
        };
        let params = {
            let mut jitter = (self.jitter)();
            self.parameters.resolve(
                &request.overrides(),
                request.preset.as_deref(),
                stored_preset.as_deref(),
                &normalized.adjustment,
                jitter.as_mut(),
            )?
        };

        let (voice_key, onnx_url, json_url) = self.voice_source(request);
        let voice = self.voices.resolve(voice_key, onnx_url, json_url).await?;

        let mut audio = self
            .synthesizer
            .synthesize(&normalized.text, &voice, &params)
            .await?;

        if request.postprocess {
            audio = self.post_processor.apply(&self.filter_chain, audio).await?;
        }
        if format != AudioFormat::Wav {
            audio = self
                .post_processor
                .transcode(audio, format, &self.mp3_bitrate)
                .await?;
        }

        info!(
            engine = %engine,
            voice = %voice.key,
            fmt = %format,
            bytes = audio.len(),
            postprocess = request.postprocess,
            "Local synthesis complete"
        );

        Ok(SynthesizedAudio {
            bytes: audio,
            content_type: format.mime_type().to_string(),
        })
    }

    /// Voice key and download URLs for a request. The configured default
    /// URLs only apply to the default voice.
    fn voice_source<'a>(
        &'a self,
        request: &'a SpeakRequest,
    ) -> (&'a str, Option<&'a str>, Option<&'a str>) {
        let requested = request
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let key = requested.unwrap_or(&self.voice_defaults.voice);
        let is_default = key == self.voice_defaults.voice;

        let pick = |explicit: &'a Option<String>, default: &'a Option<String>| {
            explicit
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .or_else(|| if is_default { default.as_deref() } else { None })
        };

        (
            key,
            pick(&request.onnx_url, &self.voice_defaults.onnx_url),
            pick(&request.json_url, &self.voice_defaults.json_url),
        )
    }
}
