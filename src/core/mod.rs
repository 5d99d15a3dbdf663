pub mod audio;
pub mod markup;
pub mod params;
pub mod store;
pub mod tts;
pub mod voices;

// Re-export commonly used types for convenience
pub use audio::{AudioFilter, AudioPostProcessor, FfmpegPostProcessor, FilterChain};
pub use markup::{MarkupAdjustment, NormalizedText, PronunciationReplacer, normalize};
pub use params::{
    JitterSource, ParameterResolver, Preset, RandomJitter, ScalarOverrides, SynthesisParameters,
};
pub use store::ConfigStore;
pub use tts::{
    AudioFormat, Engine, EngineRegistry, EngineRouter, PiperSynthesizer, SpeakRequest,
    SynthesizedAudio, Synthesizer,
};
pub use voices::{InstalledVoice, ResolvedVoice, VoiceAssetResolver, sanitize_voice_key};
