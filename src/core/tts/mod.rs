//! Text-to-speech engines and request routing.
//!
//! # Engines
//!
//! - `piper` - local pipeline (markup, parameters, voice assets, piper binary)
//! - `xtts`, `bark`, `styletts2` - remote HTTP services, proxied when an
//!   endpoint is configured
//!
//! # Example
//!
//! ```rust,ignore
//! use voxgate::core::tts::{EngineRouter, SpeakRequest};
//!
//! let audio = router.route(&SpeakRequest::new("Hola")).await?;
//! ```

mod engine;
mod piper;
mod remote;
mod request;
mod router;

pub use engine::{Engine, EngineRegistry, EngineTarget};
pub use piper::{PiperSynthesizer, Synthesizer};
pub use remote::{
    DEFAULT_REMOTE_LANG, DEFAULT_REMOTE_SPEED, DEFAULT_REMOTE_TEMPERATURE, RemoteEngineClient,
    RemotePayload,
};
pub use request::{AudioFormat, SpeakRequest, SynthesizedAudio};
pub use router::{EngineRouter, JitterFactory, VoiceDefaults};
