//! Speak request and response types.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::engine::Engine;
use crate::core::params::ScalarOverrides;
use crate::errors::{AppError, AppResult};

// =============================================================================
// Audio format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    #[default]
    Mp3,
}

impl AudioFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "wav" | "wave" => Some(Self::Wav),
            "mp3" | "mpeg" => Some(Self::Mp3),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Request
// =============================================================================

/// Body of a speak request.
///
/// Local-pipeline fields (`voice`, asset URLs, presets, scalar overrides,
/// `postprocess`) are ignored by remote engines; `x_voice`, `style`, `lang`,
/// `speed`, `temperature` and `ref_wav_path` are only forwarded to them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub fmt: Option<String>,

    // Local pipeline
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub onnx_url: Option<String>,
    #[serde(default)]
    pub json_url: Option<String>,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub length_scale: Option<f32>,
    #[serde(default)]
    pub noise_scale: Option<f32>,
    #[serde(default)]
    pub sentence_silence: Option<f32>,
    #[serde(default)]
    pub postprocess: bool,

    // Remote engines
    #[serde(default)]
    pub x_voice: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub ref_wav_path: Option<String>,
}

impl SpeakRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn engine(&self) -> AppResult<Engine> {
        Engine::from_request(self.engine.as_deref())
    }

    /// Requested output format; absent means mp3
    pub fn format(&self) -> AppResult<AudioFormat> {
        match self.fmt.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            None => Ok(AudioFormat::default()),
            Some(name) => AudioFormat::from_name(name).ok_or_else(|| {
                AppError::InvalidRequest(format!("Unsupported format: {name} (expected wav or mp3)"))
            }),
        }
    }

    pub fn overrides(&self) -> ScalarOverrides {
        ScalarOverrides {
            length_scale: self.length_scale,
            noise_scale: self.noise_scale,
            sentence_silence: self.sentence_silence,
        }
    }

    /// Trimmed user id, if one was supplied
    pub fn user(&self) -> Option<&str> {
        self.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    pub content_type: String,
}

impl IntoResponse for SynthesizedAudio {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            self.bytes,
        )
            .into_response()
    }
}
