//! Proxy path for the expressive HTTP engines.

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use super::engine::Engine;
use super::request::{AudioFormat, SpeakRequest, SynthesizedAudio};
use crate::errors::{AppError, AppResult};

pub const DEFAULT_REMOTE_LANG: &str = "es";
pub const DEFAULT_REMOTE_SPEED: f32 = 1.0;
pub const DEFAULT_REMOTE_TEMPERATURE: f32 = 0.8;

/// Fields forwarded to a remote engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemotePayload<'a> {
    pub text: &'a str,
    pub voice: Option<&'a str>,
    pub lang: &'a str,
    pub style: Option<&'a str>,
    pub fmt: AudioFormat,
    pub speed: f32,
    pub temperature: f32,
    pub ref_wav_path: Option<&'a str>,
}

impl<'a> RemotePayload<'a> {
    /// Normalize a speak request for a remote engine. `x_voice` wins over
    /// `voice`, blank strings count as absent.
    pub fn from_request(request: &'a SpeakRequest, fmt: AudioFormat) -> Self {
        Self {
            text: &request.text,
            voice: non_blank(&request.x_voice).or_else(|| non_blank(&request.voice)),
            lang: non_blank(&request.lang).unwrap_or(DEFAULT_REMOTE_LANG),
            style: non_blank(&request.style),
            fmt,
            speed: request.speed.unwrap_or(DEFAULT_REMOTE_SPEED),
            temperature: request.temperature.unwrap_or(DEFAULT_REMOTE_TEMPERATURE),
            ref_wav_path: non_blank(&request.ref_wav_path),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One POST per request, no retries
#[derive(Clone)]
pub struct RemoteEngineClient {
    client: reqwest::Client,
}

impl RemoteEngineClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn synthesize(
        &self,
        engine: Engine,
        endpoint: &Url,
        request: &SpeakRequest,
        fmt: AudioFormat,
    ) -> AppResult<SynthesizedAudio> {
        let payload = RemotePayload::from_request(request, fmt);
        info!(engine = %engine, endpoint = %endpoint, fmt = %fmt, "Proxying speak request");

        let response = self
            .client
            .post(endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::RemoteEngineUnreachable {
                engine: engine.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::RemoteEngineUnreachable {
                engine: engine.to_string(),
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            warn!(engine = %engine, status = status.as_u16(), "Remote engine returned an error");
            return Err(AppError::RemoteEngineError {
                engine: engine.to_string(),
                status: status.as_u16(),
                body,
                content_type,
            });
        }

        Ok(SynthesizedAudio {
            bytes: body,
            content_type: content_type.unwrap_or_else(|| fmt.mime_type().to_string()),
        })
    }
}
