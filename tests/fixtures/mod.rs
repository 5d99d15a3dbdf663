//! Shared helpers for the integration tests
//!
//! Synthesis and post-processing are replaced by in-process fakes so the
//! tests run without piper or ffmpeg installed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use bytes::Bytes;
use parking_lot::Mutex;
use tower::util::ServiceExt;

use voxgate::core::audio::{AudioPostProcessor, FilterChain};
use voxgate::core::params::SynthesisParameters;
use voxgate::core::tts::{AudioFormat, Synthesizer};
use voxgate::core::voices::ResolvedVoice;
use voxgate::{AppResult, ServerConfig, routes, state::AppState};

pub const FAKE_WAV: &[u8] = b"RIFF-fake-wav";

/// Minimal configuration rooted at `data_dir`
pub fn test_config(data_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 3001,
        data_dir: data_dir.to_path_buf(),
        default_voice: "es_ES".to_string(),
        default_voice_onnx_url: None,
        default_voice_json_url: None,
        piper_bin: PathBuf::from("piper"),
        ffmpeg_bin: PathBuf::from("ffmpeg"),
        mp3_bitrate: "192k".to_string(),
        xtts_url: None,
        bark_url: None,
        styletts2_url: None,
        cors_allowed_origins: None,
    }
}

/// Place a model and its config under `models/<key>/`
pub fn install_voice(data_dir: &Path, key: &str) {
    let dir = data_dir.join("models").join(key);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{key}.onnx")), b"model").unwrap();
    std::fs::write(dir.join(format!("{key}.onnx.json")), b"{}").unwrap();
}

/// Records each synthesis call and returns a fixed payload
#[derive(Default)]
pub struct FakeSynthesizer {
    pub calls: Mutex<Vec<(String, String, SynthesisParameters)>>,
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &ResolvedVoice,
        params: &SynthesisParameters,
    ) -> AppResult<Bytes> {
        self.calls
            .lock()
            .push((text.to_string(), voice.key.clone(), *params));
        Ok(Bytes::from_static(FAKE_WAV))
    }
}

/// Appends a marker per stage instead of running ffmpeg
pub struct FakePostProcessor;

#[async_trait]
impl AudioPostProcessor for FakePostProcessor {
    async fn apply(&self, _chain: &FilterChain, input: Bytes) -> AppResult<Bytes> {
        Ok(Bytes::from([&input[..], b"+fx".as_slice()].concat()))
    }

    async fn transcode(&self, input: Bytes, format: AudioFormat, _bitrate: &str) -> AppResult<Bytes> {
        if format == AudioFormat::Wav {
            return Ok(input);
        }
        Ok(Bytes::from([&input[..], b"+mp3".as_slice()].concat()))
    }
}

/// Router over a state built with the fakes
pub fn build_app(config: ServerConfig) -> (Router, Arc<FakeSynthesizer>) {
    let synthesizer = Arc::new(FakeSynthesizer::default());
    let state = AppState::with_collaborators(
        config,
        synthesizer.clone(),
        Arc::new(FakePostProcessor),
    )
    .unwrap();
    (routes::api::create_api_router().with_state(state), synthesizer)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
