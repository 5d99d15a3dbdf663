//! Request pipeline error taxonomy and its HTTP mapping.
//!
//! Every stage of a speak request fails with exactly one of these variants.
//! The underlying detail is kept in the message so callers can see
//! what the engine, the download host or the filesystem reported.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::json;
use thiserror::Error;

/// Result type for request pipeline operations
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// No model/config file exists locally and no usable URL was supplied
    #[error("Voice asset not found: {0}")]
    AssetNotFound(String),

    /// Transfer returned a non-success status or an I/O error occurred
    #[error("Failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Local synthesis engine failed
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Filter chain could not be applied
    #[error("Post-processing failed: {0}")]
    PostProcessFailed(String),

    /// Output could not be transcoded to the requested format
    #[error("Transcoding failed: {0}")]
    TranscodeFailed(String),

    /// The requested remote engine has no endpoint configured
    #[error("Engine '{0}' is not configured")]
    EngineNotConfigured(String),

    /// Remote engine answered with a non-success status
    #[error("Remote engine '{engine}' returned {status}: {}", String::from_utf8_lossy(.body))]
    RemoteEngineError {
        engine: String,
        status: u16,
        body: Bytes,
        content_type: Option<String>,
    },

    /// Remote engine could not be reached at all
    #[error("Remote engine '{engine}' is unreachable: {reason}")]
    RemoteEngineUnreachable { engine: String, reason: String },

    /// Preset name is not part of the registry
    #[error("Unknown preset: {0}")]
    InvalidPreset(String),

    /// Markup that the normalizer refuses to interpret
    #[error("Invalid markup: {0}")]
    InvalidMarkup(String),

    /// Malformed request payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Config store document could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Stable machine-readable identifier for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetNotFound(_) => "asset_not_found",
            Self::DownloadFailed { .. } => "download_failed",
            Self::SynthesisFailed(_) => "synthesis_failed",
            Self::PostProcessFailed(_) => "post_process_failed",
            Self::TranscodeFailed(_) => "transcode_failed",
            Self::EngineNotConfigured(_) => "engine_not_configured",
            Self::RemoteEngineError { .. } => "remote_engine_error",
            Self::RemoteEngineUnreachable { .. } => "remote_engine_unreachable",
            Self::InvalidPreset(_) => "invalid_preset",
            Self::InvalidMarkup(_) => "invalid_markup",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Storage(_) => "storage_error",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AssetNotFound(_)
            | Self::DownloadFailed { .. }
            | Self::InvalidPreset(_)
            | Self::InvalidMarkup(_)
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EngineNotConfigured(_) => StatusCode::NOT_IMPLEMENTED,
            Self::RemoteEngineError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::RemoteEngineUnreachable { .. } => StatusCode::BAD_GATEWAY,
            Self::SynthesisFailed(_)
            | Self::PostProcessFailed(_)
            | Self::TranscodeFailed(_)
            | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller caused the failure
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            // Remote failures pass through untouched
            AppError::RemoteEngineError {
                body, content_type, ..
            } => {
                let mut response = (status, body).into_response();
                if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                response
            }
            other => {
                let body = json!({
                    "error": other.to_string(),
                    "kind": other.kind(),
                });
                (status, Json(body)).into_response()
            }
        }
    }
}
