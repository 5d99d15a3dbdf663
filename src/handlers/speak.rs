use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::tts::{SpeakRequest, SynthesizedAudio};
use crate::errors::AppResult;
use crate::state::AppState;

/// Synthesize `request` and return the raw audio bytes
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeakRequest>,
) -> AppResult<SynthesizedAudio> {
    info!(
        engine = request.engine.as_deref().unwrap_or("piper"),
        voice = request.voice.as_deref().unwrap_or_default(),
        fmt = request.fmt.as_deref().unwrap_or("mp3"),
        chars = request.text.chars().count(),
        "Speak request"
    );

    state.router.route(&request).await.inspect_err(|e| {
        if e.is_client_error() {
            warn!(kind = e.kind(), error = %e, "Speak request rejected");
        } else {
            error!(kind = e.kind(), error = %e, "Speak request failed");
        }
    })
}
