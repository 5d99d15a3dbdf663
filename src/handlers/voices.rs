use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::core::params::PRESETS;
use crate::core::tts::Engine;
use crate::core::voices::InstalledVoice;
use crate::errors::AppResult;
use crate::state::AppState;

/// Voices with both a model and a config on disk
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<InstalledVoice>>> {
    Ok(Json(state.voices.list_installed().await?))
}

/// The preset registry
pub async fn list_presets() -> impl IntoResponse {
    Json(PRESETS)
}

#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub engine: Engine,
    pub local: bool,
    pub configured: bool,
}

/// Every engine and whether it can serve requests
pub async fn list_engines(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.router.registry();
    let engines: Vec<EngineStatus> = Engine::ALL
        .into_iter()
        .map(|engine| EngineStatus {
            engine,
            local: engine.is_local(),
            configured: registry.is_available(engine),
        })
        .collect();

    Json(json!({
        "default_voice": state.config.default_voice,
        "engines": engines,
    }))
}
