use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PresetQuery {
    pub user_id: Option<String>,
    pub preset: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PresetPreference {
    pub user_id: String,
    pub preset: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> AppResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidRequest(format!("query parameter '{name}' is required")))
}

/// Stored preset of `user_id`, `null` when none is saved
pub async fn get_preset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PresetQuery>,
) -> AppResult<Json<PresetPreference>> {
    let user_id = required(&query.user_id, "user_id")?;
    let preset = state.store.user_preset(user_id).await?;

    Ok(Json(PresetPreference {
        user_id: user_id.to_string(),
        preset,
    }))
}

/// Save `preset` for `user_id`
pub async fn set_preset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PresetQuery>,
) -> AppResult<Json<PresetPreference>> {
    let user_id = required(&query.user_id, "user_id")?;
    let preset = required(&query.preset, "preset")?;

    let saved = state.store.set_user_preset(user_id, preset).await?;
    info!(user_id = %user_id, preset = %saved, "Preset preference updated");

    Ok(Json(PresetPreference {
        user_id: user_id.to_string(),
        preset: Some(saved),
    }))
}
