use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::errors::AppResult;
use crate::state::AppState;

/// The whole dictionary, seeded on first access
pub async fn get_pronunciations(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    Ok(Json(state.store.pronunciations().await?))
}

/// Insert or replace entries; returns the updated dictionary
pub async fn put_pronunciations(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<BTreeMap<String, String>>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    let count = entries.len();
    let dictionary = state.store.upsert_pronunciations(entries).await?;
    info!(updated = count, total = dictionary.len(), "Pronunciation dictionary updated");
    Ok(Json(dictionary))
}

pub async fn delete_pronunciation(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
) -> AppResult<Response> {
    if state.store.remove_pronunciation(&word).await? {
        info!(word = %word, "Pronunciation removed");
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No pronunciation for '{word}'") })),
        )
            .into_response())
    }
}
