use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, prefs, pronunciations, speak, voices};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/healthz", get(api::healthz))
        .route("/voices", get(voices::list_voices))
        .route("/presets", get(voices::list_presets))
        .route("/engines", get(voices::list_engines))
        .route("/speak", post(speak::speak_handler))
        .route(
            "/prefs/preset",
            get(prefs::get_preset).post(prefs::set_preset),
        )
        .route(
            "/pronunciations",
            get(pronunciations::get_pronunciations).put(pronunciations::put_pronunciations),
        )
        .route(
            "/pronunciations/{word}",
            delete(pronunciations::delete_pronunciation),
        )
        .layer(TraceLayer::new_for_http())
}
