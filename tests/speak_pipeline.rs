//! End-to-end tests for `POST /speak`
//!
//! Local requests run the whole pipeline against fake synthesis backends.
//! Remote engines are served by a wiremock server.

mod fixtures;

use axum::http::StatusCode;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fixtures::{FAKE_WAV, body_bytes, body_json, build_app, install_voice, json_request, send, test_config};

#[tokio::test]
async fn test_local_speak_returns_wav() {
    let dir = tempdir().unwrap();
    install_voice(dir.path(), "es_ES");
    let (app, synthesizer) = build_app(test_config(dir.path()));

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "engine": "piper", "text": "Hola", "fmt": "wav" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/wav");
    assert_eq!(&body_bytes(response).await[..], FAKE_WAV);

    let calls = synthesizer.calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.starts_with("Hola"));
    assert_eq!(calls[0].1, "es_ES");
}

#[tokio::test]
async fn test_local_speak_defaults_to_mp3() {
    let dir = tempdir().unwrap();
    install_voice(dir.path(), "es_ES");
    let (app, _) = build_app(test_config(dir.path()));

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "text": "Hola", "postprocess": true })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/mpeg");
    assert_eq!(&body_bytes(response).await[..], b"RIFF-fake-wav+fx+mp3");
}

#[tokio::test]
async fn test_local_speak_applies_pronunciations_and_stored_preset() {
    let dir = tempdir().unwrap();
    install_voice(dir.path(), "es_ES");
    let (app, synthesizer) = build_app(test_config(dir.path()));

    let saved = send(
        &app,
        json_request("POST", "/prefs/preset?user_id=ana&preset=calm", json!({})),
    )
    .await;
    assert_eq!(saved.status(), StatusCode::OK);

    let response = send(
        &app,
        json_request(
            "POST",
            "/speak",
            json!({ "text": "Usa la API", "fmt": "wav", "user_id": "ana" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = synthesizer.calls.lock();
    assert_eq!(calls[0].0, "Usa la a pe i.");
    // calm preset; jitter never touches the length scale
    assert!((calls[0].2.length_scale - 1.12).abs() < 1e-5);
}

#[tokio::test]
async fn test_local_speak_unknown_voice_is_bad_request() {
    let dir = tempdir().unwrap();
    let (app, synthesizer) = build_app(test_config(dir.path()));

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "text": "Hola", "voice": "it_IT" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["kind"], "asset_not_found");
    assert!(synthesizer.calls.lock().is_empty());
}

#[tokio::test]
async fn test_invalid_preset_is_rejected_before_synthesis() {
    let dir = tempdir().unwrap();
    install_voice(dir.path(), "es_ES");
    let (app, synthesizer) = build_app(test_config(dir.path()));

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "text": "Hola", "preset": "shouty" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["kind"], "invalid_preset");
    assert!(synthesizer.calls.lock().is_empty());
}

#[tokio::test]
async fn test_empty_text_and_unknown_engine_are_rejected() {
    let dir = tempdir().unwrap();
    let (app, _) = build_app(test_config(dir.path()));

    let empty = send(&app, json_request("POST", "/speak", json!({ "text": "   " }))).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(empty).await["kind"], "invalid_request");

    let unknown = send(
        &app,
        json_request("POST", "/speak", json!({ "text": "Hola", "engine": "tortoise" })),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(unknown).await["kind"], "invalid_request");
}

#[tokio::test]
async fn test_unconfigured_remote_engine_is_not_implemented() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let (app, _) = build_app(test_config(dir.path()));

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "engine": "xtts", "text": "Hola" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body_json(response).await["kind"], "engine_not_configured");
}

#[tokio::test]
async fn test_remote_engine_audio_is_proxied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"ID3-remote".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.xtts_url = Some(format!("{}/generate", server.uri()));
    let (app, synthesizer) = build_app(config);

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "engine": "xtts", "text": "Hola" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/mpeg");
    assert_eq!(&body_bytes(response).await[..], b"ID3-remote");
    assert!(synthesizer.calls.lock().is_empty());
}

#[tokio::test]
async fn test_remote_engine_error_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("content-type", "text/plain")
                .set_body_string("model loading"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.bark_url = Some(format!("{}/generate", server.uri()));
    let (app, _) = build_app(config);

    let response = send(
        &app,
        json_request("POST", "/speak", json!({ "engine": "bark", "text": "Hola" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(&body_bytes(response).await[..], b"model loading");
}
