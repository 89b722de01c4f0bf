use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use tomato_timer::{
    create_router,
    services::{SilentAudio, TokioTimers},
    AppState,
};

fn app(minutes: i64) -> (Arc<AppState>, Router) {
    let state = AppState::new(
        20554,
        "127.0.0.1".to_string(),
        minutes,
        Arc::new(TokioTimers::new()),
        Arc::new(SilentAudio),
    );
    let router = create_router(Arc::clone(&state));
    (state, router)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn status(router: &Router) -> Value {
    let (code, body) = send(router, "GET", "/status", None).await;
    assert_eq!(code, StatusCode::OK);
    body
}

#[tokio::test]
async fn health_reports_ok() {
    let (_state, router) = app(25);

    let (code, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn status_shows_initial_clock() {
    let (_state, router) = app(25);

    let body = status(&router).await;
    assert_eq!(body["timer"]["display"], "25:00");
    assert_eq!(body["timer"]["phase"], "idle");
    assert_eq!(body["timer"]["toggle_label"], "Start");
    assert_eq!(body["timer"]["toggle_enabled"], true);
    assert_eq!(body["port"], 20554);
    assert_eq!(body["last_action"], Value::Null);
}

#[tokio::test]
async fn set_clamps_instead_of_rejecting() {
    let (_state, router) = app(25);

    let (code, body) = send(&router, "POST", "/set", Some(json!({ "minutes": 100 }))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["timer"]["display"], "30:00");
    assert_eq!(body["status"], "idle");

    let (code, body) = send(&router, "POST", "/set", Some(json!({ "minutes": -3 }))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["timer"]["configured_minutes"], 1);
    assert_eq!(body["timer"]["display"], "01:00");

    assert_eq!(status(&router).await["last_action"], "set");
}

#[tokio::test]
async fn set_rejects_non_numeric_body() {
    let (_state, router) = app(25);

    let (code, _) = send(&router, "POST", "/set", Some(json!({ "minutes": "ten" }))).await;
    assert!(code.is_client_error());
}

#[tokio::test(start_paused = true)]
async fn countdown_rings_and_reset_silences() {
    let (state, router) = app(25);

    send(&router, "POST", "/set", Some(json!({ "minutes": 1 }))).await;
    let (_, body) = send(&router, "POST", "/toggle", None).await;
    assert_eq!(body["timer"]["toggle_label"], "Pause");

    tokio::time::sleep(Duration::from_millis(60_500)).await;
    let body = status(&router).await;
    assert_eq!(body["timer"]["display"], "00:00");
    assert_eq!(body["timer"]["phase"], "running");
    assert!(!state.is_alert_active().unwrap());

    tokio::time::sleep(Duration::from_secs(1)).await;
    let body = status(&router).await;
    assert_eq!(body["timer"]["display"], "00:00");
    assert_eq!(body["timer"]["phase"], "ringing");
    assert_eq!(body["timer"]["toggle_enabled"], false);
    assert_eq!(body["timer"]["reset_highlighted"], true);
    assert!(state.is_alert_active().unwrap());

    let (_, body) = send(&router, "POST", "/toggle", None).await;
    assert_eq!(body["timer"]["phase"], "ringing");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(status(&router).await["timer"]["phase"], "ringing");

    let (_, body) = send(&router, "POST", "/reset", None).await;
    assert_eq!(body["timer"]["display"], "01:00");
    assert_eq!(body["timer"]["phase"], "idle");
    assert!(!state.is_alert_active().unwrap());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(status(&router).await["timer"]["display"], "01:00");
}

#[tokio::test(start_paused = true)]
async fn pause_preserves_remaining_time() {
    let (_state, router) = app(2);

    send(&router, "POST", "/toggle", None).await;
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let (_, body) = send(&router, "POST", "/toggle", None).await;
    assert_eq!(body["timer"]["display"], "01:57");
    assert_eq!(body["timer"]["toggle_label"], "Start");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(status(&router).await["timer"]["display"], "01:57");

    send(&router, "POST", "/toggle", None).await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(status(&router).await["timer"]["display"], "01:56");
}
