//! Ingestion and webhook tests against an in-memory SQLite database

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use bot::services::ingest::{InboundMessage, IngestOutcome, IngestService, IngestSettings};
use bot::state::AppState;
use bot::webhook::{self, SECRET_HEADER};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use shared::repositories::SignalRepository;
use shared::{sync_schema, ChangeFeed, Config, PushGateway};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("sqlite connects");
    sync_schema(&db).await.expect("schema is created");
    Arc::new(db)
}

fn service(db: Arc<DatabaseConnection>) -> IngestService {
    let settings = IngestSettings {
        timezone: chrono_tz::UTC,
        match_window: Duration::hours(2),
        locale: "en".to_string(),
    };
    IngestService::new(db, settings, PushGateway::new(None), ChangeFeed::disabled())
}

fn message(id: i64, text: &str, received_at: DateTime<Utc>) -> InboundMessage {
    InboundMessage {
        message_id: id,
        chat_id: Some(-100200300),
        text: text.to_string(),
        received_at,
    }
}

#[tokio::test]
async fn test_reingesting_a_message_id_is_a_noop() {
    let db = setup_db().await;
    let ingest = service(db.clone());
    let now = Utc::now();

    let first = ingest.ingest(message(10, "EUR/USD M5 CALL", now)).await.unwrap();
    let IngestOutcome::Created(signal) = first else {
        panic!("expected a new signal, got {:?}", first);
    };
    assert_eq!(signal.asset, "EUR/USD");
    assert_eq!(signal.status, "pending");

    let again = ingest.ingest(message(10, "EUR/USD M5 CALL", now)).await.unwrap();
    assert_eq!(again, IngestOutcome::Duplicate);

    let stored = SignalRepository::new(db).list_recent(None, 50).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_entry_time_is_resolved_against_the_message_date() {
    let db = setup_db().await;
    let ingest = service(db);
    let received = Utc.with_ymd_and_hms(2026, 3, 2, 9, 58, 0).unwrap();

    let outcome = ingest
        .ingest(message(11, "GBP/USD M1 PUT\nEntry: 10:00", received))
        .await
        .unwrap();
    let IngestOutcome::Created(signal) = outcome else {
        panic!("expected a new signal, got {:?}", outcome);
    };
    assert_eq!(signal.entry_time, Some(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()));
}

#[tokio::test]
async fn test_result_resolves_the_most_recent_open_signal_once() {
    let db = setup_db().await;
    let ingest = service(db.clone());
    let now = Utc::now();

    ingest.ingest(message(1, "EUR/USD M5 CALL", now - Duration::minutes(20))).await.unwrap();
    ingest.ingest(message(2, "EUR/USD M5 PUT", now - Duration::minutes(5))).await.unwrap();

    let outcome = ingest.ingest(message(3, "✅ WIN", now)).await.unwrap();
    let IngestOutcome::Resolved(resolved) = outcome else {
        panic!("expected a resolution, got {:?}", outcome);
    };
    assert_eq!(resolved.telegram_message_id, 2);
    assert_eq!(resolved.result.as_deref(), Some("win"));

    let outcome = ingest.ingest(message(4, "❌ LOSS", now)).await.unwrap();
    let IngestOutcome::Resolved(resolved) = outcome else {
        panic!("expected a resolution, got {:?}", outcome);
    };
    assert_eq!(resolved.telegram_message_id, 1);
    assert_eq!(resolved.result.as_deref(), Some("loss"));

    // Nothing left open.
    assert_eq!(ingest.ingest(message(5, "✅ WIN", now)).await.unwrap(), IngestOutcome::Unmatched);
}

#[tokio::test]
async fn test_result_outside_the_window_is_unmatched() {
    let db = setup_db().await;
    let ingest = service(db.clone());
    let now = Utc::now();

    ingest.ingest(message(1, "EUR/USD M5 CALL", now - Duration::hours(3))).await.unwrap();
    assert_eq!(ingest.ingest(message(2, "✅ WIN", now)).await.unwrap(), IngestOutcome::Unmatched);

    let stored = SignalRepository::new(db).find_by_telegram_message_id(1).await.unwrap().unwrap();
    assert!(stored.result.is_none());
}

#[tokio::test]
async fn test_result_with_asset_hint_skips_other_assets() {
    let db = setup_db().await;
    let ingest = service(db);
    let now = Utc::now();

    ingest.ingest(message(1, "EUR/USD M5 CALL", now - Duration::minutes(10))).await.unwrap();
    ingest.ingest(message(2, "GBP/JPY M5 CALL", now - Duration::minutes(1))).await.unwrap();

    let outcome = ingest.ingest(message(3, "EURUSD WIN¹", now)).await.unwrap();
    let IngestOutcome::Resolved(resolved) = outcome else {
        panic!("expected a resolution, got {:?}", outcome);
    };
    assert_eq!(resolved.telegram_message_id, 1);
    assert_eq!(resolved.result.as_deref(), Some("win1"));

    assert_eq!(ingest.ingest(message(4, "AUD/CAD LOSS", now)).await.unwrap(), IngestOutcome::Unmatched);
}

#[tokio::test]
async fn test_chatter_is_ignored() {
    let db = setup_db().await;
    let ingest = service(db);
    let outcome = ingest.ingest(message(1, "Good morning traders!", Utc::now())).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Ignored);
}

async fn webhook_state(secret: Option<&str>) -> Arc<AppState> {
    let mut config = Config::from_env().unwrap();
    config.webhook_secret = secret.map(str::to_string);
    config.default_locale = "en".to_string();
    let db = setup_db().await;
    Arc::new(AppState::build(&config, db, PushGateway::new(None), ChangeFeed::disabled()))
}

fn webhook_request(body: Value, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/telegram/webhook")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SECRET_HEADER, secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_webhook_stores_channel_posts_and_acks() {
    let state = webhook_state(None).await;
    let app = webhook::router(state.clone());

    let update = json!({
        "update_id": 1,
        "channel_post": { "message_id": 900, "chat": { "id": -1001 }, "text": "EUR/USD M5 CALL" }
    });
    let response = app.clone().oneshot(webhook_request(update.clone(), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "ok": true }));

    // Telegram redelivery
    let response = app.oneshot(webhook_request(update, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = state.signals.list_recent(None, 50).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].chat_id, Some(-1001));
}

#[tokio::test]
async fn test_webhook_acks_malformed_and_textless_updates() {
    let state = webhook_state(None).await;
    let app = webhook::router(state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/telegram/webhook")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let update = json!({ "update_id": 2, "message": { "message_id": 5, "chat": { "id": 1 } } });
    let response = app.oneshot(webhook_request(update, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.signals.list_recent(None, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_checks_the_secret_token() {
    let state = webhook_state(Some("s3cret")).await;
    let app = webhook::router(state);
    let update = json!({ "message": { "message_id": 1, "text": "EUR/USD M5 CALL" } });

    let response = app.clone().oneshot(webhook_request(update.clone(), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(webhook_request(update.clone(), Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(webhook_request(update, Some("s3cret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = webhook::router(webhook_state(None).await);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}
