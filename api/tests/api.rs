//! HTTP-level tests for the client data API over in-memory SQLite

use api::routes::realtime::change_stream;
use api::state::AppState;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use shared::repositories::InsertOutcome;
use shared::{sync_schema, ChangeFeed, ChangeKind, Config, Direction, NewSignal, PushGateway};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

const HOOK_SECRET: &str = "tick-secret";

async fn setup() -> (Router, AppState) {
    setup_with_feed(ChangeFeed::disabled()).await
}

async fn setup_with_feed(feed: ChangeFeed) -> (Router, AppState) {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("sqlite connects");
    sync_schema(&db).await.expect("schema is created");

    let mut config = Config::from_env().unwrap();
    config.default_locale = "ar".to_string();
    config.initial_wallet_balance = 1_000.0;
    config.vapid_public_key = Some("BPublicKeyForTests".to_string());
    config.alert_hook_secret = Some(HOOK_SECRET.to_string());

    let state = AppState::new(&config, Arc::new(db), PushGateway::new(None), feed);
    (api::app(state.clone()), state)
}

async fn call(app: &Router, method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    call_with(app, method, uri, user, &[], body).await
}

async fn evaluate(app: &Router, tick: Value) -> (StatusCode, Value) {
    call_with(app, "POST", "/api/alerts/evaluate", None, &[("x-alert-hook-secret", HOOK_SECRET)], Some(tick)).await
}

async fn call_with(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("accept-language", "en-US,en;q=0.9");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn test_requests_without_a_user_are_rejected_in_the_callers_language() {
    let (app, _) = setup().await;
    let (status, body) = call(&app, "GET", "/api/alerts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please sign in again");

    let request = Request::builder()
        .uri("/api/alerts")
        .header("x-user-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    // No Accept-Language: the default locale is Arabic.
    assert_eq!(body["error"], "يرجى تسجيل الدخول مرة أخرى");
}

#[tokio::test]
async fn test_adding_then_removing_an_alert_leaves_the_list_unchanged() {
    let (app, _) = setup().await;
    let user = Uuid::new_v4();

    let (status, _) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(user),
        Some(json!({ "symbol": "EUR/USD", "target_price": 1.1, "condition": "above" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, before) = call(&app, "GET", "/api/alerts", Some(user), None).await;

    let (status, created) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(user),
        Some(json!({ "symbol": "btc/usdt", "target_price": 60000.0, "condition": "below" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["message"], "Price alert created");
    let items = created["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let new_id = items.iter().find(|a| a["symbol"] == "BTC/USDT").unwrap()["id"].as_i64().unwrap();

    let (status, deleted) = call(&app, "DELETE", &format!("/api/alerts/{}", new_id), Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["items"], before);

    let (_, after) = call(&app, "GET", "/api/alerts", Some(user), None).await;
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_alerts_of_other_users_are_invisible() {
    let (app, _) = setup().await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let (_, created) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(owner),
        Some(json!({ "symbol": "EUR/USD", "target_price": 1.1, "condition": "above" })),
    )
    .await;
    let id = created["items"][0]["id"].as_i64().unwrap();

    let (_, list) = call(&app, "GET", "/api/alerts", Some(other), None).await;
    assert_eq!(list, json!([]));
    let (status, body) = call(&app, "DELETE", &format!("/api/alerts/{}", id), Some(other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
    let (status, _) = call(&app, "PATCH", &format!("/api/alerts/{}", id), Some(other), Some(json!({ "is_active": false }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_alert_is_rejected() {
    let (app, _) = setup().await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(Uuid::new_v4()),
        Some(json!({ "symbol": "EUR/USD", "target_price": -1.0, "condition": "above" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Price must be greater than zero");
}

#[tokio::test]
async fn test_price_tick_triggers_matching_alerts_once() {
    let (app, _) = setup().await;
    let user = Uuid::new_v4();
    call(
        &app,
        "POST",
        "/api/alerts",
        Some(user),
        Some(json!({ "symbol": "EUR/USD", "target_price": 1.1, "condition": "above" })),
    )
    .await;

    let (status, body) = evaluate(&app, json!({ "symbol": "EUR/USD", "price": 1.05 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triggered"], json!([]));

    let (_, body) = evaluate(&app, json!({ "symbol": "eur/usd", "price": 1.12 })).await;
    assert_eq!(body["triggered"].as_array().unwrap().len(), 1);
    assert_eq!(body["triggered"][0]["is_active"], false);

    let (_, body) = evaluate(&app, json!({ "symbol": "EUR/USD", "price": 1.2 })).await;
    assert_eq!(body["triggered"], json!([]));
}

#[tokio::test]
async fn test_price_tick_hook_requires_the_shared_secret() {
    let (app, _) = setup().await;
    let user = Uuid::new_v4();
    call(
        &app,
        "POST",
        "/api/alerts",
        Some(user),
        Some(json!({ "symbol": "EUR/USD", "target_price": 1.1, "condition": "above" })),
    )
    .await;
    let tick = json!({ "symbol": "EUR/USD", "price": 1.5 });

    let (status, _) = call(&app, "POST", "/api/alerts/evaluate", Some(user), Some(tick.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = [("x-alert-hook-secret", "guess")];
    let (status, _) = call_with(&app, "POST", "/api/alerts/evaluate", None, &wrong, Some(tick.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, alerts) = call(&app, "GET", "/api/alerts", Some(user), None).await;
    assert_eq!(alerts[0]["is_active"], true);

    let (status, body) = evaluate(&app, tick).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triggered"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_closing_a_trade_credits_the_wallet() {
    let (app, _) = setup().await;
    let user = Uuid::new_v4();

    let (_, wallet) = call(&app, "GET", "/api/wallet", Some(user), None).await;
    assert_eq!(wallet["balance"], 1_000.0);

    let (status, opened) = call(
        &app,
        "POST",
        "/api/trades",
        Some(user),
        Some(json!({ "symbol": "EUR/USD", "direction": "call", "entry_price": 100.0, "amount": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = opened["items"][0]["id"].as_i64().unwrap();

    let (status, closed) = call(&app, "POST", &format!("/api/trades/{}/close", id), Some(user), Some(json!({ "exit_price": 110.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["trade"]["status"], "closed");
    assert_eq!(closed["trade"]["profit_loss"], 30.0);
    assert_eq!(closed["wallet"]["balance"], 1_030.0);

    let (status, body) = call(&app, "POST", &format!("/api/trades/{}/close", id), Some(user), Some(json!({ "exit_price": 120.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This trade is already closed");

    let (_, reset) = call(&app, "POST", "/api/wallet/reset", Some(user), None).await;
    assert_eq!(reset["wallet"]["balance"], 1_000.0);
}

#[tokio::test]
async fn test_goal_achievement_through_the_api() {
    let (app, _) = setup().await;
    let user = Uuid::new_v4();
    let (_, created) = call(&app, "POST", "/api/goals", Some(user), Some(json!({ "title": "First 500", "target_amount": 500.0 }))).await;
    let goal = &created["items"][0];
    assert_eq!(goal["achieved"], false);

    let id = goal["id"].as_i64().unwrap();
    let (_, updated) = call(&app, "PATCH", &format!("/api/goals/{}", id), Some(user), Some(json!({ "current_amount": 500.0 }))).await;
    assert_eq!(updated["items"][0]["achieved"], true);
}

#[tokio::test]
async fn test_push_subscription_lifecycle() {
    let (app, state) = setup().await;
    let user = Uuid::new_v4();

    let (_, key) = call(&app, "GET", "/api/push/vapid-key", Some(user), None).await;
    assert_eq!(key["publicKey"], "BPublicKeyForTests");

    let subscription = json!({
        "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
        "keys": { "p256dh": "BKey", "auth": "secret" }
    });
    for _ in 0..2 {
        let (status, body) = call(&app, "POST", "/api/push/subscribe", Some(user), Some(subscription.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subscribed"], true);
    }
    assert_eq!(state.subscriptions.list_for_user(user).await.unwrap().len(), 1);

    let (status, _) = call(
        &app,
        "POST",
        "/api/push/unsubscribe",
        Some(user),
        Some(json!({ "endpoint": "https://fcm.googleapis.com/fcm/send/abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.subscriptions.list_for_user(user).await.unwrap().is_empty());

    let (status, _) = call(
        &app,
        "POST",
        "/api/push/subscribe",
        Some(user),
        Some(json!({ "endpoint": "http://insecure.example", "keys": { "p256dh": "k", "auth": "a" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signal_listing_and_stats() {
    let (app, state) = setup().await;
    let user = Uuid::new_v4();
    let now = chrono::Utc::now();
    for i in 0..3 {
        let outcome = state
            .signals
            .insert_if_absent(NewSignal {
                asset: "EUR/USD".into(),
                timeframe: "M5".into(),
                direction: Direction::Put,
                raw_message: "EUR/USD M5 PUT".into(),
                telegram_message_id: 700 + i,
                chat_id: None,
                entry_time: None,
                received_at: now - chrono::Duration::minutes(i),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
    }

    let (status, list) = call(&app, "GET", "/api/signals?limit=2", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["telegram_message_id"], 700);

    let (status, list) = call(&app, "GET", "/api/signals?status=executed", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    let (status, _) = call(&app, "GET", "/api/signals?status=bogus", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = call(&app, "GET", "/api/signals/stats", Some(user), None).await;
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["pending"], 3);
}

#[tokio::test]
async fn test_realtime_stream_only_carries_the_callers_rows() {
    let (app, state) = setup().await;
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();

    let (status, _) = call(&app, "GET", "/api/realtime/passwords", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut events = Box::pin(change_stream(state.changes.subscribe(), "price_alerts".into(), user));

    state.publish("price_alerts", ChangeKind::Insert, Some(1), Some(other)).await;
    state.publish("favorites", ChangeKind::Insert, Some(2), Some(user)).await;
    let quiet = tokio::time::timeout(Duration::from_millis(50), events.next()).await;
    assert!(quiet.is_err(), "no visible change should be delivered");

    state.publish("price_alerts", ChangeKind::Update, Some(3), Some(user)).await;
    let delivered = tokio::time::timeout(Duration::from_secs(1), events.next()).await.unwrap();
    assert!(matches!(delivered, Some(Ok(_))));
}

#[tokio::test]
async fn test_changes_stay_local_when_redis_is_unreachable() {
    let feed = ChangeFeed::new("redis://127.0.0.1:1").unwrap();
    let (_, state) = setup_with_feed(feed).await;
    let user = Uuid::new_v4();
    let mut events = Box::pin(change_stream(state.changes.subscribe(), "price_alerts".into(), user));

    state.publish("price_alerts", ChangeKind::Insert, Some(1), Some(user)).await;
    let delivered = tokio::time::timeout(Duration::from_secs(5), events.next()).await.unwrap();
    assert!(matches!(delivered, Some(Ok(_))));
}
