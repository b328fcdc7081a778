
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use fixtures::{aged_record, default_pipeline, register_tokens, RecordingGateway, TRIGGER_SECRET};
use serde_json::{json, Value};
use solarvita_common::{NotificationRepository, TokenRepository};
use solarvita_notifications::auth::TRIGGER_SECRET_HEADER;
use solarvita_notifications::routes;
use std::sync::Arc;
use tower::ServiceExt;

fn app(p: &fixtures::TestPipeline) -> Router {
    routes(p.state.clone(), Some(TRIGGER_SECRET.to_string()))
}

fn callable(path: &str, id_token: Option<&str>, data: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id_token) = id_token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {id_token}"));
    }
    builder
        .body(Body::from(json!({ "data": data }).to_string()))
        .unwrap()
}

fn trigger(path: &str, secret: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
        builder = builder.header(TRIGGER_SECRET_HEADER, secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_callable_without_auth_is_unauthenticated() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(callable("/updateUserToken", None, json!({ "token": "abc" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["status"], "UNAUTHENTICATED");
    assert!(p.store.find_by_user("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callable_with_rejected_id_token() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(callable(
            "/updateUserToken",
            Some("forged"),
            json!({ "token": "abc" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_user_token_stores_token() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(callable(
            "/updateUserToken",
            Some("valid:u1"),
            json!({ "token": "fcm-abc", "platform": "ios" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "result": { "success": true } }));

    let tokens = p.store.find_by_user("u1").await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, "fcm-abc");
}

#[tokio::test]
async fn test_update_user_token_without_token_is_invalid() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(callable("/updateUserToken", Some("valid:u1"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["status"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_send_direct_notification_with_empty_title_writes_nothing() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(callable(
            "/sendDirectNotification",
            Some("valid:u1"),
            json!({ "userId": "u2", "title": "", "body": "hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["status"], "INVALID_ARGUMENT");
    assert!(p.store.find_for_user("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_direct_notification_returns_id() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(callable(
            "/sendDirectNotification",
            Some("valid:u1"),
            json!({
                "userId": "u2",
                "title": "Support request",
                "body": "Can you pace me on Sunday?",
                "type": "support_request",
                "notificationData": { "requestId": "r-7", "urgent": true }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["success"], true);
    let id = body["result"]["notificationId"].as_str().unwrap().to_string();

    let stored = p.store.find_for_user("u2").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].data.get("urgent"), Some("true"));
}

#[tokio::test]
async fn test_trigger_without_secret_is_rejected() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(trigger("/triggers/retention-sweep", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(&p)
        .oneshot(trigger("/triggers/retention-sweep", Some("nope"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trigger_without_configured_secret_fails_closed() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = routes(p.state.clone(), None)
        .oneshot(trigger(
            "/triggers/retention-sweep",
            Some(TRIGGER_SECRET),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_notification_created_trigger_dispatches() {
    let gateway = Arc::new(RecordingGateway::failing_for(&["B"]));
    let p = default_pipeline(gateway.clone());
    register_tokens(&p.store, "u1", &["A", "B"]).await;

    let response = app(&p)
        .oneshot(trigger(
            "/triggers/notification-created",
            Some(TRIGGER_SECRET),
            json!({
                "id": "n1",
                "userId": "u1",
                "type": "NotificationType.like",
                "data": { "postId": "p-1" },
                "timestamp": 1_760_000_000_000_i64,
                "isRead": false
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "success": 1, "failures": 1, "totalTargets": 2 })
    );
    assert_eq!(gateway.sent_tokens().await, vec!["A", "B"]);

    let left = p.store.find_by_user("u1").await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].token, "A");
}

#[tokio::test]
async fn test_notification_created_trigger_stores_record_once() {
    let gateway = Arc::new(RecordingGateway::default());
    let p = default_pipeline(gateway.clone());
    register_tokens(&p.store, "u1", &["A"]).await;
    let document = json!({
        "id": "n1",
        "userId": "u1",
        "type": "like",
        "timestamp": 1_700_000_000_000_i64
    });

    for _ in 0..2 {
        let response = app(&p)
            .oneshot(trigger(
                "/triggers/notification-created",
                Some(TRIGGER_SECRET),
                document.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Redelivery sends again but keeps one record.
    assert_eq!(gateway.sent_tokens().await, vec!["A", "A"]);
    let stored = p.store.find_for_user("u1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "n1");
    assert_eq!(stored[0].wire_type(), "like");

    let response = app(&p)
        .oneshot(trigger(
            "/triggers/retention-sweep",
            Some(TRIGGER_SECRET),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["deleted"], 1);
    assert!(p.store.find_for_user("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_created_for_device_leaves_outbox_empty() {
    let gateway = Arc::new(RecordingGateway::failing_for(&["dead"]));
    let p = default_pipeline(gateway.clone());

    for (id, token) in [("chat-1", "live"), ("chat-2", "dead")] {
        let response = app(&p)
            .oneshot(trigger(
                "/triggers/notification-created",
                Some(TRIGGER_SECRET),
                json!({
                    "id": id,
                    "recipientToken": token,
                    "type": "chat",
                    "body": "hey"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(gateway.sent_tokens().await, vec!["dead", "live"]);
    assert!(p.store.find_outbox("chat-1").await.unwrap().is_none());
    assert!(p.store.find_outbox("chat-2").await.unwrap().is_some());
}

#[tokio::test]
async fn test_notification_created_without_recipient_is_invalid() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(trigger(
            "/triggers/notification-created",
            Some(TRIGGER_SECRET),
            json!({ "id": "n1", "type": "like" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_deleted_trigger_returns_counts() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));
    for id in ["n1", "n2", "n3"] {
        p.store
            .insert(&aged_record(id, "gone", Duration::minutes(5)))
            .await
            .unwrap();
    }
    register_tokens(&p.store, "gone", &["A", "B"]).await;

    let response = app(&p)
        .oneshot(trigger(
            "/triggers/user-deleted",
            Some(TRIGGER_SECRET),
            json!({ "uid": "gone" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "notifications": 3, "tokens": 2 })
    );

    let response = app(&p)
        .oneshot(trigger(
            "/triggers/user-deleted",
            Some(TRIGGER_SECRET),
            json!({ "uid": "gone" }),
        ))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await,
        json!({ "notifications": 0, "tokens": 0 })
    );
}

#[tokio::test]
async fn test_retention_sweep_trigger_reports_deletions() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));
    p.store
        .insert(&aged_record("old", "u1", Duration::days(31)))
        .await
        .unwrap();
    p.store
        .insert(&aged_record("new", "u1", Duration::days(2)))
        .await
        .unwrap();

    let response = app(&p)
        .oneshot(trigger(
            "/triggers/retention-sweep",
            Some(TRIGGER_SECRET),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["deleted"], 1);
    assert_eq!(body["users"], 1);

    let left = p.store.find_for_user("u1").await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, "new");
}

#[tokio::test]
async fn test_health_and_root() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let response = app(&p)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");

    let response = app(&p)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
