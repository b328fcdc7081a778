
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fixtures::{
    aged_record, caller, default_pipeline, dispatch_trigger, janitor, pipeline, register_tokens,
    user_record, RecordingGateway,
};
use solarvita_common::{
    DeliveryError, NotificationPayload, NotificationRecord, NotificationRepository,
    NotificationType, Platform, PurgeCounts, PushGateway, PushMessage, SolarvitaError,
    StoreError, TokenRepository,
};
use solarvita_config::{NotificationsConfig, TokenStorage};
use solarvita_db::MemoryStore;
use solarvita_notifications::events::{self, spawn_worker};
use solarvita_notifications::writer::DirectNotificationRequest;
use solarvita_notifications::{NotificationWriter, RetentionSweeper, TriggerEvent};
use std::sync::Arc;

fn direct_request(user_id: &str, title: &str, body: &str) -> DirectNotificationRequest {
    DirectNotificationRequest {
        user_id: user_id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        ..Default::default()
    }
}

// --- Token registry ---

#[tokio::test]
async fn test_register_requires_caller() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let err = p
        .state
        .registry
        .register_token(None, "tok", Platform::Android)
        .await
        .unwrap_err();

    assert!(matches!(err, SolarvitaError::Unauthenticated(_)));
    assert!(p.store.find_by_user("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_blank_token() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let err = p
        .state
        .registry
        .register_token(Some(&caller("u1")), "   ", Platform::Ios)
        .await
        .unwrap_err();

    assert!(matches!(err, SolarvitaError::InvalidArgument(_)));
    assert!(p.store.find_by_user("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_current_storage_keeps_latest_token_only() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));
    let user = caller("u1");

    for token in ["first", "second", "third"] {
        let result = p
            .state
            .registry
            .register_token(Some(&user), token, Platform::Android)
            .await
            .unwrap();
        assert!(result.success);
    }

    let tokens = p.store.find_by_user("u1").await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, "third");
    assert_eq!(tokens[0].platform, Platform::Android);
}

#[tokio::test]
async fn test_per_device_storage_keeps_every_token() {
    let p = pipeline(
        Arc::new(RecordingGateway::default()),
        TokenStorage::PerDevice,
        NotificationsConfig::default(),
    );
    let user = caller("u1");

    for token in ["phone", "tablet", "phone"] {
        p.state
            .registry
            .register_token(Some(&user), token, Platform::Ios)
            .await
            .unwrap();
    }

    let mut tokens: Vec<String> = p
        .store
        .find_by_user("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect();
    tokens.sort();
    assert_eq!(tokens, vec!["phone", "tablet"]);
}

// --- Notification writer ---

#[tokio::test]
async fn test_direct_notification_requires_caller() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    let err = p
        .state
        .writer
        .send_direct_notification(None, direct_request("u2", "Hi", "There"))
        .await
        .unwrap_err();

    assert!(matches!(err, SolarvitaError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_direct_notification_with_blank_field_writes_nothing() {
    let mut p = default_pipeline(Arc::new(RecordingGateway::default()));
    let sender = caller("u1");

    for request in [
        direct_request("", "Hi", "There"),
        direct_request("u2", "", "There"),
        direct_request("u2", "Hi", " "),
    ] {
        let err = p
            .state
            .writer
            .send_direct_notification(Some(&sender), request)
            .await
            .unwrap_err();
        assert!(matches!(err, SolarvitaError::InvalidArgument(_)));
    }

    assert!(p.store.find_for_user("u2").await.unwrap().is_empty());
    assert!(p.events.try_recv().is_err());
}

#[tokio::test]
async fn test_direct_notification_is_stored_and_published() {
    let mut p = default_pipeline(Arc::new(RecordingGateway::default()));

    let mut data = NotificationPayload::default();
    data.insert("postId", "p-42");
    let request = DirectNotificationRequest {
        kind: Some("NotificationType.comment".into()),
        notification_data: Some(data),
        action_url: Some("/posts/p-42".into()),
        ..direct_request("u2", "New comment", "Nice run!")
    };

    let result = p
        .state
        .writer
        .send_direct_notification(Some(&caller("u1")), request)
        .await
        .unwrap();
    assert!(result.success);
    assert!(!result.notification_id.is_empty());

    let stored = p.store.find_for_user("u2").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, result.notification_id);
    assert_eq!(stored[0].kind, NotificationType::Comment);
    assert_eq!(stored[0].data.get("postId"), Some("p-42"));
    assert!(!stored[0].is_read);

    let TriggerEvent::NotificationCreated(published) = p.events.try_recv().unwrap();
    assert_eq!(published.id, result.notification_id);
}

#[tokio::test]
async fn test_direct_notification_defaults_to_system_type() {
    let p = default_pipeline(Arc::new(RecordingGateway::default()));

    p.state
        .writer
        .send_direct_notification(Some(&caller("u1")), direct_request("u2", "Hi", "There"))
        .await
        .unwrap();

    let stored = p.store.find_for_user("u2").await.unwrap();
    assert_eq!(stored[0].kind, NotificationType::System);
}

// --- Trigger worker ---

#[tokio::test]
async fn test_worker_dispatches_inserted_records() {
    let store = Arc::new(MemoryStore::new());
    register_tokens(&store, "u1", &["A", "B"]).await;
    let gateway = Arc::new(RecordingGateway::default());
    let dispatch = Arc::new(dispatch_trigger(&store, gateway.clone()));

    let (sender, receiver) = events::channel(4);
    let worker = spawn_worker(receiver, dispatch);
    let writer = NotificationWriter::new(store.clone(), sender);

    writer.insert(user_record("n1", "u1", "mention")).await.unwrap();

    for _ in 0..100 {
        if gateway.sent().await.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(gateway.sent_tokens().await, vec!["A", "B"]);

    drop(writer);
    worker.await.unwrap();
}

/// Gateway that takes a while per send, so dispatches are still running
/// when the bus closes.
struct SlowGateway(RecordingGateway);

#[async_trait]
impl PushGateway for SlowGateway {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, DeliveryError> {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        self.0.send(token, message).await
    }
}

#[tokio::test]
async fn test_worker_drains_queue_when_bus_closes() {
    let store = Arc::new(MemoryStore::new());
    register_tokens(&store, "u1", &["A", "B"]).await;
    let gateway = Arc::new(SlowGateway(RecordingGateway::default()));
    let dispatch = Arc::new(dispatch_trigger(&store, gateway.clone()));

    let (sender, receiver) = events::channel(8);
    let writer = NotificationWriter::new(store.clone(), sender);
    for id in ["n1", "n2", "n3"] {
        writer.insert(user_record(id, "u1", "post")).await.unwrap();
    }

    // Everything is queued before the worker even starts.
    let worker = spawn_worker(receiver, dispatch);
    drop(writer);
    worker.await.unwrap();

    assert_eq!(gateway.0.sent().await.len(), 6);
}

#[tokio::test]
async fn test_insert_of_known_id_is_not_published_again() {
    let mut p = default_pipeline(Arc::new(RecordingGateway::default()));

    assert!(p.state.writer.insert(user_record("n1", "u1", "like")).await.unwrap());
    assert!(!p.state.writer.insert(user_record("n1", "u1", "like")).await.unwrap());

    assert!(p.events.try_recv().is_ok());
    assert!(p.events.try_recv().is_err());
    assert_eq!(p.store.find_for_user("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_insert_succeeds_when_bus_is_closed() {
    let store = Arc::new(MemoryStore::new());
    let (sender, receiver) = events::channel(1);
    drop(receiver);
    let writer = NotificationWriter::new(store.clone(), sender);

    let created = writer
        .insert(user_record("n1", "u1", "reminder"))
        .await
        .unwrap();

    assert!(created);
    assert_eq!(store.find_for_user("u1").await.unwrap().len(), 1);
}

// --- Token janitor ---

#[tokio::test]
async fn test_purge_deletes_everything_once() {
    let store = Arc::new(MemoryStore::new());
    for id in ["n1", "n2", "n3"] {
        store.insert(&user_record(id, "gone", "like")).await.unwrap();
    }
    store.insert(&user_record("n4", "stays", "like")).await.unwrap();
    register_tokens(&store, "gone", &["A", "B"]).await;
    register_tokens(&store, "stays", &["C"]).await;
    let janitor = janitor(&store);

    let first = janitor.purge_user("gone").await.unwrap();
    assert_eq!(
        first,
        PurgeCounts {
            notifications: 3,
            tokens: 2
        }
    );
    assert_eq!(first.total(), 5);

    let second = janitor.purge_user("gone").await.unwrap();
    assert_eq!(second.total(), 0);

    assert_eq!(store.find_for_user("stays").await.unwrap().len(), 1);
    assert_eq!(store.find_by_user("stays").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_prune_with_no_tokens_is_noop() {
    let store = Arc::new(MemoryStore::new());
    register_tokens(&store, "u1", &["A"]).await;

    assert_eq!(janitor(&store).prune_tokens("u1", &[]).await, 0);
    assert_eq!(store.find_by_user("u1").await.unwrap().len(), 1);
}

// --- Retention sweeper ---

fn small_batches(max_batch_size: usize) -> NotificationsConfig {
    NotificationsConfig {
        retention_days: 30,
        max_batch_size,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_sweep_removes_only_records_past_cutoff() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let sweeper = RetentionSweeper::new(store.clone(), &small_batches(2));
    let cutoff = sweeper.cutoff(now);

    for user in ["u1", "u2"] {
        for day in [1, 29, 31, 45, 60, 90] {
            let mut record = aged_record(&format!("{user}-{day}"), user, Duration::zero());
            record.created_at = now - Duration::days(day);
            store.insert(&record).await.unwrap();
        }
    }
    let mut at_cutoff = user_record("u1-edge", "u1", "like");
    at_cutoff.created_at = cutoff;
    store.insert(&at_cutoff).await.unwrap();

    let report = sweeper.sweep_at(now).await.unwrap();
    assert_eq!(report.deleted, 8);
    assert_eq!(report.users, 2);
    assert!(report.is_success());

    for user in ["u1", "u2"] {
        let left = store.find_for_user(user).await.unwrap();
        assert!(left.iter().all(|r| r.created_at >= cutoff));
    }
    assert_eq!(store.find_for_user("u1").await.unwrap().len(), 3);
    assert_eq!(store.find_for_user("u2").await.unwrap().len(), 2);

    let again = sweeper.sweep_at(now).await.unwrap();
    assert_eq!(again.deleted, 0);
}

#[tokio::test]
async fn test_sweep_with_nothing_to_delete() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(&aged_record("fresh", "u1", Duration::hours(1)))
        .await
        .unwrap();

    let report = RetentionSweeper::new(store.clone(), &NotificationsConfig::default())
        .sweep()
        .await
        .unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(store.find_for_user("u1").await.unwrap().len(), 1);
}

/// Store that fails every delete for one user.
struct FailingForUser {
    inner: MemoryStore,
    broken_user: &'static str,
}

#[async_trait]
impl NotificationRepository for FailingForUser {
    async fn insert(&self, record: &NotificationRecord) -> Result<bool, StoreError> {
        self.inner.insert(record).await
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StoreError> {
        self.inner.find_for_user(user_id).await
    }

    async fn find_outbox(&self, id: &str) -> Result<Option<NotificationRecord>, StoreError> {
        self.inner.find_outbox(id).await
    }

    async fn delete_outbox(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete_outbox(id).await
    }

    async fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        self.inner.user_ids().await
    }

    async fn delete_older_than(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<u64, StoreError> {
        if user_id == self.broken_user {
            return Err(StoreError::Unavailable("disk on fire".into()));
        }
        self.inner.delete_older_than(user_id, cutoff, limit).await
    }

    async fn purge_user(&self, user_id: &str) -> Result<PurgeCounts, StoreError> {
        self.inner.purge_user(user_id).await
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn test_sweep_continues_past_failed_user_and_reports_failure() {
    let store = Arc::new(FailingForUser {
        inner: MemoryStore::new(),
        broken_user: "a-broken",
    });
    for user in ["a-broken", "b-fine"] {
        store
            .insert(&aged_record(&format!("{user}-old"), user, Duration::days(40)))
            .await
            .unwrap();
    }

    let err = RetentionSweeper::new(store.clone(), &NotificationsConfig::default())
        .sweep()
        .await
        .unwrap_err();

    assert!(matches!(err, SolarvitaError::CleanupFailure(_)));
    assert!(store.find_for_user("b-fine").await.unwrap().is_empty());
    assert_eq!(store.find_for_user("a-broken").await.unwrap().len(), 1);
}
