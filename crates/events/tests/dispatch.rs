//! Dispatcher behaviour against the in-memory stores.
//!
//! Covers the notification decision table end to end, subscriber isolation
//! (errors and panics), and queued-mode retries.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portal_core::actions::{CommentAction, DeliverableAction, MilestoneAction, ProjectAction};
use portal_core::activity::LogName;
use portal_core::notification::NotificationType;
use portal_core::roles::Role;
use portal_core::types::{CommentId, DeliverableId, EntityRef, MilestoneId, ProjectId, UserId};
use portal_events::{
    standard_subscribers, Dispatcher, DomainEvent, Error, EventActor, MemoryStore, QueueSettings,
    Subscriber,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn admin(name: &str) -> EventActor {
    EventActor {
        id: UserId::new(),
        name: name.to_string(),
        role: Role::Admin,
    }
}

fn inline_dispatcher(store: &Arc<MemoryStore>) -> Dispatcher {
    Dispatcher::inline(standard_subscribers(store.clone(), store.clone()))
}

/// Subscriber that fails its first `failures` calls, then succeeds.
struct Flaky {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait]
impl Subscriber for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn handle(&self, _event: &DomainEvent) -> Result<(), Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(Error::Core(portal_core::error::CoreError::DependencyFailure(
                "store unavailable".into(),
            )))
        } else {
            Ok(())
        }
    }
}

struct Panicking;

#[async_trait]
impl Subscriber for Panicking {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn handle(&self, _event: &DomainEvent) -> Result<(), Error> {
        panic!("subscriber exploded");
    }
}

/// Subscriber that counts how often it ran.
#[derive(Default)]
struct Counter(AtomicU32);

#[async_trait]
impl Subscriber for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    async fn handle(&self, _event: &DomainEvent) -> Result<(), Error> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decision table
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approval_notifies_client_once_and_logs_once() {
    let store = Arc::new(MemoryStore::new());
    let subject = EntityRef::Deliverable(DeliverableId::new());
    let client = UserId::new();
    store.set_project_client(subject, client);

    inline_dispatcher(&store)
        .dispatch(DomainEvent::new(subject, DeliverableAction::Approved).with_actor(admin("Ada")))
        .await;

    let notifications = store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, client.as_uuid());
    assert_eq!(notifications[0].kind, NotificationType::Deliverable);
    assert_eq!(notifications[0].data["approved_by"], "Ada");

    let activity = store.activity();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].description, "Deliverable approved");
    assert_eq!(activity[0].log_name, LogName::Default);
}

#[tokio::test]
async fn approval_without_client_still_logs() {
    let store = Arc::new(MemoryStore::new());
    let subject = EntityRef::Deliverable(DeliverableId::new());

    inline_dispatcher(&store)
        .dispatch(DomainEvent::new(subject, DeliverableAction::Approved).with_actor(admin("Ada")))
        .await;

    assert!(store.notifications().is_empty());
    assert_eq!(store.activity().len(), 1);
}

#[tokio::test]
async fn rejection_carries_feedback() {
    let store = Arc::new(MemoryStore::new());
    let subject = EntityRef::Deliverable(DeliverableId::new());
    store.set_project_client(subject, UserId::new());

    inline_dispatcher(&store)
        .dispatch(
            DomainEvent::new(subject, DeliverableAction::Rejected)
                .with_actor(admin("Ada"))
                .with_metadata(json!({ "feedback": "Needs more contrast" })),
        )
        .await;

    let notifications = store.notifications();
    assert_eq!(notifications[0].data["rejected_by"], "Ada");
    assert_eq!(notifications[0].data["feedback"], "Needs more contrast");
}

#[tokio::test]
async fn mention_skips_the_author() {
    let store = Arc::new(MemoryStore::new());
    let author = admin("Ada");
    let mentioned = UserId::new();
    store.add_user(mentioned);
    store.add_user(author.id);

    inline_dispatcher(&store)
        .dispatch(
            DomainEvent::new(EntityRef::Comment(CommentId::new()), CommentAction::MentionedUsers)
                .with_actor(author.clone())
                .with_metadata(json!({
                    "mentioned_users": [mentioned.to_string(), author.id.to_string()]
                })),
        )
        .await;

    let notifications = store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, mentioned.as_uuid());
    assert_eq!(notifications[0].data["message"], "Ada mentioned you in a comment");
    assert_eq!(store.activity()[0].log_name, LogName::Comment);
}

#[tokio::test]
async fn unknown_mentioned_users_are_dropped() {
    let store = Arc::new(MemoryStore::new());

    inline_dispatcher(&store)
        .dispatch(
            DomainEvent::new(EntityRef::Comment(CommentId::new()), CommentAction::MentionedUsers)
                .with_actor(admin("Ada"))
                .with_metadata(json!({ "mentioned_users": [UserId::new().to_string()] })),
        )
        .await;

    assert!(store.notifications().is_empty());
}

#[tokio::test]
async fn unlisted_actions_never_notify() {
    let store = Arc::new(MemoryStore::new());
    let milestone = EntityRef::Milestone(MilestoneId::new());
    let project = EntityRef::Project(ProjectId::new());
    store.set_project_client(milestone, UserId::new());
    store.set_project_client(project, UserId::new());

    let dispatcher = inline_dispatcher(&store);
    dispatcher
        .dispatch(DomainEvent::new(milestone, MilestoneAction::StatusChanged))
        .await;
    dispatcher
        .dispatch(DomainEvent::new(project, ProjectAction::Updated))
        .await;

    assert!(store.notifications().is_empty());
    assert_eq!(store.activity().len(), 2);
}

#[tokio::test]
async fn milestone_completion_notifies_client() {
    let store = Arc::new(MemoryStore::new());
    let milestone = EntityRef::Milestone(MilestoneId::new());
    store.set_project_client(milestone, UserId::new());

    inline_dispatcher(&store)
        .dispatch(DomainEvent::new(milestone, MilestoneAction::Completed))
        .await;

    let notifications = store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationType::Milestone);
}

// ---------------------------------------------------------------------------
// Isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_subscriber_does_not_stop_the_rest() {
    let counter = Arc::new(Counter::default());
    let flaky: Arc<dyn Subscriber> = Arc::new(Flaky {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    });
    let dispatcher = Dispatcher::inline(vec![flaky, counter.clone() as Arc<dyn Subscriber>]);

    dispatcher
        .dispatch(DomainEvent::new(
            EntityRef::Project(ProjectId::new()),
            ProjectAction::Created,
        ))
        .await;

    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_subscriber_does_not_stop_the_rest() {
    let counter = Arc::new(Counter::default());
    let dispatcher = Dispatcher::inline(vec![
        Arc::new(Panicking) as Arc<dyn Subscriber>,
        counter.clone() as Arc<dyn Subscriber>,
    ]);

    dispatcher
        .dispatch(DomainEvent::new(
            EntityRef::Project(ProjectId::new()),
            ProjectAction::Created,
        ))
        .await;

    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[test]
fn standard_order_is_logger_then_router() {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = inline_dispatcher(&store);
    assert_eq!(
        dispatcher.subscriber_names(),
        ["activity_logger", "notification_router"]
    );
}

// ---------------------------------------------------------------------------
// Queued mode
// ---------------------------------------------------------------------------

fn fast_queue() -> QueueSettings {
    QueueSettings {
        capacity: 8,
        max_attempts: 3,
        retry_backoff: Duration::from_millis(1),
        enqueue_timeout: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn queued_mode_retries_until_success() {
    let flaky = Arc::new(Flaky {
        failures: 2,
        calls: AtomicU32::new(0),
    });
    let (dispatcher, worker) =
        Dispatcher::queued(vec![flaky.clone() as Arc<dyn Subscriber>], fast_queue());

    dispatcher
        .dispatch(DomainEvent::new(
            EntityRef::Project(ProjectId::new()),
            ProjectAction::Created,
        ))
        .await;
    drop(dispatcher);
    worker.await.unwrap();

    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn queued_mode_gives_up_after_max_attempts() {
    let flaky = Arc::new(Flaky {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    });
    let counter = Arc::new(Counter::default());
    let (dispatcher, worker) = Dispatcher::queued(
        vec![
            flaky.clone() as Arc<dyn Subscriber>,
            counter.clone() as Arc<dyn Subscriber>,
        ],
        fast_queue(),
    );

    dispatcher
        .dispatch(DomainEvent::new(
            EntityRef::Project(ProjectId::new()),
            ProjectAction::Created,
        ))
        .await;
    drop(dispatcher);
    worker.await.unwrap();

    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn queued_mode_delivers_to_memory_store() {
    let store = Arc::new(MemoryStore::new());
    let subject = EntityRef::Deliverable(DeliverableId::new());
    store.set_project_client(subject, UserId::new());
    let (dispatcher, worker) =
        Dispatcher::queued(standard_subscribers(store.clone(), store.clone()), fast_queue());

    dispatcher
        .dispatch(DomainEvent::new(subject, DeliverableAction::Approved).with_actor(admin("Ada")))
        .await;
    drop(dispatcher);
    worker.await.unwrap();

    assert_eq!(store.notifications().len(), 1);
    assert_eq!(store.activity().len(), 1);
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Subscriber that takes a while, then records the action it saw.
struct SlowRecorder {
    delay: Duration,
    seen: std::sync::Mutex<Vec<String>>,
}

impl SlowRecorder {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for SlowRecorder {
    fn name(&self) -> &'static str {
        "slow-recorder"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), Error> {
        tokio::time::sleep(self.delay).await;
        self.seen.lock().unwrap().push(event.action.to_string());
        Ok(())
    }
}

fn completion_batch() -> Vec<DomainEvent> {
    let subject = EntityRef::Milestone(MilestoneId::new());
    vec![
        DomainEvent::new(subject, MilestoneAction::StatusChanged),
        DomainEvent::new(subject, MilestoneAction::Completed),
    ]
}

#[tokio::test]
async fn dropped_caller_still_delivers_whole_batch() {
    let recorder = Arc::new(SlowRecorder::new(Duration::from_millis(100)));
    let dispatcher = Dispatcher::inline(vec![recorder.clone() as Arc<dyn Subscriber>]);

    // The caller gives up while the first event is still being handled.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), dispatcher.dispatch_all(completion_batch()))
            .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    let expected: Vec<String> = completion_batch()
        .iter()
        .map(|e| e.action.to_string())
        .collect();
    assert_eq!(recorder.seen(), expected);
}

#[tokio::test]
async fn queued_batch_keeps_event_order() {
    let recorder = Arc::new(SlowRecorder::new(Duration::ZERO));
    let (dispatcher, worker) = Dispatcher::queued(
        vec![recorder.clone() as Arc<dyn Subscriber>],
        fast_queue(),
    );

    dispatcher.dispatch_all(completion_batch()).await;
    drop(dispatcher);
    worker.await.unwrap();

    let expected: Vec<String> = completion_batch()
        .iter()
        .map(|e| e.action.to_string())
        .collect();
    assert_eq!(recorder.seen(), expected);
}

#[tokio::test]
async fn empty_batch_reaches_no_subscriber() {
    let counter = Arc::new(Counter::default());
    Dispatcher::inline(vec![counter.clone() as Arc<dyn Subscriber>])
        .dispatch_all(Vec::new())
        .await;
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);
}
