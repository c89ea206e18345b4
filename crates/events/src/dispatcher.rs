//! Fan-out of committed domain events to the registered subscribers.
//!
//! Two modes:
//!
//! - **Inline**: [`Dispatcher::dispatch`] runs the fan-out on a spawned task
//!   and waits for it. The caller sees the side effects on return, and
//!   dropping the caller's future does not cancel a fan-out already started.
//! - **Queued**: batches go through a bounded `mpsc` channel to one worker
//!   that retries each failing subscriber with linear back-off. If the
//!   channel stays full past the enqueue timeout, or is closed, the event is
//!   handled inline instead.
//!
//! Every subscriber call is isolated: an error or a panic is logged and the
//! next subscriber still runs.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::event::DomainEvent;
use crate::subscriber::Subscriber;

/// Tuning for queued mode.
#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    /// Channel bound.
    pub capacity: usize,
    /// Attempts per subscriber, including the first.
    pub max_attempts: u32,
    /// Back-off unit; attempt `n` waits `n * retry_backoff` before retrying.
    pub retry_backoff: Duration,
    /// How long `dispatch` waits for channel capacity.
    pub enqueue_timeout: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            enqueue_timeout: Duration::from_secs(30),
        }
    }
}

type Subscribers = Arc<[Arc<dyn Subscriber>]>;

/// Cheaply cloneable handle shared through application state.
#[derive(Clone)]
pub struct Dispatcher {
    subscribers: Subscribers,
    queue: Option<Queue>,
}

#[derive(Clone)]
struct Queue {
    sender: mpsc::Sender<Vec<DomainEvent>>,
    enqueue_timeout: Duration,
}

impl Dispatcher {
    /// A dispatcher that runs every fan-out before `dispatch` returns.
    pub fn inline(subscribers: Vec<Arc<dyn Subscriber>>) -> Self {
        Self {
            subscribers: subscribers.into(),
            queue: None,
        }
    }

    /// A dispatcher backed by a queue and its worker task.
    ///
    /// The worker exits once every clone of the returned dispatcher has been
    /// dropped and the queue is drained.
    pub fn queued(
        subscribers: Vec<Arc<dyn Subscriber>>,
        settings: QueueSettings,
    ) -> (Self, JoinHandle<()>) {
        let subscribers: Subscribers = subscribers.into();
        let (sender, receiver) = mpsc::channel(settings.capacity.max(1));
        let worker = tokio::spawn(run_worker(subscribers.clone(), receiver, settings));
        let dispatcher = Self {
            subscribers,
            queue: Some(Queue {
                sender,
                enqueue_timeout: settings.enqueue_timeout,
            }),
        };
        (dispatcher, worker)
    }

    /// Names of the registered subscribers, in call order.
    pub fn subscriber_names(&self) -> Vec<&'static str> {
        self.subscribers.iter().map(|s| s.name()).collect()
    }

    /// Announce a committed action. Never fails: subscriber problems are
    /// logged, not returned.
    pub async fn dispatch(&self, event: DomainEvent) {
        self.dispatch_all(vec![event]).await;
    }

    /// Announce several actions of one commit, in order.
    ///
    /// The whole batch is handed to a spawned task on the first poll, so
    /// dropping the caller's future can not lose the later events.
    pub async fn dispatch_all(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        let subscribers = self.subscribers.clone();
        let queue = self.queue.clone();
        let first_action = events[0].action;
        let handle = tokio::spawn(async move {
            let events = match &queue {
                Some(queue) => match enqueue(queue, events).await {
                    Ok(()) => return,
                    Err(events) => events,
                },
                None => events,
            };
            fan_out(&subscribers, &events, 1, Duration::ZERO).await;
        });
        if let Err(e) = handle.await {
            tracing::error!(error = %e, action = %first_action, "Dispatch task failed");
        }
    }
}

/// Try to place a batch on the queue, handing it back on timeout or closure.
async fn enqueue(queue: &Queue, events: Vec<DomainEvent>) -> Result<(), Vec<DomainEvent>> {
    match tokio::time::timeout(queue.enqueue_timeout, queue.sender.reserve()).await {
        Ok(Ok(permit)) => {
            permit.send(events);
            Ok(())
        }
        Ok(Err(_)) => {
            tracing::warn!(events = events.len(), "Dispatch queue closed, handling inline");
            Err(events)
        }
        Err(_) => {
            tracing::warn!(events = events.len(), "Dispatch queue full, handling inline");
            Err(events)
        }
    }
}

/// Deliver each event to every subscriber, events in order.
async fn fan_out(
    subscribers: &Subscribers,
    events: &[DomainEvent],
    max_attempts: u32,
    backoff: Duration,
) {
    for event in events {
        for subscriber in subscribers.iter() {
            deliver(subscriber.as_ref(), event, max_attempts, backoff).await;
        }
    }
}

async fn run_worker(
    subscribers: Subscribers,
    mut receiver: mpsc::Receiver<Vec<DomainEvent>>,
    settings: QueueSettings,
) {
    tracing::info!(capacity = settings.capacity, "Dispatch worker started");
    while let Some(events) = receiver.recv().await {
        fan_out(&subscribers, &events, settings.max_attempts, settings.retry_backoff).await;
    }
    tracing::info!("Dispatch queue closed, worker shutting down");
}

/// Call one subscriber, retrying up to `max_attempts` times.
async fn deliver(
    subscriber: &dyn Subscriber,
    event: &DomainEvent,
    max_attempts: u32,
    backoff: Duration,
) {
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match call_isolated(subscriber, event).await {
            Ok(()) => return,
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    subscriber = subscriber.name(),
                    action = %event.action,
                    attempt,
                    error = %e,
                    "Subscriber failed, retrying"
                );
                tokio::time::sleep(backoff * attempt).await;
            }
            Err(e) => {
                tracing::error!(
                    subscriber = subscriber.name(),
                    action = %event.action,
                    subject = ?event.subject,
                    error = %e,
                    "Subscriber failed"
                );
            }
        }
    }
}

/// Run the subscriber, turning a panic into [`Error::Panicked`].
async fn call_isolated(subscriber: &dyn Subscriber, event: &DomainEvent) -> Result<(), Error> {
    match AssertUnwindSafe(subscriber.handle(event)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Error::Panicked(message))
        }
    }
}
