//! Activity-log subscriber.

use std::sync::Arc;

use async_trait::async_trait;
use portal_core::activity::ActivityEntry;
use serde_json::Value;

use crate::error::Error;
use crate::event::DomainEvent;
use crate::subscriber::Subscriber;

/// Append-only sink for activity entries.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record(&self, entry: ActivityEntry) -> Result<(), Error>;
}

/// Writes one activity-log entry per dispatched event.
pub struct ActivityLogger {
    store: Arc<dyn ActivityStore>,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// The entry recorded for `event`. Properties are redacted.
    pub fn entry_for(event: &DomainEvent) -> ActivityEntry {
        ActivityEntry::for_action(
            event.subject,
            &event.action,
            event.actor_id(),
            &Value::Object(event.metadata.clone()),
        )
        .with_request(
            event.context.ip_address.clone(),
            event.context.user_agent.clone(),
        )
    }
}

#[async_trait]
impl Subscriber for ActivityLogger {
    fn name(&self) -> &'static str {
        "activity_logger"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), Error> {
        self.store.record(Self::entry_for(event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventActor, RequestContext};
    use portal_core::actions::CredentialAction;
    use portal_core::activity::LogName;
    use portal_core::roles::Role;
    use portal_core::types::{CredentialId, EntityRef, UserId};
    use serde_json::json;

    #[test]
    fn entry_carries_actor_request_and_redacted_properties() {
        let actor = UserId::new();
        let event = DomainEvent::new(
            EntityRef::Credential(CredentialId::new()),
            CredentialAction::Updated,
        )
        .with_actor(EventActor {
            id: actor,
            name: "Ada".into(),
            role: Role::Admin,
        })
        .with_metadata(json!({ "name": "db", "secret": "hunter2" }))
        .with_context(RequestContext {
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
        });

        let entry = ActivityLogger::entry_for(&event);
        assert_eq!(entry.log_name, LogName::Updated);
        assert_eq!(entry.description, "Credential updated");
        assert_eq!(entry.user_id, Some(actor));
        assert_eq!(entry.causer, Some(EntityRef::User(actor)));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
        assert!(entry.user_agent.is_none());
        assert_eq!(entry.properties["secret"], "[REDACTED]");
        assert_eq!(entry.properties["name"], "db");
    }
}
