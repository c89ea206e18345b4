//! The event envelope handed to every subscriber.

use chrono::Utc;
use portal_core::actions::DomainAction;
use portal_core::roles::Role;
use portal_core::types::{EntityRef, Timestamp, UserId};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// The user who performed an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventActor {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

/// Where the triggering request came from, when known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A committed domain action.
///
/// Built with [`DomainEvent::new`] and enriched with the `with_*` builders.
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub subject: EntityRef,
    pub action: DomainAction,
    pub actor: Option<EventActor>,
    pub metadata: Map<String, Value>,
    pub context: RequestContext,
    pub occurred_at: Timestamp,
}

impl DomainEvent {
    pub fn new(subject: EntityRef, action: impl Into<DomainAction>) -> Self {
        Self {
            subject,
            action: action.into(),
            actor: None,
            metadata: Map::new(),
            context: RequestContext::default(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: EventActor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Merge the keys of a JSON object into the metadata. Non-object values
    /// are ignored.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        if let Value::Object(map) = metadata {
            self.metadata.extend(map);
        }
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn actor_id(&self) -> Option<UserId> {
        self.actor.as_ref().map(|a| a.id)
    }

    /// Display name of the actor, or `"System"` when there is none.
    pub fn actor_name(&self) -> &str {
        self.actor.as_ref().map_or("System", |a| a.name.as_str())
    }

    /// The `mentioned_users` metadata entry as user ids. Entries that are not
    /// UUID strings are skipped.
    pub fn mentioned_users(&self) -> Vec<UserId> {
        self.metadata
            .get("mentioned_users")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .filter_map(|s| s.parse::<Uuid>().ok())
                    .map(UserId)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::actions::CommentAction;
    use portal_core::types::CommentId;
    use serde_json::json;

    #[test]
    fn default_event_has_no_actor_and_empty_metadata() {
        let event = DomainEvent::new(EntityRef::Comment(CommentId::new()), CommentAction::Created);
        assert!(event.actor.is_none());
        assert!(event.metadata.is_empty());
        assert_eq!(event.actor_name(), "System");
    }

    #[test]
    fn mentioned_users_skips_malformed_entries() {
        let a = UserId::new();
        let event = DomainEvent::new(EntityRef::Comment(CommentId::new()), CommentAction::MentionedUsers)
            .with_metadata(json!({ "mentioned_users": [a.to_string(), "nope", 7] }));
        assert_eq!(event.mentioned_users(), vec![a]);
    }

    #[test]
    fn non_object_metadata_is_ignored() {
        let event = DomainEvent::new(EntityRef::Comment(CommentId::new()), CommentAction::Created)
            .with_metadata(json!([1, 2, 3]));
        assert!(event.metadata.is_empty());
    }
}
