//! Activity-log categorisation, descriptions and property redaction.
//!
//! Activity logs are append-only. This module decides what a row looks like;
//! writing it is the job of the activity logger subscriber.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::actions::DomainAction;
use crate::types::{EntityRef, UserId};

string_enum! {
    /// Category stored in `activity_logs.log_name`.
    pub enum LogName {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        File => "file",
        Comment => "comment",
        Default => "default",
    }
}

// ---------------------------------------------------------------------------
// Action-to-category mapping
// ---------------------------------------------------------------------------

/// Map an action name to its log category.
///
/// Unknown actions fall back to [`LogName::Default`].
pub fn log_name_for(action: &str) -> LogName {
    match action {
        "created" | "scheduled" => LogName::Created,
        "updated" => LogName::Updated,
        "deleted" => LogName::Deleted,
        "mentioned_users" => LogName::Comment,
        a if a.starts_with("file_") => LogName::File,
        _ => LogName::Default,
    }
}

/// `"{EntityKind} {action with spaces}"`, e.g. `"Deliverable file uploaded"`.
pub fn describe(subject: &EntityRef, action: &str) -> String {
    format!("{} {}", subject.kind().display_name(), action.replace('_', " "))
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Keys whose values never reach the activity log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "secret",
    "token",
    "api_key",
    "private_key",
    "authorization",
];

/// Replace the value of any key containing a [`SENSITIVE_FIELDS`] entry with
/// `"[REDACTED]"`, recursing into nested objects and arrays.
pub fn redact_sensitive_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(key.clone(), Value::String("[REDACTED]".to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(redact_sensitive_fields).collect()),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// ActivityEntry
// ---------------------------------------------------------------------------

/// A fully prepared activity-log row, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub log_name: LogName,
    pub description: String,
    pub subject: EntityRef,
    pub causer: Option<EntityRef>,
    pub user_id: Option<UserId>,
    pub properties: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ActivityEntry {
    /// Build the entry for `action` on `subject` performed by `causer`.
    ///
    /// `properties` is redacted before it is stored on the entry.
    pub fn for_action(
        subject: EntityRef,
        action: &DomainAction,
        causer: Option<UserId>,
        properties: &Value,
    ) -> Self {
        Self {
            log_name: log_name_for(action.as_str()),
            description: describe(&subject, action.as_str()),
            subject,
            causer: causer.map(EntityRef::User),
            user_id: causer,
            properties: redact_sensitive_fields(properties),
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{CommentAction, DeliverableAction, MeetingAction, ProjectAction};
    use crate::types::DeliverableId;

    #[test]
    fn created_and_scheduled_map_to_created() {
        assert_eq!(log_name_for("created"), LogName::Created);
        assert_eq!(log_name_for(MeetingAction::Scheduled.as_str()), LogName::Created);
    }

    #[test]
    fn crud_names_map_to_their_categories() {
        assert_eq!(log_name_for("updated"), LogName::Updated);
        assert_eq!(log_name_for("deleted"), LogName::Deleted);
    }

    #[test]
    fn file_actions_map_to_file() {
        for action in [
            DeliverableAction::FileUploaded,
            DeliverableAction::FileDownloaded,
            DeliverableAction::FileDeleted,
        ] {
            assert_eq!(log_name_for(action.as_str()), LogName::File);
        }
    }

    #[test]
    fn mentions_map_to_comment() {
        assert_eq!(log_name_for(CommentAction::MentionedUsers.as_str()), LogName::Comment);
    }

    #[test]
    fn other_actions_map_to_default() {
        assert_eq!(log_name_for(ProjectAction::StatusChanged.as_str()), LogName::Default);
        assert_eq!(log_name_for("approved"), LogName::Default);
        assert_eq!(log_name_for(""), LogName::Default);
    }

    #[test]
    fn description_replaces_underscores() {
        let subject = EntityRef::Deliverable(DeliverableId::new());
        assert_eq!(describe(&subject, "file_uploaded"), "Deliverable file uploaded");
    }

    #[test]
    fn redacts_nested_sensitive_keys() {
        let input = serde_json::json!({
            "name": "Staging DB",
            "password": "hunter2",
            "nested": { "api_key": "abc", "ok": 1 },
            "list": [{ "temporary_password": "x" }]
        });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["name"], "Staging DB");
        assert_eq!(out["password"], "[REDACTED]");
        assert_eq!(out["nested"]["api_key"], "[REDACTED]");
        assert_eq!(out["nested"]["ok"], 1);
        assert_eq!(out["list"][0]["temporary_password"], "[REDACTED]");
    }

    #[test]
    fn entry_without_causer_has_no_user() {
        let entry = ActivityEntry::for_action(
            EntityRef::Deliverable(DeliverableId::new()),
            &DeliverableAction::Approved.into(),
            None,
            &serde_json::json!({}),
        );
        assert!(entry.causer.is_none());
        assert!(entry.user_id.is_none());
        assert!(entry.ip_address.is_none());
        assert_eq!(entry.description, "Deliverable approved");
    }
}
