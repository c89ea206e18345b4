//! Notification subscriber.
//!
//! Looks up the rule for each event in [`portal_core::notification::rule_for`],
//! resolves the recipients and writes one notification per recipient. An
//! empty recipient list is skipped silently.

use std::sync::Arc;

use async_trait::async_trait;
use portal_core::comment::{mention_recipients, normalize_mentions};
use portal_core::notification::{rule_for, Recipients};
use portal_core::types::{EntityRef, UserId};
use portal_db::models::notification::CreateNotification;

use crate::error::Error;
use crate::event::DomainEvent;
use crate::subscriber::Subscriber;

/// What the router needs to know about users and projects, and where it
/// writes notifications.
#[async_trait]
pub trait NotificationDirectory: Send + Sync {
    /// The client of the project that owns `subject`, if any.
    async fn project_client(&self, subject: &EntityRef) -> Result<Option<UserId>, Error>;

    /// The subset of `ids` that are existing users, in input order.
    async fn existing_users(&self, ids: &[UserId]) -> Result<Vec<UserId>, Error>;

    async fn create_notification(&self, notification: CreateNotification) -> Result<(), Error>;
}

pub struct NotificationRouter {
    directory: Arc<dyn NotificationDirectory>,
}

impl NotificationRouter {
    pub fn new(directory: Arc<dyn NotificationDirectory>) -> Self {
        Self { directory }
    }

    async fn recipients(
        &self,
        recipients: Recipients,
        event: &DomainEvent,
    ) -> Result<Vec<UserId>, Error> {
        match recipients {
            Recipients::ProjectClient => Ok(self
                .directory
                .project_client(&event.subject)
                .await?
                .into_iter()
                .collect()),
            Recipients::MentionedUsers => {
                let mentioned = event.mentioned_users();
                let candidates = match event.actor_id() {
                    Some(author) => mention_recipients(&mentioned, author),
                    None => normalize_mentions(&mentioned),
                };
                if candidates.is_empty() {
                    return Ok(Vec::new());
                }
                self.directory.existing_users(&candidates).await
            }
        }
    }
}

#[async_trait]
impl Subscriber for NotificationRouter {
    fn name(&self) -> &'static str {
        "notification_router"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), Error> {
        let Some(rule) = rule_for(&event.subject, &event.action) else {
            return Ok(());
        };

        let recipients = self.recipients(rule.recipients, event).await?;
        if recipients.is_empty() {
            tracing::debug!(action = %event.action, "No notification recipients");
            return Ok(());
        }

        let data = rule.template.render(event.actor_name(), &event.metadata);
        for user_id in recipients {
            self.directory
                .create_notification(CreateNotification {
                    user_id: user_id.as_uuid(),
                    kind: rule.notification_type,
                    subject: event.subject,
                    data: data.clone(),
                })
                .await?;
        }
        Ok(())
    }
}
