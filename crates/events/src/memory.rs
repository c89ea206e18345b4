//! In-memory stores for tests and database-free runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use portal_core::activity::ActivityEntry;
use portal_core::types::{EntityRef, UserId};
use portal_db::models::notification::CreateNotification;

use crate::activity::ActivityStore;
use crate::error::Error;
use crate::router::NotificationDirectory;

#[derive(Default)]
struct State {
    activity: Vec<ActivityEntry>,
    notifications: Vec<CreateNotification>,
    project_clients: HashMap<EntityRef, UserId>,
    users: HashSet<UserId>,
}

/// Implements both store traits over plain collections.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an existing user.
    pub fn add_user(&self, id: UserId) {
        self.lock().users.insert(id);
    }

    /// Record that `subject` belongs to a project whose client is `client`.
    pub fn set_project_client(&self, subject: EntityRef, client: UserId) {
        let mut state = self.lock();
        state.users.insert(client);
        state.project_clients.insert(subject, client);
    }

    pub fn activity(&self) -> Vec<ActivityEntry> {
        self.lock().activity.clone()
    }

    pub fn notifications(&self) -> Vec<CreateNotification> {
        self.lock().notifications.clone()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn record(&self, entry: ActivityEntry) -> Result<(), Error> {
        self.lock().activity.push(entry);
        Ok(())
    }
}

#[async_trait]
impl NotificationDirectory for MemoryStore {
    async fn project_client(&self, subject: &EntityRef) -> Result<Option<UserId>, Error> {
        Ok(self.lock().project_clients.get(subject).copied())
    }

    async fn existing_users(&self, ids: &[UserId]) -> Result<Vec<UserId>, Error> {
        let state = self.lock();
        Ok(ids.iter().copied().filter(|id| state.users.contains(id)).collect())
    }

    async fn create_notification(&self, notification: CreateNotification) -> Result<(), Error> {
        self.lock().notifications.push(notification);
        Ok(())
    }
}
