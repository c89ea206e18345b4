//! PostgreSQL-backed stores.

use async_trait::async_trait;
use portal_core::activity::ActivityEntry;
use portal_core::types::{EntityRef, UserId};
use portal_db::models::notification::CreateNotification;
use portal_db::repositories::project_repo::OwnedTable;
use portal_db::repositories::{ActivityLogRepo, NotificationRepo, ProjectRepo, UserRepo};
use portal_db::DbPool;
use uuid::Uuid;

use crate::activity::ActivityStore;
use crate::error::Error;
use crate::router::NotificationDirectory;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn record(&self, entry: ActivityEntry) -> Result<(), Error> {
        ActivityLogRepo::create(&self.pool, &entry).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationDirectory for PgStore {
    async fn project_client(&self, subject: &EntityRef) -> Result<Option<UserId>, Error> {
        let client = match subject {
            EntityRef::Project(id) => ProjectRepo::find_by_id(&self.pool, id.as_uuid())
                .await?
                .and_then(|p| p.client_id),
            EntityRef::Milestone(id) => {
                ProjectRepo::client_for_child(&self.pool, OwnedTable::Milestones, id.as_uuid())
                    .await?
            }
            EntityRef::Deliverable(id) => {
                ProjectRepo::client_for_child(&self.pool, OwnedTable::Deliverables, id.as_uuid())
                    .await?
            }
            EntityRef::Meeting(id) => {
                ProjectRepo::client_for_child(&self.pool, OwnedTable::Meetings, id.as_uuid())
                    .await?
            }
            _ => None,
        };
        Ok(client.map(UserId))
    }

    async fn existing_users(&self, ids: &[UserId]) -> Result<Vec<UserId>, Error> {
        let raw: Vec<Uuid> = ids.iter().map(UserId::as_uuid).collect();
        let found = UserRepo::find_by_ids(&self.pool, &raw).await?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| found.iter().any(|u| u.id == id.as_uuid()))
            .collect())
    }

    async fn create_notification(&self, notification: CreateNotification) -> Result<(), Error> {
        NotificationRepo::create(&self.pool, &notification).await?;
        Ok(())
    }
}
