//! Request handlers, one module per resource.
//!
//! Every mutating handler follows the same order: resolve the caller, load
//! the target and check the policy, mutate, then dispatch the domain event.
//! An error in an earlier step returns before anything is dispatched.

pub mod activity;
pub mod client;
pub mod comment;
pub mod credential;
pub mod deliverable;
pub mod deliverable_file;
pub mod meeting;
pub mod milestone;
pub mod notification;
pub mod project;

use portal_core::actions::DomainAction;
use portal_core::error::CoreError;
use portal_core::types::EntityRef;
use portal_db::models::deliverable::Deliverable;
use portal_db::models::milestone::Milestone;
use portal_db::models::project::Project;
use portal_db::repositories::{DeliverableRepo, MilestoneRepo, ProjectRepo};
use portal_db::DbPool;
use portal_events::DomainEvent;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// A domain event attributed to the caller and their request.
pub(crate) fn event_for(
    user: &AuthUser,
    subject: EntityRef,
    action: impl Into<DomainAction>,
) -> DomainEvent {
    DomainEvent::new(subject, action)
        .with_actor(user.event_actor())
        .with_context(user.context.clone())
}

pub(crate) async fn find_project(pool: &DbPool, id: Uuid) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", id).into())
}

pub(crate) async fn find_milestone(pool: &DbPool, id: Uuid) -> AppResult<Milestone> {
    MilestoneRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Milestone", id).into())
}

pub(crate) async fn find_deliverable(pool: &DbPool, id: Uuid) -> AppResult<Deliverable> {
    DeliverableRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Deliverable", id).into())
}
