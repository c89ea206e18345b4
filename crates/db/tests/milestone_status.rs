//! Integration tests for milestone status transitions.
//!
//! Concurrent transitions to the same status must see distinct previous
//! statuses, so exactly one of them reports the change.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use portal_core::milestone::MilestoneStatus;
use sqlx::PgPool;
use tokio::sync::Barrier;
use uuid::Uuid;

use portal_db::models::milestone::CreateMilestone;
use portal_db::models::project::CreateProject;
use portal_db::repositories::{MilestoneRepo, ProjectRepo};

async fn seed_milestone(pool: &PgPool) -> Uuid {
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            client_id: None,
            name: "Status".to_string(),
            description: None,
            status: None,
            budget_cents: None,
            currency: None,
            start_date: None,
            due_date: None,
        },
    )
    .await
    .unwrap();

    MilestoneRepo::create(
        pool,
        project.id,
        &CreateMilestone {
            name: "Design".to_string(),
            description: None,
            start_date: None,
            due_date: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_completion_changes_status_once(pool: PgPool) {
    let id = seed_milestone(&pool).await;
    let barrier = Arc::new(Barrier::new(2));

    let tasks = (0..2).map(|_| {
        let pool = pool.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            MilestoneRepo::set_status(&pool, id, MilestoneStatus::Completed, Utc::now())
                .await
                .unwrap()
                .unwrap()
        })
    });
    let changes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let from_pending = changes
        .iter()
        .filter(|c| c.from == MilestoneStatus::Pending)
        .count();
    let from_completed = changes
        .iter()
        .filter(|c| c.from == MilestoneStatus::Completed)
        .count();
    assert_eq!(from_pending, 1);
    assert_eq!(from_completed, 1);
    assert!(changes
        .iter()
        .all(|c| c.milestone.status == MilestoneStatus::Completed));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn completion_stamp_survives_repeat_and_clears_on_reopen(pool: PgPool) {
    let id = seed_milestone(&pool).await;

    let first = MilestoneRepo::set_status(&pool, id, MilestoneStatus::Completed, Utc::now())
        .await
        .unwrap()
        .unwrap();
    let stamped = first.milestone.completed_at;
    assert!(stamped.is_some());

    let repeat = MilestoneRepo::set_status(&pool, id, MilestoneStatus::Completed, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(repeat.from, MilestoneStatus::Completed);
    assert_eq!(repeat.milestone.completed_at, stamped);

    let reopened = MilestoneRepo::set_status(&pool, id, MilestoneStatus::InProgress, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.from, MilestoneStatus::Completed);
    assert_eq!(reopened.milestone.completed_at, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn missing_milestone_has_no_transition(pool: PgPool) {
    let change =
        MilestoneRepo::set_status(&pool, Uuid::new_v4(), MilestoneStatus::Completed, Utc::now())
            .await
            .unwrap();
    assert!(change.is_none());
}
