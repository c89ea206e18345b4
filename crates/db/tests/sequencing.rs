//! Integration tests for per-scope sequence allocation.
//!
//! Exercises the repositories against a real database:
//! - Concurrent deliverable creates in one scope get distinct, gap-free orders
//! - Milestone-less deliverables share a scope per project
//! - Milestone reorder rewrites orders as 1..N
//! - Uploads flip `is_latest` and keep `deliverables.version` in step
//! - Deleting the latest file promotes the previous version

use futures::future::join_all;
use portal_core::deliverable::DeliverableType;
use sqlx::PgPool;
use uuid::Uuid;

use portal_db::models::deliverable::CreateDeliverable;
use portal_db::models::deliverable_file::CreateDeliverableFile;
use portal_db::models::milestone::CreateMilestone;
use portal_db::models::project::CreateProject;
use portal_db::repositories::{DeliverableFileRepo, DeliverableRepo, MilestoneRepo, ProjectRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_project(pool: &PgPool) -> Uuid {
    let input = CreateProject {
        client_id: None,
        name: "Sequencing".to_string(),
        description: None,
        status: None,
        budget_cents: None,
        currency: None,
        start_date: None,
        due_date: None,
    };
    ProjectRepo::create(pool, &input).await.unwrap().id
}

fn new_deliverable(milestone_id: Option<Uuid>, name: &str) -> CreateDeliverable {
    CreateDeliverable {
        milestone_id,
        name: name.to_string(),
        description: None,
        content: None,
        kind: DeliverableType::File,
    }
}

fn new_milestone(name: &str) -> CreateMilestone {
    CreateMilestone {
        name: name.to_string(),
        description: None,
        start_date: None,
        due_date: None,
    }
}

fn new_file(deliverable_id: Uuid, name: &str) -> CreateDeliverableFile {
    CreateDeliverableFile {
        deliverable_id,
        filename: format!("{}.pdf", Uuid::new_v4()),
        original_filename: name.to_string(),
        storage_path: format!("deliverables/test/{name}"),
        size_bytes: 1024,
        mime_type: Some("application/pdf".to_string()),
        uploaded_by: None,
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_deliverable_creates_get_distinct_orders(pool: PgPool) {
    let project_id = seed_project(&pool).await;

    let inputs: Vec<_> = (0..8).map(|i| new_deliverable(None, &format!("D{i}"))).collect();
    let results = join_all(
        inputs
            .iter()
            .map(|input| DeliverableRepo::create(&pool, project_id, input)),
    )
    .await;

    let mut orders: Vec<i32> = results.into_iter().map(|r| r.unwrap().sort_order).collect();
    orders.sort_unstable();
    assert_eq!(orders, (1..=8).collect::<Vec<_>>());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn orders_are_local_to_milestone_scope(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let milestone = MilestoneRepo::create(&pool, project_id, &new_milestone("M1"))
        .await
        .unwrap();

    let loose = DeliverableRepo::create(&pool, project_id, &new_deliverable(None, "loose"))
        .await
        .unwrap();
    let scoped = DeliverableRepo::create(
        &pool,
        project_id,
        &new_deliverable(Some(milestone.id), "scoped"),
    )
    .await
    .unwrap();

    assert_eq!(loose.sort_order, 1);
    assert_eq!(scoped.sort_order, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn milestone_reorder_rewrites_positions(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let m = MilestoneRepo::create(&pool, project_id, &new_milestone(name))
            .await
            .unwrap();
        ids.push(m.id);
    }
    ids.reverse();

    let positions = portal_core::ordering::positions(&ids);
    let reordered = MilestoneRepo::reorder(&pool, project_id, &positions)
        .await
        .unwrap();

    let names: Vec<_> = reordered.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["C", "B", "A"]);
    let orders: Vec<_> = reordered.iter().map(|m| m.sort_order).collect();
    assert_eq!(orders, [1, 2, 3]);
}

// ---------------------------------------------------------------------------
// File versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn upload_flips_latest_and_bumps_version(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let deliverable = DeliverableRepo::create(&pool, project_id, &new_deliverable(None, "Logo"))
        .await
        .unwrap();
    assert_eq!(deliverable.version, 1);

    let first = DeliverableFileRepo::create_latest(&pool, &new_file(deliverable.id, "a.pdf"))
        .await
        .unwrap();
    let second = DeliverableFileRepo::create_latest(&pool, &new_file(deliverable.id, "b.pdf"))
        .await
        .unwrap();
    assert_eq!((first.version, second.version), (1, 2));

    let files = DeliverableFileRepo::list_by_deliverable(&pool, deliverable.id)
        .await
        .unwrap();
    let latest: Vec<_> = files.iter().filter(|f| f.is_latest).collect();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].id, second.id);

    let reloaded = DeliverableRepo::find_by_id(&pool, deliverable.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.version, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn deleting_latest_file_promotes_previous(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let deliverable = DeliverableRepo::create(&pool, project_id, &new_deliverable(None, "Spec"))
        .await
        .unwrap();
    let first = DeliverableFileRepo::create_latest(&pool, &new_file(deliverable.id, "v1.pdf"))
        .await
        .unwrap();
    let second = DeliverableFileRepo::create_latest(&pool, &new_file(deliverable.id, "v2.pdf"))
        .await
        .unwrap();

    assert!(DeliverableFileRepo::soft_delete(&pool, second.id).await.unwrap());

    let latest = DeliverableFileRepo::find_latest(&pool, deliverable.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, first.id);

    // The deleted version number is not handed out again.
    let third = DeliverableFileRepo::create_latest(&pool, &new_file(deliverable.id, "v3.pdf"))
        .await
        .unwrap();
    assert_eq!(third.version, 3);
}
