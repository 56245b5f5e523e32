mod common;

use std::sync::Arc;
use sea_orm::{ConnectOptions, Database};
use serde_json::json;
use defect_tracker::model::{AssignDefect, DefectFilter, DefectStatus, ErrorKind, Role};
use defect_tracker::seed::{init_demo_data, reset_demo_data};
use defect_tracker::storage::{Collection, DatabaseStorage, Storage};
use defect_tracker::{DefectApi, DefectLifecycle};
use common::{crack, seed_reference_data, ENGINEER_ID};

async fn sqlite_storage() -> DatabaseStorage {
    // A single pooled connection keeps the in-memory database alive.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("sqlite connects");
    let storage = DatabaseStorage::new(db);
    storage.migrate().await.expect("migrations run");
    storage
}

#[tokio::test]
async fn missing_collection_reads_as_empty() {
    let storage = sqlite_storage().await;

    assert!(storage.get(Collection::Defects).await.unwrap().is_empty());
}

#[tokio::test]
async fn put_replaces_and_clear_removes() {
    let storage = sqlite_storage().await;

    storage.put(Collection::Users, vec![json!({ "id": 1 })]).await.unwrap();
    storage
        .put(Collection::Users, vec![json!({ "id": 2 }), json!({ "id": 3 })])
        .await
        .unwrap();
    assert_eq!(
        storage.get(Collection::Users).await.unwrap(),
        vec![json!({ "id": 2 }), json!({ "id": 3 })]
    );

    storage.clear(Collection::Users).await.unwrap();
    assert!(storage.get(Collection::Users).await.unwrap().is_empty());
}

#[tokio::test]
async fn lifecycle_persists_through_sqlite() {
    let storage = Arc::new(sqlite_storage().await);
    seed_reference_data(storage.as_ref()).await;
    let lifecycle = DefectLifecycle::new(storage.clone());

    let defect = lifecycle.create_defect(Role::Engineer, crack()).await.unwrap();
    lifecycle
        .assign_defect(Role::Manager, &defect.id, AssignDefect {
            assignee_id: ENGINEER_ID,
            due_date: None,
            comment: None,
        })
        .await
        .unwrap();
    lifecycle.submit_for_review(Role::Engineer, &defect.id, None).await.unwrap();
    lifecycle
        .close_defect(Role::Manager, &defect.id, Some("done".to_string()))
        .await
        .unwrap();

    // a fresh manager over the same connection sees the committed state
    let reopened = DefectLifecycle::new(storage.clone());
    let stored = reopened.get_defect(&defect.id).await.unwrap();
    assert_eq!(stored.status, DefectStatus::Closed);
    assert!(stored.closed_at.is_some());
    assert_eq!(reopened.history(&defect.id).await.unwrap().len(), 4);
    assert_eq!(reopened.comments(&defect.id).await.unwrap().len(), 1);

    let err = reopened.cancel_defect(Role::Director, &defect.id, "late").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn demo_data_is_seeded_once() {
    let storage = Arc::new(sqlite_storage().await);

    assert!(init_demo_data(storage.as_ref()).await.unwrap());
    assert!(!init_demo_data(storage.as_ref()).await.unwrap());

    let api = DefectApi::new(storage.clone());
    let defects = api.list_defects(&DefectFilter::default()).await.unwrap().data.unwrap();
    assert_eq!(defects.len(), 12);

    let engineers = api.list_users(Some(Role::Engineer)).await.unwrap().data.unwrap();
    assert!(!engineers.is_empty());
    assert!(engineers.iter().all(|u| u.role == Role::Engineer));

    let summaries = api.project_summaries().await.unwrap().data.unwrap();
    let total: usize = summaries.iter().map(|s| s.total_defects).sum();
    assert_eq!(total, 12);
}

#[tokio::test]
async fn reset_discards_changes() {
    let storage = Arc::new(sqlite_storage().await);
    init_demo_data(storage.as_ref()).await.unwrap();
    let lifecycle = DefectLifecycle::new(storage.clone());

    let mut request = crack();
    request.project_id = 1;
    lifecycle.create_defect(Role::Engineer, request).await.unwrap();
    assert_eq!(lifecycle.list_defects(&DefectFilter::default()).await.unwrap().len(), 13);

    reset_demo_data(storage.as_ref()).await.unwrap();
    assert_eq!(lifecycle.list_defects(&DefectFilter::default()).await.unwrap().len(), 12);
}
