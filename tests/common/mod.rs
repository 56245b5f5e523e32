#![allow(dead_code)]

use std::sync::Arc;
use serde_json::json;
use defect_tracker::model::{DefectCategory, DefectPriority, NewDefect};
use defect_tracker::storage::{Collection, MemoryStorage, Storage};
use defect_tracker::DefectLifecycle;

pub const ENGINEER_ID: i32 = 7;
pub const MANAGER_ID: i32 = 5;

/// One project, one engineer (id 7) and one manager (id 5).
pub async fn seed_reference_data(storage: &dyn Storage) {
    storage
        .put_all(vec![
            (Collection::Projects, vec![json!({
                "id": 1,
                "name": "ЖК Новостройка",
                "address": "г. Москва, ул. Ленина 10",
                "description": "Жилой комплекс",
                "customer": "ООО Строй-Инвест",
                "startDate": "2025-01-15",
                "endDate": "2025-12-31",
                "status": "active",
                "createdAt": "2025-01-10T10:00:00Z"
            })]),
            (Collection::Users, vec![
                json!({ "id": ENGINEER_ID, "name": "Engineer", "email": "engineer@example.com", "role": "engineer" }),
                json!({ "id": MANAGER_ID, "name": "Manager", "email": "manager@example.com", "role": "manager" }),
            ]),
        ])
        .await
        .expect("reference data is written");
}

pub async fn memory_lifecycle() -> (DefectLifecycle, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    seed_reference_data(storage.as_ref()).await;
    (DefectLifecycle::new(storage.clone()), storage)
}

pub fn crack() -> NewDefect {
    NewDefect {
        project_id: 1,
        title: "Crack".to_string(),
        description: "desc".to_string(),
        location: "Floor 2".to_string(),
        category: DefectCategory::Walls,
        priority: Some(DefectPriority::Critical),
        due_date: None,
    }
}
