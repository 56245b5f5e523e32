//! Demo reference data written to an empty store on first run.

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{info, instrument};
use crate::model::{Changes, Comment, Defect, DefectStatus, HistoryAction, HistoryEntry, Project, Role, User};
use crate::storage::{encode, Collection, Storage, StorageError};

pub struct DemoData {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub defects: Vec<Defect>,
    pub comments: Vec<Comment>,
    pub history: Vec<HistoryEntry>,
}

/// Seeds the store once. Returns `false` when it was already initialized.
#[instrument(skip(storage))]
pub async fn init_demo_data(storage: &dyn Storage) -> Result<bool, StorageError> {
    let meta = storage.get(Collection::Meta).await?;
    let initialized = meta
        .iter()
        .any(|record| record.get("demoInitialized").and_then(Value::as_bool) == Some(true));

    if initialized {
        info!("demo data already present");
        return Ok(false);
    }

    let data = demo_data()?;
    info!(
        users = data.users.len(),
        projects = data.projects.len(),
        defects = data.defects.len(),
        "seeding demo data"
    );

    storage
        .put_all(vec![
            (Collection::Users, encode(Collection::Users, &data.users)?),
            (Collection::Projects, encode(Collection::Projects, &data.projects)?),
            (Collection::Defects, encode(Collection::Defects, &data.defects)?),
            (Collection::Comments, encode(Collection::Comments, &data.comments)?),
            (Collection::History, encode(Collection::History, &data.history)?),
            (Collection::Meta, vec![json!({ "demoInitialized": true })]),
        ])
        .await?;

    Ok(true)
}

/// Drops every collection and seeds again.
#[instrument(skip(storage))]
pub async fn reset_demo_data(storage: &dyn Storage) -> Result<(), StorageError> {
    for collection in Collection::ALL {
        storage.clear(collection).await?;
    }
    init_demo_data(storage).await?;
    Ok(())
}

pub fn demo_data() -> Result<DemoData, StorageError> {
    let defects: Vec<Defect> = decode(Collection::Defects, demo_defects())?;
    let history = history_for(&defects);

    Ok(DemoData {
        users: decode(Collection::Users, demo_users())?,
        projects: decode(Collection::Projects, demo_projects())?,
        comments: decode(Collection::Comments, demo_comments())?,
        defects,
        history,
    })
}

fn decode<T: DeserializeOwned>(collection: Collection, records: Value) -> Result<Vec<T>, StorageError> {
    serde_json::from_value(records).map_err(|source| StorageError::Corrupted { collection, source })
}

/// Rebuilds a plausible audit trail for seeded defects.
fn history_for(defects: &[Defect]) -> Vec<HistoryEntry> {
    let mut history = Vec::new();
    let mut push = |defect: &Defect, action, author, changes: Changes, at| {
        history.push(HistoryEntry {
            id: history.len() as i64 + 1,
            defect_id: defect.id.clone(),
            action,
            author,
            changes: changes.into_map(),
            timestamp: at,
        });
    };

    for defect in defects {
        push(
            defect,
            HistoryAction::Create,
            defect.created_by,
            Changes::new().set("status", DefectStatus::New),
            defect.created_at,
        );

        if let Some(assignee) = defect.assigned_to {
            push(
                defect,
                HistoryAction::Assign,
                Role::Manager,
                Changes::new()
                    .set("assignedTo", assignee)
                    .set("status", DefectStatus::InProgress)
                    .set_opt("dueDate", defect.due_date),
                defect.created_at + Duration::hours(1),
            );
        }

        if matches!(defect.status, DefectStatus::OnReview | DefectStatus::Closed) {
            let reviewed_at = defect
                .closed_at
                .map(|closed| closed - Duration::hours(2))
                .unwrap_or(defect.created_at + Duration::days(1));
            push(
                defect,
                HistoryAction::StatusChange,
                Role::Engineer,
                Changes::new().set("status", DefectStatus::OnReview),
                reviewed_at,
            );
        }

        if let Some(closed_at) = defect.closed_at {
            push(
                defect,
                HistoryAction::Close,
                Role::Manager,
                Changes::new()
                    .set("status", DefectStatus::Closed)
                    .set("closedAt", closed_at),
                closed_at,
            );
        }

        if let Some(reason) = &defect.cancel_reason {
            push(
                defect,
                HistoryAction::Cancel,
                Role::Manager,
                Changes::new()
                    .set("status", DefectStatus::Cancelled)
                    .set("cancelReason", reason),
                defect.created_at + Duration::days(2),
            );
        }
    }

    history
}

fn demo_users() -> Value {
    json!([
        { "id": 1, "name": "Иван Петров", "email": "i.petrov@example.com", "role": "engineer" },
        { "id": 2, "name": "Мария Сидорова", "email": "m.sidorova@example.com", "role": "engineer" },
        { "id": 3, "name": "Сергей Волков", "email": "s.volkov@example.com", "role": "engineer" },
        { "id": 4, "name": "Елена Морозова", "email": "e.morozova@example.com", "role": "engineer" },
        { "id": 5, "name": "Алексей Кузнецов", "email": "a.kuznetsov@example.com", "role": "manager" },
        { "id": 6, "name": "Наталья Орлова", "email": "n.orlova@example.com", "role": "manager" },
        { "id": 7, "name": "Владимир Лебедев", "email": "v.lebedev@example.com", "role": "manager" },
        { "id": 8, "name": "Ольга Смирнова", "email": "o.smirnova@example.com", "role": "director" },
        { "id": 9, "name": "Игорь Соколов", "email": "i.sokolov@example.com", "role": "director" }
    ])
}

fn demo_projects() -> Value {
    json!([
        {
            "id": 1, "name": "ЖК Новостройка", "address": "г. Москва, ул. Ленина 10",
            "description": "Строительство жилого комплекса на 300 квартир", "customer": "ООО Строй-Инвест",
            "startDate": "2025-01-15", "endDate": "2025-12-31", "status": "active",
            "createdAt": "2025-01-10T10:00:00Z"
        },
        {
            "id": 2, "name": "Бизнес-центр Альфа", "address": "г. Санкт-Петербург, Невский пр. 50",
            "description": "Строительство бизнес-центра класса А", "customer": "АО Альфа-Строй",
            "startDate": "2024-06-01", "endDate": "2025-06-30", "status": "active",
            "createdAt": "2024-05-15T10:00:00Z"
        },
        {
            "id": 3, "name": "ТЦ Мегаполис", "address": "г. Москва, ул. Строителей 25",
            "description": "Торгово-развлекательный центр площадью 50000 кв.м", "customer": "ООО Ритейл-Групп",
            "startDate": "2024-03-01", "endDate": "2025-09-30", "status": "active",
            "createdAt": "2024-02-20T10:00:00Z"
        },
        {
            "id": 4, "name": "Производственный комплекс", "address": "г. Екатеринбург, ул. Индустриальная 15",
            "description": "Многоэтажное производственное здание с офисами", "customer": "ПАО Индустрия",
            "startDate": "2024-09-01", "endDate": "2025-08-31", "status": "active",
            "createdAt": "2024-08-20T10:00:00Z"
        },
        {
            "id": 5, "name": "Жилой комплекс Премиум", "address": "г. Санкт-Петербург, Крестовский остров",
            "description": "Элитный жилой комплекс с 150 апартаментами", "customer": "ООО Премиум Девелопмент",
            "startDate": "2024-04-10", "endDate": "2025-11-30", "status": "paused",
            "createdAt": "2024-03-25T10:00:00Z"
        },
        {
            "id": 6, "name": "Офисный центр Гарант", "address": "г. Москва, Лаврушинский переулок 5",
            "description": "Офисный комплекс 6 этажей в центре города", "customer": "ОАО Гарант",
            "startDate": "2023-06-01", "endDate": "2024-12-31", "status": "completed",
            "createdAt": "2023-05-15T10:00:00Z"
        }
    ])
}

fn demo_defects() -> Value {
    json!([
        {
            "id": "DF-20251001-0001", "projectId": 1, "title": "Трещина в несущей стене",
            "description": "Обнаружена вертикальная трещина шириной 2мм в несущей стене подъезда 2.",
            "priority": "critical", "category": "walls", "location": "Подъезд 2, этаж 5",
            "status": "new", "assignedTo": null, "dueDate": "2025-10-15", "closedAt": null,
            "createdBy": "engineer", "createdAt": "2025-10-01T09:00:00Z"
        },
        {
            "id": "DF-20251003-0002", "projectId": 1, "title": "Протечка кровли",
            "description": "Обнаружена протечка в секции Б после сильного дождя.",
            "priority": "critical", "category": "roof", "location": "Секция Б, кровля",
            "status": "new", "assignedTo": null, "dueDate": "2025-10-08", "closedAt": null,
            "createdBy": "engineer", "createdAt": "2025-10-03T14:30:00Z"
        },
        {
            "id": "DF-20251004-0003", "projectId": 2, "title": "Неровность напольного покрытия",
            "description": "В квартире 52 перепад высот пола до 3см.",
            "priority": "high", "category": "finishing", "location": "Подъезд 3, этаж 7, кв. 52",
            "status": "in_progress", "assignedTo": 2, "dueDate": "2025-10-25", "closedAt": null,
            "createdBy": "engineer", "createdAt": "2025-10-04T11:20:00Z"
        },
        {
            "id": "DF-20251005-0004", "projectId": 2, "title": "Проблемы с вентиляцией",
            "description": "На этаже 8 система вентиляции работает с повышенным шумом.",
            "priority": "high", "category": "engineering", "location": "Этаж 8, офис 801",
            "status": "in_progress", "assignedTo": 1, "dueDate": "2025-10-18", "closedAt": null,
            "createdBy": "manager", "createdAt": "2025-10-05T10:15:00Z"
        },
        {
            "id": "DF-20251007-0005", "projectId": 3, "title": "Недостаточная гидроизоляция",
            "description": "В подвальных помещениях обнаружены признаки сырости.",
            "priority": "high", "category": "foundation", "location": "Подвал, западная стена",
            "status": "in_progress", "assignedTo": 4, "dueDate": "2025-10-22", "closedAt": null,
            "createdBy": "engineer", "createdAt": "2025-10-07T08:00:00Z"
        },
        {
            "id": "DF-20251008-0006", "projectId": 3, "title": "Косметические дефекты окраски",
            "description": "В холле главного входа обнаружены следы подтеков краски.",
            "priority": "medium", "category": "finishing", "location": "Главный вход, холл",
            "status": "on_review", "assignedTo": 2, "dueDate": "2025-10-10", "closedAt": null,
            "createdBy": "engineer", "createdAt": "2025-10-08T13:45:00Z"
        },
        {
            "id": "DF-20251010-0007", "projectId": 4, "title": "Утечка в системе отопления",
            "description": "Обнаружена утечка в соединении труб на 3-м этаже.",
            "priority": "medium", "category": "engineering", "location": "3-й этаж, техническое помещение",
            "status": "on_review", "assignedTo": 3, "dueDate": "2025-10-14", "closedAt": null,
            "createdBy": "engineer", "createdAt": "2025-10-10T11:00:00Z"
        },
        {
            "id": "DF-20251002-0008", "projectId": 4, "title": "Установка окон с браком",
            "description": "Несколько окон установлены с нарушением уровня.",
            "priority": "medium", "category": "finishing", "location": "Западный фасад",
            "status": "closed", "assignedTo": 2, "dueDate": "2025-10-05", "closedAt": "2025-10-08T16:30:00Z",
            "createdBy": "engineer", "createdAt": "2025-10-02T08:00:00Z"
        },
        {
            "id": "DF-20250928-0009", "projectId": 1, "title": "Дефект кровельного покрытия",
            "description": "Участок кровельного материала поврежден и требует замены.",
            "priority": "high", "category": "roof", "location": "Секция А, участок 12",
            "status": "closed", "assignedTo": 1, "dueDate": "2025-09-30", "closedAt": "2025-10-01T10:00:00Z",
            "createdBy": "engineer", "createdAt": "2025-09-28T15:30:00Z"
        },
        {
            "id": "DF-20250918-0010", "projectId": 5, "title": "Проблемы с дверными проёмами",
            "description": "Дверные проёмы не соответствуют стандартным размерам.",
            "priority": "low", "category": "finishing", "location": "Этажи 1-3",
            "status": "closed", "assignedTo": 3, "dueDate": "2025-09-20", "closedAt": "2025-09-22T11:30:00Z",
            "createdBy": "engineer", "createdAt": "2025-09-18T09:00:00Z"
        },
        {
            "id": "DF-20241101-0011", "projectId": 6, "title": "Усадка фундамента",
            "description": "Обнаружена неравномерная усадка фундамента, требуется мониторинг.",
            "priority": "low", "category": "foundation", "location": "Западный край здания",
            "status": "cancelled", "assignedTo": null, "dueDate": "2024-11-30", "closedAt": null,
            "cancelReason": "Результаты мониторинга показали норму",
            "createdBy": "engineer", "createdAt": "2024-11-01T08:00:00Z"
        },
        {
            "id": "DF-20241110-0012", "projectId": 6, "title": "Требуется документация по материалам",
            "description": "Отсутствуют сертификаты качества на некоторые материалы.",
            "priority": "low", "category": "other", "location": "Архив проекта",
            "status": "cancelled", "assignedTo": null, "dueDate": "2024-12-15", "closedAt": null,
            "cancelReason": "Документы найдены и предоставлены",
            "createdBy": "manager", "createdAt": "2024-11-10T11:00:00Z"
        }
    ])
}

fn demo_comments() -> Value {
    json!([
        {
            "id": 1, "defectId": "DF-20251001-0001", "author": "engineer", "createdAt": "2025-10-01T10:30:00Z",
            "text": "Требуется срочная консультация специалиста."
        },
        {
            "id": 2, "defectId": "DF-20251001-0001", "author": "manager", "createdAt": "2025-10-01T11:15:00Z",
            "text": "Согласен. Назначу опытного инженера."
        },
        {
            "id": 3, "defectId": "DF-20251004-0003", "author": "engineer", "createdAt": "2025-10-05T14:00:00Z",
            "text": "Проведено первоначальное выравнивание. Необходимо дополнительное шпатлевание."
        },
        {
            "id": 4, "defectId": "DF-20251005-0004", "author": "engineer", "createdAt": "2025-10-06T10:00:00Z",
            "text": "Диагностика завершена. Проблема в забитом фильтре вентиляции."
        },
        {
            "id": 5, "defectId": "DF-20251008-0006", "author": "engineer", "createdAt": "2025-10-09T15:00:00Z",
            "text": "Основание подготовлено. Готов к финальной проверке."
        },
        {
            "id": 6, "defectId": "DF-20251002-0008", "author": "manager", "createdAt": "2025-10-08T17:00:00Z",
            "text": "Спасибо за качественную работу. Окна идеально установлены."
        },
        {
            "id": 7, "defectId": "DF-20241101-0011", "author": "engineer", "createdAt": "2024-11-28T15:00:00Z",
            "text": "Первые результаты мониторинга показали стабилизацию."
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::id::is_valid_defect_id;
    use crate::storage::{load, MemoryStorage};

    #[test]
    fn demo_data_respects_defect_invariants() {
        let data = demo_data().unwrap();

        for defect in &data.defects {
            assert!(is_valid_defect_id(&defect.id), "{}", defect.id);
            assert_eq!(defect.closed_at.is_some(), defect.status == DefectStatus::Closed, "{}", defect.id);
            assert_eq!(defect.cancel_reason.is_some(), defect.status == DefectStatus::Cancelled, "{}", defect.id);
            if defect.status.requires_assignee() {
                assert!(defect.assigned_to.is_some(), "{}", defect.id);
            }
            assert!(data.projects.iter().any(|p| p.id == defect.project_id));
        }

        let mut ids: Vec<&str> = data.defects.iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), data.defects.len());
    }

    #[test]
    fn every_demo_defect_has_a_create_entry() {
        let data = demo_data().unwrap();
        for defect in &data.defects {
            let created = data
                .history
                .iter()
                .filter(|h| h.defect_id == defect.id && h.action == HistoryAction::Create)
                .count();
            assert_eq!(created, 1);
        }
    }

    #[tokio::test]
    async fn seeds_only_once() {
        let storage = MemoryStorage::new();

        assert!(init_demo_data(&storage).await.unwrap());
        let users: Vec<User> = load(&storage, Collection::Users).await.unwrap();
        assert_eq!(users.len(), 9);

        storage.clear(Collection::Users).await.unwrap();
        assert!(!init_demo_data(&storage).await.unwrap());
        assert!(storage.get(Collection::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_restores_seed() {
        let storage = MemoryStorage::new();
        init_demo_data(&storage).await.unwrap();
        storage.clear(Collection::Defects).await.unwrap();

        reset_demo_data(&storage).await.unwrap();

        let defects: Vec<Defect> = load(&storage, Collection::Defects).await.unwrap();
        assert_eq!(defects.len(), 12);
    }
}
