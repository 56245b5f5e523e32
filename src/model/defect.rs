use std::fmt;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use crate::model::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectStatus {
    New,
    InProgress,
    OnReview,
    Closed,
    Cancelled,
    // reserved, no transition leads here
    NeedsManagement,
}

impl DefectStatus {
    pub const ALL: [DefectStatus; 6] = [
        DefectStatus::New,
        DefectStatus::InProgress,
        DefectStatus::OnReview,
        DefectStatus::Closed,
        DefectStatus::Cancelled,
        DefectStatus::NeedsManagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefectStatus::New => "new",
            DefectStatus::InProgress => "in_progress",
            DefectStatus::OnReview => "on_review",
            DefectStatus::Closed => "closed",
            DefectStatus::Cancelled => "cancelled",
            DefectStatus::NeedsManagement => "needs_management",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefectStatus::New => "Новая",
            DefectStatus::InProgress => "В работе",
            DefectStatus::OnReview => "На проверке",
            DefectStatus::Closed => "Закрыта",
            DefectStatus::Cancelled => "Отменена",
            DefectStatus::NeedsManagement => "Требует решения руководства",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DefectStatus::Closed | DefectStatus::Cancelled)
    }

    /// Statuses in which a defect must have an assignee.
    pub fn requires_assignee(&self) -> bool {
        matches!(self, DefectStatus::InProgress | DefectStatus::OnReview | DefectStatus::Closed)
    }
}

impl fmt::Display for DefectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl DefectPriority {
    pub const ALL: [DefectPriority; 4] = [
        DefectPriority::Critical,
        DefectPriority::High,
        DefectPriority::Medium,
        DefectPriority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefectPriority::Low => "low",
            DefectPriority::Medium => "medium",
            DefectPriority::High => "high",
            DefectPriority::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefectPriority::Low => "Низкий",
            DefectPriority::Medium => "Средний",
            DefectPriority::High => "Высокий",
            DefectPriority::Critical => "Критический",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectCategory {
    Foundation,
    Walls,
    Roof,
    Engineering,
    Finishing,
    Other,
}

impl DefectCategory {
    pub const ALL: [DefectCategory; 6] = [
        DefectCategory::Foundation,
        DefectCategory::Walls,
        DefectCategory::Roof,
        DefectCategory::Engineering,
        DefectCategory::Finishing,
        DefectCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefectCategory::Foundation => "foundation",
            DefectCategory::Walls => "walls",
            DefectCategory::Roof => "roof",
            DefectCategory::Engineering => "engineering",
            DefectCategory::Finishing => "finishing",
            DefectCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefectCategory::Foundation => "Фундамент",
            DefectCategory::Walls => "Стены",
            DefectCategory::Roof => "Кровля",
            DefectCategory::Engineering => "Инженерные сети",
            DefectCategory::Finishing => "Отделка",
            DefectCategory::Other => "Другое",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defect {
    pub id: String,
    pub project_id: i32,
    pub title: String,
    pub description: String,
    pub priority: DefectPriority,
    pub category: DefectCategory,
    pub location: String,
    pub status: DefectStatus,
    pub assigned_to: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_by: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Defect {
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// A due date counts from midnight UTC of that day.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if self.is_open() => due.and_time(NaiveTime::MIN).and_utc() < now,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDefect {
    pub project_id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: DefectCategory,
    #[serde(default)]
    pub priority: Option<DefectPriority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDefect {
    pub assignee_id: i32,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// AND-combined filter; `None` fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectFilter {
    pub project_id: Option<i32>,
    pub status: Option<DefectStatus>,
    pub priority: Option<DefectPriority>,
    pub category: Option<DefectCategory>,
}

impl DefectFilter {
    pub fn for_project(project_id: i32) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, defect: &Defect) -> bool {
        self.project_id.map_or(true, |id| defect.project_id == id)
            && self.status.map_or(true, |s| defect.status == s)
            && self.priority.map_or(true, |p| defect.priority == p)
            && self.category.map_or(true, |c| defect.category == c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn defect(status: DefectStatus, due_date: Option<NaiveDate>) -> Defect {
        Defect {
            id: "DF-20251001-0001".to_string(),
            project_id: 1,
            title: "Crack".to_string(),
            description: "desc".to_string(),
            priority: DefectPriority::High,
            category: DefectCategory::Walls,
            location: "Floor 2".to_string(),
            status,
            assigned_to: None,
            due_date,
            closed_at: None,
            created_by: Role::Engineer,
            created_at: Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap(),
            cancel_reason: None,
        }
    }

    #[test]
    fn overdue_requires_past_due_date_and_open_status() {
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
        let past = NaiveDate::from_ymd_opt(2025, 10, 15);
        let future = NaiveDate::from_ymd_opt(2025, 10, 25);

        assert!(defect(DefectStatus::New, past).is_overdue(now));
        assert!(defect(DefectStatus::OnReview, past).is_overdue(now));
        assert!(!defect(DefectStatus::InProgress, future).is_overdue(now));
        assert!(!defect(DefectStatus::Closed, past).is_overdue(now));
        assert!(!defect(DefectStatus::Cancelled, past).is_overdue(now));
    }

    #[test]
    fn overdue_is_false_without_due_date() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        for status in DefectStatus::ALL {
            assert!(!defect(status, None).is_overdue(now));
        }
    }

    #[test]
    fn due_today_becomes_overdue_after_midnight() {
        let due = NaiveDate::from_ymd_opt(2025, 10, 15);
        let midnight = Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2025, 10, 15, 8, 0, 0).unwrap();

        assert!(!defect(DefectStatus::New, due).is_overdue(midnight));
        assert!(defect(DefectStatus::New, due).is_overdue(morning));
    }

    #[test]
    fn filter_combines_dimensions() {
        let d = defect(DefectStatus::New, None);

        assert!(DefectFilter::default().matches(&d));
        assert!(DefectFilter::for_project(1).matches(&d));
        assert!(!DefectFilter::for_project(2).matches(&d));

        let filter = DefectFilter {
            project_id: Some(1),
            status: Some(DefectStatus::New),
            priority: Some(DefectPriority::High),
            category: Some(DefectCategory::Roof),
        };
        assert!(!filter.matches(&d));
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let value = serde_json::to_value(defect(DefectStatus::InProgress, None)).unwrap();

        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["projectId"], 1);
        assert!(value["assignedTo"].is_null());
        assert!(value.get("cancelReason").is_none());
    }
}
