use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::model::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Create,
    Assign,
    StatusChange,
    Close,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub defect_id: String,
    pub action: HistoryAction,
    pub author: Role,
    pub changes: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// Builds the `changes` object of a history entry.
#[derive(Debug, Default)]
pub struct Changes(Map<String, Value>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(mut self, field: &str, value: T) -> Self {
        // plain enums, strings and numbers never fail to serialize
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(field.to_string(), value);
        self
    }

    pub fn set_opt<T: Serialize>(self, field: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(field, value),
            None => self,
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::defect::DefectStatus;

    #[test]
    fn changes_skip_missing_values() {
        let changes = Changes::new()
            .set("status", DefectStatus::InProgress)
            .set("assignedTo", 7)
            .set_opt::<String>("dueDate", None)
            .into_map();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes["status"], "in_progress");
        assert_eq!(changes["assignedTo"], 7);
    }
}
