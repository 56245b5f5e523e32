use std::fmt;
use serde::{Deserialize, Serialize};

/// Caller role. Passed explicitly into every lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Engineer,
    Manager,
    Director,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Engineer => "engineer",
            Role::Manager => "manager",
            Role::Director => "director",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Engineer => "Инженер",
            Role::Manager => "Менеджер",
            Role::Director => "Руководитель",
        }
    }

    /// Managers and directors supervise the defect workflow.
    pub fn is_supervisor(&self) -> bool {
        matches!(self, Role::Manager | Role::Director)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}
