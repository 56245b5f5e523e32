use std::collections::BTreeMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_projects: usize,
    pub completed_projects: usize,
    pub paused_projects: usize,

    pub new_defects: usize,
    pub in_progress_defects: usize,
    pub on_review_defects: usize,
    pub closed_defects: usize,
    pub cancelled_defects: usize,

    pub overdue_defects: usize,
    /// Critical defects that are still open.
    pub critical_defects: usize,
}

/// Counts keyed by the snake_case enum value.
pub type Breakdown = BTreeMap<String, usize>;
