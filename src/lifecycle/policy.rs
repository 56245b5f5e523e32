//! Transition table and role gate.
//!
//! Both checks are pure: the outcome depends only on the caller role, the
//! current status and the requested action.

use std::fmt;
use crate::model::{AppError, DefectStatus, HistoryAction, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Assign,
    SubmitForReview,
    Close,
    ReturnToWork,
    Cancel,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Assign => "assign",
            Action::SubmitForReview => "submit for review",
            Action::Close => "close",
            Action::ReturnToWork => "return to work",
            Action::Cancel => "cancel",
        }
    }

    /// Submitting for review is left to engineers by convention only.
    pub fn requires_supervisor(&self) -> bool {
        !matches!(self, Action::SubmitForReview)
    }

    pub fn history_action(&self) -> HistoryAction {
        match self {
            Action::Assign => HistoryAction::Assign,
            Action::SubmitForReview | Action::ReturnToWork => HistoryAction::StatusChange,
            Action::Close => HistoryAction::Close,
            Action::Cancel => HistoryAction::Cancel,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reached by applying `action` to a defect in `current`, if allowed.
pub fn next_status(current: DefectStatus, action: Action) -> Option<DefectStatus> {
    match (action, current) {
        (Action::Assign, DefectStatus::New) => Some(DefectStatus::InProgress),
        (Action::SubmitForReview, DefectStatus::InProgress) => Some(DefectStatus::OnReview),
        (Action::Close, DefectStatus::OnReview) => Some(DefectStatus::Closed),
        (Action::ReturnToWork, DefectStatus::OnReview) => Some(DefectStatus::InProgress),
        (Action::Cancel, status) if !status.is_terminal() => Some(DefectStatus::Cancelled),
        _ => None,
    }
}

pub fn authorize(role: Role, current: DefectStatus, action: Action) -> Result<DefectStatus, AppError> {
    if action.requires_supervisor() && !role.is_supervisor() {
        return Err(AppError::forbidden());
    }

    next_status(current, action).ok_or_else(|| {
        AppError::invalid_transition(format!("cannot {} a defect in status {}", action, current))
    })
}
