use std::fmt;
use serde::Serialize;
use thiserror::Error;
use crate::storage::StorageError;

/// Coarse classification of every failure the lifecycle can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    PermissionDenied,
    InvalidTransition,
    StorageFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // validation
    ValidationError,
    InvalidAssignee,

    // not found
    DefectNotFound,
    ProjectNotFound,
    UserNotFound,

    // permission
    NotEnoughPermission,

    // transition
    InvalidTransition,

    // storage
    IdSequenceExhausted,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Validation failed",
            ErrorCode::InvalidAssignee => "Defects can only be assigned to an existing engineer",

            ErrorCode::DefectNotFound => "Defect not found",
            ErrorCode::ProjectNotFound => "Project not found",
            ErrorCode::UserNotFound => "User not found",

            ErrorCode::NotEnoughPermission => "You do not have permission for this action",

            ErrorCode::InvalidTransition => "This action is not allowed in the current defect status",

            ErrorCode::IdSequenceExhausted => "No more defect ids are available",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationError |
            ErrorCode::InvalidAssignee => ErrorKind::Validation,

            ErrorCode::DefectNotFound |
            ErrorCode::ProjectNotFound |
            ErrorCode::UserNotFound => ErrorKind::NotFound,

            ErrorCode::NotEnoughPermission => ErrorKind::PermissionDenied,

            ErrorCode::InvalidTransition => ErrorKind::InvalidTransition,

            ErrorCode::IdSequenceExhausted => ErrorKind::StorageFailure,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", format_api_error(.0, .1))]
    ApiError(ErrorCode, Option<String>),

    #[error("{}", format_validation_errors(.0))]
    ValidationError(Vec<ValidationFieldError>),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn format_api_error(code: &ErrorCode, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{}: {}", code.message(), detail),
        None => code.message().to_string(),
    }
}

fn format_validation_errors(errors: &[ValidationFieldError]) -> String {
    let fields: Vec<String> = errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.field))
        .collect();
    format!("{}: {}", ErrorCode::ValidationError.message(), fields.join(", "))
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: String) -> Self {
        AppError::ApiError(code, Some(detail))
    }

    pub fn not_found(code: ErrorCode) -> Self {
        AppError::new(code)
    }

    pub fn forbidden() -> Self {
        AppError::new(ErrorCode::NotEnoughPermission)
    }

    pub fn invalid_transition(detail: String) -> Self {
        AppError::with_detail(ErrorCode::InvalidTransition, detail)
    }

    pub fn validation(field: &str, message: &str) -> Self {
        AppError::ValidationError(vec![ValidationFieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ApiError(code, _) => code.kind(),
            AppError::ValidationError(_) => ErrorKind::Validation,
            AppError::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// Everything except storage failures is reported back to the caller
    /// instead of being raised.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::StorageFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(ErrorCode::InvalidAssignee.kind(), ErrorKind::Validation);
        assert_eq!(ErrorCode::ProjectNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ErrorCode::NotEnoughPermission.kind(), ErrorKind::PermissionDenied);
        assert_eq!(ErrorCode::IdSequenceExhausted.kind(), ErrorKind::StorageFailure);
    }

    #[test]
    fn validation_error_lists_fields() {
        let err = AppError::ValidationError(vec![
            ValidationFieldError::new("title", "Title is required"),
            ValidationFieldError::new("location", "Location is required"),
        ]);

        let message = err.to_string();
        assert!(message.contains("Title is required (title)"));
        assert!(message.contains("Location is required (location)"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn detail_is_appended_to_message() {
        let err = AppError::invalid_transition("cannot close a defect in status new".to_string());
        assert_eq!(
            err.to_string(),
            "This action is not allowed in the current defect status: cannot close a defect in status new"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }
}
