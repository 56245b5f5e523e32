pub mod comment;
pub mod common;
pub mod defect;
pub mod global_error;
pub mod history;
pub mod project;
pub mod stats;
pub mod user;

pub use comment::Comment;
pub use common::ApiResponse;
pub use defect::{AssignDefect, Defect, DefectCategory, DefectFilter, DefectPriority, DefectStatus, NewDefect};
pub use global_error::{AppError, ErrorCode, ErrorKind, ValidationFieldError};
pub use history::{Changes, HistoryAction, HistoryEntry};
pub use project::{Project, ProjectStatus, ProjectSummary};
pub use stats::{Breakdown, DashboardStats};
pub use user::{Role, User};
