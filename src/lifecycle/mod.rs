//! Defect lifecycle manager.
//!
//! Owns defect records, their status transitions and the append-only comment
//! and history logs. Every mutating operation loads the collections it needs,
//! changes them in memory and writes them back through a single
//! [`Storage::put_all`] batch, so a failed call leaves storage untouched.
//!
//! There is no version field on defects: concurrent writers would need one
//! before this read-modify-write cycle is safe.

pub mod id;
pub mod policy;
pub mod stats;

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use crate::model::{
    AppError, AssignDefect, Breakdown, Changes, Comment, DashboardStats, Defect, DefectFilter,
    DefectStatus, ErrorCode, HistoryAction, HistoryEntry, NewDefect, Project, ProjectSummary,
    Role, User, ValidationFieldError,
};
use crate::storage::{encode, load, Batch, Collection, Storage};
use self::policy::Action;

#[derive(Clone)]
pub struct DefectLifecycle {
    storage: Arc<dyn Storage>,
}

/// Pending side effects of one operation.
struct Journal {
    defects: Vec<Defect>,
    history: Vec<HistoryEntry>,
    comments: Option<Vec<Comment>>,
}

impl Journal {
    fn record(&mut self, defect_id: &str, action: HistoryAction, author: Role, changes: Changes, at: DateTime<Utc>) {
        let id = self.history.iter().map(|h| h.id).max().unwrap_or(0) + 1;
        self.history.push(HistoryEntry {
            id,
            defect_id: defect_id.to_string(),
            action,
            author,
            changes: changes.into_map(),
            timestamp: at,
        });
    }

    fn into_batch(self) -> Result<Batch, AppError> {
        let mut batch = vec![
            (Collection::Defects, encode(Collection::Defects, &self.defects)?),
            (Collection::History, encode(Collection::History, &self.history)?),
        ];
        if let Some(comments) = self.comments {
            batch.push((Collection::Comments, encode(Collection::Comments, &comments)?));
        }
        Ok(batch)
    }
}

impl DefectLifecycle {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    #[instrument(skip(self, request), fields(project_id = request.project_id))]
    pub async fn create_defect(&self, role: Role, request: NewDefect) -> Result<Defect, AppError> {
        validate_new_defect(&request)?;

        let projects: Vec<Project> = load(self.storage.as_ref(), Collection::Projects).await?;
        if !projects.iter().any(|p| p.id == request.project_id) {
            return Err(AppError::not_found(ErrorCode::ProjectNotFound));
        }

        let mut journal = self.journal(false).await?;
        let now = Utc::now();
        let id = id::next_defect_id(journal.defects.iter().map(|d| d.id.as_str()), now.date_naive())?;

        let defect = Defect {
            id: id.clone(),
            project_id: request.project_id,
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            priority: request.priority.unwrap_or_default(),
            category: request.category,
            location: request.location.trim().to_string(),
            status: DefectStatus::New,
            assigned_to: None,
            due_date: request.due_date,
            closed_at: None,
            created_by: role,
            created_at: now,
            cancel_reason: None,
        };

        journal.defects.push(defect.clone());
        journal.record(&id, HistoryAction::Create, role, Changes::new().set("status", DefectStatus::New), now);
        self.commit(journal).await?;

        info!(defect_id = %id, "defect created");
        Ok(defect)
    }

    #[instrument(skip(self, request), fields(assignee_id = request.assignee_id))]
    pub async fn assign_defect(&self, role: Role, defect_id: &str, request: AssignDefect) -> Result<Defect, AppError> {
        let users: Vec<User> = load(self.storage.as_ref(), Collection::Users).await?;
        let AssignDefect { assignee_id, due_date, comment } = request;

        self.transition(role, defect_id, Action::Assign, comment, |defect, _| {
            let is_engineer = users
                .iter()
                .any(|u| u.id == assignee_id && u.role == Role::Engineer);
            if !is_engineer {
                return Err(AppError::with_detail(
                    ErrorCode::InvalidAssignee,
                    format!("user {} is not an engineer", assignee_id),
                ));
            }

            defect.assigned_to = Some(assignee_id);
            if due_date.is_some() {
                defect.due_date = due_date;
            }

            Ok(Changes::new()
                .set("assignedTo", assignee_id)
                .set_opt("dueDate", due_date))
        })
        .await
    }

    #[instrument(skip(self, comment))]
    pub async fn submit_for_review(&self, role: Role, defect_id: &str, comment: Option<String>) -> Result<Defect, AppError> {
        self.transition(role, defect_id, Action::SubmitForReview, comment, |_, _| Ok(Changes::new()))
            .await
    }

    #[instrument(skip(self, comment))]
    pub async fn close_defect(&self, role: Role, defect_id: &str, comment: Option<String>) -> Result<Defect, AppError> {
        self.transition(role, defect_id, Action::Close, comment, |defect, now| {
            defect.closed_at = Some(now);
            Ok(Changes::new().set("closedAt", now))
        })
        .await
    }

    #[instrument(skip(self, reason))]
    pub async fn return_to_work(&self, role: Role, defect_id: &str, reason: &str) -> Result<Defect, AppError> {
        let reason = required_text("reason", reason, "A reason is required to return a defect")?;
        let changes = Changes::new().set("reason", &reason);

        self.transition(role, defect_id, Action::ReturnToWork, Some(reason), move |_, _| Ok(changes))
            .await
    }

    #[instrument(skip(self, reason))]
    pub async fn cancel_defect(&self, role: Role, defect_id: &str, reason: &str) -> Result<Defect, AppError> {
        let reason = required_text("reason", reason, "A reason is required to cancel a defect")?;

        self.transition(role, defect_id, Action::Cancel, None, move |defect, _| {
            let changes = Changes::new().set("cancelReason", &reason);
            defect.cancel_reason = Some(reason);
            Ok(changes)
        })
        .await
    }

    /// Appends a free-standing comment; no history entry is written.
    #[instrument(skip(self, text))]
    pub async fn add_comment(&self, role: Role, defect_id: &str, text: &str) -> Result<Comment, AppError> {
        let text = required_text("text", text, "Comment text is required")?;
        self.get_defect(defect_id).await?;

        let mut comments: Vec<Comment> = load(self.storage.as_ref(), Collection::Comments).await?;
        let comment = push_comment(&mut comments, defect_id, text, role, Utc::now());
        self.storage
            .put(Collection::Comments, encode(Collection::Comments, &comments)?)
            .await?;

        Ok(comment)
    }

    pub async fn get_defect(&self, defect_id: &str) -> Result<Defect, AppError> {
        self.defects()
            .await?
            .into_iter()
            .find(|d| d.id == defect_id)
            .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))
    }

    pub async fn list_defects(&self, filter: &DefectFilter) -> Result<Vec<Defect>, AppError> {
        let mut defects = self.defects().await?;
        defects.retain(|d| filter.matches(d));
        Ok(defects)
    }

    pub async fn list_assigned_to(&self, user_id: i32) -> Result<Vec<Defect>, AppError> {
        let mut defects = self.defects().await?;
        defects.retain(|d| d.assigned_to == Some(user_id));
        Ok(defects)
    }

    pub async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Defect>, AppError> {
        let mut defects = self.defects().await?;
        defects.retain(|d| d.is_overdue(now));
        Ok(defects)
    }

    /// Comments in insertion order.
    pub async fn comments(&self, defect_id: &str) -> Result<Vec<Comment>, AppError> {
        self.get_defect(defect_id).await?;
        let mut comments: Vec<Comment> = load(self.storage.as_ref(), Collection::Comments).await?;
        comments.retain(|c| c.defect_id == defect_id);
        Ok(comments)
    }

    /// History entries, oldest first.
    pub async fn history(&self, defect_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        self.get_defect(defect_id).await?;
        let mut history: Vec<HistoryEntry> = load(self.storage.as_ref(), Collection::History).await?;
        history.retain(|h| h.defect_id == defect_id);
        history.sort_by_key(|h| (h.timestamp, h.id));
        Ok(history)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        Ok(load(self.storage.as_ref(), Collection::Projects).await?)
    }

    pub async fn get_project(&self, project_id: i32) -> Result<Project, AppError> {
        self.list_projects()
            .await?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| AppError::not_found(ErrorCode::ProjectNotFound))
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = load(self.storage.as_ref(), Collection::Users).await?;
        if let Some(role) = role {
            users.retain(|u| u.role == role);
        }
        Ok(users)
    }

    pub async fn get_user(&self, user_id: i32) -> Result<User, AppError> {
        self.list_users(None)
            .await?
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound))
    }

    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let projects = self.list_projects().await?;
        let defects = self.defects().await?;
        Ok(stats::dashboard(&projects, &defects, now))
    }

    pub async fn count_by_status(&self) -> Result<Breakdown, AppError> {
        Ok(stats::by_status(&self.defects().await?))
    }

    pub async fn count_by_priority(&self) -> Result<Breakdown, AppError> {
        Ok(stats::by_priority(&self.defects().await?))
    }

    pub async fn count_by_category(&self) -> Result<Breakdown, AppError> {
        Ok(stats::by_category(&self.defects().await?))
    }

    pub async fn project_summaries(&self) -> Result<Vec<ProjectSummary>, AppError> {
        let projects = self.list_projects().await?;
        let defects = self.defects().await?;
        Ok(stats::project_summaries(&projects, &defects))
    }

    async fn defects(&self) -> Result<Vec<Defect>, AppError> {
        Ok(load(self.storage.as_ref(), Collection::Defects).await?)
    }

    async fn journal(&self, with_comments: bool) -> Result<Journal, AppError> {
        let comments = if with_comments {
            Some(load(self.storage.as_ref(), Collection::Comments).await?)
        } else {
            None
        };

        Ok(Journal {
            defects: self.defects().await?,
            history: load(self.storage.as_ref(), Collection::History).await?,
            comments,
        })
    }

    async fn commit(&self, journal: Journal) -> Result<(), AppError> {
        self.storage.put_all(journal.into_batch()?).await?;
        Ok(())
    }

    /// Runs one state-machine step: lookup, role and state checks, the
    /// action-specific mutation, then status, history and the optional
    /// comment in one write.
    async fn transition<F>(
        &self,
        role: Role,
        defect_id: &str,
        action: Action,
        comment: Option<String>,
        apply: F,
    ) -> Result<Defect, AppError>
    where
        F: FnOnce(&mut Defect, DateTime<Utc>) -> Result<Changes, AppError>,
    {
        let comment = comment
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let mut journal = self.journal(comment.is_some()).await?;
        let defect = journal
            .defects
            .iter_mut()
            .find(|d| d.id == defect_id)
            .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))?;

        let previous = defect.status;
        let next = policy::authorize(role, previous, action)?;
        let now = Utc::now();

        let changes = apply(defect, now)?.set("status", next);
        defect.status = next;
        let updated = defect.clone();

        journal.record(defect_id, action.history_action(), role, changes, now);
        if let (Some(comments), Some(text)) = (journal.comments.as_mut(), comment) {
            push_comment(comments, defect_id, text, role, now);
        }
        self.commit(journal).await?;

        info!(defect_id, from = %previous, to = %next, role = %role, "defect {}", action);
        Ok(updated)
    }
}

fn push_comment(comments: &mut Vec<Comment>, defect_id: &str, text: String, author: Role, at: DateTime<Utc>) -> Comment {
    let id = comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
    let comment = Comment {
        id,
        defect_id: defect_id.to_string(),
        text,
        author,
        created_at: at,
    };
    comments.push(comment.clone());
    comment
}

fn required_text(field: &str, value: &str, message: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(field, message));
    }
    Ok(value.to_string())
}

fn validate_new_defect(request: &NewDefect) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if request.title.trim().is_empty() {
        errors.push(ValidationFieldError::new("title", "Title is required"));
    }

    if request.description.trim().is_empty() {
        errors.push(ValidationFieldError::new("description", "Description is required"));
    }

    if request.location.trim().is_empty() {
        errors.push(ValidationFieldError::new("location", "Location is required"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}
