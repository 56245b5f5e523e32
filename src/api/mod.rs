//! Caller-facing facade over [`DefectLifecycle`].
//!
//! Each function maps one lifecycle operation onto an [`ApiResponse`].
//! Validation, not-found, permission and transition failures come back as
//! `success: false`; only storage failures are returned as `Err`.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tracing::{error, warn};
use crate::configuration::Settings;
use crate::lifecycle::DefectLifecycle;
use crate::model::{
    ApiResponse, AppError, AssignDefect, Breakdown, Comment, DashboardStats, Defect, DefectFilter,
    HistoryEntry, NewDefect, Project, ProjectSummary, Role, User,
};
use crate::storage::Storage;

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

#[derive(Clone)]
pub struct DefectApi {
    lifecycle: DefectLifecycle,
    latency: Duration,
}

impl DefectApi {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            lifecycle: DefectLifecycle::new(storage),
            latency: Duration::ZERO,
        }
    }

    pub fn from_settings(storage: Arc<dyn Storage>, settings: &Settings) -> Self {
        Self::new(storage).with_latency(settings.simulated_latency)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn lifecycle(&self) -> &DefectLifecycle {
        &self.lifecycle
    }

    pub async fn create_defect(&self, role: Role, request: NewDefect) -> ApiResult<Defect> {
        self.delay().await;
        respond("create_defect", self.lifecycle.create_defect(role, request).await)
    }

    pub async fn assign_defect(&self, role: Role, defect_id: &str, request: AssignDefect) -> ApiResult<Defect> {
        self.delay().await;
        respond("assign_defect", self.lifecycle.assign_defect(role, defect_id, request).await)
    }

    pub async fn submit_for_review(&self, role: Role, defect_id: &str, comment: Option<String>) -> ApiResult<Defect> {
        self.delay().await;
        respond("submit_for_review", self.lifecycle.submit_for_review(role, defect_id, comment).await)
    }

    pub async fn close_defect(&self, role: Role, defect_id: &str, comment: Option<String>) -> ApiResult<Defect> {
        self.delay().await;
        respond("close_defect", self.lifecycle.close_defect(role, defect_id, comment).await)
    }

    pub async fn return_to_work(&self, role: Role, defect_id: &str, reason: &str) -> ApiResult<Defect> {
        self.delay().await;
        respond("return_to_work", self.lifecycle.return_to_work(role, defect_id, reason).await)
    }

    pub async fn cancel_defect(&self, role: Role, defect_id: &str, reason: &str) -> ApiResult<Defect> {
        self.delay().await;
        respond("cancel_defect", self.lifecycle.cancel_defect(role, defect_id, reason).await)
    }

    pub async fn add_comment(&self, role: Role, defect_id: &str, text: &str) -> ApiResult<Comment> {
        self.delay().await;
        respond("add_comment", self.lifecycle.add_comment(role, defect_id, text).await)
    }

    pub async fn get_defect(&self, defect_id: &str) -> ApiResult<Defect> {
        self.delay().await;
        respond("get_defect", self.lifecycle.get_defect(defect_id).await)
    }

    pub async fn list_defects(&self, filter: &DefectFilter) -> ApiResult<Vec<Defect>> {
        self.delay().await;
        respond("list_defects", self.lifecycle.list_defects(filter).await)
    }

    pub async fn list_assigned_to(&self, user_id: i32) -> ApiResult<Vec<Defect>> {
        self.delay().await;
        respond("list_assigned_to", self.lifecycle.list_assigned_to(user_id).await)
    }

    pub async fn list_overdue(&self, now: DateTime<Utc>) -> ApiResult<Vec<Defect>> {
        self.delay().await;
        respond("list_overdue", self.lifecycle.list_overdue(now).await)
    }

    pub async fn comments(&self, defect_id: &str) -> ApiResult<Vec<Comment>> {
        self.delay().await;
        respond("comments", self.lifecycle.comments(defect_id).await)
    }

    pub async fn history(&self, defect_id: &str) -> ApiResult<Vec<HistoryEntry>> {
        self.delay().await;
        respond("history", self.lifecycle.history(defect_id).await)
    }

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.delay().await;
        respond("list_projects", self.lifecycle.list_projects().await)
    }

    pub async fn get_project(&self, project_id: i32) -> ApiResult<Project> {
        self.delay().await;
        respond("get_project", self.lifecycle.get_project(project_id).await)
    }

    pub async fn list_users(&self, role: Option<Role>) -> ApiResult<Vec<User>> {
        self.delay().await;
        respond("list_users", self.lifecycle.list_users(role).await)
    }

    pub async fn get_user(&self, user_id: i32) -> ApiResult<User> {
        self.delay().await;
        respond("get_user", self.lifecycle.get_user(user_id).await)
    }

    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> ApiResult<DashboardStats> {
        self.delay().await;
        respond("dashboard_stats", self.lifecycle.dashboard_stats(now).await)
    }

    pub async fn count_by_status(&self) -> ApiResult<Breakdown> {
        self.delay().await;
        respond("count_by_status", self.lifecycle.count_by_status().await)
    }

    pub async fn count_by_priority(&self) -> ApiResult<Breakdown> {
        self.delay().await;
        respond("count_by_priority", self.lifecycle.count_by_priority().await)
    }

    pub async fn count_by_category(&self) -> ApiResult<Breakdown> {
        self.delay().await;
        respond("count_by_category", self.lifecycle.count_by_category().await)
    }

    pub async fn project_summaries(&self) -> ApiResult<Vec<ProjectSummary>> {
        self.delay().await;
        respond("project_summaries", self.lifecycle.project_summaries().await)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn respond<T>(operation: &'static str, result: Result<T, AppError>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(ApiResponse::ok(data)),
        Err(err) if err.is_recoverable() => {
            warn!(operation, kind = ?err.kind(), "{}", err);
            Ok(ApiResponse::fail(err.to_string()))
        }
        Err(err) => {
            error!(operation, "{}", err);
            Err(err)
        }
    }
}
