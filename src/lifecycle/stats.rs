use chrono::{DateTime, Utc};
use crate::model::{
    Breakdown, DashboardStats, Defect, DefectCategory, DefectPriority, DefectStatus, Project,
    ProjectStatus, ProjectSummary,
};

pub fn dashboard(projects: &[Project], defects: &[Defect], now: DateTime<Utc>) -> DashboardStats {
    let projects_in = |status: ProjectStatus| projects.iter().filter(|p| p.status == status).count();
    let defects_in = |status: DefectStatus| defects.iter().filter(|d| d.status == status).count();

    DashboardStats {
        active_projects: projects_in(ProjectStatus::Active),
        completed_projects: projects_in(ProjectStatus::Completed),
        paused_projects: projects_in(ProjectStatus::Paused),

        new_defects: defects_in(DefectStatus::New),
        in_progress_defects: defects_in(DefectStatus::InProgress),
        on_review_defects: defects_in(DefectStatus::OnReview),
        closed_defects: defects_in(DefectStatus::Closed),
        cancelled_defects: defects_in(DefectStatus::Cancelled),

        overdue_defects: defects.iter().filter(|d| d.is_overdue(now)).count(),
        critical_defects: defects.iter().filter(|d| is_open_critical(d)).count(),
    }
}

/// Reserved statuses are left out.
pub fn by_status(defects: &[Defect]) -> Breakdown {
    DefectStatus::ALL
        .into_iter()
        .filter(|s| *s != DefectStatus::NeedsManagement)
        .map(|s| (s.as_str().to_string(), defects.iter().filter(|d| d.status == s).count()))
        .collect()
}

pub fn by_priority(defects: &[Defect]) -> Breakdown {
    DefectPriority::ALL
        .into_iter()
        .map(|p| (p.as_str().to_string(), defects.iter().filter(|d| d.priority == p).count()))
        .collect()
}

pub fn by_category(defects: &[Defect]) -> Breakdown {
    DefectCategory::ALL
        .into_iter()
        .map(|c| (c.as_str().to_string(), defects.iter().filter(|d| d.category == c).count()))
        .collect()
}

/// Per-project counters, busiest project first.
pub fn project_summaries(projects: &[Project], defects: &[Defect]) -> Vec<ProjectSummary> {
    let mut summaries: Vec<ProjectSummary> = projects
        .iter()
        .map(|project| {
            let own: Vec<&Defect> = defects.iter().filter(|d| d.project_id == project.id).collect();
            ProjectSummary {
                project: project.clone(),
                total_defects: own.len(),
                closed_defects: own.iter().filter(|d| d.status == DefectStatus::Closed).count(),
                open_defects: own.iter().filter(|d| d.is_open()).count(),
                critical_defects: own.iter().filter(|d| is_open_critical(d)).count(),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.total_defects.cmp(&a.total_defects));
    summaries
}

fn is_open_critical(defect: &Defect) -> bool {
    defect.priority == DefectPriority::Critical && defect.is_open()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use crate::model::Role;

    fn project(id: i32, status: ProjectStatus) -> Project {
        Project {
            id,
            name: format!("Project {}", id),
            address: String::new(),
            description: String::new(),
            customer: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            status,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn defect(seq: u32, project_id: i32, status: DefectStatus, priority: DefectPriority) -> Defect {
        Defect {
            id: format!("DF-20251001-{:04}", seq),
            project_id,
            title: "t".to_string(),
            description: "d".to_string(),
            priority,
            category: DefectCategory::Walls,
            location: "l".to_string(),
            status,
            assigned_to: None,
            due_date: NaiveDate::from_ymd_opt(2025, 10, 10),
            closed_at: None,
            created_by: Role::Engineer,
            created_at: Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
            cancel_reason: None,
        }
    }

    #[test]
    fn dashboard_counts() {
        let projects = vec![project(1, ProjectStatus::Active), project(2, ProjectStatus::Paused)];
        let defects = vec![
            defect(1, 1, DefectStatus::New, DefectPriority::Critical),
            defect(2, 1, DefectStatus::Closed, DefectPriority::Critical),
            defect(3, 2, DefectStatus::InProgress, DefectPriority::Low),
        ];
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0).unwrap();

        let stats = dashboard(&projects, &defects, now);

        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.paused_projects, 1);
        assert_eq!(stats.new_defects, 1);
        assert_eq!(stats.closed_defects, 1);
        assert_eq!(stats.overdue_defects, 2);
        assert_eq!(stats.critical_defects, 1);
    }

    #[test]
    fn breakdowns_include_zero_buckets() {
        let defects = vec![defect(1, 1, DefectStatus::New, DefectPriority::High)];

        let status = by_status(&defects);
        assert_eq!(status.len(), 5);
        assert_eq!(status["new"], 1);
        assert_eq!(status["cancelled"], 0);

        assert_eq!(by_priority(&defects)["high"], 1);
        assert_eq!(by_category(&defects)["walls"], 1);
        assert_eq!(by_category(&defects)["roof"], 0);
    }

    #[test]
    fn summaries_sorted_by_total() {
        let projects = vec![project(1, ProjectStatus::Active), project(2, ProjectStatus::Active)];
        let defects = vec![
            defect(1, 2, DefectStatus::New, DefectPriority::Critical),
            defect(2, 2, DefectStatus::Cancelled, DefectPriority::Critical),
            defect(3, 1, DefectStatus::Closed, DefectPriority::Low),
        ];

        let summaries = project_summaries(&projects, &defects);

        assert_eq!(summaries[0].project.id, 2);
        assert_eq!(summaries[0].total_defects, 2);
        assert_eq!(summaries[0].open_defects, 1);
        assert_eq!(summaries[0].critical_defects, 1);
        assert_eq!(summaries[1].closed_defects, 1);
    }
}
