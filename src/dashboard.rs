//! Aggregation over a task scope: status summaries and dashboard data.
//!
//! Counts are issued as independent queries against the store with no
//! cross-query transaction. Under concurrent writes the individual numbers
//! may momentarily disagree (pending + in-progress + completed can drift
//! from the total); that mirrors the store's consistency model and is
//! accepted here rather than papered over.
//!
//! Persisted status labels are normalized before they are matched against
//! the display set, so rows written by older tooling with drifted casing or
//! punctuation still aggregate; labels that match nothing are dropped
//! silently instead of failing the whole dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::store::{GroupField, Store, TaskFilter};
use crate::task::{normalize_label, Status, Task, PRIORITY_LABELS, STATUS_LABELS};
use crate::user::User;

/// Visibility boundary for aggregation
#[derive(Debug, Clone)]
pub enum Scope {
    /// Every task on the board (admin view)
    All,
    /// Only tasks assigned to the given user
    AssignedTo(String),
}

impl Scope {
    /// The scope a caller aggregates over: admins see the whole board,
    /// members see their assigned tasks.
    pub fn for_caller(caller: &User) -> Scope {
        if caller.is_admin() {
            Scope::All
        } else {
            Scope::AssignedTo(caller.id.clone())
        }
    }

    pub fn filter(&self) -> TaskFilter {
        match self {
            Scope::All => TaskFilter::default(),
            Scope::AssignedTo(user_id) => TaskFilter::assigned_to(user_id.clone()),
        }
    }
}

/// Per-status counts for a scope. Accompanies task listings, where it always
/// covers the whole scope regardless of any status filter on the list
/// itself.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub all: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Compute the per-status summary with four independent counts.
pub fn status_summary(store: &Store, scope: &Scope) -> Result<StatusSummary> {
    Ok(StatusSummary {
        all: store.count_tasks(&scope.filter())?,
        pending: store.count_tasks(&scope.filter().with_status(Some(Status::Pending)))?,
        in_progress: store.count_tasks(&scope.filter().with_status(Some(Status::InProgress)))?,
        completed: store.count_tasks(&scope.filter().with_status(Some(Status::Completed)))?,
    })
}

/// Headline dashboard counts
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatistics {
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
}

/// Chart inputs: distribution over statuses (plus an `All` entry) and over
/// priority levels
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub task_distribution: BTreeMap<String, usize>,
    pub task_priority_levels: BTreeMap<String, usize>,
}

/// Recent-task projection for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct TaskDigest {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskDigest {
    fn from(task: &Task) -> Self {
        TaskDigest {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status.clone(),
            priority: task.priority.clone(),
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

/// Full dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub statistics: DashboardStatistics,
    pub charts: DashboardCharts,
    pub recent_tasks: Vec<TaskDigest>,
}

/// Compute the dashboard for a scope.
pub fn compute(store: &Store, scope: &Scope, config: &Config, now: DateTime<Utc>) -> Result<Dashboard> {
    let filter = scope.filter();

    let total_tasks = store.count_tasks(&filter)?;
    let pending_tasks = store.count_tasks(&filter.clone().with_status(Some(Status::Pending)))?;
    let completed_tasks =
        store.count_tasks(&filter.clone().with_status(Some(Status::Completed)))?;
    let overdue_tasks = store.count_tasks(&TaskFilter {
        due_before: Some(now),
        exclude_completed: true,
        ..filter.clone()
    })?;

    // Distribution keys are the display labels with punctuation stripped
    // ("In-Progress" charts as "InProgress"); persisted labels are matched
    // leniently and several drifted spellings of one status sum together.
    let status_rows = store.group_task_count(GroupField::Status, &filter)?;
    let mut task_distribution = BTreeMap::new();
    for label in STATUS_LABELS {
        let key: String = label.chars().filter(char::is_ascii_alphanumeric).collect();
        let count: usize = status_rows
            .iter()
            .filter(|row| normalize_label(&row.label) == normalize_label(label))
            .map(|row| row.count)
            .sum();
        task_distribution.insert(key, count);
    }
    task_distribution.insert("All".to_string(), total_tasks);

    // Priority levels match canonical labels exactly; anything else is
    // excluded rather than guessed at.
    let priority_rows = store.group_task_count(GroupField::Priority, &filter)?;
    let mut task_priority_levels = BTreeMap::new();
    for label in PRIORITY_LABELS {
        let count = priority_rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.count)
            .unwrap_or(0);
        task_priority_levels.insert(label.to_string(), count);
    }

    let mut recent = store.find_tasks(&filter)?;
    recent.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    recent.truncate(config.dashboard.recent_limit);
    let recent_tasks = recent.iter().map(TaskDigest::from).collect();

    Ok(Dashboard {
        statistics: DashboardStatistics {
            total_tasks,
            pending_tasks,
            completed_tasks,
            overdue_tasks,
        },
        charts: DashboardCharts {
            task_distribution,
            task_priority_levels,
        },
        recent_tasks,
    })
}
