//! Task records and the state engine.
//!
//! A task's checklist drives two derived fields: `progress` (rounded percent
//! of completed items) and `status` (Pending / In-Progress / Completed).
//! Replacing the checklist recomputes both. A direct status write to
//! Completed goes the other way: it force-completes every checklist item and
//! pins progress to 100, so a caller marking a task done does not have to
//! tick every box first. A plain field patch touches neither derived field.
//!
//! Status and priority are persisted as label strings; mutations go through
//! the [`Status`] / [`Priority`] enums and write canonical labels, while
//! legacy rows with drifted casing or separators stay loadable and are
//! matched leniently.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::user::UserSummary;

/// Status display labels in lifecycle order.
pub const STATUS_LABELS: [&str; 3] = ["Pending", "In-Progress", "Completed"];

/// Priority display labels, lowest to highest.
pub const PRIORITY_LABELS: [&str; 3] = ["Low", "Medium", "High"];

/// Categorical task status, derived from progress except under the
/// force-complete override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    /// Canonical persisted/display label
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In-Progress",
            Status::Completed => "Completed",
        }
    }

    /// Parse a persisted or user-supplied label. Case, hyphens, underscores
    /// and spaces are ignored so legacy rows still match.
    pub fn parse(input: &str) -> Option<Status> {
        let norm = normalize_label(input);
        [Status::Pending, Status::InProgress, Status::Completed]
            .into_iter()
            .find(|status| normalize_label(status.label()) == norm)
    }

    /// Parse caller input at the write boundary, rejecting unknown labels.
    pub fn from_arg(input: &str) -> Result<Status> {
        Status::parse(input).ok_or_else(|| {
            Error::Validation(format!(
                "unknown status '{input}' (expected Pending|In-Progress|Completed)"
            ))
        })
    }

    /// The three-way derivation rule: 0 is Pending, 100 is Completed,
    /// anything in between is In-Progress.
    pub fn for_progress(progress: u8) -> Status {
        if progress == 100 {
            Status::Completed
        } else if progress > 0 {
            Status::InProgress
        } else {
            Status::Pending
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Canonical persisted/display label
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Lenient label parse, same rules as [`Status::parse`]
    pub fn parse(input: &str) -> Option<Priority> {
        let norm = normalize_label(input);
        [Priority::Low, Priority::Medium, Priority::High]
            .into_iter()
            .find(|priority| normalize_label(priority.label()) == norm)
    }

    /// Parse caller input at the write boundary, rejecting unknown labels.
    pub fn from_arg(input: &str) -> Result<Priority> {
        Priority::parse(input).ok_or_else(|| {
            Error::Validation(format!(
                "unknown priority '{input}' (expected Low|Medium|High)"
            ))
        })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize a label for tolerant matching: trim, lowercase, and drop
/// hyphen/underscore/space separators.
pub fn normalize_label(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '-' | '_') && !ch.is_whitespace())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// One unit of a task's todo list; the basis for derived progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Parse a checklist supplied as JSON at the boundary. Shape failures are
/// validation errors and abort before anything is merged.
pub fn parse_checklist(input: &str) -> Result<Vec<ChecklistItem>> {
    serde_json::from_str(input).map_err(|err| {
        Error::Validation(format!(
            "checklist must be a JSON array of {{\"text\", \"completed\"}} items: {err}"
        ))
    })
}

/// A task record as persisted in the tasks registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: String,
    pub status: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: String,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub todo_checklist: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for task creation. The creator and timestamps are supplied by the
/// caller's context, never by the input itself.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Vec<String>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub attachments: Vec<String>,
}

/// A partial update where every field is explicitly present or absent.
///
/// `None` keeps the prior value; `Some` sets it, including explicit empty
/// strings and lists. `due_date` nests an option so clearing the due date is
/// distinct from not supplying one.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub attachments: Option<Vec<String>>,
    pub todo_checklist: Option<Vec<ChecklistItem>>,
    pub assigned_to: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.attachments.is_none()
            && self.todo_checklist.is_none()
            && self.assigned_to.is_none()
    }
}

pub fn generate_task_id() -> String {
    Ulid::new().to_string()
}

impl Task {
    /// Build a fresh task. Progress and status derive from the initial
    /// checklist so the record starts consistent even when created with
    /// pre-completed items.
    pub fn create(input: NewTask, created_by: &str, now: DateTime<Utc>) -> Task {
        let mut task = Task {
            id: generate_task_id(),
            title: input.title,
            description: input.description,
            priority: input.priority.label().to_string(),
            status: Status::Pending.label().to_string(),
            progress: 0,
            due_date: input.due_date,
            created_by: created_by.to_string(),
            assigned_to: input.assigned_to,
            todo_checklist: Vec::new(),
            attachments: input.attachments,
            created_at: now,
            updated_at: now,
        };
        task.replace_checklist(input.todo_checklist);
        task
    }

    /// Merge a field patch over the task. Derived fields are left alone:
    /// even a checklist supplied through a plain field edit does not
    /// recompute progress or status.
    pub fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority.label().to_string();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments;
        }
        if let Some(todo_checklist) = patch.todo_checklist {
            self.todo_checklist = todo_checklist;
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
    }

    /// Set the status directly. Writing Completed force-completes the
    /// checklist and pins progress to 100; other statuses leave the
    /// checklist and progress untouched.
    pub fn set_status(&mut self, status: Status) {
        self.status = status.label().to_string();
        if status == Status::Completed {
            for item in &mut self.todo_checklist {
                item.completed = true;
            }
            self.progress = 100;
        }
    }

    /// Replace the checklist wholesale and recompute progress and status.
    pub fn replace_checklist(&mut self, items: Vec<ChecklistItem>) {
        self.todo_checklist = items;
        self.progress = checklist_progress(&self.todo_checklist);
        self.status = Status::for_progress(self.progress).label().to_string();
    }

    /// Count of completed checklist items
    pub fn completed_item_count(&self) -> usize {
        self.todo_checklist
            .iter()
            .filter(|item| item.completed)
            .count()
    }

    /// The persisted status label parsed leniently, if it matches a known
    /// status at all.
    pub fn parsed_status(&self) -> Option<Status> {
        Status::parse(&self.status)
    }

    pub fn is_completed(&self) -> bool {
        self.parsed_status() == Some(Status::Completed)
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == user_id)
    }

    /// Past due and not completed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now) && !self.is_completed()
    }
}

/// Rounded percent of completed items; 0 for an empty checklist.
/// Rounds half up: 1 of 8 complete is 13, 1 of 3 is 33.
pub fn checklist_progress(items: &[ChecklistItem]) -> u8 {
    let total = items.len();
    if total == 0 {
        return 0;
    }
    let completed = items.iter().filter(|item| item.completed).count();
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

/// Task projection returned by list and detail operations: assignee
/// references expanded to user summaries, and the completed-item count
/// exposed under both the older and newer key so either consumer
/// generation keeps working.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: String,
    pub assigned_to: Vec<UserSummary>,
    pub todo_checklist: Vec<ChecklistItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_checklist_count: usize,
    pub completed_todo_count: usize,
}

impl TaskView {
    pub fn new(task: Task, assigned_to: Vec<UserSummary>) -> Self {
        let completed = task.completed_item_count();
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            progress: task.progress,
            due_date: task.due_date,
            created_by: task.created_by,
            assigned_to,
            todo_checklist: task.todo_checklist,
            attachments: task.attachments,
            created_at: task.created_at,
            updated_at: task.updated_at,
            completed_checklist_count: completed,
            completed_todo_count: completed,
        }
    }
}
