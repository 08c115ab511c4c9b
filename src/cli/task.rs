//! taskhub task command implementations.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::authz::{ensure_admin, ensure_task_participant};
use crate::cli::Context;
use crate::dashboard::{status_summary, Scope, StatusSummary};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{
    parse_checklist, ChecklistItem, NewTask, Priority, Status, Task, TaskPatch, TaskView,
};
use crate::user::{UserRegistry, UserSummary};

pub struct NewOptions {
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub assigned_to: Vec<String>,
    pub todos: Vec<String>,
    pub checklist: Option<String>,
    pub attachments: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub assigned_to: Vec<String>,
    pub clear_assignees: bool,
    pub checklist: Option<String>,
    pub attachments: Vec<String>,
    pub clear_attachments: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ChecklistOptions {
    pub id: String,
    pub items: Option<String>,
    pub check: Vec<usize>,
    pub uncheck: Vec<usize>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

/// Expand assignee ids into user summaries for a task view. Ids that no
/// longer resolve are skipped rather than failing the view.
fn view_for(task: Task, users: &UserRegistry) -> TaskView {
    let assigned_to: Vec<UserSummary> = task
        .assigned_to
        .iter()
        .filter_map(|id| users.find(id))
        .map(UserSummary::from)
        .collect();
    TaskView::new(task, assigned_to)
}

/// Parse a due date given as `YYYY-MM-DD` or RFC 3339.
fn parse_due_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(Error::Validation(format!(
        "invalid due date '{input}' (expected YYYY-MM-DD or RFC 3339)"
    )))
}

fn human_task_line(view: &TaskView) -> String {
    format!(
        "[{}][{}] {} {} ({}/{} done)",
        view.status,
        view.priority,
        view.id,
        view.title,
        view.completed_checklist_count,
        view.todo_checklist.len()
    )
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let caller = ctx.caller(options.user.as_deref())?;
    ensure_admin(&caller, "creating tasks")?;

    let title = options.title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title cannot be empty".to_string()));
    }

    let priority = match options.priority.as_deref() {
        Some(value) => Priority::from_arg(value)?,
        None => ctx.config.tasks.default_priority(),
    };
    let due_date = options.due.as_deref().map(parse_due_date).transpose()?;
    let todo_checklist = match options.checklist.as_deref() {
        Some(json) => parse_checklist(json)?,
        None => options
            .todos
            .into_iter()
            .map(|text| ChecklistItem {
                text,
                completed: false,
            })
            .collect(),
    };

    let task = Task::create(
        NewTask {
            title: title.to_string(),
            description: options.description,
            priority,
            due_date,
            assigned_to: options.assigned_to,
            todo_checklist,
            attachments: options.attachments,
        },
        &caller.id,
        Utc::now(),
    );
    let saved = ctx.store.save_task(task)?;
    let view = view_for(saved, &ctx.users);

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", view.id.clone());
    human.push_summary("Status", view.status.clone());
    human.push_summary("Priority", view.priority.clone());
    human.push_summary("Progress", format!("{}%", view.progress));
    human.push_summary("Assignees", view.assigned_to.len().to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task new",
        &view,
        Some(&human),
    )
}

#[derive(serde::Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<TaskView>,
    status_summary: StatusSummary,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let caller = ctx.caller(options.user.as_deref())?;
    let scope = Scope::for_caller(&caller);

    let status = options
        .status
        .as_deref()
        .map(Status::from_arg)
        .transpose()?;
    let mut tasks = ctx.store.find_tasks(&scope.filter().with_status(status))?;
    tasks.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    // The summary always covers the whole scope; the status filter only
    // narrows the returned tasks.
    let summary = status_summary(&ctx.store, &scope)?;

    let views: Vec<TaskView> = tasks
        .into_iter()
        .map(|task| view_for(task, &ctx.users))
        .collect();

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", views.len().to_string());
    human.push_summary(
        "Scope",
        format!(
            "{} pending, {} in progress, {} completed ({} all)",
            summary.pending, summary.in_progress, summary.completed, summary.all
        ),
    );
    for view in &views {
        human.push_detail(human_task_line(view));
    }

    let output = TaskListOutput {
        total: views.len(),
        tasks: views,
        status_summary: summary,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let _caller = ctx.caller(options.user.as_deref())?;

    let task = ctx.store.find_task(&options.id)?;
    let view = view_for(task, &ctx.users);

    let mut human = HumanOutput::new(format!("Task {}", view.id));
    human.push_summary("Title", view.title.clone());
    human.push_summary("Status", view.status.clone());
    human.push_summary("Priority", view.priority.clone());
    human.push_summary("Progress", format!("{}%", view.progress));
    if let Some(due) = view.due_date {
        human.push_summary("Due", due.to_rfc3339());
    }
    for item in &view.todo_checklist {
        let mark = if item.completed { "x" } else { " " };
        human.push_detail(format!("[{mark}] {}", item.text));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task show",
        &view,
        Some(&human),
    )
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let _caller = ctx.caller(options.user.as_deref())?;

    // Validate every supplied field before anything merges, so a bad field
    // never leaves a half-applied update behind.
    let priority = options
        .priority
        .as_deref()
        .map(Priority::from_arg)
        .transpose()?;
    let due_date = if options.clear_due {
        Some(None)
    } else {
        options
            .due
            .as_deref()
            .map(|raw| parse_due_date(raw).map(Some))
            .transpose()?
    };
    let todo_checklist = options
        .checklist
        .as_deref()
        .map(parse_checklist)
        .transpose()?;
    let assigned_to = if options.clear_assignees {
        Some(Vec::new())
    } else if options.assigned_to.is_empty() {
        None
    } else {
        Some(options.assigned_to)
    };
    let attachments = if options.clear_attachments {
        Some(Vec::new())
    } else if options.attachments.is_empty() {
        None
    } else {
        Some(options.attachments)
    };

    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        priority,
        due_date,
        attachments,
        todo_checklist,
        assigned_to,
    };
    if patch.is_empty() {
        return Err(Error::Validation("no fields to update".to_string()));
    }

    let mut task = ctx.store.find_task(&options.id)?;
    task.apply_patch(patch);
    let saved = ctx.store.save_task(task)?;
    let view = view_for(saved, &ctx.users);

    let mut human = HumanOutput::new("Task updated");
    human.push_summary("ID", view.id.clone());
    human.push_detail(human_task_line(&view));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task update",
        &view,
        Some(&human),
    )
}

#[derive(serde::Serialize)]
struct TaskDeletedOutput {
    id: String,
    deleted: bool,
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let caller = ctx.caller(options.user.as_deref())?;
    ensure_admin(&caller, "deleting tasks")?;

    // Resolve first so a missing id reports not-found, not forbidden noise
    let task = ctx.store.find_task(&options.id)?;
    ctx.store.delete_task(&task.id)?;

    let output = TaskDeletedOutput {
        id: task.id.clone(),
        deleted: true,
    };

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", task.id);
    human.push_summary("Title", task.title);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task rm",
        &output,
        Some(&human),
    )
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let caller = ctx.caller(options.user.as_deref())?;

    let status = Status::from_arg(&options.status)?;
    let mut task = ctx.store.find_task(&options.id)?;
    ensure_task_participant(&caller, &task, "change the status of")?;

    task.set_status(status);
    let saved = ctx.store.save_task(task)?;
    let view = view_for(saved, &ctx.users);

    let mut human = HumanOutput::new("Task status updated");
    human.push_summary("ID", view.id.clone());
    human.push_summary("Status", view.status.clone());
    human.push_summary("Progress", format!("{}%", view.progress));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task status",
        &view,
        Some(&human),
    )
}

pub fn run_checklist(options: ChecklistOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;

    // Shape validation comes first: a malformed checklist aborts before the
    // task is even looked up.
    let replacement = options
        .items
        .as_deref()
        .map(parse_checklist)
        .transpose()?;

    let caller = ctx.caller(options.user.as_deref())?;
    let mut task = ctx.store.find_task(&options.id)?;
    ensure_task_participant(&caller, &task, "update the checklist of")?;

    let items = match replacement {
        Some(items) => items,
        None => {
            if options.check.is_empty() && options.uncheck.is_empty() {
                return Err(Error::Validation(
                    "supply a checklist JSON array or --check/--uncheck positions".to_string(),
                ));
            }
            let mut items = task.todo_checklist.clone();
            for (position, completed) in options
                .check
                .iter()
                .map(|p| (*p, true))
                .chain(options.uncheck.iter().map(|p| (*p, false)))
            {
                let item = position
                    .checked_sub(1)
                    .and_then(|idx| items.get_mut(idx))
                    .ok_or_else(|| {
                        Error::Validation(format!(
                            "no checklist item at position {position} (list has {} items)",
                            task.todo_checklist.len()
                        ))
                    })?;
                item.completed = completed;
            }
            items
        }
    };

    task.replace_checklist(items);
    let saved = ctx.store.save_task(task)?;
    let view = view_for(saved, &ctx.users);

    let mut human = HumanOutput::new("Checklist updated");
    human.push_summary("ID", view.id.clone());
    human.push_summary("Status", view.status.clone());
    human.push_summary("Progress", format!("{}%", view.progress));
    human.push_summary(
        "Items",
        format!(
            "{}/{} done",
            view.completed_checklist_count,
            view.todo_checklist.len()
        ),
    );

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task checklist",
        &view,
        Some(&human),
    )
}
