//! taskhub user command implementations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::authz::ensure_admin;
use crate::cli::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskFilter;
use crate::task::Status;
use crate::user::{role_for_registration, Role, User};

pub struct AddOptions {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub invite: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
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

/// Registration is open: no caller identity required. Role elevation only
/// happens through the configured invite token.
pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;

    let name = options.name.trim();
    let email = options.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(Error::Validation(
            "name and email are required".to_string(),
        ));
    }

    let role = role_for_registration(
        options.invite.as_deref(),
        ctx.config.users.admin_invite_token.as_deref(),
        ctx.config.users.default_role(),
    );

    let user = User::register(
        name.to_string(),
        email.to_string(),
        role,
        options.image,
        Utc::now(),
    );
    let saved = ctx.store.add_user(user)?;

    let mut human = HumanOutput::new("User registered");
    human.push_summary("ID", saved.id.clone());
    human.push_summary("Name", saved.name.clone());
    human.push_summary("Role", saved.role.label());
    if saved.role == Role::Member {
        human.push_next_step(format!("taskhub task list --user {}", saved.id));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user add",
        &saved,
        Some(&human),
    )
}

/// A user row in the admin listing, augmented with assigned-task counts
#[derive(serde::Serialize)]
struct UserOverview {
    id: String,
    name: String,
    email: String,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_image_url: Option<String>,
    created_at: DateTime<Utc>,
    pending_tasks: usize,
    in_progress_tasks: usize,
    completed_tasks: usize,
}

#[derive(serde::Serialize)]
struct UserListOutput {
    total: usize,
    users: Vec<UserOverview>,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let caller = ctx.caller(options.user.as_deref())?;
    ensure_admin(&caller, "listing users")?;

    let mut overviews = Vec::new();
    for user in ctx.store.list_users()? {
        let scoped = TaskFilter::assigned_to(user.id.clone());
        let pending_tasks = ctx
            .store
            .count_tasks(&scoped.clone().with_status(Some(Status::Pending)))?;
        let in_progress_tasks = ctx
            .store
            .count_tasks(&scoped.clone().with_status(Some(Status::InProgress)))?;
        let completed_tasks = ctx
            .store
            .count_tasks(&scoped.with_status(Some(Status::Completed)))?;

        overviews.push(UserOverview {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at,
            pending_tasks,
            in_progress_tasks,
            completed_tasks,
        });
    }

    let mut human = HumanOutput::new("Users");
    human.push_summary("Total", overviews.len().to_string());
    for user in &overviews {
        human.push_detail(format!(
            "[{}] {} <{}> — {} pending, {} in progress, {} completed",
            user.role.label(),
            user.name,
            user.email,
            user.pending_tasks,
            user.in_progress_tasks,
            user.completed_tasks
        ));
    }

    let output = UserListOutput {
        total: overviews.len(),
        users: overviews,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let _caller = ctx.caller(options.user.as_deref())?;

    let user = ctx
        .users
        .resolve(&options.id)
        .cloned()
        .ok_or_else(|| Error::UserNotFound(options.id.clone()))?;

    let mut human = HumanOutput::new(format!("User {}", user.id));
    human.push_summary("Name", user.name.clone());
    human.push_summary("Email", user.email.clone());
    human.push_summary("Role", user.role.label());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user show",
        &user,
        Some(&human),
    )
}
