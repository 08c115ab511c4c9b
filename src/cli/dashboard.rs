//! taskhub dashboard command implementation.

use std::path::PathBuf;

use chrono::Utc;

use crate::authz::ensure_admin;
use crate::cli::Context;
use crate::dashboard::{compute, Scope};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct DashboardOptions {
    pub mine: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_dashboard(options: DashboardOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let caller = ctx.caller(options.user.as_deref())?;

    // The whole-board view is admin territory; --mine scopes any caller to
    // their own assigned tasks.
    let scope = if options.mine {
        Scope::AssignedTo(caller.id.clone())
    } else {
        ensure_admin(&caller, "the board dashboard")?;
        Scope::All
    };

    let dashboard = compute(&ctx.store, &scope, &ctx.config, Utc::now())?;

    let mut human = HumanOutput::new(if options.mine {
        "My dashboard"
    } else {
        "Board dashboard"
    });
    human.push_summary("Total", dashboard.statistics.total_tasks.to_string());
    human.push_summary("Pending", dashboard.statistics.pending_tasks.to_string());
    human.push_summary("Completed", dashboard.statistics.completed_tasks.to_string());
    human.push_summary("Overdue", dashboard.statistics.overdue_tasks.to_string());
    human.push_summary(
        "Priorities",
        dashboard
            .charts
            .task_priority_levels
            .iter()
            .map(|(label, count)| format!("{label}: {count}"))
            .collect::<Vec<_>>()
            .join(", "),
    );
    for task in &dashboard.recent_tasks {
        human.push_detail(format!(
            "[{}][{}] {} {}",
            task.status, task.priority, task.id, task.title
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "dashboard",
        &dashboard,
        Some(&human),
    )
}
