//! Command-line interface for taskhub
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand group is implemented in its own submodule; the command
//! handlers authenticate the caller, run the domain operation, and translate
//! the result into the shared output envelope.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::store::Store;
use crate::user::{resolve_caller, User, UserRegistry};

mod dashboard;
mod init;
mod task;
mod user;

/// taskhub - multi-user task tracking
///
/// Admins create and assign tasks; members tick checklist items; progress
/// and status stay derived from the checklist, and the dashboard summarizes
/// the board.
#[derive(Parser, Debug)]
#[command(name = "taskhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the data root (defaults to current directory)
    #[arg(long, global = true, env = "TASKHUB_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Caller identity: user id or email
    #[arg(long, global = true, env = "TASKHUB_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a taskhub data directory
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// User management
    #[command(subcommand)]
    User(UserCommands),

    /// Board statistics, charts, and recent tasks
    Dashboard {
        /// Aggregate only the caller's assigned tasks instead of the
        /// whole board
        #[arg(long)]
        mine: bool,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task (admin only)
    New {
        /// Task title
        title: String,

        /// Task description
        #[arg(long, default_value = "")]
        description: String,

        /// Priority: Low, Medium, High (defaults from config)
        #[arg(long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Assignee user id (repeatable)
        #[arg(long = "assign")]
        assigned_to: Vec<String>,

        /// Checklist item text (repeatable, created unchecked)
        #[arg(long = "todo", conflicts_with = "checklist")]
        todos: Vec<String>,

        /// Full checklist as a JSON array of {"text", "completed"} items
        #[arg(long)]
        checklist: Option<String>,

        /// Attachment URL (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<String>,
    },

    /// List tasks visible to the caller, with a status summary
    List {
        /// Only show tasks with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one task
    Show {
        /// Task id
        id: String,
    },

    /// Update task fields (omitted flags keep current values)
    Update {
        /// Task id
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replace assignees with these user ids (repeatable)
        #[arg(long = "assign")]
        assigned_to: Vec<String>,

        /// Remove all assignees
        #[arg(long, conflicts_with = "assigned_to")]
        clear_assignees: bool,

        /// Replace the checklist (JSON array; derived fields are NOT
        /// recomputed by a field edit)
        #[arg(long)]
        checklist: Option<String>,

        /// Replace attachments with these URLs (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<String>,

        /// Remove all attachments
        #[arg(long, conflicts_with = "attachments")]
        clear_attachments: bool,
    },

    /// Delete a task (admin only)
    Rm {
        /// Task id
        id: String,
    },

    /// Set task status (assignee or admin). Completed force-completes the
    /// checklist.
    Status {
        /// Task id
        id: String,

        /// New status: Pending, In-Progress, Completed
        status: String,
    },

    /// Replace the checklist and recompute progress and status (assignee
    /// or admin)
    Checklist {
        /// Task id
        id: String,

        /// Checklist as a JSON array of {"text", "completed"} items
        items: Option<String>,

        /// Mark an existing item complete by its 1-based position
        /// (repeatable)
        #[arg(long = "check", conflicts_with = "items")]
        check: Vec<usize>,

        /// Mark an existing item incomplete by its 1-based position
        /// (repeatable)
        #[arg(long = "uncheck", conflicts_with = "items")]
        uncheck: Vec<usize>,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user. A matching admin invite token elevates the role.
    Add {
        /// Display name
        name: String,

        /// Email address (unique)
        email: String,

        /// Profile image URL
        #[arg(long)]
        image: Option<String>,

        /// Admin invite token
        #[arg(long)]
        invite: Option<String>,
    },

    /// List users with their assigned-task counts (admin only)
    List,

    /// Show one user
    Show {
        /// User id or email
        id: String,
    },
}

/// Shared command context: the store plus everything needed to resolve the
/// caller.
pub(crate) struct Context {
    pub store: Store,
    pub config: Config,
    pub users: UserRegistry,
}

impl Context {
    pub fn load(data_dir: Option<PathBuf>) -> Result<Context> {
        let root = data_dir.unwrap_or_else(|| PathBuf::from("."));
        let store = Store::open(root.clone());
        let config = Config::load_from_root(&root);
        let users = store.load_users()?;
        Ok(Context {
            store,
            config,
            users,
        })
    }

    /// Resolve the authenticated caller from the --user flag (or its env
    /// fallback).
    pub fn caller(&self, user: Option<&str>) -> Result<User> {
        resolve_caller(&self.users, user)
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let data_dir = self.data_dir;
        let user = self.user;
        let json = self.json;
        let quiet = self.quiet;

        match self.command {
            Commands::Init => init::run_init(init::InitOptions {
                data_dir,
                json,
                quiet,
            }),

            Commands::Task(command) => match command {
                TaskCommands::New {
                    title,
                    description,
                    priority,
                    due,
                    assigned_to,
                    todos,
                    checklist,
                    attachments,
                } => task::run_new(task::NewOptions {
                    title,
                    description,
                    priority,
                    due,
                    assigned_to,
                    todos,
                    checklist,
                    attachments,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                TaskCommands::List { status } => task::run_list(task::ListOptions {
                    status,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                TaskCommands::Update {
                    id,
                    title,
                    description,
                    priority,
                    due,
                    clear_due,
                    assigned_to,
                    clear_assignees,
                    checklist,
                    attachments,
                    clear_attachments,
                } => task::run_update(task::UpdateOptions {
                    id,
                    title,
                    description,
                    priority,
                    due,
                    clear_due,
                    assigned_to,
                    clear_assignees,
                    checklist,
                    attachments,
                    clear_attachments,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    id,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                TaskCommands::Status { id, status } => task::run_status(task::StatusOptions {
                    id,
                    status,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                TaskCommands::Checklist {
                    id,
                    items,
                    check,
                    uncheck,
                } => task::run_checklist(task::ChecklistOptions {
                    id,
                    items,
                    check,
                    uncheck,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
            },

            Commands::User(command) => match command {
                UserCommands::Add {
                    name,
                    email,
                    image,
                    invite,
                } => user::run_add(user::AddOptions {
                    name,
                    email,
                    image,
                    invite,
                    data_dir,
                    json,
                    quiet,
                }),
                UserCommands::List => user::run_list(user::ListOptions {
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                UserCommands::Show { id } => user::run_show(user::ShowOptions {
                    id,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
            },

            Commands::Dashboard { mine } => dashboard::run_dashboard(dashboard::DashboardOptions {
                mine,
                data_dir,
                user,
                json,
                quiet,
            }),
        }
    }
}
