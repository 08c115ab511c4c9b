//! taskhub - Multi-User Task Tracking Library
//!
//! This library provides the core functionality for the taskhub CLI:
//! a task board where admins create and assign work, members tick checklist
//! items, and derived state (progress, status) stays consistent with the
//! checklist that drives it.
//!
//! # Core Concepts
//!
//! - **State engine**: checklist replacement recomputes progress and status;
//!   a direct write of Completed force-completes the checklist
//! - **Field patches**: explicit present/absent per field, so clearing a
//!   value is distinct from omitting it
//! - **Scopes**: admins aggregate the whole board, members their assigned
//!   tasks
//! - **Dashboard**: independent counts, label-normalized status
//!   distribution, priority levels, and the most recent tasks
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `.taskhub.toml`
//! - `error`: error types and result aliases
//! - `task`: task records and the state engine
//! - `user`: users, roles, and caller resolution
//! - `authz`: capability checks
//! - `store`: file-backed registries and the repository surface
//! - `dashboard`: aggregation engine
//! - `lock`: file locking and atomic writes
//! - `output`: shared CLI output formatting

pub mod authz;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod lock;
pub mod output;
pub mod store;
pub mod task;
pub mod user;

pub use error::{Error, Result};
