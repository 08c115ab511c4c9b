//! File-backed store for taskhub state.
//!
//! Layout under the data root:
//!
//! ```text
//! .taskhub/
//!   tasks.json    # task registry
//!   users.json    # user registry
//! .taskhub.toml   # configuration (optional)
//! ```
//!
//! Registries are read and rewritten wholesale under a per-file lock, with
//! atomic temp-then-rename writes so readers never observe a torn file. The
//! store exposes the repository surface the engines consume: find by id,
//! find by filter, count by filter, group-by count, save, delete. There is
//! no per-record versioning; concurrent saves of the same task resolve as
//! last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::{lock_path_for, write_atomic, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::{Status, Task};
use crate::user::{User, UserRegistry};

/// Name of the data directory under the root
pub const DATA_DIR: &str = ".taskhub";

/// Name of the config file at the root
pub const CONFIG_FILE: &str = ".taskhub.toml";

const TASKS_FILE: &str = "tasks.json";
const USERS_FILE: &str = "users.json";

/// Registry of all tasks, persisted as `tasks.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRegistry {
    pub tasks: Vec<Task>,
}

impl TaskRegistry {
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        if let Some(idx) = self.tasks.iter().position(|task| task.id == id) {
            Some(self.tasks.remove(idx))
        } else {
            None
        }
    }
}

/// Filter over tasks, mirroring the repository query surface.
///
/// Status comparison goes through the lenient label parse, so a filter
/// matches legacy rows with drifted casing the same way the dashboard does.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub assigned_to: Option<String>,
    pub due_before: Option<DateTime<Utc>>,
    pub exclude_completed: bool,
}

impl TaskFilter {
    /// Scope filter for a member: only tasks assigned to them
    pub fn assigned_to(user_id: impl Into<String>) -> Self {
        TaskFilter {
            assigned_to: Some(user_id.into()),
            ..TaskFilter::default()
        }
    }

    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.parsed_status() != Some(status) {
                return false;
            }
        }
        if let Some(user_id) = &self.assigned_to {
            if !task.is_assigned_to(user_id) {
                return false;
            }
        }
        if let Some(cutoff) = self.due_before {
            if !task.due_date.is_some_and(|due| due < cutoff) {
                return false;
            }
        }
        if self.exclude_completed && task.is_completed() {
            return false;
        }
        true
    }
}

/// One row of a group-by count, keyed by the raw persisted label
#[derive(Debug, Clone, Serialize)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// Field a group-by count runs over
#[derive(Debug, Clone, Copy)]
pub enum GroupField {
    Status,
    Priority,
}

/// Store manager rooted at a data directory
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir().join(TASKS_FILE)
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir().join(USERS_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the data directory and seed empty registries
    pub fn init_all(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir())?;

        if !self.tasks_file().exists() {
            self.write_json(&self.tasks_file(), &TaskRegistry::default())?;
        }
        if !self.users_file().exists() {
            self.write_json(&self.users_file(), &UserRegistry::default())?;
        }

        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir().exists()
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    fn read_registry<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        self.read_json(path)
    }

    /// Locked read-modify-write over the task registry
    fn update_tasks<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskRegistry) -> Result<T>,
    {
        let path = self.tasks_file();
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry: TaskRegistry = self.read_registry(&path)?;
        let result = f(&mut registry)?;

        let json = serde_json::to_string_pretty(&registry)?;
        write_atomic(&path, json.as_bytes())?;

        Ok(result)
    }

    /// Locked read-modify-write over the user registry
    fn update_users<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut UserRegistry) -> Result<T>,
    {
        let path = self.users_file();
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry: UserRegistry = self.read_registry(&path)?;
        let result = f(&mut registry)?;
        registry.validate()?;

        let json = serde_json::to_string_pretty(&registry)?;
        write_atomic(&path, json.as_bytes())?;

        Ok(result)
    }

    // =========================================================================
    // Task repository surface
    // =========================================================================

    /// Load the full task registry (read-only)
    pub fn load_tasks(&self) -> Result<TaskRegistry> {
        self.read_registry(&self.tasks_file())
    }

    /// Find a task by id
    pub fn find_task(&self, id: &str) -> Result<Task> {
        self.load_tasks()?
            .find(id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Find all tasks matching a filter
    pub fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let registry = self.load_tasks()?;
        Ok(registry
            .tasks
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect())
    }

    /// Count tasks matching a filter.
    ///
    /// Each call re-reads the registry; a set of counts issued back to back
    /// is not a transaction and may straddle a concurrent write.
    pub fn count_tasks(&self, filter: &TaskFilter) -> Result<usize> {
        let registry = self.load_tasks()?;
        Ok(registry
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .count())
    }

    /// Count tasks matching a filter, grouped by the raw persisted label of
    /// the given field. Labels are returned as stored; callers decide how to
    /// normalize or exclude them.
    pub fn group_task_count(
        &self,
        field: GroupField,
        filter: &TaskFilter,
    ) -> Result<Vec<GroupCount>> {
        let registry = self.load_tasks()?;
        let mut counts = std::collections::BTreeMap::new();
        for task in registry.tasks.iter().filter(|task| filter.matches(task)) {
            let label = match field {
                GroupField::Status => task.status.clone(),
                GroupField::Priority => task.priority.clone(),
            };
            *counts.entry(label).or_insert(0usize) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(label, count)| GroupCount { label, count })
            .collect())
    }

    /// Insert or replace a task by id, stamping `updated_at`.
    ///
    /// The replace is unconditional: the last writer wins and no
    /// stale-version conflict is reported.
    pub fn save_task(&self, mut task: Task) -> Result<Task> {
        task.updated_at = Utc::now();
        let stored = task.clone();
        self.update_tasks(|registry| {
            if let Some(existing) = registry.find_mut(&task.id) {
                *existing = task;
            } else {
                registry.tasks.push(task);
            }
            Ok(())
        })?;
        debug!(task_id = %stored.id, "saved task");
        Ok(stored)
    }

    /// Delete a task permanently
    pub fn delete_task(&self, id: &str) -> Result<()> {
        self.update_tasks(|registry| {
            registry
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))
        })?;
        debug!(task_id = %id, "deleted task");
        Ok(())
    }

    // =========================================================================
    // User repository surface
    // =========================================================================

    /// Load the full user registry (read-only)
    pub fn load_users(&self) -> Result<UserRegistry> {
        self.read_registry(&self.users_file())
    }

    /// Find a user by id
    pub fn find_user(&self, id: &str) -> Result<User> {
        self.load_users()?
            .find(id)
            .cloned()
            .ok_or_else(|| Error::UserNotFound(id.to_string()))
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.load_users()?.users)
    }

    /// Add a user (duplicate emails rejected)
    pub fn add_user(&self, user: User) -> Result<User> {
        let stored = user.clone();
        self.update_users(|registry| registry.insert(user))?;
        debug!(user_id = %stored.id, "registered user");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ChecklistItem, NewTask, Priority};
    use crate::user::Role;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Store) {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path());
        store.init_all().unwrap();
        (temp, store)
    }

    fn new_task(title: &str, assigned_to: Vec<String>) -> Task {
        Task::create(
            NewTask {
                title: title.to_string(),
                description: String::new(),
                priority: Priority::Medium,
                due_date: None,
                assigned_to,
                todo_checklist: vec![ChecklistItem {
                    text: "step".to_string(),
                    completed: false,
                }],
                attachments: Vec::new(),
            },
            "admin-1",
            Utc::now(),
        )
    }

    #[test]
    fn init_seeds_empty_registries() {
        let (_temp, store) = open_store();
        assert!(store.is_initialized());
        assert!(store.tasks_file().exists());
        assert!(store.users_file().exists());
        assert!(store.load_tasks().unwrap().tasks.is_empty());
        assert!(store.load_users().unwrap().users.is_empty());
    }

    #[test]
    fn save_and_find_roundtrip() {
        let (_temp, store) = open_store();
        let task = new_task("First", vec!["u-1".to_string()]);
        let id = task.id.clone();

        store.save_task(task).unwrap();
        let found = store.find_task(&id).unwrap();
        assert_eq!(found.title, "First");

        assert!(matches!(
            store.find_task("missing"),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn save_replaces_and_stamps_updated_at() {
        let (_temp, store) = open_store();
        let task = new_task("First", Vec::new());
        let id = task.id.clone();
        let saved = store.save_task(task).unwrap();

        let mut edited = saved.clone();
        edited.title = "Renamed".to_string();
        let resaved = store.save_task(edited).unwrap();

        assert!(resaved.updated_at >= saved.updated_at);
        let found = store.find_task(&id).unwrap();
        assert_eq!(found.title, "Renamed");
        assert_eq!(store.load_tasks().unwrap().tasks.len(), 1);
    }

    #[test]
    fn filters_match_scope_status_and_due() {
        let (_temp, store) = open_store();
        let now = Utc::now();

        let mut assigned = new_task("Mine", vec!["u-1".to_string()]);
        assigned.due_date = Some(now - chrono::Duration::days(2));
        store.save_task(assigned).unwrap();

        let mut done = new_task("Done", vec!["u-2".to_string()]);
        done.replace_checklist(vec![ChecklistItem {
            text: "only".to_string(),
            completed: true,
        }]);
        store.save_task(done).unwrap();

        assert_eq!(store.count_tasks(&TaskFilter::default()).unwrap(), 2);
        assert_eq!(
            store.count_tasks(&TaskFilter::assigned_to("u-1")).unwrap(),
            1
        );
        assert_eq!(
            store
                .count_tasks(&TaskFilter::default().with_status(Some(Status::Completed)))
                .unwrap(),
            1
        );

        // Overdue: past due and not completed
        let overdue = TaskFilter {
            due_before: Some(now),
            exclude_completed: true,
            ..TaskFilter::default()
        };
        assert_eq!(store.count_tasks(&overdue).unwrap(), 1);
    }

    #[test]
    fn status_filter_matches_legacy_labels() {
        let (_temp, store) = open_store();
        let mut task = new_task("Legacy", Vec::new());
        task.status = "in progress".to_string();
        store.save_task(task).unwrap();

        let count = store
            .count_tasks(&TaskFilter::default().with_status(Some(Status::InProgress)))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn group_count_returns_raw_labels() {
        let (_temp, store) = open_store();
        store.save_task(new_task("A", Vec::new())).unwrap();
        let mut legacy = new_task("B", Vec::new());
        legacy.status = "PENDING".to_string();
        store.save_task(legacy).unwrap();

        let rows = store
            .group_task_count(GroupField::Status, &TaskFilter::default())
            .unwrap();
        let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
        assert!(labels.contains(&"Pending"));
        assert!(labels.contains(&"PENDING"));
    }

    #[test]
    fn delete_removes_or_reports_missing() {
        let (_temp, store) = open_store();
        let task = new_task("Doomed", Vec::new());
        let id = task.id.clone();
        store.save_task(task).unwrap();

        store.delete_task(&id).unwrap();
        assert!(store.load_tasks().unwrap().tasks.is_empty());
        assert!(matches!(
            store.delete_task(&id),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn add_user_rejects_duplicate_email() {
        let (_temp, store) = open_store();
        let user = User::register(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            Role::Admin,
            None,
            Utc::now(),
        );
        store.add_user(user).unwrap();

        let dup = User::register(
            "Other".to_string(),
            "ada@example.com".to_string(),
            Role::Member,
            None,
            Utc::now(),
        );
        assert!(matches!(store.add_user(dup), Err(Error::Validation(_))));
        assert_eq!(store.list_users().unwrap().len(), 1);
    }
}
