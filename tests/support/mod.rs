#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    /// Create a tempdir data root and run `taskhub init` in it.
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let board = Self { dir };
        board.cmd().arg("init").assert().success();
        board
    }

    /// Standard team fixture: invite token configured, one admin and one
    /// member registered. Returns (board, admin_id, member_id).
    pub fn with_team() -> (Self, String, String) {
        let board = Self::init();
        board
            .write_config("[users]\nadmin_invite_token = \"sesame\"\n")
            .expect("write config");
        let admin = board.add_user("Ada Admin", "ada@example.com", Some("sesame"));
        let member = board.add_user("Mel Member", "mel@example.com", None);
        (board, admin, member)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskhub").expect("taskhub binary");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("TASKHUB_USER");
        cmd.env_remove("TASKHUB_DATA");
        cmd
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(".taskhub.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.dir.path().join(".taskhub").join("tasks.json")
    }

    /// Register a user and return its id. A matching invite token in the
    /// config elevates the role to admin.
    pub fn add_user(&self, name: &str, email: &str, invite: Option<&str>) -> String {
        let mut cmd = self.cmd();
        cmd.args(["user", "add", name, email, "--json"]);
        if let Some(token) = invite {
            cmd.args(["--invite", token]);
        }
        let output = cmd.assert().success().get_output().stdout.clone();
        let value: Value = serde_json::from_slice(&output).expect("user add json");
        value["data"]["id"].as_str().expect("user id").to_string()
    }

    /// Create a task as the given admin and return its id.
    pub fn create_task(
        &self,
        admin: &str,
        title: &str,
        assignees: &[&str],
        todos: &[&str],
    ) -> String {
        let mut cmd = self.cmd();
        cmd.args(["task", "new", title, "--user", admin, "--json"]);
        for assignee in assignees {
            cmd.args(["--assign", assignee]);
        }
        for todo in todos {
            cmd.args(["--todo", todo]);
        }
        let output = cmd.assert().success().get_output().stdout.clone();
        let value: Value = serde_json::from_slice(&output).expect("task new json");
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    /// Rewrite a persisted task field directly, bypassing the write
    /// boundary. Used to fabricate legacy rows.
    pub fn rewrite_task_field(&self, task_id: &str, field: &str, value: Value) {
        let path = self.tasks_file();
        let raw = fs::read_to_string(&path).expect("read tasks.json");
        let mut registry: Value = serde_json::from_str(&raw).expect("parse tasks.json");
        let tasks = registry["tasks"].as_array_mut().expect("tasks array");
        let task = tasks
            .iter_mut()
            .find(|task| task["id"].as_str() == Some(task_id))
            .expect("task present");
        task[field] = value;
        fs::write(&path, serde_json::to_string_pretty(&registry).expect("json"))
            .expect("write tasks.json");
    }
}

/// Parse a command's JSON envelope from captured stdout.
pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("json envelope")
}
