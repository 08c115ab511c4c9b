//! Configuration loading and management
//!
//! Handles parsing of `.taskhub.toml` files at the data root.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::task::Priority;
use crate::user::Role;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// User registration configuration
    #[serde(default)]
    pub users: UsersConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Dashboard configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// User registration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersConfig {
    /// Invite token that elevates a registration to the admin role.
    /// Unset means no self-service admin registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_invite_token: Option<String>,

    /// Role assigned to registrations without a matching invite token
    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_role() -> String {
    "member".to_string()
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            admin_invite_token: None,
            default_role: default_role(),
        }
    }
}

impl UsersConfig {
    pub fn default_role(&self) -> Role {
        Role::from_arg(&self.default_role).unwrap_or(Role::Member)
    }
}

/// Task defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority used when a new task does not specify one
    #[serde(default = "default_priority")]
    pub default_priority: String,
}

fn default_priority() -> String {
    "Medium".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
        }
    }
}

impl TasksConfig {
    pub fn default_priority(&self) -> Priority {
        Priority::parse(&self.default_priority).unwrap_or(Priority::Medium)
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// How many recent tasks the dashboard returns
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_recent_limit() -> usize {
    10
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a `.taskhub.toml` file
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data root, or return defaults
    pub fn load_from_root(root: &PathBuf) -> Self {
        let config_path = root.join(".taskhub.toml");
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if Role::from_arg(&self.users.default_role).is_err() {
            return Err(crate::error::Error::InvalidConfig(format!(
                "users.default_role '{}' is not a known role",
                self.users.default_role
            )));
        }

        if let Some(token) = &self.users.admin_invite_token {
            if token.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "users.admin_invite_token cannot be empty".to_string(),
                ));
            }
        }

        if Priority::parse(&self.tasks.default_priority).is_none() {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.default_priority '{}' is not a known priority",
                self.tasks.default_priority
            )));
        }

        if self.dashboard.recent_limit == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "dashboard.recent_limit must be >= 1".to_string(),
            ));
        }

        Ok(())
    }
}
