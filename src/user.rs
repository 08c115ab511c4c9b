//! Users, roles, and caller identity.
//!
//! Credential handling (passwords, session tokens) lives outside this crate;
//! taskhub consumes an authenticated caller as "a known user with a role".
//! The users registry holds the records the boundary resolves callers from.
//!
//! Caller resolution order:
//! 1) CLI --user (explicit), id or email
//! 2) TASKHUB_USER environment variable (wired through the clap env fallback)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Caller role. Admins manage the board; members act on assigned tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn from_arg(input: &str) -> Result<Role> {
        match input.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Validation(format!(
                "unknown role '{other}' (expected member|admin)"
            ))),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default = "default_user_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn register(
        name: String,
        email: String,
        role: Role,
        profile_image_url: Option<String>,
        now: DateTime<Utc>,
    ) -> User {
        User {
            id: default_user_id(),
            name,
            email,
            role,
            profile_image_url,
            created_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn default_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// The projection embedded in task views in place of raw assignee ids
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

/// Decide the role for a registration attempt. A correct invite token
/// elevates to admin; anything else gets the configured default.
pub fn role_for_registration(
    supplied_token: Option<&str>,
    expected_token: Option<&str>,
    default_role: Role,
) -> Role {
    match (supplied_token, expected_token) {
        (Some(supplied), Some(expected)) if !expected.is_empty() && supplied == expected => {
            Role::Admin
        }
        _ => default_role,
    }
}

/// Registry of all users, persisted as `users.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRegistry {
    pub users: Vec<User>,
}

impl UserRegistry {
    /// Find a user by id
    pub fn find(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    /// Find a user by email (case-insensitive)
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// Resolve an id-or-email key to a user
    pub fn resolve(&self, key: &str) -> Option<&User> {
        self.find(key).or_else(|| self.find_by_email(key))
    }

    /// Insert a user (reject duplicate emails)
    pub fn insert(&mut self, user: User) -> Result<()> {
        if user.name.trim().is_empty() {
            return Err(Error::Validation("name cannot be empty".to_string()));
        }
        if user.email.trim().is_empty() {
            return Err(Error::Validation("email cannot be empty".to_string()));
        }
        if self.find_by_email(&user.email).is_some() {
            return Err(Error::Validation(format!(
                "user already exists: {}",
                user.email
            )));
        }

        self.users.push(user);
        Ok(())
    }

    /// Remove a user by id
    pub fn remove(&mut self, id: &str) -> Option<User> {
        if let Some(idx) = self.users.iter().position(|user| user.id == id) {
            Some(self.users.remove(idx))
        } else {
            None
        }
    }

    /// Validate registry entries (unique ids and emails)
    pub fn validate(&self) -> Result<()> {
        let mut ids = std::collections::HashSet::new();
        let mut emails = std::collections::HashSet::new();
        for user in &self.users {
            if !ids.insert(user.id.clone()) {
                return Err(Error::Validation(format!(
                    "duplicate user id: {}",
                    user.id
                )));
            }
            if !emails.insert(user.email.to_ascii_lowercase()) {
                return Err(Error::Validation(format!(
                    "duplicate user email: {}",
                    user.email
                )));
            }
        }
        Ok(())
    }
}

/// Resolve the calling user from the boundary-supplied identity key.
pub fn resolve_caller(registry: &UserRegistry, key: Option<&str>) -> Result<User> {
    let key = non_empty(key).ok_or(Error::Unauthenticated)?;
    registry
        .resolve(key)
        .cloned()
        .ok_or_else(|| Error::UserNotFound(key.to_string()))
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
