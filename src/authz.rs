//! Capability checks for task operations.
//!
//! Authorization rules live here instead of inline role comparisons at each
//! call site. Board management (task creation/deletion, user listing, the
//! all-tasks dashboard) is admin-only; status and checklist updates are open
//! to any assignee of the target task as well as admins.

use crate::error::{Error, Result};
use crate::task::Task;
use crate::user::User;

pub fn can_manage_board(caller: &User) -> bool {
    caller.is_admin()
}

pub fn can_act_on_task(caller: &User, task: &Task) -> bool {
    caller.is_admin() || task.is_assigned_to(&caller.id)
}

pub fn ensure_admin(caller: &User, action: &str) -> Result<()> {
    if can_manage_board(caller) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!("{action} requires the admin role")))
    }
}

pub fn ensure_task_participant(caller: &User, task: &Task, action: &str) -> Result<()> {
    if can_act_on_task(caller, task) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "only an assignee or an admin may {action} this task"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, Priority};
    use crate::user::Role;
    use chrono::Utc;

    fn user_with_role(role: Role) -> User {
        User::register(
            "Test".to_string(),
            format!("{}@example.com", role.label()),
            role,
            None,
            Utc::now(),
        )
    }

    fn task_assigned_to(user: &User) -> Task {
        Task::create(
            NewTask {
                title: "Task".to_string(),
                description: String::new(),
                priority: Priority::Low,
                due_date: None,
                assigned_to: vec![user.id.clone()],
                todo_checklist: Vec::new(),
                attachments: Vec::new(),
            },
            "creator",
            Utc::now(),
        )
    }

    #[test]
    fn admin_passes_every_check() {
        let admin = user_with_role(Role::Admin);
        let member = user_with_role(Role::Member);
        let task = task_assigned_to(&member);

        assert!(ensure_admin(&admin, "delete task").is_ok());
        assert!(ensure_task_participant(&admin, &task, "update").is_ok());
    }

    #[test]
    fn assignee_may_act_on_task_but_not_manage_board() {
        let member = user_with_role(Role::Member);
        let task = task_assigned_to(&member);

        assert!(ensure_task_participant(&member, &task, "update").is_ok());
        assert!(matches!(
            ensure_admin(&member, "create task"),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn outsider_is_forbidden() {
        let member = user_with_role(Role::Member);
        let outsider = user_with_role(Role::Member);
        let task = task_assigned_to(&member);

        assert!(matches!(
            ensure_task_participant(&outsider, &task, "update"),
            Err(Error::Forbidden(_))
        ));
    }
}
