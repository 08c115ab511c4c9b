mod support;

use serde_json::{json, Value};

use support::{parse_json, TestBoard};

fn admin_dashboard(board: &TestBoard, admin: &str) -> Value {
    let output = board
        .cmd()
        .args(["dashboard", "--user", admin, "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    parse_json(&output)["data"].clone()
}

#[test]
fn board_dashboard_is_admin_only() {
    let (board, admin, member) = TestBoard::with_team();

    board
        .cmd()
        .args(["dashboard", "--user", &member])
        .assert()
        .failure()
        .code(3);

    board
        .cmd()
        .args(["dashboard", "--user", &admin])
        .assert()
        .success();

    // --mine is open to any caller
    board
        .cmd()
        .args(["dashboard", "--mine", "--user", &member])
        .assert()
        .success();
}

#[test]
fn distribution_covers_every_status_and_sums_to_all() {
    let (board, admin, member) = TestBoard::with_team();
    board.create_task(&admin, "Pending", &[&member], &["a"]);
    let active = board.create_task(&admin, "Active", &[&member], &["a", "b"]);
    let finished = board.create_task(&admin, "Finished", &[&member], &["a"]);

    board
        .cmd()
        .args([
            "task",
            "checklist",
            &active,
            r#"[{"text":"a","completed":true},{"text":"b","completed":false}]"#,
            "--user",
            &member,
        ])
        .assert()
        .success();
    board
        .cmd()
        .args(["task", "status", &finished, "Completed", "--user", &member])
        .assert()
        .success();

    let data = admin_dashboard(&board, &admin);
    let dist = &data["charts"]["task_distribution"];

    assert_eq!(dist["Pending"].as_u64(), Some(1));
    assert_eq!(dist["InProgress"].as_u64(), Some(1));
    assert_eq!(dist["Completed"].as_u64(), Some(1));
    assert_eq!(dist["All"].as_u64(), Some(3));
    assert_eq!(
        dist["Pending"].as_u64().unwrap()
            + dist["InProgress"].as_u64().unwrap()
            + dist["Completed"].as_u64().unwrap(),
        dist["All"].as_u64().unwrap()
    );

    assert_eq!(data["statistics"]["total_tasks"].as_u64(), Some(3));
    assert_eq!(data["statistics"]["pending_tasks"].as_u64(), Some(1));
    assert_eq!(data["statistics"]["completed_tasks"].as_u64(), Some(1));
}

#[test]
fn legacy_status_spellings_aggregate_and_unknown_are_excluded() {
    let (board, admin, member) = TestBoard::with_team();
    let drifted = board.create_task(&admin, "Drifted", &[&member], &[]);
    let shouting = board.create_task(&admin, "Shouting", &[&member], &[]);
    let stray = board.create_task(&admin, "Stray", &[&member], &[]);

    board.rewrite_task_field(&drifted, "status", json!("in progress"));
    board.rewrite_task_field(&shouting, "status", json!("IN_PROGRESS"));
    board.rewrite_task_field(&stray, "status", json!("archived"));

    let data = admin_dashboard(&board, &admin);
    let dist = &data["charts"]["task_distribution"];

    // Both drifted spellings land in InProgress; "archived" matches nothing
    // and is silently excluded, though the total still sees the row.
    assert_eq!(dist["InProgress"].as_u64(), Some(2));
    assert_eq!(dist["Pending"].as_u64(), Some(0));
    assert_eq!(dist["All"].as_u64(), Some(3));
    assert!(dist.get("archived").is_none());
}

#[test]
fn priority_levels_count_exact_labels_only() {
    let (board, admin, member) = TestBoard::with_team();
    board.create_task(&admin, "Default priority", &[&member], &[]);
    let drifted = board.create_task(&admin, "Drifted priority", &[&member], &[]);
    board.rewrite_task_field(&drifted, "priority", json!("medium"));

    let data = admin_dashboard(&board, &admin);
    let levels = &data["charts"]["task_priority_levels"];

    assert_eq!(levels["Medium"].as_u64(), Some(1));
    assert_eq!(levels["Low"].as_u64(), Some(0));
    assert_eq!(levels["High"].as_u64(), Some(0));
}

#[test]
fn overdue_counts_past_due_uncompleted_tasks() {
    let (board, admin, member) = TestBoard::with_team();

    let mut cmd = board.cmd();
    cmd.args([
        "task", "new", "Late", "--user", &admin,
        "--assign", &member, "--due", "2020-01-01", "--todo", "a",
    ]);
    cmd.assert().success();

    let mut cmd = board.cmd();
    cmd.args([
        "task", "new", "Late but done", "--user", &admin,
        "--assign", &member, "--due", "2020-01-01",
        "--checklist", r#"[{"text":"a","completed":true}]"#,
    ]);
    cmd.assert().success();

    let mut cmd = board.cmd();
    cmd.args([
        "task", "new", "Future", "--user", &admin,
        "--assign", &member, "--due", "2099-01-01",
    ]);
    cmd.assert().success();

    let data = admin_dashboard(&board, &admin);
    assert_eq!(data["statistics"]["overdue_tasks"].as_u64(), Some(1));
}

#[test]
fn recent_tasks_are_newest_first_and_capped() {
    let (board, admin, member) = TestBoard::with_team();
    for i in 0..12 {
        board.create_task(&admin, &format!("Task {i}"), &[&member], &[]);
    }

    let data = admin_dashboard(&board, &admin);
    let recent = data["recent_tasks"].as_array().expect("recent array");

    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0]["title"].as_str(), Some("Task 11"));
    assert_eq!(recent[9]["title"].as_str(), Some("Task 2"));
    // Digest projection only
    assert!(recent[0].get("todo_checklist").is_none());
    assert!(recent[0].get("assigned_to").is_none());
}

#[test]
fn recent_limit_is_configurable() {
    let (board, admin, member) = TestBoard::with_team();
    board
        .write_config(
            "[users]\nadmin_invite_token = \"sesame\"\n\n[dashboard]\nrecent_limit = 3\n",
        )
        .unwrap();
    for i in 0..5 {
        board.create_task(&admin, &format!("Task {i}"), &[&member], &[]);
    }

    let data = admin_dashboard(&board, &admin);
    assert_eq!(data["recent_tasks"].as_array().unwrap().len(), 3);
}

#[test]
fn mine_dashboard_scopes_to_the_caller() {
    let (board, admin, member) = TestBoard::with_team();
    board.create_task(&admin, "Mine", &[&member], &["a"]);
    board.create_task(&admin, "Someone else's", &[], &["a"]);

    let output = board
        .cmd()
        .args(["dashboard", "--mine", "--user", &member, "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let data = &parse_json(&output)["data"];

    assert_eq!(data["statistics"]["total_tasks"].as_u64(), Some(1));
    assert_eq!(data["charts"]["task_distribution"]["All"].as_u64(), Some(1));
    assert_eq!(data["recent_tasks"][0]["title"].as_str(), Some("Mine"));

    // An admin can also scope down to their own assignments
    let output = board
        .cmd()
        .args(["dashboard", "--mine", "--user", &admin, "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        parse_json(&output)["data"]["statistics"]["total_tasks"].as_u64(),
        Some(0)
    );
}
