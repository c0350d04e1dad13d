use predicates::str::contains;
use std::fs;

mod common;
use common::TestEnv;

#[test]
fn test_init_creates_database() {
    let env = TestEnv::new();

    env.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Database initialized"));

    env.cmd()
        .args(["log", "--print"])
        .assert()
        .success()
        .stdout(contains("migration_applied"))
        .stdout(contains("init"));
}

#[test]
fn test_status_transition_is_recorded() {
    let env = TestEnv::new();
    env.init();
    env.add_user("alice", false);

    env.cmd()
        .args(["status", "alice", "inactive", "--duration", "600"])
        .assert()
        .success()
        .stdout(contains("alice is now inactive"));

    let users = env.json(&["user", "list"]);
    assert_eq!(users[0]["status"], "inactive");

    let history = env.json(&["history", "alice@example.com"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["active_duration_seconds"], 600);
    assert_eq!(history[0]["notified"], false);
}

#[test]
fn test_invalid_status_is_rejected() {
    let env = TestEnv::new();
    env.init();
    env.add_user("bob", false);

    env.cmd()
        .args(["status", "bob", "off"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Invalid status"));

    env.cmd()
        .args(["status", "bob", "active", "--duration", "-5"])
        .assert()
        .failure()
        .stderr(contains("Invalid argument"));

    env.cmd()
        .args(["status", "nobody", "active"])
        .assert()
        .failure()
        .stderr(contains("Not found"));

    let n: i64 = env
        .conn()
        .query_row("SELECT COUNT(*) FROM activity_events", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn test_overtime_accumulates() {
    let env = TestEnv::new();
    env.init();
    env.add_user("carol", false);

    env.cmd()
        .args(["overtime", "add", "carol", "2025-03-10", "100"])
        .assert()
        .success();
    env.cmd()
        .args(["overtime", "add", "carol", "2025-03-10", "50"])
        .assert()
        .success();

    env.cmd()
        .args(["overtime", "total", "carol", "2025-03-10", "2025-03-10"])
        .assert()
        .success()
        .stdout(contains("(150 s)"));

    env.cmd()
        .args(["overtime", "total", "carol", "2025-03-11", "2025-03-11"])
        .assert()
        .success()
        .stdout(contains("(0 s)"));

    env.cmd()
        .args(["overtime", "total", "carol", "2025-03-11", "2025-03-10"])
        .assert()
        .failure()
        .stderr(contains("Invalid argument"));

    env.cmd()
        .args(["overtime", "add", "carol", "2025-03-10", "-1"])
        .assert()
        .failure();
}

#[test]
fn test_notify_sends_once_per_event() {
    let env = TestEnv::new();
    env.init();
    env.add_user("alice", false);
    env.add_user("bob", false);

    env.cmd().args(["status", "alice", "inactive"]).assert().success();
    env.cmd().args(["status", "bob", "inactive"]).assert().success();

    // no admin yet: nothing sent, nothing marked
    let report = env.json(&["notify"]);
    assert_eq!(report["recipients"], 0);
    assert_eq!(report["sent"], 0);

    env.cmd().arg("bootstrap-admin").assert().success();

    let report = env.json(&["notify"]);
    assert_eq!(report["recipients"], 1);
    assert_eq!(report["pending"], 2);
    assert_eq!(report["sent"], 2);
    assert_eq!(report["marked"], 2);

    let again = env.json(&["notify"]);
    assert_eq!(again["pending"], 0);
    assert_eq!(again["sent"], 0);
}

#[test]
fn test_bootstrap_admin_is_idempotent() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .arg("bootstrap-admin")
        .assert()
        .success()
        .stdout(contains("Admin created"));
    env.cmd()
        .arg("bootstrap-admin")
        .assert()
        .success()
        .stdout(contains("Admin already exists"));

    let admins: i64 = env
        .conn()
        .query_row("SELECT COUNT(*) FROM users WHERE role = 'admin'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(admins, 1);
}

#[test]
fn test_purge_dry_run_matches_live_run() {
    let env = TestEnv::new();
    env.init();
    env.add_user("dave", false);

    let capture = env.dir.path().join("capture.png");
    fs::write(&capture, b"fake png").unwrap();
    env.cmd()
        .args(["media", "add", "dave", &capture.to_string_lossy()])
        .assert()
        .success();
    env.cmd().args(["status", "dave", "active"]).assert().success();
    env.cmd()
        .args(["overtime", "add", "dave", "2020-01-01", "60"])
        .assert()
        .success();

    {
        let conn = env.conn();
        conn.execute("UPDATE screenshots SET taken_at = '2020-01-01 10:00:00.000000'", [])
            .unwrap();
        conn.execute("UPDATE activity_events SET occurred_at = '2020-01-01 10:00:00.000000'", [])
            .unwrap();
    }

    let shots = env.json(&["media", "list", "dave"]);
    let url = shots[0]["url"].as_str().unwrap().to_string();
    let name = url.rsplit('/').next().unwrap().to_string();
    let file = env.media_root().join("screenshots").join(name);
    assert!(file.exists());

    let dry = env.json(&["purge", "--days", "35", "--dry-run"]);
    assert_eq!(dry["dry_run"], true);
    assert!(file.exists());

    let live = env.json(&["purge", "--days", "35"]);
    for i in 0..4 {
        assert_eq!(dry["tables"][i]["table"], live["tables"][i]["table"]);
        assert_eq!(dry["tables"][i]["rows"], live["tables"][i]["rows"]);
        assert_eq!(dry["tables"][i]["files"], live["tables"][i]["files"]);
    }
    assert_eq!(live["tables"][0]["rows"], 1);
    assert_eq!(live["tables"][0]["files"], 1);
    assert_eq!(live["tables"][2]["rows"], 1);
    assert_eq!(live["tables"][3]["rows"], 1);
    assert!(!file.exists());

    let second = env.json(&["purge", "--days", "35"]);
    for i in 0..4 {
        assert_eq!(second["tables"][i]["rows"], 0);
    }
}

#[test]
fn test_purge_rejects_negative_days() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["purge", "--days", "-1"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Invalid argument"));
}

#[test]
fn test_summary_sums_durations() {
    let env = TestEnv::new();
    env.init();
    env.add_user("erin", false);

    env.cmd().args(["status", "erin", "shift_start"]).assert().success();
    env.cmd()
        .args(["status", "erin", "inactive", "--duration", "1200"])
        .assert()
        .success();
    env.cmd()
        .args(["status", "erin", "active", "--duration", "300"])
        .assert()
        .success();

    let today = chrono::Utc::now().date_naive().to_string();
    let s = env.json(&["summary", "erin", &today, &today]);
    assert_eq!(s["active_seconds"], 1200);
    assert_eq!(s["inactive_seconds"], 300);
    assert_eq!(s["inactive_events"], 1);
    assert_eq!(s["shift_starts"], 1);
}

#[test]
fn test_db_info_and_check() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["db", "--info", "--check"])
        .assert()
        .success()
        .stdout(contains("activity_events"))
        .stdout(contains("Integrity check passed"));
}
