#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn rti() -> Command {
    cargo_bin_cmd!("idletracker")
}

/// An isolated database, media root and (absent) config file.
pub struct TestEnv {
    pub dir: TempDir,
    pub db: String,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("idletracker.sqlite").to_string_lossy().to_string();
        Self { dir, db }
    }

    pub fn media_root(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    /// Command with the global flags pointing into this environment.
    pub fn cmd(&self) -> Command {
        let mut c = rti();
        c.env_remove("ADMIN_USERNAME")
            .env_remove("ADMIN_EMAIL")
            .env_remove("ADMIN_PASSWORD")
            .args([
                "--db",
                &self.db,
                "--config",
                &self.dir.path().join("none.conf").to_string_lossy(),
                "--media-root",
                &self.media_root().to_string_lossy(),
                "--test",
            ]);
        c
    }

    pub fn init(&self) {
        self.cmd().arg("init").assert().success();
    }

    pub fn add_user(&self, username: &str, admin: bool) {
        let email = format!("{}@example.com", username);
        let mut c = self.cmd();
        c.args(["user", "add", username, "--email", &email, "--password", "pw"]);
        if admin {
            c.arg("--admin");
        }
        c.assert().success();
    }

    pub fn conn(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.db).expect("open db")
    }

    /// Run with `--json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let out = self.cmd().arg("--json").args(args).output().expect("run");
        assert!(
            out.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
        serde_json::from_slice(&out.stdout).expect("json output")
    }
}
