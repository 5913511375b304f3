// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the `flowlink` binary.
//!
//! Each test gets its own temp directory holding the config file and the
//! SQLite database. Partners run in dry-run mode, so no network is needed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(queue_backend: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("flowlink.db");
        let config = dir.path().join("flowlink.toml");
        std::fs::write(
            &config,
            format!(
                "[storage]\ndatabase_path = \"{}\"\n\n[queue]\nbackend = \"{queue_backend}\"\n",
                db.display()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_flowlink"))
            .current_dir(self.dir.path())
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        let out = self.run(args);
        assert!(
            out.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        serde_json::from_slice(&out.stdout).unwrap()
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[test]
fn sandbox_runs_without_storage() {
    let ws = Workspace::new("sqlite");
    let list = ws.json(&["sandbox", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 5);

    let sim = ws.json(&["sandbox", "simulate", "medoc", "--payload", r#"{"document":"<A/>"}"#]);
    assert_eq!(sim["response"]["checksum"], "4f60");

    assert!(!ws.path().join("flowlink.db").exists());
    assert!(!ws.run(&["sandbox", "simulate", "unknown-slug"]).status.success());
}

#[test]
fn connection_lifecycle_with_dry_run_sync() {
    let ws = Workspace::new("sqlite");
    let created = ws.json(&[
        "connections",
        "create",
        "tenders",
        "--partner-type",
        "procurement",
        "--settings",
        r#"{"dry_run": true}"#,
    ]);
    let id = created["id"].as_i64().unwrap().to_string();
    assert_eq!(created["last_sync_status"], "Never synced");

    let synced = ws.json(&["sync", &id, "--payload", r#"{"payload":{"q":"CRM"}}"#]);
    assert_eq!(synced["status"], "success");
    assert_eq!(synced["details"]["response"]["path"], "/tenders");

    let ping = ws.json(&["ping", &id]);
    assert_eq!(ping["status"], "ok");

    let logs = ws.json(&["logs", &id]);
    assert_eq!(logs.as_array().unwrap().len(), 2);

    let shown = ws.json(&["connections", "show", &id]);
    assert_eq!(shown["last_sync_status"], "Success");

    ws.json(&["connections", "disable", &id]);
    let refused = ws.run(&["sync", &id]);
    assert!(!refused.status.success());
    assert!(String::from_utf8_lossy(&refused.stderr).contains("disabled"));

    ws.json(&["connections", "delete", &id]);
    assert!(ws.json(&["connections", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn enqueued_task_is_durable_and_cancellable() {
    let ws = Workspace::new("sqlite");
    let created = ws.json(&[
        "connections",
        "create",
        "books",
        "--partner-type",
        "accounting-odata",
        "--settings",
        r#"{"dry_run": true}"#,
    ]);
    let id = created["id"].as_i64().unwrap().to_string();

    let queued = ws.json(&["enqueue", &id]);
    assert_eq!(queued["state"], "queued");
    let task_id = queued["taskId"].as_str().unwrap().to_string();

    // A separate process sees the same task.
    let status = ws.json(&["status", &task_id]);
    assert_eq!(status["state"], "queued");

    let cancelled = ws.json(&["cancel", &task_id]);
    assert_eq!(cancelled["state"], "failed");
    assert_eq!(cancelled["error"], "revoked");
}

#[test]
fn invalid_settings_are_rejected_at_creation() {
    let ws = Workspace::new("sqlite");
    let out = ws.run(&[
        "connections",
        "create",
        "bad",
        "--partner-type",
        "tax-rest",
        "--settings",
        r#"{"base_url": "ftp://example.com"}"#,
    ]);
    assert!(!out.status.success());
    assert!(ws.json(&["connections", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn unknown_config_key_fails_startup() {
    let ws = Workspace::new("sqlite");
    std::fs::write(&ws.config, "[queue]\nmax_attemps = 3\n").unwrap();
    let out = ws.run(&["connections", "list"]);
    assert!(!out.status.success());
}
