//! CLI integration tests for the agenda admin commands.
//!
//! Each test uses an isolated temp directory for the database, so tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use agenda::store::{SqliteStore, Store};
use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const EMAIL: &str = "root@agenda.test";
const PASSWORD: &str = "segredo123";

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("agenda").expect("failed to find binary");
        cmd.current_dir(self.data_dir());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("DATABASE_URL");
        cmd.env_remove("SUPERADMIN_EMAIL");
        cmd.env_remove("SUPERADMIN_PASSWORD");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .env("SUPERADMIN_EMAIL", EMAIL)
            .env("SUPERADMIN_PASSWORD", PASSWORD)
            .args([
                "admin",
                "init",
                "--data-dir",
                &self.data_dir_str(),
                "--non-interactive",
            ])
            .assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("agenda.db")).expect("failed to open store")
    }
}

#[test]
fn test_init_seeds_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains(format!("created super admin {EMAIL}")))
        .stdout(predicate::str::contains("created plan 'Anual'"))
        .stdout(predicate::str::contains("Database initialized at:"));

    for dir in ["uploads/perfil", "uploads/logos", "backups"] {
        assert!(ctx.data_dir().join(dir).is_dir(), "{dir} missing");
    }

    let store = ctx.store();
    assert!(store.has_superadmin().unwrap());
    assert_eq!(store.list_planos().unwrap().len(), 3);

    ctx.init()
        .success()
        .stdout(predicate::str::contains(format!("super admin {EMAIL} already exists")))
        .stdout(predicate::str::contains("created").not());
}

#[test]
fn test_init_non_interactive_requires_credentials() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args([
            "admin",
            "init",
            "--data-dir",
            &ctx.data_dir_str(),
            "--non-interactive",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SUPERADMIN_EMAIL"));

    ctx.cmd()
        .env("SUPERADMIN_EMAIL", EMAIL)
        .args([
            "admin",
            "init",
            "--data-dir",
            &ctx.data_dir_str(),
            "--non-interactive",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SUPERADMIN_PASSWORD"));

    assert!(!ctx.store().has_superadmin().unwrap());
}

#[test]
fn test_init_rejects_short_password() {
    let ctx = TestContext::new();

    ctx.cmd()
        .env("SUPERADMIN_EMAIL", EMAIL)
        .env("SUPERADMIN_PASSWORD", "curta")
        .args([
            "admin",
            "init",
            "--data-dir",
            &ctx.data_dir_str(),
            "--non-interactive",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least"));
}

#[test]
fn test_backup_writes_snapshot() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["admin", "backup", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup written to:"));

    let backups: Vec<_> = std::fs::read_dir(ctx.data_dir().join("backups"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("backup_sqlite_"))
        .collect();
    assert_eq!(backups.len(), 1);

    let snapshot = SqliteStore::new(backups[0].path()).unwrap();
    assert!(snapshot.has_superadmin().unwrap());
}

#[test]
fn test_commands_require_initialized_database() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["admin", "backup", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agenda admin init"));

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agenda admin init"));
}
