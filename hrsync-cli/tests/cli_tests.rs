use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;

use hrsync_core::{paths, Employee, Entity, Organization};
use hrsync_store::Store;

fn hrsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hrsync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("RUST_LOG", "warn");
    cmd
}

fn init(home: &Path) {
    hrsync_cmd(home).arg("init").assert().success();
}

fn seed_directory(home: &Path) {
    let mut store = Store::open(&paths::database_path(home)).expect("open store");
    let rows = [
        Entity::Organization(Organization {
            org_id: "O1".into(),
            org_name: Some("Sales".into()),
            person_in_charge: Some("U1".into()),
            tree_path: Some("root/O1".into()),
            tree_path_text: Some("HQ/Sales".into()),
            ..Default::default()
        }),
        Entity::Employee(Employee {
            user_id: "U1".into(),
            job_number: Some("E001".into()),
            department_id: Some("O1".into()),
            job_level_text: Some("manager".into()),
            employee_status: Some("3".into()),
            ..Default::default()
        }),
    ];
    for row in &rows {
        store.upsert_entity(row).expect("upsert");
    }
}

#[test]
fn init_writes_config_and_database() {
    let home = assert_fs::TempDir::new().expect("home");

    hrsync_cmd(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Wrote template config"))
        .stdout(contains("Seeded 8 employee statuses"))
        .stdout(contains("3=Regular"))
        .stdout(contains("8=Departed"));

    home.child(".hrsync/config.yaml")
        .assert(predicate::str::contains("app_secret"));
    home.child(".hrsync/data/hrsync.db")
        .assert(predicate::path::exists());
}

#[test]
fn init_twice_keeps_existing_config() {
    let home = assert_fs::TempDir::new().expect("home");
    init(home.path());
    let config = home.child(".hrsync/config.yaml");
    fs::write(config.path(), fs::read_to_string(config.path()).unwrap() + "\n# edited\n")
        .unwrap();

    hrsync_cmd(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("already exists"))
        .stdout(contains("Seeded").not())
        .stdout(contains("1=Pending onboarding"));
    config.assert(predicate::str::contains("# edited"));

    hrsync_cmd(home.path())
        .args(["init", "--force"])
        .assert()
        .success();
    config.assert(predicate::str::contains("# edited").not());
}

#[test]
fn run_without_config_points_at_init() {
    let home = assert_fs::TempDir::new().expect("home");
    hrsync_cmd(home.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("hrsync init"));
}

#[test]
fn run_rejects_reversed_window_before_any_request() {
    let home = assert_fs::TempDir::new().expect("home");
    init(home.path());

    hrsync_cmd(home.path())
        .args(["run", "--start", "2024-06-10", "--end", "2024-06-01"])
        .assert()
        .failure()
        .stderr(contains("must be before"));
    home.child(".hrsync/logs/hrsync.log")
        .assert(predicate::path::exists());
}

#[test]
fn run_rejects_conflicting_window_flags() {
    let home = assert_fs::TempDir::new().expect("home");
    hrsync_cmd(home.path())
        .args(["run", "--days", "3", "--full"])
        .assert()
        .failure();
}

#[test]
fn run_rejects_zero_and_oversized_days() {
    let home = assert_fs::TempDir::new().expect("home");
    for days in ["0", "3651"] {
        hrsync_cmd(home.path())
            .args(["run", "--days", days])
            .assert()
            .failure()
            .stderr(contains("--days"));
    }
}

#[test]
fn run_rejects_config_with_zero_lookback() {
    let home = assert_fs::TempDir::new().expect("home");
    init(home.path());
    let config = home.child(".hrsync/config.yaml");
    let yaml = fs::read_to_string(config.path()).unwrap();
    fs::write(
        config.path(),
        yaml.replace("lookback_days: 7", "lookback_days: 0"),
    )
    .unwrap();

    hrsync_cmd(home.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("lookback_days"));
}

#[test]
fn schedule_rejects_out_of_range_hour() {
    let home = assert_fs::TempDir::new().expect("home");
    hrsync_cmd(home.path())
        .args(["schedule", "--hour", "24"])
        .assert()
        .failure();
}

#[test]
fn mappings_print_leaders_and_managers() {
    let home = assert_fs::TempDir::new().expect("home");
    init(home.path());
    seed_directory(home.path());

    hrsync_cmd(home.path())
        .args(["mappings", "leaders"])
        .assert()
        .success()
        .stdout(contains("HQ / Sales"))
        .stdout(contains("E001"));

    let assert = hrsync_cmd(home.path())
        .args(["mappings", "managers", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("json");
    assert_eq!(json[0]["path"], serde_json::json!(["HQ", "Sales"]));
    assert_eq!(json[0]["staffs"], serde_json::json!(["E001"]));
    assert_eq!(json[0]["pathType"], "name");
}

#[test]
fn mappings_without_database_fails() {
    let home = assert_fs::TempDir::new().expect("home");
    hrsync_cmd(home.path()).arg("init").assert().success();
    fs::remove_file(paths::database_path(home.path())).unwrap();

    hrsync_cmd(home.path())
        .args(["mappings", "leaders"])
        .assert()
        .failure()
        .stderr(contains("database not found"));
}

#[test]
fn logs_tail_the_last_lines() {
    let home = assert_fs::TempDir::new().expect("home");
    let log = home.child(".hrsync/logs/hrsync.log");
    log.write_str("one\ntwo\nthree\n").unwrap();

    hrsync_cmd(home.path())
        .args(["logs", "--lines", "2"])
        .assert()
        .success()
        .stdout(contains("two"))
        .stdout(contains("three"))
        .stdout(contains("one").not());
}

#[test]
fn logs_without_file_is_not_an_error() {
    let home = assert_fs::TempDir::new().expect("home");
    hrsync_cmd(home.path())
        .arg("logs")
        .assert()
        .success()
        .stdout(contains("log file not found"));
}
