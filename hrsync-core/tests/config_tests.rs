//! Config load error messages, init behavior and YAML section defaults.

use assert_fs::prelude::*;
use hrsync_core::{
    config::{self, Config, UpsertPolicy},
    paths, ConfigError, PathType, StaffKeyKind,
};
use predicates::prelude::predicate;
use rstest::rstest;
use std::fs;

const CREDENTIALS: &str = "\
beisen:
  app_key: key
  app_secret: secret
hesi:
  app_key: hkey
  app_security: hsec
  corp_id: CORP
";

fn write_config(home: &assert_fs::TempDir, body: &str) {
    home.child(".hrsync/config.yaml").write_str(body).expect("write");
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_points_at_init() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("config.yaml"));
    assert!(msg.contains("hrsync init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, ": : corrupt : yaml : !!!\n  - broken: [unclosed");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_without_credentials_is_a_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, "sync:\n  lookback_days: 3\n");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_rejects_invalid_values() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, &format!("{CREDENTIALS}schedule:\n  minute: 75\n"));

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_loadable_template() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    assert!(config::init_at(home.path(), false).expect("init"));

    home.child(".hrsync/config.yaml")
        .assert(predicate::str::contains("app_secret"));
    let loaded = config::load_at(home.path()).expect("load");
    assert_eq!(loaded, Config::template());
}

#[test]
fn init_keeps_existing_config_unless_forced() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, CREDENTIALS);

    assert!(!config::init_at(home.path(), false).expect("init"));
    let kept = fs::read_to_string(paths::config_path(home.path())).expect("read");
    assert_eq!(kept, CREDENTIALS);

    assert!(config::init_at(home.path(), true).expect("forced init"));
    let loaded = config::load_at(home.path()).expect("load");
    assert_eq!(loaded.beisen.app_key, "<beisen app key>");
}

// ---------------------------------------------------------------------------
// 3. Section parsing
// ---------------------------------------------------------------------------

#[rstest]
#[case("abort", UpsertPolicy::Abort)]
#[case("skip", UpsertPolicy::Skip)]
fn upsert_policy_parses(#[case] raw: &str, #[case] expected: UpsertPolicy) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(
        &home,
        &format!("{CREDENTIALS}sync:\n  on_upsert_error: {raw}\n"),
    );
    let loaded = config::load_at(home.path()).expect("load");
    assert_eq!(loaded.sync.on_upsert_error, expected);
    assert_eq!(loaded.sync.lookback_days, 7);
}

#[rstest]
#[case("name", PathType::Name)]
#[case("code", PathType::Code)]
fn leader_path_type_parses(#[case] raw: &str, #[case] expected: PathType) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(
        &home,
        &format!(
            "{CREDENTIALS}roles:\n  staff_by: email\n  department_leaders:\n    role_id: \"R1:leader\"\n    path_type: {raw}\n"
        ),
    );
    let loaded = config::load_at(home.path()).expect("load");
    let leaders = loaded.roles.department_leaders.expect("leaders");
    assert_eq!(leaders.path_type, expected);
    assert_eq!(leaders.role_id.to_string(), "R1:leader");
    assert_eq!(loaded.roles.staff_by, StaffKeyKind::Email);
    assert!(loaded.roles.managers.is_none());
}
