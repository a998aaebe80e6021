//! Configuration loading and root folder resolution
//!
//! Uses serial_test: tests touching SAILOR_ROOT_FOLDER or the integration
//! credential variables are marked #[serial] so they do not race.

use sailor_common::config::{resolve_root_folder, CompiledDefaults, TomlConfig, ROOT_FOLDER_ENV};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.port, 5780);
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root = resolve_root_folder(None, &TomlConfig::default());
    assert_eq!(root, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/sailor-from-toml")),
        ..Default::default()
    };

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/sailor-from-toml"));

    env::set_var(ROOT_FOLDER_ENV, "/tmp/sailor-from-env");
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/sailor-from-env"));

    assert_eq!(
        resolve_root_folder(Some("/tmp/sailor-from-cli"), &config),
        PathBuf::from("/tmp/sailor-from-cli")
    );

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert!(config.port.is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.admin_emails.is_empty());
}

#[test]
fn test_load_full_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
port = 6000
admin_emails = ["owner@sailorskills.com"]

[logging]
level = "debug"

[business]
open = "09:00"
close = "17:00"
days_of_week = [1, 2, 3, 4, 5]

[google_calendar]
client_id = "id"
client_secret = "secret"
refresh_token = "refresh"
"#
    )
    .unwrap();

    let config = TomlConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.port, Some(6000));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.admin_emails, vec!["owner@sailorskills.com"]);

    let hours = config.business.to_hours().unwrap();
    assert_eq!(hours.days_of_week, vec![1, 2, 3, 4, 5]);
    assert_eq!(hours.utc_offset_minutes, -480);

    let google = config.google_calendar.as_ref().unwrap();
    assert_eq!(google.calendar_id, "primary");
    assert_eq!(google.time_zone, "America/Los_Angeles");
}

#[test]
fn test_malformed_config_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();
    assert!(TomlConfig::load(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_environment_credentials_override_file() {
    env::remove_var("STRIPE_SECRET_KEY");
    let config: TomlConfig = toml::from_str(
        r#"
[stripe]
secret_key = "sk_test_file"
"#,
    )
    .unwrap();
    assert_eq!(config.stripe().unwrap().secret_key, "sk_test_file");

    env::set_var("STRIPE_SECRET_KEY", "sk_test_env");
    assert_eq!(config.stripe().unwrap().secret_key, "sk_test_env");
    env::remove_var("STRIPE_SECRET_KEY");

    env::remove_var("GOOGLE_CLIENT_ID");
    env::remove_var("GOOGLE_CLIENT_SECRET");
    env::remove_var("GOOGLE_REFRESH_TOKEN");
    assert!(TomlConfig::default().google_calendar().is_none());
}
