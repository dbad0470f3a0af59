// tests/config_test.rs
use git_semver::config::{load_config, CommitMessageIncrementing, Config, IncrementMode, CONFIG_FILE_NAME};
use git_semver::VersionError;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_default_config() {
    let dir = TempDir::new().unwrap();
    let config = load_config(None, dir.path()).unwrap();
    let names: Vec<_> = config.branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["main", "develop", "release", "hotfix", "feature", "pull-request"]);
    assert_eq!(config.retry.max_retries, 6);
    assert_eq!(config.retry.base_delay_ms, 500);
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
tag_prefix = "release-"
next_version = "4.0.0"
commit_message_incrementing = "merge-message-only"

[retry]
max_retries = 2
base_delay_ms = 100

[increments]
minor = ["^feature:"]

[[branches]]
name = "trunk"
pattern = "^trunk$"
increment = "minor"

[[branches]]
name = "topic"
pattern = "^topic/"
label = "{branch}"
source_branches = ["trunk"]
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let dir = TempDir::new().unwrap();
    let config = load_config(Some(temp_file.path()), dir.path()).unwrap();
    assert_eq!(config.tag_prefix, "release-");
    assert_eq!(config.next_version.as_deref(), Some("4.0.0"));
    assert_eq!(config.commit_message_incrementing, CommitMessageIncrementing::MergeMessageOnly);
    assert_eq!(config.retry.max_retries, 2);
    assert_eq!(config.increments.minor, vec!["^feature:".to_string()]);
    // Unlisted severities keep their defaults
    assert_eq!(config.increments.major, Config::default().increments.major);
    assert_eq!(config.branches.len(), 2);
    assert_eq!(config.branches[1].increment, IncrementMode::Inherit);
    assert_eq!(config.branches[1].source_branches, vec!["trunk".to_string()]);
}

#[test]
fn test_discovers_file_in_work_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "initial_version = \"1.0.0\"\n").unwrap();

    let config = load_config(None, dir.path()).unwrap();
    assert_eq!(config.initial_version, "1.0.0");
}

#[test]
fn test_invalid_file_is_config_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[[branches]]\nname = \"x\"\npattern = \"(\"\n").unwrap();
    temp_file.flush().unwrap();

    let dir = TempDir::new().unwrap();
    let err = load_config(Some(temp_file.path()), dir.path()).unwrap_err();
    assert!(matches!(err, VersionError::Config(_)));
}

#[test]
fn test_missing_explicit_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(load_config(Some(&missing), dir.path()), Err(VersionError::Io(_))));
}
