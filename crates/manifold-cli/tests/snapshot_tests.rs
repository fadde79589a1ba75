//! Snapshot tests for command output formatting

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run manifold command and capture output
fn manifold_output(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_manifold"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute manifold");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

fn create_test_project(profiles: Option<&str>) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("manifold.yaml"),
        r#"apiVersion: manifold/v1
project:
  groupId: org.acme
  artifactId: snapshot
  version: 1.0.0
"#,
    )
    .unwrap();

    if let Some(profiles) = profiles {
        fs::create_dir(dir.path().join("manifold")).unwrap();
        fs::write(dir.path().join("manifold/profiles.yaml"), profiles).unwrap();
    }
    dir
}

#[test]
fn test_builtin_profile_listing() {
    let project = create_test_project(None);
    let (stdout, _, success) = manifold_output(&["profiles", project.path().to_str().unwrap()]);

    assert!(success);
    insta::assert_snapshot!(stdout, @r"
    Profiles:
      default
      minimal
      raw
    ");
}

#[test]
fn test_project_profiles_are_listed_with_builtins() {
    let project = create_test_project(Some(
        "- name: nightly\n  enricher:\n    includes: [name]\n- name: audit\n  extends: minimal\n",
    ));
    let (stdout, _, success) = manifold_output(&["profiles", project.path().to_str().unwrap()]);

    assert!(success);
    insta::assert_snapshot!(stdout, @r"
    Profiles:
      default
      minimal
      raw
      nightly
      audit
    ");
}
