//! Integration tests for CLI commands

use std::process::Command;
use tempfile::TempDir;

/// Helper to run manifold command
fn manifold(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_manifold"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute manifold")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn fixture(name: &str) -> String {
    format!("{}/{}", fixtures_path(), name)
}

mod images_command {
    use super::*;

    #[test]
    fn test_images_declared() {
        let output = manifold(&["images", &fixture("demo-project")]);

        assert!(output.status.success(), "Expected success for demo project");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("acme/shop:1.0.0"));
        assert!(stdout.contains("eclipse-temurin:21"));
        // tag contributed by the descriptor properties
        assert!(stdout.contains("stable"));
    }

    #[test]
    fn test_images_define_overrides_descriptor() {
        let output = manifold(&[
            "images",
            &fixture("demo-project"),
            "-D",
            "manifold.image.from=eclipse-temurin:17",
        ]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("eclipse-temurin:17"));
        assert!(!stdout.contains("eclipse-temurin:21"));
    }

    #[test]
    fn test_images_generated_for_webapp() {
        let output = manifold(&["images", &fixture("webapp-project"), "--json"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");
        let images = json.as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["name"], "acme/store:latest");
        assert!(images[0]["build"]["from"].as_str().unwrap().contains("tomcat"));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("webapp"));
    }

    #[test]
    fn test_images_invalid_combine_policy() {
        let output = manifold(&[
            "images",
            &fixture("demo-project"),
            "-D",
            "manifold.image.ports.1=9090",
            "-D",
            "manifold.image.ports._combine=append",
        ]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("append"));
    }
}

mod resource_command {
    use super::*;

    fn written(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_resource_writes_manifests() {
        let out = TempDir::new().unwrap();
        let output = manifold(&[
            "resource",
            &fixture("demo-project"),
            "--output-dir",
            out.path().to_str().unwrap(),
        ]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("kubernetes.yml"));

        assert_eq!(
            written(&out),
            vec![
                "cleanup-job.yml",
                "kubernetes.yml",
                "settings-configmap.yml",
                "shop-deployment.yml",
                "shop-service.yml",
            ]
        );

        let service = std::fs::read_to_string(out.path().join("shop-service.yml")).unwrap();
        assert!(service.contains("NodePort"));
        assert!(service.contains("team-a"));
        assert!(service.contains("team: checkout"));
    }

    #[test]
    fn test_resource_dry_run_openshift() {
        let output = manifold(&[
            "resource",
            &fixture("demo-project"),
            "--mode",
            "openshift",
            "--dry-run",
        ]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("kind: List"));
        assert!(stdout.contains("kind: DeploymentConfig"));
        assert!(stdout.contains("kind: BuildConfig"));
        assert!(stdout.contains("kind: ImageStream"));
        assert!(stdout.contains("kind: Route"));
        assert!(!stdout.contains("kind: Deployment\n"));
    }

    #[test]
    fn test_resource_validation_blocks_writing() {
        let out = TempDir::new().unwrap();
        let output = manifold(&[
            "resource",
            &fixture("invalid-resources"),
            "--validate",
            "--output-dir",
            out.path().to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Bad_Name"));
        assert!(stderr.contains("/metadata/name"));
        assert!(written(&out).is_empty());
    }

    #[test]
    fn test_resource_without_validation() {
        let out = TempDir::new().unwrap();
        let output = manifold(&[
            "resource",
            &fixture("invalid-resources"),
            "--output-dir",
            out.path().to_str().unwrap(),
        ]);

        assert!(output.status.success());
        assert_eq!(written(&out), vec!["Bad_Name-configmap.yml", "kubernetes.yml"]);
    }

    #[test]
    fn test_resource_unknown_profile() {
        let output = manifold(&[
            "resource",
            &fixture("demo-project"),
            "--profile",
            "nightly",
            "--dry-run",
        ]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("nightly"));
    }
}

mod profiles_command {
    use super::*;

    #[test]
    fn test_profiles_list() {
        let output = manifold(&["profiles", &fixture("demo-project")]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        for name in ["default", "minimal", "raw", "batch"] {
            assert!(stdout.contains(name), "missing profile {}", name);
        }
    }

    #[test]
    fn test_profiles_builtin_without_project() {
        let dir = TempDir::new().unwrap();
        let output = manifold(&["profiles", dir.path().to_str().unwrap()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("minimal"));
        assert!(!stdout.contains("batch"));
    }

    #[test]
    fn test_profiles_show() {
        let output = manifold(&["profiles", &fixture("demo-project"), "--show", "batch"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("name: batch"));
        assert!(stdout.contains("project-label"));
    }
}

mod error_messages {
    use super::*;

    #[test]
    fn test_missing_project() {
        let dir = TempDir::new().unwrap();
        let output = manifold(&["images", dir.path().to_str().unwrap()]);

        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("manifold.yaml"));
    }

    #[test]
    fn test_unsupported_api_version() {
        let output = manifold(&["images", &fixture("invalid-project")]);

        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("manifold/v2"));
    }

    #[test]
    fn test_malformed_define() {
        let output = manifold(&["images", &fixture("demo-project"), "-D", "novalue"]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("novalue"));
    }
}
