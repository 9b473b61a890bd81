//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_file("base/deploy.yaml", manifests::DEPLOYMENT)
//!         .with_fake_kustomize();
//!     fixture.command().arg("build").arg("base").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Resource documents shared across tests.
#[allow(dead_code)]
pub mod manifests {
    pub const CONFIGMAP: &str = "apiVersion: v1
kind: ConfigMap
metadata:
  name: cm
data:
  key: value
";

    pub const DEPLOYMENT: &str = "apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 1
";

    pub const SERVICE: &str = "apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: demo
";

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "kind: [unclosed";
}

/// Shell script standing in for kustomize.
///
/// Prints every regular file directly under the build directory (`$2`),
/// except `kustomization.yaml`, as one multi-document stream. Good enough
/// to observe what the CLI hands to kustomize without needing it installed.
#[allow(dead_code)]
pub const FAKE_KUSTOMIZE: &str = r#"#!/bin/sh
[ "$1" = "build" ] || { echo "unexpected command: $1" >&2; exit 2; }
for f in "$2"/*; do
  [ -f "$f" ] || continue
  case "$(basename "$f")" in
    kustomization.yaml) ;;
    *) cat "$f"; echo "---" ;;
  esac
done
"#;

/// A shell script that always fails the way kustomize does.
#[allow(dead_code)]
pub const FAILING_KUSTOMIZE: &str = r#"#!/bin/sh
echo "Error: accumulating resources: missing base" >&2
exit 1
"#;

/// A test fixture that provides a temporary working directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add a `kustomization.yaml` under `dir`.
    #[allow(dead_code)]
    pub fn with_kustomization(self, dir: &str, content: &str) -> Self {
        let path = format!("{}/kustomization.yaml", dir.trim_end_matches('/'));
        self.with_file(&path, content)
    }

    /// Install [`FAKE_KUSTOMIZE`] as `bin/kustomize`.
    #[allow(dead_code)]
    pub fn with_fake_kustomize(self) -> Self {
        self.with_script(FAKE_KUSTOMIZE)
    }

    /// Install an executable `bin/kustomize` with the given body.
    #[allow(dead_code)]
    pub fn with_script(self, body: &str) -> Self {
        let script = self.temp_dir.child("bin/kustomize");
        script.write_str(body).expect("Failed to write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755))
                .expect("Failed to make script executable");
        }
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the fake kustomize executable.
    #[allow(dead_code)]
    pub fn kustomize_bin(&self) -> PathBuf {
        self.temp_dir.path().join("bin/kustomize")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command running in this fixture's directory, pointed at the
    /// fake kustomize, with colors off.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kustomize-overlay");
        cmd.current_dir(self.path())
            .env_remove("KUSTOMIZE_BIN")
            .env_remove("KUSTOMIZE_OVERLAY_RECORD")
            .arg("--color")
            .arg("never")
            .arg("--kustomize-bin")
            .arg(self.kustomize_bin());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_kustomization() {
        let fixture = TestFixture::new().with_kustomization("base/", "resources: []\n");
        assert!(fixture.path().join("base/kustomization.yaml").exists());
    }

    #[test]
    fn test_manifests_are_valid_yaml() {
        for manifest in [manifests::CONFIGMAP, manifests::DEPLOYMENT, manifests::SERVICE] {
            serde_yaml::from_str::<serde_yaml::Value>(manifest)
                .expect("Manifest should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(manifests::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
