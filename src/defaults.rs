//! Default values for kustomize-overlay.
//!
//! This module provides centralized default values used across the library
//! and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Executable used when no `--kustomize-bin` flag or `KUSTOMIZE_BIN`
/// variable is given
pub const DEFAULT_KUSTOMIZE_BIN: &str = "kustomize";

/// Environment variable naming the kustomize executable
pub const KUSTOMIZE_BIN_ENV: &str = "KUSTOMIZE_BIN";

/// Environment variable naming the configuration record read by `run`
pub const RECORD_ENV: &str = "KUSTOMIZE_OVERLAY_RECORD";

/// Prefix of every scratch directory created under the system temp dir
pub const SCRATCH_PREFIX: &str = "kustomize-overlay-";

/// Fixed file names used by the base-plus-fragments scaffold
pub const RESOURCES_FILE: &str = "resources.yaml";
pub const PATCHES_FILE: &str = "patches.yaml";
pub const CONFIGURATIONS_FILE: &str = "configurations.yaml";

/// Returns the kustomize executable to run.
///
/// `KUSTOMIZE_BIN` wins when set to a non-empty value; otherwise the
/// executable is looked up on `PATH` as `kustomize`.
pub fn default_kustomize_bin() -> PathBuf {
    std::env::var_os(KUSTOMIZE_BIN_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KUSTOMIZE_BIN))
}
