//! `kustomize build` as a resolution engine
//!
//! The executable only sees the real disk, so a filesystem whose paths are
//! not all on disk (any composite with overlay content) is first staged into
//! a scratch directory. The scratch directory is a [`TempDir`] owned by the
//! call, which removes it on every exit path. A failure to remove it is an
//! error only when the build itself succeeded; otherwise it is logged and
//! the build error is returned.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use tempfile::TempDir;

use super::{LoadRestrictor, ResolveOptions, Resolver};
use crate::defaults::{default_kustomize_bin, SCRATCH_PREFIX};
use crate::error::{Error, Result};
use crate::filesystem::{EntryKind, FileSystem};
use crate::manifest::ResourceSet;
use crate::path::clean;

/// Runs an external `kustomize` executable
#[derive(Debug, Clone)]
pub struct KustomizeCli {
    binary: PathBuf,
}

impl Default for KustomizeCli {
    fn default() -> Self {
        Self::from_env()
    }
}

impl KustomizeCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Use `KUSTOMIZE_BIN`, or `kustomize` from `PATH`
    pub fn from_env() -> Self {
        Self::new(default_kustomize_bin())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn args(dir: &Path, options: &ResolveOptions) -> Vec<String> {
        let reorder = if options.legacy_sort { "legacy" } else { "none" };
        let restrictor = match options.load_restrictor {
            LoadRestrictor::RootOnly => "LoadRestrictionsRootOnly",
            LoadRestrictor::None => "LoadRestrictionsNone",
        };
        vec![
            "build".to_string(),
            dir.display().to_string(),
            "--reorder".to_string(),
            reorder.to_string(),
            "--load-restrictor".to_string(),
            restrictor.to_string(),
        ]
    }

    /// Run `kustomize build` on a real directory; errors are reported
    /// against `root`
    fn run(&self, dir: &Path, root: &Path, options: &ResolveOptions) -> Result<ResourceSet> {
        let args = Self::args(dir, options);
        debug!("running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| Error::Resolution {
                root: root.to_path_buf(),
                message: format!("failed to run '{}': {}", self.binary.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Resolution {
                root: root.to_path_buf(),
                message: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        ResourceSet::from_yaml_stream(&stdout)
    }
}

/// Copy everything `source` holds under `root` into `target`
fn stage(source: &dyn FileSystem, root: &Path, target: &Path) -> Result<()> {
    let root = clean(root);
    source.walk(&root, &mut |entry, kind| {
        let entry = clean(entry);
        let Ok(relative) = entry.strip_prefix(&root) else {
            return Ok(());
        };
        let destination = target.join(relative);
        match kind {
            EntryKind::Dir => fs::create_dir_all(&destination)
                .map_err(|e| Error::filesystem("stage", &destination, e)),
            EntryKind::File => {
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| Error::filesystem("stage", parent, e))?;
                }
                let content = source.read_file(&entry)?;
                fs::write(&destination, content)
                    .map_err(|e| Error::filesystem("stage", &destination, e))
            }
        }
    })
}

impl Resolver for KustomizeCli {
    fn resolve(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
        options: &ResolveOptions,
    ) -> Result<ResourceSet> {
        if options.prune {
            warn!("kustomize build does not prune; ignoring the prune option");
        }
        if fs.on_disk() {
            return self.run(root, root, options);
        }

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| Error::filesystem("create scratch directory", std::env::temp_dir(), e))?;
        debug!(
            "staging {} into {}",
            root.display(),
            scratch.path().display()
        );
        stage(fs, root, scratch.path())?;
        let result = self.run(scratch.path(), root, options);
        match (result, close(scratch)) {
            (Err(err), Err(cleanup)) => {
                warn!("{}", cleanup);
                Err(err)
            }
            (Ok(_), Err(cleanup)) => Err(cleanup),
            (result, Ok(())) => result,
        }
    }
}

fn close(scratch: TempDir) -> Result<()> {
    let path = scratch.path().to_path_buf();
    scratch
        .close()
        .map_err(|e| Error::filesystem("remove scratch directory", path, e))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::filesystem::{DiskFS, MemoryFS, OverlayFS};
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;

    const CONFIGMAP: &str = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm\n";

    /// Write an executable shell script standing in for kustomize
    fn fake_kustomize(dir: &Path, body: &str) -> PathBuf {
        let script = dir.join("kustomize");
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn composite() -> OverlayFS<MemoryFS> {
        let mut fs = OverlayFS::with_base(MemoryFS::new());
        fs.write_overlay("/work/root/kustomization.yaml", b"resources:\n- resources_0\n")
            .unwrap();
        fs.write_overlay("/work/root/resources_0", CONFIGMAP.as_bytes())
            .unwrap();
        fs
    }

    #[test]
    #[serial]
    fn test_resolve_stages_composite_tree() {
        let bin = TempDir::new().unwrap();
        let script = fake_kustomize(
            bin.path(),
            &format!(
                "echo \"$@\" > {}/args\ncat \"$2/kustomization.yaml\" > /dev/null && cat \"$2/resources_0\"",
                bin.path().display()
            ),
        );

        let resources = KustomizeCli::new(&script)
            .resolve(
                &composite(),
                Path::new("/work/root"),
                &ResolveOptions::default(),
            )
            .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(
            resources.iter().next().unwrap().id().to_string(),
            "_ConfigMap||cm"
        );

        let args = fs::read_to_string(bin.path().join("args")).unwrap();
        assert!(args.starts_with("build "));
        assert!(args
            .trim_end()
            .ends_with("--reorder legacy --load-restrictor LoadRestrictionsRootOnly"));
    }

    #[test]
    #[serial]
    fn test_resolve_on_disk_runs_in_place() {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("all.yaml"), CONFIGMAP).unwrap();
        let script = fake_kustomize(
            bin.path(),
            &format!("echo \"$2\" > {}/dir\ncat \"$2/all.yaml\"", bin.path().display()),
        );

        let resources = KustomizeCli::new(&script)
            .resolve(&DiskFS::new(), work.path(), &ResolveOptions::default())
            .unwrap();
        assert_eq!(resources.len(), 1);

        let dir = fs::read_to_string(bin.path().join("dir")).unwrap();
        assert_eq!(dir.trim_end(), work.path().display().to_string());
    }

    #[test]
    #[serial]
    fn test_failure_is_resolution_error_and_scratch_is_removed() {
        let bin = TempDir::new().unwrap();
        let script = fake_kustomize(
            bin.path(),
            &format!(
                "echo \"$2\" > {}/dir\necho 'accumulating resources: boom' >&2\nexit 1",
                bin.path().display()
            ),
        );

        let err = KustomizeCli::new(&script)
            .resolve(
                &composite(),
                Path::new("/work/root"),
                &ResolveOptions::default(),
            )
            .unwrap_err();
        match &err {
            Error::Resolution { root, message } => {
                assert_eq!(root, Path::new("/work/root"));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("/work/root"));

        let scratch = fs::read_to_string(bin.path().join("dir")).unwrap();
        assert!(!Path::new(scratch.trim_end()).exists());
    }

    #[test]
    #[serial]
    fn test_build_error_survives_failed_cleanup() {
        let bin = TempDir::new().unwrap();
        let script = fake_kustomize(bin.path(), "rm -rf \"$2\"\necho boom >&2\nexit 1");

        let err = KustomizeCli::new(&script)
            .resolve(
                &composite(),
                Path::new("/work/root"),
                &ResolveOptions::default(),
            )
            .unwrap_err();
        match err {
            Error::Resolution { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_stage_disk_root_with_directory_link() {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        fs::write(work.path().join("cm.yaml"), CONFIGMAP).unwrap();
        std::os::unix::fs::symlink(elsewhere.path(), work.path().join("cache")).unwrap();

        let mut composite = OverlayFS::with_base(DiskFS::new());
        composite
            .write_overlay(work.path().join("kustomization.yaml"), b"resources:\n- cm.yaml\n")
            .unwrap();
        let script = fake_kustomize(bin.path(), "cat \"$2/cm.yaml\"");

        let resources = KustomizeCli::new(&script)
            .resolve(&composite, work.path(), &ResolveOptions::default())
            .unwrap();
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn test_missing_binary() {
        let err = KustomizeCli::new("/nonexistent/kustomize")
            .resolve(
                &composite(),
                Path::new("/work/root"),
                &ResolveOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
        assert!(err.to_string().contains("failed to run"));
    }

    #[test]
    fn test_args_without_legacy_sort() {
        let options = ResolveOptions {
            legacy_sort: false,
            load_restrictor: LoadRestrictor::None,
            prune: false,
        };
        assert_eq!(
            KustomizeCli::args(Path::new("/tmp/x"), &options),
            vec![
                "build",
                "/tmp/x",
                "--reorder",
                "none",
                "--load-restrictor",
                "LoadRestrictionsNone"
            ]
        );
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var(crate::defaults::KUSTOMIZE_BIN_ENV, "/opt/kustomize");
        assert_eq!(KustomizeCli::from_env().binary(), Path::new("/opt/kustomize"));
        std::env::remove_var(crate::defaults::KUSTOMIZE_BIN_ENV);
        assert_eq!(KustomizeCli::default().binary(), Path::new("kustomize"));
    }
}
