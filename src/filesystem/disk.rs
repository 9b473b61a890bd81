//! Host filesystem adapter
//!
//! Walks do not descend into symbolic links: a link to a file is reported
//! as that file, links to directories and dangling links are skipped.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::debug;

use super::{EntryKind, FileSystem, ResolvedPath, WalkVisitor};
use crate::error::{Error, Result};

/// Filesystem backed by the real disk
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFS;

impl DiskFS {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(operation: &str, path: &Path, err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        Error::filesystem(operation, path, err)
    }
}

impl FileSystem for DiskFS {
    fn create(&mut self, path: &Path) -> Result<()> {
        fs::File::create(path).map_err(|e| io_error("create", path, e))?;
        Ok(())
    }

    fn mkdir(&mut self, path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| io_error("mkdir", path, e))
    }

    fn mkdir_all(&mut self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| io_error("mkdir_all", path, e))
    }

    fn remove_all(&mut self, path: &Path) -> Result<()> {
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => Err(e),
        };
        result.map_err(|e| Error::filesystem("remove_all", path, e))
    }

    fn write_file(&mut self, path: &Path, content: &[u8]) -> Result<()> {
        fs::write(path, content).map_err(|e| io_error("write_file", path, e))
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Read + 'a>> {
        let file = fs::File::open(path).map_err(|e| io_error("open", path, e))?;
        Ok(Box::new(file))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| io_error("read_file", path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        // unreadable entries are skipped, like a shell glob
        Ok(glob::glob(pattern)?.filter_map(|entry| entry.ok()).collect())
    }

    fn resolve_path(&self, path: &Path) -> Result<ResolvedPath> {
        let absolute = fs::canonicalize(path).map_err(|e| io_error("resolve_path", path, e))?;
        if absolute.is_dir() {
            return Ok(ResolvedPath {
                dir: absolute,
                file: None,
            });
        }
        let file = absolute
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Ok(ResolvedPath { dir, file })
    }

    fn walk(&self, path: &Path, visitor: &mut WalkVisitor<'_>) -> Result<()> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::filesystem("walk", path, e))?;
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_symlink() && !entry.path().is_file() {
                debug!("walk: skipping link {}", entry.path().display());
                continue;
            } else {
                EntryKind::File
            };
            visitor(entry.path(), kind)?;
        }
        Ok(())
    }

    fn on_disk(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFS::new();
        let path = temp.path().join("deploy.yaml");

        fs.write_file(&path, b"kind: Deployment\n").unwrap();
        assert!(fs.exists(&path));
        assert_eq!(fs.read_file(&path).unwrap(), b"kind: Deployment\n");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let fs = DiskFS::new();
        let result = fs.read_file(&temp.path().join("missing"));
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_mkdir_and_remove_all() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFS::new();
        let nested = temp.path().join("a/b/c");

        assert!(fs.mkdir(&nested).is_err());
        fs.mkdir_all(&nested).unwrap();
        assert!(fs.is_dir(&nested));

        fs.remove_all(&temp.path().join("a")).unwrap();
        assert!(!fs.exists(&temp.path().join("a")));
        fs.remove_all(&temp.path().join("a")).unwrap();
    }

    #[test]
    fn test_create_makes_empty_file() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFS::new();
        let path = temp.path().join("empty");
        fs.create(&path).unwrap();
        assert_eq!(fs.read_file(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_glob() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFS::new();
        fs.write_file(&temp.path().join("a.yaml"), b"").unwrap();
        fs.write_file(&temp.path().join("b.txt"), b"").unwrap();

        let pattern = format!("{}/*.yaml", temp.path().display());
        let matches = fs.glob(&pattern).unwrap();
        assert_eq!(matches, vec![temp.path().join("a.yaml")]);
    }

    #[test]
    fn test_resolve_path_splits_file() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFS::new();
        let file = temp.path().join("kustomization.yaml");
        fs.write_file(&file, b"{}").unwrap();

        let resolved = fs.resolve_path(&file).unwrap();
        assert_eq!(resolved.file.as_deref(), Some("kustomization.yaml"));
        assert_eq!(resolved.dir, fs::canonicalize(temp.path()).unwrap());

        let dir = fs.resolve_path(temp.path()).unwrap();
        assert_eq!(dir.file, None);
    }

    #[test]
    fn test_walk_visits_files_and_dirs() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFS::new();
        fs.mkdir_all(&temp.path().join("base")).unwrap();
        fs.write_file(&temp.path().join("base/deploy.yaml"), b"")
            .unwrap();

        let mut files = Vec::new();
        let mut dirs = 0;
        fs.walk(temp.path(), &mut |path, kind| {
            match kind {
                EntryKind::File => files.push(path.to_path_buf()),
                EntryKind::Dir => dirs += 1,
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(files, vec![temp.path().join("base/deploy.yaml")]);
        assert_eq!(dirs, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_directory_links() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.yaml"), b"kind: Secret\n").unwrap();
        fs::write(temp.path().join("deploy.yaml"), b"kind: Deployment\n").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("linked-dir")).unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("deploy.yaml"),
            temp.path().join("linked.yaml"),
        )
        .unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("dangling"))
            .unwrap();

        let mut visited = Vec::new();
        DiskFS::new()
            .walk(temp.path(), &mut |path, kind| {
                if kind == EntryKind::File {
                    visited.push(path.file_name().unwrap().to_string_lossy().to_string());
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["deploy.yaml", "linked.yaml"]);
    }
}
