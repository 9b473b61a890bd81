//! In-memory filesystem implementation for synthetic files

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use super::{EntryKind, FileSystem, ResolvedPath, WalkVisitor};
use crate::error::{Error, Result};
use crate::path::{clean, glob_match};

/// Represents a file with content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// In-memory filesystem
///
/// Files are keyed by lexically cleaned paths. Directories exist either
/// explicitly (via `mkdir`/`mkdir_all`) or implicitly as ancestors of a file.
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    /// Files stored as path -> content mapping
    files: BTreeMap<PathBuf, File>,
    /// Directories created explicitly
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file
    ///
    /// Fails if the path is empty, names a directory, or lives under an
    /// existing file.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) -> Result<()> {
        let path = clean(path);
        if path == Path::new(".") || path.file_name().is_none() {
            return Err(Error::filesystem("write", path, "not a file path"));
        }
        if self.is_directory(&path) {
            return Err(Error::filesystem("write", path, "is a directory"));
        }
        if let Some(ancestor) = path.ancestors().skip(1).find(|a| self.files.contains_key(*a)) {
            let message = format!("parent '{}' is a file", ancestor.display());
            return Err(Error::filesystem("write", &path, message));
        }
        self.files.insert(path, file);
        Ok(())
    }

    /// Add a file with content
    pub fn add_file_content<P: AsRef<Path>>(&mut self, path: P, content: Vec<u8>) -> Result<()> {
        self.add_file(path, File::new(content))
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get a file by path
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&File> {
        self.files.get(&clean(path))
    }

    /// List all files
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, file) pairs, sorted by path
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &File)> {
        self.files.iter()
    }

    fn is_directory(&self, path: &Path) -> bool {
        if self.dirs.contains(path) {
            return true;
        }
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn not_found(path: &Path) -> Error {
        Error::NotFound {
            path: path.to_path_buf(),
        }
    }
}

impl FileSystem for MemoryFS {
    fn create(&mut self, path: &Path) -> Result<()> {
        self.add_file(path, File::new(Vec::new()))
    }

    fn mkdir(&mut self, path: &Path) -> Result<()> {
        let path = clean(path);
        if self.files.contains_key(&path) {
            return Err(Error::filesystem("mkdir", path, "file exists"));
        }
        if let Some(parent) = path.parent() {
            let top_level = parent.as_os_str().is_empty() || parent.parent().is_none();
            if !top_level && !self.is_directory(parent) {
                return Err(Self::not_found(parent));
            }
        }
        self.dirs.insert(path);
        Ok(())
    }

    fn mkdir_all(&mut self, path: &Path) -> Result<()> {
        let path = clean(path);
        if let Some(file) = path.ancestors().find(|a| self.files.contains_key(*a)) {
            return Err(Error::filesystem("mkdir_all", file, "file exists"));
        }
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() && ancestor.parent().is_some() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }

    fn remove_all(&mut self, path: &Path) -> Result<()> {
        let path = clean(path);
        self.files.retain(|file, _| !file.starts_with(&path));
        self.dirs.retain(|dir| !dir.starts_with(&path));
        Ok(())
    }

    fn write_file(&mut self, path: &Path, content: &[u8]) -> Result<()> {
        self.add_file_content(path, content.to_vec())
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Read + 'a>> {
        let file = self.get_file(path).ok_or_else(|| Self::not_found(path))?;
        Ok(Box::new(Cursor::new(file.content.as_slice())))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.get_file(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| Self::not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = clean(path);
        self.files.contains_key(&path) || self.is_directory(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_directory(&clean(path))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut matches = Vec::new();
        for path in self.files.keys() {
            if let Some(path_str) = path.to_str() {
                if glob_match(pattern, path_str)? {
                    matches.push(path.clone());
                }
            }
        }
        Ok(matches)
    }

    fn resolve_path(&self, path: &Path) -> Result<ResolvedPath> {
        let path = clean(path);
        if self.files.contains_key(&path) {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            return Ok(ResolvedPath { dir, file });
        }
        if self.is_directory(&path) {
            return Ok(ResolvedPath {
                dir: path,
                file: None,
            });
        }
        Err(Self::not_found(&path))
    }

    fn walk(&self, path: &Path, visitor: &mut WalkVisitor<'_>) -> Result<()> {
        let root = clean(path);
        if self.files.contains_key(&root) {
            return visitor(&root, EntryKind::File);
        }
        if !self.is_directory(&root) {
            return Err(Self::not_found(&root));
        }

        let mut entries: BTreeMap<PathBuf, EntryKind> = BTreeMap::new();
        entries.insert(root.clone(), EntryKind::Dir);
        for dir in self.dirs.iter().filter(|d| d.starts_with(&root)) {
            entries.insert(dir.clone(), EntryKind::Dir);
        }
        for file in self.files.keys().filter(|f| f.starts_with(&root)) {
            // intermediate directories between the walk root and the file
            for ancestor in file.ancestors().skip(1) {
                if ancestor == root || !ancestor.starts_with(&root) {
                    break;
                }
                entries.insert(ancestor.to_path_buf(), EntryKind::Dir);
            }
            entries.insert(file.clone(), EntryKind::File);
        }

        for (entry, kind) in &entries {
            visitor(entry, *kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    #[test]
    fn test_add_and_read_file() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/root/resources_0", "kind: ConfigMap\n")
            .unwrap();

        assert!(fs.exists(p("/root/resources_0")));
        assert_eq!(
            fs.read_file(p("/root/./resources_0")).unwrap(),
            b"kind: ConfigMap\n"
        );
        assert_eq!(fs.len(), 1);
    }

    #[test]
    fn test_open_reads_content() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("a.yaml", "hello").unwrap();

        let mut content = String::new();
        fs.open(p("a.yaml"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let fs = MemoryFS::new();
        assert!(matches!(
            fs.read_file(p("missing.yaml")),
            Err(Error::NotFound { .. })
        ));
        assert!(fs.open(p("missing.yaml")).is_err());
    }

    #[test]
    fn test_add_file_rejects_invalid_paths() {
        let mut fs = MemoryFS::new();
        assert!(fs.add_file_string("", "x").is_err());
        assert!(fs.add_file_string(".", "x").is_err());

        fs.add_file_string("dir/file", "x").unwrap();
        // "dir" is a directory now
        assert!(fs.add_file_string("dir", "x").is_err());
        // a file cannot have children
        assert!(fs.add_file_string("dir/file/child", "x").is_err());
    }

    #[test]
    fn test_implicit_directories() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/tmp/root/kustomization.yaml", "{}").unwrap();

        assert!(fs.exists(p("/tmp/root")));
        assert!(fs.is_dir(p("/tmp/root")));
        assert!(!fs.is_dir(p("/tmp/root/kustomization.yaml")));
        assert!(!fs.exists(p("/tmp/other")));
    }

    #[test]
    fn test_mkdir_requires_parent() {
        let mut fs = MemoryFS::new();
        assert!(fs.mkdir(p("/a/b")).is_err());
        fs.mkdir(p("/a")).unwrap();
        fs.mkdir(p("/a/b")).unwrap();
        assert!(fs.is_dir(p("/a/b")));
    }

    #[test]
    fn test_mkdir_all_and_remove_all() {
        let mut fs = MemoryFS::new();
        fs.mkdir_all(p("/a/b/c")).unwrap();
        assert!(fs.is_dir(p("/a")));
        assert!(fs.is_dir(p("/a/b/c")));

        fs.add_file_string("/a/b/c/x", "1").unwrap();
        fs.add_file_string("/a/y", "2").unwrap();
        fs.remove_all(p("/a/b")).unwrap();

        assert!(!fs.exists(p("/a/b")));
        assert!(!fs.exists(p("/a/b/c/x")));
        assert!(fs.exists(p("/a/y")));
        // removing something missing is fine
        fs.remove_all(p("/nope")).unwrap();
    }

    #[test]
    fn test_create_truncates() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("f", "content").unwrap();
        fs.create(p("f")).unwrap();
        assert_eq!(fs.get_file("f").unwrap().size(), 0);
    }

    #[test]
    fn test_glob() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/r/resources_0", "a").unwrap();
        fs.add_file_string("/r/resources_1", "b").unwrap();
        fs.add_file_string("/r/patches_0", "c").unwrap();

        let matches = fs.glob("/r/resources_*").unwrap();
        assert_eq!(
            matches,
            vec![
                PathBuf::from("/r/resources_0"),
                PathBuf::from("/r/resources_1")
            ]
        );
        assert!(fs.glob("[").is_err());
    }

    #[test]
    fn test_resolve_path() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/r/patches_0", "x").unwrap();

        let file = fs.resolve_path(p("/r/patches_0")).unwrap();
        assert_eq!(file.dir, PathBuf::from("/r"));
        assert_eq!(file.file.as_deref(), Some("patches_0"));
        assert_eq!(file.full_path(), PathBuf::from("/r/patches_0"));

        let dir = fs.resolve_path(p("/r")).unwrap();
        assert_eq!(dir.dir, PathBuf::from("/r"));
        assert_eq!(dir.file, None);

        assert!(fs.resolve_path(p("/elsewhere")).is_err());
    }

    #[test]
    fn test_walk_visits_sorted_entries() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/r/b", "1").unwrap();
        fs.add_file_string("/r/sub/a", "2").unwrap();
        fs.add_file_string("/other/c", "3").unwrap();

        let mut seen = Vec::new();
        fs.walk(p("/r"), &mut |path, kind| {
            seen.push((path.to_path_buf(), kind));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (PathBuf::from("/r"), EntryKind::Dir),
                (PathBuf::from("/r/b"), EntryKind::File),
                (PathBuf::from("/r/sub"), EntryKind::Dir),
                (PathBuf::from("/r/sub/a"), EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_walk_missing_path_fails() {
        let fs = MemoryFS::new();
        assert!(fs.walk(p("/nope"), &mut |_, _| Ok(())).is_err());
    }

    #[test]
    fn test_walk_propagates_visitor_error() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/r/a", "1").unwrap();
        let result = fs.walk(p("/r"), &mut |_, _| {
            Err(Error::filesystem("visit", "/r", "stop"))
        });
        assert!(result.is_err());
    }
}
