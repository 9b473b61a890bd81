//! Path manipulation utilities for kustomize-overlay

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};

/// Match a path against a glob pattern
///
/// `*` and `?` never match a path separator, the same way a shell glob
/// against the disk behaves.
pub fn glob_match(pattern: &str, path: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(Error::Glob)?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    Ok(pattern.matches_with(path, options))
}

/// Lexically normalize a path
///
/// Removes `.` components and folds `name/..` pairs without touching the
/// disk. Leading `..` components of a relative path are kept, `..` directly
/// under the filesystem root is dropped. An empty result becomes `.`.
pub fn clean<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Check whether `path` stays inside `root` once both are cleaned
///
/// Relative paths are interpreted against `root`.
pub fn is_within<P: AsRef<Path>, R: AsRef<Path>>(root: R, path: P) -> bool {
    let root = clean(root);
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        clean(path)
    } else {
        clean(root.join(path))
    };
    joined.starts_with(&root)
}
