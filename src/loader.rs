//! # Reference Loading
//!
//! Decides whether a caller-supplied string is a locator kustomize can load
//! on its own (a local file or directory under the assembly root, or a
//! remote URL / git reference) rather than inline content.
//!
//! Remote references are recognised syntactically and never fetched; the
//! resolution engine fetches them itself. Local references must exist on
//! the filesystem the loader was built over. Files must stay inside the
//! root, mirroring kustomize's root-only load restriction. Directories are
//! kustomizations with a root of their own and may live anywhere, except
//! the root itself or one of its ancestors.
//!
//! [`ReferenceLoader::locator`] gives the form a loaded reference takes in
//! the assembled document: paths inside the root are written relative to
//! it, so they keep working once the tree is staged elsewhere, and
//! directories outside the root are written as absolute paths.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::path::{clean, is_within};

/// A string that was successfully loaded as a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// URL or git locator, passed through untouched
    Remote(String),
    /// Existing file or directory, as an absolute cleaned path
    Local(PathBuf),
}

fn scp_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // git@github.com:org/repo.git
    RE.get_or_init(|| Regex::new(r"^[\w.-]+@[\w.-]+:[\w./~-]+").expect("valid regex"))
}

fn hosted_repo() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // github.com/org/repo//path?ref=v1
    RE.get_or_init(|| {
        Regex::new(r"^(github\.com|gitlab\.com|bitbucket\.org)/[\w.-]+/[\w.-]+")
            .expect("valid regex")
    })
}

/// Check whether a string is a remote locator kustomize fetches itself
pub fn is_remote(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.contains(char::is_whitespace) {
        return false;
    }
    if let Some(rest) = reference.strip_prefix("git::") {
        return !rest.is_empty();
    }
    if let Ok(url) = Url::parse(reference) {
        return match url.scheme() {
            "http" | "https" | "ssh" | "git" => url.host_str().is_some(),
            "file" => true,
            _ => false,
        };
    }
    scp_like().is_match(reference) || hosted_repo().is_match(reference)
}

/// Loads references against a filesystem, restricted to a root directory
pub struct ReferenceLoader<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
}

impl<'a> ReferenceLoader<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: impl AsRef<Path>) -> Self {
        Self {
            fs,
            root: clean(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load `reference`, failing if it is neither remote nor an existing
    /// path the root may load
    pub fn load(&self, reference: &str) -> Result<Reference> {
        let trimmed = reference.trim();
        if trimmed.is_empty() || trimmed.contains('\n') {
            return Err(Error::NotFound {
                path: PathBuf::from(trimmed),
            });
        }
        if is_remote(trimmed) {
            return Ok(Reference::Remote(trimmed.to_string()));
        }

        let candidate = Path::new(trimmed);
        let absolute = clean(self.root.join(candidate));
        if !self.fs.exists(&absolute) {
            return Err(Error::NotFound { path: absolute });
        }
        if is_within(&self.root, &absolute) && absolute != self.root {
            return Ok(Reference::Local(absolute));
        }

        if !self.fs.is_dir(&absolute) {
            return Err(Error::filesystem(
                "load",
                candidate,
                format!("file escapes root '{}'", self.root.display()),
            ));
        }
        if self.root.starts_with(&absolute) {
            return Err(Error::filesystem(
                "load",
                candidate,
                format!("directory contains root '{}'", self.root.display()),
            ));
        }
        Ok(Reference::Local(absolute))
    }

    /// The string to write in place of `original`, which loaded as
    /// `reference`
    pub fn locator(&self, reference: &Reference, original: &str) -> String {
        let path = match reference {
            Reference::Remote(remote) => return remote.clone(),
            Reference::Local(path) => path,
        };
        match path.strip_prefix(&self.root) {
            Ok(relative) if Path::new(original.trim()).is_absolute() => {
                relative.display().to_string()
            }
            Ok(_) => original.to_string(),
            Err(_) => path.display().to_string(),
        }
    }

    /// True if [`ReferenceLoader::load`] succeeds
    pub fn is_loadable(&self, reference: &str) -> bool {
        self.load(reference).is_ok()
    }
}
