//! # Filesystem Abstraction
//!
//! The assembler and the resolution engine talk to files exclusively through
//! the [`FileSystem`] trait so that synthetic, in-memory content and real
//! on-disk content can be addressed with the same path-based API.
//!
//! ## Implementations
//!
//! - **[`MemoryFS`]**: an in-memory store. Used as the overlay layer that
//!   holds synthetic files produced during an assembly.
//! - **[`DiskFS`]**: a thin adapter over the host filesystem.
//! - **[`OverlayFS`]**: the composite. Reads consult the in-memory overlay
//!   first and fall back to the base; writes always go to the base. The
//!   only way to put content into the overlay is
//!   [`OverlayFS::write_overlay`].
//!
//! Paths are plain `&Path` values. Relative paths are relative to the
//! process working directory for [`DiskFS`]; [`MemoryFS`] stores whatever
//! (lexically cleaned) path it is given, so callers that mix the two should
//! use absolute paths.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;

mod disk;
mod memory;
mod overlay;

pub use disk::DiskFS;
pub use memory::{File, MemoryFS};
pub use overlay::{OverlayFS, WalkScope};

/// Kind of entry reported to a [`FileSystem::walk`] visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A path split into a confirmed directory and an optional file name
///
/// `file` is `None` when the whole path names a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub dir: PathBuf,
    pub file: Option<String>,
}

impl ResolvedPath {
    /// Rejoin the directory and file name
    pub fn full_path(&self) -> PathBuf {
        match &self.file {
            Some(name) => self.dir.join(name),
            None => self.dir.clone(),
        }
    }
}

/// Visitor callback used by [`FileSystem::walk`]
pub type WalkVisitor<'a> = dyn FnMut(&Path, EntryKind) -> Result<()> + 'a;

/// The filesystem operations a kustomization build needs
pub trait FileSystem {
    /// Create (or truncate) an empty file.
    fn create(&mut self, path: &Path) -> Result<()>;

    /// Create a single directory; the parent must exist.
    fn mkdir(&mut self, path: &Path) -> Result<()>;

    /// Create a directory and all missing parents.
    fn mkdir_all(&mut self, path: &Path) -> Result<()>;

    /// Remove a file or a directory tree. Missing paths are not an error.
    fn remove_all(&mut self, path: &Path) -> Result<()>;

    /// Write `content` to `path`, replacing any previous content.
    fn write_file(&mut self, path: &Path, content: &[u8]) -> Result<()>;

    /// Open a file for reading.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Read + 'a>>;

    /// Read a whole file.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// True if a file or directory exists at `path`. Never fails.
    fn exists(&self, path: &Path) -> bool;

    /// True if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Paths matching a glob pattern.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Split a path into its containing directory and file name.
    fn resolve_path(&self, path: &Path) -> Result<ResolvedPath>;

    /// Visit `path` and everything below it.
    fn walk(&self, path: &Path, visitor: &mut WalkVisitor<'_>) -> Result<()>;

    /// True when paths handed to this filesystem can be passed verbatim to
    /// an external process.
    fn on_disk(&self) -> bool {
        false
    }
}
