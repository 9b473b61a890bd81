//! Composite filesystem: an in-memory overlay on top of a base filesystem
//!
//! Every read-type operation (`exists`, `open`, `read_file`, `glob`,
//! `resolve_path`) checks the overlay first and falls back to the base.
//! Every write-type operation goes to the base. [`OverlayFS::write_overlay`]
//! is the only entry point that mutates the overlay, so synthetic content
//! stays purely in memory while real scratch files can still be created.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;

use super::{DiskFS, FileSystem, MemoryFS, ResolvedPath, WalkVisitor};
use crate::error::{Error, Result};
use crate::path::clean;

/// Which delegates [`OverlayFS::walk`] visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkScope {
    /// Only the in-memory overlay.
    Overlay,
    /// The overlay first, then base entries not shadowed by an overlay file.
    #[default]
    OverlayThenBase,
}

/// Composite of an owned in-memory overlay and an owned base filesystem
#[derive(Debug, Clone)]
pub struct OverlayFS<B: FileSystem = DiskFS> {
    overlay: MemoryFS,
    base: B,
    walk_scope: WalkScope,
}

impl OverlayFS<DiskFS> {
    /// Empty overlay on top of the real disk
    pub fn new() -> Self {
        Self::from_parts(MemoryFS::new(), DiskFS::new())
    }
}

impl Default for OverlayFS<DiskFS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: FileSystem> OverlayFS<B> {
    /// Build a composite from an overlay store and a base, taking ownership
    /// of both
    pub fn from_parts(overlay: MemoryFS, base: B) -> Self {
        Self {
            overlay,
            base,
            walk_scope: WalkScope::default(),
        }
    }

    /// Empty overlay on top of `base`
    pub fn with_base(base: B) -> Self {
        Self::from_parts(MemoryFS::new(), base)
    }

    pub fn with_walk_scope(mut self, scope: WalkScope) -> Self {
        self.walk_scope = scope;
        self
    }

    pub fn walk_scope(&self) -> WalkScope {
        self.walk_scope
    }

    /// Write a synthetic file into the overlay
    pub fn write_overlay<P: AsRef<Path>>(&mut self, name: P, content: &[u8]) -> Result<()> {
        debug!(
            "overlay: writing {} ({} bytes)",
            name.as_ref().display(),
            content.len()
        );
        self.overlay.add_file_content(name, content.to_vec())
    }

    pub fn overlay(&self) -> &MemoryFS {
        &self.overlay
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    /// Give back the two delegates
    pub fn into_parts(self) -> (MemoryFS, B) {
        (self.overlay, self.base)
    }
}

impl<B: FileSystem> FileSystem for OverlayFS<B> {
    fn create(&mut self, path: &Path) -> Result<()> {
        self.base.create(path)
    }

    fn mkdir(&mut self, path: &Path) -> Result<()> {
        self.base.mkdir(path)
    }

    fn mkdir_all(&mut self, path: &Path) -> Result<()> {
        self.base.mkdir_all(path)
    }

    fn remove_all(&mut self, path: &Path) -> Result<()> {
        self.base.remove_all(path)
    }

    fn write_file(&mut self, path: &Path, content: &[u8]) -> Result<()> {
        self.base.write_file(path, content)
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Read + 'a>> {
        match self.overlay.open(path) {
            Ok(reader) => Ok(reader),
            Err(_) => self.base.open(path),
        }
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        match self.overlay.read_file(path) {
            Ok(content) => Ok(content),
            Err(_) => self.base.read_file(path),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.overlay.exists(path) || self.base.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        // the overlay only ever holds flat synthetic files
        self.base.is_dir(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut matches = Vec::new();
        match self.overlay.glob(pattern) {
            Ok(found) => matches.extend(found),
            Err(e) => debug!("overlay: glob '{}' on overlay failed: {}", pattern, e),
        }
        match self.base.glob(pattern) {
            Ok(found) => matches.extend(found),
            Err(e) => debug!("overlay: glob '{}' on base failed: {}", pattern, e),
        }
        Ok(matches)
    }

    fn resolve_path(&self, path: &Path) -> Result<ResolvedPath> {
        if self.overlay.exists(path) {
            return self.overlay.resolve_path(path);
        }
        self.base.resolve_path(path)
    }

    fn walk(&self, path: &Path, visitor: &mut WalkVisitor<'_>) -> Result<()> {
        let in_overlay = self.overlay.exists(path);
        let in_base = self.walk_scope == WalkScope::OverlayThenBase && self.base.exists(path);

        let mut seen: HashSet<PathBuf> = HashSet::new();
        if in_overlay {
            self.overlay.walk(path, &mut |entry, kind| {
                seen.insert(clean(entry));
                visitor(entry, kind)
            })?;
        }
        if in_base {
            self.base.walk(path, &mut |entry, kind| {
                if seen.contains(&clean(entry)) {
                    return Ok(());
                }
                visitor(entry, kind)
            })?;
        }

        if !in_overlay && !in_base && self.walk_scope == WalkScope::OverlayThenBase {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn on_disk(&self) -> bool {
        // overlay content is invisible to external processes
        false
    }
}
