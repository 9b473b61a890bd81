//! # Resolution Engine Boundary
//!
//! The resolution engine turns an assembled kustomization tree into concrete
//! resource manifests. It is external to this crate and reached only
//! through the [`Resolver`] trait, which makes it straightforward to swap
//! the real engine for a test double.
//!
//! The shipped implementation is [`KustomizeCli`], which runs the
//! `kustomize` executable.

use std::path::Path;

use crate::error::Result;
use crate::filesystem::FileSystem;
use crate::manifest::ResourceSet;

mod kustomize;

pub use kustomize::KustomizeCli;

/// Which files a kustomization may load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadRestrictor {
    /// Files must live under the kustomization root
    #[default]
    RootOnly,
    /// No restriction
    None,
}

/// Options passed to the resolution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Emit resources in kustomize's legacy (kind-based) order
    pub legacy_sort: bool,
    pub load_restrictor: LoadRestrictor,
    /// Prune resources not present in the inventory
    pub prune: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            legacy_sort: true,
            load_restrictor: LoadRestrictor::RootOnly,
            prune: false,
        }
    }
}

/// Resolves the kustomization found at `root` on `fs`
///
/// Implementations must not retry: resolution is a pure function of the
/// filesystem content.
pub trait Resolver {
    fn resolve(&self, fs: &dyn FileSystem, root: &Path, options: &ResolveOptions)
        -> Result<ResourceSet>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
        options: &ResolveOptions,
    ) -> Result<ResourceSet> {
        (**self).resolve(fs, root, options)
    }
}
