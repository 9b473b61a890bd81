//! Orchestrator for a complete build
//!
//! This module wires the pieces together for each [`BuildMode`] a
//! configuration record can select:
//!
//! 1. Assemble the kustomization tree (template and overlay modes only)
//! 2. Resolve it through a [`Resolver`]
//! 3. Flatten the resolved set into a [`BuildOutput`]
//!
//! Every assembly gets its own [`Assembler`] and therefore its own overlay
//! store; nothing is shared between builds.

use std::path::Path;

use log::info;

use crate::assembler::Assembler;
use crate::defaults::SCRATCH_PREFIX;
use crate::error::{Error, Result};
use crate::filesystem::{DiskFS, FileSystem, WalkScope};
use crate::fragment::ReferencePolicy;
use crate::record::{BuildMode, BuildOutput, ConfigRecord, OverlayInputs};
use crate::resolver::{ResolveOptions, Resolver};

/// Knobs shared by every build mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSettings {
    pub policy: ReferencePolicy,
    pub walk_scope: WalkScope,
    pub options: ResolveOptions,
}

/// Build whatever `record` describes
pub fn execute(
    record: &ConfigRecord,
    resolver: &dyn Resolver,
    settings: &BuildSettings,
) -> Result<BuildOutput> {
    match record.mode()? {
        BuildMode::Path { path } => build_path(&path, resolver, settings),
        BuildMode::Template {
            root,
            kustomization,
        } => build_template(root.as_deref(), &kustomization, resolver, settings),
        BuildMode::Overlay(inputs) => build_overlay(&inputs, resolver, settings),
    }
}

/// Resolve and flatten; any resolver failure is reported against `root`
fn resolve(
    fs: &dyn FileSystem,
    root: &Path,
    resolver: &dyn Resolver,
    options: &ResolveOptions,
) -> Result<BuildOutput> {
    info!("resolving kustomization at {}", root.display());
    let resources = resolver
        .resolve(fs, root, options)
        .map_err(|e| match e {
            e @ Error::Resolution { .. } => e,
            other => Error::Resolution {
                root: root.to_path_buf(),
                message: other.to_string(),
            },
        })?;
    let output = resources.flatten()?;
    info!("resolved {} resources", output.ids.len());
    Ok(output)
}

/// Build an existing directory as is
pub fn build_path(
    path: &Path,
    resolver: &dyn Resolver,
    settings: &BuildSettings,
) -> Result<BuildOutput> {
    resolve(&DiskFS::new(), path, resolver, &settings.options)
}

fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|e| Error::filesystem("create scratch directory", std::env::temp_dir(), e))
}

/// Assemble a raw kustomization document rooted at `root`, then build it
///
/// Without a root the document is assembled in an empty scratch directory,
/// so only its inline fragments and remote references are visible.
pub fn build_template(
    root: Option<&Path>,
    kustomization: &str,
    resolver: &dyn Resolver,
    settings: &BuildSettings,
) -> Result<BuildOutput> {
    let scratch;
    let root = match root {
        Some(root) => root,
        None => {
            scratch = scratch_dir()?;
            scratch.path()
        }
    };

    let mut assembler = Assembler::new(root)
        .with_policy(settings.policy)
        .with_walk_scope(settings.walk_scope);
    assembler.assemble_template(kustomization)?;
    resolve(
        assembler.filesystem(),
        assembler.root(),
        resolver,
        &settings.options,
    )
}

/// Assemble the base-plus-fragments scaffold in a scratch root, then build
/// it
///
/// The scratch root is removed before returning, on success and on failure.
pub fn build_overlay(
    inputs: &OverlayInputs,
    resolver: &dyn Resolver,
    settings: &BuildSettings,
) -> Result<BuildOutput> {
    let scratch = scratch_dir()?;

    let mut assembler = Assembler::new(scratch.path())
        .with_policy(settings.policy)
        .with_walk_scope(settings.walk_scope);
    assembler.assemble_overlay(inputs)?;
    resolve(
        assembler.filesystem(),
        assembler.root(),
        resolver,
        &settings.options,
    )
}
