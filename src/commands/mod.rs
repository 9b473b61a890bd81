//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `kustomize-overlay` command-line tool. Each subcommand is defined in its
//! own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that turns the arguments into a
//!   [`ConfigRecord`] and hands it to [`run_build`].
//!
//! The shared flags for assembly behaviour and output live here as
//! flattened `clap` argument groups.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};

use kustomize_overlay::filesystem::WalkScope;
use kustomize_overlay::fragment::ReferencePolicy;
use kustomize_overlay::orchestrator::{self, BuildSettings};
use kustomize_overlay::output::{OutputConfig, Status};
use kustomize_overlay::record::{BuildOutput, ConfigRecord};
use kustomize_overlay::resolver::KustomizeCli;

pub mod build;
pub mod overlay;
pub mod run;
pub mod template;

/// Global settings every command needs
pub struct Context {
    pub out: OutputConfig,
    pub kustomize_bin: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Walk {
    /// Only synthetic files
    Overlay,
    /// Synthetic files, then the on-disk tree
    OverlayThenBase,
}

impl From<Walk> for WalkScope {
    fn from(walk: Walk) -> Self {
        match walk {
            Walk::Overlay => WalkScope::Overlay,
            Walk::OverlayThenBase => WalkScope::OverlayThenBase,
        }
    }
}

/// Flags controlling how fragments are assembled
#[derive(Args, Debug)]
pub struct AssemblyArgs {
    /// Treat any string that fails to load as inline content instead of
    /// rejecting strings that look like dangling paths
    #[arg(long)]
    pub lenient: bool,

    /// Which layers are staged for kustomize
    #[arg(long, value_enum, value_name = "SCOPE", default_value = "overlay-then-base")]
    pub walk_scope: Walk,
}

impl AssemblyArgs {
    pub fn settings(&self) -> BuildSettings {
        BuildSettings {
            policy: if self.lenient {
                ReferencePolicy::Lenient
            } else {
                ReferencePolicy::Strict
            },
            walk_scope: self.walk_scope.into(),
            ..Default::default()
        }
    }
}

/// Flags controlling where and how the output record is written
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format of the build record
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: Format,

    /// Write the build record to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl OutputArgs {
    pub fn emit(&self, output: &BuildOutput) -> Result<()> {
        let text = match self.format {
            Format::Yaml => output.to_yaml()?,
            Format::Json => format!("{}\n", output.to_json()?),
        };
        match &self.output {
            Some(path) => fs::write(path, text)
                .with_context(|| format!("Failed to write output to {}", path.display())),
            None => {
                print!("{}", text);
                Ok(())
            }
        }
    }
}

/// Read a text input; `-` reads stdin
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read every file of a fragment list
pub fn read_fragments(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(|path| read_input(path)).collect()
}

/// Build `record`, report the result and emit the output record
pub fn run_build(
    record: &ConfigRecord,
    settings: &BuildSettings,
    output: &OutputArgs,
    ctx: &Context,
) -> Result<()> {
    ctx.out.report(
        Status::Build,
        &format!("Resolving with {}", ctx.kustomize_bin.display()),
    );
    let resolver = KustomizeCli::new(&ctx.kustomize_bin);

    let result = match orchestrator::execute(record, &resolver, settings) {
        Ok(result) => result,
        Err(e) => {
            ctx.out.report(Status::Error, "Build failed");
            return Err(e).context("Kustomization build failed");
        }
    };

    ctx.out.report(
        Status::Ok,
        &format!("Built {} resources", result.ids.len()),
    );
    output.emit(&result)
}
