//! # Overlay Command Implementation
//!
//! This module implements the `overlay` subcommand, the base-plus-fragments
//! entry point. It generates a kustomization that references `--base` and
//! collects every `--resource`, `--patch` and `--configuration` file into
//! one synthetic file per kind, optionally merging extra kustomization YAML
//! on top, and builds the result in a scratch directory.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use kustomize_overlay::output::Status;
use kustomize_overlay::record::ConfigRecord;

use super::{read_fragments, read_input, run_build, AssemblyArgs, Context, OutputArgs};

/// Build a generated overlay of a base plus patch and resource fragments
#[derive(Args, Debug)]
pub struct OverlayArgs {
    /// Base kustomization (directory or remote reference) to build on
    #[arg(long = "base", value_name = "PATH")]
    pub bases_path: Option<String>,

    /// Extra resource document; repeatable
    #[arg(long = "resource", value_name = "FILE")]
    pub resources: Vec<PathBuf>,

    /// Strategic-merge patch document; repeatable
    #[arg(long = "patch", value_name = "FILE")]
    pub patches: Vec<PathBuf>,

    /// Transformer configuration document; repeatable
    #[arg(long = "configuration", value_name = "FILE")]
    pub configurations: Vec<PathBuf>,

    /// Kustomization YAML merged after the generated scaffold
    #[arg(long, value_name = "FILE")]
    pub kustomization: Option<PathBuf>,

    #[command(flatten)]
    pub assembly: AssemblyArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the `overlay` command.
pub fn execute(args: OverlayArgs, ctx: &Context) -> Result<()> {
    ctx.out.report(
        Status::Scan,
        &format!(
            "Assembling overlay with {} resources, {} patches, {} configurations",
            args.resources.len(),
            args.patches.len(),
            args.configurations.len()
        ),
    );

    let kustomization = match &args.kustomization {
        Some(path) => Some(read_input(path)?),
        None => None,
    };
    let record = ConfigRecord {
        path: None,
        bases_path: args.bases_path,
        kustomization,
        patches: read_fragments(&args.patches)?,
        resources: read_fragments(&args.resources)?,
        configurations: read_fragments(&args.configurations)?,
    };
    run_build(&record, &args.assembly.settings(), &args.output, ctx)
}
