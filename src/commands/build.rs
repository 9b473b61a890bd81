//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, which resolves an existing
//! kustomization directory as is. Nothing is assembled; the directory is
//! handed straight to kustomize and the resolved resources are flattened
//! into the output record.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use kustomize_overlay::orchestrator::BuildSettings;
use kustomize_overlay::output::Status;
use kustomize_overlay::record::ConfigRecord;

use super::{run_build, Context, OutputArgs};

/// Build an existing kustomization directory
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory holding a kustomization.yaml
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, ctx: &Context) -> Result<()> {
    ctx.out.report(
        Status::Scan,
        &format!("Building {}", args.path.display()),
    );
    let record = ConfigRecord {
        path: Some(args.path.display().to_string()),
        ..Default::default()
    };
    run_build(&record, &BuildSettings::default(), &args.output, ctx)
}
