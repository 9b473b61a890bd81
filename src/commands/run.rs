//! # Run Command Implementation
//!
//! This module implements the `run` subcommand, which reads a configuration
//! record (YAML or JSON) and builds whatever it describes: a directory, a
//! template document, or a base-plus-fragments overlay.

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;

use kustomize_overlay::defaults::RECORD_ENV;
use kustomize_overlay::output::Status;
use kustomize_overlay::record::ConfigRecord;

use super::{run_build, AssemblyArgs, Context, OutputArgs};

/// Build whatever a configuration record file describes
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration record file.
    ///
    /// Can also be set with the `KUSTOMIZE_OVERLAY_RECORD` environment
    /// variable.
    #[arg(value_name = "FILE", env = RECORD_ENV)]
    pub record: PathBuf,

    #[command(flatten)]
    pub assembly: AssemblyArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the `run` command.
pub fn execute(args: RunArgs, ctx: &Context) -> Result<()> {
    ctx.out.report(
        Status::Scan,
        &format!("Loading record {}", args.record.display()),
    );
    let record = ConfigRecord::from_file(&args.record)
        .with_context(|| format!("Failed to load record {}", args.record.display()))?;
    run_build(&record, &args.assembly.settings(), &args.output, ctx)
}
