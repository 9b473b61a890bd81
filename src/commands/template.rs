//! # Template Command Implementation
//!
//! This module implements the `template` subcommand. It reads a raw
//! kustomization document whose `resources`, `patchesStrategicMerge`,
//! `configurations` and `patchesJson6902` entries may be inline YAML rather
//! than file references, materializes the inline entries in memory, and
//! builds the result rooted at `--root`.
//!
//! References in the document are resolved against the root. Without
//! `--root` the document is assembled in an empty scratch directory, so
//! only inline content and remote references can be used.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use kustomize_overlay::output::Status;
use kustomize_overlay::record::ConfigRecord;

use super::{read_input, run_build, AssemblyArgs, Context, OutputArgs};

/// Build a kustomization document whose lists may hold inline content
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// The kustomization document to assemble (`-` for stdin)
    #[arg(value_name = "FILE")]
    pub kustomization: PathBuf,

    /// Directory references in the document are relative to (default: an
    /// empty scratch directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(flatten)]
    pub assembly: AssemblyArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the `template` command.
pub fn execute(args: TemplateArgs, ctx: &Context) -> Result<()> {
    ctx.out.report(
        Status::Scan,
        &format!("Assembling {}", args.kustomization.display()),
    );
    let kustomization = read_input(&args.kustomization)?;

    let record = ConfigRecord {
        path: args.root.map(|root| root.display().to_string()),
        kustomization: Some(kustomization),
        ..Default::default()
    };
    run_build(&record, &args.assembly.settings(), &args.output, ctx)
}
