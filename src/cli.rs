//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use kustomize_overlay::defaults::{DEFAULT_KUSTOMIZE_BIN, KUSTOMIZE_BIN_ENV};
use kustomize_overlay::output::OutputConfig;

use crate::commands::{self, Context};

/// Kustomize Overlay - Assemble kustomizations from bases and inline fragments
#[derive(Parser, Debug)]
#[command(name = "kustomize-overlay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// The kustomize executable used to resolve kustomizations
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = KUSTOMIZE_BIN_ENV,
        default_value = DEFAULT_KUSTOMIZE_BIN
    )]
    kustomize_bin: PathBuf,

    /// Do not print status lines
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an existing kustomization directory
    Build(commands::build::BuildArgs),

    /// Build a kustomization document whose lists may hold inline content
    Template(commands::template::TemplateArgs),

    /// Build a generated overlay of a base plus patch and resource fragments
    Overlay(commands::overlay::OverlayArgs),

    /// Build whatever a configuration record file describes
    Run(commands::run::RunArgs),
}

impl Cli {
    fn init_logging(&self) {
        // RUST_LOG wins over --log-level
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .try_init();
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        let ctx = Context {
            out: OutputConfig::from_env_and_flag(&self.color).quiet(self.quiet),
            kustomize_bin: self.kustomize_bin,
        };

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &ctx),
            Commands::Template(args) => commands::template::execute(args, &ctx),
            Commands::Overlay(args) => commands::overlay::execute(args, &ctx),
            Commands::Run(args) => commands::run::execute(args, &ctx),
        }
    }
}
