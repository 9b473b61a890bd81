//! # Output Configuration
//!
//! This module controls how the CLI reports progress: with emoji when the
//! terminal supports color, with bracketed plain-text tags otherwise.
//! Status lines go to stderr so that stdout only ever carries the build
//! output record.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kustomize_overlay::output::{OutputConfig, Status};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! out.report(Status::Ok, "Built 3 resources");
//! ```

use std::env;

/// Kind of status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Scan,
    Build,
    Ok,
    Error,
}

impl Status {
    fn emoji(self) -> &'static str {
        match self {
            Status::Scan => "🔍",
            Status::Build => "🔨",
            Status::Ok => "✅",
            Status::Error => "❌",
        }
    }

    fn plain(self) -> &'static str {
        match self {
            Status::Scan => "[SCAN]",
            Status::Build => "[BUILD]",
            Status::Ok => "[OK]",
            Status::Error => "[ERR]",
        }
    }
}

/// Output configuration for controlling colors, emojis and verbosity.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
    /// Suppress status lines entirely.
    pub quiet: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if `NO_COLOR` is set, `CLICOLOR=0`
    /// is set, `TERM=dumb` is set, or stderr is not a TTY (unless
    /// `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self {
            use_color,
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stderr().features().colors_supported()
    }

    /// Render a status line without printing it
    pub fn format(&self, status: Status, message: &str) -> String {
        let tag = if self.use_color {
            status.emoji()
        } else {
            status.plain()
        };
        format!("{} {}", tag, message)
    }

    /// Print a status line to stderr unless quiet
    pub fn report(&self, status: Status, message: &str) {
        if !self.quiet {
            eprintln!("{}", self.format(status, message));
        }
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self {
            use_color: true,
            quiet: false,
        }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self {
            use_color: false,
            quiet: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
