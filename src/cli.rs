//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// codebase-dump - combine source directories into one text file
///
/// Lists each configured directory (without recursing), keeps the files
/// whose extension is allowed and writes them to a single document, each
/// wrapped in "********* Start File:" / "********* End File:" markers.
///
/// Examples:
///   codebase-dump
///   codebase-dump --dir ./lib --dir ./test --output dump.txt
///   codebase-dump --extensions rs,toml --no-sort
///   codebase-dump --dry-run
///   codebase-dump --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Output file path for the combined document
    ///
    /// Relative paths are resolved against the project root.
    /// Default: combined_codebase.txt
    #[arg(short, long, value_name = "FILE", env = "CODEBASE_DUMP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Directory to combine (repeatable, in output order)
    ///
    /// Replaces the configured directory list when given.
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// File extensions to include (comma-separated)
    ///
    /// Example: --extensions java,js,lua,json
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Base directory for relative source directories and output
    #[arg(short, long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .codebase-dump.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep the filesystem's listing order instead of sorting by name
    #[arg(long)]
    pub no_sort: bool,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Also write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Exit with code 2 if any directory or file could not be read
    #[arg(long)]
    pub strict: bool,

    /// List the files that would be combined without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .codebase-dump.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref extensions) = self.extensions {
            if extensions
                .iter()
                .all(|e| e.trim_start_matches('.').trim().is_empty())
            {
                return Err("--extensions needs at least one non-empty extension".to_string());
            }
        }

        if let Some(ref root) = self.project_root {
            if !root.is_dir() {
                return Err(format!(
                    "Project root is not a directory: {}",
                    root.display()
                ));
            }
        }

        if let Some(ref config) = self.config {
            if !config.is_file() {
                return Err(format!("Config file not found: {}", config.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
