//! codebase-dump - combine a project's source directories into one file
//!
//! Lists each configured directory (no recursion), keeps the files whose
//! extension is allowed and writes them, wrapped in start/end markers,
//! to a single text document.
//!
//! Exit codes:
//!   0 - Document written (directory/file failures are logged, not fatal)
//!   1 - Runtime error (output not written, bad config, etc.)
//!   2 - Document written but failures occurred and --strict was set

mod cli;
mod combine;
mod config;
mod error;
mod models;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::Args;
use combine::Aggregator;
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{CandidateFile, RunReport};
use scanner::ScanConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("codebase-dump v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(code) => {
            std::process::exit(code);
        }
        Err(e) => {
            error!("Combine failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .codebase-dump.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize directories, extensions and output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG`, when set, takes precedence over -v/-q.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the combine workflow. Returns the exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let scan_config = ScanConfig::from_config(&config.scanner, &config.project_root());
    let output_path = config.output_path();

    if scan_config.directories.is_empty() {
        warn!("No source directories configured; the output will be empty");
    }

    if args.dry_run {
        return handle_dry_run(scan_config).await;
    }

    if !args.quiet {
        println!(
            "📂 Combining {} directories into {}",
            scan_config.directories.len(),
            output_path.display()
        );
    }

    let aggregator = Aggregator::new(scan_config).with_progress(make_progress(args.quiet));
    let report = aggregator.combine(&output_path).await?;

    if let Some(ref report_path) = args.report {
        report::write_json_report(&report, report_path)?;
        info!("Run report written to {}", report_path.display());
    }

    if !args.quiet {
        println!("\n📊 Summary:");
        println!("{}", report::generate_summary_text(&report));
        println!("\n✅ All files combined into {}", output_path.display());
    }

    let code = exit_code(&report, args.strict);
    if code != 0 {
        eprintln!(
            "\n⛔ {} failure(s) while combining. Failing (exit code {}).",
            report.failures.len(),
            code
        );
    }

    Ok(code)
}

/// Exit code for a written document: failures only count under --strict.
fn exit_code(report: &RunReport, strict: bool) -> i32 {
    if strict && report.has_failures() {
        2
    } else {
        0
    }
}

/// Handle --dry-run: list what would be combined, write nothing.
async fn handle_dry_run(scan_config: ScanConfig) -> Result<i32> {
    println!("\n🔍 Dry run: listing directories (nothing is written)...\n");

    let aggregator = Aggregator::new(scan_config);
    let mut selected = Vec::new();

    for (dir, listing) in aggregator.list_all().await {
        match listing {
            Ok(files) => {
                println!("   📁 {} ({} files)", dir, files.len());
                for file in &files {
                    println!("     📄 {}", file.name);
                }
                selected.extend(files);
            }
            Err(e) => {
                warn!("{}", e);
                println!("   ⚠️  {} (unreadable)", dir);
            }
        }
    }

    println!("\n   Total: {} files", selected.len());
    for (extension, count) in count_by_extension(&selected) {
        println!("     .{}: {}", extension, count);
    }
    println!("\n✅ Dry run complete. No output was written.");
    Ok(0)
}

/// Number of selected files per extension, in extension order.
fn count_by_extension(files: &[CandidateFile]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for file in files {
        *counts.entry(file.extension.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Spinner shown while combining.
fn make_progress(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Failure, FailureKind};
    use chrono::Utc;
    use std::path::PathBuf;

    fn make_report(failures: Vec<Failure>) -> RunReport {
        RunReport {
            output_path: PathBuf::from("combined_codebase.txt"),
            started_at: Utc::now(),
            duration_seconds: 0.0,
            directories: vec![PathBuf::from("lib"), PathBuf::from("missing")],
            files: vec!["core.js".to_string()],
            skipped: vec![],
            failures,
            bytes_written: 64,
        }
    }

    #[test]
    fn test_exit_code_clean_run() {
        let report = make_report(vec![]);
        assert_eq!(exit_code(&report, false), 0);
        assert_eq!(exit_code(&report, true), 0);
    }

    #[test]
    fn test_exit_code_partial_failure_is_success_by_default() {
        let report = make_report(vec![Failure::new(
            FailureKind::DirectoryListing,
            "missing",
            "No such file or directory",
        )]);
        assert_eq!(exit_code(&report, false), 0);
    }

    #[test]
    fn test_exit_code_strict_with_failures() {
        let report = make_report(vec![Failure::new(
            FailureKind::FileRead,
            "lib/locked.js",
            "Permission denied",
        )]);
        assert_eq!(exit_code(&report, true), 2);
    }

    #[test]
    fn test_count_by_extension() {
        let file = |name: &str, extension: &str| CandidateFile {
            name: name.to_string(),
            path: PathBuf::from(name),
            extension: extension.to_string(),
        };
        let files = vec![
            file("b.lua", "lua"),
            file("a.js", "js"),
            file("c.js", "js"),
        ];

        let counts: Vec<_> = count_by_extension(&files).into_iter().collect();
        assert_eq!(counts, vec![("js", 2), ("lua", 1)]);
        assert!(count_by_extension(&[]).is_empty());
    }
}
