//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.codebase-dump.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".codebase-dump.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Base for relative source directories and the output path.
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Output file path, relative to the project root unless absolute.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            output: default_output(),
        }
    }
}

fn default_project_root() -> String {
    ".".to_string()
}

fn default_output() -> String {
    "combined_codebase.txt".to_string()
}

/// Directory scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Directories to combine, in output order.
    #[serde(default = "default_directories")]
    pub directories: Vec<String>,

    /// File extensions to include.
    #[serde(default = "crate::scanner::default_extensions")]
    pub extensions: Vec<String>,

    /// Sort entries by name within each directory.
    #[serde(default = "default_true")]
    pub sort_entries: bool,

    /// Maximum file size in bytes (0 for unlimited).
    #[serde(default)]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            directories: default_directories(),
            extensions: crate::scanner::default_extensions(),
            sort_entries: true,
            max_file_size: 0,
        }
    }
}

fn default_directories() -> Vec<String> {
    vec![
        "../standard-clojure-style-js/lib",
        "../standard-clojure-style-js/test",
        "../standard-clojure-style-lua/",
        "src/main/java/com/oakmac/standardclojurestyle",
        "src/test/java/com/oakmac/standardclojurestyle",
        "src/test/resources/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.project_root {
            self.general.project_root = root.to_string_lossy().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        if !args.dirs.is_empty() {
            self.scanner.directories = args
                .dirs
                .iter()
                .map(|d| d.to_string_lossy().to_string())
                .collect();
        }
        if let Some(ref extensions) = args.extensions {
            self.scanner.extensions = extensions.clone();
        }
        if args.no_sort {
            self.scanner.sort_entries = false;
        }
        if let Some(max) = args.max_file_size {
            self.scanner.max_file_size = max;
        }
    }

    /// Project root as a path.
    pub fn project_root(&self) -> PathBuf {
        PathBuf::from(&self.general.project_root)
    }

    /// Output path, resolved against the project root.
    pub fn output_path(&self) -> PathBuf {
        let output = Path::new(&self.general.output);
        if output.is_absolute() {
            output.to_path_buf()
        } else {
            self.project_root().join(output)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
