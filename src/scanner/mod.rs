//! Directory scanner for selecting source files.
//!
//! Lists the immediate entries of one directory (no recursion) and keeps
//! the regular files whose extension is on the allow-list.

use crate::error::AggregateError;
use crate::models::{CandidateFile, SourceDirectory};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Configuration for scanning the source directories.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directories to scan, in output order.
    pub directories: Vec<PathBuf>,
    /// File extensions to include, without the leading dot (e.g., ["js", "lua"])
    pub extensions: Vec<String>,
    /// Sort entries by file name within each directory
    pub sort_entries: bool,
    /// Maximum file size in bytes (None for unlimited)
    pub max_file_size: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            extensions: default_extensions(),
            sort_entries: true,
            max_file_size: None,
        }
    }
}

impl ScanConfig {
    /// Build from the `[scanner]` config section, resolving against `root`.
    pub fn from_config(config: &crate::config::ScannerConfig, root: &Path) -> Self {
        let directories = SourceDirectory::resolve_all(root, config.directories.as_slice())
            .into_iter()
            .map(|dir| dir.path)
            .collect();

        Self {
            directories,
            extensions: config.extensions.clone(),
            sort_entries: config.sort_entries,
            max_file_size: match config.max_file_size {
                0 => None,
                n => Some(n),
            },
        }
    }
}

#[cfg(test)]
impl ScanConfig {
    /// Scan config for the given directories with default filtering.
    pub fn with_directories<P: Into<PathBuf>>(dirs: impl IntoIterator<Item = P>) -> Self {
        Self {
            directories: dirs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// The extensions combined when nothing else is configured.
pub fn default_extensions() -> Vec<String> {
    vec!["java", "js", "lua", "json"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Lists directories and filters their entries.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extensions: Vec<String>,
    sort_entries: bool,
}

impl DirectoryScanner {
    /// Create a new scanner from the filtering part of a scan config.
    pub fn new(config: &ScanConfig) -> Self {
        let extensions = config
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            extensions,
            sort_entries: config.sort_entries,
        }
    }

    /// Check whether a file name carries an allowed extension.
    ///
    /// Matching is case-sensitive. Dotfiles such as `.json` have no
    /// extension and never match.
    pub fn is_allowed(&self, name: &str) -> bool {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|allowed| allowed == ext),
            None => false,
        }
    }

    /// List the selected files of one directory, in entry order.
    pub fn list(&self, dir: &Path) -> Result<Vec<CandidateFile>, AggregateError> {
        let listing_error = |source: io::Error| AggregateError::DirectoryListing {
            path: dir.to_path_buf(),
            source,
        };

        // WalkDir yields a plain file as its own root, which min_depth hides
        let metadata = std::fs::metadata(dir).map_err(listing_error)?;
        if !metadata.is_dir() {
            return Err(listing_error(io::Error::new(
                io::ErrorKind::Other,
                "not a directory",
            )));
        }

        let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1);
        if self.sort_entries {
            walker = walker.sort_by_file_name();
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| listing_error(io::Error::from(e)))?;
            let name = entry.file_name().to_string_lossy().to_string();

            if !self.is_allowed(&name) {
                trace!("Skipping {} (extension not allowed)", name);
                continue;
            }

            // Symlinks are followed here so a linked directory is still skipped
            if entry.path().is_dir() {
                debug!("Skipping directory {}", entry.path().display());
                continue;
            }

            let extension = Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();

            files.push(CandidateFile {
                name,
                path: entry.path().to_path_buf(),
                extension,
            });
        }

        debug!("{}: {} matching files", dir.display(), files.len());
        Ok(files)
    }
}
