//! Data models for the codebase dump.
//!
//! This module contains the core data structures used throughout
//! the application for representing scanned directories, selected
//! files, the combined document and the summary of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix of the line that opens a block.
pub const START_MARKER: &str = "********* Start File: ";

/// Prefix of the line that closes a block.
pub const END_MARKER: &str = "********* End File: ";

/// A configured directory to scan, in its position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirectory {
    /// Position in the configured sequence (0-indexed).
    pub index: usize,
    /// Resolved path of the directory.
    pub path: PathBuf,
}

impl SourceDirectory {
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Build the ordered sequence, resolving relative entries against `root`.
    pub fn resolve_all<P: AsRef<Path>>(root: &Path, dirs: &[P]) -> Vec<Self> {
        dirs.iter()
            .enumerate()
            .map(|(index, dir)| {
                let dir = dir.as_ref();
                let path = if dir.is_absolute() {
                    dir.to_path_buf()
                } else {
                    root.join(dir)
                };
                Self::new(index, path)
            })
            .collect()
    }
}

impl fmt::Display for SourceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A directory entry whose extension is on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Base name of the entry, used in the block markers.
    pub name: String,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Extension without the leading dot.
    pub extension: String,
}

/// One file's marked contribution to the combined document.
#[derive(Debug, Clone)]
pub struct Block {
    /// Base name written into both markers.
    pub name: String,
    /// Raw file content, untouched.
    pub content: Vec<u8>,
}

impl Block {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Append the rendered block, including its trailing blank line.
    pub fn render_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(START_MARKER.as_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(&self.content);
        out.push(b'\n');
        out.extend_from_slice(END_MARKER.as_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(b"\n\n");
    }
}

/// The append-only output buffer.
#[derive(Debug, Default)]
pub struct AggregatedDocument {
    buffer: Vec<u8>,
    names: Vec<String>,
}

impl AggregatedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one block to the end of the document.
    pub fn push(&mut self, block: &Block) {
        block.render_into(&mut self.buffer);
        self.names.push(block.name.clone());
    }

    /// Base names of the blocks, in document order.
    pub fn block_names(&self) -> &[String] {
        &self.names
    }

    pub fn block_count(&self) -> usize {
        self.names.len()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the document, yielding the bytes to write.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
impl AggregatedDocument {
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Kind of a non-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A directory could not be listed.
    DirectoryListing,
    /// A selected file could not be read.
    FileRead,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::DirectoryListing => write!(f, "directory listing"),
            FailureKind::FileRead => write!(f, "file read"),
        }
    }
}

/// A failure that was logged and skipped over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub path: PathBuf,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A file left out because it exceeded the size limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Summary of one combine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Where the combined document was written.
    pub output_path: PathBuf,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub duration_seconds: f64,
    /// Directories attempted, in configured order.
    pub directories: Vec<PathBuf>,
    /// Base names of the blocks written, in document order.
    pub files: Vec<String>,
    /// Files left out by the size limit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    /// Non-fatal failures, in the order they were met.
    pub failures: Vec<Failure>,
    /// Size of the written document in bytes.
    pub bytes_written: usize,
}

impl RunReport {
    /// Whether any directory or file failed along the way.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of failures of the given kind.
    pub fn failure_count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}
