//! Error taxonomy for the aggregation pass.
//!
//! Listing and read failures are recorded and logged by the aggregator
//! without stopping the run; only a failed output write is returned to
//! the caller as an error.

use crate::models::{Failure, FailureKind};
use std::path::PathBuf;
use thiserror::Error;

/// A failure raised while combining source directories.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// A configured directory could not be listed.
    #[error("Failed to list directory {}: {source}", .path.display())]
    DirectoryListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A selected file could not be read.
    #[error("Failed to read file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The combined document could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AggregateError {
    /// Path the failure refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            AggregateError::DirectoryListing { path, .. }
            | AggregateError::FileRead { path, .. }
            | AggregateError::OutputWrite { path, .. } => path,
        }
    }

    /// Record of a recoverable failure for the run report.
    pub fn to_failure(&self) -> Option<Failure> {
        let kind = match self {
            AggregateError::DirectoryListing { .. } => FailureKind::DirectoryListing,
            AggregateError::FileRead { .. } => FailureKind::FileRead,
            AggregateError::OutputWrite { .. } => return None,
        };
        let message = match self {
            AggregateError::DirectoryListing { source, .. }
            | AggregateError::FileRead { source, .. }
            | AggregateError::OutputWrite { source, .. } => source.to_string(),
        };
        Some(Failure::new(kind, self.path().clone(), message))
    }
}
