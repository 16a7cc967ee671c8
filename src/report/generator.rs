//! Reporting on runs.
//!
//! Renders a `RunReport` as JSON or as a console summary. Tests also get
//! `extract_blocks`, which splits a combined document back into its files.

use crate::models::{FailureKind, RunReport};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// A block recovered from a combined document.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock {
    pub name: String,
    pub content: Vec<u8>,
}

/// Split a combined document back into its blocks.
///
/// Parsing stops at the first malformed block; everything before it is
/// returned.
#[cfg(test)]
pub fn extract_blocks(document: &[u8]) -> Vec<ExtractedBlock> {
    use crate::models::{END_MARKER, START_MARKER};

    let mut blocks = Vec::new();
    let mut rest = document;

    while let Some(after_marker) = rest.strip_prefix(START_MARKER.as_bytes()) {
        let Some(name_end) = after_marker.iter().position(|&b| b == b'\n') else {
            break;
        };
        let name = &after_marker[..name_end];
        let body = &after_marker[name_end + 1..];

        let mut closing = Vec::with_capacity(END_MARKER.len() + name.len() + 3);
        closing.push(b'\n');
        closing.extend_from_slice(END_MARKER.as_bytes());
        closing.extend_from_slice(name);
        closing.extend_from_slice(b"\n\n");

        let Some(end) = find(body, &closing) else {
            break;
        };

        blocks.push(ExtractedBlock {
            name: String::from_utf8_lossy(name).to_string(),
            content: body[..end].to_vec(),
        });
        rest = &body[end + closing.len()..];
    }

    blocks
}

#[cfg(test)]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &RunReport, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

/// Generate the console summary printed after a run.
pub fn generate_summary_text(report: &RunReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("   Directories: {}", report.directories.len()));
    lines.push(format!("   Files combined: {}", report.files.len()));
    if !report.skipped.is_empty() {
        lines.push(format!("   Skipped (too large): {}", report.skipped.len()));
    }
    lines.push(format!("   Bytes written: {}", report.bytes_written));

    if report.has_failures() {
        lines.push(format!(
            "   ⚠️  Failures: {} directory, {} file",
            report.failure_count(FailureKind::DirectoryListing),
            report.failure_count(FailureKind::FileRead)
        ));
        for failure in &report.failures {
            lines.push(format!(
                "     - {} {}: {}",
                failure.kind,
                failure.path.display(),
                failure.message
            ));
        }
    }

    lines.push(format!("   Duration: {:.2}s", report.duration_seconds));

    lines.join("\n")
}
