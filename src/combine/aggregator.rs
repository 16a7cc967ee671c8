//! Combining source directories into a single document.
//!
//! Directories are listed and their files read concurrently, then the
//! results are appended in configured directory order and, within a
//! directory, in entry order. One writer owns the buffer.

use crate::error::AggregateError;
use crate::models::{
    AggregatedDocument, Block, CandidateFile, Failure, RunReport, SkippedFile, SourceDirectory,
};
use crate::scanner::{DirectoryScanner, ScanConfig};
use chrono::Utc;
use futures::future::join_all;
use indicatif::ProgressBar;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one selected file.
enum FileOutcome {
    Included(Block),
    TooLarge(SkippedFile),
    Failed(AggregateError),
}

/// The document and bookkeeping gathered before anything is written.
#[derive(Debug, Default)]
pub struct Collected {
    pub document: AggregatedDocument,
    pub directories: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<Failure>,
}

/// Combines the configured directories into one document.
pub struct Aggregator {
    config: ScanConfig,
    scanner: DirectoryScanner,
    progress: ProgressBar,
}

impl Aggregator {
    /// Create a new aggregator for the given scan configuration.
    pub fn new(config: ScanConfig) -> Self {
        let scanner = DirectoryScanner::new(&config);
        Self {
            config,
            scanner,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-directory progress on the given bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// The configured directories, in output order.
    pub fn directories(&self) -> Vec<SourceDirectory> {
        self.config
            .directories
            .iter()
            .enumerate()
            .map(|(index, path)| SourceDirectory::new(index, path.clone()))
            .collect()
    }

    /// List every directory without reading any file.
    pub async fn list_all(
        &self,
    ) -> Vec<(SourceDirectory, Result<Vec<CandidateFile>, AggregateError>)> {
        let dirs = self.directories();
        let listings = join_all(dirs.iter().map(|dir| self.list_directory(dir))).await;
        dirs.into_iter().zip(listings).collect()
    }

    /// Build the combined document without writing it.
    pub async fn collect(&self) -> Collected {
        let dirs = self.directories();
        self.progress.set_length(dirs.len() as u64);

        // join_all yields results in input order, whatever order they finish in
        let scans = join_all(dirs.iter().map(|dir| self.scan_directory(dir))).await;

        let mut collected = Collected::default();
        for (dir, scan) in dirs.into_iter().zip(scans) {
            collected.directories.push(dir.path.clone());

            match scan {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        match outcome {
                            FileOutcome::Included(block) => collected.document.push(&block),
                            FileOutcome::TooLarge(skipped) => {
                                info!(
                                    "Skipping {} ({} bytes exceeds size limit)",
                                    skipped.path.display(),
                                    skipped.size
                                );
                                collected.skipped.push(skipped);
                            }
                            FileOutcome::Failed(err) => {
                                warn!("{}", err);
                                collected.failures.extend(err.to_failure());
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!("{}", err);
                    collected.failures.extend(err.to_failure());
                }
            }
        }

        self.progress.finish_and_clear();
        collected
    }

    /// Combine all directories and write the document to `output_path`.
    ///
    /// Directory and file failures are logged and recorded in the returned
    /// report. Only a failed write is returned as an error, left to the
    /// caller to log. The parent directory of `output_path` is never created.
    pub async fn combine(&self, output_path: &Path) -> Result<RunReport, AggregateError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let collected = self.collect().await;
        let block_count = collected.document.block_count();
        let files = collected.document.block_names().to_vec();
        let bytes_written = collected.document.len();
        let bytes = collected.document.into_bytes();

        tokio::fs::write(output_path, &bytes)
            .await
            .map_err(|source| AggregateError::OutputWrite {
                path: output_path.to_path_buf(),
                source,
            })?;

        info!(
            "Combined {} files into {}",
            block_count,
            output_path.display()
        );

        Ok(RunReport {
            output_path: output_path.to_path_buf(),
            started_at,
            duration_seconds: start.elapsed().as_secs_f64(),
            directories: collected.directories,
            files,
            skipped: collected.skipped,
            failures: collected.failures,
            bytes_written,
        })
    }

    /// List one directory on the blocking pool.
    async fn list_directory(
        &self,
        dir: &SourceDirectory,
    ) -> Result<Vec<CandidateFile>, AggregateError> {
        let scanner = self.scanner.clone();
        let path = dir.path.clone();

        match tokio::task::spawn_blocking(move || scanner.list(&path)).await {
            Ok(listing) => listing,
            Err(join_err) => Err(AggregateError::DirectoryListing {
                path: dir.path.clone(),
                source: io::Error::new(io::ErrorKind::Other, join_err),
            }),
        }
    }

    /// List one directory and read its selected files.
    async fn scan_directory(
        &self,
        dir: &SourceDirectory,
    ) -> Result<Vec<FileOutcome>, AggregateError> {
        debug!("Scanning directory #{}: {}", dir.index, dir);
        let listing = self.list_directory(dir).await;
        self.progress.set_message(dir.to_string());

        let candidates = match listing {
            Ok(candidates) => candidates,
            Err(err) => {
                self.progress.inc(1);
                return Err(err);
            }
        };

        let outcomes = join_all(candidates.into_iter().map(|file| self.read_file(file))).await;
        self.progress.inc(1);
        Ok(outcomes)
    }

    /// Read one selected file, honoring the size limit.
    async fn read_file(&self, file: CandidateFile) -> FileOutcome {
        if let Some(limit) = self.config.max_file_size {
            match tokio::fs::metadata(&file.path).await {
                Ok(metadata) if metadata.len() > limit => {
                    return FileOutcome::TooLarge(SkippedFile {
                        path: file.path,
                        size: metadata.len(),
                    });
                }
                Ok(_) => {}
                Err(source) => {
                    return FileOutcome::Failed(AggregateError::FileRead {
                        path: file.path,
                        source,
                    });
                }
            }
        }

        match tokio::fs::read(&file.path).await {
            Ok(content) => FileOutcome::Included(Block::new(file.name, content)),
            Err(source) => FileOutcome::Failed(AggregateError::FileRead {
                path: file.path,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;
    use crate::report::extract_blocks;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("A");
        let b = temp_dir.path().join("B");
        std::fs::create_dir(&a).unwrap();
        write(&a, "x.js", "hello");
        write(&a, "x.txt", "ignored");

        let output = temp_dir.path().join("out.txt");
        let aggregator = Aggregator::new(ScanConfig::with_directories([&a, &b]));
        let report = aggregator.combine(&output).await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "********* Start File: x.js\nhello\n********* End File: x.js\n\n"
        );
        assert_eq!(report.files, vec!["x.js"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::DirectoryListing);
        assert_eq!(report.failures[0].path, b);
        assert_eq!(report.directories, vec![a, b]);
    }

    #[tokio::test]
    async fn test_empty_directory_list_writes_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.txt");
        std::fs::write(&output, "stale content").unwrap();

        let aggregator = Aggregator::new(ScanConfig::with_directories(Vec::<PathBuf>::new()));
        let report = aggregator.combine(&output).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), Vec::<u8>::new());
        assert_eq!(report.bytes_written, 0);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_blocks_follow_entry_order_with_blank_line() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        write(&src, "b.lua", "return 1");
        write(&src, "a.json", "{\"k\": 1}");

        let output = temp_dir.path().join("out.txt");
        Aggregator::new(ScanConfig::with_directories([&src]))
            .combine(&output)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "********* Start File: a.json\n{\"k\": 1}\n********* End File: a.json\n\n\
             ********* Start File: b.lua\nreturn 1\n********* End File: b.lua\n\n"
        );
    }

    #[tokio::test]
    async fn test_directory_order_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("zz-first");
        let second = temp_dir.path().join("aa-second");
        std::fs::create_dir(&first).unwrap();
        std::fs::create_dir(&second).unwrap();
        write(&first, "z.java", "class Z {}");
        write(&second, "a.java", "class A {}");
        write(&second, "b.js", "b()");

        let collected = Aggregator::new(ScanConfig::with_directories([&first, &second]))
            .collect()
            .await;

        assert_eq!(collected.document.block_names(), ["z.java", "a.java", "b.js"]);
    }

    #[tokio::test]
    async fn test_unsorted_keeps_listing_order() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["m.js", "c.lua", "q.json", "a.java", "notes.md"] {
            write(temp_dir.path(), name, name);
        }

        let listed: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n != "notes.md")
            .collect();

        let config = ScanConfig {
            sort_entries: false,
            ..ScanConfig::with_directories([temp_dir.path()])
        };
        let collected = Aggregator::new(config).collect().await;

        assert_eq!(collected.document.block_names(), listed.as_slice());
    }

    #[tokio::test]
    async fn test_content_round_trips_byte_for_byte() {
        let temp_dir = TempDir::new().unwrap();
        let contents = [
            ("a.js", "line one\n\nline three\n"),
            ("b.json", ""),
            ("c.lua", "\n\n-- trailing blank lines\n\n"),
        ];
        for (name, content) in contents {
            write(temp_dir.path(), name, content);
        }

        let collected = Aggregator::new(ScanConfig::with_directories([temp_dir.path()]))
            .collect()
            .await;
        let blocks = extract_blocks(collected.document.as_bytes());

        assert_eq!(blocks.len(), 3);
        for (block, (name, content)) in blocks.iter().zip(contents) {
            assert_eq!(block.name, name);
            assert_eq!(block.content, content.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        for i in 0..20 {
            write(&src, &format!("file{}.js", i), &format!("module {}", i));
        }

        let aggregator = Aggregator::new(ScanConfig::with_directories([&src]));
        let first = temp_dir.path().join("first.txt");
        let second = temp_dir.path().join("second.txt");
        aggregator.combine(&first).await.unwrap();
        aggregator.combine(&second).await.unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[tokio::test]
    async fn test_missing_output_directory_is_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("no-such-dir").join("out.txt");

        let aggregator = Aggregator::new(ScanConfig::with_directories([temp_dir.path()]));
        let err = aggregator.combine(&output).await.unwrap_err();

        assert!(matches!(err, AggregateError::OutputWrite { .. }));
        assert!(!output.parent().unwrap().exists());

        // Logged once by the binary, so the error itself must name the output
        let message = format!("{:#}", anyhow::Error::from(err));
        assert!(message.contains(&output.display().to_string()));
        assert_eq!(message.matches("Failed to write").count(), 1);
    }

    #[tokio::test]
    async fn test_size_limit_skips_large_files() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "small.js", "ok");
        write(temp_dir.path(), "large.js", &"x".repeat(64));

        let config = ScanConfig {
            max_file_size: Some(16),
            ..ScanConfig::with_directories([temp_dir.path()])
        };
        let collected = Aggregator::new(config).collect().await;

        assert_eq!(collected.document.block_names(), ["small.js"]);
        assert_eq!(collected.skipped.len(), 1);
        assert_eq!(collected.skipped[0].size, 64);
        assert!(collected.failures.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_skipped_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.js", "first");
        std::os::unix::fs::symlink(
            temp_dir.path().join("gone.js"),
            temp_dir.path().join("broken.js"),
        )
        .unwrap();
        write(temp_dir.path(), "c.js", "last");

        let collected = Aggregator::new(ScanConfig::with_directories([temp_dir.path()]))
            .collect()
            .await;

        assert_eq!(collected.document.block_names(), ["a.js", "c.js"]);
        assert_eq!(collected.failures.len(), 1);
        assert_eq!(collected.failures[0].kind, FailureKind::FileRead);
        assert_eq!(collected.failures[0].path, temp_dir.path().join("broken.js"));
    }

    #[tokio::test]
    async fn test_list_all_reports_each_directory() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "one.lua", "1");
        let missing = temp_dir.path().join("missing");

        let listings = Aggregator::new(ScanConfig::with_directories([
            temp_dir.path().to_path_buf(),
            missing,
        ]))
        .list_all()
        .await;

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].0.index, 0);
        assert_eq!(listings[0].1.as_ref().unwrap().len(), 1);
        assert!(listings[1].1.is_err());
    }

    #[test]
    fn test_collect_outside_async_context() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "main.js", "main()");

        let aggregator = Aggregator::new(ScanConfig::with_directories([temp_dir.path()]));
        let collected = tokio_test::block_on(aggregator.collect());

        assert_eq!(collected.document.block_count(), 1);
    }
}
