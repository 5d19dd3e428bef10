//! Batch orchestration: scan a source directory, classify each file, move
//! it into its category subdirectory under the destination root, and log
//! every completed move.
//!
//! A run proceeds through validation (source exists, destination disjoint
//! from source), audit log initialization, a non-recursive scan, and one
//! decision per file. Only a precondition or scan failure aborts the run;
//! every per-file failure degrades to a counted skip and the batch
//! continues. A run aborted during validation is guaranteed to have
//! performed no filesystem mutation at all.

use crate::audit_log::{AuditLog, LogError, MoveRecord};
use crate::classifier::CategoryRules;
use crate::config::CompiledFilters;
use crate::mover::{self, MoveError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that abort a run before or during the scan.
///
/// All of these occur before any file has been moved, except `ScanFailed`,
/// which occurs before any per-file decision.
#[derive(Debug)]
pub enum OrganizeError {
    /// A configured path could not be resolved to absolute form.
    InvalidPath { path: PathBuf, source: io::Error },
    /// The source root does not exist or is not a directory.
    SourceMissing { path: PathBuf },
    /// The destination root equals the source root or lies inside it.
    DestinationInsideSource {
        source: PathBuf,
        destination: PathBuf,
    },
    /// The audit log could not be initialized.
    LogInitFailed { source: LogError },
    /// The source directory could not be enumerated.
    ScanFailed { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath { path, source } => {
                write!(f, "Invalid path {}: {}", path.display(), source)
            }
            Self::SourceMissing { path } => {
                write!(
                    f,
                    "Source directory {} not found or is not a directory",
                    path.display()
                )
            }
            Self::DestinationInsideSource {
                source,
                destination,
            } => {
                write!(
                    f,
                    "Destination {} cannot be the same as or inside the source {}",
                    destination.display(),
                    source.display()
                )
            }
            Self::LogInitFailed { source } => {
                write!(f, "Could not initialize audit log: {}", source)
            }
            Self::ScanFailed { path, source } => {
                write!(f, "Error reading directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for orchestration operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why a file was left in the source directory.
#[derive(Debug)]
pub enum SkipReason {
    /// Excluded by the configured filter rules.
    Filtered,
    /// An entry already exists at the computed target path.
    Collision { category: String, target: PathBuf },
    /// The category directory could not be created.
    DirectoryCreation { path: PathBuf, source: io::Error },
    /// The relocation itself failed.
    MoveFailed(MoveError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filtered => write!(f, "excluded by filter rules"),
            Self::Collision { category, .. } => {
                write!(f, "a file with this name already exists in '{}'", category)
            }
            Self::DirectoryCreation { path, source } => {
                write!(
                    f,
                    "could not create category directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::MoveFailed(e) => write!(f, "{}", e),
        }
    }
}

/// What happened to one scanned file.
#[derive(Debug)]
pub enum FileAction {
    /// The file was moved. `log_error` is set when the audit row could not
    /// be written; the move stands either way.
    Moved {
        record: MoveRecord,
        log_error: Option<LogError>,
    },
    /// The file stayed where it was, for the given reason.
    Skipped { reason: SkipReason },
}

/// Per-file outcome reported to observers as it happens.
#[derive(Debug)]
pub struct FileReport {
    /// Base name of the file.
    pub file_name: String,
    /// What was done with it.
    pub action: FileAction,
}

/// Events emitted during a run, in order: one `ScanComplete`, then one
/// `File` per scanned file.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// The scan finished; `total` files will be processed.
    ScanComplete { total: usize },
    /// One file has been processed.
    File(&'a FileReport),
}

/// Aggregate counts for one run.
///
/// `moved + skipped` equals the number of regular files present in the
/// source directory at scan time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files relocated into the destination tree.
    pub moved: usize,
    /// Files left in place, for any skip reason.
    pub skipped: usize,
}

/// What a dry run would do with one file.
#[derive(Debug)]
pub struct PlannedMove {
    /// Base name of the file.
    pub file_name: String,
    /// Category the file classifies into.
    pub category: String,
    /// Path the file would land at.
    pub target: PathBuf,
    /// The decision a real run would make.
    pub outcome: PlannedOutcome,
}

/// Decision a dry run predicts for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedOutcome {
    /// The file would be moved.
    Move,
    /// The file would be skipped by the filter rules.
    SkipFiltered,
    /// The file would be skipped because the target already exists.
    SkipCollision,
}

/// Drives one organization pass over a source directory.
pub struct Organizer {
    source: PathBuf,
    destination: PathBuf,
    log: AuditLog,
    rules: CategoryRules,
    filters: CompiledFilters,
}

impl Organizer {
    /// Creates an orchestrator for one source/destination pair.
    ///
    /// All paths are resolved to absolute form here, before any comparison
    /// or use. A relative `log_file` resolves under the destination root.
    pub fn new(
        source: &Path,
        destination: &Path,
        log_file: &Path,
        rules: CategoryRules,
        filters: CompiledFilters,
    ) -> OrganizeResult<Self> {
        let source = absolutize(source)?;
        let destination = absolutize(destination)?;
        let log_path = if log_file.is_absolute() {
            log_file.to_path_buf()
        } else {
            destination.join(log_file)
        };

        Ok(Self {
            source,
            destination,
            log: AuditLog::new(log_path),
            rules,
            filters,
        })
    }

    /// Returns the absolute source root.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the absolute destination root.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns the audit log path.
    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Runs one organization pass.
    ///
    /// The observer receives a `ScanComplete` event once the file list is
    /// known, then one `File` event per processed file, at the time each
    /// outcome occurs. Returns the aggregate counts.
    ///
    /// Precondition failures (missing source, destination nested in the
    /// source) abort before any mutation: no directories are created and
    /// the log is not touched.
    pub fn run<F>(&self, mut observer: F) -> OrganizeResult<RunSummary>
    where
        F: FnMut(BatchEvent<'_>),
    {
        self.validate()?;

        self.log
            .initialize()
            .map_err(|e| OrganizeError::LogInitFailed { source: e })?;

        let files = self.scan()?;
        observer(BatchEvent::ScanComplete { total: files.len() });

        let mut summary = RunSummary::default();
        for path in &files {
            let report = self.process_file(path);
            match report.action {
                FileAction::Moved { .. } => summary.moved += 1,
                FileAction::Skipped { .. } => summary.skipped += 1,
            }
            observer(BatchEvent::File(&report));
        }

        Ok(summary)
    }

    /// Computes what a run would do without mutating anything: no category
    /// directories are created, no log is initialized, no file is moved.
    pub fn preview(&self) -> OrganizeResult<Vec<PlannedMove>> {
        self.validate()?;

        let files = self.scan()?;
        let mut planned = Vec::with_capacity(files.len());

        for path in &files {
            let file_name = base_name(path);
            let category = self.rules.classify_path(path).to_string();
            let target = resolve_target(&self.destination, &category, path);
            let outcome = if !self.filters.should_include(path) {
                PlannedOutcome::SkipFiltered
            } else if !may_move(&target) {
                PlannedOutcome::SkipCollision
            } else {
                PlannedOutcome::Move
            };

            planned.push(PlannedMove {
                file_name,
                category,
                target,
                outcome,
            });
        }

        Ok(planned)
    }

    /// Precondition checks. Performs no mutation.
    fn validate(&self) -> OrganizeResult<()> {
        if !self.source.is_dir() {
            return Err(OrganizeError::SourceMissing {
                path: self.source.clone(),
            });
        }

        // starts_with covers equality as well as nesting
        if self.destination.starts_with(&self.source) {
            return Err(OrganizeError::DestinationInsideSource {
                source: self.source.clone(),
                destination: self.destination.clone(),
            });
        }

        Ok(())
    }

    /// Enumerates the immediate regular files of the source directory.
    /// Subdirectories are not descended into.
    fn scan(&self) -> OrganizeResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.source).map_err(|e| OrganizeError::ScanFailed {
            path: self.source.clone(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    /// One per-file decision: filter, classify, resolve, ensure the
    /// category directory, collision-check, move, log.
    fn process_file(&self, path: &Path) -> FileReport {
        let file_name = base_name(path);

        if !self.filters.should_include(path) {
            return FileReport {
                file_name,
                action: FileAction::Skipped {
                    reason: SkipReason::Filtered,
                },
            };
        }

        let category = self.rules.classify_path(path).to_string();
        let category_dir = self.destination.join(&category);
        let target = resolve_target(&self.destination, &category, path);

        if let Err(e) = fs::create_dir_all(&category_dir) {
            return FileReport {
                file_name,
                action: FileAction::Skipped {
                    reason: SkipReason::DirectoryCreation {
                        path: category_dir,
                        source: e,
                    },
                },
            };
        }

        // Check-then-move: the window between this check and the rename is
        // accepted under the single-operator usage model.
        if !may_move(&target) {
            return FileReport {
                file_name,
                action: FileAction::Skipped {
                    reason: SkipReason::Collision { category, target },
                },
            };
        }

        match mover::move_file(path, &target) {
            Err(e) => FileReport {
                file_name,
                action: FileAction::Skipped {
                    reason: SkipReason::MoveFailed(e),
                },
            },
            Ok(()) => {
                let record = MoveRecord::now(path, &target, &category);
                // A failed append never reverses the completed move; the
                // move is the source of truth and the log is best-effort.
                let log_error = self.log.append(&record).err();
                FileReport {
                    file_name,
                    action: FileAction::Moved { record, log_error },
                }
            }
        }
    }
}

/// Computes the target path for a file: `<destination>/<category>/<name>`.
fn resolve_target(destination: &Path, category: &str, file_path: &Path) -> PathBuf {
    let name = file_path.file_name().unwrap_or(file_path.as_os_str());
    destination.join(category).join(name)
}

/// Collision guard: a move may proceed only when nothing exists at the
/// target path. Never overwrite silently.
fn may_move(target: &Path) -> bool {
    !target.exists()
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn absolutize(path: &Path) -> OrganizeResult<PathBuf> {
    std::path::absolute(path).map_err(|e| OrganizeError::InvalidPath {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit_log::DEFAULT_LOG_FILE;
    use tempfile::TempDir;

    fn organizer(source: &Path, destination: &Path) -> Organizer {
        Organizer::new(
            source,
            destination,
            Path::new(DEFAULT_LOG_FILE),
            CategoryRules::default(),
            CompiledFilters::defaults(),
        )
        .expect("Failed to build organizer")
    }

    #[test]
    fn test_resolve_target() {
        let target = resolve_target(
            Path::new("/dest"),
            "Documents",
            Path::new("/src/report.pdf"),
        );
        assert_eq!(target, Path::new("/dest/Documents/report.pdf"));
    }

    #[test]
    fn test_may_move_blocks_existing_target() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let existing = temp_dir.path().join("taken.txt");
        fs::write(&existing, "x").expect("Failed to write file");

        assert!(!may_move(&existing));
        assert!(may_move(&temp_dir.path().join("free.txt")));
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let dest = TempDir::new().expect("Failed to create temp directory");
        let org = organizer(Path::new("/no/such/source"), dest.path());

        let result = org.run(|_| {});
        assert!(matches!(result, Err(OrganizeError::SourceMissing { .. })));
    }

    #[test]
    fn test_validate_rejects_destination_equal_to_source() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let org = organizer(dir.path(), dir.path());

        let result = org.run(|_| {});
        assert!(matches!(
            result,
            Err(OrganizeError::DestinationInsideSource { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_destination_inside_source() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let nested = dir.path().join("organized");
        let org = organizer(dir.path(), &nested);

        let result = org.run(|_| {});
        assert!(matches!(
            result,
            Err(OrganizeError::DestinationInsideSource { .. })
        ));
        // Aborted runs must have zero side effects
        assert!(!nested.exists());
    }

    #[test]
    fn test_destination_as_ancestor_of_source_is_allowed() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let source = dir.path().join("inbox");
        fs::create_dir(&source).expect("Failed to create source");
        fs::write(source.join("a.txt"), "x").expect("Failed to write file");

        let org = organizer(&source, dir.path());
        let summary = org.run(|_| {}).expect("run failed");
        assert_eq!(summary, RunSummary { moved: 1, skipped: 0 });
    }

    #[test]
    fn test_relative_log_file_resolves_under_destination() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        let org = organizer(source.path(), dest.path());

        assert_eq!(org.log_path(), dest.path().join(DEFAULT_LOG_FILE));
    }
}
