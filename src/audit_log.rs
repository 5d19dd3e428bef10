//! Append-only CSV audit trail of completed relocations.
//!
//! The log is a row-oriented UTF-8 CSV file with the header
//! `Timestamp,Original Path,New Path,File Type` and one data row per
//! successful move. It is created with its header on first use, never
//! truncated, and only ever appended to. Each append opens the file,
//! writes one row, flushes, and closes: durability is favored over
//! throughput since a run processes at most thousands of entries.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Default file name for the audit log, placed under the destination root.
pub const DEFAULT_LOG_FILE: &str = "organization_log.csv";

/// Column headers of the audit log.
const HEADER: [&str; 4] = ["Timestamp", "Original Path", "New Path", "File Type"];

/// Timestamp format used in data rows, e.g. `2026-08-30 14:03:52`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single completed relocation.
///
/// One record is appended per successful move; records are never mutated
/// or deleted by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Local wall-clock time of the move, formatted `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Absolute path the file was moved from.
    pub original_path: PathBuf,
    /// Absolute path the file was moved to.
    pub new_path: PathBuf,
    /// Category the file was classified into.
    pub category: String,
}

impl MoveRecord {
    /// Creates a record for a move completed now.
    pub fn now(original_path: &Path, new_path: &Path, category: &str) -> Self {
        Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            original_path: original_path.to_path_buf(),
            new_path: new_path.to_path_buf(),
            category: category.to_string(),
        }
    }

    /// Parses a record back out of a CSV data row.
    ///
    /// Returns `None` when the row does not have exactly the four expected
    /// columns.
    pub fn from_row(row: &csv::StringRecord) -> Option<Self> {
        if row.len() != HEADER.len() {
            return None;
        }
        Some(Self {
            timestamp: row[0].to_string(),
            original_path: PathBuf::from(&row[1]),
            new_path: PathBuf::from(&row[2]),
            category: row[3].to_string(),
        })
    }
}

/// Errors that can occur while initializing, appending to, or reading the
/// audit log.
#[derive(Debug)]
pub enum LogError {
    /// The log file or its parent directory could not be created.
    InitFailed { path: PathBuf, source: std::io::Error },
    /// A row could not be appended.
    AppendFailed { path: PathBuf, source: csv::Error },
    /// The log file could not be opened for appending.
    OpenFailed { path: PathBuf, source: std::io::Error },
    /// The log file could not be read back.
    ReadFailed { path: PathBuf, source: csv::Error },
    /// A data row did not parse into a record.
    MalformedRow { path: PathBuf, line: usize },
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitFailed { path, source } => {
                write!(f, "Failed to create log file {}: {}", path.display(), source)
            }
            Self::AppendFailed { path, source } => {
                write!(f, "Failed to append to log file {}: {}", path.display(), source)
            }
            Self::OpenFailed { path, source } => {
                write!(f, "Failed to open log file {}: {}", path.display(), source)
            }
            Self::ReadFailed { path, source } => {
                write!(f, "Failed to read log file {}: {}", path.display(), source)
            }
            Self::MalformedRow { path, line } => {
                write!(f, "Malformed row at line {} of {}", line, path.display())
            }
        }
    }
}

impl std::error::Error for LogError {}

/// Handle to the audit log file.
///
/// Holds only the path; every operation opens and closes the file so that
/// a completed append survives an external process kill.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Creates a handle for the log at the given path. No filesystem access
    /// happens until [`AuditLog::initialize`].
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the log file with its header row if and only if it does not
    /// already exist. An existing log is left exactly as it is.
    ///
    /// Missing parent directories are created first.
    pub fn initialize(&self) -> Result<(), LogError> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LogError::InitFailed {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let file = fs::File::create(&self.path).map_err(|e| LogError::InitFailed {
            path: self.path.clone(),
            source: e,
        })?;

        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(HEADER)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| LogError::AppendFailed {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Appends one data row for a completed move and flushes it.
    ///
    /// The file is opened in append mode and closed again when this call
    /// returns, so the row is on disk before the next file is processed.
    pub fn append(&self, record: &MoveRecord) -> Result<(), LogError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| LogError::OpenFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer
            .write_record([
                record.timestamp.as_str(),
                &record.original_path.to_string_lossy(),
                &record.new_path.to_string_lossy(),
                record.category.as_str(),
            ])
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| LogError::AppendFailed {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Reads all data rows back as records, skipping the header.
    ///
    /// Used by tests and by operators reconstructing move history.
    pub fn read_records(&self) -> Result<Vec<MoveRecord>, LogError> {
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|e| LogError::ReadFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(|e| LogError::ReadFailed {
                path: self.path.clone(),
                source: e,
            })?;
            let record = MoveRecord::from_row(&row).ok_or(LogError::MalformedRow {
                path: self.path.clone(),
                // header is line 1, first data row is line 2
                line: index + 2,
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_in(dir: &TempDir) -> AuditLog {
        AuditLog::new(dir.path().join("organization_log.csv"))
    }

    #[test]
    fn test_initialize_creates_file_with_header() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = log_in(&temp_dir);

        log.initialize().expect("Failed to initialize log");

        let content = fs::read_to_string(log.path()).expect("Failed to read log");
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("Timestamp,Original Path,New Path,File Type"));
    }

    #[test]
    fn test_initialize_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = AuditLog::new(temp_dir.path().join("nested").join("deeper").join("log.csv"));

        log.initialize().expect("Failed to initialize log");
        assert!(log.path().exists());
    }

    #[test]
    fn test_initialize_never_truncates_existing_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = log_in(&temp_dir);

        log.initialize().expect("Failed to initialize log");
        log.append(&MoveRecord::now(
            Path::new("/src/a.pdf"),
            Path::new("/dest/Documents/a.pdf"),
            "Documents",
        ))
        .expect("Failed to append");

        // Re-initialization of an existing log must be a no-op
        log.initialize().expect("Failed to re-initialize log");

        let records = log.read_records().expect("Failed to read records");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_append_and_read_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = log_in(&temp_dir);
        log.initialize().expect("Failed to initialize log");

        let record = MoveRecord::now(
            Path::new("/src/photo.JPG"),
            Path::new("/dest/Images/photo.JPG"),
            "Images",
        );
        log.append(&record).expect("Failed to append");

        let records = log.read_records().expect("Failed to read records");
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_append_accumulates_rows_across_handles() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        // Two handles simulate two separate runs against the same log
        for n in 0..2 {
            let log = log_in(&temp_dir);
            log.initialize().expect("Failed to initialize log");
            let name = format!("file{}.txt", n);
            log.append(&MoveRecord::now(
                &Path::new("/src").join(&name),
                &Path::new("/dest/Documents").join(&name),
                "Documents",
            ))
            .expect("Failed to append");
        }

        let log = log_in(&temp_dir);
        let records = log.read_records().expect("Failed to read records");
        assert_eq!(records.len(), 2);

        let content = fs::read_to_string(log.path()).expect("Failed to read log");
        let header_rows = content
            .lines()
            .filter(|l| l.starts_with("Timestamp"))
            .count();
        assert_eq!(header_rows, 1, "header must appear exactly once");
    }

    #[test]
    fn test_paths_with_commas_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = log_in(&temp_dir);
        log.initialize().expect("Failed to initialize log");

        let record = MoveRecord::now(
            Path::new("/src/report, final.pdf"),
            Path::new("/dest/Documents/report, final.pdf"),
            "Documents",
        );
        log.append(&record).expect("Failed to append");

        let records = log.read_records().expect("Failed to read records");
        assert_eq!(records[0].original_path, record.original_path);
    }

    #[test]
    fn test_append_without_initialize_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = log_in(&temp_dir);

        let record = MoveRecord::now(Path::new("/a"), Path::new("/b"), "Others");
        assert!(matches!(
            log.append(&record),
            Err(LogError::OpenFailed { .. })
        ));
    }
}
