//! File relocation with all-or-nothing semantics.
//!
//! A move is performed with the platform rename primitive. When the rename
//! fails because source and target sit on different filesystems, a
//! copy-then-delete fallback is used: the source is deleted only after the
//! copy is verified complete, and a partial target is removed on any
//! fallback failure. From the caller's point of view the file either lands
//! intact at the target or remains intact at the source.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while relocating a single file.
#[derive(Debug)]
pub enum MoveError {
    /// The rename primitive failed for a reason other than crossing devices.
    RenameFailed {
        source: PathBuf,
        target: PathBuf,
        source_error: io::Error,
    },
    /// The cross-device copy-then-delete fallback failed.
    CopyFallbackFailed {
        source: PathBuf,
        target: PathBuf,
        source_error: io::Error,
    },
    /// The fallback copy wrote fewer bytes than the source holds.
    IncompleteCopy {
        target: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RenameFailed {
                source,
                target,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    target.display(),
                    source_error
                )
            }
            Self::CopyFallbackFailed {
                source,
                target,
                source_error,
            } => {
                write!(
                    f,
                    "Cross-device copy of {} to {} failed: {}",
                    source.display(),
                    target.display(),
                    source_error
                )
            }
            Self::IncompleteCopy {
                target,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Incomplete copy to {}: expected {} bytes, wrote {}",
                    target.display(),
                    expected,
                    actual
                )
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// Moves a file from `source` to `target`.
///
/// Uses `fs::rename` and falls back to copy-then-delete when the rename
/// fails with `CrossesDevices`. The fallback deletes the source only after
/// the copied length matches, and removes the partial target on any
/// failure, so a failed move never leaves a half-written destination file.
pub fn move_file(source: &Path, target: &Path) -> Result<(), MoveError> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_delete(source, target),
        Err(e) => Err(MoveError::RenameFailed {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            source_error: e,
        }),
    }
}

/// Cross-device fallback: copy, verify the copied length, then delete the
/// source. Timestamps are not carried over; permissions are, via `fs::copy`.
fn copy_then_delete(source: &Path, target: &Path) -> Result<(), MoveError> {
    let fallback_error = |e: io::Error| MoveError::CopyFallbackFailed {
        source: source.to_path_buf(),
        target: target.to_path_buf(),
        source_error: e,
    };

    let expected = fs::metadata(source).map_err(&fallback_error)?.len();

    let actual = match fs::copy(source, target) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(target);
            return Err(fallback_error(e));
        }
    };

    if actual != expected {
        let _ = fs::remove_file(target);
        return Err(MoveError::IncompleteCopy {
            target: target.to_path_buf(),
            expected,
            actual,
        });
    }

    if let Err(e) = fs::remove_file(source) {
        // Source could not be deleted; drop the copy so the file does not
        // exist at both paths.
        let _ = fs::remove_file(target);
        return Err(fallback_error(e));
    }

    Ok(())
}
