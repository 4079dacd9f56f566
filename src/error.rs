//! Error types for defrag
//!
//! This module defines the error hierarchy for a reconstruction run:
//! - Configuration and CLI errors (bad invocation)
//! - Access errors (root directory or output path unusable)
//! - Traversal errors (a fragment or subdirectory was skipped)
//! - Gap errors (a position was never filled)
//! - Write errors (output could not be created or written)
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Fatal errors are returned as `Err`; traversal errors are data
//!   collected into the run report so sibling work is never aborted
//! - Every fatal category maps to its own process exit code

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes, one per distinguishable outcome
pub mod exit_code {
    /// Output written, nothing skipped
    pub const SUCCESS: u8 = 0;
    /// Unexpected internal failure
    pub const INTERNAL: u8 = 1;
    /// Invalid arguments (same code clap uses for usage errors)
    pub const INVALID_ARGS: u8 = 2;
    /// Root directory could not be read
    pub const ROOT_UNREADABLE: u8 = 3;
    /// Output written, but one or more fragments were skipped
    pub const FRAGMENTS_SKIPPED: u8 = 4;
    /// Output could not be created or written
    pub const OUTPUT_FAILED: u8 = 5;
    /// Fragment sequence has a gap
    pub const GAP: u8 = 6;
}

/// Top-level error type for a reconstruction run
#[derive(Error, Debug)]
pub enum DefragError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Root directory or output path errors
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    /// Missing positions in the fragment sequence
    #[error("Gap error: {0}")]
    Gap(#[from] GapError),

    /// Output errors
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

impl DefragError {
    /// Exit code the binary reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            DefragError::Config(_) => exit_code::INVALID_ARGS,
            DefragError::Access(AccessError::OutputUnusable { .. }) => exit_code::OUTPUT_FAILED,
            DefragError::Access(_) => exit_code::ROOT_UNREADABLE,
            DefragError::Gap(_) => exit_code::GAP,
            DefragError::Write(_) => exit_code::OUTPUT_FAILED,
        }
    }
}

/// Failure to list a directory or read a file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    /// Path not found
    #[error("Path not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Permission denied
    #[error("Permission denied: '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure
    #[error("I/O error on '{path}': {reason}")]
    Io { path: PathBuf, reason: String },
}

impl FileError {
    /// Build a FileError from an I/O error on `path`
    pub fn from_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            _ => FileError::Io {
                path,
                reason: err.to_string(),
            },
        }
    }

    /// The path this error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileError::NotFound { path }
            | FileError::PermissionDenied { path }
            | FileError::Io { path, .. } => path,
        }
    }

    /// True for I/O failures other than a missing or forbidden path
    pub fn is_unexpected(&self) -> bool {
        matches!(self, FileError::Io { .. })
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Output file does not carry the required extension
    #[error("Output file '{path}' must have a .{expected} extension")]
    InvalidOutputExtension { path: PathBuf, expected: String },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    /// Empty fragment marker
    #[error("Fragment marker must not be empty")]
    InvalidMarker,

    /// Empty root path
    #[error("Root directory path must not be empty")]
    EmptyRoot,

    /// Position ceiling above what the store can hold
    #[error("Maximum position {value} exceeds the supported limit {limit}")]
    MaxPositionTooLarge { value: usize, limit: usize },
}

/// Root or output path errors, fatal before any work starts
#[derive(Error, Debug)]
pub enum AccessError {
    /// Root could not be listed
    #[error("Cannot read root directory: {0}")]
    RootUnreadable(FileError),

    /// Root exists but is not a directory
    #[error("Root '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// Output file could not be created or truncated
    #[error("Output '{path}' is not writable: {reason}")]
    OutputUnusable { path: PathBuf, reason: String },
}

/// A skipped fragment, file or subtree. Never aborts sibling work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    /// Directory could not be listed
    #[error("Skipped directory: {0}")]
    ReadDir(FileError),

    /// Fragment file could not be read
    #[error("Skipped fragment: {0}")]
    ReadFile(FileError),

    /// Fragment file name carries no leading position
    #[error("Skipped fragment '{path}': name has no leading numeric position")]
    InvalidName { path: PathBuf },

    /// Parsed position exceeds the configured ceiling
    #[error("Skipped fragment '{path}': position {position} exceeds limit {max}")]
    PositionOutOfRange {
        path: PathBuf,
        position: usize,
        max: usize,
    },

    /// The store refused the fragment
    #[error("Skipped fragment '{path}': {error}")]
    StoreRejected { path: PathBuf, error: StoreError },

    /// A worker thread panicked; its subtree is incomplete
    #[error("Worker for '{path}' panicked: {message}")]
    WorkerPanicked { path: PathBuf, message: String },
}

impl TraversalError {
    /// The path this error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            TraversalError::ReadDir(e) | TraversalError::ReadFile(e) => e.path(),
            TraversalError::InvalidName { path }
            | TraversalError::PositionOutOfRange { path, .. }
            | TraversalError::StoreRejected { path, .. }
            | TraversalError::WorkerPanicked { path, .. } => path,
        }
    }

    /// Returns true if a fragment (rather than a whole directory) was lost
    pub fn is_fragment(&self) -> bool {
        matches!(
            self,
            TraversalError::ReadFile(_)
                | TraversalError::InvalidName { .. }
                | TraversalError::PositionOutOfRange { .. }
                | TraversalError::StoreRejected { .. }
        )
    }
}

/// Insert refused by the fragment store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Position above the hard slot limit
    #[error("position {position} exceeds store limit {limit}")]
    PositionTooLarge { position: usize, limit: usize },

    /// Growing the slot table failed
    #[error("cannot grow store to position {position}: {reason}")]
    GrowFailed { position: usize, reason: String },
}

/// One or more positions in `[0, slots)` were never filled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} of {slots} positions missing (first missing: {})", .missing.len(), first_missing(.missing))]
pub struct GapError {
    /// Missing positions in ascending order
    pub missing: Vec<usize>,

    /// Slot count of the store (max position + 1)
    pub slots: usize,
}

fn first_missing(missing: &[usize]) -> String {
    missing
        .first()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".into())
}

/// Output errors, fatal and abort remaining writes
#[derive(Error, Debug)]
pub enum WriteError {
    /// Output could not be created or truncated
    #[error("Failed to create output '{path}': {source}")]
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A fragment write failed
    #[error("Failed to write fragment {position}: {source}")]
    WriteFailed {
        position: usize,
        source: std::io::Error,
    },

    /// Final flush failed
    #[error("Failed to flush output: {0}")]
    FlushFailed(std::io::Error),
}

/// Result type alias for DefragError
pub type Result<T> = std::result::Result<T, DefragError>;

/// Result type alias for FileError
pub type FileResult<T> = std::result::Result<T, FileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;

    #[test]
    fn test_file_error_from_io_kind() {
        let e = FileError::from_io("/x", &io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, FileError::NotFound { .. }));

        let e = FileError::from_io("/x", &io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, FileError::PermissionDenied { .. }));
        assert!(!e.is_unexpected());

        let e = FileError::from_io("/x", &io::Error::other("disk on fire"));
        assert!(e.is_unexpected());
        assert_eq!(e.path(), std::path::Path::new("/x"));
    }

    #[test]
    fn test_error_conversion() {
        let err: DefragError = ConfigError::InvalidMarker.into();
        assert!(matches!(err, DefragError::Config(_)));

        let err: DefragError = GapError {
            missing: vec![2],
            slots: 4,
        }
        .into();
        assert!(matches!(err, DefragError::Gap(_)));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors: Vec<DefragError> = vec![
            ConfigError::EmptyRoot.into(),
            AccessError::NotADirectory { path: "/r".into() }.into(),
            GapError {
                missing: vec![1],
                slots: 2,
            }
            .into(),
            WriteError::FlushFailed(io::Error::other("x")).into(),
        ];

        let mut codes: HashSet<u8> = errors.iter().map(|e| e.exit_code()).collect();
        assert_eq!(codes.len(), 4);

        // An unusable output shares the output-failure code, not the root one
        let output: DefragError = AccessError::OutputUnusable {
            path: "/o/out.mp3".into(),
            reason: "read-only".into(),
        }
        .into();
        assert_eq!(output.exit_code(), exit_code::OUTPUT_FAILED);

        for code in [
            exit_code::SUCCESS,
            exit_code::INTERNAL,
            exit_code::FRAGMENTS_SKIPPED,
        ] {
            assert!(codes.insert(code), "exit code {} reused", code);
        }
    }

    #[test]
    fn test_gap_error_message() {
        let err = GapError {
            missing: vec![2, 5],
            slots: 6,
        };
        assert_eq!(err.to_string(), "2 of 6 positions missing (first missing: 2)");
    }

    #[test]
    fn test_traversal_error_is_fragment() {
        let e = TraversalError::InvalidName {
            path: "/r/a/abc.bin".into(),
        };
        assert!(e.is_fragment());

        let e = TraversalError::StoreRejected {
            path: "/r/a/9.bin".into(),
            error: StoreError::PositionTooLarge { position: 9, limit: 8 },
        };
        assert!(e.is_fragment());

        let e = TraversalError::ReadDir(FileError::NotFound { path: "/r/a".into() });
        assert!(!e.is_fragment());
        assert_eq!(e.path(), std::path::Path::new("/r/a"));
    }
}
