//! Fragment source module
//!
//! The walker never touches the filesystem directly. It consumes two
//! capabilities through [`FragmentSource`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  FragmentSource                     │
//! │  - list_dir: immediate children, classified         │
//! │  - read_file: whole file in one pass (FileReader)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                     LocalFs                         │
//! │  - std::fs::read_dir / std::fs::read                │
//! │  - symlinks are not followed                        │
//! └─────────────────────────────────────────────────────┘
//! ```

mod local;
pub mod types;

pub use local::LocalFs;
pub use types::{DirEntry, EntryKind};

use crate::error::FileResult;
use std::path::Path;

/// Directory listing and whole-file reads, shared by all workers
pub trait FragmentSource: Send + Sync {
    /// List immediate children of `path`, excluding "." and ".."
    fn list_dir(&self, path: &Path) -> FileResult<Vec<DirEntry>>;

    /// Read the entire file. An empty file yields an empty buffer.
    fn read_file(&self, path: &Path) -> FileResult<Vec<u8>>;
}
