//! Local filesystem source backed by `std::fs`

use super::types::{DirEntry, EntryKind};
use super::FragmentSource;
use crate::error::{FileError, FileResult};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{trace, warn};

/// Reads directories and fragments from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentSource for LocalFs {
    fn list_dir(&self, path: &Path) -> FileResult<Vec<DirEntry>> {
        let iter = fs::read_dir(path).map_err(|e| FileError::from_io(path, &e))?;

        let mut entries = Vec::new();
        for item in readable_entries(path, iter) {
            // An entry that vanished or cannot be stat'ed is classified as
            // Other and skipped by the walker, not treated as a listing failure.
            let kind = match item.file_type() {
                Ok(ft) => EntryKind::from_file_type(ft),
                Err(e) => {
                    trace!(path = %item.path().display(), error = %e, "file_type failed");
                    EntryKind::Other
                }
            };

            entries.push(DirEntry {
                name: item.file_name().to_string_lossy().into_owned(),
                path: item.path(),
                kind,
            });
        }

        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> FileResult<Vec<u8>> {
        fs::read(path).map_err(|e| FileError::from_io(path, &e))
    }
}

/// Drop items the directory iterator failed to produce, logging each one
fn readable_entries<'a, T: 'a>(
    dir: &'a Path,
    items: impl Iterator<Item = io::Result<T>> + 'a,
) -> impl Iterator<Item = T> + 'a {
    items.filter_map(move |item| match item {
        Ok(item) => Some(item),
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Skipping unreadable directory entry");
            None
        }
    })
}
