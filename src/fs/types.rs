//! Directory entry types
//!
//! These types represent the children of one directory as seen by a
//! [`FragmentSource`](super::FragmentSource).

use std::path::PathBuf;

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symlink, device, pipe, socket or unknown
    Other,
}

impl EntryKind {
    /// Classify from a `std::fs::FileType` without following symlinks
    pub fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        *self == EntryKind::File
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryKind::Directory
    }
}

/// One immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name (last path component), lossily decoded
    pub name: String,

    /// Full path (parent joined with name)
    pub path: PathBuf,

    /// Entry classification
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create an entry under `parent`
    pub fn new(parent: &std::path::Path, name: impl Into<String>, kind: EntryKind) -> Self {
        let name = name.into();
        Self {
            path: parent.join(&name),
            name,
            kind,
        }
    }

    /// Check if this is "." or ".."
    pub fn is_special(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_dir_entry_path_join() {
        let entry = DirEntry::new(Path::new("/root/a"), "12.bin", EntryKind::File);
        assert_eq!(entry.path, Path::new("/root/a/12.bin"));
        assert!(entry.kind.is_file());
        assert!(!entry.kind.is_dir());
    }

    #[test]
    fn test_special_entries() {
        assert!(DirEntry::new(Path::new("/"), ".", EntryKind::Directory).is_special());
        assert!(DirEntry::new(Path::new("/"), "..", EntryKind::Directory).is_special());
        assert!(!DirEntry::new(Path::new("/"), "...", EntryKind::Directory).is_special());
    }
}
