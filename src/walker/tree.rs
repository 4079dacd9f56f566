//! Recursive subtree walker
//!
//! One `TreeWalker` runs per worker thread. It descends its subtree
//! sequentially, reads every qualifying fragment and inserts it into the
//! shared store. Failures are isolated per directory and per file: they
//! are logged, counted and reported, and the walk moves on.

use crate::error::TraversalError;
use crate::fragment::{FragmentNaming, FragmentStore, NameMatch};
use crate::fs::{DirEntry, FragmentSource};
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Counters shared by all workers of one run
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Directories listed
    pub dirs: AtomicU64,

    /// Fragments inserted into the store
    pub fragments: AtomicU64,

    /// Bytes inserted into the store
    pub bytes: AtomicU64,

    /// Fragments or directories skipped
    pub skipped: AtomicU64,

    /// Inserts that replaced an existing fragment
    pub duplicates: AtomicU64,
}

impl WalkStats {
    fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fragment(&self, bytes: u64) {
        self.fragments.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sequential walker for one subtree
pub struct TreeWalker<'a, S: FragmentSource + ?Sized> {
    id: usize,
    source: &'a S,
    naming: &'a FragmentNaming,
    store: &'a FragmentStore,
    stats: &'a WalkStats,
    skipped_tx: Sender<TraversalError>,
}

impl<'a, S: FragmentSource + ?Sized> TreeWalker<'a, S> {
    pub fn new(
        id: usize,
        source: &'a S,
        naming: &'a FragmentNaming,
        store: &'a FragmentStore,
        stats: &'a WalkStats,
        skipped_tx: Sender<TraversalError>,
    ) -> Self {
        Self {
            id,
            source,
            naming,
            store,
            stats,
            skipped_tx,
        }
    }

    /// Walk `dir` and everything below it
    pub fn walk(&self, dir: &Path) {
        let entries = match self.source.list_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(worker = self.id, path = %dir.display(), error = %e, "Directory skipped");
                self.skip(TraversalError::ReadDir(e));
                return;
            }
        };

        self.stats.record_dir();
        trace!(worker = self.id, path = %dir.display(), entries = entries.len(), "Directory listed");

        for entry in entries {
            if entry.is_special() {
                continue;
            }

            if entry.kind.is_dir() {
                self.walk(&entry.path);
            } else if entry.kind.is_file() {
                self.ingest(&entry);
            } else {
                trace!(worker = self.id, path = %entry.path.display(), "Not a regular file");
            }
        }
    }

    /// Read one file and insert it if it is a fragment
    pub fn ingest(&self, entry: &DirEntry) {
        let position = match self.naming.classify(&entry.name) {
            NameMatch::NotFragment => return,
            NameMatch::Position(p) => p,
            NameMatch::Invalid => {
                warn!(worker = self.id, path = %entry.path.display(), "Fragment name has no leading position");
                self.skip(TraversalError::InvalidName {
                    path: entry.path.clone(),
                });
                return;
            }
            NameMatch::OutOfRange(p) => {
                warn!(
                    worker = self.id,
                    path = %entry.path.display(),
                    position = p,
                    max = self.naming.max_position(),
                    "Fragment position out of range"
                );
                self.skip(TraversalError::PositionOutOfRange {
                    path: entry.path.clone(),
                    position: p,
                    max: self.naming.max_position(),
                });
                return;
            }
        };

        let data = match self.source.read_file(&entry.path) {
            Ok(data) => data,
            Err(e) => {
                if e.is_unexpected() {
                    warn!(worker = self.id, path = %entry.path.display(), error = %e, "Fragment read failed");
                } else {
                    // Missing or forbidden files are routine on a live tree
                    debug!(worker = self.id, path = %entry.path.display(), error = %e, "Fragment unreadable");
                }
                self.skip(TraversalError::ReadFile(e));
                return;
            }
        };

        let len = data.len() as u64;
        match self.store.insert(position, data) {
            Ok(None) => {}
            Ok(Some(_)) => {
                self.stats.record_duplicate();
                warn!(
                    worker = self.id,
                    position,
                    path = %entry.path.display(),
                    "Duplicate position, replacing earlier fragment"
                );
            }
            Err(error) => {
                warn!(worker = self.id, path = %entry.path.display(), error = %error, "Fragment refused by store");
                self.skip(TraversalError::StoreRejected {
                    path: entry.path.clone(),
                    error,
                });
                return;
            }
        }
        self.stats.record_fragment(len);
        trace!(worker = self.id, position, bytes = len, "Fragment stored");
    }

    fn skip(&self, err: TraversalError) {
        self.stats.record_skip();
        // Receiver outlives every walker; a closed channel only loses the report
        let _ = self.skipped_tx.send(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use crate::fs::LocalFs;
    use crossbeam_channel::unbounded;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_walks_nested_directories() {
        let dir = tempdir().unwrap();
        let deep = dir.path().join("a/b/c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(dir.path().join("a/0.bin"), b"zero").unwrap();
        fs::write(deep.join("1.bin"), b"one").unwrap();
        fs::write(deep.join("notes.txt"), b"ignored").unwrap();

        let store = FragmentStore::new();
        let stats = WalkStats::default();
        let naming = FragmentNaming::default();
        let (tx, rx) = unbounded();

        TreeWalker::new(0, &LocalFs, &naming, &store, &stats, tx).walk(&dir.path().join("a"));

        assert_eq!(store.get(0), Some(b"zero".to_vec()));
        assert_eq!(store.get(1), Some(b"one".to_vec()));
        assert_eq!(store.len(), 2);
        assert_eq!(stats.dirs.load(Ordering::Relaxed), 3);
        assert_eq!(stats.fragments.load(Ordering::Relaxed), 2);
        assert_eq!(stats.bytes.load(Ordering::Relaxed), 7);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_directory_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new();
        let stats = WalkStats::default();
        let naming = FragmentNaming::default();
        let (tx, rx) = unbounded();

        let missing = dir.path().join("gone");
        TreeWalker::new(0, &LocalFs, &naming, &store, &stats, tx).walk(&missing);

        assert_eq!(
            rx.try_recv().unwrap(),
            TraversalError::ReadDir(FileError::NotFound { path: missing })
        );
        assert_eq!(stats.skipped.load(Ordering::Relaxed), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_name_does_not_claim_position_zero() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("0.bin"), b"real zero").unwrap();
        fs::write(dir.path().join("junk.bin"), b"junk").unwrap();

        let store = FragmentStore::new();
        let stats = WalkStats::default();
        let naming = FragmentNaming::default();
        let (tx, rx) = unbounded();

        TreeWalker::new(0, &LocalFs, &naming, &store, &stats, tx).walk(dir.path());

        assert_eq!(store.get(0), Some(b"real zero".to_vec()));
        assert_eq!(stats.duplicates.load(Ordering::Relaxed), 0);
        assert!(matches!(rx.try_recv().unwrap(), TraversalError::InvalidName { .. }));
    }

    #[test]
    fn test_duplicate_position_counted() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("5.bin"), b"a").unwrap();
        fs::write(dir.path().join("x/5.bin"), b"b").unwrap();

        let store = FragmentStore::new();
        let stats = WalkStats::default();
        let naming = FragmentNaming::default();
        let (tx, _rx) = unbounded();

        TreeWalker::new(0, &LocalFs, &naming, &store, &stats, tx).walk(dir.path());

        assert_eq!(stats.duplicates.load(Ordering::Relaxed), 1);
        assert_eq!(store.fragment_count(), 1);
        let held = store.get(5).unwrap();
        assert!(held == b"a" || held == b"b");
    }
}
