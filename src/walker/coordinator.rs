//! Reassembly coordinator - orchestrates the parallel walk and the write-out
//!
//! The coordinator is responsible for:
//! - Listing the root and launching one worker per immediate subdirectory
//! - Ingesting fragments that sit directly in the root
//! - Waiting for every worker before anything is written (join barrier)
//! - Collecting skipped fragments and directories into the report
//! - Handing the frozen store to the reassembler

use crate::config::DefragConfig;
use crate::error::{AccessError, Result, TraversalError};
use crate::fragment::FragmentStore;
use crate::fs::{DirEntry, EntryKind, FragmentSource, LocalFs};
use crate::reassembler::Reassembler;
use crate::walker::tree::{TreeWalker, WalkStats};
use crossbeam_channel::{unbounded, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Interval between progress callbacks
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct WalkProgress {
    pub dirs: u64,
    pub fragments: u64,
    pub bytes: u64,
    pub skipped: u64,
    pub workers: usize,
    pub elapsed: Duration,
}

impl WalkProgress {
    fn snapshot(stats: &WalkStats, workers: usize, elapsed: Duration) -> Self {
        Self {
            dirs: stats.dirs.load(Ordering::Relaxed),
            fragments: stats.fragments.load(Ordering::Relaxed),
            bytes: stats.bytes.load(Ordering::Relaxed),
            skipped: stats.skipped.load(Ordering::Relaxed),
            workers,
            elapsed,
        }
    }

    pub fn fragments_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.fragments as f64 / secs
        } else {
            0.0
        }
    }
}

/// Result of a completed reconstruction
#[derive(Debug, Clone, Default)]
pub struct ReassemblyReport {
    /// Worker threads launched (one per root subdirectory)
    pub workers: usize,

    /// Directories listed
    pub dirs: u64,

    /// Fragments inserted (duplicates included)
    pub fragments_found: u64,

    /// Slot count of the store (highest position + 1)
    pub slots: usize,

    /// Fragments written to the output
    pub fragments_written: usize,

    /// Bytes written to the output
    pub bytes_written: u64,

    /// Inserts that replaced an earlier fragment at the same position
    pub duplicates: u64,

    /// Fragments and directories that were skipped, sorted by path
    pub skipped: Vec<TraversalError>,

    /// Positions omitted from the output (gap policy `skip` only)
    pub gaps_skipped: Vec<usize>,

    /// Wall time of the whole run
    pub duration: Duration,
}

impl ReassemblyReport {
    /// True when nothing was skipped and no gap was omitted
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.gaps_skipped.is_empty()
    }

    /// Number of individual fragment files that were skipped
    pub fn skipped_fragments(&self) -> usize {
        self.skipped.iter().filter(|e| e.is_fragment()).count()
    }
}

/// Store contents and traversal outcome after the join barrier
#[derive(Debug)]
pub struct CollectedFragments {
    pub store: FragmentStore,
    pub workers: usize,
    pub skipped: Vec<TraversalError>,
}

/// Coordinates the parallel walk and the ordered write-out
pub struct ReassemblyCoordinator<S: FragmentSource = LocalFs> {
    config: DefragConfig,
    source: S,
}

impl ReassemblyCoordinator<LocalFs> {
    /// Create a coordinator reading from the local filesystem
    pub fn new(config: DefragConfig) -> Self {
        Self::with_source(config, LocalFs::new())
    }
}

impl<S: FragmentSource> ReassemblyCoordinator<S> {
    /// Create a coordinator over any fragment source
    pub fn with_source(config: DefragConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &DefragConfig {
        &self.config
    }

    /// Walk the tree and write the output
    pub fn run(&self) -> Result<ReassemblyReport> {
        self.run_inner(None)
    }

    /// Like [`run`](Self::run), calling `progress_callback` periodically during the walk
    pub fn run_with_progress<F>(&self, progress_callback: F) -> Result<ReassemblyReport>
    where
        F: Fn(WalkProgress) + Sync,
    {
        self.run_inner(Some(&progress_callback))
    }

    fn run_inner(&self, progress: Option<&(dyn Fn(WalkProgress) + Sync)>) -> Result<ReassemblyReport> {
        let start = Instant::now();
        let stats = WalkStats::default();

        Reassembler::check_output(&self.config.output_path)?;

        info!(root = %self.config.root.display(), "Collecting fragments");
        let collected = self.collect_with(&stats, progress)?;

        let slots = collected.store.len();
        info!(
            fragments = collected.store.fragment_count(),
            slots,
            skipped = collected.skipped.len(),
            "Walk complete, writing output"
        );

        let summary = Reassembler::new(self.config.gap_policy)
            .write_file(collected.store, &self.config.output_path)?;

        let report = ReassemblyReport {
            workers: collected.workers,
            dirs: stats.dirs.load(Ordering::Relaxed),
            fragments_found: stats.fragments.load(Ordering::Relaxed),
            slots,
            fragments_written: summary.fragments_written,
            bytes_written: summary.bytes_written,
            duplicates: stats.duplicates.load(Ordering::Relaxed),
            skipped: collected.skipped,
            gaps_skipped: summary.gaps_skipped,
            duration: start.elapsed(),
        };

        info!(
            fragments = report.fragments_written,
            bytes = report.bytes_written,
            output = %self.config.output_path.display(),
            "Output written"
        );

        Ok(report)
    }

    /// Walk phase only: fill a store from the tree and return it frozen
    pub fn collect(&self) -> Result<CollectedFragments> {
        self.collect_with(&WalkStats::default(), None)
    }

    fn collect_with(
        &self,
        stats: &WalkStats,
        progress: Option<&(dyn Fn(WalkProgress) + Sync)>,
    ) -> Result<CollectedFragments> {
        let start = Instant::now();
        let root = &self.config.root;

        let entries = self.source.list_dir(root).map_err(|e| {
            if root.is_file() {
                AccessError::NotADirectory { path: root.clone() }
            } else {
                AccessError::RootUnreadable(e)
            }
        })?;

        let (subdirs, root_files): (Vec<DirEntry>, Vec<DirEntry>) = entries
            .into_iter()
            .filter(|e| !e.is_special() && e.kind != EntryKind::Other)
            .partition(|e| e.kind.is_dir());

        let workers = subdirs.len();
        info!(workers, root_files = root_files.len(), "Launching walkers");

        let store = FragmentStore::new();
        let (skipped_tx, skipped_rx) = unbounded::<TraversalError>();
        let naming = &self.config.naming;
        let source = &self.source;
        let walk_done = AtomicBool::new(false);

        thread::scope(|s| {
            let _done = WalkDone(&walk_done);

            if let Some(callback) = progress {
                let walk_done = &walk_done;
                let spawned = thread::Builder::new()
                    .name("progress".to_string())
                    .spawn_scoped(s, move || {
                        while !walk_done.load(Ordering::Acquire) {
                            callback(WalkProgress::snapshot(stats, workers, start.elapsed()));
                            thread::sleep(PROGRESS_INTERVAL);
                        }
                        callback(WalkProgress::snapshot(stats, workers, start.elapsed()));
                    });
                if let Err(e) = spawned {
                    warn!(error = %e, "Failed to spawn progress thread");
                }
            }

            let mut handles: Vec<(PathBuf, thread::ScopedJoinHandle<'_, ()>)> = Vec::new();

            for (id, dir) in subdirs.iter().enumerate() {
                let walker = TreeWalker::new(id, source, naming, &store, stats, skipped_tx.clone());
                let path = dir.path.clone();

                let spawned = thread::Builder::new()
                    .name(format!("walker-{}", id))
                    .spawn_scoped(s, move || {
                        debug!(worker = id, path = %path.display(), "Worker started");
                        walker.walk(&path);
                        debug!(worker = id, "Worker finished");
                    });

                match spawned {
                    Ok(handle) => handles.push((dir.path.clone(), handle)),
                    Err(e) => {
                        // Out of threads: walk this subtree on the coordinator thread
                        warn!(worker = id, error = %e, "Failed to spawn worker, walking inline");
                        TreeWalker::new(id, source, naming, &store, stats, skipped_tx.clone())
                            .walk(&dir.path);
                    }
                }
            }

            // Fragments directly under the root are handled here while workers run
            let root_walker = TreeWalker::new(workers, source, naming, &store, stats, skipped_tx.clone());
            let ingested = panic::catch_unwind(AssertUnwindSafe(|| {
                for entry in &root_files {
                    root_walker.ingest(entry);
                }
            }));
            drop(root_walker);
            if let Err(payload) = ingested {
                record_panic(stats, &skipped_tx, root.clone(), payload.as_ref());
            }

            for (path, handle) in handles {
                if let Err(payload) = handle.join() {
                    record_panic(stats, &skipped_tx, path, payload.as_ref());
                }
            }
        });

        drop(skipped_tx);
        let mut skipped: Vec<TraversalError> = skipped_rx.try_iter().collect();
        skipped.sort_by(|a, b| a.path().cmp(b.path()));

        if !skipped.is_empty() {
            warn!(count = skipped.len(), "Some fragments or directories were skipped");
        }

        Ok(CollectedFragments {
            store,
            workers,
            skipped,
        })
    }
}

/// Raises the walk-done flag on drop, unwinding included, so the
/// progress thread always stops before the scope joins it
struct WalkDone<'a>(&'a AtomicBool);

impl Drop for WalkDone<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn record_panic(
    stats: &WalkStats,
    skipped_tx: &Sender<TraversalError>,
    path: PathBuf,
    payload: &(dyn Any + Send),
) {
    let message = panic_message(payload);
    error!(path = %path.display(), message = %message, "Worker panicked");
    stats.skipped.fetch_add(1, Ordering::Relaxed);
    let _ = skipped_tx.send(TraversalError::WorkerPanicked { path, message });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
