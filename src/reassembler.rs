//! Ordered write-out of a frozen fragment store
//!
//! Fragments are written in ascending position order with no separators.
//! Each buffer is released as soon as it has been written, so the output
//! never coexists with a second full copy of the data in memory.
//!
//! Gaps follow [`GapPolicy`]: `Fail` rejects the store before the output
//! file is created, `Skip` omits the missing positions and warns.

use crate::config::GapPolicy;
use crate::error::{AccessError, GapError, Result, WriteError};
use crate::fragment::FragmentStore;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Output buffer size
const WRITE_BUFFER_SIZE: usize = 1 << 20;

/// Outcome of a successful write-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub fragments_written: usize,
    pub bytes_written: u64,
    pub gaps_skipped: Vec<usize>,
}

/// Writes a store's fragments as one contiguous stream
#[derive(Debug, Clone, Copy, Default)]
pub struct Reassembler {
    policy: GapPolicy,
}

impl Reassembler {
    pub fn new(policy: GapPolicy) -> Self {
        Self { policy }
    }

    /// Create (or truncate) `path` and write the store into it.
    ///
    /// With `GapPolicy::Fail` a gapped store is rejected before the file
    /// is touched. A write failure leaves a truncated file behind.
    pub fn write_file(&self, store: FragmentStore, path: &Path) -> Result<WriteSummary> {
        self.check_gaps(&store)?;

        let file = File::create(path).map_err(|source| WriteError::CreateFailed {
            path: path.to_path_buf(),
            source,
        })?;

        self.write_drain(store, BufWriter::with_capacity(WRITE_BUFFER_SIZE, file))
    }

    /// Check that `path` could be created or truncated, without modifying it.
    ///
    /// Run before the walk so an unusable output fails fast. A failure
    /// that appears between this check and the write is still reported
    /// as `WriteError::CreateFailed`.
    pub fn check_output(path: &Path) -> std::result::Result<(), AccessError> {
        let unusable = |reason: String| AccessError::OutputUnusable {
            path: path.to_path_buf(),
            reason,
        };

        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => return Err(unusable("path is a directory".into())),
            Ok(_) => {
                // Existing file: opening for write without truncation proves access
                return OpenOptions::new()
                    .write(true)
                    .open(path)
                    .map(drop)
                    .map_err(|e| unusable(e.to_string()));
            }
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(unusable(e.to_string())),
            Err(_) => {}
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let meta = fs::metadata(parent).map_err(|e| {
            unusable(format!("parent directory '{}': {}", parent.display(), e))
        })?;

        if !meta.is_dir() {
            Err(unusable(format!("parent '{}' is not a directory", parent.display())))
        } else if meta.permissions().readonly() {
            Err(unusable(format!("parent directory '{}' is read-only", parent.display())))
        } else {
            debug!(path = %path.display(), "Output path usable");
            Ok(())
        }
    }

    /// Write the store into any writer
    pub fn write_to<W: Write>(&self, store: FragmentStore, writer: W) -> Result<WriteSummary> {
        self.check_gaps(&store)?;
        self.write_drain(store, writer)
    }

    fn check_gaps(&self, store: &FragmentStore) -> std::result::Result<(), GapError> {
        if self.policy != GapPolicy::Fail {
            return Ok(());
        }

        let missing = store.missing_positions();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GapError {
                missing,
                slots: store.len(),
            })
        }
    }

    fn write_drain<W: Write>(&self, store: FragmentStore, mut writer: W) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();

        for (position, data) in store.drain_ordered() {
            match data {
                Some(bytes) => {
                    writer
                        .write_all(&bytes)
                        .map_err(|source| WriteError::WriteFailed { position, source })?;
                    summary.fragments_written += 1;
                    summary.bytes_written += bytes.len() as u64;
                }
                None => {
                    warn!(position, "Gap in fragment sequence, skipping");
                    summary.gaps_skipped.push(position);
                }
            }
        }

        writer.flush().map_err(WriteError::FlushFailed)?;

        debug!(
            fragments = summary.fragments_written,
            bytes = summary.bytes_written,
            gaps = summary.gaps_skipped.len(),
            "Write-out finished"
        );

        Ok(summary)
    }
}
