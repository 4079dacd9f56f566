//! defrag - Parallel Fragment Reassembler
//!
//! Rebuilds a single file from numbered fragment files scattered across a
//! directory tree. A splitter wrote each slice of the original file as
//! `<position>.bin` somewhere below a root directory; defrag finds them
//! all, orders them by position and writes their concatenation.
//!
//! # Features
//!
//! - **Parallel Walk**: One worker thread per immediate subdirectory of
//!   the root, each descending its subtree sequentially.
//!
//! - **Isolated Failures**: An unreadable directory or fragment is logged,
//!   reported and skipped. Sibling subtrees are never affected.
//!
//! - **Explicit Policies**: Malformed fragment names are rejected instead
//!   of landing on position 0, and gaps in the sequence either abort the
//!   run or are skipped with a warning (`--gaps`).
//!
//! # Example
//!
//! ```no_run
//! let report = defrag::reconstruct("./dirs", "song.mp3").unwrap();
//! println!("{} fragments, {} bytes", report.fragments_written, report.bytes_written);
//! for skipped in &report.skipped {
//!     eprintln!("{}", skipped);
//! }
//! ```
//!
//! ```bash
//! defrag ./dirs song.mp3
//! defrag ./dirs song.mp3 --gaps skip -v
//! ```

pub mod config;
pub mod error;
pub mod fragment;
pub mod fs;
pub mod progress;
pub mod reassembler;
pub mod walker;

pub use config::{CliArgs, DefragConfig, GapPolicy};
pub use error::{DefragError, Result, TraversalError};
pub use fragment::{FragmentNaming, FragmentStore};
pub use reassembler::{Reassembler, WriteSummary};
pub use walker::{ReassemblyCoordinator, ReassemblyReport, WalkProgress};

use std::path::Path;

/// Rebuild `output_file` from the fragments under `root_directory` using
/// the default naming rules and failing on gaps.
pub fn reconstruct(root_directory: impl AsRef<Path>, output_file: impl AsRef<Path>) -> Result<ReassemblyReport> {
    let config = DefragConfig::new(root_directory.as_ref(), output_file.as_ref());
    ReassemblyCoordinator::new(config).run()
}
