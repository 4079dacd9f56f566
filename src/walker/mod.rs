//! Parallel fragment walker
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │  ReassemblyCoordinator  │
//!                     │  - lists ROOT_DIR       │
//!                     │  - ingests root files   │
//!                     └───────────┬─────────────┘
//!                                 │ one thread per subdirectory
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │ walker-0  │             │ walker-1  │             │ walker-N  │
//! │ recursive │             │ recursive │             │ recursive │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │     FragmentStore       │
//!                     │  (one mutex, sparse)    │
//!                     └───────────┬─────────────┘
//!                                 │ join barrier
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │      Reassembler        │
//!                     └─────────────────────────┘
//! ```

pub mod coordinator;
pub mod tree;

pub use coordinator::{CollectedFragments, ReassemblyCoordinator, ReassemblyReport, WalkProgress};
pub use tree::{TreeWalker, WalkStats};
