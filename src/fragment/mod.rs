//! Fragments: naming convention and the shared store

pub mod name;
pub mod store;

pub use name::{FragmentNaming, NameMatch, NAMING_VERSION, POSITION_LIMIT};
pub use store::{FragmentStore, OrderedDrain};
