//! Fragment file naming convention
//!
//! A regular file is a fragment when its name contains the marker
//! substring (`.bin` by default). Its position is the run of ASCII
//! digits at the very start of the name:
//!
//! | name          | result                         |
//! |---------------|--------------------------------|
//! | `12.bin`      | position 12                    |
//! | `007.bin`     | position 7                     |
//! | `abc.bin`     | rejected, no leading digits    |
//! | `part7.bin`   | rejected, no leading digits    |
//! | `12.txt`      | not a fragment                 |
//!
//! Names without leading digits are rejected rather than defaulting to
//! position 0, so a malformed name can never overwrite fragment 0.
//! Bump [`NAMING_VERSION`] whenever these rules change.

use regex::Regex;
use std::sync::LazyLock;

/// Version of the naming rules below
pub const NAMING_VERSION: u32 = 1;

/// Default marker substring
pub const DEFAULT_MARKER: &str = ".bin";

/// Default ceiling on accepted positions
pub const DEFAULT_MAX_POSITION: usize = 1 << 20;

/// Hard ceiling; no configured maximum may exceed it
pub const POSITION_LIMIT: usize = 1 << 31;

static POSITION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+").expect("Invalid position regex"));

/// Result of matching a file name against the convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Not a fragment file; ignore silently
    NotFragment,
    /// Fragment at this position
    Position(usize),
    /// Looks like a fragment but has no usable leading number
    Invalid,
    /// Valid number above the configured ceiling
    OutOfRange(usize),
}

/// Naming rules applied to every regular file the walker sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNaming {
    marker: String,
    max_position: usize,
}

impl Default for FragmentNaming {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, DEFAULT_MAX_POSITION)
    }
}

impl FragmentNaming {
    /// `max_position` is clamped to [`POSITION_LIMIT`]
    pub fn new(marker: impl Into<String>, max_position: usize) -> Self {
        Self {
            marker: marker.into(),
            max_position: max_position.min(POSITION_LIMIT),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn max_position(&self) -> usize {
        self.max_position
    }

    /// Classify a file name
    pub fn classify(&self, name: &str) -> NameMatch {
        if !name.contains(self.marker.as_str()) {
            return NameMatch::NotFragment;
        }

        let Some(digits) = POSITION_REGEX.find(name) else {
            return NameMatch::Invalid;
        };

        // Overflow lands here too
        match digits.as_str().parse::<usize>() {
            Ok(p) if p > self.max_position => NameMatch::OutOfRange(p),
            Ok(p) => NameMatch::Position(p),
            Err(_) => NameMatch::Invalid,
        }
    }
}
