//! Configuration types for defrag
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - The gap policy applied at reassembly time

use crate::error::ConfigError;
use crate::fragment::name::{FragmentNaming, DEFAULT_MARKER, DEFAULT_MAX_POSITION, POSITION_LIMIT};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output extension required unless `--any-ext` is given
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp3";

/// Reassemble a file from numbered fragments scattered across a directory tree
#[derive(Parser, Debug, Clone)]
#[command(
    name = "defrag",
    version,
    about = "Reassemble a file from numbered fragments scattered across a directory tree",
    long_about = "Walks every subdirectory of ROOT_DIR in parallel, collects files whose name \
                  contains the fragment marker, orders them by the number at the start of \
                  their name and writes their concatenation to OUTPUT_FILE.\n\n\
                  Exit codes: 0 success, 1 internal error, 2 invalid arguments, \
                  3 unreadable root, 4 fragments skipped, 5 output failed, 6 gap in sequence.",
    after_help = "EXAMPLES:\n    \
        defrag ./dirs song.mp3\n    \
        defrag ./dirs song.mp3 --gaps skip\n    \
        defrag ./dirs image.raw --any-ext --marker .frag"
)]
pub struct CliArgs {
    /// Directory tree holding the fragments
    #[arg(value_name = "ROOT_DIR")]
    pub root: PathBuf,

    /// File to write the reassembled bytes to
    #[arg(value_name = "OUTPUT_FILE")]
    pub output: PathBuf,

    /// What to do when a position in the sequence has no fragment
    #[arg(long, value_enum, default_value_t = GapPolicy::Fail)]
    pub gaps: GapPolicy,

    /// Substring a file name must contain to count as a fragment
    #[arg(long, default_value = DEFAULT_MARKER, value_name = "STR")]
    pub marker: String,

    /// Required extension of the output file
    #[arg(long = "ext", default_value = DEFAULT_OUTPUT_EXTENSION, value_name = "EXT")]
    pub output_ext: String,

    /// Accept any output file extension
    #[arg(long, conflicts_with = "output_ext")]
    pub any_ext: bool,

    /// Highest fragment position accepted (at most 2^31)
    #[arg(long, default_value_t = DEFAULT_MAX_POSITION, value_name = "NUM")]
    pub max_position: usize,

    /// Quiet mode - suppress progress and summary output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Handling of positions that never received a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GapPolicy {
    /// Abort before writing any output
    #[default]
    Fail,
    /// Omit the missing positions and warn
    Skip,
}

/// Runtime configuration (validated from CLI args)
#[derive(Debug, Clone)]
pub struct DefragConfig {
    /// Root of the fragment tree
    pub root: PathBuf,

    /// Output file
    pub output_path: PathBuf,

    /// Gap handling at reassembly time
    pub gap_policy: GapPolicy,

    /// Fragment naming rules
    pub naming: FragmentNaming,

    /// Show progress and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl DefragConfig {
    /// Library defaults: `.bin` marker, failing on gaps, no progress display
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_path: output.into(),
            gap_policy: GapPolicy::default(),
            naming: FragmentNaming::default(),
            show_progress: false,
            verbose: false,
        }
    }

    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    pub fn with_naming(mut self, naming: FragmentNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Create validated config from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }

        if args.marker.is_empty() {
            return Err(ConfigError::InvalidMarker);
        }

        if args.max_position > POSITION_LIMIT {
            return Err(ConfigError::MaxPositionTooLarge {
                value: args.max_position,
                limit: POSITION_LIMIT,
            });
        }

        if !args.any_ext {
            validate_extension(&args.output, &args.output_ext)?;
        }

        // Validate output path
        if let Some(parent) = args.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidOutputPath {
                    path: args.output.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }
        if args.output.is_dir() {
            return Err(ConfigError::InvalidOutputPath {
                path: args.output.clone(),
                reason: "Path is a directory".into(),
            });
        }

        Ok(Self {
            root: args.root,
            output_path: args.output,
            gap_policy: args.gaps,
            naming: FragmentNaming::new(args.marker, args.max_position),
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

/// Check that `path` ends in `.{expected}` (case-insensitive, leading dot optional)
fn validate_extension(path: &std::path::Path, expected: &str) -> Result<(), ConfigError> {
    let expected = expected.trim_start_matches('.');
    let matches = path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(expected))
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(ConfigError::InvalidOutputExtension {
            path: path.to_path_buf(),
            expected: expected.to_string(),
        })
    }
}
