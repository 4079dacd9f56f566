//! defrag - Parallel Fragment Reassembler
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use defrag::config::{CliArgs, DefragConfig};
use defrag::error::{exit_code, DefragError};
use defrag::progress::{print_header, print_summary, ProgressReporter};
use defrag::walker::ReassemblyCoordinator;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);

            let code = e
                .downcast_ref::<DefragError>()
                .map(DefragError::exit_code)
                .unwrap_or(exit_code::INTERNAL);
            ExitCode::from(code)
        }
    }
}

fn run() -> Result<u8> {
    // Parse CLI arguments (clap exits with code 2 on usage errors)
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = DefragConfig::from_args(args)
        .map_err(DefragError::from)
        .context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.root.display().to_string(),
            &config.output_path.display().to_string(),
            config.gap_policy,
        );
    }

    let output = config.output_path.display().to_string();
    let show_progress = config.show_progress;
    let coordinator = ReassemblyCoordinator::new(config);

    let report = if show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Walking fragment tree...");

        let result = coordinator.run_with_progress(|p| progress.update(&p));
        match &result {
            Ok(_) => progress.finish("Reassembly finished"),
            Err(_) => progress.finish_and_clear(),
        }
        result.context("Reassembly failed")?
    } else {
        coordinator.run().context("Reassembly failed")?
    };

    if show_progress {
        print_summary(&report, &output);
    }

    if report.is_clean() {
        info!(bytes = report.bytes_written, "Reassembly completed");
        Ok(exit_code::SUCCESS)
    } else {
        warn!(
            skipped = report.skipped.len(),
            skipped_fragments = report.skipped_fragments(),
            gaps = report.gaps_skipped.len(),
            "Reassembly completed with skipped input"
        );
        Ok(exit_code::FRAGMENTS_SKIPPED)
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("defrag=debug,warn")
    } else {
        EnvFilter::new("defrag=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
