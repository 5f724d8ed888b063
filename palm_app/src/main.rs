use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error, info};

mod config;
mod error;
mod trace;

use config::Config;
use error::{AppError, Result};

/// Replay SPI traces against the emulated touchscreen controller
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Trace file to replay
    trace: PathBuf,

    /// INI file with the initial input and peripheral settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every SPI exchange
    #[arg(long)]
    verbose: bool,

    /// Write the fixed layout savestate to this file once the trace is done
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Write a flexbuffers snapshot of the machine to this file once the trace is done
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match replay(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(mismatches) => {
            error!("{} expectation(s) failed", mismatches);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns the number of failed expectations
fn replay(args: &Args) -> Result<usize> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let text = fs::read_to_string(&args.trace).map_err(|source| AppError::Io {
        path: args.trace.clone(),
        source,
    })?;

    let commands = trace::parse(&text)?;

    info!(
        "Replaying {} commands from {}",
        commands.len(),
        args.trace.display()
    );

    let mut palm = config.machine();

    let report = trace::run(&mut palm, &commands)?;

    if let Some(path) = &args.save_state {
        let mut buf = vec![0; palm.state_size()];
        palm.save_state(&mut buf)?;

        write_file(path, &buf)?;
        info!("Savestate written to {}", path.display());
    }

    if let Some(path) = &args.snapshot {
        let snapshot = palm.serialize_snapshot()?;

        write_file(path, &snapshot)?;
        info!("Snapshot written to {}", path.display());
    }

    Ok(report.mismatches)
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}
