// crates/am_cli/src/main.rs
//
// Exit codes, typed error mapping, logging setup, the validate-only
// short-circuit and the full run path (load → recompute → canonical write).

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Bad flags, malformed or inconsistent request, counting results that do not add up.
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 4;
    /// Settings that do not fit the election, or an engine invariant failed.
    pub const ENGINE: i32 = 5;
}

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use am_io::canonical_json::{to_canonical_bytes, write_canonical_file};
use am_io::hasher::result_id_from_canonical;
use am_io::loader;
use am_pipeline::PipelineError;

use args::Args;

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    Validation(String),
    Io(String),
    Engine(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Engine(m) => write!(f, "engine: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let raw = Args::parse();
    init_tracing(raw.quiet);

    let args = match args::validate(raw) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("am: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match outcome {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("am: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// Default `info` (`warn` with `--quiet`); `RUST_LOG` overrides either.
fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_only(args: &Args) -> Result<(), MainError> {
    let req = loader::load_request(&args.input).map_err(map_io_err)?;
    info!(
        canton = req.settings.canton.as_str(),
        algorithm = ?req.settings.proportional_election_mandate_algorithm,
        "validate-only: request OK"
    );
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let req = loader::load_request(&args.input).map_err(map_io_err)?;
    let end_result = am_pipeline::recalculate(req).map_err(map_pipeline_err)?;
    if end_result.lot_decision_required() {
        warn!("end result is provisional: a lot decision is required");
    }

    let result_id = result_id_from_canonical(&end_result).map_err(|e| MainError::Io(format!("hash: {e}")))?;
    match &args.out {
        Some(path) => {
            write_canonical_file(path, &end_result).map_err(map_io_err)?;
            info!(path = %path.display(), %result_id, "end result written");
            println!("{result_id}");
        }
        None => {
            let bytes = to_canonical_bytes(&end_result).map_err(map_io_err)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(|e| MainError::Io(format!("stdout: {e}")))?;
            info!(%result_id, "end result printed");
        }
    }
    Ok(())
}

fn map_error(e: &MainError) -> i32 {
    match e {
        MainError::Validation(_) => exitcodes::VALIDATION,
        MainError::Io(_) => exitcodes::IO,
        MainError::Engine(_) => exitcodes::ENGINE,
    }
}

fn map_io_err(e: am_io::IoError) -> MainError {
    use am_io::IoError::*;
    match e {
        Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        Invalid(m) => MainError::Validation(m),
        Path(m) => MainError::Io(format!("path: {m}")),
        Hash(m) => MainError::Io(format!("hash: {m}")),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Validation(m) | Aggregate(m) => MainError::Validation(m),
        Io(m) => MainError::Io(m),
        Configuration(m) | Invariant(m) => MainError::Engine(m),
    }
}
