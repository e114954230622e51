// crates/am_cli/src/args.rs
//
// Offline CLI argument surface: one local request file in, one canonical end
// result out. Network paths (any scheme://) are rejected before loading.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use clap::Parser;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "am",
    disable_help_subcommand = true,
    about = "Offline, deterministic recompute of election end results"
)]
pub struct Args {
    /// Calculation request JSON (settings + election end result).
    #[arg(long)]
    pub input: PathBuf,

    /// Write the canonical end result here and print its fingerprint.
    /// Without it the canonical JSON goes to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Load and validate the request only; do not recompute.
    #[arg(long)]
    pub validate_only: bool,

    /// Log warnings and errors only (RUST_LOG still wins).
    #[arg(long)]
    pub quiet: bool,
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Check already-parsed arguments: local paths only, the input must exist.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    ensure_local_path(&args.input)?;
    if let Some(out) = &args.out {
        ensure_local_path(out)?;
    }
    ensure_local_exists(&args.input, "--input")?;

    args.input = normalize_path(&args.input);
    args.out = args.out.take().map(|p| normalize_path(&p));
    Ok(args)
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if am_io::looks_like_url_strict(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Absolute path; falls back to joining onto the CWD when the file does not exist yet.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str, out: Option<&str>) -> Args {
        Args { input: input.into(), out: out.map(PathBuf::from), validate_only: false, quiet: false }
    }

    #[test]
    fn urls_are_rejected() {
        assert!(matches!(validate(args("https://x/req.json", None)), Err(CliError::NonLocalPath(_))));
        assert!(matches!(validate(args("file:///tmp/req.json", None)), Err(CliError::NonLocalPath(_))));
    }

    #[test]
    fn missing_input_is_reported() {
        let err = validate(args("does/not/exist.json", None)).unwrap_err();
        assert!(err.to_string().starts_with("file not found: --input"));
    }

    #[test]
    fn paths_are_made_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("req.json");
        fs::write(&input, b"{}").unwrap();
        let a = validate(args(input.to_str().unwrap(), Some("out/end.json"))).unwrap();
        assert!(a.input.is_absolute());
        assert!(a.out.unwrap().is_absolute());
    }
}
