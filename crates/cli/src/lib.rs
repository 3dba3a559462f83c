//! histiso CLI -- count structurally distinct transaction histories.

use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use derive_more::From;
use histiso_core::graph::builder::build;
use histiso_core::history::validate::validate;
use histiso_core::Statement;
use histiso_iso::{DedupEngine, ExportedGraph, IsomorphismOracle, OracleError, Outcome};
use histiso_parser::{decode_history, DecodeError, Policy};

/// Log file name looked for in each history directory.
pub const DEFAULT_FILE_NAME: &str = "output.log";

#[derive(Debug, Parser)]
#[command(
    name = "histiso",
    about = "Deduplicate transaction histories by conflict-graph isomorphism"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Count isomorphism classes of the histories under a directory
    Count(CountArgs),
    /// Print the conflict graph of one history
    Graph(GraphArgs),
    /// Check that a history is well formed
    Validate(ValidateArgs),
    /// Generate random well-formed histories
    Generate(GenerateArgs),
    /// Write one history as an Elle list-append history (EDN)
    Elle(ElleArgs),
}

#[derive(Debug, Parser)]
pub struct CountArgs {
    /// Directory searched recursively for history logs
    pub dir: PathBuf,
    /// Name of the log files to pick up
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    pub file_name: String,
    /// Process at most this many files (in path order)
    #[arg(long)]
    pub limit: Option<usize>,
    /// External solver used when the in-process matcher times out;
    /// without one the in-process matcher runs to completion instead
    #[arg(long)]
    pub solver: Option<PathBuf>,
    /// Solver thread count (`-t`)
    #[arg(long, default_value_t = 8)]
    pub solver_threads: u32,
    /// Solver strategy (`-a`)
    #[arg(long, default_value_t = 1)]
    pub solver_strategy: u32,
    /// Kill a solver process after this many seconds
    #[arg(long, value_parser = parse_seconds)]
    pub solver_timeout: Option<Duration>,
    /// Seconds the in-process matcher gets per comparison
    #[arg(long, value_parser = parse_seconds, default_value = "5")]
    pub deadline: Duration,
    /// Compare equal-sized graphs by subgraph isomorphism
    #[arg(long)]
    pub subgraph_shortcut: bool,
    /// Skip a history at its first malformed statement instead of skipping
    /// only that statement
    #[arg(long)]
    pub strict: bool,
    /// Skip histories that are not well formed
    #[arg(long)]
    pub validate: bool,
    /// Output one JSON object per history
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct GraphArgs {
    /// History log file
    pub file: PathBuf,
    /// Annotate the edge list with comment headers
    #[arg(long)]
    pub comments: bool,
    /// Print Graphviz DOT instead of the edge list
    #[arg(long, conflicts_with = "comments")]
    pub dot: bool,
    /// Abort on the first malformed statement instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// History log file
    pub file: PathBuf,
    /// Abort on the first malformed statement instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Parser)]
pub struct ElleArgs {
    /// History log file
    pub file: PathBuf,
    /// EDN file to write
    pub output: PathBuf,
    /// Abort on the first malformed statement instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Number of histories to generate
    #[arg(long)]
    pub n_hist: u64,
    /// Number of sessions
    #[arg(long)]
    pub n_session: u64,
    /// Number of objects
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub n_object: u64,
    /// Number of transactions per session
    #[arg(long)]
    pub n_txn: u64,
    /// Number of reads and writes per transaction
    #[arg(long)]
    pub n_op: u64,
    /// Output directory; history `i` goes to `<dir>/<i>/<file-name>`
    #[arg(long)]
    pub output_dir: PathBuf,
    /// Name of each generated log file
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    pub file_name: String,
}

/// Parses a non-negative, possibly fractional number of seconds.
///
/// # Errors
///
/// Returns a message if `value` is not a finite non-negative number.
pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("`{value}` is not a number of seconds: {e}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("`{value}`: {e}"))
}

/// Finds every file named `file_name` under `dir`, recursively, sorted by
/// path and truncated to `limit`.
///
/// # Errors
///
/// Returns the first error hit while reading a directory.
pub fn discover(dir: &Path, file_name: &str, limit: Option<usize>) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if entry.file_name() == file_name {
                found.push(path);
            }
        }
    }
    found.sort();
    if let Some(limit) = limit {
        found.truncate(limit);
    }
    Ok(found)
}

#[derive(Debug, From)]
pub enum LoadError {
    Io(io::Error),
    Decode(DecodeError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read: {err}"),
            Self::Decode(err) => write!(f, "cannot decode: {err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

/// Reads and decodes the history log at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read and
/// [`LoadError::Decode`] if `policy` rejects a statement.
pub fn load_history(path: &Path, policy: Policy) -> Result<Vec<Statement<String>>, LoadError> {
    let bytes = fs::read(path)?;
    Ok(decode_history(&bytes, policy)?)
}

/// What happened to one file during `count`.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Classified(Outcome),
    /// The history was not classified; the reason is for display.
    Skipped(String),
}

/// Loads the history at `path`, optionally validates it, and classifies its
/// conflict graph under the file's path as label.
///
/// A file that cannot be loaded or fails validation is skipped and leaves
/// `engine` untouched.
///
/// # Errors
///
/// Returns the oracle error that stopped classification.
pub fn classify_file<P, F>(
    engine: &mut DedupEngine<P, F>,
    path: &Path,
    policy: Policy,
    check: bool,
) -> Result<FileOutcome, OracleError>
where
    P: IsomorphismOracle,
    F: IsomorphismOracle,
{
    let statements = match load_history(path, policy) {
        Ok(statements) => statements,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "skipping history");
            return Ok(FileOutcome::Skipped(err.to_string()));
        }
    };

    if check {
        if let Err(err) = validate(&statements) {
            tracing::debug!(path = %path.display(), %err, "history is not well formed");
            return Ok(FileOutcome::Skipped(err.to_string()));
        }
    }

    let graph = ExportedGraph::new(&build(&statements));
    engine
        .classify(path.display().to_string(), graph)
        .map(FileOutcome::Classified)
}
