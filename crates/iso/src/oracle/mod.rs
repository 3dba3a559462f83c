//! Isomorphism decision procedures behind one capability trait.
//!
//! Two backends implement [`IsomorphismOracle`]:
//!
//! - [`LibraryOracle`] -- petgraph's VF2 matcher, in process, cancellable.
//! - [`ExternalSolver`] -- a VF3-style solver executable fed edge-list files.
//!
//! The dedup engine only sees the trait, so either backend (or a test double)
//! can fill either tier.

use std::fmt::{Display, Formatter};
use std::process::ExitStatus;
use std::time::Duration;

use derive_more::From;

use crate::graph::ExportedGraph;
use crate::worker::CancelFlag;

pub mod external;
pub mod library;

pub use external::ExternalSolver;
pub use library::LibraryOracle;

/// Decides isomorphism questions over pairs of conflict graphs.
pub trait IsomorphismOracle: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if `a` and `b` are isomorphic.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Cancelled`] when `cancel` was raised before an
    /// answer was reached, or a backend-specific failure.
    fn are_isomorphic(
        &self,
        a: &ExportedGraph,
        b: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError>;

    /// Returns `true` if `small` is isomorphic to a subgraph of `big`.
    ///
    /// # Errors
    ///
    /// Same as [`are_isomorphic`](Self::are_isomorphic).
    fn has_subgraph_isomorphic(
        &self,
        small: &ExportedGraph,
        big: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError>;
}

impl<O> IsomorphismOracle for Box<O>
where
    O: IsomorphismOracle + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn are_isomorphic(
        &self,
        a: &ExportedGraph,
        b: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        (**self).are_isomorphic(a, b, cancel)
    }

    fn has_subgraph_isomorphic(
        &self,
        small: &ExportedGraph,
        big: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        (**self).has_subgraph_isomorphic(small, big, cancel)
    }
}

/// Failure of a single oracle invocation.
#[derive(Debug, From)]
pub enum OracleError {
    /// The comparison was cancelled before it produced an answer.
    Cancelled,
    /// Writing graph files or running the solver process failed.
    #[from]
    Io(std::io::Error),
    /// The solver process exited unsuccessfully.
    SolverProcessFailure { status: ExitStatus, stderr: String },
    /// The solver's stdout does not start with a solution count.
    SolverOutput { stdout: String },
    /// The solver exceeded its process timeout and was killed.
    SolverTimeout { timeout: Duration },
}

impl Display for OracleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "comparison cancelled"),
            Self::Io(err) => write!(f, "solver i/o failed: {err}"),
            Self::SolverProcessFailure { status, stderr } => {
                write!(f, "solver failed with {status}")?;
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
            Self::SolverOutput { stdout } => {
                write!(f, "unparsable solver output: {:?}", stdout.trim())
            }
            Self::SolverTimeout { timeout } => {
                write!(f, "solver killed after {timeout:?}")
            }
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Orders a pair by node count, then edge count, smaller first.
#[must_use]
pub fn by_size<'a>(
    a: &'a ExportedGraph,
    b: &'a ExportedGraph,
) -> (&'a ExportedGraph, &'a ExportedGraph) {
    if (a.node_count(), a.edge_count()) <= (b.node_count(), b.edge_count()) {
        (a, b)
    } else {
        (b, a)
    }
}
