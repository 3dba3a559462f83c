//! Isomorphism-based deduplication of conflict graphs.
//!
//! The pipeline for one history is: build a
//! [`ConflictGraph`](histiso_core::ConflictGraph), wrap it as an
//! [`ExportedGraph`], and hand it to a [`DedupEngine`], which compares it
//! against the representatives collected so far.
//!
//! ```
//! use histiso_core::{build, Statement};
//! use histiso_iso::{DedupConfig, DedupEngine, ExportedGraph, LibraryOracle};
//!
//! let history = [
//!     Statement::begin(1),
//!     Statement::write(1, "x"),
//!     Statement::commit(1),
//!     Statement::begin(2),
//!     Statement::read(2, "x"),
//!     Statement::commit(2),
//! ];
//! let graph = ExportedGraph::new(&build(&history));
//!
//! let mut engine = DedupEngine::new(LibraryOracle, LibraryOracle, DedupConfig::default());
//! assert!(engine.classify("first", graph.clone()).unwrap().classification.is_novel());
//! assert!(!engine.classify("again", graph).unwrap().classification.is_novel());
//! assert_eq!(engine.distinct_count(), 1);
//! ```

pub mod dedup;
pub mod graph;
pub mod oracle;
pub mod worker;

pub use dedup::{
    Classification, Comparison, DedupConfig, DedupEngine, Outcome, Record, Representative,
    TierStats, DEFAULT_DEADLINE,
};
pub use graph::ExportedGraph;
pub use oracle::{ExternalSolver, IsomorphismOracle, LibraryOracle, OracleError};
pub use worker::{run_bounded, Bounded, CancelFlag};
