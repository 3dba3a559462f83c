//! Conflict graphs of recorded transactional histories.
//!
//! A history is a log of `BEGIN`/`READ`/`WRITE`/`COMMIT` statements tagged
//! with session and object ids. `histiso_core` turns such a log into a
//! directed conflict graph over transaction ids:
//!
//! 1. [`history::statement`] -- the decoded statement model.
//! 2. [`history::validate`] -- optional well-formedness gate (per-session
//!    `BEGIN`/`COMMIT` alternation).
//! 3. [`graph::builder`] -- conflict-graph construction with session-id
//!    reuse remapping and write-write, write-read and read-write rules.
//! 4. [`graph::export`] -- the flat, densely re-indexed edge-list text used
//!    by external isomorphism solvers.
//! 5. [`history::elle`] -- rendering as an Elle list-append history (EDN).
//!
//! ```rust
//! use histiso_core::graph::builder::build;
//! use histiso_core::history::statement::Statement;
//!
//! let statements = vec![
//!     Statement::begin(1),
//!     Statement::write(1, "x"),
//!     Statement::commit(1),
//!     Statement::begin(2),
//!     Statement::read(2, "x"),
//!     Statement::commit(2),
//! ];
//! let graph = build(&statements);
//! assert!(graph.has_edge(1, 2));
//! ```
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on the
//!   statement model, [`ConflictGraph`](graph::conflict::ConflictGraph) and
//!   [`ValidationError`](history::validate::ValidationError).
//!
//! This crate is `no_std` compatible (requires `alloc`). Decoding raw log
//! files lives in `histiso_parser`; isomorphism classification lives in
//! `histiso_iso`.

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod graph;
pub mod history;

pub use graph::builder::build;
pub use graph::conflict::ConflictGraph;
pub use history::statement::{Operation, SessionId, Statement, Txid};
