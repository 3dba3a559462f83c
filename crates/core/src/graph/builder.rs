//! Conflict-graph construction from an ordered statement stream.
//!
//! Sessions may run several transactions back to back, so the builder keeps a
//! session-to-transaction map. The first transaction of a session uses the
//! session id as its [`Txid`]; every `COMMIT` advances the mapping by the
//! history's id span (`1 + max session id`), so later transactions of the
//! same session get fresh ids that cannot collide with any other session.
//!
//! Edges follow the multi-version conflict rules:
//!
//! - `WRITE x` by `t` depends on every earlier writer of `x` (write-write)
//!   and every earlier reader of `x` (read-write, anti-dependency).
//! - `READ x` by `t` depends on the most recent writer of `x` only
//!   (write-read).
//! - `BEGIN` of a session's next transaction depends on its previous
//!   transaction (session order), unless disabled in [`BuildOptions`].
//!
//! The builder is total: dangling `COMMIT`s, reads of never-written objects
//! and accesses outside of `BEGIN ... COMMIT` are accepted and simply add no
//! edge. Rejecting such histories is [`validate`](crate::history::validate)'s
//! job.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::graph::conflict::ConflictGraph;
use crate::history::statement::{SessionId, Statement, Txid};

/// Knobs for [`build_with`].
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Add an edge from a session's previous transaction to the next one on
    /// every `BEGIN`.
    pub session_order: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            session_order: true,
        }
    }
}

/// Builds the conflict graph of `statements` with default options.
#[must_use]
pub fn build<Object>(statements: &[Statement<Object>]) -> ConflictGraph
where
    Object: Hash + Eq,
{
    build_with(statements, BuildOptions::default())
}

/// Builds the conflict graph of `statements`.
///
/// Statements must be in log order. Only transactions that reached `BEGIN`
/// become vertices.
#[must_use]
pub fn build_with<Object>(statements: &[Statement<Object>], options: BuildOptions) -> ConflictGraph
where
    Object: Hash + Eq,
{
    let mut state = BuildState::new(id_span(statements), options);
    for statement in statements {
        state.apply(statement);
    }
    tracing::debug!(
        statements = statements.len(),
        span = state.span,
        vertices = state.graph.vertex_count(),
        edges = state.graph.edge_count(),
        "built conflict graph"
    );
    state.graph
}

/// `1 + max(session id)` over all statements, `0` for an empty history.
#[must_use]
pub fn id_span<Object>(statements: &[Statement<Object>]) -> u64 {
    statements
        .iter()
        .map(Statement::session)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Per-history bookkeeping, discarded once the graph is returned.
struct BuildState<'a, Object> {
    span: u64,
    options: BuildOptions,
    sessions: HashMap<SessionId, Txid>,
    writes: HashMap<&'a Object, Vec<Txid>>,
    reads: HashMap<&'a Object, Vec<Txid>>,
    graph: ConflictGraph,
}

impl<'a, Object> BuildState<'a, Object>
where
    Object: Hash + Eq,
{
    fn new(span: u64, options: BuildOptions) -> Self {
        Self {
            span,
            options,
            sessions: HashMap::new(),
            writes: HashMap::new(),
            reads: HashMap::new(),
            graph: ConflictGraph::new(),
        }
    }

    fn apply(&mut self, statement: &'a Statement<Object>) {
        let session = statement.session();
        let txid = *self.sessions.entry(session).or_insert(session);

        match statement {
            Statement::Begin { .. } => {
                self.graph.add_vertex(txid);
                if self.options.session_order {
                    if let Some(previous) = txid
                        .checked_sub(self.span)
                        .filter(|previous| self.graph.has_vertex(*previous))
                    {
                        self.graph.add_edge(previous, txid);
                    }
                }
            }
            Statement::Commit { .. } => {
                if let Some(current) = self.sessions.get_mut(&session) {
                    *current = current.saturating_add(self.span);
                }
            }
            Statement::Write { object, .. } => {
                if let Some(writers) = self.writes.get(object) {
                    for &writer in writers.iter().filter(|&&writer| writer != txid) {
                        self.graph.add_edge(writer, txid);
                    }
                }
                if let Some(readers) = self.reads.get(object) {
                    for &reader in readers.iter().filter(|&&reader| reader != txid) {
                        self.graph.add_edge(reader, txid);
                    }
                }
                self.writes.entry(object).or_default().push(txid);
            }
            Statement::Read { object, .. } => {
                if let Some(&writer) = self.writes.get(object).and_then(|writers| writers.last()) {
                    if writer != txid {
                        self.graph.add_edge(writer, txid);
                    }
                }
                self.reads.entry(object).or_default().push(txid);
            }
        }
    }
}
