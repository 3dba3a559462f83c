use petgraph::algo::{is_isomorphic_matching, is_isomorphic_subgraph_matching};

use histiso_core::Txid;

use super::{IsomorphismOracle, OracleError};
use crate::graph::ExportedGraph;
use crate::worker::CancelFlag;

/// In-process VF2 matcher from petgraph.
///
/// Node labels are ignored: two graphs match when their edge structure does.
/// The node predicate doubles as a cancellation point, so a raised
/// [`CancelFlag`] prunes every remaining branch and the search unwinds
/// promptly.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryOracle;

impl LibraryOracle {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn finish(found: bool, cancel: &CancelFlag) -> Result<bool, OracleError> {
    // a cancelled search answers `false` from pruning; don't trust it
    if cancel.is_cancelled() {
        Err(OracleError::Cancelled)
    } else {
        Ok(found)
    }
}

impl IsomorphismOracle for LibraryOracle {
    fn name(&self) -> &'static str {
        "petgraph-vf2"
    }

    fn are_isomorphic(
        &self,
        a: &ExportedGraph,
        b: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }
        if a.node_count() != b.node_count() || a.edge_count() != b.edge_count() {
            return Ok(false);
        }
        let found = is_isomorphic_matching(
            a.generic(),
            b.generic(),
            |_: &Txid, _: &Txid| !cancel.is_cancelled(),
            |_: &(), _: &()| true,
        );
        finish(found, cancel)
    }

    fn has_subgraph_isomorphic(
        &self,
        small: &ExportedGraph,
        big: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }
        if small.node_count() > big.node_count() || small.edge_count() > big.edge_count() {
            return Ok(false);
        }
        let found = is_isomorphic_subgraph_matching(
            small.generic(),
            big.generic(),
            |_: &Txid, _: &Txid| !cancel.is_cancelled(),
            |_: &(), _: &()| true,
        );
        finish(found, cancel)
    }
}
