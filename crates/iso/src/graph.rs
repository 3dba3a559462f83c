//! Graph forms consumed by the isomorphism oracles.

use std::collections::HashMap;

use histiso_core::graph::conflict::ConflictGraph;
use histiso_core::graph::export::to_edge_list;
use histiso_core::history::statement::Txid;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

/// A conflict graph in both forms the oracles need: a petgraph digraph for
/// in-process matching and the edge-list text for external solvers.
#[derive(Debug, Clone)]
pub struct ExportedGraph {
    generic: DiGraph<Txid, ()>,
    edge_list: String,
}

impl ExportedGraph {
    #[must_use]
    pub fn new(graph: &ConflictGraph) -> Self {
        Self {
            generic: to_generic(graph),
            edge_list: to_edge_list(graph, false),
        }
    }

    #[must_use]
    pub const fn generic(&self) -> &DiGraph<Txid, ()> {
        &self.generic
    }

    /// Edge-list text without comments.
    #[must_use]
    pub fn edge_list(&self) -> &str {
        &self.edge_list
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.generic.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.generic.edge_count()
    }
}

impl From<&ConflictGraph> for ExportedGraph {
    fn from(graph: &ConflictGraph) -> Self {
        Self::new(graph)
    }
}

/// Copies `graph` into a petgraph digraph.
///
/// Node `i` of the result is the `i`-th vertex in insertion order, weighted
/// with its txid.
#[must_use]
pub fn to_generic(graph: &ConflictGraph) -> DiGraph<Txid, ()> {
    let mut generic = DiGraph::with_capacity(graph.vertex_count(), graph.edge_count());
    let nodes: HashMap<Txid, NodeIndex> = graph
        .vertices()
        .map(|vertex| (vertex, generic.add_node(vertex)))
        .collect();
    for (source, target) in graph.to_edge_list() {
        generic.add_edge(nodes[&source], nodes[&target], ());
    }
    generic
}

/// Graphviz rendering of `graph`, nodes labelled with their txids.
#[must_use]
pub fn to_dot(graph: &ConflictGraph) -> String {
    let generic = to_generic(graph);
    format!("{:?}", Dot::with_config(&generic, &[Config::EdgeNoLabel]))
}
