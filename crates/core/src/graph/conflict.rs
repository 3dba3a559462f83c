use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::history::statement::Txid;

/// Directed conflict graph over transaction ids.
///
/// An edge `u -> v` records that some operation of `u` must be ordered
/// before a conflicting operation of `v` on the same object. Vertices keep
/// the order in which they were first inserted; that order drives the dense
/// re-indexing of the exported forms.
///
/// Unlike a general digraph, vertices are never created implicitly: an edge
/// is only stored when both endpoints already exist and differ, so the graph
/// has no self-loops and no edge to a transaction that never began.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Default, Debug, Clone)]
pub struct ConflictGraph {
    /// Vertices in insertion order.
    order: Vec<Txid>,
    /// Maps each vertex to the set of vertices it has edges to.
    adj_map: HashMap<Txid, HashSet<Txid>>,
}

impl ConflictGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex with no outgoing edges.
    ///
    /// Returns `false` if the vertex was already present.
    pub fn add_vertex(&mut self, vertex: Txid) -> bool {
        if self.adj_map.contains_key(&vertex) {
            return false;
        }
        self.adj_map.insert(vertex, HashSet::new());
        self.order.push(vertex);
        true
    }

    /// Inserts the edge `source -> target`.
    ///
    /// Returns `true` only if a new edge was stored. Self-loops and edges
    /// touching an absent vertex are ignored.
    pub fn add_edge(&mut self, source: Txid, target: Txid) -> bool {
        if source == target || !self.adj_map.contains_key(&target) {
            return false;
        }
        self.adj_map
            .get_mut(&source)
            .is_some_and(|successors| successors.insert(target))
    }

    #[must_use]
    pub fn has_vertex(&self, vertex: Txid) -> bool {
        self.adj_map.contains_key(&vertex)
    }

    /// Returns `true` if an edge from `source` to `target` exists.
    #[must_use]
    pub fn has_edge(&self, source: Txid, target: Txid) -> bool {
        self.adj_map
            .get(&source)
            .is_some_and(|successors| successors.contains(&target))
    }

    /// Direct successors of `vertex`, `None` if it is not in the graph.
    #[must_use]
    pub fn successors(&self, vertex: Txid) -> Option<&HashSet<Txid>> {
        self.adj_map.get(&vertex)
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl ExactSizeIterator<Item = Txid> + '_ {
        self.order.iter().copied()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adj_map.values().map(HashSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns all edges as `(source, target)` pairs, sources in insertion
    /// order and targets ascending.
    #[must_use]
    pub fn to_edge_list(&self) -> Vec<(Txid, Txid)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for source in self.vertices() {
            let mut targets: Vec<Txid> = self.adj_map[&source].iter().copied().collect();
            targets.sort_unstable();
            edges.extend(targets.into_iter().map(|target| (source, target)));
        }
        edges
    }

    /// Dense `0..n` index of every vertex, following insertion order.
    #[must_use]
    pub fn dense_index(&self) -> HashMap<Txid, usize> {
        self.vertices()
            .enumerate()
            .map(|(index, vertex)| (vertex, index))
            .collect()
    }
}

/// Graphs are equal when they have the same vertices and edges; insertion
/// order is presentational and ignored.
impl PartialEq for ConflictGraph {
    fn eq(&self, other: &Self) -> bool {
        self.adj_map == other.adj_map
    }
}

impl Eq for ConflictGraph {}
