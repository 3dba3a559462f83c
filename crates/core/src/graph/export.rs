//! Flat edge-list rendering of a [`ConflictGraph`].
//!
//! This is the text handed to external isomorphism solvers:
//!
//! ```text
//! <node count>
//! <id> <txid>            one line per node
//! <out degree>           per node, followed by
//! <from id> <to id>      one line per out edge
//! ```
//!
//! Ids are a dense `0..n` re-indexing in vertex insertion order. With
//! comments enabled, `#` headers and blank separator lines are interleaved;
//! the remaining lines are identical in both modes.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::graph::conflict::ConflictGraph;

/// Renders `graph` in the edge-list format.
///
/// Lines are joined with `\n` without a trailing newline. Out edges of a
/// node are listed by ascending target id.
#[must_use]
pub fn to_edge_list(graph: &ConflictGraph, with_comments: bool) -> String {
    let index = graph.dense_index();
    let mut lines: Vec<String> = Vec::new();
    let comment = |lines: &mut Vec<String>, line: String| {
        if with_comments {
            lines.push(line);
        }
    };

    comment(&mut lines, "# Number of nodes".into());
    lines.push(format!("{}", graph.vertex_count()));
    comment(&mut lines, String::new());

    comment(&mut lines, "# Node attributes".into());
    for (id, vertex) in graph.vertices().enumerate() {
        lines.push(format!("{id} {vertex}"));
    }
    comment(&mut lines, String::new());

    for (id, vertex) in graph.vertices().enumerate() {
        comment(
            &mut lines,
            format!("# Edges coming out of node {id} (initially {vertex})"),
        );
        let mut targets: Vec<usize> = graph
            .successors(vertex)
            .into_iter()
            .flatten()
            .map(|target| index[target])
            .collect();
        targets.sort_unstable();
        lines.push(format!("{}", targets.len()));
        lines.extend(targets.into_iter().map(|target| format!("{id} {target}")));
        comment(&mut lines, String::new());
    }

    lines.join("\n")
}
