use std::collections::HashSet;

use super::super::graph::DisplayGraph;

/// Adds every node one edge away from `selected_index`.
pub(super) fn collect_direct_neighbors(
    graph: &DisplayGraph,
    selected_index: usize,
    active_nodes: &mut HashSet<usize>,
) {
    if let Some(neighbors) = graph.neighbors.get(selected_index) {
        active_nodes.extend(neighbors.iter().copied());
    }
}

/// Edges whose endpoints are both active render at full weight.
pub(super) fn collect_active_edges(
    graph: &DisplayGraph,
    active_nodes: &HashSet<usize>,
    active_edges: &mut HashSet<usize>,
) {
    active_edges.extend(
        graph
            .endpoints
            .iter()
            .enumerate()
            .filter(|(_, (source, target))| {
                active_nodes.contains(source) && active_nodes.contains(target)
            })
            .map(|(index, _)| index),
    );
}
