use std::collections::HashSet;

mod collect;

use self::collect::{collect_active_edges, collect_direct_neighbors};
use super::HighlightState;
use super::graph::DisplayGraph;

/// Derives the active set for the current selection.
///
/// Returns `None` when nothing is selected or the selected id is not part of
/// `graph`, which callers treat as "everything is active".
pub(super) fn build_highlight_state(
    graph: &DisplayGraph,
    selected_id: Option<&str>,
) -> Option<HighlightState> {
    let selected_index = graph.index_of(selected_id?)?;

    let mut active_nodes = HashSet::from([selected_index]);
    collect_direct_neighbors(graph, selected_index, &mut active_nodes);

    let mut active_edges = HashSet::new();
    collect_active_edges(graph, &active_nodes, &mut active_edges);

    Some(HighlightState {
        active_nodes,
        active_edges,
    })
}
