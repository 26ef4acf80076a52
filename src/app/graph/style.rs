use std::borrow::Cow;
use std::collections::HashSet;

use eframe::egui::{Color32, Stroke};

use crate::text::ellipsize;

use super::super::HighlightState;
use super::super::render_utils::{
    DIRECT_EDGE_COLOR, HUB_EDGE_COLOR, LABEL_COLOR, SEARCH_RING_COLOR, SELECTED_RING_COLOR,
    blend_color, fade,
};
use super::build::{DisplayGraph, DisplayNode, EdgeKind};

pub(in crate::app) const DEFAULT_LABEL_ZOOM_THRESHOLD: f32 = 2.5;
const DIMMED_ALPHA: f32 = 0.13;
const COLLAPSED_EDGE_ALPHA: f32 = 0.03;
const CANVAS_LABEL_CHARS: usize = 28;

/// Indices of nodes whose label contains `query`, ignoring case.
///
/// `None` means no search is active; `Some` with an empty set means the
/// search matched nothing and every node is dimmed.
pub(in crate::app) fn search_matches(graph: &DisplayGraph, query: &str) -> Option<HashSet<usize>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    Some(
        graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.label.to_lowercase().contains(&needle))
            .map(|(index, _)| index)
            .collect(),
    )
}

/// Everything outside a node's own data that decides how it is drawn.
#[derive(Clone, Copy)]
pub(in crate::app) struct StyleInputs<'a> {
    pub(in crate::app) highlight: Option<&'a HighlightState>,
    pub(in crate::app) search: Option<&'a HashSet<usize>>,
    pub(in crate::app) selected: Option<usize>,
    pub(in crate::app) hovered: Option<usize>,
    pub(in crate::app) zoom: f32,
    pub(in crate::app) label_zoom_threshold: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct NodeStyle {
    pub(in crate::app) fill: Color32,
    pub(in crate::app) ring: Option<Stroke>,
    pub(in crate::app) glow: bool,
    pub(in crate::app) dimmed: bool,
    pub(in crate::app) show_label: bool,
    pub(in crate::app) label_color: Color32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct EdgeStyle {
    pub(in crate::app) stroke: Stroke,
    pub(in crate::app) collapsed: bool,
}

impl StyleInputs<'_> {
    pub(in crate::app) fn node_style(&self, graph: &DisplayGraph, index: usize) -> NodeStyle {
        let node = &graph.nodes[index];
        let is_selected = self.selected == Some(index);
        let is_hovered = self.hovered == Some(index);

        let search_match = self.search.is_some_and(|matches| matches.contains(&index));
        let dimmed_by_search = self.search.is_some() && !search_match;
        let dimmed_by_selection = self
            .highlight
            .is_some_and(|state| !state.active_nodes.contains(&index));
        let dimmed = dimmed_by_search || dimmed_by_selection;

        let fill = if dimmed {
            fade(node.color, DIMMED_ALPHA)
        } else if is_hovered {
            blend_color(node.color, Color32::WHITE, 0.25)
        } else {
            node.color
        };

        let ring = if is_selected {
            Some(Stroke::new(2.5, SELECTED_RING_COLOR))
        } else if search_match {
            Some(Stroke::new(1.2, SEARCH_RING_COLOR))
        } else {
            None
        };

        let show_label = node.is_entity()
            || search_match
            || is_selected
            || is_hovered
            || self.zoom > self.label_zoom_threshold;

        NodeStyle {
            fill,
            ring,
            glow: node.is_entity() && !dimmed,
            dimmed,
            show_label,
            label_color: if dimmed {
                fade(LABEL_COLOR, 0.35)
            } else {
                LABEL_COLOR
            },
        }
    }

    pub(in crate::app) fn edge_style(&self, graph: &DisplayGraph, edge_index: usize) -> EdgeStyle {
        let edge = &graph.edges[edge_index];
        let (source, target) = graph.endpoints[edge_index];

        let (color, width) = match edge.kind {
            EdgeKind::EntityHub => (fade(HUB_EDGE_COLOR, 0.55), 1.0),
            EdgeKind::Direct => (
                fade(DIRECT_EDGE_COLOR, 0.25 + edge.confidence * 0.6),
                0.6 + edge.confidence * 1.6,
            ),
        };

        if self
            .highlight
            .is_some_and(|state| !state.active_edges.contains(&edge_index))
        {
            return EdgeStyle {
                stroke: Stroke::new(0.3, fade(color, COLLAPSED_EDGE_ALPHA)),
                collapsed: true,
            };
        }

        let dimmed_by_search = self
            .search
            .is_some_and(|matches| !matches.contains(&source) && !matches.contains(&target));
        let color = if dimmed_by_search {
            fade(color, DIMMED_ALPHA)
        } else {
            color
        };

        EdgeStyle {
            stroke: Stroke::new(width, color),
            collapsed: false,
        }
    }
}

/// Memories first, then hubs, then the selected node on top.
pub(in crate::app) fn draw_order(graph: &DisplayGraph, selected: Option<usize>) -> Vec<usize> {
    let unselected = (0..graph.nodes.len()).filter(|&index| Some(index) != selected);
    let (hubs, mut order): (Vec<usize>, Vec<usize>) =
        unselected.partition(|&index| graph.nodes[index].is_entity());
    order.extend(hubs);
    order.extend(selected.filter(|&index| index < graph.nodes.len()));
    order
}

pub(in crate::app) fn canvas_label(node: &DisplayNode) -> Cow<'_, str> {
    if node.is_entity() {
        Cow::Borrowed(node.label.as_str())
    } else {
        ellipsize(&node.label, CANVAS_LABEL_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::{FilterParams, build_display_graph};
    use crate::app::highlight::build_highlight_state;
    use crate::memory::{Layer, RawDataset, RawEdge, RawMemoryNode};

    fn memory(id: &str, summary: &str) -> RawMemoryNode {
        RawMemoryNode {
            id: id.to_owned(),
            layer: Layer::Project,
            raw_text: String::new(),
            extraction_summary: Some(summary.to_owned()),
            importance: 0.5,
            source: String::new(),
            created_at: None,
        }
    }

    fn link(source: &str, target: &str, link_type: &str) -> RawEdge {
        RawEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            link_type: link_type.to_owned(),
            confidence: 0.8,
        }
    }

    fn graph() -> DisplayGraph {
        let raw = RawDataset {
            nodes: vec![
                memory("m1", "Auth token refresh"),
                memory("m2", "Billing export job"),
                memory("m3", "Rotate AUTH keys every quarter for the payments cluster"),
            ],
            edges: vec![
                link("m1", "m2", "relates_to"),
                link("m1", "m3", "shared:Vault"),
                link("m2", "m3", "shared:Vault"),
            ],
            entities: Vec::new(),
        };
        build_display_graph(&raw, &FilterParams::default())
    }

    fn inputs<'a>(
        highlight: Option<&'a HighlightState>,
        search: Option<&'a HashSet<usize>>,
    ) -> StyleInputs<'a> {
        StyleInputs {
            highlight,
            search,
            selected: None,
            hovered: None,
            zoom: 1.0,
            label_zoom_threshold: DEFAULT_LABEL_ZOOM_THRESHOLD,
        }
    }

    fn index(graph: &DisplayGraph, id: &str) -> usize {
        graph.index_of(id).expect("node admitted")
    }

    #[test]
    fn blank_query_disables_search() {
        let graph = graph();
        assert!(search_matches(&graph, "").is_none());
        assert!(search_matches(&graph, "   ").is_none());
    }

    #[test]
    fn search_dims_non_matching_nodes_only() {
        let graph = graph();
        let matches = search_matches(&graph, "auth").expect("search active");
        assert_eq!(
            matches,
            HashSet::from([index(&graph, "m1"), index(&graph, "m3")])
        );

        let style = inputs(None, Some(&matches));
        let auth = style.node_style(&graph, index(&graph, "m1"));
        assert!(!auth.dimmed && auth.show_label);
        assert_eq!(auth.ring, Some(Stroke::new(1.2, SEARCH_RING_COLOR)));

        let billing = style.node_style(&graph, index(&graph, "m2"));
        assert!(billing.dimmed && billing.ring.is_none());
        assert_eq!(billing.fill.a(), 33);
        assert!(!billing.show_label);
    }

    #[test]
    fn unmatched_search_dims_everything() {
        let graph = graph();
        let matches = search_matches(&graph, "kubernetes").expect("search active");
        let style = inputs(None, Some(&matches));
        assert!((0..graph.nodes.len()).all(|node| style.node_style(&graph, node).dimmed));
        assert!((0..graph.edges.len()).all(|edge| {
            style.edge_style(&graph, edge).stroke.color.a() < DIRECT_EDGE_COLOR.a()
        }));
    }

    #[test]
    fn selection_collapses_inactive_edges() {
        let graph = graph();
        let highlight = build_highlight_state(&graph, Some("entity:Vault")).expect("hub selected");
        let mut style = inputs(Some(&highlight), None);
        style.selected = Some(index(&graph, "entity:Vault"));
        assert!((0..graph.nodes.len()).all(|node| !style.node_style(&graph, node).dimmed));
        assert!((0..graph.edges.len()).all(|edge| !style.edge_style(&graph, edge).collapsed));

        let highlight = build_highlight_state(&graph, Some("m1")).expect("m1 selected");
        let style = inputs(Some(&highlight), None);
        let collapsed = (0..graph.edges.len())
            .filter(|&edge| style.edge_style(&graph, edge).collapsed)
            .count();
        assert_eq!(collapsed, graph.edges.len() - highlight.active_edges.len());
        assert!(collapsed > 0);
    }

    #[test]
    fn direct_edges_scale_with_confidence() {
        let weak = RawEdge {
            confidence: 0.2,
            ..link("m1", "m2", "relates_to")
        };
        let strong = RawEdge {
            confidence: 0.9,
            ..link("m2", "m3", "supersedes")
        };
        let raw = RawDataset {
            nodes: vec![memory("m1", "a"), memory("m2", "b"), memory("m3", "c")],
            edges: vec![weak, strong],
            entities: Vec::new(),
        };
        let graph = build_display_graph(&raw, &FilterParams::default());
        let edge = |link_type: &str| {
            graph
                .edges
                .iter()
                .position(|edge| edge.link_type == link_type)
                .expect("edge admitted")
        };

        let style = inputs(None, None);
        let weak = style.edge_style(&graph, edge("relates_to")).stroke;
        let strong = style.edge_style(&graph, edge("supersedes")).stroke;
        assert!(strong.width > weak.width);
        assert!(strong.color.a() > weak.color.a());
    }

    #[test]
    fn hubs_glow_and_always_show_labels() {
        let graph = graph();
        let hub = index(&graph, "entity:Vault");
        let style = inputs(None, None).node_style(&graph, hub);
        assert!(style.glow && style.show_label);

        let memory = inputs(None, None).node_style(&graph, index(&graph, "m2"));
        assert!(!memory.glow && !memory.show_label);
    }

    #[test]
    fn memory_labels_appear_past_zoom_threshold() {
        let graph = graph();
        let mut style = inputs(None, None);
        let m2 = index(&graph, "m2");
        style.zoom = 2.5;
        assert!(!style.node_style(&graph, m2).show_label);
        style.zoom = 2.6;
        assert!(style.node_style(&graph, m2).show_label);

        style.zoom = 1.0;
        style.hovered = Some(m2);
        assert!(style.node_style(&graph, m2).show_label);
    }

    #[test]
    fn selected_node_draws_last_after_hubs() {
        let graph = graph();
        let selected = index(&graph, "m1");
        let order = draw_order(&graph, Some(selected));
        assert_eq!(order.len(), graph.nodes.len());
        assert_eq!(order.last(), Some(&selected));

        let hub = index(&graph, "entity:Vault");
        let m2 = index(&graph, "m2");
        let hub_position = order.iter().position(|&node| node == hub);
        let m2_position = order.iter().position(|&node| node == m2);
        assert!(m2_position < hub_position);
    }

    #[test]
    fn canvas_labels_shorten_memories_only() {
        let graph = graph();
        let long = canvas_label(&graph.nodes[index(&graph, "m3")]);
        assert!(long.ends_with('…'));
        assert!(long.chars().count() <= 29);
        assert_eq!(canvas_label(&graph.nodes[index(&graph, "entity:Vault")]), "Vault");
    }
}
