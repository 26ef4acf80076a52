use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use eframe::egui::Color32;
use log::debug;

use crate::memory::{Layer, RawDataset, RawMemoryNode, SHARED_LINK_PREFIX};
use crate::text::{normalize, truncate_chars};

use super::super::render_utils::{ENTITY_COLOR, layer_color};
use super::super::ViewModel;
use super::super::physics::LayoutState;

pub(in crate::app) const DEFAULT_RESULT_LIMIT: usize = 500;
pub(in crate::app) const ENTITY_EDGE_CONFIDENCE: f32 = 0.7;
const MIN_HUB_MENTIONS: usize = 2;
const LABEL_MAX_CHARS: usize = 60;
const ID_LABEL_CHARS: usize = 8;
const ENTITY_ID_PREFIX: &str = "entity:";

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct FilterParams {
    pub(in crate::app) result_limit: usize,
    pub(in crate::app) min_confidence: f32,
    pub(in crate::app) enabled_layers: BTreeSet<Layer>,
    pub(in crate::app) search_query: String,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            result_limit: DEFAULT_RESULT_LIMIT,
            min_confidence: 0.0,
            enabled_layers: Layer::ALL.into_iter().collect(),
            search_query: String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum NodeKind {
    Memory { layer: Layer, importance: f32 },
    EntityHub { mention_count: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct DisplayNode {
    pub(in crate::app) id: String,
    pub(in crate::app) label: String,
    pub(in crate::app) raw: String,
    pub(in crate::app) color: Color32,
    pub(in crate::app) radius: f32,
    pub(in crate::app) kind: NodeKind,
}

impl DisplayNode {
    pub(in crate::app) fn is_entity(&self) -> bool {
        matches!(self.kind, NodeKind::EntityHub { .. })
    }

    fn memory(memory: &RawMemoryNode) -> Self {
        Self {
            id: memory.id.clone(),
            label: memory_label(memory),
            raw: normalize(&memory.raw_text).into_owned(),
            color: layer_color(memory.layer),
            radius: 3.0 + memory.importance * 5.0,
            kind: NodeKind::Memory {
                layer: memory.layer,
                importance: memory.importance,
            },
        }
    }

    fn entity_hub(id: String, name: &str, mention_count: usize) -> Self {
        Self {
            id,
            label: name.to_owned(),
            raw: format!("Entity \"{name}\" mentioned by {mention_count} memories"),
            color: ENTITY_COLOR,
            radius: (4.0 + (mention_count as f32).sqrt() * 2.0).min(14.0),
            kind: NodeKind::EntityHub { mention_count },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(in crate::app) enum EdgeKind {
    EntityHub,
    Direct,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct DisplayEdge {
    pub(in crate::app) source: String,
    pub(in crate::app) target: String,
    pub(in crate::app) link_type: String,
    pub(in crate::app) confidence: f32,
    pub(in crate::app) kind: EdgeKind,
}

/// Render-ready graph: nodes, edges, and index lookups derived from them.
#[derive(Clone, Debug, Default)]
pub(in crate::app) struct DisplayGraph {
    pub(in crate::app) nodes: Vec<DisplayNode>,
    pub(in crate::app) edges: Vec<DisplayEdge>,
    pub(in crate::app) endpoints: Vec<(usize, usize)>,
    pub(in crate::app) index_by_id: HashMap<String, usize>,
    pub(in crate::app) neighbors: Vec<Vec<usize>>,
}

impl DisplayGraph {
    fn new(nodes: Vec<DisplayNode>, edges: Vec<DisplayEdge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut endpoints = Vec::with_capacity(edges.len());
        for edge in &edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                continue;
            };
            endpoints.push((source, target));
            if source != target {
                neighbors[source].push(target);
                neighbors[target].push(source);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            nodes,
            edges,
            endpoints,
            index_by_id,
            neighbors,
        }
    }

    pub(in crate::app) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(in crate::app) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(in crate::app) fn node(&self, id: &str) -> Option<&DisplayNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub(in crate::app) fn entity_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_entity()).count()
    }

    pub(in crate::app) fn memory_count(&self) -> usize {
        self.nodes.len() - self.entity_count()
    }

    pub(in crate::app) fn edge_count(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|edge| edge.kind == kind).count()
    }
}

fn memory_label(memory: &RawMemoryNode) -> String {
    let candidates = [
        memory.extraction_summary.as_deref(),
        Some(memory.raw_text.as_str()),
    ];
    for text in candidates.into_iter().flatten() {
        let decoded = normalize(text);
        let trimmed = decoded.trim();
        if !trimmed.is_empty() {
            return truncate_chars(trimmed, LABEL_MAX_CHARS).to_owned();
        }
    }

    truncate_chars(&memory.id, ID_LABEL_CHARS).to_owned()
}

fn hub_id(raw: &RawDataset, name: &str, taken: &HashSet<String>) -> String {
    if let Some(id) = raw.entity_id(name)
        && !taken.contains(id)
    {
        return id.to_owned();
    }

    let base = format!("{ENTITY_ID_PREFIX}{name}");
    let mut candidate = base.clone();
    let mut suffix = 2usize;
    while taken.contains(&candidate) {
        candidate = format!("{base}#{suffix}");
        suffix += 1;
    }
    candidate
}

/// Derives the display graph for `raw` under `filters`.
///
/// Memories outside the enabled layers are dropped, entities co-mentioned by
/// at least two admitted memories become hub nodes, direct edges below the
/// confidence floor or touching dropped memories are discarded, and memories
/// left without any edge are pruned.
pub(in crate::app) fn build_display_graph(raw: &RawDataset, filters: &FilterParams) -> DisplayGraph {
    let mut memories = Vec::new();
    let mut admitted = HashSet::new();
    for memory in &raw.nodes {
        if filters.enabled_layers.contains(&memory.layer) && admitted.insert(memory.id.as_str()) {
            memories.push(DisplayNode::memory(memory));
        }
    }

    let mut mentions: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for edge in &raw.edges {
        let Some(name) = edge.shared_entity().filter(|name| !name.is_empty()) else {
            continue;
        };

        let source_admitted = admitted.contains(edge.source.as_str());
        let target_admitted = admitted.contains(edge.target.as_str());
        if !source_admitted && !target_admitted {
            continue;
        }

        let members = mentions.entry(name).or_default();
        if source_admitted {
            members.insert(edge.source.as_str());
        }
        if target_admitted {
            members.insert(edge.target.as_str());
        }
    }

    let mut taken = admitted
        .iter()
        .map(|id| (*id).to_owned())
        .collect::<HashSet<_>>();
    let mut hubs = Vec::new();
    let mut edges = Vec::new();
    for (name, members) in &mentions {
        if members.len() < MIN_HUB_MENTIONS {
            continue;
        }

        let id = hub_id(raw, name, &taken);
        taken.insert(id.clone());
        for member in members {
            edges.push(DisplayEdge {
                source: id.clone(),
                target: (*member).to_owned(),
                link_type: format!("{SHARED_LINK_PREFIX}{name}"),
                confidence: ENTITY_EDGE_CONFIDENCE,
                kind: EdgeKind::EntityHub,
            });
        }
        hubs.push(DisplayNode::entity_hub(id, name, members.len()));
    }

    for edge in &raw.edges {
        if edge.shared_entity().is_some()
            || edge.confidence < filters.min_confidence
            || !admitted.contains(edge.source.as_str())
            || !admitted.contains(edge.target.as_str())
        {
            continue;
        }

        edges.push(DisplayEdge {
            source: edge.source.clone(),
            target: edge.target.clone(),
            link_type: edge.link_type.clone(),
            confidence: edge.confidence,
            kind: EdgeKind::Direct,
        });
    }

    let connected = edges
        .iter()
        .flat_map(|edge| [edge.source.as_str(), edge.target.as_str()])
        .collect::<HashSet<_>>();
    let mut nodes = memories
        .into_iter()
        .filter(|node| connected.contains(node.id.as_str()))
        .collect::<Vec<_>>();
    nodes.extend(hubs);

    debug!(
        "built display graph: {} of {} memories admitted, {} nodes, {} edges",
        admitted.len(),
        raw.node_count(),
        nodes.len(),
        edges.len()
    );

    DisplayGraph::new(nodes, edges)
}

impl ViewModel {
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.search_match_cache = None;

        let graph = build_display_graph(&self.dataset, &self.filters);
        self.interaction.reconcile(&graph);
        self.pending_fit = self.layout.start(&graph) != LayoutState::Empty;
        self.graph = graph;
        self.graph_dirty = false;
    }
}
