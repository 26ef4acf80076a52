use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;
use super::super::graph::{InteractionEvent, NodeKind};

/// One row of the neighbor list: the node across the edge and how it links.
struct NeighborRow {
    id: String,
    label: String,
    link_type: String,
    confidence: f32,
}

impl ViewModel {
    fn neighbor_rows(&self, selected_index: usize) -> Vec<NeighborRow> {
        let mut rows = self
            .graph
            .endpoints
            .iter()
            .zip(&self.graph.edges)
            .filter_map(|(&(source, target), edge)| {
                let other = if source == selected_index {
                    target
                } else if target == selected_index {
                    source
                } else {
                    return None;
                };
                let node = &self.graph.nodes[other];
                Some(NeighborRow {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    link_type: edge.link_type.clone(),
                    confidence: edge.confidence,
                })
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.confidence.total_cmp(&a.confidence).then(a.label.cmp(&b.label)));
        rows
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.interaction.selected.clone() else {
            ui.label("Click a node to inspect it. Click a selected memory again to open it.");
            return;
        };

        let Some(selected_index) = self.graph.index_of(&selected_id) else {
            ui.label("Selected node is not part of the current graph.");
            return;
        };

        let node = &self.graph.nodes[selected_index];
        let kind = node.kind;
        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        match kind {
            NodeKind::Memory { layer, importance } => {
                ui.label(format!("Layer: {layer}"));
                ui.label(format!("Importance: {importance:.2}"));
                if let Some(raw) = self.dataset.nodes.iter().find(|raw| raw.id == selected_id) {
                    if !raw.source.is_empty() {
                        ui.label(format!("Source: {}", raw.source));
                    }
                    if let Some(created_at) = &raw.created_at {
                        ui.label(format!("Created: {created_at}"));
                    }
                }
            }
            NodeKind::EntityHub { mention_count } => {
                ui.label(format!("Entity hub mentioned by {mention_count} memories"));
            }
        }

        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("selected_raw_text")
            .max_height(180.0)
            .show(ui, |ui| {
                ui.label(node.raw.as_str());
            });

        let pinned = self.layout.is_pinned(&selected_id);
        if let Some(position) = self.layout.position(&selected_id) {
            ui.small(format!(
                "Position ({:.0}, {:.0}){}",
                position.x,
                position.y,
                if pinned { ", pinned" } else { "" }
            ));
        }
        let mut open_memory = false;
        let mut unpin = false;
        let mut clear = false;
        ui.separator();
        ui.horizontal(|ui| {
            if matches!(kind, NodeKind::Memory { .. }) {
                open_memory = ui.button("Open memory").clicked();
            }
            unpin = ui.add_enabled(pinned, egui::Button::new("Unpin")).clicked();
            clear = ui.button("Clear selection").clicked();
        });

        ui.separator();
        let neighbors = self.neighbor_rows(selected_index);
        ui.label(RichText::new(format!("Neighbors ({})", neighbors.len())).strong());

        let mut next_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("neighbor_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, neighbors.len(), |ui, row_range| {
                for row in &neighbors[row_range] {
                    let text = format!("{}  [{} {:.2}]", row.label, row.link_type, row.confidence);
                    if ui.link(text).on_hover_text(row.id.as_str()).clicked() {
                        next_selection = Some(row.id.clone());
                    }
                }
            });

        if open_memory {
            self.pending_navigation.push(selected_id.clone());
        }
        if unpin {
            self.layout.release(&selected_id);
        }
        if clear {
            self.apply_interaction(InteractionEvent::ClearSelection);
        } else if let Some(id) = next_selection {
            self.select_node(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::ViewModel;
    use crate::app::graph::{DEFAULT_LABEL_ZOOM_THRESHOLD, FilterParams, InteractionEvent};
    use crate::memory::{Layer, RawDataset, RawEdge, RawMemoryNode};

    fn memory(id: &str, summary: &str) -> RawMemoryNode {
        RawMemoryNode {
            id: id.to_owned(),
            layer: Layer::Identity,
            raw_text: String::new(),
            extraction_summary: Some(summary.to_owned()),
            importance: 0.9,
            source: "chat".to_owned(),
            created_at: None,
        }
    }

    fn link(source: &str, target: &str, link_type: &str, confidence: f32) -> RawEdge {
        RawEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            link_type: link_type.to_owned(),
            confidence,
        }
    }

    #[test]
    fn neighbors_list_every_incident_edge_by_confidence() {
        let raw = RawDataset {
            nodes: vec![
                memory("a", "alpha"),
                memory("b", "beta"),
                memory("c", "gamma"),
                memory("d", "delta"),
            ],
            edges: vec![
                link("a", "b", "relates_to", 0.3),
                link("c", "a", "supersedes", 0.9),
                link("c", "d", "relates_to", 0.8),
            ],
            entities: Vec::new(),
        };
        let mut model = ViewModel::new(raw, FilterParams::default(), DEFAULT_LABEL_ZOOM_THRESHOLD);
        model.rebuild_render_graph();

        let index = model.graph.index_of("a").expect("a admitted");
        let rows = model.neighbor_rows(index);
        let summary = rows
            .iter()
            .map(|row| (row.id.as_str(), row.link_type.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![("c", "supersedes"), ("b", "relates_to")]);
    }

    #[test]
    fn clear_selection_goes_through_the_transition() {
        let raw = RawDataset {
            nodes: vec![memory("a", "alpha"), memory("b", "beta")],
            edges: vec![link("a", "b", "relates_to", 0.5)],
            entities: Vec::new(),
        };
        let mut model = ViewModel::new(raw, FilterParams::default(), DEFAULT_LABEL_ZOOM_THRESHOLD);
        model.rebuild_render_graph();
        model.select_node("a");
        model.apply_interaction(InteractionEvent::HoverEnter("b".to_owned()));

        model.apply_interaction(InteractionEvent::ClearSelection);
        assert_eq!(model.interaction.selected, None);
        assert_eq!(model.interaction.hovered.as_deref(), Some("b"));
        assert!(model.pending_navigation.is_empty());
    }
}
