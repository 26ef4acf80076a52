use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, CursorIcon, FontId, PointerButton, Pos2, Rect, Sense, Ui, Vec2, vec2,
};

use super::super::ViewModel;
use super::super::highlight::build_highlight_state;
use super::super::physics::LayoutState;
use super::super::render_utils::{
    LABEL_COLOR, circle_visible, draw_background, fade, segment_near_rect,
};
use super::build::NodeKind;
use super::interaction::InteractionEvent;
use super::style::{StyleInputs, canvas_label, draw_order, search_matches};

const FIT_DURATION_MS: f32 = 600.0;
const FIT_PADDING_PX: f32 = 48.0;

/// Whether the camera should fit the layout this frame. A pending fit waits
/// for the layout to settle unless the simulation is paused.
fn fit_due(
    layout: LayoutState,
    pending_fit: bool,
    fit_requested: bool,
    live_physics: bool,
) -> bool {
    fit_requested || (pending_fit && (layout == LayoutState::Settled || !live_physics))
}

/// Per-frame screen projection of the layout.
struct ScreenSpace {
    positions: Vec<Pos2>,
    radii: Vec<f32>,
    visible: Vec<usize>,
    visible_mask: Vec<bool>,
}

impl ViewModel {
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.filters.search_query.trim();

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.render_graph_revision
            && cached.query == query
        {
            return cached.matches.clone();
        }

        let matches = search_matches(&self.graph, query).map(Arc::new);
        self.search_match_cache = Some(super::super::SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: matches.clone(),
        });
        matches
    }

    fn fit_view(&mut self, viewport: Vec2, duration_ms: f32) {
        if let Some(bounds) = self.layout.bounds() {
            self.camera
                .zoom_to_fit(bounds, viewport, duration_ms, FIT_PADDING_PX);
        }
        self.pending_fit = false;
        self.fit_requested = false;
    }

    fn project(&self, rect: Rect) -> ScreenSpace {
        let zoom = self.camera.zoom();
        let node_scale = zoom.powf(0.6);

        let mut screen = ScreenSpace {
            positions: Vec::with_capacity(self.graph.nodes.len()),
            radii: Vec::with_capacity(self.graph.nodes.len()),
            visible: Vec::new(),
            visible_mask: vec![false; self.graph.nodes.len()],
        };
        for (index, (node, world)) in self
            .graph
            .nodes
            .iter()
            .zip(self.layout.positions())
            .enumerate()
        {
            let position = self.camera.world_to_screen(rect, *world);
            let radius = (node.radius * node_scale).clamp(1.5, 36.0);
            if circle_visible(rect, position, radius) {
                screen.visible.push(index);
                screen.visible_mask[index] = true;
            }
            screen.positions.push(position);
            screen.radii.push(radius);
        }
        screen
    }

    fn advance_simulation(&mut self, ui: &Ui, viewport: Vec2) {
        let delta_secs = ui.input(|input| input.stable_dt).clamp(0.0, 0.1);
        if self.camera.advance(delta_secs) {
            ui.ctx().request_repaint();
        }

        if self.live_physics {
            let report = self.layout.step();
            if report.moved {
                ui.ctx().request_repaint();
            }
        }

        if fit_due(
            self.layout.state(),
            self.pending_fit,
            self.fit_requested,
            self.live_physics,
        ) {
            self.fit_view(viewport, FIT_DURATION_MS);
            ui.ctx().request_repaint();
        }
    }

    fn handle_graph_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        screen: &ScreenSpace,
    ) {
        if response.drag_started_by(PointerButton::Primary) {
            let press_origin = ui.input(|input| input.pointer.press_origin());
            self.dragging = Self::hovered_index(
                press_origin,
                &screen.visible,
                &screen.positions,
                &screen.radii,
            )
            .map(|index| self.graph.nodes[index].id.clone());
        }

        if response.dragged() {
            let pointer = response.interact_pointer_pos();
            match (&self.dragging, pointer) {
                (Some(id), Some(pointer)) if response.dragged_by(PointerButton::Primary) => {
                    let world = self.camera.screen_to_world(rect, pointer);
                    self.layout.drag_to(id, world);
                }
                _ => self.camera.pan_by(response.drag_delta()),
            }
            ui.ctx().request_repaint();
        }

        if response.drag_stopped() && self.dragging.take().is_some() {
            self.layout.end_drag();
        }
    }

    fn handle_graph_pointer(&mut self, response: &egui::Response, hovered: Option<usize>) {
        let hovered_id = hovered.map(|index| self.graph.nodes[index].id.as_str());
        if hovered_id != self.interaction.hovered.as_deref() {
            let event = match hovered_id {
                Some(id) => InteractionEvent::HoverEnter(id.to_owned()),
                None => InteractionEvent::HoverLeave,
            };
            self.apply_interaction(event);
        }

        if response.clicked_by(PointerButton::Primary) {
            let event = match hovered {
                Some(index) => {
                    let node = &self.graph.nodes[index];
                    InteractionEvent::ClickNode {
                        id: node.id.clone(),
                        is_entity: node.is_entity(),
                    }
                }
                None => InteractionEvent::ClickBackground,
            };
            self.apply_interaction(event);
        }
    }

    fn hover_summary(&self, index: usize) -> String {
        let node = &self.graph.nodes[index];
        let degree = self.graph.neighbors[index].len();
        match node.kind {
            NodeKind::Memory { layer, importance } => format!(
                "{}  |  {layer}  |  importance {importance:.2}  |  degree {degree}",
                node.label
            ),
            NodeKind::EntityHub { mention_count } => format!(
                "{}  |  entity  |  {mention_count} mentions  |  degree {degree}",
                node.label
            ),
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }
        if self.graph.is_empty() {
            self.draw_empty_state(ui);
            return;
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.advance_simulation(ui, rect.size());

        let screen = self.project(rect);
        self.handle_graph_drag(ui, rect, &response, &screen);

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        let hovered = match &self.dragging {
            Some(id) => self.graph.index_of(id),
            None => Self::hovered_index(pointer, &screen.visible, &screen.positions, &screen.radii),
        };
        self.handle_graph_pointer(&response, hovered);

        if self.dragging.is_some() {
            ui.output_mut(|output| output.cursor_icon = CursorIcon::Grabbing);
        } else if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = CursorIcon::PointingHand);
        }

        let zoom = self.camera.zoom();
        draw_background(&painter, rect, self.camera.pan(), zoom);

        let selected = self
            .interaction
            .selected
            .as_deref()
            .and_then(|id| self.graph.index_of(id));
        let highlight = build_highlight_state(&self.graph, self.interaction.selected.as_deref());
        let search = self.cached_search_matches();
        let inputs = StyleInputs {
            highlight: highlight.as_ref(),
            search: search.as_deref(),
            selected,
            hovered,
            zoom,
            label_zoom_threshold: self.label_zoom_threshold,
        };

        let edge_scale = zoom.sqrt().clamp(0.5, 2.0);
        let mut full_weight = Vec::new();
        for (edge_index, &(source, target)) in self.graph.endpoints.iter().enumerate() {
            let start = screen.positions[source];
            let end = screen.positions[target];
            if !screen.visible_mask[source]
                && !screen.visible_mask[target]
                && !segment_near_rect(rect, start, end, 2.0)
            {
                continue;
            }

            let style = inputs.edge_style(&self.graph, edge_index);
            let mut stroke = style.stroke;
            stroke.width *= edge_scale;
            if style.collapsed {
                painter.line_segment([start, end], stroke);
            } else {
                full_weight.push(([start, end], stroke));
            }
        }
        for (points, stroke) in full_weight {
            painter.line_segment(points, stroke);
        }

        for index in draw_order(&self.graph, selected) {
            if !screen.visible_mask[index] {
                continue;
            }

            let node = &self.graph.nodes[index];
            let position = screen.positions[index];
            let radius = screen.radii[index];
            let style = inputs.node_style(&self.graph, index);

            if style.glow {
                painter.circle_filled(position, radius + 5.0, fade(node.color, 0.16));
            }
            painter.circle_filled(position, radius, style.fill);
            if let Some(ring) = style.ring {
                painter.circle_stroke(position, radius + 2.5, ring);
            }
            if !style.dimmed && self.layout.is_pinned(&node.id) {
                painter.circle_filled(position, (radius * 0.3).max(1.0), fade(LABEL_COLOR, 0.8));
            }

            if style.show_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    canvas_label(node),
                    FontId::proportional(12.0),
                    style.label_color,
                );
            }
        }

        if let Some(index) = hovered {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                self.hover_summary(index),
                FontId::proportional(13.0),
                LABEL_COLOR,
            );
        }
    }
}
