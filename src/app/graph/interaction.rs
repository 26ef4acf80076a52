use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::build::DisplayGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum InteractionPhase {
    Idle,
    Hovering,
    Selected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum InteractionEvent {
    HoverEnter(String),
    HoverLeave,
    ClickNode { id: String, is_entity: bool },
    ClickBackground,
    ClearSelection,
}

/// Side effects the host has to carry out after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum InteractionOutcome {
    None,
    NavigateToMemory(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct InteractionState {
    pub(in crate::app) selected: Option<String>,
    pub(in crate::app) hovered: Option<String>,
}

impl InteractionState {
    pub(in crate::app) fn phase(&self) -> InteractionPhase {
        if self.selected.is_some() {
            InteractionPhase::Selected
        } else if self.hovered.is_some() {
            InteractionPhase::Hovering
        } else {
            InteractionPhase::Idle
        }
    }

    pub(in crate::app) fn apply(&mut self, event: InteractionEvent) -> InteractionOutcome {
        match event {
            InteractionEvent::HoverEnter(id) => self.hovered = Some(id),
            InteractionEvent::HoverLeave => self.hovered = None,
            InteractionEvent::ClickNode { id, is_entity } => {
                if self.selected.as_deref() != Some(id.as_str()) {
                    self.selected = Some(id);
                } else if is_entity {
                    self.selected = None;
                } else {
                    return InteractionOutcome::NavigateToMemory(id);
                }
            }
            InteractionEvent::ClickBackground => {
                self.selected = None;
                self.hovered = None;
            }
            InteractionEvent::ClearSelection => self.selected = None,
        }
        InteractionOutcome::None
    }

    /// Drops ids that did not survive a rebuild.
    pub(in crate::app) fn reconcile(&mut self, graph: &DisplayGraph) {
        if self
            .selected
            .as_deref()
            .is_some_and(|id| graph.index_of(id).is_none())
        {
            self.selected = None;
        }
        if self
            .hovered
            .as_deref()
            .is_some_and(|id| graph.index_of(id).is_none())
        {
            self.hovered = None;
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.camera.zoom_at(rect, pointer, zoom_factor);
    }

    pub(in crate::app) fn hovered_index(
        pointer: Option<Pos2>,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        const HIT_SLOP: f32 = 3.0;

        pointer.and_then(|pointer| {
            visible_indices
                .iter()
                .filter_map(|&index| {
                    let distance = screen_positions[index].distance(pointer);
                    (distance <= screen_radii[index] + HIT_SLOP).then_some((index, distance))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index)
        })
    }

    pub(in crate::app) fn apply_interaction(&mut self, event: InteractionEvent) {
        if let InteractionOutcome::NavigateToMemory(id) = self.interaction.apply(event) {
            self.pending_navigation.push(id);
        }
    }

    pub(in crate::app) fn select_node(&mut self, id: &str) {
        if self.interaction.selected.as_deref() == Some(id) {
            return;
        }
        if let Some(node) = self.graph.node(id) {
            let is_entity = node.is_entity();
            self.apply_interaction(InteractionEvent::ClickNode {
                id: id.to_owned(),
                is_entity,
            });
        }
    }
}
