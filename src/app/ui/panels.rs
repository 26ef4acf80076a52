use eframe::egui::{self, Align, Context, Layout, RichText, Ui};

use crate::memory::{Layer, RawDataset};

use super::super::camera::Camera;
use super::super::graph::{
    DEFAULT_RESULT_LIMIT, DisplayGraph, EdgeKind, FilterParams, InteractionPhase,
    InteractionState,
};
use super::super::physics::LayoutEngine;
use super::super::{PhysicsConfig, ViewModel};
use super::FpsCounter;

impl ViewModel {
    pub(in crate::app) fn new(
        dataset: RawDataset,
        filters: FilterParams,
        label_zoom_threshold: f32,
    ) -> Self {
        Self {
            dataset,
            filters,
            graph: DisplayGraph::default(),
            graph_dirty: true,
            render_graph_revision: 0,
            layout: LayoutEngine::new(PhysicsConfig::default()),
            camera: Camera::default(),
            interaction: InteractionState::default(),
            search_match_cache: None,
            pending_fit: false,
            fit_requested: false,
            pending_navigation: Vec::new(),
            refetch_requested: false,
            dragging: None,
            live_physics: true,
            label_zoom_threshold,
            show_fps: false,
            fps: FpsCounter::default(),
        }
    }

    /// Swaps in a freshly fetched dataset, keeping filters, camera, selection
    /// and the positions of nodes that survive.
    pub(in crate::app) fn replace_dataset(&mut self, dataset: RawDataset) {
        self.dataset = dataset;
        self.dragging = None;
        self.graph_dirty = true;
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, source_label: &str, is_fetching: bool) {
        self.update_fps_counter(ctx);
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("memgraph");
                    ui.separator();
                    ui.label(format!("source: {source_label}"));
                    ui.label(format!(
                        "memories: {} shown / {} fetched",
                        self.graph.memory_count(),
                        self.dataset.node_count()
                    ));
                    ui.label(format!("hubs: {}", self.graph.entity_count()));
                    ui.label(format!("edges: {}", self.graph.edges.len()));

                    let refetch_button =
                        ui.add_enabled(!is_fetching, egui::Button::new("Refetch"));
                    if refetch_button.clicked() {
                        self.refetch_requested = true;
                    }
                    if is_fetching {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        ui.label(self.phase_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    fn phase_text(&self) -> &'static str {
        match self.interaction.phase() {
            InteractionPhase::Idle => "idle",
            InteractionPhase::Hovering => "hovering",
            InteractionPhase::Selected => "selected",
        }
    }

    /// Suggestions for the filters that most likely emptied the graph.
    pub(in crate::app) fn empty_state_hints(&self) -> Vec<String> {
        if self.dataset.nodes.is_empty() {
            return vec!["The data source returned no memories.".to_owned()];
        }

        let mut hints = Vec::new();
        let disabled = Layer::ALL
            .into_iter()
            .filter(|layer| !self.filters.enabled_layers.contains(layer))
            .map(Layer::label)
            .collect::<Vec<_>>();
        if !disabled.is_empty() {
            hints.push(format!("Enable more layers (off: {}).", disabled.join(", ")));
        }
        if self.filters.min_confidence > 0.0 {
            hints.push(format!(
                "Lower the minimum confidence (currently {:.2}).",
                self.filters.min_confidence
            ));
        }
        if self.filters.result_limit < DEFAULT_RESULT_LIMIT {
            hints.push(format!(
                "Raise the result limit (currently {}).",
                self.filters.result_limit
            ));
        }
        if hints.is_empty() {
            hints.push("None of the fetched memories share an edge or an entity.".to_owned());
        }
        hints
    }

    pub(in crate::app) fn draw_empty_state(&self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading("No matching data");
            ui.add_space(6.0);
            ui.label(format!(
                "{} memories fetched, none survive the current filters.",
                self.dataset.node_count()
            ));
            ui.add_space(8.0);
            for hint in self.empty_state_hints() {
                ui.label(RichText::new(hint).italics());
            }
        });
    }

    pub(in crate::app) fn graph_stats_text(&self) -> String {
        format!(
            "{} memories, {} hubs, {} direct / {} hub edges",
            self.graph.memory_count(),
            self.graph.entity_count(),
            self.graph.edge_count(EdgeKind::Direct),
            self.graph.edge_count(EdgeKind::EntityHub)
        )
    }
}
