use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::memory::Layer;

use super::super::graph::DisplayGraph;
use super::super::render_utils::layer_color;
use super::super::{RESULT_LIMIT_RANGE, ViewModel};

const SEARCH_RESULT_ROWS: usize = 12;

/// Search hits ordered by fuzzy score, best first; ties keep graph order.
fn ranked_search_results(
    graph: &DisplayGraph,
    matches: impl IntoIterator<Item = usize>,
    query: &str,
) -> Vec<(usize, i64)> {
    let matcher = SkimMatcherV2::default().ignore_case();
    let query = query.trim();

    let mut ranked = matches
        .into_iter()
        .map(|index| {
            let score = matcher
                .fuzzy_match(&graph.nodes[index].label, query)
                .unwrap_or_default();
            (index, score)
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_filters(ui);
        ui.separator();
        self.draw_view_controls(ui);
        ui.separator();

        ui.label(RichText::new("Current graph").strong());
        ui.label(self.graph_stats_text());
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search labels")
            .on_hover_text("Dims every node whose label does not contain the query.");
        ui.text_edit_singleline(&mut self.filters.search_query);

        let Some(matches) = self.cached_search_matches() else {
            return;
        };
        if matches.is_empty() {
            ui.small("No node label contains this text.");
            return;
        }

        let ranked = ranked_search_results(
            &self.graph,
            matches.iter().copied(),
            &self.filters.search_query,
        );
        ui.small(format!("{} matching nodes", ranked.len()));

        let mut clicked = None;
        for &(index, _) in ranked.iter().take(SEARCH_RESULT_ROWS) {
            let node = &self.graph.nodes[index];
            let response = ui.link(node.label.as_str()).on_hover_text(node.id.as_str());
            if response.clicked() {
                clicked = Some(node.id.clone());
            }
        }
        if let Some(id) = clicked {
            self.select_node(&id);
        }
    }

    fn draw_filters(&mut self, ui: &mut Ui) {
        let limit_slider = ui
            .add(
                egui::Slider::new(&mut self.filters.result_limit, RESULT_LIMIT_RANGE)
                    .logarithmic(true)
                    .text("Result limit"),
            )
            .on_hover_text("How many memories to fetch. Changing it refetches the data.");
        if limit_slider.drag_stopped() || (limit_slider.changed() && !limit_slider.dragged()) {
            self.refetch_requested = true;
        }

        let confidence_slider = ui
            .add(
                egui::Slider::new(&mut self.filters.min_confidence, 0.0..=1.0)
                    .step_by(0.05)
                    .text("Min confidence"),
            )
            .on_hover_text("Hide direct edges below this confidence.");
        if confidence_slider.changed() {
            self.graph_dirty = true;
        }

        ui.add_space(4.0);
        ui.label("Layers");
        ui.horizontal_wrapped(|ui| {
            for layer in Layer::ALL {
                let mut enabled = self.filters.enabled_layers.contains(&layer);
                let is_last = enabled && self.filters.enabled_layers.len() == 1;
                let text = RichText::new(layer.label()).color(layer_color(layer));
                let response = ui
                    .add_enabled(!is_last, egui::Checkbox::new(&mut enabled, text))
                    .on_disabled_hover_text("At least one layer stays enabled.");
                if response.changed() {
                    if enabled {
                        self.filters.enabled_layers.insert(layer);
                    } else {
                        self.filters.enabled_layers.remove(&layer);
                    }
                    self.graph_dirty = true;
                }
            }
        });
    }

    fn draw_view_controls(&mut self, ui: &mut Ui) {
        ui.add(
            egui::Slider::new(&mut self.label_zoom_threshold, 0.5..=8.0)
                .step_by(0.1)
                .text("Label zoom"),
        )
        .on_hover_text("Memory labels appear once the zoom exceeds this value.");

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep ticking the force layout every frame.");
        ui.checkbox(&mut self.show_fps, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.horizontal_wrapped(|ui| {
            if ui.button("Reheat").clicked() {
                self.layout.reheat();
            }
            if ui.button("Fit view").clicked() {
                self.fit_requested = true;
            }
            if ui.button("Reset zoom").clicked() {
                self.camera.zoom_to(1.0, 300.0);
            }
            let pinned = self.layout.pinned_count();
            if ui
                .add_enabled(pinned > 0, egui::Button::new(format!("Release pins ({pinned})")))
                .clicked()
            {
                self.layout.release_all();
            }
        });
        ui.small(format!("zoom {:.2}, alpha {:.3}", self.camera.zoom(), self.layout.alpha()));
    }
}
