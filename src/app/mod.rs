use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::{self, Context};
use log::{debug, info, warn};

use crate::memory::{DataSource, FetchError, Layer, RawDataset, fill_template, spawn_detached};

mod camera;
mod graph;
mod highlight;
mod physics;
mod render_utils;
mod ui;

use camera::Camera;
use graph::{DisplayGraph, FilterParams, InteractionState};
use physics::LayoutEngine;
use ui::FpsCounter;

/// Memories a single fetch may ask for.
pub const RESULT_LIMIT_RANGE: RangeInclusive<usize> = 50..=5000;

/// Startup settings collected from the command line.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub source: DataSource,
    pub result_limit: usize,
    pub min_confidence: f32,
    pub layers: BTreeSet<Layer>,
    pub label_zoom_threshold: f32,
    /// Shell command template run with `{id}` when a memory is opened.
    pub on_navigate: Option<String>,
}

pub struct MemGraphApp {
    source_label: String,
    on_navigate: Option<String>,
    label_zoom_threshold: f32,
    /// Filters to seed the next view model; kept in sync when one is dropped.
    filters: FilterParams,
    loader: Loader,
    state: AppState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(FetchError),
}

struct FetchResponse {
    token: u64,
    result: Result<RawDataset, FetchError>,
}

/// Runs fetches on worker threads. Every request gets a fresh token and only
/// the response carrying the latest token is delivered.
struct Loader {
    source: DataSource,
    tx: Sender<FetchResponse>,
    rx: Receiver<FetchResponse>,
    latest_token: u64,
    in_flight: bool,
}

struct ViewModel {
    dataset: RawDataset,
    filters: FilterParams,
    graph: DisplayGraph,
    graph_dirty: bool,
    render_graph_revision: u64,
    layout: LayoutEngine,
    camera: Camera,
    interaction: InteractionState,
    search_match_cache: Option<SearchMatchCache>,
    pending_fit: bool,
    fit_requested: bool,
    pending_navigation: Vec<String>,
    refetch_requested: bool,
    dragging: Option<String>,
    live_physics: bool,
    label_zoom_threshold: f32,
    show_fps: bool,
    fps: FpsCounter,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Option<Arc<HashSet<usize>>>,
}

/// Nodes and edges that stay at full weight while something is selected.
struct HighlightState {
    active_nodes: HashSet<usize>,
    active_edges: HashSet<usize>,
}

/// Force simulation tuning shared by every layout run.
#[derive(Clone, Copy, Debug)]
struct PhysicsConfig {
    alpha_min: f32,
    alpha_decay: f32,
    velocity_decay: f32,
    theta: f32,
    distance_max: f32,
    center_strength: f32,
    hub_link_distance: f32,
    direct_link_distance: f32,
    hub_link_strength: f32,
    warmup_ticks: usize,
    cooldown_ticks: usize,
}

impl Loader {
    fn new(source: DataSource) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            latest_token: 0,
            in_flight: false,
        }
    }

    fn begin(&mut self) -> u64 {
        self.latest_token += 1;
        self.in_flight = true;
        self.latest_token
    }

    /// Starts a fetch that supersedes any fetch still running.
    fn request(&mut self, limit: usize) -> u64 {
        let token = self.begin();
        info!(
            "fetch #{token} started: limit {limit} from {}",
            self.source.describe()
        );

        let tx = self.tx.clone();
        let source = self.source.clone();
        thread::spawn(move || {
            let result = source.fetch_graph(limit);
            let _ = tx.send(FetchResponse { token, result });
        });

        token
    }

    /// The loader keeps a sender of its own, so the channel never disconnects.
    fn poll(&mut self) -> Option<Result<RawDataset, FetchError>> {
        while let Ok(response) = self.rx.try_recv() {
            if response.token == self.latest_token {
                self.in_flight = false;
                match &response.result {
                    Ok(dataset) => info!(
                        "fetch #{} finished: {} memories, {} edges",
                        response.token,
                        dataset.node_count(),
                        dataset.edge_count()
                    ),
                    Err(error) => warn!("fetch #{} failed: {error}", response.token),
                }
                return Some(response.result);
            }
            debug!(
                "discarding stale fetch #{} (latest is #{})",
                response.token, self.latest_token
            );
        }
        None
    }

    fn is_loading(&self) -> bool {
        self.in_flight
    }
}

impl MemGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let filters = FilterParams {
            result_limit: config.result_limit,
            min_confidence: config.min_confidence,
            enabled_layers: config.layers,
            search_query: String::new(),
        };

        let mut loader = Loader::new(config.source.clone());
        loader.request(filters.result_limit);

        Self {
            source_label: config.source.describe(),
            on_navigate: config.on_navigate,
            label_zoom_threshold: config.label_zoom_threshold,
            filters,
            loader,
            state: AppState::Loading,
        }
    }

    fn apply_fetch_result(&mut self, result: Result<RawDataset, FetchError>) {
        let previous = std::mem::replace(&mut self.state, AppState::Loading);
        self.state = match (previous, result) {
            (AppState::Ready(mut model), Ok(dataset)) => {
                model.replace_dataset(dataset);
                AppState::Ready(model)
            }
            (AppState::Ready(model), Err(error)) => {
                self.filters = model.filters.clone();
                AppState::Error(error)
            }
            (_, Ok(dataset)) => AppState::Ready(Box::new(ViewModel::new(
                dataset,
                self.filters.clone(),
                self.label_zoom_threshold,
            ))),
            (_, Err(error)) => AppState::Error(error),
        };
    }

    fn navigate(&self, id: &str) {
        info!("navigate to memory {id}");
        let Some(template) = &self.on_navigate else {
            return;
        };
        if let Err(error) = spawn_detached(&fill_template(template, "id", id)) {
            warn!("could not open memory {id}: {error}");
        }
    }
}

impl eframe::App for MemGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if let Some(result) = self.loader.poll() {
            self.apply_fetch_result(result);
        }

        let mut retry = false;
        let mut navigation = Vec::new();

        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading memory graph...");
                        ui.label(self.source_label.as_str());
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the memory graph");
                    ui.add_space(6.0);
                    ui.label(error.to_string());
                    ui.small(format!("source: {}", self.source_label));
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let is_fetching = self.loader.is_loading();
                model.show(ctx, &self.source_label, is_fetching);

                if std::mem::take(&mut model.refetch_requested) {
                    self.loader.request(model.filters.result_limit);
                }
                navigation = std::mem::take(&mut model.pending_navigation);
            }
        }

        for id in &navigation {
            self.navigate(id);
        }

        if retry {
            self.loader.request(self.filters.result_limit);
            self.state = AppState::Loading;
        }

        if self.loader.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
