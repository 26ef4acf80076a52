mod app;
mod memory;
mod text;
mod util;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail, ensure};
use clap::{ArgGroup, Parser};
use log::info;

use app::{AppConfig, RESULT_LIMIT_RANGE};
use memory::{DataSource, Layer};

#[derive(Debug, Parser)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["graph_file", "fetch_cmd"])))]
struct Args {
    /// JSON document with `nodes`, `edges` and `entities` arrays.
    #[arg(long, value_name = "PATH")]
    graph_file: Option<PathBuf>,

    /// Shell command printing the JSON document; `{limit}` is substituted.
    #[arg(long, value_name = "TEMPLATE")]
    fetch_cmd: Option<String>,

    /// Number of memories to fetch.
    #[arg(long, default_value_t = 500)]
    limit: usize,

    /// Hide direct edges below this confidence.
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f32,

    /// Comma-separated layers to show, e.g. `project,session`. Defaults to all.
    #[arg(long, value_delimiter = ',')]
    layers: Vec<String>,

    /// Zoom above which every memory label is drawn.
    #[arg(long, default_value_t = 2.5)]
    label_zoom_threshold: f32,

    /// Command run when a memory is opened; `{id}` is substituted.
    #[arg(long, value_name = "TEMPLATE")]
    on_navigate: Option<String>,
}

fn parse_layers(names: &[String]) -> Result<BTreeSet<Layer>> {
    let mut layers = BTreeSet::new();
    for name in names.iter().filter(|name| !name.trim().is_empty()) {
        let Some(layer) = Layer::parse(name) else {
            bail!("unknown layer {name:?}; expected one of IDENTITY, PROJECT, SESSION, TASK");
        };
        layers.insert(layer);
    }

    if layers.is_empty() {
        layers.extend(Layer::ALL);
    }
    Ok(layers)
}

fn build_config(args: Args) -> Result<AppConfig> {
    let source = match (args.graph_file, args.fetch_cmd) {
        (Some(path), None) => DataSource::File(path),
        (None, Some(command)) => DataSource::Command(command),
        _ => bail!("pass exactly one of --graph-file or --fetch-cmd"),
    };

    ensure!(
        RESULT_LIMIT_RANGE.contains(&args.limit),
        "--limit must be within {}..={}",
        RESULT_LIMIT_RANGE.start(),
        RESULT_LIMIT_RANGE.end()
    );
    ensure!(
        (0.0..=1.0).contains(&args.min_confidence),
        "--min-confidence must be within 0..=1"
    );
    ensure!(
        args.label_zoom_threshold.is_finite() && args.label_zoom_threshold > 0.0,
        "--label-zoom-threshold must be a positive number"
    );

    Ok(AppConfig {
        source,
        result_limit: args.limit,
        min_confidence: args.min_confidence,
        layers: parse_layers(&args.layers).context("invalid --layers")?,
        label_zoom_threshold: args.label_zoom_threshold,
        on_navigate: args.on_navigate,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = build_config(Args::parse()).context("invalid command line")?;
    info!("starting memgraph on {}", config.source.describe());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "memgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::MemGraphApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
