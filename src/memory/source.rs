use std::fs;
use std::path::PathBuf;

use log::info;

use super::command::{fill_template, run_shell};
use super::dataset::RawDataset;
use super::error::FetchError;
use super::parse::parse_graph_payload;

/// Where the raw memory graph comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// A JSON document on disk.
    File(PathBuf),
    /// A shell command printing the JSON document; `{limit}` is substituted.
    Command(String),
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Command(template) => format!("`{template}`"),
        }
    }

    pub fn fetch_graph(&self, limit: usize) -> Result<RawDataset, FetchError> {
        let raw = match self {
            Self::File(path) => fs::read_to_string(path).map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?,
            Self::Command(template) => run_shell(&fill_template(template, "limit", &limit.to_string()))?,
        };

        let mut dataset = parse_graph_payload(&raw)?;
        dataset.truncate_nodes(limit);
        info!(
            "fetched {} memories, {} edges, {} entities from {}",
            dataset.node_count(),
            dataset.edge_count(),
            dataset.entities.len(),
            self.describe()
        );
        Ok(dataset)
    }
}
