mod command;
mod dataset;
mod error;
mod parse;
mod source;

pub use command::{fill_template, spawn_detached};
pub use dataset::{Layer, RawDataset, RawEdge, RawEntity, RawMemoryNode, SHARED_LINK_PREFIX};
pub use error::FetchError;
pub use source::DataSource;
