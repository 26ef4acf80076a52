use std::path::PathBuf;

use thiserror::Error;

/// Failures reaching or decoding the memory graph data source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read graph file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn fetch command `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("fetch command `{command}` produced output that is not valid UTF-8")]
    Utf8 { command: String },

    #[error("invalid graph payload: {0}")]
    Parse(String),
}
