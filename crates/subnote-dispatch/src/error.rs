//! Error types for the subnote-dispatch crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Graph error: {0}")]
    Graph(#[from] subnote_graph::GraphError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
