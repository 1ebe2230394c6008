//! Road network graph with nearest-node lookup and shortest-path search.

use std::path::PathBuf;

use thiserror::Error;

pub mod graph;
pub mod loader;
pub mod nearest;
pub mod route;
pub mod search;

pub use graph::{haversine_meters, GraphBuilder, GraphFile, GraphNode, RoadGraph};
pub use loader::load_graph;
pub use nearest::nearest_node;
pub use route::{find_route, Route};
pub use search::{shortest_path, Path, SearchOptions, Strategy};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse OSM XML: {0}")]
    XmlError(String),

    #[error("OSM error: {0}")]
    OsmError(String),

    #[error("Failed to parse graph JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported graph file: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Duplicate node id {0}")]
    DuplicateNode(i64),

    #[error("Unknown node id {0}")]
    UnknownNode(i64),

    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("No path from node {from} to node {to}")]
    NoPath { from: i64, to: i64 },

    #[error("Search gave up after expanding {0} nodes")]
    SearchLimitExceeded(usize),
}

pub type StatusOr<T> = Result<T, GraphError>;
