//! Static quad-partition index over pre-rendered map tiles.
//!
//! The index is built once from a [`TileCatalog`] and answers which tiles cover a
//! bounding box at the depth implied by a viewport width. [`plan_raster`] turns that
//! answer into the geometry of the stitched raster.

use thiserror::Error;

pub mod assembly;
pub mod bbox;
pub mod catalog;
pub mod config;
pub mod quadtree;
pub mod resolution;

pub use assembly::{plan_raster, plan_raster_at, PlacedTile, RasterPlan};
pub use bbox::BoundingBox;
pub use catalog::{DirCatalog, MemoryCatalog, TileCatalog, TileId};
pub use config::IndexConfig;
pub use quadtree::{TileIndex, TileNode};
pub use resolution::select_depth;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid index configuration: {0}")]
    InvalidConfig(String),

    #[error("Tile '{parent}' has {present} of 4 children in the catalog")]
    IncompleteLevel { parent: TileId, present: usize },

    #[error("No tiles match query box {0:?}")]
    NoTilesMatch(BoundingBox),

    #[error("Tiles do not form a rectangular grid: {tiles} tiles in {rows} rows")]
    RaggedGrid { tiles: usize, rows: usize },
}

pub type StatusOr<T> = Result<T, IndexError>;
