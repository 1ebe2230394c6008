use std::cmp::Ordering;

use log::debug;

use crate::{select_depth, BoundingBox, IndexError, StatusOr, TileId, TileIndex, TileNode};

/// A tile and the pixel offset of its upper-left corner in the raster.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedTile {
    pub id: TileId,
    pub bbox: BoundingBox,
    pub x: u32,
    pub y: u32,
}

/// Geometry of a raster stitched from index tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterPlan {
    pub depth: u32,
    pub tile_size: u32,
    /// Tiles in grid order: rows north to south, west to east within a row.
    pub tiles: Vec<PlacedTile>,
    pub rows: u32,
    pub columns: u32,
    pub width: u32,
    pub height: u32,
    pub bbox: BoundingBox,
    pub lon_per_pixel: f64,
    pub lat_per_pixel: f64,
}

/// North to south, then west to east.
fn grid_order(a: &&TileNode, b: &&TileNode) -> Ordering {
    b.bbox
        .ullat
        .total_cmp(&a.bbox.ullat)
        .then_with(|| a.bbox.ullon.total_cmp(&b.bbox.ullon))
}

/// Allowed drift of a tile corner from its grid position, as a fraction of a tile.
const GRID_TOLERANCE: f64 = 1e-6;

/// Whether sorted `tiles` form a `columns` wide grid of same-sized cells, tile
/// (r, c) sitting r rows south and c columns east of the first one.
fn on_uniform_grid(tiles: &[&TileNode], columns: usize) -> bool {
    let first = tiles[0];
    let dx = first.bbox.lon_width();
    let dy = first.bbox.lat_height();
    tiles.iter().enumerate().all(|(i, tile)| {
        let row = (i / columns) as f64;
        let column = (i % columns) as f64;
        tile.depth == first.depth
            && (tile.bbox.ullon - (first.bbox.ullon + column * dx)).abs() <= dx * GRID_TOLERANCE
            && (tile.bbox.ullat - (first.bbox.ullat - row * dy)).abs() <= dy * GRID_TOLERANCE
    })
}

/// Selects the depth for a `width_px` viewport over `query`, collects the covering
/// tiles and lays them out as a grid.
pub fn plan_raster(index: &TileIndex, query: &BoundingBox, width_px: f64) -> StatusOr<RasterPlan> {
    let depth = select_depth(index.config(), query, width_px);
    plan_raster_at(index, depth, query)
}

pub fn plan_raster_at(index: &TileIndex, depth: u32, query: &BoundingBox) -> StatusOr<RasterPlan> {
    let mut tiles = index.collect_tiles(depth, query);
    if tiles.is_empty() {
        return Err(IndexError::NoTilesMatch(*query));
    }
    tiles.sort_by(grid_order);

    let rows = 1 + tiles
        .windows(2)
        .filter(|pair| pair[1].bbox.ullat < pair[0].bbox.ullat)
        .count();
    if tiles.len() % rows != 0 {
        return Err(IndexError::RaggedGrid { tiles: tiles.len(), rows });
    }
    let columns = tiles.len() / rows;
    if !on_uniform_grid(&tiles, columns) {
        return Err(IndexError::RaggedGrid { tiles: tiles.len(), rows });
    }

    let tile_size = index.config().tile_size;
    let mut placed = Vec::with_capacity(tiles.len());
    let (mut x, mut y) = (0u32, 0u32);
    for (i, tile) in tiles.iter().enumerate() {
        if i > 0 && tile.bbox.ullat < tiles[i - 1].bbox.ullat {
            x = 0;
            y += tile_size;
        }
        placed.push(PlacedTile {
            id: tile.id.clone(),
            bbox: tile.bbox,
            x,
            y,
        });
        x += tile_size;
    }

    let first = tiles[0];
    let last = tiles[tiles.len() - 1];
    let bbox = BoundingBox::new(first.bbox.ullat, first.bbox.ullon, last.bbox.lrlat, last.bbox.lrlon);
    let width = columns as u32 * tile_size;
    let height = rows as u32 * tile_size;

    debug!(
        "Planned {}x{} raster of {} tiles at depth {}",
        width,
        height,
        placed.len(),
        depth
    );

    Ok(RasterPlan {
        depth,
        tile_size,
        tiles: placed,
        rows: rows as u32,
        columns: columns as u32,
        width,
        height,
        bbox,
        lon_per_pixel: bbox.lon_width() / width as f64,
        lat_per_pixel: bbox.lat_height() / height as f64,
    })
}
