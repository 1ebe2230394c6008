use crate::{BoundingBox, IndexError, StatusOr};

/// Upper-left latitude of the bundled tile set's root tile.
pub const ROOT_ULLAT: f64 = 37.892195547244356;
pub const ROOT_ULLON: f64 = -122.2998046875;
pub const ROOT_LRLAT: f64 = 37.82280243352756;
pub const ROOT_LRLON: f64 = -122.2119140625;

/// Each tile is 256x256 pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest level for which tiles are pre-rendered.
pub const MAX_DEPTH: u32 = 7;

/// Configuration of the tile index
#[derive(Clone, Debug, PartialEq)]
pub struct IndexConfig {
    pub root: BoundingBox,      // Extent of the root tile
    pub max_depth: u32,         // Deepest level the tree may reach
    pub tile_size: u32,         // Edge length of a (square) tile in pixels
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: BoundingBox::new(ROOT_ULLAT, ROOT_ULLON, ROOT_LRLAT, ROOT_LRLON),
            max_depth: MAX_DEPTH,
            tile_size: TILE_SIZE,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> StatusOr<()> {
        if self.tile_size == 0 {
            return Err(IndexError::InvalidConfig("tile size must be positive".to_string()));
        }
        // 4^max_depth tiles must stay addressable
        if self.max_depth > 30 {
            return Err(IndexError::InvalidConfig(format!(
                "max depth {} exceeds 30",
                self.max_depth
            )));
        }
        let root = &self.root;
        if !(root.lon_width() > 0.0 && root.lat_height() > 0.0) {
            return Err(IndexError::InvalidConfig(format!(
                "root box must have its upper-left corner north-west of its lower-right corner: {:?}",
                root
            )));
        }
        Ok(())
    }
}
