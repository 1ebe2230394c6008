use crate::{BoundingBox, IndexConfig};

/// Longitudinal degrees covered by one pixel of a `width_px` wide viewport.
pub fn query_dpp(query: &BoundingBox, width_px: f64) -> f64 {
    (query.lon_width() / width_px).abs()
}

/// Longitudinal degrees per pixel of a tile at `depth`.
pub fn tile_dpp(config: &IndexConfig, depth: u32) -> f64 {
    config.root.lon_width().abs() / (2f64.powi(depth as i32) * config.tile_size as f64)
}

/// Shallowest depth whose tiles are at least as fine as the viewport asks for,
/// clamped to the configured maximum.
///
/// A zero-width query box asks for infinite resolution and gets the maximum depth;
/// a zero pixel width (or NaN input) asks for nothing finer than the root.
pub fn select_depth(config: &IndexConfig, query: &BoundingBox, width_px: f64) -> u32 {
    let dpp = query_dpp(query, width_px);
    let mut depth = 0;
    while depth < config.max_depth && tile_dpp(config, depth) > dpp {
        depth += 1;
    }
    depth
}
