use image::{imageops, RgbImage};
use log::debug;
use rayon::prelude::*;
use tileindex::RasterPlan;

use crate::{StatusOr, TileSource};

/// Stitches the plan's tiles into one image of `plan.width` x `plan.height`.
/// Tiles are decoded in parallel; the first failing tile aborts the raster.
pub fn compose_raster(plan: &RasterPlan, source: &dyn TileSource) -> StatusOr<RgbImage> {
    let decoded = plan
        .tiles
        .par_iter()
        .map(|tile| source.load(&tile.id, plan.tile_size).map(|image| (tile, image)))
        .collect::<StatusOr<Vec<_>>>()?;

    let mut raster = RgbImage::new(plan.width, plan.height);
    for (tile, image) in &decoded {
        imageops::replace(&mut raster, image, i64::from(tile.x), i64::from(tile.y));
    }
    debug!(
        "Composed {}x{} raster from {} tiles at depth {}",
        plan.width,
        plan.height,
        decoded.len(),
        plan.depth
    );
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RenderError;
    use image::Rgb;
    use tileindex::{plan_raster_at, BoundingBox, IndexConfig, MemoryCatalog, TileId, TileIndex};

    /// Fills each tile with a color derived from its id.
    struct SolidTiles;

    fn color_of(id: &TileId) -> Rgb<u8> {
        let n: u32 = id.as_str().bytes().map(|b| (b - b'0') as u32).sum();
        Rgb([n as u8 * 10, id.depth() as u8, 0])
    }

    impl TileSource for SolidTiles {
        fn load(&self, id: &TileId, tile_size: u32) -> StatusOr<RgbImage> {
            Ok(RgbImage::from_pixel(tile_size, tile_size, color_of(id)))
        }
    }

    struct NoTiles;

    impl TileSource for NoTiles {
        fn load(&self, id: &TileId, _tile_size: u32) -> StatusOr<RgbImage> {
            Err(RenderError::MissingTile(id.clone()))
        }
    }

    fn index() -> TileIndex {
        let config = IndexConfig {
            root: BoundingBox::new(1.0, 0.0, 0.0, 1.0),
            max_depth: 2,
            tile_size: 8,
        };
        TileIndex::build(config, &MemoryCatalog::complete(2)).unwrap()
    }

    #[test]
    fn test_tiles_land_at_their_offsets() {
        let index = index();
        let plan = plan_raster_at(&index, 1, &BoundingBox::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        let raster = compose_raster(&plan, &SolidTiles).unwrap();
        assert_eq!(raster.dimensions(), (16, 16));
        for tile in &plan.tiles {
            let expected = color_of(&tile.id);
            assert_eq!(*raster.get_pixel(tile.x, tile.y), expected);
            assert_eq!(*raster.get_pixel(tile.x + 7, tile.y + 7), expected);
        }
        // quadrant 4 is the south-east tile
        assert_eq!(*raster.get_pixel(15, 15), color_of(&TileId::parse("4").unwrap()));
    }

    #[test]
    fn test_missing_tile_fails_raster() {
        let index = index();
        let plan = plan_raster_at(&index, 2, &BoundingBox::new(0.9, 0.1, 0.6, 0.4)).unwrap();
        assert!(matches!(
            compose_raster(&plan, &NoTiles),
            Err(RenderError::MissingTile(_))
        ));
    }
}
