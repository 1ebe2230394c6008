//! Turns raster plans into images: tile decoding, stitching, route overlay and PNG
//! encoding.

use std::io::Cursor;

use image::{ImageOutputFormat, RgbImage};
use log::warn;
use thiserror::Error;
use tileindex::{DirCatalog, IndexError, TileId};

pub mod compose;
pub mod overlay;

pub use compose::compose_raster;
pub use overlay::{RouteOverlay, ROUTE_COLOR, ROUTE_STROKE_WIDTH};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Tile index error: {0}")]
    IndexError(#[from] IndexError),

    #[error("No image for tile '{0}'")]
    MissingTile(TileId),
}

pub type StatusOr<T> = Result<T, RenderError>;

/// Decoded pixels for catalog tiles.
pub trait TileSource: Send + Sync {
    fn load(&self, id: &TileId, tile_size: u32) -> StatusOr<RgbImage>;
}

impl TileSource for DirCatalog {
    fn load(&self, id: &TileId, tile_size: u32) -> StatusOr<RgbImage> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(RenderError::MissingTile(id.clone()));
        }
        let image = image::open(&path)?.to_rgb8();
        if image.width() != tile_size || image.height() != tile_size {
            warn!(
                "Tile {} is {}x{}, expected {}x{}",
                path.display(),
                image.width(),
                image.height(),
                tile_size,
                tile_size
            );
        }
        Ok(image)
    }
}

pub fn encode_png(image: &RgbImage) -> StatusOr<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_dir_catalog_loads_tiles() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .save(dir.path().join("root.png"))
            .unwrap();
        let catalog = DirCatalog::new(dir.path()).unwrap();

        let tile = catalog.load(&TileId::root(), 4).unwrap();
        assert_eq!(tile.dimensions(), (4, 4));
        assert_eq!(*tile.get_pixel(3, 3), Rgb([1, 2, 3]));

        assert!(matches!(
            catalog.load(&TileId::parse("1").unwrap(), 4),
            Err(RenderError::MissingTile(_))
        ));
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let image = RgbImage::from_pixel(3, 2, Rgb([9, 8, 7]));
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded, image);
    }
}
