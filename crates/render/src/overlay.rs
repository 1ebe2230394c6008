use image::{GrayImage, Luma, Rgb, RgbImage, Rgba};
use imageproc::drawing::draw_filled_circle_mut;
use log::debug;
use roadgraph::{RoadGraph, Route};
use tileindex::RasterPlan;

pub const ROUTE_STROKE_WIDTH: f32 = 5.0;
pub const ROUTE_COLOR: Rgba<u8> = Rgba([108, 181, 230, 200]);

/// Draws a route as a thick translucent line over a composed raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteOverlay {
    pub color: Rgba<u8>,
    pub width: f32,
}

impl Default for RouteOverlay {
    fn default() -> Self {
        Self {
            color: ROUTE_COLOR,
            width: ROUTE_STROKE_WIDTH,
        }
    }
}

/// Pixel position of (lat, lon) in the plan's raster. May fall outside the image.
pub fn to_pixel(plan: &RasterPlan, lat: f64, lon: f64) -> (f32, f32) {
    let x = ((lon - plan.bbox.ullon) / plan.lon_per_pixel).floor();
    let y = ((plan.bbox.ullat - lat) / plan.lat_per_pixel).floor();
    (x as f32, y as f32)
}

impl RouteOverlay {
    /// Segment endpoints in raster pixels, one segment per consecutive node pair.
    pub fn segments(
        &self,
        plan: &RasterPlan,
        route: &Route,
        graph: &RoadGraph,
    ) -> Vec<((f32, f32), (f32, f32))> {
        let pixels: Vec<(f32, f32)> = route
            .points(graph)
            .map(|node| to_pixel(plan, node.lat, node.lon))
            .collect();
        pixels.windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Strokes the route onto `image` and returns the number of segments drawn.
    pub fn draw(
        &self,
        image: &mut RgbImage,
        plan: &RasterPlan,
        route: &Route,
        graph: &RoadGraph,
    ) -> usize {
        let segments = self.segments(plan, route, graph);
        if segments.is_empty() {
            return 0;
        }

        // Stroke into a mask first so overlapping segments don't blend twice.
        let mut mask = GrayImage::new(image.width(), image.height());
        for &(start, end) in &segments {
            draw_thick_line_segment_mut(&mut mask, start, end, self.width);
        }

        let alpha = u32::from(self.color[3]);
        for (x, y, m) in mask.enumerate_pixels() {
            if m[0] == 0 {
                continue;
            }
            let Rgb(base) = *image.get_pixel(x, y);
            let mut blended = [0u8; 3];
            for c in 0..3 {
                let over = u32::from(self.color[c]) * alpha;
                let under = u32::from(base[c]) * (255 - alpha);
                blended[c] = ((over + under + 127) / 255) as u8;
            }
            image.put_pixel(x, y, Rgb(blended));
        }

        debug!("Drew route with {} segments", segments.len());
        segments.len()
    }
}

/// Thick line built from filled circles along the segment, which also gives
/// round caps at both ends.
fn draw_thick_line_segment_mut(
    mask: &mut GrayImage,
    start: (f32, f32),
    end: (f32, f32),
    width: f32,
) {
    let ink = Luma([255u8]);
    let radius = (width / 2.0).max(1.0) as i32;
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = (dx * dx + dy * dy).sqrt();

    if length < 0.001 {
        draw_filled_circle_mut(mask, (start.0 as i32, start.1 as i32), radius, ink);
        return;
    }

    let step_size = (radius as f32 * 0.5).max(0.5);
    let num_steps = (length / step_size).ceil() as i32;
    let step_x = dx * step_size / length;
    let step_y = dy * step_size / length;

    for i in 0..=num_steps {
        let t = i as f32;
        let x = start.0 + t * step_x;
        let y = start.1 + t * step_y;
        draw_filled_circle_mut(mask, (x as i32, y as i32), radius, ink);
    }
    draw_filled_circle_mut(mask, (end.0 as i32, end.1 as i32), radius, ink);
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadgraph::GraphBuilder;
    use tileindex::{plan_raster_at, BoundingBox, IndexConfig, MemoryCatalog, TileIndex};

    fn plan() -> RasterPlan {
        let config = IndexConfig {
            root: BoundingBox::new(1.0, 0.0, 0.0, 1.0),
            max_depth: 1,
            tile_size: 64,
        };
        let index = TileIndex::build(config, &MemoryCatalog::complete(1)).unwrap();
        plan_raster_at(&index, 1, &BoundingBox::new(1.0, 0.0, 0.0, 1.0)).unwrap()
    }

    fn graph() -> RoadGraph {
        let mut builder = GraphBuilder::new();
        builder.add_node(1, 0.875, 0.125).unwrap();
        builder.add_node(2, 0.875, 0.875).unwrap();
        builder.add_node(3, 0.125, 0.875).unwrap();
        builder.add_edge(1, 2).unwrap();
        builder.add_edge(2, 3).unwrap();
        builder.build()
    }

    #[test]
    fn test_to_pixel() {
        let plan = plan();
        assert_eq!(plan.width, 128);
        assert_eq!(to_pixel(&plan, 1.0, 0.0), (0.0, 0.0));
        assert_eq!(to_pixel(&plan, 0.5, 0.5), (64.0, 64.0));
        assert_eq!(to_pixel(&plan, 0.996, 0.004), (0.0, 0.0));
    }

    #[test]
    fn test_segment_count() {
        let plan = plan();
        let graph = graph();
        let overlay = RouteOverlay::default();
        let route = Route::new(vec![1, 2, 3]);
        let segments = overlay.segments(&plan, &route, &graph);
        assert_eq!(segments.len(), route.segment_count());
        assert_eq!(segments[0], ((16.0, 16.0), (112.0, 16.0)));
        assert!(overlay.segments(&plan, &Route::new(vec![2]), &graph).is_empty());
    }

    #[test]
    fn test_draw_blends_route_color() {
        let plan = plan();
        let graph = graph();
        let overlay = RouteOverlay::default();
        let mut image = RgbImage::from_pixel(128, 128, Rgb([255, 255, 255]));

        let drawn = overlay.draw(&mut image, &plan, &Route::new(vec![1, 2, 3]), &graph);
        assert_eq!(drawn, 2);

        // on the stroke: 200/255 of the route color over white
        assert_eq!(*image.get_pixel(64, 16), Rgb([140, 197, 235]));
        assert_eq!(*image.get_pixel(112, 64), Rgb([140, 197, 235]));
        // stroke is 5 px wide, so 5 px away is untouched
        assert_eq!(*image.get_pixel(64, 21), Rgb([255, 255, 255]));
        // far from the route
        assert_eq!(*image.get_pixel(20, 80), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_single_node_route_draws_nothing() {
        let plan = plan();
        let graph = graph();
        let mut image = RgbImage::from_pixel(128, 128, Rgb([0, 0, 0]));
        let before = image.clone();
        let drawn = RouteOverlay::default().draw(&mut image, &plan, &Route::new(vec![1]), &graph);
        assert_eq!(drawn, 0);
        assert_eq!(image, before);
    }
}
