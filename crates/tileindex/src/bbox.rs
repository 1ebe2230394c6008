/// Geographic rectangle given by its upper-left and lower-right corners.
/// Longitude is the x axis, latitude the y axis (north up).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub ullat: f64,
    pub ullon: f64,
    pub lrlat: f64,
    pub lrlon: f64,
}

impl BoundingBox {
    pub fn new(ullat: f64, ullon: f64, lrlat: f64, lrlon: f64) -> Self {
        Self { ullat, ullon, lrlat, lrlon }
    }

    pub fn lon_width(&self) -> f64 {
        self.lrlon - self.ullon
    }

    pub fn lat_height(&self) -> f64 {
        self.ullat - self.lrlat
    }

    /// Two boxes intersect unless one lies entirely east, west, north or south of
    /// the other. Shared edges count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.ullon > self.lrlon
            || other.lrlon < self.ullon
            || other.ullat < self.lrlat
            || other.lrlat > self.ullat)
    }

    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lon >= self.ullon && lon <= self.lrlon && lat <= self.ullat && lat >= self.lrlat
    }

    /// Overlapping region of two boxes, if any.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox {
            ullat: self.ullat.min(other.ullat),
            ullon: self.ullon.max(other.ullon),
            lrlat: self.lrlat.max(other.lrlat),
            lrlon: self.lrlon.min(other.lrlon),
        })
    }

    /// Quarters of this box in row-major order: top-left, top-right, bottom-left,
    /// bottom-right.
    pub fn quadrants(&self) -> [BoundingBox; 4] {
        let mid_lat = (self.ullat + self.lrlat) / 2.0;
        let mid_lon = (self.ullon + self.lrlon) / 2.0;
        [
            BoundingBox::new(self.ullat, self.ullon, mid_lat, mid_lon),
            BoundingBox::new(self.ullat, mid_lon, mid_lat, self.lrlon),
            BoundingBox::new(mid_lat, self.ullon, self.lrlat, mid_lon),
            BoundingBox::new(mid_lat, mid_lon, self.lrlat, self.lrlon),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> BoundingBox {
        BoundingBox::new(1.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_intersects_overlap_and_disjoint() {
        let a = unit();
        assert!(a.intersects(&BoundingBox::new(0.5, 0.5, -0.5, 1.5)));
        assert!(!a.intersects(&BoundingBox::new(1.0, 2.0, 0.0, 3.0))); // east
        assert!(!a.intersects(&BoundingBox::new(1.0, -3.0, 0.0, -2.0))); // west
        assert!(!a.intersects(&BoundingBox::new(3.0, 0.0, 2.0, 1.0))); // north
        assert!(!a.intersects(&BoundingBox::new(-2.0, 0.0, -3.0, 1.0))); // south
    }

    #[test]
    fn test_touching_edges_intersect() {
        let a = unit();
        assert!(a.intersects(&BoundingBox::new(1.0, 1.0, 0.0, 2.0)));
        assert!(a.intersects(&BoundingBox::new(2.0, 0.0, 1.0, 1.0)));
        // corner contact
        assert!(a.intersects(&BoundingBox::new(0.0, 1.0, -1.0, 2.0)));
    }

    #[test]
    fn test_quadrants_are_row_major() {
        let q = unit().quadrants();
        assert_eq!(q[0], BoundingBox::new(1.0, 0.0, 0.5, 0.5));
        assert_eq!(q[1], BoundingBox::new(1.0, 0.5, 0.5, 1.0));
        assert_eq!(q[2], BoundingBox::new(0.5, 0.0, 0.0, 0.5));
        assert_eq!(q[3], BoundingBox::new(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn test_intersection() {
        let a = unit();
        let b = BoundingBox::new(2.0, 0.5, 0.5, 4.0);
        assert_eq!(a.intersection(&b), Some(BoundingBox::new(1.0, 0.5, 0.5, 1.0)));
        assert_eq!(a.intersection(&BoundingBox::new(5.0, 5.0, 4.0, 6.0)), None);
    }
}
