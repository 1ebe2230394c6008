use crate::{GraphNode, RoadGraph};

/// Node closest to (lat, lon) by planar distance in degrees. Scans every node in
/// graph order; on ties the node seen first wins. `None` only for an empty graph.
pub fn nearest_node(graph: &RoadGraph, lat: f64, lon: f64) -> Option<&GraphNode> {
    let mut closest: Option<(&GraphNode, f64)> = None;
    for node in graph.nodes() {
        let dist = node.distance_to_point(lat, lon);
        if closest.map_or(true, |(_, min_distance)| dist < min_distance) {
            closest = Some((node, dist));
        }
    }
    closest.map(|(node, _)| node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;

    fn graph(points: &[(i64, f64, f64)]) -> RoadGraph {
        let mut builder = GraphBuilder::new();
        for &(id, lat, lon) in points {
            builder.add_node(id, lat, lon).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_picks_closest() {
        let g = graph(&[(1, 0.0, 0.0), (2, 10.0, 10.0)]);
        assert_eq!(nearest_node(&g, 1.0, 1.0).unwrap().id, 1);
        assert_eq!(nearest_node(&g, 6.0, 6.0).unwrap().id, 2);
    }

    #[test]
    fn test_tie_goes_to_first_node() {
        let g = graph(&[(7, 0.0, 2.0), (3, 0.0, -2.0)]);
        assert_eq!(nearest_node(&g, 0.0, 0.0).unwrap().id, 7);
    }

    #[test]
    fn test_exact_hit() {
        let g = graph(&[(1, 37.87, -122.26), (2, 37.86, -122.25)]);
        assert_eq!(nearest_node(&g, 37.86, -122.25).unwrap().id, 2);
    }

    #[test]
    fn test_empty_graph() {
        let g = GraphBuilder::new().build();
        assert!(nearest_node(&g, 0.0, 0.0).is_none());
    }
}
