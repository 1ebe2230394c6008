use log::info;

use crate::{
    haversine_meters, nearest_node, shortest_path, GraphError, GraphNode, Path, RoadGraph,
    SearchOptions, StatusOr,
};

/// A computed route: the ordered node ids of a shortest path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Route {
    nodes: Vec<i64>,
}

impl Route {
    pub fn new(nodes: Vec<i64>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[i64] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of line segments drawn for this route.
    pub fn segment_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Resolved route nodes, skipping ids the graph doesn't know.
    pub fn points<'a>(&'a self, graph: &'a RoadGraph) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.nodes.iter().filter_map(move |&id| graph.node(id))
    }

    /// Great-circle length of the route in meters.
    pub fn length_meters(&self, graph: &RoadGraph) -> f64 {
        let points: Vec<&GraphNode> = self.points(graph).collect();
        points
            .windows(2)
            .map(|w| haversine_meters(w[0].lat, w[0].lon, w[1].lat, w[1].lon))
            .sum()
    }
}

impl From<Path> for Route {
    fn from(path: Path) -> Self {
        Self::new(path.nodes)
    }
}

/// Snaps both endpoints to their nearest graph nodes and searches between them.
pub fn find_route(
    graph: &RoadGraph,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
    options: &SearchOptions,
) -> StatusOr<Path> {
    let start = nearest_node(graph, start_lat, start_lon).ok_or(GraphError::EmptyGraph)?;
    let goal = nearest_node(graph, end_lat, end_lon).ok_or(GraphError::EmptyGraph)?;
    info!(
        "Routing ({}, {}) -> ({}, {}) between nodes {} and {}",
        start_lat, start_lon, end_lat, end_lon, start.id, goal.id
    );
    shortest_path(graph, start.id, goal.id, options)
}
