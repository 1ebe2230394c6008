use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{GraphError, StatusOr};

/// An intersection or way point of the road network
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl GraphNode {
    pub fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }

    /// Planar distance in degrees, treating lon/lat as x/y. This is the edge weight
    /// of the graph.
    pub fn distance_to(&self, other: &GraphNode) -> f64 {
        self.distance_to_point(other.lat, other.lon)
    }

    pub fn distance_to_point(&self, lat: f64, lon: f64) -> f64 {
        let dlon = self.lon - lon;
        let dlat = self.lat - lat;
        (dlon * dlon + dlat * dlat).sqrt()
    }
}

/// Calculate distance between two lat/lng points in meters
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let earth_radius = 6371000.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin() * (dlat / 2.0).sin()
        + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin() * (dlng / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    earth_radius * c
}

/// Serialized form of a graph: nodes plus undirected edges as id pairs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFile {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<(i64, i64)>,
}

/// Immutable undirected road graph.
///
/// Nodes keep the order in which they were added; [`RoadGraph::nodes`] and every
/// scan over the graph see them in that order.
#[derive(Clone, Debug, Default)]
pub struct RoadGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<i64, usize>,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl RoadGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: i64) -> Option<&GraphNode> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn neighbors(&self, id: i64) -> impl Iterator<Item = &GraphNode> + '_ {
        self.index
            .get(&id)
            .into_iter()
            .flat_map(move |&idx| self.adjacency[idx].iter().map(move |&n| &self.nodes[n]))
    }

    /// Every edge once, as (node, neighbor) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> + '_ {
        self.adjacency.iter().enumerate().flat_map(move |(idx, neighbors)| {
            neighbors
                .iter()
                .filter(move |&&n| idx < n)
                .map(move |&n| (&self.nodes[idx], &self.nodes[n]))
        })
    }

    pub fn to_file(&self) -> GraphFile {
        GraphFile {
            nodes: self.nodes.clone(),
            edges: self.edges().map(|(a, b)| (a.id, b.id)).collect(),
        }
    }

    pub(crate) fn index_of(&self, id: i64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub(crate) fn node_at(&self, idx: usize) -> &GraphNode {
        &self.nodes[idx]
    }

    pub(crate) fn neighbor_indexes(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }
}

/// Collects nodes and edges, then freezes them into a [`RoadGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    index: HashMap<i64, usize>,
    edges: Vec<(usize, usize)>,
    seen_edges: HashSet<(usize, usize)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: i64, lat: f64, lon: f64) -> StatusOr<()> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(GraphNode::new(id, lat, lon));
        Ok(())
    }

    pub fn contains_node(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Connects two known nodes. Self loops and repeated edges are ignored; the
    /// return value tells whether a new edge was added.
    pub fn add_edge(&mut self, a: i64, b: i64) -> StatusOr<bool> {
        let ia = *self.index.get(&a).ok_or(GraphError::UnknownNode(a))?;
        let ib = *self.index.get(&b).ok_or(GraphError::UnknownNode(b))?;
        if ia == ib {
            return Ok(false);
        }
        let key = (ia.min(ib), ia.max(ib));
        if !self.seen_edges.insert(key) {
            return Ok(false);
        }
        self.edges.push(key);
        Ok(true)
    }

    pub fn build(self) -> RoadGraph {
        self.freeze(false)
    }

    /// Like [`GraphBuilder::build`] but drops nodes without any edge.
    pub fn build_connected(self) -> RoadGraph {
        self.freeze(true)
    }

    fn freeze(self, connected_only: bool) -> RoadGraph {
        let mut degree = vec![0usize; self.nodes.len()];
        for &(a, b) in &self.edges {
            degree[a] += 1;
            degree[b] += 1;
        }

        // old index -> new index
        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (old, node) in self.nodes.into_iter().enumerate() {
            if connected_only && degree[old] == 0 {
                continue;
            }
            remap[old] = nodes.len();
            nodes.push(node);
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for &(a, b) in &self.edges {
            let (na, nb) = (remap[a], remap[b]);
            adjacency[na].push(nb);
            adjacency[nb].push(na);
        }

        let index = nodes.iter().enumerate().map(|(idx, n)| (n.id, idx)).collect();
        RoadGraph {
            nodes,
            index,
            adjacency,
            edge_count: self.edges.len(),
        }
    }
}

impl TryFrom<GraphFile> for RoadGraph {
    type Error = GraphError;

    fn try_from(file: GraphFile) -> StatusOr<Self> {
        let mut builder = GraphBuilder::new();
        for node in file.nodes {
            builder.add_node(node.id, node.lat, node.lon)?;
        }
        for (a, b) in file.edges {
            builder.add_edge(a, b)?;
        }
        Ok(builder.build())
    }
}
