use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::debug;
use ordered_float::OrderedFloat;

use crate::{GraphError, RoadGraph, StatusOr};

/// How the frontier is prioritised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Accumulated distance only.
    Dijkstra,
    /// Accumulated distance plus straight-line distance to the goal.
    #[default]
    AStar,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub strategy: Strategy,
    /// Give up after finalizing this many nodes.
    pub max_expansions: Option<usize>,
}

/// Shortest path as node ids from start to goal, with its total edge length.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub nodes: Vec<i64>,
    pub distance: f64,
}

/// Shortest path between two node ids.
///
/// Nodes may be pushed onto the frontier several times with different priorities;
/// stale entries are skipped when popped because their node is already finalized.
/// The straight-line heuristic never exceeds the true remaining distance since edge
/// weights are straight-line distances themselves, so A* results are optimal too.
pub fn shortest_path(
    graph: &RoadGraph,
    start: i64,
    goal: i64,
    options: &SearchOptions,
) -> StatusOr<Path> {
    let start_idx = graph.index_of(start).ok_or(GraphError::UnknownNode(start))?;
    let goal_idx = graph.index_of(goal).ok_or(GraphError::UnknownNode(goal))?;
    let goal_node = graph.node_at(goal_idx);

    let heuristic = |idx: usize| match options.strategy {
        Strategy::Dijkstra => 0.0,
        Strategy::AStar => graph.node_at(idx).distance_to(goal_node),
    };

    let mut distances: HashMap<usize, f64> = HashMap::new();
    let mut prev_node: HashMap<usize, usize> = HashMap::new();
    let mut finalized: HashSet<usize> = HashSet::new();
    let mut frontier = BinaryHeap::new();

    distances.insert(start_idx, 0.0);
    frontier.push((Reverse(OrderedFloat(heuristic(start_idx))), start_idx));

    while let Some((_, current)) = frontier.pop() {
        if !finalized.insert(current) {
            continue;
        }
        if current == goal_idx {
            debug!(
                "Reached node {} from {} after finalizing {} nodes",
                goal,
                start,
                finalized.len()
            );
            return reconstruct_path(graph, start_idx, goal_idx, &prev_node, distances[&goal_idx]);
        }
        if let Some(limit) = options.max_expansions {
            if finalized.len() > limit {
                return Err(GraphError::SearchLimitExceeded(limit));
            }
        }

        let current_node = graph.node_at(current);
        let current_distance = distances[&current];
        for &next in graph.neighbor_indexes(current) {
            if finalized.contains(&next) {
                continue;
            }
            let next_distance = current_distance + current_node.distance_to(graph.node_at(next));

            let is_better_path = match distances.get(&next) {
                Some(&existing) => next_distance < existing,
                None => true,
            };

            if is_better_path {
                distances.insert(next, next_distance);
                prev_node.insert(next, current);
                frontier.push((Reverse(OrderedFloat(next_distance + heuristic(next))), next));
            }
        }
    }

    debug!("Frontier exhausted without reaching node {} from {}", goal, start);
    Err(GraphError::NoPath { from: start, to: goal })
}

fn reconstruct_path(
    graph: &RoadGraph,
    start_idx: usize,
    goal_idx: usize,
    prev_node: &HashMap<usize, usize>,
    distance: f64,
) -> StatusOr<Path> {
    let mut path = Vec::new();
    let mut current = goal_idx;

    while current != start_idx {
        path.push(graph.node_at(current).id);
        match prev_node.get(&current) {
            Some(&prev) => current = prev,
            None => {
                return Err(GraphError::NoPath {
                    from: graph.node_at(start_idx).id,
                    to: graph.node_at(goal_idx).id,
                })
            }
        }
    }

    path.push(graph.node_at(start_idx).id);
    path.reverse();
    Ok(Path { nodes: path, distance })
}
