use std::sync::Arc;

use arc_swap::ArcSwapOption;
use log::{info, warn};
use render::{RouteOverlay, TileSource};
use roadgraph::{find_route, RoadGraph, Route, SearchOptions};
use tileindex::TileIndex;

/// Everything the handlers share. All of it is read-only after startup except the
/// active route, which is swapped atomically as a whole.
pub struct AppState {
    pub index: TileIndex,
    pub tiles: Arc<dyn TileSource>,
    pub graph: RoadGraph,
    pub search: SearchOptions,
    pub overlay: RouteOverlay,
    active_route: ArcSwapOption<Route>,
}

impl AppState {
    pub fn new(
        index: TileIndex,
        tiles: Arc<dyn TileSource>,
        graph: RoadGraph,
        search: SearchOptions,
    ) -> Self {
        Self {
            index,
            tiles,
            graph,
            search,
            overlay: RouteOverlay::default(),
            active_route: ArcSwapOption::empty(),
        }
    }

    pub fn active_route(&self) -> Option<Arc<Route>> {
        self.active_route.load_full()
    }

    pub fn set_route(&self, route: Route) {
        self.active_route.store(Some(Arc::new(route)));
    }

    pub fn clear_route(&self) {
        self.active_route.store(None);
    }

    /// Computes a route between two points and makes it the active one. Any failure
    /// clears the active route; the return value tells whether a route is now set.
    pub fn update_route(&self, start_lat: f64, start_lon: f64, end_lat: f64, end_lon: f64) -> bool {
        match find_route(&self.graph, start_lat, start_lon, end_lat, end_lon, &self.search) {
            Ok(path) if !path.nodes.is_empty() => {
                let route = Route::from(path);
                info!(
                    "Active route has {} nodes, {:.1} m",
                    route.len(),
                    route.length_meters(&self.graph)
                );
                self.set_route(route);
                true
            }
            Ok(_) => {
                self.clear_route();
                false
            }
            Err(e) => {
                warn!("Route search failed: {}", e);
                self.clear_route();
                false
            }
        }
    }
}
