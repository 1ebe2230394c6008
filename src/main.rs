use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use render::{compose_raster, RouteOverlay};
use roadgraph::{find_route, load_graph, Route, SearchOptions, Strategy};
use serde::Serialize;
use std::path::PathBuf;
use tileindex::config::{MAX_DEPTH, ROOT_LRLAT, ROOT_LRLON, ROOT_ULLAT, ROOT_ULLON, TILE_SIZE};
use tileindex::{plan_raster, BoundingBox, DirCatalog, IndexConfig, TileIndex};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the raster covering a bounding box to a PNG file
    Raster {
        #[command(flatten)]
        index: IndexArgs,

        #[arg(long, allow_hyphen_values = true)]
        ullat: f64,

        #[arg(long, allow_hyphen_values = true)]
        ullon: f64,

        #[arg(long, allow_hyphen_values = true)]
        lrlat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lrlon: f64,

        /// Viewport width in pixels
        #[arg(short, long)]
        width: f64,

        /// Viewport height in pixels
        #[arg(long)]
        height: f64,

        /// Road graph used for --route-from/--route-to
        #[arg(long)]
        graph: Option<PathBuf>,

        /// Route start as lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "graph", requires = "route_to")]
        route_from: Option<(f64, f64)>,

        /// Route end as lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "route_from")]
        route_to: Option<(f64, f64)>,

        /// Output PNG file
        #[arg(short, long, default_value = "raster.png")]
        output: PathBuf,
    },

    /// Compute the shortest route between two points
    Route {
        /// Road graph (.osm, .xml, .pbf or .json)
        #[arg(long)]
        graph: PathBuf,

        /// Start as lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: (f64, f64),

        /// End as lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: (f64, f64),

        /// Use plain Dijkstra instead of A*
        #[arg(long)]
        dijkstra: bool,

        #[arg(long)]
        max_expansions: Option<usize>,
    },

    /// Build the tile index and print the number of tiles per level
    Index {
        #[command(flatten)]
        index: IndexArgs,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// Directory holding the tile images
    #[arg(long, default_value = "img")]
    img_dir: PathBuf,

    #[arg(long, default_value_t = ROOT_ULLAT, allow_hyphen_values = true)]
    root_ullat: f64,

    #[arg(long, default_value_t = ROOT_ULLON, allow_hyphen_values = true)]
    root_ullon: f64,

    #[arg(long, default_value_t = ROOT_LRLAT, allow_hyphen_values = true)]
    root_lrlat: f64,

    #[arg(long, default_value_t = ROOT_LRLON, allow_hyphen_values = true)]
    root_lrlon: f64,

    #[arg(long, default_value_t = MAX_DEPTH)]
    max_depth: u32,

    #[arg(long, default_value_t = TILE_SIZE)]
    tile_size: u32,
}

impl IndexArgs {
    fn build(&self) -> Result<(TileIndex, DirCatalog)> {
        let catalog = DirCatalog::new(&self.img_dir)
            .with_context(|| format!("Error opening tile directory {}", self.img_dir.display()))?;
        let config = IndexConfig {
            root: BoundingBox::new(self.root_ullat, self.root_ullon, self.root_lrlat, self.root_lrlon),
            max_depth: self.max_depth,
            tile_size: self.tile_size,
        };
        let index = TileIndex::build(config, &catalog).context("Error building tile index")?;
        Ok((index, catalog))
    }
}

/// Raster metadata printed after rendering.
#[derive(Serialize)]
struct RasterSummary {
    raster_ul_lon: f64,
    raster_ul_lat: f64,
    raster_lr_lon: f64,
    raster_lr_lat: f64,
    raster_width: u32,
    raster_height: u32,
    depth: u32,
    tiles: usize,
    route_segments: usize,
    output: PathBuf,
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lon but got '{}'", s))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| format!("bad latitude '{}': {}", lat, e))?;
    let lon = lon.trim().parse::<f64>().map_err(|e| format!("bad longitude '{}': {}", lon, e))?;
    Ok((lat, lon))
}

fn render_raster(
    index: &IndexArgs,
    query: BoundingBox,
    width: f64,
    graph: Option<&PathBuf>,
    route_from: Option<(f64, f64)>,
    route_to: Option<(f64, f64)>,
    output: PathBuf,
) -> Result<()> {
    let (tile_index, catalog) = index.build()?;
    let plan = plan_raster(&tile_index, &query, width).context("Error planning raster")?;
    let mut image = compose_raster(&plan, &catalog).context("Error composing raster")?;

    let mut route_segments = 0;
    if let (Some(graph_path), Some(from), Some(to)) = (graph, route_from, route_to) {
        let graph = load_graph(graph_path)
            .with_context(|| format!("Error loading graph {}", graph_path.display()))?;
        let path = find_route(&graph, from.0, from.1, to.0, to.1, &SearchOptions::default())
            .context("Error computing route")?;
        route_segments = RouteOverlay::default().draw(&mut image, &plan, &Route::from(path), &graph);
    }

    image
        .save(&output)
        .with_context(|| format!("Error writing {}", output.display()))?;
    info!("Raster written to {}", output.display());

    let summary = RasterSummary {
        raster_ul_lon: plan.bbox.ullon,
        raster_ul_lat: plan.bbox.ullat,
        raster_lr_lon: plan.bbox.lrlon,
        raster_lr_lat: plan.bbox.lrlat,
        raster_width: plan.width,
        raster_height: plan.height,
        depth: plan.depth,
        tiles: plan.tiles.len(),
        route_segments,
        output,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Raster {
            index,
            ullat,
            ullon,
            lrlat,
            lrlon,
            width,
            height: _,
            graph,
            route_from,
            route_to,
            output,
        } => {
            let query = BoundingBox::new(ullat, ullon, lrlat, lrlon);
            render_raster(&index, query, width, graph.as_ref(), route_from, route_to, output)?;
        }
        Commands::Route {
            graph,
            from,
            to,
            dijkstra,
            max_expansions,
        } => {
            let graph = load_graph(&graph)
                .with_context(|| format!("Error loading graph {}", graph.display()))?;
            let options = SearchOptions {
                strategy: if dijkstra { Strategy::Dijkstra } else { Strategy::AStar },
                max_expansions,
            };
            let path = find_route(&graph, from.0, from.1, to.0, to.1, &options)
                .context("Error computing route")?;
            let route = Route::from(path);
            println!(
                "{}",
                route
                    .nodes()
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            );
            println!("{:.1} m over {} segments", route.length_meters(&graph), route.segment_count());
        }
        Commands::Index { index } => {
            let (tile_index, _) = index.build()?;
            for (depth, count) in tile_index.level_counts().iter().enumerate() {
                println!("depth {}: {} tiles", depth, count);
            }
            println!("{} tiles in total", tile_index.len());
        }
    }

    Ok(())
}
