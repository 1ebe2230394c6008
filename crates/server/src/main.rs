mod params;
mod raster;
mod route;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use actix_files as fs;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use roadgraph::{load_graph, GraphBuilder, SearchOptions, Strategy};
use state::AppState;
use tileindex::config::{MAX_DEPTH, ROOT_LRLAT, ROOT_LRLON, ROOT_ULLAT, ROOT_ULLON, TILE_SIZE};
use tileindex::{BoundingBox, DirCatalog, IndexConfig, TileIndex};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Map raster and routing server")]
struct Args {
    /// Directory holding the tile images (root.png, 1.png, ... 4444444.png)
    #[clap(long, default_value = "img")]
    img_dir: PathBuf,

    /// Road graph (.osm, .xml, .pbf or .json); routing is disabled without one
    #[clap(long)]
    graph: Option<PathBuf>,

    /// Directory of static files served at /
    #[clap(long, default_value = "static")]
    static_dir: PathBuf,

    /// Server address to listen on
    #[clap(short, long, default_value = "127.0.0.1:4567")]
    address: String,

    /// Give up a route search after finalizing this many nodes
    #[clap(long)]
    max_expansions: Option<usize>,

    /// Route with plain Dijkstra instead of the default A*
    #[clap(long)]
    dijkstra: bool,

    #[clap(long, default_value_t = ROOT_ULLAT, allow_hyphen_values = true)]
    root_ullat: f64,

    #[clap(long, default_value_t = ROOT_ULLON, allow_hyphen_values = true)]
    root_ullon: f64,

    #[clap(long, default_value_t = ROOT_LRLAT, allow_hyphen_values = true)]
    root_lrlat: f64,

    #[clap(long, default_value_t = ROOT_LRLON, allow_hyphen_values = true)]
    root_lrlon: f64,

    /// Deepest tile level
    #[clap(long, default_value_t = MAX_DEPTH)]
    max_depth: u32,

    /// Tile edge length in pixels
    #[clap(long, default_value_t = TILE_SIZE)]
    tile_size: u32,

    #[clap(long, default_value = "info")]
    log_level: log::LevelFilter,
}

impl Args {
    fn index_config(&self) -> IndexConfig {
        IndexConfig {
            root: BoundingBox::new(self.root_ullat, self.root_ullon, self.root_lrlat, self.root_lrlon),
            max_depth: self.max_depth,
            tile_size: self.tile_size,
        }
    }

    fn search_options(&self) -> SearchOptions {
        let strategy = if self.dijkstra {
            Strategy::Dijkstra
        } else {
            Strategy::AStar
        };
        SearchOptions {
            strategy,
            max_expansions: self.max_expansions,
        }
    }
}

pub(crate) fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Request-Method", "*"))
        .add(("Access-Control-Allow-Headers", "*"))
}

async fn redirect_to_map() -> HttpResponse {
    HttpResponse::MovedPermanently()
        .insert_header((header::LOCATION, "/map.html"))
        .finish()
}

pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(redirect_to_map))
        .route("/raster", web::get().to(raster::raster))
        .route("/route", web::get().to(route::route))
        .route("/clear_route", web::get().to(route::clear_route));
}

fn load_state(args: &Args) -> Result<AppState> {
    let catalog = DirCatalog::new(&args.img_dir)
        .with_context(|| format!("Error opening tile directory {}", args.img_dir.display()))?;
    let index = TileIndex::build(args.index_config(), &catalog).context("Error building tile index")?;

    let graph = match &args.graph {
        Some(path) => load_graph(path)
            .with_context(|| format!("Error loading graph {}", path.display()))?,
        None => {
            warn!("No graph given, routing is disabled");
            GraphBuilder::new().build()
        }
    };

    Ok(AppState::new(index, Arc::new(catalog), graph, args.search_options()))
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new().filter_level(args.log_level).init();

    let state = web::Data::new(load_state(&args)?);
    let static_dir = args.static_dir.clone();
    if !static_dir.is_dir() {
        warn!("Static directory {} does not exist", static_dir.display());
    }

    info!("Starting server on {}", args.address);
    info!("Using tile directory: {:?}", args.img_dir);
    info!("Search options: {:?}", args.search_options());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_headers())
            .wrap(Logger::default())
            .configure(configure)
            .service(fs::Files::new("/", &static_dir))
    })
    .bind(&args.address)
    .with_context(|| format!("Error binding {}", args.address))?
    .run()
    .await?;

    Ok(())
}
