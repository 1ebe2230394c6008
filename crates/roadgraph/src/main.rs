use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use roadgraph::loader::write_json;
use roadgraph::load_graph;

/// Converts an OSM extract (.osm, .xml or .pbf) into the JSON graph format.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input graph file
    input: PathBuf,

    /// Output file, defaults to the input path with a .json extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("json"));
    if output_path == args.input {
        anyhow::bail!("Output path {} would overwrite the input", output_path.display());
    }

    let graph = load_graph(&args.input)
        .with_context(|| format!("Error processing graph file {}", args.input.display()))?;

    let file = File::create(&output_path)
        .with_context(|| format!("Error creating output file {}", output_path.display()))?;
    write_json(&graph, BufWriter::new(file), args.pretty)?;

    info!(
        "Graph with {} nodes and {} edges written to {}",
        graph.len(),
        graph.edge_count(),
        output_path.display()
    );
    Ok(())
}
