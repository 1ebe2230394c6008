//! Reading road graphs from OSM extracts and the JSON graph format.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, Write};
use std::path::Path;

use log::{info, warn};
use osmpbfreader::{OsmObj, OsmPbfReader};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::{GraphBuilder, GraphError, GraphFile, RoadGraph, StatusOr};

/// Highway types that become edges; everything else (footways, cycleways, ...) is skipped.
pub const ALLOWED_HIGHWAYS: &[&str] = &[
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "living_street",
    "motorway_link",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "tertiary_link",
];

pub fn is_routable_highway(value: &str) -> bool {
    ALLOWED_HIGHWAYS.contains(&value)
}

/// Loads a graph, picking the reader from the file extension: `.json`, `.osm`/`.xml`
/// or `.pbf`.
pub fn load_graph<P: AsRef<Path>>(path: P) -> StatusOr<RoadGraph> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    info!("Loading graph from {:?}", path);
    let graph = match extension.as_deref() {
        Some("json") => read_json(BufReader::new(File::open(path)?))?,
        Some("osm") | Some("xml") => read_osm_xml(BufReader::new(File::open(path)?))?,
        Some("pbf") => read_osm_pbf(BufReader::new(File::open(path)?))?,
        _ => return Err(GraphError::UnsupportedFormat(path.to_path_buf())),
    };
    info!(
        "Loaded graph with {} nodes and {} edges",
        graph.len(),
        graph.edge_count()
    );
    Ok(graph)
}

pub fn read_json<R: Read>(reader: R) -> StatusOr<RoadGraph> {
    let file: GraphFile = serde_json::from_reader(reader)?;
    RoadGraph::try_from(file)
}

pub fn write_json<W: Write>(graph: &RoadGraph, writer: W, pretty: bool) -> StatusOr<()> {
    let file = graph.to_file();
    if pretty {
        serde_json::to_writer_pretty(writer, &file)?;
    } else {
        serde_json::to_writer(writer, &file)?;
    }
    Ok(())
}

#[derive(Default)]
struct PendingWay {
    refs: Vec<i64>,
    routable: bool,
}

fn parse_attr<T: std::str::FromStr>(e: &BytesStart, name: &[u8]) -> StatusOr<Option<T>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| GraphError::XmlError(e.to_string()))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| GraphError::XmlError(e.to_string()))?;
            return Ok(value.parse().ok());
        }
    }
    Ok(None)
}

fn string_attr(e: &BytesStart, name: &[u8]) -> StatusOr<Option<String>> {
    parse_attr::<String>(e, name)
}

/// Reads an OSM XML document. Ways with a routable `highway` tag connect their
/// consecutive node refs; nodes that end up without edges are dropped.
pub fn read_osm_xml<R: BufRead>(input: R) -> StatusOr<RoadGraph> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut builder = GraphBuilder::new();
    let mut ways: Vec<PendingWay> = Vec::new();
    let mut current_way: Option<PendingWay> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            GraphError::XmlError(format!("at position {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"node" => {
                let id = parse_attr::<i64>(&e, b"id")?;
                let lat = parse_attr::<f64>(&e, b"lat")?;
                let lon = parse_attr::<f64>(&e, b"lon")?;
                match (id, lat, lon) {
                    (Some(id), Some(lat), Some(lon)) => builder.add_node(id, lat, lon)?,
                    _ => warn!("Skipping node element with missing id or coordinates"),
                }
            }
            Event::Start(e) if e.name().as_ref() == b"way" => {
                current_way = Some(PendingWay::default());
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"nd" => {
                if let Some(way) = current_way.as_mut() {
                    if let Some(node_ref) = parse_attr::<i64>(&e, b"ref")? {
                        way.refs.push(node_ref);
                    }
                }
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"tag" => {
                if let Some(way) = current_way.as_mut() {
                    if string_attr(&e, b"k")?.as_deref() == Some("highway") {
                        way.routable = string_attr(&e, b"v")?
                            .map_or(false, |v| is_routable_highway(&v));
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"way" => {
                if let Some(way) = current_way.take() {
                    if way.routable {
                        ways.push(way);
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    info!("Found {} routable ways", ways.len());
    for way in &ways {
        connect_refs(&mut builder, &way.refs)?;
    }
    Ok(builder.build_connected())
}

/// Reads an OSM PBF extract, keeping routable ways and the nodes they reference.
pub fn read_osm_pbf<R: Read + Seek>(input: R) -> StatusOr<RoadGraph> {
    let mut reader = OsmPbfReader::new(input);

    info!("Loading highways and nodes...");
    let objects = reader
        .get_objs_and_deps(|obj| match obj {
            OsmObj::Way(way) => way
                .tags
                .get("highway")
                .map_or(false, |v| is_routable_highway(v.as_str())),
            _ => false,
        })
        .map_err(|e| GraphError::OsmError(e.to_string()))?;

    let mut builder = GraphBuilder::new();
    for obj in objects.values() {
        if let OsmObj::Node(node) = obj {
            builder.add_node(node.id.0, node.lat(), node.lon())?;
        }
    }

    let mut way_count = 0;
    for obj in objects.values() {
        if let OsmObj::Way(way) = obj {
            let refs: Vec<i64> = way.nodes.iter().map(|n| n.0).collect();
            connect_refs(&mut builder, &refs)?;
            way_count += 1;
        }
    }
    info!("Found {} routable ways", way_count);

    Ok(builder.build_connected())
}

/// Adds an edge between each pair of consecutive refs, ignoring refs the builder
/// has no node for.
fn connect_refs(builder: &mut GraphBuilder, refs: &[i64]) -> StatusOr<()> {
    let mut prev: Option<i64> = None;
    for &node_ref in refs {
        if !builder.contains_node(node_ref) {
            warn!("Way references missing node {}", node_ref);
            continue;
        }
        if let Some(prev) = prev {
            builder.add_edge(prev, node_ref)?;
        }
        prev = Some(node_ref);
    }
    Ok(())
}
