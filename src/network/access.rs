use super::links::linestring_wkt;
use super::nodes::Node;
use crate::shared::geo::Coordinate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Furthest raw-coordinate (Euclidean) distance at which a highway node
/// still counts as reachable from a transit node.
const MAX_ACCESS_RADIUS: f64 = 10_000.0;
/// 4 mph expressed in the highway tables' unit (4 * 3600 / 5280).
const ACCESS_FREE_SPEED: f64 = 2.72727;

pub const ACCESS_LINK_HEADERS: [&str; 10] = [
    "name",
    "from_node_id",
    "to_node_id",
    "length",
    "lanes",
    "dir_flag",
    "free_speed",
    "capacity",
    "allowed_uses",
    "geometry",
];

#[derive(Debug, Clone, Deserialize)]
pub struct HighwayNode {
    pub node_id: i64,
    pub x_coord: f64,
    pub y_coord: f64,
}

/// A directed connector stitching a bus service node onto a highway
/// graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessLink {
    pub name: &'static str,
    pub from_node_id: u64,
    pub to_node_id: i64,
    /// Great-circle miles.
    pub length: f64,
    pub lanes: u32,
    pub dir_flag: u8,
    pub free_speed: f64,
    pub capacity: u32,
    pub allowed_uses: &'static str,
    pub geometry: String,
}

/// Reads a GMNS highway node table (node_id, x_coord, y_coord; extra
/// columns ignored).
pub fn read_highway_nodes<P: AsRef<Path>>(path: P) -> Result<Vec<HighwayNode>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut nodes = Vec::new();
    for result in reader.deserialize() {
        let record: HighwayNode = result?;
        nodes.push(record);
    }
    Ok(nodes)
}

/// Connects every bus service node to its nearest highway node within
/// the access radius. Nodes without a highway neighbor in range produce
/// nothing.
pub fn generate_access_links(highway_nodes: &[HighwayNode], nodes: &[Node]) -> Vec<AccessLink> {
    let transit: Vec<&Node> = nodes
        .iter()
        .filter(|node| node.node_type == "bus_service_node")
        .collect();
    debug!(
        "matching {} bus service nodes against {} highway nodes",
        transit.len(),
        highway_nodes.len()
    );

    transit
        .par_iter()
        .filter_map(|node| {
            let highway = nearest_highway(node, highway_nodes)?;
            let transit_point = Coordinate::new(node.y_coord, node.x_coord);
            let highway_point = Coordinate::new(highway.y_coord, highway.x_coord);
            Some(AccessLink {
                name: "bus_access_link",
                from_node_id: node.node_id,
                to_node_id: highway.node_id,
                length: transit_point.great_circle_distance(&highway_point).as_miles(),
                lanes: 1,
                dir_flag: 0,
                free_speed: ACCESS_FREE_SPEED,
                capacity: 0,
                allowed_uses: "t",
                geometry: linestring_wkt(
                    node.x_coord,
                    node.y_coord,
                    highway.x_coord,
                    highway.y_coord,
                ),
            })
        })
        .collect()
}

fn nearest_highway<'a>(node: &Node, highway_nodes: &'a [HighwayNode]) -> Option<&'a HighwayNode> {
    let mut best: Option<(&HighwayNode, f64)> = None;
    for candidate in highway_nodes {
        let dx = candidate.x_coord - node.x_coord;
        let dy = candidate.y_coord - node.y_coord;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > MAX_ACCESS_RADIUS {
            continue;
        }
        if best.is_none_or(|(_, closest)| distance < closest) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}
