use super::links::{Link, VDF_ALPHA, VDF_BETA, linestring_wkt};
use super::nodes::Node;
use super::{LINK_CAPACITY, Network, modes};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

/// Half-size of the candidate bounding box, degrees (~0.3 km).
const NEIGHBOR_WINDOW_DEG: f64 = 0.003;
/// Walkable distance window, meters; the upper bound is ~0.2 mile.
const MIN_TRANSFER_M: f64 = 1.0;
const MAX_TRANSFER_M: f64 = 321.869;
/// At most this many partner routes per origin station.
const MAX_PARTNERS: usize = 10;
/// Transfers are modeled at walking pace, km/h.
const TRANSFER_WALK_KMH: f64 = 1.0;

type Cell = (i32, i32);

impl Network {
    /// Short walking edges between nearby stations of different lines.
    /// Every origin picks at most one partner station per
    /// (route, agency) pair, up to the fan-out cap, and each pick emits
    /// a reciprocal pair of links.
    pub(crate) fn build_transfer_links(&mut self) {
        debug!("creating transferring links...");
        let now = Instant::now();
        let physical = self.physical_nodes();

        // grid cells sized to the bounding box, so candidates live in
        // the 3x3 neighborhood of the origin's cell
        let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();
        for (index, node) in physical.iter().enumerate() {
            grid.entry(cell_of(node)).or_default().push(index);
        }

        // per-origin scans are independent; collect keeps origin order
        // so the downstream keep-last dedup stays deterministic
        let picks: Vec<Vec<(usize, usize, f64)>> = physical
            .par_iter()
            .enumerate()
            .map(|(index, origin)| scan_origin(index, origin, physical, &grid))
            .collect();

        let mut transfers: Vec<Link> = Vec::new();
        let mut link_id = 0u64;
        for (origin_index, partner_index, meters) in picks.into_iter().flatten() {
            let origin = &self.nodes[origin_index];
            let partner = &self.nodes[partner_index];
            link_id += 1;
            transfers.push(transfer_link(link_id, origin, partner, meters));
            link_id += 1;
            transfers.push(transfer_link(link_id, partner, origin, meters));
        }
        let count = transfers.len();
        self.links.extend(transfers);
        debug!("created {count} transferring links, took {:?}", now.elapsed());
    }
}

fn cell_of(node: &Node) -> Cell {
    (
        (node.coordinate.longitude / NEIGHBOR_WINDOW_DEG).floor() as i32,
        (node.coordinate.latitude / NEIGHBOR_WINDOW_DEG).floor() as i32,
    )
}

fn scan_origin(
    origin_index: usize,
    origin: &Node,
    physical: &[Node],
    grid: &HashMap<Cell, Vec<usize>>,
) -> Vec<(usize, usize, f64)> {
    let (cell_x, cell_y) = cell_of(origin);
    let mut candidates: Vec<usize> = Vec::new();
    for dx in -1..=1 {
        for dy in -1..=1 {
            if let Some(cell) = grid.get(&(cell_x + dx, cell_y + dy)) {
                candidates.extend_from_slice(cell);
            }
        }
    }
    // table order, as if the bounding box had been scanned linearly
    candidates.sort_unstable();

    let mut labeled: HashSet<(&str, &str)> = HashSet::new();
    let mut picks = Vec::new();
    for candidate_index in candidates {
        if picks.len() >= MAX_PARTNERS {
            break;
        }
        let candidate = &physical[candidate_index];
        if (candidate.coordinate.longitude - origin.coordinate.longitude).abs()
            > NEIGHBOR_WINDOW_DEG
            || (candidate.coordinate.latitude - origin.coordinate.latitude).abs()
                > NEIGHBOR_WINDOW_DEG
        {
            continue;
        }
        // same line, nothing to transfer to
        if candidate.route_id == origin.route_id && candidate.agency_name == origin.agency_name {
            continue;
        }
        let meters = origin
            .coordinate
            .great_circle_distance(&candidate.coordinate)
            .as_meters();
        if !(MIN_TRANSFER_M..=MAX_TRANSFER_M).contains(&meters) {
            continue;
        }
        if !labeled.insert((candidate.route_id.as_str(), candidate.agency_name.as_str())) {
            continue;
        }
        picks.push((origin_index, candidate_index, meters));
    }
    picks
}

fn transfer_link(link_id: u64, from: &Node, to: &Node, meters: f64) -> Link {
    Link {
        link_id,
        from_node_id: from.node_id,
        to_node_id: to.node_id,
        facility_type: "sta2sta".to_string(),
        dir_flag: 1,
        directed_route_id: "-1".to_string(),
        link_type: 3,
        link_type_name: "transferring_links",
        length: meters,
        lanes: 1,
        capacity: LINK_CAPACITY,
        free_speed: TRANSFER_WALK_KMH,
        cost: 60.0,
        vdf_fftt1: (meters / 1000.0) / TRANSFER_WALK_KMH,
        vdf_cap1: LINK_CAPACITY,
        vdf_alpha1: VDF_ALPHA,
        vdf_beta1: VDF_BETA,
        vdf_penalty1: modes::transfer_penalty(&from.node_type, &to.node_type),
        geometry: linestring_wkt(from.x_coord, from.y_coord, to.x_coord, to.y_coord),
        allowed_uses: modes::transfer_allowed_use(&from.node_type, &to.node_type).to_string(),
        agency_name: String::new(),
        stop_sequence: String::new(),
        directed_service_id: String::new(),
    }
}
