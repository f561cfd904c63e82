use super::schedule::{Schedule, ScheduleEntry};
use super::{BuildError, Network, PHYSICAL_NODE_BASE, SERVICE_NODE_BASE, modes};
use crate::shared::geo::Coordinate;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

/// Cosmetic shift applied to service node display coordinates so they do
/// not render exactly atop their station. Measurements never use the
/// shifted values.
pub const SERVICE_NODE_DISPLAY_OFFSET: f64 = -0.0001;

pub const NODE_HEADERS: [&str; 16] = [
    "name",
    "node_id",
    "physical_node_id",
    "x_coord",
    "y_coord",
    "route_type",
    "route_id",
    "node_type",
    "directed_route_id",
    "directed_service_id",
    "zone_id",
    "agency_name",
    "geometry",
    "terminal_flag",
    "ctrl_type",
    "agent_type",
];

/// One row of node.csv. A node is physical when `node_id` equals
/// `physical_node_id` and a service node otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub node_id: u64,
    pub physical_node_id: u64,
    pub x_coord: f64,
    pub y_coord: f64,
    pub route_type: i32,
    pub route_id: String,
    pub node_type: String,
    pub directed_route_id: String,
    pub directed_service_id: String,
    pub zone_id: String,
    pub agency_name: String,
    pub geometry: String,
    pub terminal_flag: String,
    pub ctrl_type: String,
    pub agent_type: String,
    /// True stop coordinate; distances are measured on this, not on the
    /// display x/y.
    #[serde(skip)]
    pub(crate) coordinate: Coordinate,
}

impl Node {
    pub fn is_physical(&self) -> bool {
        self.node_id == self.physical_node_id
    }
}

impl Network {
    pub(crate) fn build_nodes(&mut self, schedule: &Schedule) -> Result<(), BuildError> {
        debug!("creating physical nodes...");
        let now = Instant::now();

        // one node per distinct stop, attributes from its first visit
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stations: Vec<&ScheduleEntry> = Vec::new();
        for entry in &schedule.entries {
            if seen.insert(entry.stop_id.as_ref()) {
                stations.push(entry);
            }
        }
        stations.sort_by(|a, b| a.stop_id.cmp(&b.stop_id));

        let capacity = (SERVICE_NODE_BASE - PHYSICAL_NODE_BASE - 1) as usize;
        if stations.len() > capacity {
            return Err(BuildError::PhysicalRangeExhausted(stations.len()));
        }

        for (rank, entry) in stations.iter().enumerate() {
            let node_id = PHYSICAL_NODE_BASE + rank as u64 + 1;
            self.node_lookup.insert(entry.stop_id.clone(), node_id);
            let x = entry.coordinate.longitude;
            let y = entry.coordinate.latitude;
            self.nodes.push(Node {
                name: entry.stop_id.to_string(),
                node_id,
                physical_node_id: node_id,
                x_coord: x,
                y_coord: y,
                route_type: entry.route_type,
                route_id: entry.route_id.to_string(),
                node_type: modes::physical_node_type(entry.route_type).to_string(),
                directed_route_id: String::new(),
                directed_service_id: String::new(),
                zone_id: String::new(),
                agency_name: schedule.agency_name.to_string(),
                geometry: point_wkt(x, y),
                terminal_flag: entry.terminal.as_str().to_string(),
                ctrl_type: String::new(),
                agent_type: String::new(),
                coordinate: entry.coordinate,
            });
        }
        self.physical_count = self.nodes.len();
        debug!(
            "created {} physical nodes, took {:?}",
            self.physical_count,
            now.elapsed()
        );

        debug!("creating service nodes...");
        let now = Instant::now();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut services: Vec<&ScheduleEntry> = Vec::new();
        for entry in &schedule.entries {
            if seen.insert(entry.directed_service_stop_id.as_ref()) {
                services.push(entry);
            }
        }
        services.sort_by(|a, b| a.directed_service_stop_id.cmp(&b.directed_service_stop_id));

        for (rank, entry) in services.iter().enumerate() {
            let node_id = SERVICE_NODE_BASE + rank as u64 + 1;
            let physical_node_id = self.node_lookup[entry.stop_id.as_ref()];
            self.node_lookup
                .insert(entry.directed_service_stop_id.clone(), node_id);
            let x = entry.coordinate.longitude + SERVICE_NODE_DISPLAY_OFFSET;
            let y = entry.coordinate.latitude + SERVICE_NODE_DISPLAY_OFFSET;
            self.nodes.push(Node {
                name: entry.directed_service_stop_id.to_string(),
                node_id,
                physical_node_id,
                x_coord: x,
                y_coord: y,
                route_type: entry.route_type,
                route_id: entry.route_id.to_string(),
                node_type: modes::service_node_type(entry.route_type),
                directed_route_id: entry.directed_route_id.to_string(),
                directed_service_id: entry.directed_service_id.to_string(),
                zone_id: String::new(),
                agency_name: schedule.agency_name.to_string(),
                geometry: point_wkt(x, y),
                terminal_flag: entry.terminal.as_str().to_string(),
                ctrl_type: String::new(),
                agent_type: String::new(),
                coordinate: entry.coordinate,
            });
        }
        debug!(
            "created {} service nodes, took {:?}",
            self.nodes.len() - self.physical_count,
            now.elapsed()
        );
        Ok(())
    }
}

pub(crate) fn point_wkt(x: f64, y: f64) -> String {
    format!("POINT ({x} {y})")
}
