use super::schedule::{Schedule, ScheduleEntry};
use super::{LINK_CAPACITY, Network, SERVICE_LINK_ID_BASE, modes};
use crate::shared::geo::Coordinate;
use crate::shared::time::TimeWindow;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

pub(crate) const VDF_ALPHA: f64 = 0.15;
pub(crate) const VDF_BETA: f64 = 4.0;
/// Longest modeled wait at a station, minutes.
const MAX_BOARDING_WAIT_MIN: f64 = 10.0;
/// Fixed alighting time, minutes.
const ALIGHTING_TIME_MIN: f64 = 1.0;
/// Walking speed on boarding links, km/h.
const BOARDING_WALK_KMH: f64 = 2.0;

pub const LINK_HEADERS: [&str; 23] = [
    "link_id",
    "from_node_id",
    "to_node_id",
    "facility_type",
    "dir_flag",
    "directed_route_id",
    "link_type",
    "link_type_name",
    "length",
    "lanes",
    "capacity",
    "free_speed",
    "cost",
    "VDF_fftt1",
    "VDF_cap1",
    "VDF_alpha1",
    "VDF_beta1",
    "VDF_penalty1",
    "geometry",
    "VDF_allowed_uses1",
    "agency_name",
    "stop_sequence",
    "directed_service_id",
];

/// One row of link.csv.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub link_id: u64,
    pub from_node_id: u64,
    pub to_node_id: u64,
    pub facility_type: String,
    pub dir_flag: u8,
    pub directed_route_id: String,
    pub link_type: u8,
    pub link_type_name: &'static str,
    /// Meters.
    pub length: f64,
    pub lanes: u64,
    pub capacity: u64,
    /// km/h.
    pub free_speed: f64,
    pub cost: f64,
    #[serde(rename = "VDF_fftt1")]
    pub vdf_fftt1: f64,
    #[serde(rename = "VDF_cap1")]
    pub vdf_cap1: u64,
    #[serde(rename = "VDF_alpha1")]
    pub vdf_alpha1: f64,
    #[serde(rename = "VDF_beta1")]
    pub vdf_beta1: f64,
    #[serde(rename = "VDF_penalty1")]
    pub vdf_penalty1: f64,
    pub geometry: String,
    #[serde(rename = "VDF_allowed_uses1")]
    pub allowed_uses: String,
    pub agency_name: String,
    pub stop_sequence: String,
    pub directed_service_id: String,
}

impl Network {
    /// In-vehicle travel between consecutive service nodes. One chain per
    /// directed service, taken from a representative trip; the trip count
    /// of the service becomes the link's lane count.
    pub(crate) fn build_service_links(&mut self, schedule: &Schedule) {
        debug!("creating service links...");
        let now = Instant::now();

        // BTreeMap keeps directed services in sorted order, which pins
        // link ids independent of hash state
        let mut groups: BTreeMap<&str, Vec<&ScheduleEntry>> = BTreeMap::new();
        for entry in &schedule.entries {
            groups
                .entry(entry.directed_service_id.as_ref())
                .or_default()
                .push(entry);
        }

        let mut link_id = SERVICE_LINK_ID_BASE;
        for rows in groups.values() {
            let trip_ids: HashSet<&str> = rows.iter().map(|row| row.trip_id.as_ref()).collect();
            let trip_count = trip_ids.len();
            self.frequency
                .insert(rows[0].directed_service_id.clone(), trip_count);

            // representative trip: the smallest trip id, a stable choice
            let representative = trip_ids
                .iter()
                .min()
                .copied()
                .expect("directed service group cannot be empty");
            let mut line: Vec<&ScheduleEntry> = rows
                .iter()
                .copied()
                .filter(|row| row.trip_id.as_ref() == representative)
                .collect();
            line.sort_by_key(|row| row.stop_sequence);

            for pair in line.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                link_id += 1;
                let length = from.coordinate.great_circle_distance(&to.coordinate);
                let travel_min = (to.arrival - from.arrival) as f64;
                let free_speed = (length.as_kilometers() / (travel_min + 0.001)) * 60.0;
                self.links.push(Link {
                    link_id,
                    from_node_id: self.node_lookup[from.directed_service_stop_id.as_ref()],
                    to_node_id: self.node_lookup[to.directed_service_stop_id.as_ref()],
                    facility_type: modes::link_facility_type(from.route_type).to_string(),
                    dir_flag: 1,
                    directed_route_id: from.directed_route_id.to_string(),
                    link_type: 1,
                    link_type_name: "service_links",
                    length: length.as_meters(),
                    lanes: trip_count as u64,
                    capacity: LINK_CAPACITY,
                    free_speed,
                    cost: 0.0,
                    vdf_fftt1: travel_min,
                    vdf_cap1: trip_count as u64 * LINK_CAPACITY,
                    vdf_alpha1: VDF_ALPHA,
                    vdf_beta1: VDF_BETA,
                    vdf_penalty1: 0.0,
                    geometry: linestring_wkt(
                        from.coordinate.longitude,
                        from.coordinate.latitude,
                        to.coordinate.longitude,
                        to.coordinate.latitude,
                    ),
                    allowed_uses: modes::allowed_use(from.route_type).to_string(),
                    agency_name: schedule.agency_name.to_string(),
                    stop_sequence: from.stop_sequence.to_string(),
                    directed_service_id: from.directed_service_id.to_string(),
                });
            }
        }
        debug!(
            "created {} service links, took {:?}",
            self.links.len(),
            now.elapsed()
        );
    }

    /// One boarding (station to service node) and one alighting (service
    /// node to station) link per service node. The boarding travel time
    /// is half the mean headway inside the window, capped; alighting
    /// takes a fixed minute.
    pub(crate) fn build_boarding_links(&mut self, schedule: &Schedule, window: TimeWindow) {
        debug!("creating boarding links...");
        let now = Instant::now();
        let window_min = f64::from(window.length_minutes());

        struct BoardingSeed {
            service_node_id: u64,
            physical_node_id: u64,
            route_type: i32,
            directed_route_id: String,
            directed_service_id: String,
            display_x: f64,
            display_y: f64,
            coordinate: Coordinate,
        }

        let station_points: HashMap<u64, (f64, f64, Coordinate)> = self
            .physical_nodes()
            .iter()
            .map(|node| (node.node_id, (node.x_coord, node.y_coord, node.coordinate)))
            .collect();

        let seeds: Vec<BoardingSeed> = self
            .service_nodes()
            .iter()
            .map(|node| BoardingSeed {
                service_node_id: node.node_id,
                physical_node_id: node.physical_node_id,
                route_type: node.route_type,
                directed_route_id: node.directed_route_id.clone(),
                directed_service_id: node.directed_service_id.clone(),
                display_x: node.x_coord,
                display_y: node.y_coord,
                coordinate: node.coordinate,
            })
            .collect();

        let mut link_id = SERVICE_LINK_ID_BASE + self.links.len() as u64;
        let mut count = 0usize;
        for seed in seeds {
            let trips = self.frequency[seed.directed_service_id.as_str()];
            let (station_x, station_y, station_coordinate) =
                station_points[&seed.physical_node_id];

            // the display offset is cosmetic, the walk length is measured
            // between the true stop coordinates and is therefore zero
            let length = seed
                .coordinate
                .great_circle_distance(&station_coordinate)
                .as_meters();
            let facility_type = modes::link_facility_type(seed.route_type).to_string();
            let allowed_uses = modes::allowed_use(seed.route_type).to_string();

            let half_headway = 0.5 * window_min / trips as f64;
            let boarding_wait = half_headway.min(MAX_BOARDING_WAIT_MIN);

            link_id += 1;
            self.links.push(Link {
                link_id,
                from_node_id: seed.physical_node_id,
                to_node_id: seed.service_node_id,
                facility_type: facility_type.clone(),
                dir_flag: 1,
                directed_route_id: seed.directed_route_id.clone(),
                link_type: 2,
                link_type_name: "boarding_links",
                length,
                lanes: 1,
                capacity: LINK_CAPACITY,
                free_speed: BOARDING_WALK_KMH,
                cost: 0.0,
                vdf_fftt1: boarding_wait,
                vdf_cap1: LINK_CAPACITY,
                vdf_alpha1: VDF_ALPHA,
                vdf_beta1: VDF_BETA,
                vdf_penalty1: 0.0,
                geometry: linestring_wkt(station_x, station_y, seed.display_x, seed.display_y),
                allowed_uses: allowed_uses.clone(),
                agency_name: schedule.agency_name.to_string(),
                stop_sequence: "-1".to_string(),
                directed_service_id: seed.directed_service_id.clone(),
            });

            link_id += 1;
            self.links.push(Link {
                link_id,
                from_node_id: seed.service_node_id,
                to_node_id: seed.physical_node_id,
                facility_type,
                dir_flag: 1,
                directed_route_id: seed.directed_route_id,
                link_type: 2,
                link_type_name: "boarding_links",
                length,
                lanes: 1,
                capacity: LINK_CAPACITY,
                free_speed: BOARDING_WALK_KMH,
                cost: 0.0,
                vdf_fftt1: ALIGHTING_TIME_MIN,
                vdf_cap1: LINK_CAPACITY,
                vdf_alpha1: VDF_ALPHA,
                vdf_beta1: VDF_BETA,
                vdf_penalty1: 0.0,
                geometry: linestring_wkt(seed.display_x, seed.display_y, station_x, station_y),
                allowed_uses,
                agency_name: schedule.agency_name.to_string(),
                stop_sequence: "-1".to_string(),
                directed_service_id: seed.directed_service_id,
            });
            count += 2;
        }
        debug!("created {count} boarding links, took {:?}", now.elapsed());
    }
}

pub(crate) fn linestring_wkt(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    format!("LINESTRING ({x1} {y1}, {x2} {y2})")
}
