use serde::{Deserialize, Serialize};

// Row types for the subset of GTFS columns the converter consumes.
// Feeds routinely carry extra columns, so unknown fields are ignored.

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsAgency {
    pub agency_id: Option<String>,
    pub agency_name: String,
    pub agency_url: Option<String>,
    pub agency_timezone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: Option<String>,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsRoute {
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsTrip {
    pub route_id: String,
    pub trip_id: String,
    /// 0 or 1 in the feed; absent when the agency does not split
    /// directions. Blank values deserialize to `None`.
    pub direction_id: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsStopTime {
    pub trip_id: String,
    /// Kept as raw text until normalization; blank stamps mark stops
    /// without accurate schedule data and drop the row.
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub stop_id: String,
    pub stop_sequence: u32,
}
