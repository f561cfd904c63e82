#![allow(dead_code)]

use gtfs2gmns::TimeWindow;
use gtfs2gmns::gtfs::Feed;
use gtfs2gmns::gtfs::models::{GtfsRoute, GtfsStop, GtfsStopTime, GtfsTrip};

pub const AGENCY: &str = "Metro Transit";

pub fn stop(id: &str, lat: f64, lon: f64) -> GtfsStop {
    GtfsStop {
        stop_id: id.into(),
        stop_name: Some(format!("Stop {id}")),
        stop_lat: lat,
        stop_lon: lon,
    }
}

pub fn route(id: &str, route_type: i32) -> GtfsRoute {
    GtfsRoute {
        route_id: id.into(),
        route_short_name: Some(id.into()),
        route_long_name: None,
        route_type,
    }
}

pub fn trip(route_id: &str, trip_id: &str, direction_id: Option<u8>) -> GtfsTrip {
    GtfsTrip {
        route_id: route_id.into(),
        trip_id: trip_id.into(),
        direction_id,
    }
}

pub fn stop_time(trip_id: &str, stop_id: &str, stop_sequence: u32, arrival: &str) -> GtfsStopTime {
    GtfsStopTime {
        trip_id: trip_id.into(),
        arrival_time: Some(arrival.into()),
        departure_time: Some(arrival.into()),
        stop_id: stop_id.into(),
        stop_sequence,
    }
}

pub fn feed(
    stops: Vec<GtfsStop>,
    routes: Vec<GtfsRoute>,
    trips: Vec<GtfsTrip>,
    stop_times: Vec<GtfsStopTime>,
) -> Feed {
    Feed {
        agency_name: AGENCY.into(),
        stops,
        routes,
        trips,
        stop_times,
    }
}

pub fn window(s: &str) -> TimeWindow {
    s.parse().unwrap()
}

/// A minimal feed: one bus route, one trip, two stops ~111 m apart,
/// arrivals 07:10 and 07:20.
pub fn two_stop_feed() -> Feed {
    feed(
        vec![stop("A", 0.0, 0.0), stop("B", 0.001, 0.0)],
        vec![route("R", 3)],
        vec![trip("R", "T1", Some(0))],
        vec![
            stop_time("T1", "A", 1, "07:10:00"),
            stop_time("T1", "B", 2, "07:20:00"),
        ],
    )
}
