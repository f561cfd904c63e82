use crate::gtfs::Feed;
use crate::gtfs::models::{GtfsRoute, GtfsStop, GtfsStopTime, GtfsTrip};
use crate::shared::geo::Coordinate;
use crate::shared::time::{Time, TimeWindow};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Position of a stop inside its trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalFlag {
    Origin,
    Destination,
    Intermediate,
}

impl TerminalFlag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TerminalFlag::Origin => "origin",
            TerminalFlag::Destination => "destination",
            TerminalFlag::Intermediate => "intermediate",
        }
    }
}

/// One vehicle space-time state: a trip calling at a stop, enriched with
/// route, direction, pattern, and station attributes.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub trip_id: Arc<str>,
    pub stop_id: Arc<str>,
    pub stop_sequence: u32,
    pub arrival: Time,
    pub departure: Time,
    pub terminal: TerminalFlag,
    pub route_id: Arc<str>,
    pub route_type: i32,
    /// route_id + "." + recoded direction.
    pub directed_route_id: Arc<str>,
    /// directed_route_id + ":" + stop pattern label.
    pub directed_service_id: Arc<str>,
    /// directed_route_id + "." + stop_id + ":" + stop pattern label; the
    /// service node name.
    pub directed_service_stop_id: Arc<str>,
    pub stop_name: Arc<str>,
    pub coordinate: Coordinate,
}

/// The enriched schedule: every surviving stop-time row, labeled and
/// joined with its trip, route, and stop. Rows are ordered by
/// (trip_id, stop_sequence).
#[derive(Debug, Default)]
pub struct Schedule {
    pub agency_name: Arc<str>,
    pub entries: Vec<ScheduleEntry>,
}

struct TripInfo {
    directed_route_id: Arc<str>,
    route_id: Arc<str>,
    route_type: i32,
}

struct CleanStopTime {
    trip_id: String,
    stop_id: String,
    stop_sequence: u32,
    arrival: Time,
    departure: Time,
}

struct LabeledGroup<'a> {
    rows: &'a [CleanStopTime],
    terminals: Vec<TerminalFlag>,
    pattern: String,
}

impl Schedule {
    /// Normalizes the feed and labels every trip whose first arrival
    /// falls inside `window`. An empty result is not an error; the
    /// caller emits empty tables.
    pub fn from_feed(feed: Feed, window: TimeWindow) -> Self {
        let Feed {
            agency_name,
            stops,
            mut routes,
            mut trips,
            stop_times,
        } = feed;

        repair_route_id_quoting(&mut routes, &mut trips);
        let trip_info = merge_trips_with_routes(&trips, &routes);
        let mut cleaned = clean_stop_times(stop_times);

        debug!("labeling trips...");
        let now = Instant::now();
        cleaned.sort_by(|a, b| {
            a.trip_id
                .cmp(&b.trip_id)
                .then(a.stop_sequence.cmp(&b.stop_sequence))
        });
        let groups = split_trip_groups(&cleaned);
        let total = groups.len();
        let labeled: Vec<LabeledGroup> = groups
            .into_par_iter()
            .filter_map(|rows| label_trip(rows, window))
            .collect();
        debug!(
            "kept {} of {} trips inside the window, took {:?}",
            labeled.len(),
            total,
            now.elapsed()
        );
        if labeled.is_empty() {
            warn!("no trip starts inside the analysis window");
        }

        let entries = join_entries(&labeled, &trip_info, &stops);
        info!("enriched schedule holds {} records", entries.len());

        Schedule {
            agency_name: agency_name.into(),
            entries,
        }
    }
}

/// GTFS direction 0 becomes 2 and 1 stays 1; a missing value counts as 0.
pub fn recode_direction(direction_id: Option<u8>) -> i32 {
    2 - i32::from(direction_id.unwrap_or(0))
}

/// Canonical label for an ordered stop chain (FNV-1a 64, hex). Two trips
/// get the same label exactly when they serve the same stop ids in the
/// same order.
pub fn pattern_label<'a, I>(stop_ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for id in stop_ids {
        for byte in id.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(PRIME);
        }
        // unit separator between ids so ["ab","c"] and ["a","bc"] differ
        hash ^= 0x1f;
        hash = hash.wrapping_mul(PRIME);
    }
    format!("{hash:016x}")
}

/// Some feeds quote route ids in routes.txt but not in trips.txt (or the
/// other way around); strip the quotes from whichever side carries them
/// so the join does not come up empty.
fn repair_route_id_quoting(routes: &mut [GtfsRoute], trips: &mut [GtfsTrip]) {
    let routes_quoted = routes
        .first()
        .is_some_and(|route| route.route_id.starts_with('"'));
    let trips_quoted = trips
        .first()
        .is_some_and(|trip| trip.route_id.starts_with('"'));
    if routes_quoted == trips_quoted {
        return;
    }
    warn!("route_id quoting differs between routes and trips, stripping quotes");
    if routes_quoted {
        for route in routes.iter_mut() {
            route.route_id = route.route_id.trim_matches('"').to_string();
        }
    } else {
        for trip in trips.iter_mut() {
            trip.route_id = trip.route_id.trim_matches('"').to_string();
        }
    }
}

fn merge_trips_with_routes(trips: &[GtfsTrip], routes: &[GtfsRoute]) -> HashMap<Arc<str>, TripInfo> {
    let route_by_id: HashMap<&str, &GtfsRoute> = routes
        .iter()
        .map(|route| (route.route_id.as_str(), route))
        .collect();

    let mut merged: HashMap<Arc<str>, TripInfo> = HashMap::with_capacity(trips.len());
    let mut orphans = 0usize;
    for trip in trips {
        let Some(route) = route_by_id.get(trip.route_id.as_str()) else {
            orphans += 1;
            continue;
        };
        let direction = recode_direction(trip.direction_id);
        let route_id: Arc<str> = trip.route_id.as_str().into();
        let directed_route_id: Arc<str> = format!("{}.{}", route_id, direction).into();
        merged.insert(
            trip.trip_id.as_str().into(),
            TripInfo {
                directed_route_id,
                route_id,
                route_type: route.route_type,
            },
        );
    }
    if orphans > 0 {
        warn!("{orphans} trips reference routes absent from routes.txt and were dropped");
    }
    merged
}

/// Drops rows without usable arrival and departure stamps and converts
/// the survivors to minutes.
fn clean_stop_times(stop_times: Vec<GtfsStopTime>) -> Vec<CleanStopTime> {
    let total = stop_times.len();
    let mut blank = 0usize;
    let mut malformed = 0usize;
    let mut cleaned = Vec::with_capacity(total);
    for stop_time in stop_times {
        let (Some(arrival_raw), Some(departure_raw)) = (
            non_blank(stop_time.arrival_time),
            non_blank(stop_time.departure_time),
        ) else {
            blank += 1;
            continue;
        };
        match (Time::from_hms(&arrival_raw), Time::from_hms(&departure_raw)) {
            (Some(arrival), Some(departure)) => cleaned.push(CleanStopTime {
                trip_id: stop_time.trip_id,
                stop_id: stop_time.stop_id,
                stop_sequence: stop_time.stop_sequence,
                arrival,
                departure,
            }),
            _ => malformed += 1,
        }
    }
    if blank + malformed > 0 {
        debug!(
            "dropped {blank} stop_time rows with blank stamps and {malformed} with malformed stamps, {} of {total} remain",
            cleaned.len()
        );
    }
    cleaned
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Rows must be sorted by (trip_id, stop_sequence).
fn split_trip_groups(rows: &[CleanStopTime]) -> Vec<&[CleanStopTime]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || rows[i].trip_id != rows[start].trip_id {
            groups.push(&rows[start..i]);
            start = i;
        }
    }
    groups
}

fn label_trip(rows: &[CleanStopTime], window: TimeWindow) -> Option<LabeledGroup<'_>> {
    let first_arrival = rows.iter().map(|row| row.arrival).min()?;
    if !window.contains(first_arrival) {
        return None;
    }
    Some(LabeledGroup {
        rows,
        terminals: terminal_flags(rows),
        pattern: pattern_label(rows.iter().map(|row| row.stop_id.as_str())),
    })
}

/// The minimum-sequence stop opens the trip and the maximum-sequence stop
/// closes it; a single-stop trip counts as its own destination.
fn terminal_flags(rows: &[CleanStopTime]) -> Vec<TerminalFlag> {
    let mut flags = vec![TerminalFlag::Intermediate; rows.len()];
    if let Some(first) = flags.first_mut() {
        *first = TerminalFlag::Origin;
    }
    if let Some(last) = flags.last_mut() {
        *last = TerminalFlag::Destination;
    }
    flags
}

fn join_entries(
    labeled: &[LabeledGroup],
    trip_info: &HashMap<Arc<str>, TripInfo>,
    stops: &[GtfsStop],
) -> Vec<ScheduleEntry> {
    let stop_by_id: HashMap<&str, &GtfsStop> = stops
        .iter()
        .map(|stop| (stop.stop_id.as_str(), stop))
        .collect();

    let mut entries = Vec::new();
    let mut unknown_stops = 0usize;
    for group in labeled {
        let trip_id = group.rows[0].trip_id.as_str();
        let Some(info) = trip_info.get(trip_id) else {
            // orphan trips were already warned about during the merge
            continue;
        };
        let trip_id: Arc<str> = trip_id.into();
        let directed_service_id: Arc<str> =
            format!("{}:{}", info.directed_route_id, group.pattern).into();
        for (row, terminal) in group.rows.iter().zip(&group.terminals) {
            let Some(stop) = stop_by_id.get(row.stop_id.as_str()) else {
                unknown_stops += 1;
                continue;
            };
            let stop_id: Arc<str> = row.stop_id.as_str().into();
            let directed_service_stop_id: Arc<str> = format!(
                "{}.{}:{}",
                info.directed_route_id, stop_id, group.pattern
            )
            .into();
            entries.push(ScheduleEntry {
                trip_id: trip_id.clone(),
                stop_id,
                stop_sequence: row.stop_sequence,
                arrival: row.arrival,
                departure: row.departure,
                terminal: *terminal,
                route_id: info.route_id.clone(),
                route_type: info.route_type,
                directed_route_id: info.directed_route_id.clone(),
                directed_service_id: directed_service_id.clone(),
                directed_service_stop_id,
                stop_name: stop.stop_name.as_deref().unwrap_or(&row.stop_id).into(),
                coordinate: Coordinate::new(stop.stop_lat, stop.stop_lon),
            });
        }
    }
    if unknown_stops > 0 {
        warn!("{unknown_stops} stop_time rows reference stops absent from stops.txt and were dropped");
    }
    entries
}
