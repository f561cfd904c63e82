use crate::gtfs::{self, Gtfs, models::*};
use tracing::info;

/// Every table of a feed pulled into memory, ready for the network build.
#[derive(Default, Debug)]
pub struct Feed {
    /// Name from the first row of agency.txt; the converter handles one
    /// agency per invocation.
    pub agency_name: String,
    pub stops: Vec<GtfsStop>,
    pub routes: Vec<GtfsRoute>,
    pub trips: Vec<GtfsTrip>,
    pub stop_times: Vec<GtfsStopTime>,
}

impl Feed {
    /// Checks the required tables and drains the source into a `Feed`.
    pub fn from_source(mut gtfs: Gtfs) -> Result<Self, gtfs::Error> {
        gtfs.check_required_files()?;

        let mut feed = Feed::default();

        let mut agencies: Vec<GtfsAgency> = Vec::new();
        gtfs.stream_agencies(|(_, agency)| agencies.push(agency))?;
        feed.agency_name = agencies
            .first()
            .map(|agency| agency.agency_name.clone())
            .unwrap_or_default();
        info!("agency: {}", feed.agency_name);

        gtfs.stream_stops(|(_, stop)| feed.stops.push(stop))?;
        info!("read {} stops", feed.stops.len());

        gtfs.stream_routes(|(_, route)| feed.routes.push(route))?;
        info!("read {} routes", feed.routes.len());

        gtfs.stream_trips(|(_, trip)| feed.trips.push(trip))?;
        info!("read {} trips", feed.trips.len());

        gtfs.stream_stop_times(|(_, stop_time)| feed.stop_times.push(stop_time))?;
        info!("read {} stop_time records", feed.stop_times.len());

        Ok(feed)
    }
}
