pub mod access;
mod links;
mod modes;
mod nodes;
mod schedule;
mod transfers;
pub mod write;

pub use links::{LINK_HEADERS, Link};
pub use modes::*;
pub use nodes::{NODE_HEADERS, Node, SERVICE_NODE_DISPLAY_OFFSET};
pub use schedule::{Schedule, ScheduleEntry, TerminalFlag, pattern_label, recode_direction};

use crate::gtfs::Feed;
use crate::shared::time::TimeWindow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Physical station node ids sit directly above this offset.
pub const PHYSICAL_NODE_BASE: u64 = 1_000_000;
/// Service node ids sit directly above this offset, disjoint from the
/// physical range by construction.
pub const SERVICE_NODE_BASE: u64 = 1_500_000;
/// Service and boarding link ids continue one monotonic sequence above
/// this offset; transfer link ids restart at 1 in their own range.
pub const SERVICE_LINK_ID_BASE: u64 = 1_000_000;

pub(crate) const LINK_CAPACITY: u64 = 999_999;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{0} physical stops overflow the station node id range")]
    PhysicalRangeExhausted(usize),
}

/// The GMNS graph: physical station nodes first, then service nodes, and
/// every link of the three kinds after endpoint-pair deduplication.
#[derive(Debug, Default)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    physical_count: usize,
    /// Node name (stop_id or directed_service_stop_id) to node id.
    node_lookup: HashMap<Arc<str>, u64>,
    /// Distinct trips per directed service inside the window.
    frequency: HashMap<Arc<str>, usize>,
}

impl Network {
    /// Builds the full graph from a raw feed.
    pub fn build(feed: Feed, window: TimeWindow) -> Result<Self, BuildError> {
        let schedule = Schedule::from_feed(feed, window);
        Self::from_schedule(&schedule, window)
    }

    pub fn from_schedule(schedule: &Schedule, window: TimeWindow) -> Result<Self, BuildError> {
        let mut network = Network::default();
        if schedule.entries.is_empty() {
            warn!("schedule is empty, emitting empty node and link tables");
            return Ok(network);
        }
        network.build_nodes(schedule)?;
        network.build_service_links(schedule);
        network.build_boarding_links(schedule, window);
        network.build_transfer_links();
        network.dedup_links();
        Ok(network)
    }

    pub fn physical_nodes(&self) -> &[Node] {
        &self.nodes[..self.physical_count]
    }

    pub fn service_nodes(&self) -> &[Node] {
        &self.nodes[self.physical_count..]
    }

    pub fn node_id(&self, name: &str) -> Option<u64> {
        self.node_lookup.get(name).copied()
    }

    /// Collapses links sharing an endpoint pair, keeping the last emitted
    /// row. Reciprocal transfer scans produce the only duplicates, so the
    /// later (transfer) row wins.
    fn dedup_links(&mut self) {
        let before = self.links.len();
        let mut last_by_pair: HashMap<(u64, u64), usize> = HashMap::with_capacity(before);
        for (i, link) in self.links.iter().enumerate() {
            last_by_pair.insert((link.from_node_id, link.to_node_id), i);
        }
        let now = Instant::now();
        let mut index = 0;
        self.links.retain(|link| {
            let keep = last_by_pair[&(link.from_node_id, link.to_node_id)] == index;
            index += 1;
            keep
        });
        debug!(
            "deduplicated {} links down to {}, took {:?}",
            before,
            self.links.len(),
            now.elapsed()
        );
    }
}
