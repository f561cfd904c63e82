pub mod gtfs;
pub mod network;
pub mod shared;

pub use gtfs::{Feed, Gtfs};
pub use network::{Link, Network, Node};
pub use shared::time::{Time, TimeWindow};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Gtfs error: {0}")]
    Gtfs(#[from] gtfs::Error),
    #[error("Build error: {0}")]
    Build(#[from] network::BuildError),
    #[error("Write error: {0}")]
    Write(#[from] network::write::WriteError),
}

/// What one conversion run produced and where it landed.
#[derive(Debug)]
pub struct Summary {
    pub node_count: usize,
    pub link_count: usize,
    pub node_path: PathBuf,
    pub link_path: PathBuf,
}

/// Runs the whole pipeline: read the feed, build the network, write the
/// node and link tables into `output_dir`.
pub fn convert<P: AsRef<Path>>(
    source: Gtfs,
    output_dir: P,
    window: TimeWindow,
) -> Result<Summary, Error> {
    let feed = Feed::from_source(source)?;
    let network = Network::build(feed, window)?;
    let (node_path, link_path) = network::write::write_network(&network, output_dir.as_ref())?;
    info!(
        "converted feed to {} nodes and {} links",
        network.nodes.len(),
        network.links.len()
    );
    Ok(Summary {
        node_count: network.nodes.len(),
        link_count: network.links.len(),
        node_path,
        link_path,
    })
}
