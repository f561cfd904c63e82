use clap::Parser;
use gtfs2gmns::gtfs::{Feed, Gtfs};
use gtfs2gmns::network::write::{WriteError, write_access_links, write_network};
use gtfs2gmns::network::access::{generate_access_links, read_highway_nodes};
use gtfs2gmns::{Network, TimeWindow};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

#[derive(Debug, Parser)]
#[command(
    name = "gtfs2gmns",
    about = "Convert a GTFS feed into GMNS node and link tables.",
    version
)]
struct Opt {
    /// Folder holding the GTFS text files, or the feed's bundle zip.
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Output folder for node.csv and link.csv.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Analysis window as HHMM_HHMM, minutes since midnight.
    #[arg(short, long, default_value = "0700_0800")]
    window: String,

    /// Highway node table (node_id, x_coord, y_coord). When given, access
    /// links from the produced bus service nodes to their nearest highway
    /// nodes are written as access_link.csv.
    #[arg(long)]
    access_from: Option<PathBuf>,
}

fn run(opt: Opt) -> Result<(), Box<dyn Error>> {
    let window: TimeWindow = opt.window.parse()?;
    if !opt.output.is_dir() {
        return Err(WriteError::OutputPath(opt.output.clone()).into());
    }
    let source = if opt.input.extension().is_some_and(|ext| ext == "zip") {
        Gtfs::new().from_zip(&opt.input)?
    } else {
        Gtfs::new().from_directory(&opt.input)?
    };

    let feed = Feed::from_source(source)?;
    let network = Network::build(feed, window)?;
    let (node_path, link_path) = write_network(&network, &opt.output)?;
    info!(
        "wrote {} nodes and {} links to {} and {}",
        network.nodes.len(),
        network.links.len(),
        node_path.display(),
        link_path.display()
    );

    if let Some(highway_path) = opt.access_from {
        let highway_nodes = read_highway_nodes(&highway_path)?;
        let access_links = generate_access_links(&highway_nodes, &network.nodes);
        let access_path = write_access_links(&access_links, &opt.output)?;
        info!(
            "wrote {} access links to {}",
            access_links.len(),
            access_path.display()
        );
    }
    Ok(())
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|e| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            e,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

fn main() {
    init_logger();
    if let Err(err) = run(Opt::parse()) {
        error!("{err}");
        let mut cause = err.source();
        while let Some(inner) = cause {
            error!("caused by: {inner}");
            cause = inner.source();
        }
        process::exit(1);
    }
}
