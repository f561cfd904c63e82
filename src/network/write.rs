use super::access::{ACCESS_LINK_HEADERS, AccessLink};
use super::{LINK_HEADERS, NODE_HEADERS, Network};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Output folder does not exist: {0}")]
    OutputPath(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes node.csv and link.csv into `dir`, suffixing the file names
/// when the targets already exist. Returns the paths actually written.
pub fn write_network(network: &Network, dir: &Path) -> Result<(PathBuf, PathBuf), WriteError> {
    if !dir.is_dir() {
        return Err(WriteError::OutputPath(dir.to_path_buf()));
    }
    let node_path = available_path(dir.join("node.csv"));
    let link_path = available_path(dir.join("link.csv"));

    info!("writing {} nodes to {}", network.nodes.len(), node_path.display());
    let mut writer = csv::Writer::from_path(&node_path)?;
    if network.nodes.is_empty() {
        writer.write_record(NODE_HEADERS)?;
    }
    for node in &network.nodes {
        writer.serialize(node)?;
    }
    writer.flush()?;

    info!("writing {} links to {}", network.links.len(), link_path.display());
    let mut writer = csv::Writer::from_path(&link_path)?;
    if network.links.is_empty() {
        writer.write_record(LINK_HEADERS)?;
    }
    for link in &network.links {
        writer.serialize(link)?;
    }
    writer.flush()?;

    Ok((node_path, link_path))
}

/// Writes the auxiliary access-link table next to the other outputs.
pub fn write_access_links(links: &[AccessLink], dir: &Path) -> Result<PathBuf, WriteError> {
    if !dir.is_dir() {
        return Err(WriteError::OutputPath(dir.to_path_buf()));
    }
    let path = available_path(dir.join("access_link.csv"));
    info!("writing {} access links to {}", links.len(), path.display());
    let mut writer = csv::Writer::from_path(&path)?;
    if links.is_empty() {
        writer.write_record(ACCESS_LINK_HEADERS)?;
    }
    for link in links {
        writer.serialize(link)?;
    }
    writer.flush()?;
    Ok(path)
}

/// node.csv becomes node_1.csv, node_2.csv, ... until a free name is
/// found, so reruns never clobber earlier results.
fn available_path(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut suffix = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{stem}_{suffix}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}
