mod config;
mod data;
pub mod models;

pub use config::*;
pub use data::*;

use models::*;
use serde::de::DeserializeOwned;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};
use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Input folder does not exist: {0}")]
    InputPath(PathBuf),
    #[error("Required GTFS file missing: {0}")]
    MissingFile(String),
    #[error("Missing any source to pull data from")]
    MissingSource,
}

#[derive(Default)]
pub enum Source {
    #[default]
    None,
    Zip(ZipArchive<File>),
    Directory(PathBuf),
}

/// A GTFS feed on disk, either an extracted folder or the bundle zip.
#[derive(Default)]
pub struct Gtfs {
    config: Config,
    storage: Source,
}

impl Gtfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn from_zip<P: AsRef<Path>>(mut self, path: P) -> Result<Self, Error> {
        let zip_file = File::open(path)?;
        let archive = ZipArchive::new(zip_file)?;
        self.storage = Source::Zip(archive);
        Ok(self)
    }

    pub fn from_directory<P: AsRef<Path>>(mut self, path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::InputPath(path.to_path_buf()));
        }
        self.storage = Source::Directory(path.to_path_buf());
        Ok(self)
    }

    /// Verifies that every required table is present before any row is
    /// parsed, so a half-missing feed fails up front.
    pub fn check_required_files(&self) -> Result<(), Error> {
        for name in self.config.required_files() {
            let found = match &self.storage {
                Source::None => return Err(Error::MissingSource),
                Source::Zip(archive) => archive.index_for_name(name).is_some(),
                Source::Directory(path) => path.join(name).is_file(),
            };
            if !found {
                return Err(Error::MissingFile(name.to_string()));
            }
        }
        Ok(())
    }

    pub fn stream_agencies<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnMut((usize, GtfsAgency)),
    {
        let name = self.config.agency_path.clone();
        self.stream(&name, f)
    }

    pub fn stream_stops<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnMut((usize, GtfsStop)),
    {
        let name = self.config.stops_path.clone();
        self.stream(&name, f)
    }

    pub fn stream_routes<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnMut((usize, GtfsRoute)),
    {
        let name = self.config.routes_path.clone();
        self.stream(&name, f)
    }

    pub fn stream_trips<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnMut((usize, GtfsTrip)),
    {
        let name = self.config.trips_path.clone();
        self.stream(&name, f)
    }

    pub fn stream_stop_times<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnMut((usize, GtfsStopTime)),
    {
        let name = self.config.stop_times_path.clone();
        self.stream(&name, f)
    }

    fn stream<T, F>(&mut self, file_name: &str, f: F) -> Result<(), Error>
    where
        T: DeserializeOwned,
        F: FnMut((usize, T)),
    {
        match &mut self.storage {
            Source::None => Err(Error::MissingSource),
            Source::Zip(archive) => stream_from_zip(archive, file_name, f),
            Source::Directory(path) => stream_from_dir(path, file_name, f),
        }
    }
}

fn stream_from_zip<T, F>(
    archive: &mut ZipArchive<File>,
    file_name: &str,
    mut f: F,
) -> Result<(), Error>
where
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let index = archive
        .index_for_name(file_name)
        .ok_or_else(|| Error::MissingFile(file_name.to_string()))?;
    let file = archive.by_index(index)?;
    let mut reader = csv_reader_without_bom(file)?;
    for (i, result) in reader.deserialize().enumerate() {
        let record: T = result?;
        f((i, record));
    }
    Ok(())
}

fn stream_from_dir<T, F>(dir_path: &Path, file_name: &str, mut f: F) -> Result<(), Error>
where
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let file_path = dir_path.join(file_name);
    let file = File::open(file_path)?;

    // stop_times.txt dominates read time, buffer generously
    let reader = BufReader::with_capacity(128 * 1024, file);
    let mut csv_reader = csv_reader_without_bom(reader)?;

    for (i, result) in csv_reader.deserialize().enumerate() {
        let record: T = result?;
        f((i, record));
    }
    Ok(())
}

/// Builds a csv reader over `reader`, skipping the UTF-8 byte order mark
/// many published feeds prepend. Left in place, the mark glues onto the
/// first header name ("\u{feff}stop_id") and every row fails to
/// deserialize.
fn csv_reader_without_bom<R: Read>(
    mut reader: R,
) -> Result<csv::Reader<io::Chain<io::Cursor<Vec<u8>>, R>>, io::Error> {
    let mut buf = [0u8; 3];
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    let mut lead = buf[..filled].to_vec();
    if lead == [0xef, 0xbb, 0xbf] {
        lead.clear();
    }
    Ok(csv::Reader::from_reader(io::Cursor::new(lead).chain(reader)))
}
