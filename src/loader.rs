use once_cell::sync::OnceCell;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};

pub const DEFAULT_SOURCE: &str = "https://raw.githubusercontent.com/143Himanshujangid/starbuks/main/akshit/Starbucks%20Store%20Locations.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Remote(Url),
    Local(PathBuf),
}

impl DataSource {
    /// `http`/`https` URLs are fetched remotely, `file` URLs and anything
    /// that does not parse as a URL are read from disk.
    pub fn parse(input: &str) -> Self {
        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => DataSource::Remote(url),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(DataSource::Local)
                .unwrap_or_else(|_| DataSource::Local(PathBuf::from(input))),
            _ => DataSource::Local(PathBuf::from(input)),
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::parse(DEFAULT_SOURCE)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Remote(url) => write!(f, "{}", url),
            DataSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Retrieves the raw bytes behind a [`DataSource`].
pub trait Fetch: Send + Sync {
    fn fetch(&self, source: &DataSource) -> Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFetcher;

impl Fetch for DefaultFetcher {
    fn fetch(&self, source: &DataSource) -> Result<Vec<u8>> {
        match source {
            DataSource::Remote(url) => {
                let response = reqwest::blocking::get(url.clone())
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| DashboardError::unavailable(url.as_str(), e))?;
                let body = response
                    .bytes()
                    .map_err(|e| DashboardError::unavailable(url.as_str(), e))?;
                Ok(body.to_vec())
            }
            DataSource::Local(path) => {
                fs::read(path).map_err(|e| DashboardError::unavailable(source.to_string(), e))
            }
        }
    }
}

/// ISO-8859-1: every byte is the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Fetches and parses the dataset on first use, then hands out the same
/// value for the rest of the loader's life.
pub struct DataLoader<F = DefaultFetcher> {
    source: DataSource,
    fetcher: F,
    cell: OnceCell<Dataset>,
}

impl DataLoader<DefaultFetcher> {
    pub fn new(source: DataSource) -> Self {
        DataLoader::with_fetcher(source, DefaultFetcher)
    }
}

impl<F: Fetch> DataLoader<F> {
    pub fn with_fetcher(source: DataSource, fetcher: F) -> Self {
        DataLoader {
            source,
            fetcher,
            cell: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn load(&self) -> Result<&Dataset> {
        self.cell
            .get_or_try_init(|| fetch_dataset(&self.fetcher, &self.source))
    }
}

static SESSION_DATASET: OnceCell<Dataset> = OnceCell::new();

/// Process-wide dataset. The first successful call decides the source; later
/// calls return the cached value whatever source they name.
pub fn session_dataset<F: Fetch>(fetcher: &F, source: &DataSource) -> Result<&'static Dataset> {
    SESSION_DATASET.get_or_try_init(|| fetch_dataset(fetcher, source))
}

fn fetch_dataset<F: Fetch>(fetcher: &F, source: &DataSource) -> Result<Dataset> {
    let start_time = Instant::now();
    info!(action = "start", component = "data_loader", source = %source, "Fetching store dataset");

    let bytes = fetcher.fetch(source).map_err(|e| {
        warn!(action = "fetch", component = "data_loader", source = %source, error = %e, "Fetch failed");
        e
    })?;
    info!(
        action = "fetch",
        component = "data_loader",
        byte_count = bytes.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Fetched raw CSV"
    );

    let text = decode_latin1(&bytes);
    let dataset = Dataset::from_reader(&source.to_string(), text.as_bytes())?;

    info!(
        action = "complete",
        component = "data_loader",
        row_count = dataset.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Store dataset ready"
    );
    Ok(dataset)
}
