//! Error types produced by the boundary-loading stage.

use std::error::Error as StdError;
use std::{io, path::PathBuf};

use thiserror::Error;

use crate::http::TransportError;

/// Errors produced while obtaining or reading the country-boundary dataset.
///
/// Every variant aborts the whole run: the harvest requires the full
/// boundary set, so no partial coverage is acceptable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoundaryError {
    /// The dataset URL carries no usable file name for the cache.
    #[error("boundary dataset URL {url} has no usable file name")]
    DatasetFileName { url: String },
    /// The cache directory could not be created.
    #[error("failed to create cache directory {path:?}: {source}")]
    CreateCacheDir { source: io::Error, path: PathBuf },
    /// The remote fetch did not succeed.
    #[error("failed to download boundary dataset: {source}")]
    Download { source: TransportError },
    /// The downloaded dataset could not be written to the cache.
    #[error("failed to write boundary dataset to {path:?}: {source}")]
    WriteDataset { source: io::Error, path: PathBuf },
    /// The cached dataset could not be read back.
    #[error("failed to read boundary dataset at {path:?}: {source}")]
    ReadDataset { source: io::Error, path: PathBuf },
    /// The cached artefact is not a vector dataset this reader understands.
    #[error("failed to parse boundary dataset at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The dataset declares a reference system other than WGS84.
    #[error("boundary dataset at {path:?} declares CRS {found:?}; expected WGS84 longitude/latitude")]
    UnsupportedCrs { path: PathBuf, found: String },
    /// The dataset parsed but contained no usable country polygons.
    #[error("boundary dataset at {path:?} contains no usable country polygons")]
    EmptyDataset { path: PathBuf },
}
