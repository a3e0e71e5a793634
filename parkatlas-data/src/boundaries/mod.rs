//! Country-boundary acquisition: cached dataset downloads and the vector
//! reader that materialises boundary polygons.
#![forbid(unsafe_code)]

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info};
use parkatlas_core::Boundary;

mod error;
mod reader;
mod source;

pub mod test_support;

pub use error::BoundaryError;
pub use reader::read_boundary_dataset;
pub use source::{DatasetSource, DatasetUrl, HttpDatasetSource};

#[cfg(test)]
mod tests;

/// Load the full boundary set, downloading the dataset on first use.
///
/// The raw dataset is cached under `cache_dir` by its URL file name; a cached
/// artefact is reused without contacting the network, so repeated runs are
/// idempotent. Every failure here is fatal: partial country coverage is never
/// acceptable.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use parkatlas_data::boundaries::{DatasetUrl, HttpDatasetSource, load_boundaries};
///
/// # async fn example() -> Result<(), parkatlas_data::boundaries::BoundaryError> {
/// let source = HttpDatasetSource::new(DatasetUrl::new(
///     "https://example.org/countries.geojson",
/// ));
/// let boundaries = load_boundaries(&source, Path::new("./data")).await?;
/// println!("{} countries", boundaries.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_boundaries<S: DatasetSource + ?Sized>(
    source: &S,
    cache_dir: &Path,
) -> Result<Vec<Boundary>, BoundaryError> {
    let path = cached_dataset_path(source.url(), cache_dir)?;
    if path.exists() {
        debug!("reusing cached boundary dataset at {path:?}");
    } else {
        download_to_cache(source, &path).await?;
    }
    read_boundary_dataset(&path)
}

fn cached_dataset_path(url: &DatasetUrl, cache_dir: &Path) -> Result<PathBuf, BoundaryError> {
    let file_name = url
        .file_name()
        .ok_or_else(|| BoundaryError::DatasetFileName {
            url: url.as_ref().to_owned(),
        })?;
    Ok(cache_dir.join(file_name))
}

async fn download_to_cache<S: DatasetSource + ?Sized>(
    source: &S,
    path: &Path,
) -> Result<(), BoundaryError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| BoundaryError::CreateCacheDir {
            source,
            path: parent.to_path_buf(),
        })?;
    }
    // Download to a sibling first so an interrupted transfer never poisons
    // the cache.
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);
    let mut file = fs::File::create(&partial).map_err(|source| BoundaryError::WriteDataset {
        source,
        path: partial.clone(),
    })?;
    let bytes = source
        .download(&mut file)
        .await
        .map_err(|source| BoundaryError::Download { source })?;
    file.flush().map_err(|source| BoundaryError::WriteDataset {
        source,
        path: partial.clone(),
    })?;
    drop(file);
    fs::rename(&partial, path).map_err(|source| BoundaryError::WriteDataset {
        source,
        path: path.to_path_buf(),
    })?;
    info!("downloaded boundary dataset ({bytes} bytes) to {path:?}");
    Ok(())
}
