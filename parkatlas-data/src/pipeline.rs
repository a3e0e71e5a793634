//! End-to-end harvest pipeline: load, repair, fetch, normalise, partition,
//! persist.
//!
//! Fatal errors (boundary dataset, container artefact) propagate; everything
//! else is contained at the smallest possible scope and surfaced through the
//! log and the returned report. A run with zero successful fetches completes
//! successfully having written nothing.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use parkatlas_core::{
    CountryName, TagFilter, UnclassifiedPolicy, normalise_records, partition_records,
    repair_multi_polygon,
};
use thiserror::Error;

use crate::boundaries::{BoundaryError, DatasetSource, load_boundaries};
use crate::container::{AtlasContainer, ContainerError, LayerSink};
use crate::overpass::{FeatureSource, FetcherConfig, fetch_features};

/// Everything one harvest run needs, threaded explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for the cached boundary dataset.
    pub cache_dir: PathBuf,
    /// Destination of the container artefact.
    pub output_path: PathBuf,
    /// Tag filter selecting candidate features.
    pub filter: TagFilter,
    /// Fetch-stage configuration.
    pub fetcher: FetcherConfig,
    /// Policy for geometries outside the three layer classes.
    pub unclassified: UnclassifiedPolicy,
}

/// Errors that abort a harvest run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The boundary dataset could not be obtained or read.
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
    /// The container artefact could not be written.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Summary of one harvest run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Boundaries that entered the fetch stage.
    pub boundaries: usize,
    /// Boundaries dropped because their outline was irreparable.
    pub dropped_boundaries: usize,
    /// Countries whose query succeeded.
    pub succeeded: Vec<CountryName>,
    /// Countries whose query failed.
    pub failed: Vec<CountryName>,
    /// Fetched features dropped for irreparable geometry.
    pub dropped_geometries: usize,
    /// Features written across all layers.
    pub features_written: usize,
    /// Written layers with their record counts.
    pub layers: Vec<(String, usize)>,
    /// Location of the artefact, when anything was written.
    pub output_path: Option<PathBuf>,
}

/// Run the full harvest.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use parkatlas_core::{TagFilter, TagMatch, UnclassifiedPolicy};
/// use parkatlas_data::boundaries::{DatasetUrl, HttpDatasetSource};
/// use parkatlas_data::overpass::{DEFAULT_ENDPOINT, FetcherConfig, HttpFeatureSource};
/// use parkatlas_data::{PipelineConfig, run_harvest};
///
/// # async fn example() -> Result<(), parkatlas_data::PipelineError> {
/// let fetcher = FetcherConfig::default();
/// let dataset = HttpDatasetSource::new(DatasetUrl::new(
///     "https://example.org/countries.geojson",
/// ));
/// let features = Arc::new(HttpFeatureSource::new(DEFAULT_ENDPOINT, fetcher.clone()));
/// let config = PipelineConfig {
///     cache_dir: "./data".into(),
///     output_path: "./data/parks.sqlite".into(),
///     filter: TagFilter::new().with("boundary", TagMatch::Exact("national_park".into())),
///     fetcher,
///     unclassified: UnclassifiedPolicy::Drop,
/// };
/// let report = run_harvest(&dataset, features, &config).await?;
/// println!("{} features written", report.features_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest<D, S>(
    dataset: &D,
    features: Arc<S>,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError>
where
    D: DatasetSource + ?Sized,
    S: FeatureSource + 'static,
{
    let mut report = PipelineReport::default();

    let loaded = load_boundaries(dataset, &config.cache_dir).await?;
    let mut boundaries = Vec::with_capacity(loaded.len());
    for mut boundary in loaded {
        match repair_multi_polygon(boundary.geometry) {
            Ok(geometry) => {
                boundary.geometry = geometry;
                boundaries.push(boundary);
            }
            Err(error) => {
                warn!("dropping boundary {}: {error}", boundary.name);
                report.dropped_boundaries += 1;
            }
        }
    }
    report.boundaries = boundaries.len();
    info!("loaded {} country boundaries", report.boundaries);

    let fetched = fetch_features(features, boundaries, &config.filter, &config.fetcher).await;
    report.succeeded = fetched.succeeded;
    report.failed = fetched
        .failed
        .into_iter()
        .map(|(country, _)| country)
        .collect();
    report.dropped_geometries = fetched.dropped_geometries;

    if fetched.records.is_empty() {
        warn!("no features fetched from any boundary; nothing to save");
        return Ok(report);
    }

    let normalised = normalise_records(fetched.records);
    let layers = partition_records(normalised, config.unclassified);
    if layers.is_empty() {
        warn!("no classifiable features; nothing to save");
        return Ok(report);
    }

    let mut container = AtlasContainer::create(&config.output_path)?;
    for layer in &layers {
        container.persist_layer(layer)?;
        info!(
            "wrote layer '{}' with {} features",
            layer.name(),
            layer.records.len()
        );
        report.features_written += layer.records.len();
        report
            .layers
            .push((layer.name().to_owned(), layer.records.len()));
    }
    report.output_path = Some(config.output_path.clone());
    Ok(report)
}
