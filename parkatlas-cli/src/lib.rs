//! Command-line surface for the batch harvest.
//!
//! A single non-interactive entry point with no required arguments: it loads
//! (or reuses) the boundary dataset, fans the feature queries out, and writes
//! a timestamped container by default. Individual country failures only show
//! up in the log and the summary; the process still exits successfully.
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use parkatlas_core::{TagFilter, TagMatch, UnclassifiedPolicy};
use parkatlas_data::boundaries::{DatasetUrl, HttpDatasetSource};
use parkatlas_data::overpass::{DEFAULT_ENDPOINT, FetcherConfig, HttpFeatureSource};
use parkatlas_data::{
    DEFAULT_USER_AGENT, PipelineConfig, PipelineError, PipelineReport, run_harvest,
};
use thiserror::Error;

/// Natural Earth admin-0 countries, GeoJSON distribution.
const DEFAULT_COUNTRIES_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_admin_0_countries.geojson";

/// Run the harvester with the current process arguments.
pub async fn run() -> Result<(), CliError> {
    let arguments = Arguments::parse();
    execute(arguments).await
}

async fn execute(arguments: Arguments) -> Result<(), CliError> {
    let filter = parse_tag_filters(&arguments.tags)?;
    let output_path = arguments
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&arguments.cache_dir));
    let mut fetcher = FetcherConfig {
        concurrency: arguments.concurrency,
        request_timeout: Duration::from_secs(arguments.timeout_secs),
        ..FetcherConfig::default()
    };
    if let Some(limit) = arguments.max_area_sq_deg {
        fetcher.max_query_area_sq_deg = limit;
    }

    let dataset = HttpDatasetSource::new(DatasetUrl::new(arguments.countries_url.clone()))
        .with_user_agent(arguments.user_agent.clone());
    let features = Arc::new(
        HttpFeatureSource::new(arguments.endpoint.clone(), fetcher.clone())
            .with_user_agent(arguments.user_agent.clone()),
    );
    let config = PipelineConfig {
        cache_dir: arguments.cache_dir.clone(),
        output_path,
        filter,
        fetcher,
        unclassified: if arguments.keep_unclassified {
            UnclassifiedPolicy::Retain
        } else {
            UnclassifiedPolicy::Drop
        },
    };

    let report = run_harvest(&dataset, features, &config).await?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    match &report.output_path {
        Some(path) => println!(
            "Saved {} features across {} layers to {}",
            report.features_written,
            report.layers.len(),
            path.display()
        ),
        None => println!("Nothing to save: no boundary produced any features"),
    }
    if !report.failed.is_empty() {
        println!(
            "{} of {} boundaries failed; see the log for details",
            report.failed.len(),
            report.boundaries
        );
    }
}

fn default_output_path(cache_dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    cache_dir.join(format!("national_parks-{stamp}.sqlite"))
}

/// Parse repeatable `key`, `key=value` or `key=a|b` specifications.
fn parse_tag_filters(specifications: &[String]) -> Result<TagFilter, CliError> {
    let mut filter = TagFilter::new();
    for specification in specifications {
        let (key, values) = match specification.split_once('=') {
            Some((key, values)) => (key.trim(), Some(values)),
            None => (specification.trim(), None),
        };
        if key.is_empty() {
            return Err(CliError::InvalidTagFilter {
                specification: specification.clone(),
            });
        }
        let Some(values) = values else {
            filter.insert(key, TagMatch::Any);
            continue;
        };
        let mut accepted: Vec<String> = values
            .split('|')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        match accepted.len() {
            0 => {
                return Err(CliError::InvalidTagFilter {
                    specification: specification.clone(),
                });
            }
            1 => {
                let Some(only) = accepted.pop() else {
                    continue;
                };
                filter.insert(key, TagMatch::Exact(only));
            }
            _ => filter.insert(key, TagMatch::AnyOf(accepted)),
        }
    }
    Ok(filter)
}

#[derive(Debug, Parser)]
#[command(
    name = "parkatlas",
    about = "Harvest worldwide protected-area geometries into one layered artefact",
    version
)]
struct Arguments {
    /// URL of the boundary dataset (GeoJSON, plain or zipped)
    #[arg(long = "countries-url", value_name = "url", default_value = DEFAULT_COUNTRIES_URL)]
    countries_url: String,
    /// Directory holding the cached dataset and the default output
    #[arg(long = "cache-dir", value_name = "path", default_value = "./data")]
    cache_dir: PathBuf,
    /// Output container path (defaults to a timestamped file under the cache
    /// directory)
    #[arg(short, long, value_name = "path")]
    output: Option<PathBuf>,
    /// Tag filter: `key`, `key=value` or `key=a|b` (repeatable)
    #[arg(long = "tag", value_name = "filter", default_value = "boundary=national_park")]
    tags: Vec<String>,
    /// Number of boundary queries in flight at once
    #[arg(long, value_name = "n", default_value_t = 4)]
    concurrency: usize,
    /// Per-query timeout in seconds
    #[arg(long = "timeout-secs", value_name = "secs", default_value_t = 180)]
    timeout_secs: u64,
    /// Upper bound on a boundary's query area, in square degrees
    #[arg(long = "max-area-sq-deg", value_name = "area")]
    max_area_sq_deg: Option<f64>,
    /// Override the feature-query endpoint (for testing)
    #[arg(long, value_name = "url", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Custom HTTP user agent string
    #[arg(long, value_name = "agent", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Keep unclassifiable geometries under an "other" layer
    #[arg(long)]
    keep_unclassified: bool,
}

/// Errors emitted by the harvester CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--tag` specification was malformed.
    #[error("invalid tag filter {specification:?} (expected key, key=value or key=a|b)")]
    InvalidTagFilter { specification: String },
    /// The harvest aborted on a fatal pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[cfg(test)]
mod tests;
