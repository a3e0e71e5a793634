//! Concurrent per-boundary fetch orchestration.
//!
//! One task per boundary runs on a fixed-size pool gated by a semaphore.
//! Every task emits exactly one outcome on the result channel and the
//! orchestrator drains the channel until all tasks have reported, in
//! completion order. A failing boundary never disturbs the rest of the
//! batch.

use std::sync::Arc;

use log::{info, warn};
use parkatlas_core::{Boundary, CountryName, RawFeatureRecord, TagFilter, repair_geometry};
use tokio::sync::{Semaphore, mpsc};

use super::source::{FeatureSource, FetcherConfig, QueryError};

/// Aggregate outcome of the fetch stage.
///
/// The distinct countries appearing in `records` are exactly the boundaries
/// whose query succeeded (less any whose every geometry proved irreparable).
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Candidate records from all successful queries, completion order.
    pub records: Vec<RawFeatureRecord>,
    /// Boundaries whose query succeeded.
    pub succeeded: Vec<CountryName>,
    /// Boundaries whose query failed, with the reason.
    pub failed: Vec<(CountryName, QueryError)>,
    /// Fetched features dropped because their geometry was irreparable.
    pub dropped_geometries: usize,
}

struct TaskOutcome {
    country: CountryName,
    outcome: Result<Vec<RawFeatureRecord>, QueryError>,
}

/// Fetch candidate features for every boundary.
///
/// Boundaries are read-only across tasks; the result channel is the only
/// shared mutable structure. Geometry repair runs on the draining side so
/// irreparable features are dropped with their country in the log line.
pub async fn fetch_features<S>(
    source: Arc<S>,
    boundaries: Vec<Boundary>,
    filter: &TagFilter,
    config: &FetcherConfig,
) -> FetchReport
where
    S: FeatureSource + 'static,
{
    let mut report = FetchReport::default();
    if boundaries.is_empty() {
        return report;
    }

    let (sender, mut receiver) = mpsc::channel(boundaries.len());
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    for boundary in boundaries {
        let sender = sender.clone();
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let filter = filter.clone();
        tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only fails if the
            // whole pool is torn down; the task then simply reports nothing.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let country = boundary.name.clone();
            let outcome = source.query(&boundary, &filter).await;
            let _ = sender.send(TaskOutcome { country, outcome }).await;
        });
    }
    drop(sender);

    while let Some(TaskOutcome { country, outcome }) = receiver.recv().await {
        match outcome {
            Ok(records) => {
                let mut kept = Vec::with_capacity(records.len());
                for mut record in records {
                    match repair_geometry(record.geometry) {
                        Ok(geometry) => {
                            record.geometry = geometry;
                            kept.push(record);
                        }
                        Err(error) => {
                            warn!(
                                "{country}: dropping feature {:?}: {error}",
                                record.name.as_deref().unwrap_or("<unnamed>")
                            );
                            report.dropped_geometries += 1;
                        }
                    }
                }
                info!("{country}: {} features", kept.len());
                report.records.extend(kept);
                report.succeeded.push(country);
            }
            Err(error) => {
                warn!("{country}: feature query failed: {error}");
                report.failed.push((country, error));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use geo::{Geometry, LineString, MultiPolygon, Point, Polygon};
    use rstest::rstest;

    use crate::test_support::block_on_for_tests;

    use super::super::test_support::{ScriptedOutcome, StubFeatureSource, unlabelled_record};
    use super::*;

    fn square_boundary(name: &str, offset: f64) -> Boundary {
        let square = Polygon::new(
            LineString::from(vec![
                (offset, 0.0),
                (offset + 1.0, 0.0),
                (offset + 1.0, 1.0),
                (offset, 1.0),
                (offset, 0.0),
            ]),
            vec![],
        );
        Boundary::new(CountryName::new(name), MultiPolygon::new(vec![square]))
    }

    fn point_record(name: &str) -> RawFeatureRecord {
        unlabelled_record(Some(name), Geometry::Point(Point::new(0.5, 0.5)))
    }

    #[rstest]
    fn records_are_labelled_with_their_boundary(#[values(1, 4)] concurrency: usize) {
        let source = Arc::new(
            StubFeatureSource::new()
                .with("X", ScriptedOutcome::Records(vec![point_record("a")]))
                .with("Y", ScriptedOutcome::Records(vec![point_record("b")])),
        );
        let config = FetcherConfig {
            concurrency,
            ..FetcherConfig::default()
        };
        let report = block_on_for_tests(fetch_features(
            source,
            vec![square_boundary("X", 0.0), square_boundary("Y", 2.0)],
            &TagFilter::new(),
            &config,
        ));
        assert_eq!(report.records.len(), 2);
        let countries: BTreeSet<&str> = report
            .records
            .iter()
            .map(|record| record.country.as_ref())
            .collect();
        assert_eq!(countries, BTreeSet::from(["X", "Y"]));
        assert!(report.failed.is_empty());
    }

    #[rstest]
    fn a_failing_boundary_does_not_disturb_the_batch() {
        let source = Arc::new(
            StubFeatureSource::new()
                .with("X", ScriptedOutcome::Records(vec![point_record("a")]))
                .with("Z", ScriptedOutcome::Timeout),
        );
        let report = block_on_for_tests(fetch_features(
            source,
            vec![square_boundary("X", 0.0), square_boundary("Z", 2.0)],
            &TagFilter::new(),
            &FetcherConfig::default(),
        ));
        assert!(report.records.iter().all(|record| record.country.as_ref() == "X"));
        assert_eq!(
            report.succeeded,
            vec![CountryName::new("X")],
            "only X should succeed"
        );
        assert_eq!(
            report.failed.iter().map(|(country, _)| country.as_ref()).collect::<Vec<_>>(),
            vec!["Z"]
        );
    }

    #[rstest]
    fn irreparable_geometries_are_dropped_and_counted() {
        let broken = unlabelled_record(None, Geometry::Point(Point::new(f64::NAN, 0.0)));
        let source = Arc::new(StubFeatureSource::new().with(
            "X",
            ScriptedOutcome::Records(vec![broken, point_record("ok")]),
        ));
        let report = block_on_for_tests(fetch_features(
            source,
            vec![square_boundary("X", 0.0)],
            &TagFilter::new(),
            &FetcherConfig::default(),
        ));
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.dropped_geometries, 1);
        assert_eq!(report.succeeded.len(), 1);
    }

    #[rstest]
    fn every_boundary_reports_exactly_once() {
        let names = ["A", "B", "C", "D", "E"];
        let mut stub = StubFeatureSource::new();
        for name in names {
            stub = stub.with(name, ScriptedOutcome::Empty);
        }
        let boundaries: Vec<Boundary> = names
            .iter()
            .enumerate()
            .map(|(index, name)| square_boundary(name, (index as f64) * 2.0))
            .collect();
        let report = block_on_for_tests(fetch_features(
            Arc::new(stub),
            boundaries,
            &TagFilter::new(),
            &FetcherConfig {
                concurrency: 2,
                ..FetcherConfig::default()
            },
        ));
        assert_eq!(report.succeeded.len() + report.failed.len(), names.len());
        assert!(report.records.is_empty());
    }
}
