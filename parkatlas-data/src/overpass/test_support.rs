//! Shared fixtures for feature-query tests.

use std::collections::HashMap;
use std::io;

use async_trait::async_trait;
use geo::Geometry;
use parkatlas_core::{Attributes, Boundary, CountryName, RawFeatureRecord, TagFilter};

use crate::http::TransportError;

use super::source::{FeatureSource, QueryError};

/// Outcome a [`StubFeatureSource`] replays for one country.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Succeed with these records (country label applied by the stub).
    Records(Vec<RawFeatureRecord>),
    /// Fail as if the request timed out.
    Timeout,
    /// Fail as if the query matched nothing.
    Empty,
}

/// Stub [`FeatureSource`] replaying scripted outcomes per country.
///
/// Boundaries without a script behave like an empty query result.
#[derive(Debug, Default)]
pub struct StubFeatureSource {
    outcomes: HashMap<String, ScriptedOutcome>,
}

impl StubFeatureSource {
    /// Construct a stub with no scripted outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for one country.
    #[must_use]
    pub fn with(mut self, country: &str, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(country.to_owned(), outcome);
        self
    }
}

#[async_trait]
impl FeatureSource for StubFeatureSource {
    async fn query(
        &self,
        boundary: &Boundary,
        _filter: &TagFilter,
    ) -> Result<Vec<RawFeatureRecord>, QueryError> {
        match self.outcomes.get(boundary.name.as_ref()) {
            Some(ScriptedOutcome::Records(records)) => Ok(records
                .iter()
                .cloned()
                .map(|mut record| {
                    record.country = boundary.name.clone();
                    record
                })
                .collect()),
            Some(ScriptedOutcome::Timeout) => Err(QueryError::Transport(TransportError::Network {
                url: "stub://interpreter".to_owned(),
                source: io::Error::new(io::ErrorKind::TimedOut, "scripted timeout"),
            })),
            Some(ScriptedOutcome::Empty) | None => Err(QueryError::Empty),
        }
    }
}

/// A record awaiting its country label, the shape the stub replays.
pub fn unlabelled_record(name: Option<&str>, geometry: Geometry<f64>) -> RawFeatureRecord {
    RawFeatureRecord {
        name: name.map(ToOwned::to_owned),
        country: CountryName::new(""),
        attributes: Attributes::new(),
        geometry,
    }
}
