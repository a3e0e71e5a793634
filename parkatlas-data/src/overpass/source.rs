//! Query transport for the feature database.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use parkatlas_core::{Boundary, RawFeatureRecord, TagFilter};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use thiserror::Error;

use crate::http::{DEFAULT_USER_AGENT, TransportError, build_client, convert_reqwest_error};

use super::query::{area_sq_deg, build_query};
use super::response::{QueryResponse, into_records};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Surface area of the whole globe in square degrees; the default area limit
/// admits any boundary.
const GLOBE_AREA_SQ_DEG: f64 = 360.0 * 180.0;

/// Immutable configuration for the fetch stage.
///
/// Threaded explicitly into the source and the orchestrator; there is no
/// process-wide query-engine state.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Number of boundary queries in flight at once.
    pub concurrency: usize,
    /// Per-request timeout, also advertised to the query server.
    pub request_timeout: Duration,
    /// Upper bound on a boundary's area before its query is refused.
    pub max_query_area_sq_deg: f64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            request_timeout: Duration::from_secs(180),
            max_query_area_sq_deg: GLOBE_AREA_SQ_DEG,
        }
    }
}

/// Errors raised by one boundary's feature query.
///
/// All variants are recoverable at the batch level: the orchestrator logs
/// them and the run continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The HTTP exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The payload was not the JSON shape the decoder expects.
    #[error("failed to decode query response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
    /// The boundary exceeds the configured query area.
    #[error("boundary covers {area:.1} square degrees, above the limit of {limit:.1}")]
    AreaTooLarge { area: f64, limit: f64 },
    /// The query succeeded but matched nothing.
    #[error("query returned no candidate features")]
    Empty,
}

/// Capability to fetch candidate features for one boundary.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Query features inside `boundary` matching `filter`, labelled with the
    /// boundary's country name.
    async fn query(
        &self,
        boundary: &Boundary,
        filter: &TagFilter,
    ) -> Result<Vec<RawFeatureRecord>, QueryError>;
}

/// HTTP implementation of [`FeatureSource`] against an Overpass interpreter.
#[derive(Debug)]
pub struct HttpFeatureSource {
    client: Client,
    endpoint: String,
    user_agent: String,
    config: FetcherConfig,
}

impl HttpFeatureSource {
    /// Construct an HTTP-backed feature source.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, config: FetcherConfig) -> Self {
        Self {
            client: build_client(),
            endpoint: endpoint.into(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            config,
        }
    }

    /// Override the default user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl FeatureSource for HttpFeatureSource {
    async fn query(
        &self,
        boundary: &Boundary,
        filter: &TagFilter,
    ) -> Result<Vec<RawFeatureRecord>, QueryError> {
        let area = area_sq_deg(boundary);
        if area > self.config.max_query_area_sq_deg {
            return Err(QueryError::AreaTooLarge {
                area,
                limit: self.config.max_query_area_sq_deg,
            });
        }
        let query = build_query(boundary, filter, self.config.request_timeout);
        debug!("querying features for {}", boundary.name);
        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, self.user_agent.as_str())
            .timeout(self.config.request_timeout)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, &self.endpoint))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, &self.endpoint))?;
        let payload = response
            .bytes()
            .await
            .map_err(|err| convert_reqwest_error(err, &self.endpoint))?;
        let decoded: QueryResponse =
            serde_json::from_slice(&payload).map_err(|source| QueryError::Decode { source })?;
        let batch = into_records(decoded, &boundary.name);
        if batch.skipped > 0 {
            debug!(
                "{}: skipped {} elements without assemblable geometry",
                boundary.name, batch.skipped
            );
        }
        if batch.records.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(batch.records)
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPolygon, Polygon};
    use parkatlas_core::CountryName;
    use rstest::rstest;

    use crate::test_support::block_on_for_tests;

    use super::*;

    fn boundary_with_extent(extent: f64) -> Boundary {
        let square = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (extent, 0.0),
                (extent, extent),
                (0.0, extent),
                (0.0, 0.0),
            ]),
            vec![],
        );
        Boundary::new(CountryName::new("X"), MultiPolygon::new(vec![square]))
    }

    #[rstest]
    fn oversized_boundaries_are_refused_without_a_request() {
        let config = FetcherConfig {
            max_query_area_sq_deg: 1.0,
            ..FetcherConfig::default()
        };
        // The endpoint is unroutable; the guard must fire before any I/O.
        let source = HttpFeatureSource::new("http://127.0.0.1:0/interpreter", config);
        let filter = TagFilter::new();
        let outcome = block_on_for_tests(source.query(&boundary_with_extent(3.0), &filter));
        assert!(matches!(
            outcome,
            Err(QueryError::AreaTooLarge { area, limit })
                if (area - 9.0).abs() < 1.0e-9 && (limit - 1.0).abs() < 1.0e-9
        ));
    }

    #[test]
    fn default_configuration_matches_the_documented_surface() {
        let config = FetcherConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(180));
        assert!((config.max_query_area_sq_deg - 64_800.0).abs() < 1.0e-9);
    }
}
