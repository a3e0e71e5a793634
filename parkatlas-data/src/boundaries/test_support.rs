//! Shared fixtures for boundary-loading tests.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::http::TransportError;

use super::source::{DatasetSource, DatasetUrl};

/// Stub [`DatasetSource`] backed by an in-memory payload.
#[derive(Debug)]
pub struct StubDatasetSource {
    url: DatasetUrl,
    payload: Vec<u8>,
    downloads: AtomicUsize,
}

impl StubDatasetSource {
    /// Construct a stub serving `payload` for `url`.
    pub fn new(url: DatasetUrl, payload: Vec<u8>) -> Self {
        Self {
            url,
            payload,
            downloads: AtomicUsize::new(0),
        }
    }

    /// Construct a stub with a default URL, keeping scenarios concise.
    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self::new(DatasetUrl::new("https://example.org/countries.geojson"), payload)
    }

    /// Number of times [`DatasetSource::download`] was invoked.
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetSource for StubDatasetSource {
    fn url(&self) -> &DatasetUrl {
        &self.url
    }

    async fn download(&self, sink: &mut (dyn Write + Send)) -> Result<u64, TransportError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        sink.write_all(&self.payload)
            .map_err(|source| TransportError::Network {
                url: self.url.as_ref().to_owned(),
                source,
            })?;
        Ok(self.payload.len() as u64)
    }
}

/// Minimal feature collection with one square country per supplied name.
///
/// Countries are unit squares offset along the longitude axis so each one is
/// distinct and valid.
pub fn square_countries_geojson(names: &[&str]) -> String {
    let features: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let offset = (index as f64) * 2.0;
            format!(
                r#"{{"type":"Feature","properties":{{"NAME":"{name}"}},"geometry":{{"type":"Polygon","coordinates":[[[{min},0.0],[{max},0.0],[{max},1.0],[{min},1.0],[{min},0.0]]]}}}}"#,
                min = offset,
                max = offset + 1.0,
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}
