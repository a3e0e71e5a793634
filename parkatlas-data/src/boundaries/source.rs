//! Transport for the boundary dataset.

use std::fmt;
use std::io::Write;
use std::ops::Deref;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::http::{DEFAULT_USER_AGENT, TransportError, build_client, convert_reqwest_error};

/// Location of the boundary dataset.
///
/// # Examples
/// ```
/// use parkatlas_data::boundaries::DatasetUrl;
///
/// let url = DatasetUrl::new("https://example.org/ne_110m_admin_0_countries.zip");
/// assert_eq!(url.file_name().as_deref(), Some("ne_110m_admin_0_countries.zip"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUrl(String);

impl DatasetUrl {
    /// Construct a new [`DatasetUrl`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Final path segment, used as the cache file name.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        let parsed = Url::parse(&self.0).ok()?;
        let segment = parsed.path_segments()?.next_back()?;
        (!segment.is_empty()).then(|| segment.to_owned())
    }
}

impl From<&str> for DatasetUrl {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for DatasetUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for DatasetUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DatasetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability to fetch the raw boundary dataset.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Location of the dataset this source serves.
    fn url(&self) -> &DatasetUrl;
    /// Stream the dataset into `sink`, returning the byte count.
    async fn download(&self, sink: &mut (dyn Write + Send)) -> Result<u64, TransportError>;
}

/// HTTP implementation of [`DatasetSource`].
#[derive(Debug)]
pub struct HttpDatasetSource {
    client: Client,
    url: DatasetUrl,
    user_agent: String,
}

impl HttpDatasetSource {
    /// Construct an HTTP-backed dataset source.
    #[must_use]
    pub fn new(url: DatasetUrl) -> Self {
        Self {
            client: build_client(),
            url,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
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
impl DatasetSource for HttpDatasetSource {
    fn url(&self) -> &DatasetUrl {
        &self.url
    }

    async fn download(&self, sink: &mut (dyn Write + Send)) -> Result<u64, TransportError> {
        let url = self.url.as_ref();
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url))?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
        {
            sink.write_all(&chunk)
                .map_err(|source| TransportError::Network {
                    url: url.to_owned(),
                    source,
                })?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}
