//! Shared HTTP transport plumbing for the dataset and feature sources.

use std::io;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

/// User agent sent with every outbound request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "parkatlas-etl/0.1";

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description supplied by the server.
        message: String,
    },
    /// The request failed due to an I/O error.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
}

pub(crate) fn build_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()
        .expect("client builder only fails with invalid configuration")
}

pub(crate) fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error),
    }
}
