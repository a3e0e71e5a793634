//! Feature retrieval from an Overpass-style query endpoint.
//!
//! Responsibilities:
//! - Build one QL query per boundary from the tag filter.
//! - Decode the JSON payload into raw feature records, assembling relation
//!   rings from member segments.
//! - Fan the queries out over a fixed-size pool, isolating per-boundary
//!   failure behind a result channel.
#![forbid(unsafe_code)]

mod fetch;
mod query;
mod response;
mod source;

pub mod test_support;

pub use fetch::{FetchReport, fetch_features};
pub use source::{DEFAULT_ENDPOINT, FeatureSource, FetcherConfig, HttpFeatureSource, QueryError};
