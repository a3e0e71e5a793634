//! I/O adapters and orchestration for the park atlas harvest.
//!
//! Responsibilities:
//! - Obtain and cache the country-boundary dataset, and materialise it into
//!   boundary polygons.
//! - Query the feature database once per boundary across a fixed-size pool,
//!   isolating per-boundary failure.
//! - Persist normalised, geometry-homogeneous layers into one container
//!   artefact.
//!
//! Boundaries:
//! - Domain rules (repair, normalisation, partitioning) live in
//!   `parkatlas-core`.
//! - Keep blocking I/O off async executors; prefer async-capable clients.
//!
//! Invariants:
//! - No global mutable state; configuration is threaded explicitly.

#![forbid(unsafe_code)]

pub mod boundaries;
pub mod container;
mod http;
pub mod overpass;
pub mod pipeline;
pub mod test_support;

pub use http::{DEFAULT_USER_AGENT, TransportError};
pub use pipeline::{PipelineConfig, PipelineError, PipelineReport, run_harvest};
