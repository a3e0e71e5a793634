//! Facade crate for the park atlas harvest pipeline.
//!
//! This crate re-exports the core domain types and, behind the default
//! `pipeline` feature, the I/O adapters and the end-to-end run entry point.

#![forbid(unsafe_code)]

pub use parkatlas_core::{
    AttributeValue, Boundary, CountryName, Crs, GeometryClass, NormalisedRecord, OutputLayer,
    RawFeatureRecord, RepairError, TagFilter, TagMatch, UnclassifiedPolicy, normalise_records,
    partition_records, repair_geometry, sanitise_key,
};

#[cfg(feature = "pipeline")]
pub use parkatlas_data::{PipelineConfig, PipelineError, PipelineReport, run_harvest};
