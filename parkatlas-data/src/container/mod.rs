//! Persistence of normalised layers into a single SQLite container artefact.
#![forbid(unsafe_code)]

mod persistence;
mod schema;

pub use persistence::{AtlasContainer, ContainerError, LayerSink};
pub use schema::ContainerSchemaError;
