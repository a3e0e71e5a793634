//! Core domain types and algorithms for the park atlas harvest.
//!
//! These models cover the pure stages of the pipeline: country boundaries,
//! raw and normalised feature records, geometry repair, schema normalisation
//! and geometry-class partitioning. Everything here is deterministic and free
//! of I/O; transports and persistence live in `parkatlas-data`.

#![forbid(unsafe_code)]

pub mod boundary;
pub mod filter;
pub mod normalise;
pub mod partition;
pub mod record;
pub mod repair;

pub use boundary::{Boundary, CountryName, Crs};
pub use filter::{TagFilter, TagMatch};
pub use normalise::{normalise_records, sanitise_key};
pub use partition::{GeometryClass, OutputLayer, UnclassifiedPolicy, partition_records};
pub use record::{AttributeValue, Attributes, NormalisedRecord, RawFeatureRecord};
pub use repair::{RepairError, repair_geometry, repair_multi_polygon};
