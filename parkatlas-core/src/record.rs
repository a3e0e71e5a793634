//! Raw and normalised feature records.
//!
//! A raw record mirrors what the feature-query collaborator returned for one
//! element: free-form ordered attributes plus the country label of the
//! boundary that produced it. Normalisation flattens that shape into
//! `{name, country, properties, geometry}`.

use geo::Geometry;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::boundary::CountryName;

/// Ordered attribute table; iteration follows the order keys were reported.
pub type Attributes = IndexMap<String, AttributeValue>;

/// A single scalar attribute value.
///
/// `Null` entries and NaN numbers count as absent and never survive
/// normalisation.
///
/// # Examples
/// ```
/// use parkatlas_core::AttributeValue;
///
/// assert!(AttributeValue::Null.is_absent());
/// assert!(AttributeValue::Number(f64::NAN).is_absent());
/// assert!(!AttributeValue::Text("alpine".into()).is_absent());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Free-form text.
    Text(String),
    /// Numeric value; NaN is treated as absent.
    Number(f64),
    /// Boolean flag.
    Bool(bool),
    /// Explicitly absent value.
    Null,
}

impl AttributeValue {
    /// Whether the value carries no information.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(value) => value.is_nan(),
            Self::Text(_) | Self::Bool(_) => false,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Serialize for AttributeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Text(value) => serializer.serialize_str(value),
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Null => serializer.serialize_none(),
        }
    }
}

/// One feature as returned by a successful boundary query.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatureRecord {
    /// Feature name, when the source reported one.
    pub name: Option<String>,
    /// Country label of the boundary whose query produced the record.
    pub country: CountryName,
    /// Free-form attributes in reported order, row identifiers included.
    pub attributes: Attributes,
    /// Geometry in the canonical reference system, any single- or multi-part
    /// kind.
    pub geometry: Geometry<f64>,
}

/// A record after schema normalisation; immutable from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalisedRecord {
    /// Feature name, when present.
    pub name: Option<String>,
    /// Country label, never empty.
    pub country: CountryName,
    /// Sanitised, collision-free properties with no absent values.
    pub properties: Attributes,
    /// Geometry in the canonical reference system.
    pub geometry: Geometry<f64>,
}
