//! Country boundaries and the canonical coordinate reference system.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude` throughout;
//! a [`Boundary`] serves both as the query region for one country and as the
//! country label attached to every record it produces.

use std::fmt;
use std::ops::Deref;

use geo::MultiPolygon;

/// Identifier of a coordinate reference system.
///
/// # Examples
/// ```
/// use parkatlas_core::Crs;
///
/// let crs = Crs::wgs84();
/// assert!(crs.is_canonical());
/// assert_eq!(crs.as_ref(), "EPSG:4326");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs(String);

impl Crs {
    /// Construct a [`Crs`] from an owned or borrowed identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The canonical geographic reference system: WGS84 longitude/latitude.
    #[must_use]
    pub fn wgs84() -> Self {
        Self("EPSG:4326".to_owned())
    }

    /// Whether this identifier names the canonical reference system.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        matches!(
            self.0.as_str(),
            "EPSG:4326" | "OGC:CRS84" | "urn:ogc:def:crs:OGC:1.3:CRS84"
        )
    }
}

impl AsRef<str> for Crs {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the country a boundary delimits.
///
/// The name doubles as the record label downstream, so it supports ordering
/// and hashing for stable reporting.
///
/// # Examples
/// ```
/// use parkatlas_core::CountryName;
///
/// let name = CountryName::new("Iceland");
/// assert_eq!(name.as_ref(), "Iceland");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryName(String);

impl CountryName {
    /// Construct a new [`CountryName`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for CountryName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for CountryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for CountryName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for CountryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named polygon delimiting one country's territory.
///
/// The geometry must be valid before the boundary is used for querying;
/// irreparable boundaries are dropped by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Country name, attached to every record the boundary produces.
    pub name: CountryName,
    /// Territory outline, always in the canonical reference system.
    pub geometry: MultiPolygon<f64>,
    /// Reference system of `geometry`.
    pub crs: Crs,
}

impl Boundary {
    /// Construct a boundary in the canonical reference system.
    ///
    /// # Examples
    /// ```
    /// use geo::{Coord, LineString, MultiPolygon, Polygon};
    /// use parkatlas_core::{Boundary, CountryName};
    ///
    /// let square = Polygon::new(
    ///     LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
    ///     vec![],
    /// );
    /// let boundary = Boundary::new(CountryName::new("X"), MultiPolygon::new(vec![square]));
    /// assert!(boundary.crs.is_canonical());
    /// ```
    pub fn new(name: CountryName, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name,
            geometry,
            crs: Crs::wgs84(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_crs_accepts_known_identifiers() {
        assert!(Crs::wgs84().is_canonical());
        assert!(Crs::new("OGC:CRS84").is_canonical());
        assert!(!Crs::new("EPSG:3857").is_canonical());
    }

    #[test]
    fn country_names_order_stably() {
        let mut names = vec![CountryName::new("Chile"), CountryName::new("Austria")];
        names.sort();
        assert_eq!(names.first().map(AsRef::as_ref), Some("Austria"));
    }
}
