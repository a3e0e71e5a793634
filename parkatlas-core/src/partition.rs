//! Geometry-class partitioning and multi-part promotion.
//!
//! Every record lands in at most one layer; geometry kinds outside the three
//! classes follow the configured [`UnclassifiedPolicy`] instead of an
//! accident of the routing logic.

use std::fmt;

use geo::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon};

use crate::record::NormalisedRecord;

/// Closed set of geometry classes a layer can hold.
///
/// # Examples
/// ```
/// use geo::{Geometry, Point};
/// use parkatlas_core::GeometryClass;
///
/// let class = GeometryClass::of(&Geometry::Point(Point::new(0.0, 0.0)));
/// assert_eq!(class, GeometryClass::Point);
/// assert_eq!(class.layer_name(), "points");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryClass {
    /// Points and multi-points.
    Point,
    /// Lines, line strings and multi-line strings.
    Line,
    /// Polygons, multi-polygons, rectangles and triangles.
    Polygon,
    /// Everything else (geometry collections).
    Unclassified,
}

impl GeometryClass {
    /// Classify a geometry by its base type.
    #[must_use]
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Self::Point,
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Self::Line
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Self::Polygon,
            Geometry::GeometryCollection(_) => Self::Unclassified,
        }
    }

    /// Name of the layer holding this class in the output artefact.
    #[must_use]
    pub fn layer_name(self) -> &'static str {
        match self {
            Self::Point => "points",
            Self::Line => "lines",
            Self::Polygon => "polygons",
            Self::Unclassified => "other",
        }
    }

    /// Short label for manifests and log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Line => "Line",
            Self::Polygon => "Polygon",
            Self::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for GeometryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do with records whose geometry falls outside the three classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnclassifiedPolicy {
    /// Exclude them from every layer.
    #[default]
    Drop,
    /// Retain them under an "other" layer, geometry unchanged.
    Retain,
}

/// A geometry-homogeneous record set destined for one named layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayer {
    /// Class every record in the layer shares.
    pub class: GeometryClass,
    /// Records with geometry promoted to the multi-part form.
    pub records: Vec<NormalisedRecord>,
}

impl OutputLayer {
    /// Name of the layer inside the output artefact.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.class.layer_name()
    }
}

/// Promote a single-part geometry to its multi-part form; multi-part
/// geometry passes through unchanged.
///
/// # Examples
/// ```
/// use geo::{Geometry, MultiPoint, Point};
/// use parkatlas_core::partition::promote_to_multi;
///
/// let promoted = promote_to_multi(Geometry::Point(Point::new(1.0, 2.0)));
/// assert_eq!(
///     promoted,
///     Geometry::MultiPoint(MultiPoint::new(vec![Point::new(1.0, 2.0)]))
/// );
/// ```
#[must_use]
pub fn promote_to_multi(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Point(point) => Geometry::MultiPoint(MultiPoint::new(vec![point])),
        Geometry::Line(line) => {
            Geometry::MultiLineString(MultiLineString::new(vec![LineString::from(line)]))
        }
        Geometry::LineString(line) => Geometry::MultiLineString(MultiLineString::new(vec![line])),
        Geometry::Polygon(polygon) => Geometry::MultiPolygon(MultiPolygon::new(vec![polygon])),
        Geometry::Rect(rect) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![rect.to_polygon()]))
        }
        Geometry::Triangle(triangle) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![triangle.to_polygon()]))
        }
        other => other,
    }
}

/// Split the normalised record set into geometry-homogeneous layers.
///
/// Empty classes produce no layer at all. Layer order is fixed (points,
/// lines, polygons, other) regardless of input order.
#[must_use]
pub fn partition_records(
    records: Vec<NormalisedRecord>,
    policy: UnclassifiedPolicy,
) -> Vec<OutputLayer> {
    let mut points = Vec::new();
    let mut lines = Vec::new();
    let mut polygons = Vec::new();
    let mut other = Vec::new();
    for mut record in records {
        let class = GeometryClass::of(&record.geometry);
        match class {
            GeometryClass::Unclassified => {
                if policy == UnclassifiedPolicy::Retain {
                    other.push(record);
                }
            }
            _ => {
                record.geometry = promote_to_multi(record.geometry);
                match class {
                    GeometryClass::Point => points.push(record),
                    GeometryClass::Line => lines.push(record),
                    _ => polygons.push(record),
                }
            }
        }
    }
    [
        (GeometryClass::Point, points),
        (GeometryClass::Line, lines),
        (GeometryClass::Polygon, polygons),
        (GeometryClass::Unclassified, other),
    ]
    .into_iter()
    .filter(|(_, records)| !records.is_empty())
    .map(|(class, records)| OutputLayer { class, records })
    .collect()
}

#[cfg(test)]
mod tests {
    use geo::{GeometryCollection, Point, Polygon};
    use rstest::rstest;

    use super::*;
    use crate::record::Attributes;

    fn record(geometry: Geometry<f64>) -> NormalisedRecord {
        NormalisedRecord {
            name: None,
            country: "X".into(),
            properties: Attributes::new(),
            geometry,
        }
    }

    fn unit_square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        )
    }

    #[rstest]
    #[case(Geometry::Point(Point::new(0.0, 0.0)), GeometryClass::Point)]
    #[case(Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])), GeometryClass::Line)]
    #[case(Geometry::Polygon(unit_square()), GeometryClass::Polygon)]
    #[case(
        Geometry::GeometryCollection(GeometryCollection::default()),
        GeometryClass::Unclassified
    )]
    fn classification_by_base_type(#[case] geometry: Geometry<f64>, #[case] expected: GeometryClass) {
        assert_eq!(GeometryClass::of(&geometry), expected);
    }

    #[test]
    fn multi_part_geometry_passes_promotion_unchanged() {
        let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![unit_square()]));
        assert_eq!(promote_to_multi(multi.clone()), multi);
    }

    #[test]
    fn records_land_in_exactly_one_layer() {
        let layers = partition_records(
            vec![
                record(Geometry::Point(Point::new(0.0, 0.0))),
                record(Geometry::Polygon(unit_square())),
            ],
            UnclassifiedPolicy::Drop,
        );
        let names: Vec<&str> = layers.iter().map(OutputLayer::name).collect();
        assert_eq!(names, vec!["points", "polygons"]);
        assert!(layers.iter().all(|layer| layer.records.len() == 1));
        for layer in &layers {
            for stored in &layer.records {
                assert_eq!(GeometryClass::of(&stored.geometry), layer.class);
            }
        }
    }

    #[test]
    fn empty_classes_produce_no_layer() {
        let layers = partition_records(
            vec![record(Geometry::Point(Point::new(0.0, 0.0)))],
            UnclassifiedPolicy::Drop,
        );
        assert_eq!(layers.len(), 1);
        assert_eq!(layers.first().map(OutputLayer::name), Some("points"));
    }

    #[rstest]
    #[case(UnclassifiedPolicy::Drop, 0)]
    #[case(UnclassifiedPolicy::Retain, 1)]
    fn unclassified_geometry_follows_the_policy(
        #[case] policy: UnclassifiedPolicy,
        #[case] expected_other_layers: usize,
    ) {
        let collection = Geometry::GeometryCollection(GeometryCollection::from(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
        ]));
        let layers = partition_records(vec![record(collection)], policy);
        let other_layers = layers
            .iter()
            .filter(|layer| layer.name() == "other")
            .count();
        assert_eq!(other_layers, expected_other_layers);
    }

    #[test]
    fn promotion_yields_multi_part_geometry() {
        let layers = partition_records(
            vec![record(Geometry::Point(Point::new(3.0, 4.0)))],
            UnclassifiedPolicy::Drop,
        );
        let geometry = layers
            .first()
            .and_then(|layer| layer.records.first())
            .map(|stored| stored.geometry.clone());
        assert_eq!(
            geometry,
            Some(Geometry::MultiPoint(MultiPoint::new(vec![Point::new(3.0, 4.0)])))
        );
    }
}
