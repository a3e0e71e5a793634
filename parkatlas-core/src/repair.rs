//! Topological validation and repair for harvested geometries.
//!
//! A geometry that already validates passes through untouched. An invalid one
//! is rebuilt from cleaned parts: non-finite coordinates and consecutive
//! duplicates are removed, degenerate rings are discarded, and polygonal
//! parts are re-unioned so self-intersections and overlaps resolve into a
//! valid shape. When nothing valid survives the geometry is reported as
//! irreparable and the caller drops the record.

use geo::algorithm::orient::{Direction, Orient};
use geo::{
    BooleanOps, Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon, Validation,
};
use thiserror::Error;

/// Error raised when a geometry cannot be made valid deterministically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepairError {
    /// No valid shape survived the repair attempt.
    #[error("{kind} geometry could not be repaired")]
    Unrepairable {
        /// Human-readable geometry kind, for the caller's log line.
        kind: &'static str,
    },
}

impl RepairError {
    fn unrepairable(kind: &'static str) -> Self {
        Self::Unrepairable { kind }
    }
}

/// Return a topologically valid geometry of the same logical class, or an
/// error when deterministic repair is impossible.
///
/// Valid input is returned unchanged. A polygon whose repair splits it into
/// several parts comes back as the multi-part form.
///
/// # Examples
/// ```
/// use geo::{Geometry, LineString, Polygon};
/// use parkatlas_core::repair_geometry;
///
/// let square = Polygon::new(
///     LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
///     vec![],
/// );
/// let repaired = repair_geometry(Geometry::Polygon(square.clone())).unwrap();
/// assert_eq!(repaired, Geometry::Polygon(square));
/// ```
pub fn repair_geometry(geometry: Geometry<f64>) -> Result<Geometry<f64>, RepairError> {
    if geometry_is_valid(&geometry) {
        return Ok(geometry);
    }
    match geometry {
        Geometry::Point(point) => repair_point(point).map(Geometry::Point),
        Geometry::MultiPoint(points) => repair_multi_point(points).map(Geometry::MultiPoint),
        Geometry::Line(line) => {
            repair_line_string(LineString::from(line)).map(Geometry::LineString)
        }
        Geometry::LineString(line) => repair_line_string(line).map(Geometry::LineString),
        Geometry::MultiLineString(lines) => {
            repair_multi_line_string(lines).map(Geometry::MultiLineString)
        }
        Geometry::Polygon(polygon) => repair_parts(vec![polygon]).map(single_or_multi),
        Geometry::MultiPolygon(polygons) => {
            repair_parts(polygons.0).map(Geometry::MultiPolygon)
        }
        Geometry::Rect(rect) => repair_parts(vec![rect.to_polygon()]).map(Geometry::MultiPolygon),
        Geometry::Triangle(triangle) => {
            repair_parts(vec![triangle.to_polygon()]).map(Geometry::MultiPolygon)
        }
        Geometry::GeometryCollection(_) => Err(RepairError::unrepairable("geometry collection")),
    }
}

/// Repair a boundary outline, keeping the multi-polygon form.
pub fn repair_multi_polygon(
    polygons: MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, RepairError> {
    if multi_polygon_is_valid(&polygons) {
        return Ok(polygons);
    }
    repair_parts(polygons.0)
}

fn single_or_multi(mut repaired: MultiPolygon<f64>) -> Geometry<f64> {
    if repaired.0.len() == 1
        && let Some(only) = repaired.0.pop()
    {
        Geometry::Polygon(only)
    } else {
        Geometry::MultiPolygon(repaired)
    }
}

fn repair_point(point: Point<f64>) -> Result<Point<f64>, RepairError> {
    if coord_is_finite(point.0) {
        Ok(point)
    } else {
        Err(RepairError::unrepairable("point"))
    }
}

fn repair_multi_point(points: MultiPoint<f64>) -> Result<MultiPoint<f64>, RepairError> {
    let kept: Vec<Point<f64>> = points
        .into_iter()
        .filter(|point| coord_is_finite(point.0))
        .collect();
    if kept.is_empty() {
        Err(RepairError::unrepairable("multi-point"))
    } else {
        Ok(MultiPoint::new(kept))
    }
}

fn repair_line_string(line: LineString<f64>) -> Result<LineString<f64>, RepairError> {
    clean_line(line).ok_or(RepairError::unrepairable("line"))
}

fn repair_multi_line_string(
    lines: MultiLineString<f64>,
) -> Result<MultiLineString<f64>, RepairError> {
    let kept: Vec<LineString<f64>> = lines.0.into_iter().filter_map(clean_line).collect();
    if kept.is_empty() {
        Err(RepairError::unrepairable("multi-line"))
    } else {
        Ok(MultiLineString::new(kept))
    }
}

fn repair_parts(parts: Vec<Polygon<f64>>) -> Result<MultiPolygon<f64>, RepairError> {
    let cleaned: Vec<Polygon<f64>> = parts.into_iter().filter_map(clean_polygon).collect();
    if cleaned.is_empty() {
        return Err(RepairError::unrepairable("polygon"));
    }
    // Union resolves self-intersections and overlapping parts.
    let mut unioned = MultiPolygon::new(Vec::new());
    for polygon in cleaned {
        unioned = unioned.union(&MultiPolygon::new(vec![polygon]));
    }
    let oriented = unioned.orient(Direction::Default);
    if oriented.0.is_empty() || !multi_polygon_is_valid(&oriented) {
        Err(RepairError::unrepairable("polygon"))
    } else {
        Ok(oriented)
    }
}

fn clean_line(line: LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> =
        line.0.into_iter().filter(|coord| coord_is_finite(*coord)).collect();
    coords.dedup();
    (coords.len() >= 2).then(|| LineString::new(coords))
}

fn clean_polygon(polygon: Polygon<f64>) -> Option<Polygon<f64>> {
    let (exterior, interiors) = polygon.into_inner();
    let exterior = clean_ring(exterior)?;
    let interiors: Vec<LineString<f64>> = interiors.into_iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

fn clean_ring(ring: LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> =
        ring.0.into_iter().filter(|coord| coord_is_finite(*coord)).collect();
    coords.dedup();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied())
        && first == last
    {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Some(LineString::new(coords))
}

fn geometry_is_valid(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(point) => coord_is_finite(point.0),
        Geometry::MultiPoint(points) => {
            !points.0.is_empty() && points.iter().all(|point| coord_is_finite(point.0))
        }
        Geometry::Line(line) => {
            coord_is_finite(line.start) && coord_is_finite(line.end) && line.start != line.end
        }
        Geometry::LineString(line) => line_string_is_valid(line),
        Geometry::MultiLineString(lines) => {
            !lines.0.is_empty() && lines.iter().all(line_string_is_valid)
        }
        Geometry::Polygon(polygon) => {
            polygon_coords_finite(polygon) && polygon.is_valid()
        }
        Geometry::MultiPolygon(polygons) => multi_polygon_is_valid(polygons),
        Geometry::Rect(rect) => {
            coord_is_finite(rect.min()) && coord_is_finite(rect.max()) && rect.min() != rect.max()
        }
        Geometry::Triangle(triangle) => {
            let polygon = triangle.to_polygon();
            polygon_coords_finite(&polygon) && polygon.is_valid()
        }
        Geometry::GeometryCollection(collection) => {
            !collection.0.is_empty() && collection.iter().all(geometry_is_valid)
        }
    }
}

fn multi_polygon_is_valid(polygons: &MultiPolygon<f64>) -> bool {
    !polygons.0.is_empty()
        && polygons.iter().all(polygon_coords_finite)
        && polygons.is_valid()
}

fn line_string_is_valid(line: &LineString<f64>) -> bool {
    line.0.len() >= 2
        && line.0.iter().all(|coord| coord_is_finite(*coord))
        && line.0.windows(2).any(|pair| pair.first() != pair.last())
}

fn polygon_coords_finite(polygon: &Polygon<f64>) -> bool {
    polygon
        .exterior()
        .0
        .iter()
        .chain(polygon.interiors().iter().flat_map(|ring| ring.0.iter()))
        .all(|coord| coord_is_finite(*coord))
}

fn coord_is_finite(coord: Coord<f64>) -> bool {
    coord.x.is_finite() && coord.y.is_finite()
}

#[cfg(test)]
mod tests {
    use geo::GeometryCollection;
    use rstest::rstest;

    use super::*;

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        )
    }

    fn bowtie() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]),
            vec![],
        )
    }

    #[test]
    fn valid_geometry_passes_through_unchanged() {
        let original = Geometry::Polygon(square());
        let repaired = repair_geometry(original.clone()).expect("valid polygon should pass");
        assert_eq!(repaired, original);
    }

    #[test]
    fn self_intersecting_polygon_is_rebuilt() {
        let repaired =
            repair_geometry(Geometry::Polygon(bowtie())).expect("bowtie should be repairable");
        assert!(geometry_is_valid(&repaired));
        match repaired {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {}
            other => panic!("expected a polygonal result, got {other:?}"),
        }
    }

    #[test]
    fn boundary_outline_keeps_its_multi_polygon_form() {
        let outline = MultiPolygon::new(vec![bowtie()]);
        let repaired = repair_multi_polygon(outline).expect("outline should be repairable");
        assert!(multi_polygon_is_valid(&repaired));
    }

    #[rstest]
    #[case(Geometry::Point(Point::new(f64::NAN, 0.0)), "point")]
    #[case(Geometry::LineString(LineString::from(vec![(1.0, 1.0), (1.0, 1.0)])), "line")]
    #[case(Geometry::GeometryCollection(GeometryCollection::default()), "geometry collection")]
    fn irreparable_geometry_is_reported(
        #[case] geometry: Geometry<f64>,
        #[case] kind: &'static str,
    ) {
        let error = repair_geometry(geometry).expect_err("expected an irreparable geometry");
        assert_eq!(error, RepairError::Unrepairable { kind });
    }

    #[test]
    fn repair_drops_non_finite_and_duplicate_line_coordinates() {
        let line =
            LineString::from(vec![(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (f64::NAN, 2.0)]);
        let repaired = repair_geometry(Geometry::LineString(line)).expect("line is repairable");
        assert_eq!(
            repaired,
            Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]))
        );
    }

    #[test]
    fn non_finite_points_are_dropped_from_multi_points() {
        let points = MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)]);
        let repaired =
            repair_geometry(Geometry::MultiPoint(points)).expect("one point survives");
        assert_eq!(
            repaired,
            Geometry::MultiPoint(MultiPoint::new(vec![Point::new(0.0, 0.0)]))
        );
    }
}
