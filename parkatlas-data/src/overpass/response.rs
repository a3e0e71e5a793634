//! Decoding of the query endpoint's JSON payload into raw feature records.
//!
//! Nodes become points, ways become lines or polygons depending on closure,
//! and multipolygon relations are assembled by stitching member segments
//! into rings. Elements whose geometry cannot be assembled are counted and
//! skipped; the caller decides how loudly to report them.

use geo::{Contains, Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use indexmap::IndexMap;
use parkatlas_core::{AttributeValue, Attributes, CountryName, RawFeatureRecord};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponse {
    #[serde(default)]
    pub(super) elements: Vec<RawElement>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawElement {
    #[serde(rename = "type")]
    kind: ElementKind,
    id: i64,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    geometry: Option<Vec<Vertex>>,
    #[serde(default)]
    members: Vec<RawMember>,
    #[serde(default)]
    tags: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    fn label(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Vertex {
    lat: f64,
    lon: f64,
}

impl From<Vertex> for Coord<f64> {
    fn from(vertex: Vertex) -> Self {
        Self {
            x: vertex.lon,
            y: vertex.lat,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Option<Vec<Vertex>>,
}

/// Records decoded from one response, plus the count of elements whose
/// geometry could not be assembled.
#[derive(Debug)]
pub(super) struct DecodedBatch {
    pub(super) records: Vec<RawFeatureRecord>,
    pub(super) skipped: usize,
}

pub(super) fn into_records(response: QueryResponse, country: &CountryName) -> DecodedBatch {
    let mut records = Vec::with_capacity(response.elements.len());
    let mut skipped = 0usize;
    for element in response.elements {
        match element_geometry(&element) {
            Some(geometry) => records.push(build_record(element, geometry, country)),
            None => skipped += 1,
        }
    }
    DecodedBatch { records, skipped }
}

fn build_record(
    element: RawElement,
    geometry: Geometry<f64>,
    country: &CountryName,
) -> RawFeatureRecord {
    let mut attributes = Attributes::new();
    // Row identifiers lead the attribute table, mirroring the upstream
    // element index; normalisation strips them later.
    attributes.insert(
        "element_type".to_owned(),
        AttributeValue::from(element.kind.label()),
    );
    attributes.insert("osmid".to_owned(), AttributeValue::Number(element.id as f64));
    let name = element.tags.get("name").cloned();
    for (key, value) in element.tags {
        attributes.insert(key, AttributeValue::Text(value));
    }
    RawFeatureRecord {
        name,
        country: country.clone(),
        attributes,
        geometry,
    }
}

fn element_geometry(element: &RawElement) -> Option<Geometry<f64>> {
    match element.kind {
        ElementKind::Node => {
            let (lat, lon) = (element.lat?, element.lon?);
            Some(Geometry::Point(Point::new(lon, lat)))
        }
        ElementKind::Way => {
            let vertices = element.geometry.as_ref()?;
            way_geometry(vertices)
        }
        ElementKind::Relation => {
            assemble_relation(&element.members).map(Geometry::MultiPolygon)
        }
    }
}

fn way_geometry(vertices: &[Vertex]) -> Option<Geometry<f64>> {
    if vertices.len() < 2 {
        return None;
    }
    let coords: Vec<Coord<f64>> = vertices.iter().copied().map(Coord::from).collect();
    let closed = coords.len() >= 4 && coords.first() == coords.last();
    if closed {
        Some(Geometry::Polygon(Polygon::new(
            LineString::new(coords),
            Vec::new(),
        )))
    } else {
        Some(Geometry::LineString(LineString::new(coords)))
    }
}

fn assemble_relation(members: &[RawMember]) -> Option<MultiPolygon<f64>> {
    let outers = closed_rings(member_segments(members, "outer"));
    if outers.is_empty() {
        return None;
    }
    let inners = closed_rings(member_segments(members, "inner"));

    let mut shells: Vec<Polygon<f64>> = outers
        .into_iter()
        .map(|ring| Polygon::new(ring, Vec::new()))
        .collect();
    for inner in inners {
        let Some(lead) = inner.0.first().copied() else {
            continue;
        };
        let probe = Point::from(lead);
        // Unmatched inner rings are dropped with their parent candidate.
        if let Some(shell) = shells.iter_mut().find(|shell| shell.contains(&probe)) {
            shell.interiors_push(inner);
        }
    }
    Some(MultiPolygon::new(shells))
}

fn member_segments(members: &[RawMember], role: &str) -> Vec<Vec<Coord<f64>>> {
    members
        .iter()
        .filter(|member| member.role == role)
        .filter_map(|member| member.geometry.as_ref())
        .map(|vertices| vertices.iter().copied().map(Coord::from).collect())
        .collect()
}

/// Stitch open segments into closed rings by matching endpoints; chains that
/// never close are discarded.
fn closed_rings(mut segments: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut rings = Vec::new();
    while let Some(mut ring) = segments.pop() {
        if ring.len() < 2 {
            continue;
        }
        loop {
            let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) else {
                break;
            };
            if first == last {
                if ring.len() >= 4 {
                    rings.push(LineString::new(ring));
                }
                break;
            }
            let continuation = segments.iter().position(|segment| {
                segment.first() == Some(&last) || segment.last() == Some(&last)
            });
            let Some(index) = continuation else {
                break;
            };
            let mut next = segments.swap_remove(index);
            if next.last() == Some(&last) {
                next.reverse();
            }
            ring.extend(next.into_iter().skip(1));
        }
    }
    rings
}
