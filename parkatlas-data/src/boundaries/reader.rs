//! Materialises the cached vector dataset into boundary polygons.
//!
//! The reader understands GeoJSON feature collections, plain or inside a zip
//! archive. GeoJSON fixes the reference system to WGS84, so a legacy `crs`
//! member naming anything else is rejected rather than reprojected.

use std::fs;
use std::io::Read;
use std::path::Path;

use geo::{Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson};
use log::warn;
use parkatlas_core::{Boundary, CountryName};

use super::error::BoundaryError;

/// Property keys tried, in order, for the country name.
const NAME_PROPERTIES: [&str; 3] = ["NAME", "ADMIN", "name"];

/// Read the cached dataset at `path` into the boundary set.
///
/// Features without a name or without polygonal geometry are skipped with a
/// warning; a dataset yielding no boundary at all is a parse-level failure.
pub fn read_boundary_dataset(path: &Path) -> Result<Vec<Boundary>, BoundaryError> {
    let raw = read_raw(path)?;
    parse_boundaries(&raw, path)
}

fn read_raw(path: &Path) -> Result<String, BoundaryError> {
    let is_zip = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("zip"));
    if is_zip {
        read_zip_entry(path)
    } else {
        fs::read_to_string(path).map_err(|source| BoundaryError::ReadDataset {
            source,
            path: path.to_path_buf(),
        })
    }
}

fn read_zip_entry(path: &Path) -> Result<String, BoundaryError> {
    let file = fs::File::open(path).map_err(|source| BoundaryError::ReadDataset {
        source,
        path: path.to_path_buf(),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| BoundaryError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|source| BoundaryError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        let entry_name = entry.name().to_ascii_lowercase();
        if entry_name.ends_with(".geojson") || entry_name.ends_with(".json") {
            let mut contents = String::new();
            entry
                .read_to_string(&mut contents)
                .map_err(|source| BoundaryError::ReadDataset {
                    source,
                    path: path.to_path_buf(),
                })?;
            return Ok(contents);
        }
    }
    Err(BoundaryError::Parse {
        path: path.to_path_buf(),
        source: "archive contains no GeoJSON entry".into(),
    })
}

fn parse_boundaries(raw: &str, path: &Path) -> Result<Vec<Boundary>, BoundaryError> {
    let geojson: GeoJson = raw.parse().map_err(|source: geojson::Error| BoundaryError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    let collection =
        FeatureCollection::try_from(geojson).map_err(|source| BoundaryError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
    check_crs(&collection, path)?;

    let mut boundaries = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(name) = feature_name(&feature) else {
            warn!("skipping boundary feature without a name property");
            continue;
        };
        let Some(encoded) = feature.geometry else {
            warn!("skipping boundary {name}: feature has no geometry");
            continue;
        };
        let geometry = match Geometry::<f64>::try_from(encoded) {
            Ok(geometry) => geometry,
            Err(error) => {
                warn!("skipping boundary {name}: {error}");
                continue;
            }
        };
        let Some(polygons) = polygonal(geometry) else {
            warn!("skipping boundary {name}: geometry is not polygonal");
            continue;
        };
        boundaries.push(Boundary::new(CountryName::new(name), polygons));
    }
    if boundaries.is_empty() {
        return Err(BoundaryError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }
    Ok(boundaries)
}

fn check_crs(collection: &FeatureCollection, path: &Path) -> Result<(), BoundaryError> {
    let Some(members) = &collection.foreign_members else {
        return Ok(());
    };
    let Some(declared) = members
        .get("crs")
        .and_then(|crs| crs.get("properties"))
        .and_then(|properties| properties.get("name"))
        .and_then(|name| name.as_str())
    else {
        return Ok(());
    };
    if declared.contains("CRS84") || declared.contains("4326") {
        Ok(())
    } else {
        Err(BoundaryError::UnsupportedCrs {
            path: path.to_path_buf(),
            found: declared.to_owned(),
        })
    }
}

fn feature_name(feature: &Feature) -> Option<String> {
    let properties = feature.properties.as_ref()?;
    NAME_PROPERTIES.iter().find_map(|key| {
        properties
            .get(*key)
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    })
}

fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(polygons) => Some(polygons),
        _ => None,
    }
}
