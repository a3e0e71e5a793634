use std::fs;
use std::io::Write;

use rstest::{fixture, rstest};
use tempfile::TempDir;
use zip::write::FileOptions;

use crate::test_support::block_on_for_tests;

use super::test_support::{StubDatasetSource, square_countries_geojson};
use super::{BoundaryError, DatasetUrl, load_boundaries, read_boundary_dataset};

#[fixture]
fn cache_dir() -> TempDir {
    TempDir::new().expect("failed to create temporary cache directory")
}

#[rstest]
fn loads_named_square_countries(cache_dir: TempDir) {
    let payload = square_countries_geojson(&["X", "Y"]);
    let source = StubDatasetSource::with_payload(payload.into_bytes());
    let boundaries = block_on_for_tests(load_boundaries(&source, cache_dir.path()))
        .expect("dataset should load");
    let names: Vec<&str> = boundaries
        .iter()
        .map(|boundary| boundary.name.as_ref())
        .collect();
    assert_eq!(names, vec!["X", "Y"]);
    assert!(boundaries.iter().all(|boundary| boundary.crs.is_canonical()));
}

#[rstest]
fn cached_dataset_is_not_downloaded_twice(cache_dir: TempDir) {
    let payload = square_countries_geojson(&["X"]);
    let source = StubDatasetSource::with_payload(payload.into_bytes());
    block_on_for_tests(load_boundaries(&source, cache_dir.path())).expect("first load");
    block_on_for_tests(load_boundaries(&source, cache_dir.path())).expect("second load");
    assert_eq!(source.downloads(), 1, "cache should satisfy the second load");
}

#[rstest]
fn zipped_datasets_are_unpacked(cache_dir: TempDir) {
    let geojson = square_countries_geojson(&["Z"]);
    let zip_path = cache_dir.path().join("countries.zip");
    let file = fs::File::create(&zip_path).expect("failed to create zip file");
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(
            "countries.geojson",
            FileOptions::default().compression_method(zip::CompressionMethod::Stored),
        )
        .expect("failed to start zip entry");
    writer
        .write_all(geojson.as_bytes())
        .expect("failed to write zip entry");
    writer.finish().expect("failed to finish zip archive");

    let boundaries = read_boundary_dataset(&zip_path).expect("zip dataset should load");
    assert_eq!(
        boundaries.first().map(|boundary| boundary.name.as_ref()),
        Some("Z")
    );
}

#[rstest]
fn non_polygonal_features_are_skipped(cache_dir: TempDir) {
    let payload = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"NAME":"Pointland"},
         "geometry":{"type":"Point","coordinates":[0.0,0.0]}},
        {"type":"Feature","properties":{"NAME":"X"},
         "geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]}}
    ]}"#;
    let path = cache_dir.path().join("mixed.geojson");
    fs::write(&path, payload).expect("failed to seed dataset");
    let boundaries = read_boundary_dataset(&path).expect("dataset should load");
    assert_eq!(boundaries.len(), 1);
    assert_eq!(
        boundaries.first().map(|boundary| boundary.name.as_ref()),
        Some("X")
    );
}

#[rstest]
fn foreign_crs_is_rejected(cache_dir: TempDir) {
    let payload = r#"{"type":"FeatureCollection",
        "crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::3857"}},
        "features":[{"type":"Feature","properties":{"NAME":"X"},
         "geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]}}]}"#;
    let path = cache_dir.path().join("mercator.geojson");
    fs::write(&path, payload).expect("failed to seed dataset");
    let error = read_boundary_dataset(&path).expect_err("foreign CRS should be rejected");
    assert!(matches!(error, BoundaryError::UnsupportedCrs { found, .. } if found.contains("3857")));
}

#[rstest]
fn empty_datasets_are_a_parse_failure(cache_dir: TempDir) {
    let path = cache_dir.path().join("empty.geojson");
    fs::write(&path, r#"{"type":"FeatureCollection","features":[]}"#)
        .expect("failed to seed dataset");
    let error = read_boundary_dataset(&path).expect_err("empty dataset should fail");
    assert!(matches!(error, BoundaryError::EmptyDataset { .. }));
}

#[rstest]
fn unreadable_payload_is_a_parse_failure(cache_dir: TempDir) {
    let path = cache_dir.path().join("broken.geojson");
    fs::write(&path, "not geojson at all").expect("failed to seed dataset");
    let error = read_boundary_dataset(&path).expect_err("broken dataset should fail");
    assert!(matches!(error, BoundaryError::Parse { .. }));
}

#[test]
fn dataset_urls_expose_their_file_name() {
    let url = DatasetUrl::new("https://example.org/naturalearth/ne_10m_admin_0_countries.zip?x=1");
    assert_eq!(
        url.file_name().as_deref(),
        Some("ne_10m_admin_0_countries.zip")
    );
    assert_eq!(DatasetUrl::new("not a url").file_name(), None);
}
