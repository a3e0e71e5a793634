use clap::Parser;
use rstest::rstest;

use super::*;

#[test]
fn parses_without_any_arguments() {
    let arguments = Arguments::try_parse_from(["parkatlas"]).expect("defaults should parse");
    assert_eq!(arguments.countries_url, DEFAULT_COUNTRIES_URL);
    assert_eq!(arguments.cache_dir, PathBuf::from("./data"));
    assert_eq!(arguments.output, None);
    assert_eq!(arguments.tags, vec!["boundary=national_park".to_owned()]);
    assert_eq!(arguments.concurrency, 4);
    assert_eq!(arguments.timeout_secs, 180);
    assert_eq!(arguments.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(arguments.user_agent, DEFAULT_USER_AGENT);
    assert!(!arguments.keep_unclassified);
}

#[test]
fn parses_overrides() {
    let arguments = Arguments::try_parse_from([
        "parkatlas",
        "--countries-url",
        "https://mirror.local/countries.zip",
        "--cache-dir",
        "/tmp/harvest",
        "--output",
        "/tmp/harvest/out.sqlite",
        "--tag",
        "boundary=national_park",
        "--tag",
        "leisure=nature_reserve|park",
        "--concurrency",
        "8",
        "--timeout-secs",
        "60",
        "--max-area-sq-deg",
        "2500",
        "--endpoint",
        "https://overpass.local/api/interpreter",
        "--user-agent",
        "agent/1.0",
        "--keep-unclassified",
    ])
    .expect("overrides should parse");
    assert_eq!(arguments.tags.len(), 2);
    assert_eq!(arguments.concurrency, 8);
    assert_eq!(arguments.max_area_sq_deg, Some(2500.0));
    assert!(arguments.keep_unclassified);
}

#[rstest]
#[case(&["boundary"], 1)]
#[case(&["boundary=national_park"], 1)]
#[case(&["boundary=national_park|protected_area", "leisure=park"], 2)]
fn tag_specifications_build_filters(#[case] specifications: &[&str], #[case] expected_keys: usize) {
    let specifications: Vec<String> =
        specifications.iter().map(|value| (*value).to_owned()).collect();
    let filter = parse_tag_filters(&specifications).expect("specification should parse");
    assert_eq!(filter.len(), expected_keys);
}

#[test]
fn repeated_tag_keys_merge_their_values() {
    let specifications = vec![
        "boundary=national_park".to_owned(),
        "boundary=protected_area".to_owned(),
    ];
    let filter = parse_tag_filters(&specifications).expect("specification should parse");
    assert_eq!(filter.len(), 1);
    let matcher = filter.iter().next().map(|(_, matcher)| matcher.clone());
    assert_eq!(
        matcher,
        Some(TagMatch::AnyOf(vec![
            "national_park".to_owned(),
            "protected_area".to_owned()
        ]))
    );
}

#[rstest]
#[case("=national_park")]
#[case("boundary=")]
#[case("")]
fn malformed_tag_specifications_are_rejected(#[case] specification: &str) {
    let outcome = parse_tag_filters(&[specification.to_owned()]);
    assert!(matches!(
        outcome,
        Err(CliError::InvalidTagFilter { .. })
    ));
}

#[test]
fn default_output_is_timestamped_under_the_cache_directory() {
    let path = default_output_path(Path::new("/tmp/harvest"));
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .expect("output path should have a file name");
    assert!(name.starts_with("national_parks-"));
    assert!(name.ends_with(".sqlite"));
    assert!(path.starts_with("/tmp/harvest"));
}
