//! Schema normalisation: one flat record shape out of heterogeneous
//! per-country attribute tables.
//!
//! The merge is deterministic for a fixed input: attribute keys are sanitised
//! and deduplicated in first-seen column order, row identifiers from the
//! upstream feature database are dropped, and absent values never reach the
//! properties map.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::record::{Attributes, NormalisedRecord, RawFeatureRecord};

/// Attribute keys that identify rows in the upstream feature database rather
/// than describing the feature itself.
const ROW_IDENTIFIER_KEYS: [&str; 2] = ["osmid", "element_type"];

/// Column names reserved by the flat record shape.
const RESERVED_COLUMNS: [&str; 3] = ["name", "country", "geometry"];

/// Sanitise one attribute key: lower-case, with `:` and spaces replaced by
/// underscores.
///
/// # Examples
/// ```
/// use parkatlas_core::sanitise_key;
///
/// assert_eq!(sanitise_key("Protect Class"), "protect_class");
/// assert_eq!(sanitise_key("ref:WDPA"), "ref_wdpa");
/// ```
#[must_use]
pub fn sanitise_key(key: &str) -> String {
    key.to_lowercase().replace([':', ' '], "_")
}

/// Merge raw per-country results into the normalised record set.
///
/// The input is treated as an unordered multiset; output order follows input
/// order but nothing downstream may depend on it. Running the normaliser on
/// its own output performs no further renames.
#[must_use]
pub fn normalise_records(records: Vec<RawFeatureRecord>) -> Vec<NormalisedRecord> {
    let columns = column_mapping(&records);
    records
        .into_iter()
        .map(|record| project(record, &columns))
        .collect()
}

/// Assign every raw attribute key its final column name, first-seen wins the
/// unsuffixed form and later collisions gain `_<n>`.
fn column_mapping(records: &[RawFeatureRecord]) -> IndexMap<String, String> {
    let mut columns: IndexMap<String, String> = IndexMap::new();
    let mut used: HashSet<String> = HashSet::new();
    for record in records {
        for key in record.attributes.keys() {
            if is_row_identifier(key) || columns.contains_key(key) {
                continue;
            }
            let base = sanitise_key(key);
            let assigned = if used.contains(&base) {
                let mut suffix = 1usize;
                loop {
                    let candidate = format!("{base}_{suffix}");
                    if !used.contains(&candidate) {
                        break candidate;
                    }
                    suffix += 1;
                }
            } else {
                base
            };
            used.insert(assigned.clone());
            columns.insert(key.clone(), assigned);
        }
    }
    columns
}

fn project(record: RawFeatureRecord, columns: &IndexMap<String, String>) -> NormalisedRecord {
    let mut properties = Attributes::new();
    for (key, value) in record.attributes {
        if is_row_identifier(&key) || value.is_absent() {
            continue;
        }
        let Some(column) = columns.get(&key) else {
            continue;
        };
        if RESERVED_COLUMNS.contains(&column.as_str()) {
            continue;
        }
        properties.insert(column.clone(), value);
    }
    NormalisedRecord {
        name: record.name,
        country: record.country,
        properties,
        geometry: record.geometry,
    }
}

fn is_row_identifier(key: &str) -> bool {
    ROW_IDENTIFIER_KEYS.contains(&key)
}
