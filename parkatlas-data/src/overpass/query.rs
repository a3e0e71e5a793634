//! Overpass QL construction from a boundary polygon and tag filter.
//!
//! Tag keys are OR'd through a union block, with one `poly:` clause per
//! polygon part exterior. The query timeout mirrors the HTTP request timeout
//! so the server gives up no later than the client.

use std::fmt::Write as _;
use std::time::Duration;

use geo::{Area, LineString};
use parkatlas_core::{Boundary, TagFilter, TagMatch};

const ELEMENT_KINDS: [&str; 3] = ["node", "way", "relation"];

/// Surface area of a boundary in square degrees, used by the area guard.
pub(super) fn area_sq_deg(boundary: &Boundary) -> f64 {
    boundary.geometry.unsigned_area()
}

pub(super) fn build_query(boundary: &Boundary, filter: &TagFilter, timeout: Duration) -> String {
    let mut query = String::new();
    let _ = writeln!(query, "[out:json][timeout:{}];", timeout.as_secs().max(1));
    query.push_str("(\n");
    for polygon in &boundary.geometry {
        let poly = poly_clause(polygon.exterior());
        for (key, matcher) in filter.iter() {
            let tag = tag_clause(key, matcher);
            for kind in ELEMENT_KINDS {
                let _ = writeln!(query, "  {kind}{tag}(poly:\"{poly}\");");
            }
        }
    }
    query.push_str(");\nout tags geom;\n");
    query
}

/// Space-separated `lat lon` pairs of the exterior ring, closing coordinate
/// omitted.
fn poly_clause(ring: &LineString<f64>) -> String {
    let coords = &ring.0;
    let open_len = coords.len().saturating_sub(1);
    let mut clause = String::new();
    for coord in coords.iter().take(open_len) {
        if !clause.is_empty() {
            clause.push(' ');
        }
        let _ = write!(clause, "{} {}", coord.y, coord.x);
    }
    clause
}

fn tag_clause(key: &str, matcher: &TagMatch) -> String {
    match matcher {
        TagMatch::Any => format!("[\"{}\"]", escape_literal(key)),
        TagMatch::Exact(value) => {
            format!("[\"{}\"=\"{}\"]", escape_literal(key), escape_literal(value))
        }
        TagMatch::AnyOf(values) => {
            let alternatives: Vec<String> = values.iter().map(|value| escape_regex(value)).collect();
            format!(
                "[\"{}\"~\"^({})$\"]",
                escape_literal(key),
                alternatives.join("|")
            )
        }
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a value for use inside an anchored QL regular expression. The QL
/// string layer consumes one level of backslashes, so regex metacharacters
/// need a doubled escape.
fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
            | '\\' => {
                escaped.push_str("\\\\");
                escaped.push(character);
            }
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(character),
        }
    }
    escaped
}
