//! Tag filters selecting candidate features.
//!
//! A filter maps attribute keys to the values that qualify a feature as a
//! protected area. Keys are OR'd at the top level by the query stage: a
//! feature matches when any single entry matches.

use indexmap::IndexMap;
use indexmap::map::Entry;

/// Accepted values for one tag key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatch {
    /// The key must be present, with any value.
    Any,
    /// The key must carry exactly this value.
    Exact(String),
    /// The key must carry one of these values.
    AnyOf(Vec<String>),
}

/// Ordered mapping of tag key to accepted values.
///
/// Inserting the same key twice merges the accepted values rather than
/// replacing them.
///
/// # Examples
/// ```
/// use parkatlas_core::{TagFilter, TagMatch};
///
/// let mut filter = TagFilter::new();
/// filter.insert("boundary", TagMatch::Exact("national_park".into()));
/// filter.insert("boundary", TagMatch::Exact("protected_area".into()));
/// filter.insert("leisure", TagMatch::Any);
///
/// assert_eq!(filter.len(), 2);
/// let (key, matcher) = filter.iter().next().unwrap();
/// assert_eq!(key, "boundary");
/// assert_eq!(
///     *matcher,
///     TagMatch::AnyOf(vec!["national_park".into(), "protected_area".into()])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagFilter {
    entries: IndexMap<String, TagMatch>,
}

impl TagFilter {
    /// Construct an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, merging accepted values with any existing entry.
    pub fn insert(&mut self, key: impl Into<String>, matcher: TagMatch) {
        match self.entries.entry(key.into()) {
            Entry::Occupied(mut occupied) => {
                let merged = combine(occupied.get().clone(), matcher);
                occupied.insert(merged);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(matcher);
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, matcher: TagMatch) -> Self {
        self.insert(key, matcher);
        self
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagMatch)> {
        self.entries.iter().map(|(key, matcher)| (key.as_str(), matcher))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the filter has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn combine(existing: TagMatch, incoming: TagMatch) -> TagMatch {
    let values = |matcher: TagMatch| -> Option<Vec<String>> {
        match matcher {
            TagMatch::Any => None,
            TagMatch::Exact(value) => Some(vec![value]),
            TagMatch::AnyOf(values) => Some(values),
        }
    };
    let (Some(mut merged), Some(incoming)) = (values(existing), values(incoming)) else {
        return TagMatch::Any;
    };
    for value in incoming {
        if !merged.contains(&value) {
            merged.push(value);
        }
    }
    if merged.len() == 1 {
        let Some(only) = merged.pop() else {
            return TagMatch::Any;
        };
        TagMatch::Exact(only)
    } else {
        TagMatch::AnyOf(merged)
    }
}
