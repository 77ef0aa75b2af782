use std::ops::Bound;

use serde_json::Value;

use crate::model::document::{resolve_path, Document};

/// Predicate over a document, evaluated by the collection during a scan.
///
/// Field paths are dotted and match if *any* value found at the path matches,
/// so `Eq { field: "addresses.city", .. }` holds when one of the addresses has
/// that city.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    And(Vec<Filter>),
    Eq {
        field: String,
        value: Value,
    },
    /// Case-sensitive string prefix
    StartsWith {
        field: String,
        prefix: String,
    },
    /// Literal substring, `needle` is stored lower-cased when `case_insensitive`
    Contains {
        field: String,
        needle: String,
        case_insensitive: bool,
    },
    Range {
        field: String,
        lower: Bound<i64>,
        upper: Bound<i64>,
    },
}

impl Filter {
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn starts_with(field: &str, prefix: &str) -> Self {
        Filter::StartsWith {
            field: field.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn contains_ignore_case(field: &str, needle: &str) -> Self {
        Filter::Contains {
            field: field.to_string(),
            needle: needle.to_lowercase(),
            case_insensitive: true,
        }
    }

    /// `min <= field <= max`
    pub fn between_inclusive(field: &str, min: i64, max: i64) -> Self {
        Filter::Range {
            field: field.to_string(),
            lower: Bound::Included(min),
            upper: Bound::Included(max),
        }
    }

    /// `min < field < max`
    pub fn between_exclusive(field: &str, min: i64, max: i64) -> Self {
        Filter::Range {
            field: field.to_string(),
            lower: Bound::Excluded(min),
            upper: Bound::Excluded(max),
        }
    }

    /// Folds a list of filters with a logical AND. No filters matches
    /// everything, a single filter is returned unwrapped.
    pub fn all_of(mut filters: Vec<Filter>) -> Self {
        match filters.len() {
            0 => Filter::All,
            1 => filters.remove(0),
            _ => Filter::And(filters),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
            Filter::Eq { field, value } => {
                candidates(document, field).any(|candidate| candidate == value)
            }
            Filter::StartsWith { field, prefix } => candidates(document, field)
                .filter_map(|candidate| candidate.as_str())
                .any(|candidate| candidate.starts_with(prefix.as_str())),
            Filter::Contains {
                field,
                needle,
                case_insensitive,
            } => candidates(document, field)
                .filter_map(|candidate| candidate.as_str())
                .any(|candidate| {
                    if *case_insensitive {
                        candidate.to_lowercase().contains(needle.as_str())
                    } else {
                        candidate.contains(needle.as_str())
                    }
                }),
            Filter::Range {
                field,
                lower,
                upper,
            } => candidates(document, field)
                .filter_map(|candidate| candidate.as_f64())
                .any(|number| above(number, lower) && below(number, upper)),
        }
    }
}

/// Values at the path, with a trailing array contributing each of its elements
fn candidates<'a>(document: &'a Document, field: &str) -> impl Iterator<Item = &'a Value> {
    resolve_path(document, field)
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<&Value>>(),
            other => vec![other],
        })
}

fn above(number: f64, lower: &Bound<i64>) -> bool {
    match lower {
        Bound::Included(min) => number >= *min as f64,
        Bound::Excluded(min) => number > *min as f64,
        Bound::Unbounded => true,
    }
}

fn below(number: f64, upper: &Bound<i64>) -> bool {
    match upper {
        Bound::Included(max) => number <= *max as f64,
        Bound::Excluded(max) => number < *max as f64,
        Bound::Unbounded => true,
    }
}
