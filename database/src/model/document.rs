use std::cmp::Ordering;

use serde_json::{Map, Value};

/// Schemaless record stored in a collection, always a JSON object once stored
pub type Document = Value;

/// Resolves a dotted path, fanning out through arrays on the way.
///
/// `addresses.city` on a person yields the city of every address. Values at the
/// end of the path are returned as is, arrays included.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];

    for segment in path.split('.') {
        let mut next = Vec::with_capacity(current.len());

        for value in current {
            match value {
                Value::Object(map) => next.extend(map.get(segment)),
                Value::Array(items) => next.extend(
                    items
                        .iter()
                        .filter_map(|item| item.as_object())
                        .filter_map(|map| map.get(segment)),
                ),
                _ => {}
            }
        }

        current = next;
    }

    current
}

/// Reads the value at a dotted path.
///
/// Walks objects only. If an array is hit half way the remaining path is
/// applied to each element and the results are gathered into an array.
pub fn lookup(document: &Value, path: &str) -> Option<Value> {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.peek() {
        match current {
            Value::Object(map) => {
                current = map.get(*segment)?;
                segments.next();
            }
            Value::Array(_) => {
                let rest = segments.collect::<Vec<&str>>().join(".");

                return Some(Value::Array(
                    resolve_path(current, &rest).into_iter().cloned().collect(),
                ));
            }
            _ => return None,
        }
    }

    Some(current.clone())
}

/// Writes a value at a dotted path, creating intermediate objects as needed.
/// Returns false when a non-object sits on the path.
pub fn set_path(document: &mut Value, path: &str, value: Value) -> bool {
    let Some((parent_path, field)) = split_parent(path) else {
        return match document.as_object_mut() {
            Some(map) => {
                map.insert(path.to_string(), value);
                true
            }
            None => false,
        };
    };

    let mut current = document;

    for segment in parent_path.split('.') {
        let Some(map) = current.as_object_mut() else {
            return false;
        };

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    match current.as_object_mut() {
        Some(map) => {
            map.insert(field.to_string(), value);
            true
        }
        None => false,
    }
}

/// Removes the value at a dotted path, if present
pub fn remove_path(document: &mut Value, path: &str) -> Option<Value> {
    match split_parent(path) {
        None => document.as_object_mut()?.remove(path),
        Some((parent_path, field)) => {
            let mut current = document;

            for segment in parent_path.split('.') {
                current = current.as_object_mut()?.get_mut(segment)?;
            }

            current.as_object_mut()?.remove(field)
        }
    }
}

fn split_parent(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('.')
}

/// Canonical ordering between document values: null, numbers, strings,
/// objects, arrays then booleans. A missing value sorts as null.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.unwrap_or(&Value::Null);
    let right = right.unwrap_or(&Value::Null);

    let rank_ordering = type_rank(left).cmp(&type_rank(right));

    if rank_ordering != Ordering::Equal {
        return rank_ordering;
    }

    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            let l = l.as_f64().unwrap_or(f64::NAN);
            let r = r.as_f64().unwrap_or(f64::NAN);

            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Array(l), Value::Array(r)) => l
            .iter()
            .zip(r.iter())
            .map(|(l, r)| compare_values(Some(l), Some(r)))
            .find(|ordering| ordering != &Ordering::Equal)
            .unwrap_or_else(|| l.len().cmp(&r.len())),
        (Value::Object(l), Value::Object(r)) => l
            .iter()
            .zip(r.iter())
            .map(|((l_key, l_value), (r_key, r_value))| {
                l_key
                    .cmp(r_key)
                    .then_with(|| compare_values(Some(l_value), Some(r_value)))
            })
            .find(|ordering| ordering != &Ordering::Equal)
            .unwrap_or_else(|| l.len().cmp(&r.len())),
        _ => Ordering::Equal,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn person() -> Value {
        json!({
            "_id": "1",
            "firstName": "Ada",
            "age": 36,
            "addresses": [{ "city": "London" }, { "city": "Paris" }, { "address1": "No city" }]
        })
    }

    mod paths {
        use super::*;

        #[test]
        fn resolve_fans_out_through_arrays() {
            let document = person();

            let cities = resolve_path(&document, "addresses.city");

            assert_eq!(cities, vec![&json!("London"), &json!("Paris")]);
        }

        #[test]
        fn resolve_missing_path_is_empty() {
            assert!(resolve_path(&person(), "lastName").is_empty());
            assert!(resolve_path(&person(), "age.value").is_empty());
        }

        #[test]
        fn lookup_gathers_values_below_an_array() {
            assert_eq!(
                lookup(&person(), "addresses.city"),
                Some(json!(["London", "Paris"]))
            );
            assert_eq!(lookup(&person(), "age"), Some(json!(36)));
            assert_eq!(lookup(&person(), "missing"), None);
        }

        #[test]
        fn set_creates_intermediate_objects() {
            let mut document = json!({ "_id": "1" });

            assert!(set_path(&mut document, "address.city", json!("Oslo")));
            assert_eq!(document, json!({ "_id": "1", "address": { "city": "Oslo" } }));

            assert!(!set_path(&mut document, "_id.nested", json!(1)));
        }

        #[test]
        fn remove_returns_removed_value() {
            let mut document = json!({ "_id": "1", "address": { "city": "Oslo" } });

            assert_eq!(remove_path(&mut document, "address.city"), Some(json!("Oslo")));
            assert_eq!(remove_path(&mut document, "address.city"), None);
            assert_eq!(remove_path(&mut document, "_id"), Some(json!("1")));
            assert_eq!(document, json!({ "address": {} }));
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn numbers_compare_across_integer_and_float() {
            assert_eq!(
                compare_values(Some(&json!(2)), Some(&json!(10.5))),
                Ordering::Less
            );
            assert_eq!(
                compare_values(Some(&json!(3)), Some(&json!(3.0))),
                Ordering::Equal
            );
        }

        #[test]
        fn missing_sorts_with_null_before_everything() {
            assert_eq!(compare_values(None, Some(&Value::Null)), Ordering::Equal);
            assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
            assert_eq!(
                compare_values(Some(&json!("a")), Some(&json!(100))),
                Ordering::Greater
            );
            assert_eq!(
                compare_values(Some(&json!(true)), Some(&json!([1]))),
                Ordering::Greater
            );
        }
    }
}
