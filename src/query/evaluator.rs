//! Filter evaluation against JSON records.
//!
//! Shared by the in-memory pool and the in-process document store so both
//! backends agree on which records a filter selects.

use super::filter::{FieldFilter, Filter, Operator, Predicate};
use crate::core::Record;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

impl Filter {
    /// Returns true when `record` satisfies the filter.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
            Filter::Nor(filters) => !filters.iter().any(|f| f.matches(record)),
            Filter::Field(field) => field.matches(record),
        }
    }
}

impl FieldFilter {
    fn matches(&self, record: &Record) -> bool {
        let candidates = resolve(record, &self.path);
        match &self.predicate {
            Predicate::Equals(expected) => equals_any(&candidates, expected),
            Predicate::Operators(ops) => ops.iter().all(|op| op.holds(&candidates)),
        }
    }
}

impl Operator {
    fn holds(&self, candidates: &[&JsonValue]) -> bool {
        match self {
            Operator::Eq(expected) => equals_any(candidates, expected),
            Operator::Ne(expected) => !equals_any(candidates, expected),
            Operator::Gt(bound) => compares(candidates, bound, |o| o == Ordering::Greater),
            Operator::Gte(bound) => compares(candidates, bound, |o| o != Ordering::Less),
            Operator::Lt(bound) => compares(candidates, bound, |o| o == Ordering::Less),
            Operator::Lte(bound) => compares(candidates, bound, |o| o != Ordering::Greater),
            Operator::In(values) => values.iter().any(|v| equals_any(candidates, v)),
            Operator::Nin(values) => !values.iter().any(|v| equals_any(candidates, v)),
            Operator::Exists(flag) => candidates.is_empty() != *flag,
            Operator::Regex(pattern) => scalars(candidates)
                .any(|v| v.as_str().is_some_and(|text| pattern.is_match(text))),
            Operator::Not(ops) => !ops.iter().all(|op| op.holds(candidates)),
        }
    }
}

/// Collects every value addressed by a dotted path. Intermediate arrays fan
/// out over their object elements, or index directly with a numeric segment.
fn resolve<'a>(record: &'a Record, path: &str) -> Vec<&'a JsonValue> {
    let mut segments = path.split('.');
    let mut current: Vec<&JsonValue> = match segments.next() {
        Some(head) => record.get(head).into_iter().collect(),
        None => Vec::new(),
    };

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                JsonValue::Object(map) => next.extend(map.get(segment)),
                JsonValue::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(
                        items
                            .iter()
                            .filter_map(|item| item.as_object())
                            .filter_map(|map| map.get(segment)),
                    ),
                },
                _ => {}
            }
        }
        current = next;
    }
    current
}

/// Equality with MongoDB's conventions: a missing field equals `null` and an
/// array field matches when any element is equal.
fn equals_any(candidates: &[&JsonValue], expected: &JsonValue) -> bool {
    if candidates.is_empty() {
        return expected.is_null();
    }
    candidates.iter().any(|candidate| {
        json_eq(candidate, expected)
            || match (candidate, expected) {
                (JsonValue::Array(items), other) if !other.is_array() => {
                    items.iter().any(|item| json_eq(item, other))
                }
                _ => false,
            }
    })
}

fn compares<F>(candidates: &[&JsonValue], bound: &JsonValue, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    scalars(candidates).any(|value| compare(value, bound).is_some_and(&accept))
}

/// Candidate values with one level of arrays flattened.
fn scalars<'a>(candidates: &'a [&'a JsonValue]) -> impl Iterator<Item = &'a JsonValue> + 'a {
    candidates.iter().flat_map(|value| match value {
        JsonValue::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![*other],
    })
}

/// Numbers compare numerically so that `1` equals `1.0`.
fn json_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

/// Ordering between values of the same JSON type; mixed types are unordered.
fn compare(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn check(filter: JsonValue, doc: JsonValue) -> bool {
        Filter::parse(&filter).unwrap().matches(&record(doc))
    }

    #[test]
    fn test_equality_and_missing_fields() {
        let doc = json!({"name": "Alice", "age": 30});
        assert!(check(json!({"name": "Alice"}), doc.clone()));
        assert!(!check(json!({"name": "Bob"}), doc.clone()));
        assert!(check(json!({"nickname": null}), doc.clone()));
        assert!(check(json!({"age": 30.0}), doc.clone()));
        assert!(check(json!({}), doc));
    }

    #[test]
    fn test_comparison_operators() {
        let doc = json!({"age": 30, "name": "Carol"});
        assert!(check(json!({"age": {"$gt": 18, "$lte": 30}}), doc.clone()));
        assert!(!check(json!({"age": {"$lt": 30}}), doc.clone()));
        assert!(check(json!({"name": {"$gte": "B"}}), doc.clone()));
        // mixed types never compare
        assert!(!check(json!({"age": {"$gt": "10"}}), doc));
    }

    #[test]
    fn test_arrays_match_any_element() {
        let doc = json!({"tags": ["rust", "db"], "scores": [3, 9]});
        assert!(check(json!({"tags": "db"}), doc.clone()));
        assert!(check(json!({"tags": ["rust", "db"]}), doc.clone()));
        assert!(check(json!({"scores": {"$gt": 5}}), doc.clone()));
        assert!(check(json!({"tags": {"$in": ["go", "rust"]}}), doc.clone()));
        assert!(!check(json!({"tags": {"$nin": ["rust"]}}), doc));
    }

    #[test]
    fn test_dotted_paths() {
        let doc = json!({
            "profile": {"city": "Oslo", "id": "p1"},
            "items": [{"sku": "a"}, {"sku": "b"}]
        });
        assert!(check(json!({"profile.city": "Oslo"}), doc.clone()));
        assert!(check(json!({"profile.id": "p1"}), doc.clone()));
        assert!(check(json!({"items.sku": "b"}), doc.clone()));
        assert!(check(json!({"items.1.sku": "b"}), doc.clone()));
        assert!(!check(json!({"items.0.sku": "b"}), doc));
    }

    #[test]
    fn test_combinators_exists_regex_not() {
        let doc = json!({"name": "alice", "role": "admin"});
        assert!(check(json!({"$or": [{"name": "bob"}, {"role": "admin"}]}), doc.clone()));
        assert!(!check(json!({"$nor": [{"role": "admin"}]}), doc.clone()));
        assert!(check(json!({"email": {"$exists": false}}), doc.clone()));
        assert!(check(json!({"name": {"$regex": "^AL", "$options": "i"}}), doc.clone()));
        assert!(check(json!({"name": {"$not": {"$regex": "^b"}}}), doc.clone()));
        assert!(check(json!({"role": {"$ne": "guest"}}), doc));
    }
}
