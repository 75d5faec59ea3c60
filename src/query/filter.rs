//! Equality filter over a mapping of children.
//!
//! The same two functions back both one-shot reads and event dispatch, so a
//! snapshot from `once` and the payload of a live `value` event agree.

use crate::query::shape::QueryShape;
use serde_json::{Map, Value};

/// Apply `shape` to the value read at a path.
///
/// Identity when the shape has no active filter or when the value is not a
/// mapping. Otherwise keeps the entries whose child is an object with
/// `child[field] == value`, using strict JSON equality and preserving
/// insertion order.
pub fn apply(value: Option<Value>, shape: &QueryShape) -> Option<Value> {
    let Some((field, expected)) = shape.filter() else {
        return value;
    };
    match value {
        Some(Value::Object(map)) => Some(Value::Object(retain_matching(map, field, expected))),
        other => other,
    }
}

/// Filtered children of the value read at a path.
///
/// A value that is absent or not a mapping has no children.
pub fn children(value: Option<&Value>, shape: &QueryShape) -> Map<String, Value> {
    let Some(map) = value.and_then(Value::as_object) else {
        return Map::new();
    };
    match shape.filter() {
        Some((field, expected)) => retain_matching(map.clone(), field, expected),
        None => map.clone(),
    }
}

/// True if `child` passes the equality predicate
pub fn matches(child: &Value, field: &str, expected: &Value) -> bool {
    child
        .as_object()
        .and_then(|record| record.get(field))
        .is_some_and(|actual| actual == expected)
}

fn retain_matching(map: Map<String, Value>, field: &str, expected: &Value) -> Map<String, Value> {
    map.into_iter()
        .filter(|(_, child)| matches(child, field, expected))
        .collect()
}
