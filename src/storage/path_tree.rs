//! In-memory hierarchical tree addressed by [`Path`].
//!
//! The tree is a single JSON object. Every node is either a scalar/array
//! value or an insertion-ordered object of children. Null is never stored:
//! null fields are stripped on the way in, objects left empty with them, and
//! a write that leaves nothing deletes. Reading an absent path yields `None`.
//!
//! All operations walk from the root, O(depth).

use crate::types::Path;
use crate::{log_debug, log_trace};
use serde_json::{Map, Value};

/// The data tree behind a database
#[derive(Debug, Clone)]
pub struct PathTree {
    root: Value,
}

impl PathTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Replace the whole tree with `seed`.
    ///
    /// A non-object seed leaves the tree empty.
    pub fn reset(&mut self, seed: Value) {
        self.root = match normalize(seed) {
            Some(Value::Object(map)) => Value::Object(map),
            _ => Value::Object(Map::new()),
        };
        log_debug!("PathTree reset, {} top-level keys", self.top_level_len());
    }

    /// Number of top-level keys
    pub fn top_level_len(&self) -> usize {
        self.root.as_object().map_or(0, Map::len)
    }

    /// Borrow the value stored at `path`
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.as_object()?.get(segment)?;
        }
        if path.is_root() && self.top_level_len() == 0 {
            return None;
        }
        Some(node)
    }

    /// Copy of the value stored at `path`, `None` if absent at any segment
    pub fn read(&self, path: &Path) -> Option<Value> {
        self.get(path).cloned()
    }

    /// Replace the subtree at `path` with `value`.
    ///
    /// Intermediate scalars are replaced by objects. Writing null, or an
    /// object with nothing but nulls and empty objects in it, deletes.
    /// Writing at the root behaves like [`PathTree::reset`].
    pub fn write(&mut self, path: &Path, value: Value) {
        let Some(value) = normalize(value) else {
            self.delete(path);
            return;
        };

        let Some((last, parents)) = path.segments().split_last() else {
            self.reset(value);
            return;
        };

        let mut node = &mut self.root;
        for segment in parents {
            node = ensure_object(node)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(node).insert(last.clone(), value);
        log_trace!("PathTree write at {}", path);
    }

    /// Merge `partial` into the record at `path`.
    ///
    /// Object fields are written one by one relative to `path` (a field name
    /// may itself be a nested path, and a null field deletes that child).
    /// Fields not named in `partial` survive. A non-object `partial`
    /// replaces the value wholesale.
    pub fn merge(&mut self, path: &Path, partial: Value) {
        match partial {
            Value::Object(fields) => {
                for (field, value) in fields {
                    let target = path.join(&field);
                    if target.len() == path.len() {
                        continue;
                    }
                    self.write(&target, value);
                }
            }
            other => self.write(path, other),
        }
    }

    /// Remove the node at `path`, returning what was there.
    ///
    /// Ancestors left without children are pruned, since an empty location
    /// reads as absent.
    pub fn delete(&mut self, path: &Path) -> Option<Value> {
        if path.is_root() {
            let old = std::mem::replace(&mut self.root, Value::Object(Map::new()));
            return Some(old);
        }
        let removed = remove_in(ensure_object(&mut self.root), path.segments());
        if removed.is_some() {
            log_trace!("PathTree delete at {}", path);
        }
        removed
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop null fields and the objects they leave empty. `None` when nothing
/// is left to store.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, child)| normalize(child).map(|child| (key, child)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        other => Some(other),
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

fn remove_in(map: &mut Map<String, Value>, segments: &[String]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        return map.shift_remove(first);
    }
    let child = map.get_mut(first)?.as_object_mut()?;
    let removed = remove_in(child, rest);
    if removed.is_some() && child.is_empty() {
        map.shift_remove(first);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    fn seeded() -> PathTree {
        let mut tree = PathTree::new();
        tree.reset(json!({
            "resumes": {
                "r1": {"id": "r1", "user": "u1", "name": "A"},
                "r2": {"id": "r2", "user": "u2", "name": "B"}
            },
            ".info": {"connected": true}
        }));
        tree
    }

    #[test]
    fn read_missing_is_none() {
        let tree = seeded();
        assert_eq!(tree.read(&p("users/u1")), None);
        assert_eq!(tree.read(&p("resumes/r1/name/deeper")), None);
    }

    #[test]
    fn write_then_read() {
        let mut tree = seeded();
        tree.write(&p("resumes/r3"), json!({"id": "r3", "tags": [1, 2]}));
        assert_eq!(tree.read(&p("resumes/r3")), Some(json!({"id": "r3", "tags": [1, 2]})));
        assert_eq!(tree.read(&p(".info/connected")), Some(json!(true)));
    }

    #[test]
    fn write_is_a_deep_copy() {
        let mut tree = PathTree::new();
        let mut original = json!({"name": "A"});
        tree.write(&p("doc"), original.clone());
        original["name"] = json!("mutated");
        assert_eq!(tree.read(&p("doc/name")), Some(json!("A")));
    }

    #[test]
    fn write_replaces_subtree_and_scalars() {
        let mut tree = seeded();
        tree.write(&p("resumes/r1"), json!({"id": "r1"}));
        assert_eq!(tree.read(&p("resumes/r1")), Some(json!({"id": "r1"})));

        tree.write(&p("resumes/r1/id/nested"), json!(5));
        assert_eq!(tree.read(&p("resumes/r1/id")), Some(json!({"nested": 5})));
    }

    #[test]
    fn write_null_deletes() {
        let mut tree = seeded();
        tree.write(&p("resumes/r1"), Value::Null);
        assert_eq!(tree.read(&p("resumes/r1")), None);
    }

    #[test]
    fn nested_nulls_and_empty_objects_are_not_stored() {
        let mut tree = PathTree::new();
        tree.write(&p("doc"), json!({"a": null, "b": 1, "c": {"d": null}, "e": {}}));
        assert_eq!(tree.read(&p("doc")), Some(json!({"b": 1})));
        assert_eq!(tree.get(&p("doc")).and_then(Value::as_object).map(Map::len), Some(1));

        tree.write(&p("doc"), json!({}));
        assert_eq!(tree.read(&p("doc")), None);

        tree.write(&p("other/x"), json!(1));
        tree.write(&p("other/x"), json!({"y": null}));
        assert_eq!(tree.read(&p("other")), None);
    }

    #[test]
    fn reset_strips_nulls() {
        let mut tree = PathTree::new();
        tree.reset(json!({"a": {"b": null}, "c": [1, 2], "d": null}));
        assert_eq!(tree.read(&Path::root()), Some(json!({"c": [1, 2]})));
    }

    #[test]
    fn merge_keeps_unnamed_fields() {
        let mut tree = PathTree::new();
        tree.write(&p("doc"), json!({"id": 1, "name": "A"}));
        tree.merge(&p("doc"), json!({"name": "B"}));
        assert_eq!(tree.read(&p("doc")), Some(json!({"id": 1, "name": "B"})));
    }

    #[test]
    fn merge_into_absent_creates_record() {
        let mut tree = PathTree::new();
        tree.merge(&p("doc"), json!({"a": 1, "nested/b": 2, "gone": null, "empty": {}}));
        assert_eq!(tree.read(&p("doc")), Some(json!({"a": 1, "nested": {"b": 2}})));
    }

    #[test]
    fn merge_scalar_replaces() {
        let mut tree = PathTree::new();
        tree.merge(&p("resumes/123456"), json!("test value 123"));
        assert_eq!(tree.read(&p("resumes/123456")), Some(json!("test value 123")));
    }

    #[test]
    fn delete_clears_descendants_and_prunes() {
        let mut tree = seeded();
        let removed = tree.delete(&p("resumes/r1"));
        assert_eq!(removed, Some(json!({"id": "r1", "user": "u1", "name": "A"})));
        assert_eq!(tree.read(&p("resumes/r1/name")), None);

        tree.delete(&p("resumes/r2"));
        assert_eq!(tree.read(&p("resumes")), None);
        assert_eq!(tree.read(&p(".info/connected")), Some(json!(true)));
    }

    #[test]
    fn delete_preserves_sibling_order() {
        let mut tree = PathTree::new();
        tree.write(&p("list"), json!({"a": 1, "b": 2, "c": 3, "d": 4}));
        tree.delete(&p("list/b"));
        let keys: Vec<String> = tree
            .get(&p("list"))
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["a", "c", "d"]);
    }

    #[test]
    fn root_read_of_empty_tree_is_none() {
        let tree = PathTree::new();
        assert_eq!(tree.read(&Path::root()), None);
        assert!(seeded().read(&Path::root()).is_some());
    }
}
