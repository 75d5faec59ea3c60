//! Query shape attached to a reference

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single-field equality filter built by `order_by_child(..).equal_to(..)`.
///
/// Each component is last-write-wins. The filter only takes effect once both
/// the field and the value are set; a shape with only one of them filters
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryShape {
    order_by_child: Option<String>,
    equal_to: Option<Value>,
}

impl QueryShape {
    /// Identity shape
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape filtering on `field == value`
    pub fn equality(field: impl Into<String>, value: Value) -> Self {
        Self {
            order_by_child: Some(field.into()),
            equal_to: Some(value),
        }
    }

    /// Set the child field to filter on, replacing any previous field
    pub fn set_order_by_child(&mut self, field: impl Into<String>) {
        self.order_by_child = Some(field.into());
    }

    /// Set the value to compare against, replacing any previous value
    pub fn set_equal_to(&mut self, value: Value) {
        self.equal_to = Some(value);
    }

    /// Field set by `order_by_child`, if any
    pub fn order_by_child(&self) -> Option<&str> {
        self.order_by_child.as_deref()
    }

    /// Value set by `equal_to`, if any
    pub fn equal_to(&self) -> Option<&Value> {
        self.equal_to.as_ref()
    }

    /// The active (field, value) predicate, `None` for identity
    pub fn filter(&self) -> Option<(&str, &Value)> {
        match (&self.order_by_child, &self.equal_to) {
            (Some(field), Some(value)) => Some((field.as_str(), value)),
            _ => None,
        }
    }

    /// True when the shape filters nothing
    pub fn is_identity(&self) -> bool {
        self.filter().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn needs_both_components() {
        let mut shape = QueryShape::new();
        assert!(shape.is_identity());
        shape.set_order_by_child("user");
        assert!(shape.is_identity());
        shape.set_equal_to(json!("u1"));
        assert_eq!(shape.filter(), Some(("user", &json!("u1"))));
    }

    #[test]
    fn last_field_wins() {
        let mut shape = QueryShape::equality("user", json!("u1"));
        shape.set_order_by_child("owner");
        assert_eq!(shape.filter(), Some(("owner", &json!("u1"))));
    }
}
