//! Array flattening for coordinate-like fields.
//!
//! Geo coordinates arrive as arbitrarily nested arrays (a bounding box is
//! an array of arrays of pairs); the destination column is a single flat
//! REPEATED field. Flattening is depth-first, left to right, and keeps
//! every leaf in encounter order.

use serde_json::Value;

/// Flatten a value into its leaves, depth-first.
///
/// An array contributes the flattened leaves of each element in order; any
/// other value is itself a leaf and yields a single-element vec. Nesting
/// depth is unbounded.
pub fn flatten_deep(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.extend(flatten_deep(item));
            }
            out
        }
        leaf => vec![leaf],
    }
}

/// Flatten a value into a single flat array.
pub fn flatten_to_array(value: Value) -> Value {
    Value::Array(flatten_deep(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_arrays_depth_first() {
        let flat = flatten_to_array(json!([[1, 2], [3, [4, 5]]]));
        assert_eq!(flat, json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn already_flat_array_is_unchanged() {
        let flat = flatten_to_array(json!([1.5, 2.5]));
        assert_eq!(flat, json!([1.5, 2.5]));
    }

    #[test]
    fn preserves_left_to_right_leaf_order() {
        let flat = flatten_to_array(json!([[[1], 2], [], [[3, [4]]], 5]));
        assert_eq!(flat, json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn non_array_becomes_single_element_array() {
        assert_eq!(flatten_to_array(json!(43.9)), json!([43.9]));
        assert_eq!(flatten_to_array(json!(null)), json!([null]));
    }

    #[test]
    fn result_contains_no_array_elements() {
        let flat = flatten_deep(json!([[[[1, [2, [3]]]]], [{"a": 1}]]));
        assert!(flat.iter().all(|v| !v.is_array()));
        assert_eq!(flat.len(), 4);
    }

    #[test]
    fn deeply_nested_single_leaf() {
        let mut v = json!(7);
        for _ in 0..200 {
            v = json!([v]);
        }
        assert_eq!(flatten_to_array(v), json!([7]));
    }
}
