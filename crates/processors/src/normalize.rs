//! Record normalization.
//!
//! Rewrites a parsed event tree into the shape the destination tables
//! expect. The policy is applied per object field, at every nesting level:
//!
//! 1. Null-valued fields are dropped.
//! 2. `created_at` is rewritten from the stream's wire timestamp format
//!    into the table format; values that do not parse are left unchanged.
//! 3. `coordinates` arrays are flattened to a single depth.
//! 4. `attributes` is replaced by its own JSON serialization, whatever its
//!    shape.
//! 5. Objects and arrays not covered above are recursed into.
//! 6. Remaining scalars pass through.
//!
//! Finally, fields whose names the destination tables do not carry are
//! removed outright. The rewrite is total (it never fails) and idempotent:
//! normalizing an already-normalized record changes nothing.
//!
//! Field name matches for the three special fields are case-insensitive;
//! the removal list matches exactly.

use serde_json::{Map, Value};
use tracing::warn;

use common::time::reformat_event_timestamp;

use crate::flatten::flatten_to_array;

const DATE_FIELD: &str = "created_at";
const GEO_FIELD: &str = "coordinates";
const OPAQUE_FIELD: &str = "attributes";

/// Field names absent from the destination table schemas, removed at every
/// object level.
pub const IGNORED_FIELDS: &[&str] = &[
    "video_info",
    "scopes",
    "withheld_in_countries",
    "is_quote_status",
    "source_user_id",
    "quoted_status",
    "display_text_range",
    "quoted_status_id",
    "extended_tweet",
    "source_user_id_str",
    "quoted_status_id_str",
    "limit",
    "contributors",
    "withheld_copyright",
];

/// Normalize a record tree.
///
/// Total function: malformed substructure passes through unchanged except
/// where a specific field policy applies. Non-object, non-array input is
/// returned as-is.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map)),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(normalize).collect())
        }
        scalar => scalar,
    }
}

fn normalize_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in map {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if value.is_null() {
            continue;
        }
        let rewritten = normalize_field(&key, value);
        out.insert(key, rewritten);
    }

    out
}

fn normalize_field(key: &str, value: Value) -> Value {
    if key.eq_ignore_ascii_case(DATE_FIELD) {
        rewrite_timestamp(value)
    } else if key.eq_ignore_ascii_case(GEO_FIELD) && value.is_array() {
        flatten_to_array(value)
    } else if key.eq_ignore_ascii_case(OPAQUE_FIELD) {
        stringify_opaque(value)
    } else {
        normalize(value)
    }
}

fn rewrite_timestamp(value: Value) -> Value {
    match value {
        Value::String(s) => match reformat_event_timestamp(&s) {
            Some(reformatted) => Value::String(reformatted),
            None => {
                warn!(value = %s, "timestamp did not match wire format; field left unchanged");
                Value::String(s)
            }
        },
        other => {
            warn!("timestamp field is not a string; field left unchanged");
            other
        }
    }
}

/// Opaque metadata keeps whatever shape it had, as one string column.
/// Values that are already strings stay as-is so a second pass is a no-op.
fn stringify_opaque(value: Value) -> Value {
    match value {
        s @ Value::String(_) => s,
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_top_level_passes_through() {
        assert_eq!(normalize(json!(42)), json!(42));
        assert_eq!(normalize(json!("text")), json!("text"));
        assert_eq!(normalize(json!(null)), json!(null));
    }

    #[test]
    fn field_policies_are_case_insensitive() {
        let out = normalize(json!({
            "Created_At": "Tue Oct 18 07:01:50 +0000 2016",
            "COORDINATES": [[1, 2], [3]],
            "Attributes": {"k": 1}
        }));
        assert_eq!(out["Created_At"], "2016-10-18 07:01:50");
        assert_eq!(out["COORDINATES"], json!([1, 2, 3]));
        assert_eq!(out["Attributes"], json!(r#"{"k":1}"#));
    }

    #[test]
    fn removal_list_is_case_sensitive() {
        let out = normalize(json!({"limit": 1, "LIMIT": 2}));
        assert!(out.get("limit").is_none());
        assert_eq!(out["LIMIT"], 2);
    }

    #[test]
    fn null_elements_inside_arrays_are_kept() {
        // Only object fields are dropped for null; array positions matter.
        let out = normalize(json!({"geo_list": [null, 1]}));
        assert_eq!(out["geo_list"], json!([null, 1]));
    }
}
