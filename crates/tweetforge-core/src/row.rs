//! Row construction.
//!
//! A [`Row`] is the final, immutable shape handed to a table sink. Building
//! one is a structural check of an already-normalized record against the
//! destination schema; no field is renamed and no value is transformed here.
//! A record that cannot be represented by the schema's field set and types
//! fails with [`SchemaError::Mismatch`], which callers surface rather than
//! silently drop.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::SchemaError;
use crate::schema::{FieldMode, FieldSchema, FieldType, TableSchema};

// ============================================================================
// Row
// ============================================================================

/// A schema-conformant output row. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Convert a normalized record into a row for the given schema.
pub fn build_row(
    record: &Value,
    schema: &TableSchema,
) -> Result<Row, SchemaError> {
    let Value::Object(map) = record else {
        return Err(SchemaError::Mismatch {
            field: "$".into(),
            reason: "top-level value is not an object".into(),
        });
    };

    check_object(map, &schema.fields, "")?;
    Ok(Row(map.clone()))
}

fn check_object(
    map: &Map<String, Value>,
    fields: &[FieldSchema],
    path: &str,
) -> Result<(), SchemaError> {
    for (name, value) in map {
        let full = join_path(path, name);
        let Some(field) = fields.iter().find(|f| f.name == *name) else {
            return Err(SchemaError::Mismatch {
                field: full,
                reason: "field not present in target schema".into(),
            });
        };
        check_value(value, field, &full)?;
    }

    for field in fields {
        if field.mode == FieldMode::Required && !map.contains_key(&field.name)
        {
            return Err(SchemaError::Mismatch {
                field: join_path(path, &field.name),
                reason: "required field missing".into(),
            });
        }
    }

    Ok(())
}

fn check_value(
    value: &Value,
    field: &FieldSchema,
    path: &str,
) -> Result<(), SchemaError> {
    if field.mode == FieldMode::Repeated {
        let Value::Array(items) = value else {
            return Err(mismatch(path, "REPEATED field is not an array"));
        };
        for (i, item) in items.iter().enumerate() {
            let elem_path = format!("{path}[{i}]");
            check_scalar_or_record(item, field, &elem_path)?;
        }
        return Ok(());
    }

    if value.is_null() {
        return match field.mode {
            FieldMode::Required => {
                Err(mismatch(path, "REQUIRED field is null"))
            }
            _ => Ok(()),
        };
    }

    check_scalar_or_record(value, field, path)
}

fn check_scalar_or_record(
    value: &Value,
    field: &FieldSchema,
    path: &str,
) -> Result<(), SchemaError> {
    match field.kind {
        FieldType::String => match value {
            Value::String(_) => Ok(()),
            _ => Err(type_mismatch(path, field.kind, value)),
        },
        FieldType::Integer => match value {
            Value::Number(n) if n.as_i64().is_some() || n.as_u64().is_some() =>
            {
                Ok(())
            }
            _ => Err(type_mismatch(path, field.kind, value)),
        },
        FieldType::Float => match value {
            Value::Number(_) => Ok(()),
            _ => Err(type_mismatch(path, field.kind, value)),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(type_mismatch(path, field.kind, value)),
        },
        // Timestamps arrive either as a formatted string or as an epoch
        // number (e.g. timestamp_ms passed through unconverted).
        FieldType::Timestamp => match value {
            Value::String(_) | Value::Number(_) => Ok(()),
            _ => Err(type_mismatch(path, field.kind, value)),
        },
        FieldType::Record => match value {
            Value::Object(map) => check_object(map, &field.fields, path),
            _ => Err(type_mismatch(path, field.kind, value)),
        },
    }
}

fn mismatch(path: &str, reason: &'static str) -> SchemaError {
    SchemaError::Mismatch {
        field: path.to_string(),
        reason: Cow::Borrowed(reason),
    }
}

fn type_mismatch(path: &str, kind: FieldType, value: &Value) -> SchemaError {
    SchemaError::Mismatch {
        field: path.to_string(),
        reason: Cow::Owned(format!(
            "expected {}, found {}",
            kind.as_str(),
            value_kind(value)
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tweet_schema() -> TableSchema {
        TableSchema::from_json_str(
            r#"{
            "fields": [
                {"type": "TIMESTAMP", "name": "created_at"},
                {"type": "INTEGER", "name": "id"},
                {"type": "STRING", "name": "text"},
                {"type": "BOOLEAN", "name": "truncated"},
                {"type": "FLOAT", "name": "coordinates", "mode": "REPEATED"},
                {"type": "FLOAT", "name": "polarity"},
                {"type": "RECORD", "name": "user",
                 "fields": [
                    {"type": "INTEGER", "name": "id"},
                    {"type": "STRING", "name": "screen_name"}
                 ]}
            ]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_row_from_conformant_record() {
        let record = json!({
            "created_at": "2016-10-18 07:01:50",
            "id": 788502534776262656u64,
            "text": "BlackFriday is coming",
            "truncated": false,
            "coordinates": [43.9, 12.9],
            "polarity": 0.8,
            "user": {"id": 42, "screen_name": "alice"}
        });

        let row = build_row(&record, &tweet_schema()).unwrap();
        assert_eq!(row.as_map()["text"], "BlackFriday is coming");
        assert_eq!(row.as_map()["user"]["screen_name"], "alice");
    }

    #[test]
    fn unknown_field_is_a_mismatch() {
        let record = json!({"id": 1, "retweeted_status": {}});
        let err = build_row(&record, &tweet_schema()).unwrap_err();
        match err {
            SchemaError::Mismatch { field, .. } => {
                assert_eq!(field, "retweeted_status")
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_nested_field_is_a_mismatch_with_path() {
        let record = json!({"user": {"id": 1, "followers": 10}});
        let err = build_row(&record, &tweet_schema()).unwrap_err();
        match err {
            SchemaError::Mismatch { field, .. } => {
                assert_eq!(field, "user.followers")
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn float_value_in_integer_field_is_a_mismatch() {
        let record = json!({"id": 1.5});
        let err = build_row(&record, &tweet_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::Mismatch { .. }));
    }

    #[test]
    fn integer_value_is_accepted_for_float_field() {
        let record = json!({"polarity": 1});
        build_row(&record, &tweet_schema()).unwrap();
    }

    #[test]
    fn repeated_field_rejects_scalar() {
        let record = json!({"coordinates": 43.9});
        let err = build_row(&record, &tweet_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::Mismatch { .. }));
    }

    #[test]
    fn repeated_field_rejects_nested_array() {
        // Coordinate arrays are flattened before row building; a nested
        // array reaching this point is a contract violation.
        let record = json!({"coordinates": [[43.9, 12.9]]});
        let err = build_row(&record, &tweet_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::Mismatch { .. }));
    }

    #[test]
    fn nullable_field_accepts_explicit_null() {
        let record = json!({"text": null});
        build_row(&record, &tweet_schema()).unwrap();
    }

    #[test]
    fn timestamp_accepts_string_and_number() {
        build_row(&json!({"created_at": "2016-10-18 07:01:50"}), &tweet_schema())
            .unwrap();
        build_row(&json!({"created_at": 1476774110000u64}), &tweet_schema())
            .unwrap();
    }

    #[test]
    fn non_object_top_level_is_a_mismatch() {
        let err = build_row(&json!([1, 2]), &tweet_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::Mismatch { .. }));
    }

    #[test]
    fn row_serializes_transparently() {
        let record = json!({"id": 7});
        let row = build_row(&record, &tweet_schema()).unwrap();
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"id":7}"#);
    }
}
