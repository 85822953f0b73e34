//! Table schema descriptors.
//!
//! The two destination schemas are external configuration: literal JSON
//! documents of the form `{"fields": [{"name", "type", "mode", "fields"}]}`.
//! They are parsed once at startup and never computed or modified by the
//! pipeline. A descriptor that fails to parse or validate aborts startup.

use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

// ============================================================================
// Field Type / Mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Record,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Record => "RECORD",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

// ============================================================================
// Field / Table Schema
// ============================================================================

/// One column of a destination table.
///
/// `fields` is populated only for RECORD columns and describes the nested
/// row shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldType,

    #[serde(default)]
    pub mode: FieldMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    /// Parse a descriptor from its JSON text and validate its structure.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let schema: TableSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a descriptor from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Look up a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::InvalidDescriptor {
                details: "schema has no fields".into(),
            });
        }
        for field in &self.fields {
            field.validate()?;
        }
        Ok(())
    }
}

impl FieldSchema {
    fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidDescriptor {
                details: "field with empty name".into(),
            });
        }
        match self.kind {
            FieldType::Record if self.fields.is_empty() => {
                Err(SchemaError::InvalidDescriptor {
                    details: Cow::Owned(format!(
                        "RECORD field `{}` has no nested fields",
                        self.name
                    )),
                })
            }
            kind if kind != FieldType::Record && !self.fields.is_empty() => {
                Err(SchemaError::InvalidDescriptor {
                    details: Cow::Owned(format!(
                        "scalar field `{}` declares nested fields",
                        self.name
                    )),
                })
            }
            _ => {
                for nested in &self.fields {
                    nested.validate()?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
