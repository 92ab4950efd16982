//! Structural validation of raw schema descriptions.
//!
//! The root must be an `object` node with a `properties` map. Every property
//! needs a string `type` naming one of the supported kinds; `object`
//! properties that declare `properties` are validated like a root, and
//! `array` properties must carry an `items` schema that is valid in turn.

use serde_json::Value;

use super::SchemaType;
use crate::config::ReshapeConfig;
use crate::debug;
use crate::error::{ReshapeError, Result};

/// Check a raw schema description, reporting only a verdict.
pub fn validate_schema(schema: &Value) -> bool {
    validate_schema_detailed(schema).is_ok()
}

/// Like [`validate_schema`], logging the first failure when debugging is on.
pub fn validate_schema_with(schema: &Value, config: &ReshapeConfig) -> bool {
    match validate_schema_detailed(schema) {
        Ok(()) => true,
        Err(err) => {
            debug!(config, "Schema rejected: {}", err);
            false
        }
    }
}

/// Check a raw schema description, returning the first failure found.
pub fn validate_schema_detailed(schema: &Value) -> Result<()> {
    validate_object_node(schema, "$")
}

fn validate_object_node(node: &Value, path: &str) -> Result<()> {
    let Some(obj) = node.as_object() else {
        return Err(ReshapeError::invalid_schema(path, "schema is not an object"));
    };
    if obj.get("type").and_then(Value::as_str) != Some("object") {
        return Err(ReshapeError::invalid_schema(
            path,
            "expected an object schema with defined properties",
        ));
    }
    let Some(properties) = obj.get("properties").and_then(Value::as_object) else {
        return Err(ReshapeError::invalid_schema(
            path,
            "expected an object schema with defined properties",
        ));
    };

    for (name, property) in properties {
        validate_property(property, &format!("{path}.properties.{name}"))?;
    }
    Ok(())
}

fn validate_property(property: &Value, path: &str) -> Result<()> {
    let kind = declared_type(property, path)?;
    match kind {
        SchemaType::Object => match property.get("properties") {
            None | Some(Value::Null) => Ok(()),
            Some(_) => validate_object_node(property, path),
        },
        SchemaType::Array => validate_items(property.get("items"), &format!("{path}.items")),
        _ => Ok(()),
    }
}

/// `items` of object form must be a full object schema; `items` of array
/// form is checked as an array node, without the root `type: object` rule.
fn validate_items(items: Option<&Value>, path: &str) -> Result<()> {
    let Some(items) = items.filter(|v| v.is_object()) else {
        return Err(ReshapeError::invalid_schema(
            path,
            "array property must declare an object 'items' schema",
        ));
    };
    match declared_type(items, path)? {
        SchemaType::Object => validate_object_node(items, path),
        SchemaType::Array => validate_items(items.get("items"), &format!("{path}.items")),
        _ => Ok(()),
    }
}

fn declared_type(node: &Value, path: &str) -> Result<SchemaType> {
    let Some(obj) = node.as_object() else {
        return Err(ReshapeError::invalid_schema(path, "property is not set correctly"));
    };
    let Some(name) = obj.get("type").and_then(Value::as_str) else {
        return Err(ReshapeError::invalid_schema(path, "property has no string 'type'"));
    };
    SchemaType::parse(name)
        .ok_or_else(|| ReshapeError::invalid_schema(path, format!("unsupported type '{name}'")))
}
