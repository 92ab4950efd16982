//! Checks that values carry every schema-declared property with the declared
//! primitive type. Only the first failure is reported.

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::FlattenDepth;
use crate::error::{Result, ShapeMismatch};
use crate::group::flatten_records;
use crate::schema::{Schema, SchemaNode, SchemaType};
use crate::tree::GroupNode;
use crate::value::{Record, ValueExt};

pub fn conforms(value: &Value, schema: &Schema) -> bool {
    check(value, schema).is_ok()
}

/// Check one value against the schema's root properties.
///
/// Every declared property must be present. Array properties must hold
/// arrays, and when their items declare properties each element is checked
/// in turn. Any other property must have the declared runtime type, where
/// `null` and arrays count as `object`.
pub fn check(value: &Value, schema: &Schema) -> std::result::Result<(), ShapeMismatch> {
    match schema.root().properties.as_ref() {
        Some(properties) => check_properties(value, properties, "$"),
        None => Ok(()),
    }
}

/// Check every group of a built tree.
pub fn check_tree(tree: &[GroupNode], schema: &Schema) -> std::result::Result<(), ShapeMismatch> {
    let Some(properties) = schema.root().properties.as_ref() else {
        return Ok(());
    };
    for (i, node) in tree.iter().enumerate() {
        check_properties(&node.to_value(), properties, &format!("$[{i}]"))?;
    }
    Ok(())
}

/// Check raw `array<array<array<Record>>>` data by projecting each flat
/// record into the schema's shape first.
///
/// Array properties with declared item properties are projected as a single
/// element holding the same record narrowed to those properties. Returns the
/// first mismatch, with paths indexing the flattened record sequence, or
/// `None` when every record conforms.
pub fn check_raw_data(data: Value, schema: &Schema) -> Result<Option<ShapeMismatch>> {
    let records = flatten_records(data, FlattenDepth::Levels(2))?;
    let Some(properties) = schema.root().properties.as_ref() else {
        return Ok(None);
    };
    for (i, record) in records.iter().enumerate() {
        let projected = Value::Object(project(record, properties));
        if let Err(mismatch) = check_properties(&projected, properties, &format!("$[{i}]")) {
            return Ok(Some(mismatch));
        }
    }
    Ok(None)
}

fn project(record: &Record, properties: &IndexMap<String, SchemaNode>) -> Record {
    let mut out = Record::new();
    for (name, node) in properties {
        match (node.kind, node.item_properties()) {
            (SchemaType::Array, Some(item_props)) => {
                out.insert(
                    name.clone(),
                    Value::Array(vec![Value::Object(project(record, item_props))]),
                );
            }
            _ => {
                if let Some(value) = record.get(name) {
                    out.insert(name.clone(), value.clone());
                }
            }
        }
    }
    out
}

fn check_properties(
    value: &Value,
    properties: &IndexMap<String, SchemaNode>,
    path: &str,
) -> std::result::Result<(), ShapeMismatch> {
    for (name, node) in properties {
        let here = format!("{path}.{name}");
        let Some(found) = value.get(name) else {
            return Err(ShapeMismatch {
                path: here,
                expected: node.kind.as_str().to_string(),
                found: "missing".to_string(),
            });
        };
        match node.kind {
            SchemaType::Array => {
                let Some(elements) = found.as_array() else {
                    return Err(ShapeMismatch {
                        path: here,
                        expected: "array".to_string(),
                        found: found.kind().to_string(),
                    });
                };
                if let Some(item_props) = node.item_properties() {
                    for (i, element) in elements.iter().enumerate() {
                        check_properties(element, item_props, &format!("{here}[{i}]"))?;
                    }
                }
            }
            kind => {
                if found.runtime_type() != kind.as_str() {
                    return Err(ShapeMismatch {
                        path: here,
                        expected: kind.as_str().to_string(),
                        found: found.kind().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
