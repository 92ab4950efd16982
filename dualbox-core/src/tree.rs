//! Two-level trees: group nodes carrying their key values plus leaf records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::FlattenDepth;
use crate::error::Result;
use crate::group::{flatten_records, Groups};
use crate::keys::GroupKey;
use crate::schema::{Schema, SchemaNode, SchemaType};
use crate::value::{key_text, Record};

/// A non-grouping record nested inside a group.
pub type LeafNode = Record;

/// A top-level group: its key property values followed by `level2` leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    #[serde(flatten)]
    pub fields: Record,
    #[serde(default, alias = "Level2")]
    pub level2: Vec<LeafNode>,
}

impl GroupNode {
    pub fn new(fields: Record) -> Self {
        Self {
            fields,
            level2: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Loose identity text of this group under `id_key`.
    pub fn id_text(&self, id_key: &str) -> String {
        key_text(self.fields.get(id_key))
    }

    /// The node as a plain JSON object, `level2` included.
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(
            "level2".to_string(),
            Value::Array(self.level2.iter().cloned().map(Value::Object).collect()),
        );
        Value::Object(object)
    }
}

/// Turn grouped records into group nodes.
///
/// Key values come from the first record of each group only; every member,
/// the first included, contributes one leaf holding its non-key properties.
pub fn build_from_groups(groups: &Groups, key: &GroupKey) -> Vec<GroupNode> {
    groups
        .values()
        .filter_map(|members| {
            let first = members.first()?;
            let mut node = GroupNode::new(key_fields(first, key));
            node.level2 = members.iter().map(|record| leaf_of(record, key)).collect();
            Some(node)
        })
        .collect()
}

fn key_fields(record: &Record, key: &GroupKey) -> Record {
    let mut fields = Record::new();
    for name in key.names() {
        if let Some(value) = record.get(name) {
            fields.insert(name.clone(), value.clone());
        }
    }
    fields
}

fn leaf_of(record: &Record, key: &GroupKey) -> LeafNode {
    record
        .iter()
        .filter(|(name, _)| !key.contains(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// An empty tree shaped like the schema.
///
/// Scalar properties start as `null`; array properties whose items declare
/// properties hold a single template item built the same way, other arrays
/// start empty.
pub fn build_skeleton(schema: &Schema) -> Record {
    skeleton_of(schema.properties())
}

fn skeleton_of<'a>(
    properties: impl Iterator<Item = (&'a String, &'a SchemaNode)>,
) -> Record {
    let mut out = Record::new();
    for (name, node) in properties {
        let value = match (node.kind, node.item_properties()) {
            (SchemaType::Array, Some(item_props)) => {
                Value::Array(vec![Value::Object(skeleton_of(item_props.iter()))])
            }
            (SchemaType::Array, None) => Value::Array(Vec::new()),
            _ => Value::Null,
        };
        out.insert(name.clone(), value);
    }
    out
}

/// Fill a skeleton from `array<array<array<Record>>>` raw data.
///
/// Scalar properties take the first non-null value seen (a value already
/// present in the skeleton counts as seen). Each array property whose items
/// declare properties gets one leaf per record, holding the declared item
/// properties the record carries; leaves without any non-null value are
/// dropped, which also clears the skeleton's template item.
pub fn fill_from_data(skeleton: &Record, data: Value, schema: &Schema) -> Result<Record> {
    let records = flatten_records(data, FlattenDepth::Levels(2))?;
    let mut result = skeleton.clone();

    for (name, node) in schema.array_properties() {
        if node.item_properties().is_none() {
            continue;
        }
        if let Some(Value::Array(leaves)) = result.get_mut(name.as_str()) {
            leaves.retain(|leaf| leaf.as_object().is_some_and(has_value));
        }
    }

    for record in &records {
        for (name, node) in schema.properties() {
            match (node.kind, node.item_properties()) {
                (SchemaType::Array, Some(item_props)) => {
                    let leaf: LeafNode = item_props
                        .keys()
                        .filter_map(|prop| record.get(prop).map(|v| (prop.clone(), v.clone())))
                        .collect();
                    if !has_value(&leaf) {
                        continue;
                    }
                    match result.get_mut(name.as_str()) {
                        Some(Value::Array(leaves)) => leaves.push(Value::Object(leaf)),
                        _ => {
                            result.insert(name.clone(), Value::Array(vec![Value::Object(leaf)]));
                        }
                    }
                }
                (SchemaType::Array, None) => {}
                _ => {
                    let unset = result.get(name.as_str()).map_or(true, Value::is_null);
                    match record.get(name.as_str()) {
                        Some(value) if unset && !value.is_null() => {
                            result.insert(name.clone(), value.clone());
                        }
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(result)
}

fn has_value(leaf: &Record) -> bool {
    leaf.values().any(|v| !v.is_null())
}
