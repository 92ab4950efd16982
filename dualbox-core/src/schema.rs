use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::KeyCase;
use crate::error::{ReshapeError, Result};

pub mod validate;

pub use validate::{validate_schema, validate_schema_detailed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Boolean,
}

impl SchemaType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "boolean" => Some(SchemaType::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
        }
    }
}

/// One node of a schema description. Property order follows declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub required: IndexSet<String>,
}

impl SchemaNode {
    /// Properties declared by this node, in declaration order (empty for scalars).
    pub fn properties(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.properties.iter().flatten()
    }

    /// Properties declared on the items of an array node.
    pub fn item_properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        self.items.as_ref().and_then(|items| items.properties.as_ref())
    }

    /// Build a node from a validated description.
    ///
    /// Keywords that do not apply to the node's type are ignored, as are
    /// `required` entries that are not strings.
    fn from_description(value: &Value, path: &str) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .and_then(SchemaType::parse)
            .ok_or_else(|| ReshapeError::invalid_schema(path, "property has no supported 'type'"))?;

        let properties = match (kind, value.get("properties")) {
            (SchemaType::Object, Some(Value::Object(props))) => Some(
                props
                    .iter()
                    .map(|(name, node)| {
                        let node = Self::from_description(node, &format!("{path}.properties.{name}"))?;
                        Ok((name.clone(), node))
                    })
                    .collect::<Result<IndexMap<_, _>>>()?,
            ),
            _ => None,
        };
        let items = match (kind, value.get("items")) {
            (SchemaType::Array, Some(items @ Value::Object(_))) => Some(Box::new(
                Self::from_description(items, &format!("{path}.items"))?,
            )),
            _ => None,
        };
        let required = match value.get("required") {
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            _ => IndexSet::new(),
        };

        Ok(Self {
            kind,
            properties,
            items,
            required,
        })
    }

    fn fold_case(&mut self, case: KeyCase) {
        if let Some(props) = self.properties.take() {
            self.properties = Some(
                props
                    .into_iter()
                    .map(|(name, mut node)| {
                        node.fold_case(case);
                        (case.apply(&name).into_owned(), node)
                    })
                    .collect(),
            );
        }
        if let Some(items) = self.items.as_mut() {
            items.fold_case(case);
        }
        self.required = self
            .required
            .iter()
            .map(|name| case.apply(name).into_owned())
            .collect();
    }
}

/// A validated root schema: an `object` node with declared properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: SchemaNode,
}

impl Schema {
    /// Validate a raw schema description and build the typed tree from it.
    ///
    /// Keywords outside `type`/`properties`/`items`/`required` (such as
    /// `$schema`) are ignored.
    pub fn parse(value: &Value) -> Result<Self> {
        Self::parse_with_case(value, KeyCase::Exact)
    }

    pub fn parse_with_case(value: &Value, case: KeyCase) -> Result<Self> {
        validate_schema_detailed(value)?;
        let mut root = SchemaNode::from_description(value, "$")?;
        root.fold_case(case);
        Ok(Self { root })
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.root.properties()
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.root.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Root properties of array type, with their item property declarations.
    pub fn array_properties(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.properties()
            .filter(|(_, node)| node.kind == SchemaType::Array)
    }

    /// Root properties that are not arrays.
    pub fn scalar_properties(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.properties()
            .filter(|(_, node)| node.kind != SchemaType::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReshapeError;
    use serde_json::json;

    fn event_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "idevent": {"type": "number"},
                "eventname": {"type": "string"},
                "level2": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "idsession": {"type": "number"},
                            "linkname": {"type": "string"}
                        },
                        "required": ["idsession", "linkname"]
                    }
                }
            },
            "required": ["idevent", "eventname", "level2"]
        })
    }

    #[test]
    fn test_parse_preserves_declaration_order() {
        let schema = Schema::parse(&event_schema()).expect("schema should parse");
        let names: Vec<&str> = schema.properties().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["idevent", "eventname", "level2"]);

        let level2 = schema.property("level2").unwrap();
        let items: Vec<&str> = level2
            .item_properties()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(items, vec!["idsession", "linkname"]);
        assert!(schema.root().required.contains("eventname"));
    }

    #[test]
    fn test_parse_rejects_invalid_schema() {
        let bad = json!({"type": "object", "properties": {"idevent": {}}});
        let err = Schema::parse(&bad).unwrap_err();
        assert!(matches!(err, ReshapeError::InvalidSchema { .. }));
        assert!(err.to_string().contains("idevent"));
    }

    #[test]
    fn test_parse_with_lowercase_folds_names() {
        let raw = json!({
            "type": "object",
            "properties": {
                "IdEvent": {"type": "number"},
                "HasMeetingURL": {"type": "number"}
            },
            "required": ["IdEvent"]
        });
        let schema = Schema::parse_with_case(&raw, KeyCase::Lowercase).unwrap();
        let names: Vec<&str> = schema.properties().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["idevent", "hasmeetingurl"]);
        assert!(schema.root().required.contains("idevent"));
    }

    #[test]
    fn test_parse_ignores_keywords_outside_the_node_type() {
        let raw = json!({
            "type": "object",
            "properties": {
                "idevent": {"type": "number"},
                "eventname": {"type": "string", "items": "ignored", "properties": 3},
                "tags": {"type": "array", "items": {"type": "string"}, "properties": {"x": 1}}
            },
            "required": "idevent"
        });
        assert!(validate_schema(&raw));
        let schema = Schema::parse(&raw).expect("a valid schema should parse");
        let eventname = schema.property("eventname").unwrap();
        assert!(eventname.items.is_none());
        assert!(eventname.properties.is_none());
        assert!(schema.property("tags").unwrap().properties.is_none());
        assert!(schema.root().required.is_empty());

        let mixed = json!({"type": "object", "properties": {}, "required": ["a", 1, null]});
        let mixed_schema = Schema::parse(&mixed).unwrap();
        let names: Vec<&str> = mixed_schema
            .root()
            .required
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_scalar_and_array_split() {
        let schema = Schema::parse(&event_schema()).unwrap();
        let scalars: Vec<&str> = schema.scalar_properties().map(|(k, _)| k.as_str()).collect();
        let arrays: Vec<&str> = schema.array_properties().map(|(k, _)| k.as_str()).collect();
        assert_eq!(scalars, vec!["idevent", "eventname"]);
        assert_eq!(arrays, vec!["level2"]);
    }
}
