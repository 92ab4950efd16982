use crate::config::KeyCase;
use crate::error::{ReshapeError, Result};
use crate::schema::{Schema, SchemaType};

/// Ordered property names whose joined values identify a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey(Vec<String>);

impl GroupKey {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// The first key property, used as the group identifier when merging.
    pub fn id(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub(crate) fn fold_case(self, case: KeyCase) -> Self {
        Self(self.0.iter().map(|n| case.apply(n).into_owned()).collect())
    }
}

/// Picks the grouping key for a schema.
pub trait KeySelector {
    fn select(&self, schema: &Schema) -> Result<GroupKey>;
}

/// Heuristic selection: the first `number` property is the id and the first
/// `string` property is the display name.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferredKeys;

impl KeySelector for InferredKeys {
    fn select(&self, schema: &Schema) -> Result<GroupKey> {
        let (id, name) = infer_keys(schema)?;
        Ok(GroupKey::new([id, name]))
    }
}

/// Caller-supplied keys, used as given.
#[derive(Debug, Clone)]
pub struct ExplicitKeys(pub GroupKey);

impl KeySelector for ExplicitKeys {
    fn select(&self, _schema: &Schema) -> Result<GroupKey> {
        Ok(self.0.clone())
    }
}

/// Find the `(id, name)` key pair for a schema in declaration order.
///
/// With no string property the id doubles as the name.
pub fn infer_keys(schema: &Schema) -> Result<(String, String)> {
    let mut id_key = None;
    let mut name_key = None;

    for (name, node) in schema.properties() {
        match node.kind {
            SchemaType::Number if id_key.is_none() => id_key = Some(name.clone()),
            SchemaType::String if name_key.is_none() => name_key = Some(name.clone()),
            _ => {}
        }
        if id_key.is_some() && name_key.is_some() {
            break;
        }
    }

    let id_key = id_key.ok_or(ReshapeError::MissingIdentifier)?;
    let name_key = name_key.unwrap_or_else(|| id_key.clone());
    Ok((id_key, name_key))
}
