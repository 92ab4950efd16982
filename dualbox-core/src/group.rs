//! Flattening of nested record arrays and partitioning into keyed groups.

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::{FlattenDepth, KeyCase};
use crate::error::{ReshapeError, Result};
use crate::keys::GroupKey;
use crate::value::{key_text, Record, ValueExt};

/// Records partitioned by loose key text, in first-seen order.
pub type Groups = IndexMap<String, Vec<Record>>;

/// Unwrap nested arrays of records into one sequence, in document order.
///
/// The input must be an array. Records may sit at any level down to `depth`;
/// an array still nested below that limit, or any non-object leaf, is
/// rejected as malformed.
pub fn flatten_records(input: Value, depth: FlattenDepth) -> Result<Vec<Record>> {
    let items = match input {
        Value::Array(items) => items,
        other => {
            return Err(ReshapeError::MalformedInput {
                path: "$".to_string(),
                expected: "array",
                found: other.kind(),
            })
        }
    };
    let remaining = match depth {
        FlattenDepth::Full => None,
        FlattenDepth::Levels(n) => Some(n),
    };
    let mut out = Vec::new();
    flatten_into(items, remaining, "$", &mut out)?;
    Ok(out)
}

fn flatten_into(
    items: Vec<Value>,
    remaining: Option<usize>,
    path: &str,
    out: &mut Vec<Record>,
) -> Result<()> {
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(record) => out.push(record),
            Value::Array(nested) if remaining != Some(0) => {
                let path = format!("{path}[{i}]");
                flatten_into(nested, remaining.map(|n| n - 1), &path, out)?;
            }
            other => {
                return Err(ReshapeError::MalformedInput {
                    path: format!("{path}[{i}]"),
                    expected: "object",
                    found: other.kind(),
                })
            }
        }
    }
    Ok(())
}

/// Rename every property of each record under the given case policy.
///
/// When two names fold together the later property wins.
pub fn fold_record_keys(records: Vec<Record>, case: KeyCase) -> Vec<Record> {
    if case == KeyCase::Exact {
        return records;
    }
    records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(name, value)| (case.apply(&name).into_owned(), value))
                .collect()
        })
        .collect()
}

/// [`fold_record_keys`] for records still wrapped in nested arrays.
pub fn fold_nested_keys(value: Value, case: KeyCase) -> Value {
    if case == KeyCase::Exact {
        return value;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| fold_nested_keys(item, case))
                .collect(),
        ),
        Value::Object(record) => Value::Object(
            record
                .into_iter()
                .map(|(name, value)| (case.apply(&name).into_owned(), value))
                .collect(),
        ),
        other => other,
    }
}

/// Loose key text for one record: each key property's string form joined by `_`.
///
/// Absent properties contribute `"undefined"`, so distinct records that all
/// lack a key property share a group.
pub fn group_key_text(record: &Record, key: &GroupKey) -> String {
    key.names()
        .iter()
        .map(|name| key_text(record.get(name)))
        .collect::<Vec<_>>()
        .join("_")
}

/// Partition records into groups, keeping first-seen group and member order.
pub fn group_records(records: Vec<Record>, key: &GroupKey) -> Groups {
    let mut groups = Groups::new();
    for record in records {
        groups
            .entry(group_key_text(&record, key))
            .or_default()
            .push(record);
    }
    groups
}
