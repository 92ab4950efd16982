pub mod config;
pub mod conformance;
pub mod error;
pub mod group;
pub mod keys;
pub mod merge;
pub mod schema;
pub mod selection;
pub mod translate;
pub mod tree;
pub mod value;


use serde_json::Value;

// Re-export commonly used items
pub use config::{DebugVerbosity, FlattenDepth, KeyCase, ReshapeConfig};
pub use conformance::{check, check_raw_data, check_tree, conforms};
pub use error::{ReshapeError, Result, ShapeMismatch};
pub use group::{flatten_records, group_records, Groups};
pub use keys::{infer_keys, ExplicitKeys, GroupKey, InferredKeys, KeySelector};
pub use merge::{merge_all, merge_or_add_leaf, merge_trees, LeafMerge};
pub use schema::{validate_schema, Schema, SchemaNode, SchemaType};
pub use tree::{build_from_groups, build_skeleton, fill_from_data, GroupNode, LeafNode};
pub use value::Record;

/// Reshape nested records into a grouped tree, driven by a raw schema.
///
/// The schema is validated first and nothing is grouped if it is invalid.
/// Grouping keys are `config.group_by` when given, otherwise the schema's
/// inferred id/name pair.
#[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
pub fn reshape(data: Value, schema: &Value, config: &ReshapeConfig) -> Result<Vec<GroupNode>> {
    let schema = parse_schema(schema, config)?;
    match &config.group_by {
        Some(keys) => {
            let selector = ExplicitKeys(GroupKey::new(keys.iter().cloned()).fold_case(config.key_case));
            reshape_with(data, &schema, &selector, config)
        }
        None => reshape_with(data, &schema, &InferredKeys, config),
    }
}

/// Reshape with a parsed schema and a caller-chosen key selector.
#[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
pub fn reshape_with(
    data: Value,
    schema: &Schema,
    selector: &dyn KeySelector,
    config: &ReshapeConfig,
) -> Result<Vec<GroupNode>> {
    let key = selector.select(schema)?;
    debug!(config, "Grouping by {:?}", key.names());
    let records = flatten_records(data, config.flatten_depth)?;
    Ok(reshape_records(records, &key, config))
}

/// Group already-flat records and build the tree; no schema involved.
pub fn reshape_records(records: Vec<Record>, key: &GroupKey, config: &ReshapeConfig) -> Vec<GroupNode> {
    let record_count = records.len();
    let records = group::fold_record_keys(records, config.key_case);
    let groups = group_records(records, key);
    for (text, members) in &groups {
        debug_verbose!(config, "Group '{}': {} record(s)", text, members.len());
    }
    let tree = build_from_groups(&groups, key);
    debug!(
        config,
        "Built {} group(s) from {} record(s)",
        tree.len(),
        record_count
    );
    tree
}

/// Build the schema skeleton and fill it from `array<array<array<Record>>>` data.
#[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
pub fn fill(data: Value, schema: &Value, config: &ReshapeConfig) -> Result<Record> {
    let schema = parse_schema(schema, config)?;
    let skeleton = build_skeleton(&schema);
    let filled = fill_from_data(&skeleton, group::fold_nested_keys(data, config.key_case), &schema)?;
    debug!(config, "Filled {} schema propert(ies)", filled.len());
    Ok(filled)
}

/// Check raw nested data against a raw schema; `Ok(None)` when it conforms.
pub fn check_data(data: Value, schema: &Value, config: &ReshapeConfig) -> Result<Option<ShapeMismatch>> {
    let schema = parse_schema(schema, config)?;
    let mismatch = check_raw_data(group::fold_nested_keys(data, config.key_case), &schema)?;
    if let Some(m) = &mismatch {
        debug!(config, "{}", m);
    }
    Ok(mismatch)
}

fn parse_schema(schema: &Value, config: &ReshapeConfig) -> Result<Schema> {
    Schema::parse_with_case(schema, config.key_case).map_err(|err| {
        debug!(config, "Schema rejected: {}", err);
        err
    })
}
