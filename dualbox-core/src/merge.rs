use indexmap::IndexMap;
use serde_json::Value;

use crate::tree::{GroupNode, LeafNode};

/// Combine two trees, joining groups that share an `id_key` value.
///
/// Groups keep first-seen order across `a` then `b`. A joined group keeps the
/// key fields of its first occurrence and its leaves run in input order;
/// leaves are not de-duplicated. Identity uses the same loose key text as
/// grouping, so `5` and `"5"` name the same group.
pub fn merge_trees(a: Vec<GroupNode>, b: Vec<GroupNode>, id_key: &str) -> Vec<GroupNode> {
    merge_all([a, b], id_key)
}

/// Left-to-right merge of any number of trees.
pub fn merge_all<I>(trees: I, id_key: &str) -> Vec<GroupNode>
where
    I: IntoIterator<Item = Vec<GroupNode>>,
{
    let mut merged: IndexMap<String, GroupNode> = IndexMap::new();
    for node in trees.into_iter().flatten() {
        match merged.entry(node.id_text(id_key)) {
            indexmap::map::Entry::Occupied(mut entry) => {
                entry.get_mut().level2.extend(node.level2);
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(node);
            }
        }
    }
    merged.into_values().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafMerge {
    /// An existing leaf at this index was updated in place
    Updated(usize),
    /// The leaf was appended at this index
    Added(usize),
}

/// Update the first leaf whose `primary_key` equals the new leaf's, or append.
///
/// Updating is a shallow merge where the new leaf's properties win. A new
/// leaf without `primary_key` is always appended.
pub fn merge_or_add_leaf(leaves: &mut Vec<LeafNode>, new_leaf: LeafNode, primary_key: &str) -> LeafMerge {
    let position = new_leaf
        .get(primary_key)
        .and_then(|wanted| leaves.iter().position(|leaf| leaf.get(primary_key) == Some(wanted)));

    match position {
        Some(i) => {
            let existing = &mut leaves[i];
            for (name, value) in new_leaf {
                existing.insert(name, value);
            }
            LeafMerge::Updated(i)
        }
        None => {
            leaves.push(new_leaf);
            LeafMerge::Added(leaves.len() - 1)
        }
    }
}

/// Remove the first leaf whose `primary_key` equals `value`, returning it.
pub fn remove_leaf(leaves: &mut Vec<LeafNode>, primary_key: &str, value: &Value) -> Option<LeafNode> {
    let i = leaves
        .iter()
        .position(|leaf| leaf.get(primary_key) == Some(value))?;
    Some(leaves.remove(i))
}
