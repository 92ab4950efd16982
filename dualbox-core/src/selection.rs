//! The dual list box as plain data.
//!
//! [`render`] splits a tree into an available and a selected side, and
//! [`DualListState::apply_edit`] folds a user edit back in, returning the
//! leaves that changed sides. Groups are created on the receiving side as
//! needed and dropped from the giving side once empty.
//!
//! Group and option values are matched by loose text, the way a widget that
//! only sees attribute strings would match them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::keys::infer_keys;
use crate::merge::merge_or_add_leaf;
use crate::schema::{Schema, SchemaType};
use crate::tree::{GroupNode, LeafNode};
use crate::value::{same_value, Record, ValueExt};

/// Group label used when a group has no usable name.
pub const MISSING_GROUP_NAME: &str = "Name not found";
/// Option label used when a leaf has no usable label.
pub const MISSING_ITEM_NAME: &str = "Item name not found";

/// Relabels groups holding a meeting that has a meeting URL.
///
/// When any leaf of a group has both flags equal to `1`, every option in the
/// group is labelled `pattern`, and so is the group itself if `relabel_group`
/// is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingLabel {
    pub pattern: String,
    pub meeting_key: String,
    pub url_key: String,
    pub relabel_group: bool,
}

impl Default for MeetingLabel {
    fn default() -> Self {
        Self {
            pattern: "Gobrunch".to_string(),
            meeting_key: "ismeeting".to_string(),
            url_key: "HasMeetingURL".to_string(),
            relabel_group: true,
        }
    }
}

impl MeetingLabel {
    fn applies_to(&self, node: &GroupNode) -> bool {
        let one = Value::from(1);
        node.level2.iter().any(|leaf| {
            [&self.meeting_key, &self.url_key]
                .iter()
                .all(|key| leaf.get(key.as_str()).is_some_and(|v| same_value(v, &one)))
        })
    }
}

/// Names the properties that identify groups and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Group identifier property
    pub id_key: String,
    /// Group property used as the group label; the first string field when unset
    pub name_key: Option<String>,
    /// Leaf property used as the option value
    pub value_key: String,
    /// Leaf property used as the option label
    pub label_key: String,
    /// Leaves whose property equals this value start out selected
    pub preselect: Option<(String, Value)>,
    pub meeting_label: Option<MeetingLabel>,
}

impl RenderOptions {
    pub fn new(id_key: impl Into<String>, value_key: impl Into<String>, label_key: impl Into<String>) -> Self {
        Self {
            id_key: id_key.into(),
            name_key: None,
            value_key: value_key.into(),
            label_key: label_key.into(),
            preselect: Some(("inproduct".to_string(), Value::from(1))),
            meeting_label: Some(MeetingLabel::default()),
        }
    }

    /// Pick keys from a schema: the group id and name as inferred for
    /// grouping, and the first numeric and first string item property of the
    /// first array property as option value and label.
    pub fn infer(schema: &Schema) -> Result<Self> {
        let (id_key, name_key) = infer_keys(schema)?;
        let mut value_key = None;
        let mut label_key = None;
        if let Some(items) = schema
            .array_properties()
            .find_map(|(_, node)| node.item_properties())
        {
            for (name, node) in items {
                match node.kind {
                    SchemaType::Number if value_key.is_none() => value_key = Some(name.clone()),
                    SchemaType::String if label_key.is_none() => label_key = Some(name.clone()),
                    _ => {}
                }
            }
        }
        let value_key = value_key.unwrap_or_else(|| id_key.clone());
        let label_key = label_key.unwrap_or_else(|| value_key.clone());
        Ok(Self {
            name_key: Some(name_key),
            ..Self::new(id_key, value_key, label_key)
        })
    }

    pub fn without_preselect(mut self) -> Self {
        self.preselect = None;
        self
    }

    pub fn without_meeting_label(mut self) -> Self {
        self.meeting_label = None;
        self
    }

    fn meeting_pattern(&self, node: &GroupNode) -> Option<&MeetingLabel> {
        self.meeting_label.as_ref().filter(|rule| rule.applies_to(node))
    }

    /// Display label of a group.
    pub fn group_label(&self, node: &GroupNode) -> String {
        if let Some(rule) = self.meeting_pattern(node).filter(|rule| rule.relabel_group) {
            return rule.pattern.clone();
        }
        let name = match &self.name_key {
            Some(key) => node.get(key),
            None => node.fields.values().find(|v| v.is_string()),
        };
        match name {
            Some(value) if value.is_truthy() => value.loose_string(),
            _ => MISSING_GROUP_NAME.to_string(),
        }
    }

    /// Display labels of a group's options, in leaf order.
    pub fn leaf_labels(&self, node: &GroupNode) -> Vec<String> {
        let pattern = self.meeting_pattern(node).map(|rule| rule.pattern.as_str());
        node.level2
            .iter()
            .map(|leaf| match (pattern, leaf.get(&self.label_key)) {
                (Some(pattern), _) => pattern.to_string(),
                (None, Some(value)) if value.is_truthy() => value.loose_string(),
                (None, _) => MISSING_ITEM_NAME.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Available,
    Selected,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::Available => Side::Selected,
            Side::Selected => Side::Available,
        }
    }
}

/// A user action on the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserEdit {
    /// Move one option from available to selected
    Select { group: Value, value: Value },
    /// Move one option from selected back to available
    Deselect { group: Value, value: Value },
    /// Move a whole group from available to selected
    SelectGroup { group: Value },
    /// Move a whole group from selected back to available
    DeselectGroup { group: Value },
}

/// One leaf that was added to the `to` side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafDelta {
    pub group: Value,
    pub leaf: LeafNode,
    pub to: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualListState {
    pub options: RenderOptions,
    pub available: Vec<GroupNode>,
    pub selected: Vec<GroupNode>,
}

/// Lay a tree out as the widget's initial state.
pub fn render(tree: Vec<GroupNode>, options: RenderOptions) -> DualListState {
    let mut state = DualListState {
        options,
        available: tree,
        selected: Vec::new(),
    };
    if let Some((flag, wanted)) = state.options.preselect.clone() {
        let mut moves = Vec::new();
        for node in &state.available {
            for leaf in &node.level2 {
                if leaf.get(&flag).is_some_and(|v| same_value(v, &wanted)) {
                    if let (Some(group), Some(value)) =
                        (node.get(&state.options.id_key), leaf.get(&state.options.value_key))
                    {
                        moves.push((group.clone(), value.clone()));
                    }
                }
            }
        }
        for (group, value) in moves {
            state.move_leaf(&group, &value, Side::Available);
        }
    }
    state.available.retain(|node| !node.level2.is_empty());
    state
}

fn leaf_position(leaves: &[LeafNode], value_key: &str, value: &Value) -> Option<usize> {
    let wanted = value.loose_string();
    leaves
        .iter()
        .position(|leaf| leaf.get(value_key).is_some_and(|v| v.loose_string() == wanted))
}

impl DualListState {
    pub fn apply_edit(&mut self, edit: UserEdit) -> Vec<LeafDelta> {
        match edit {
            UserEdit::Select { group, value } => {
                self.move_leaf(&group, &value, Side::Available).into_iter().collect()
            }
            UserEdit::Deselect { group, value } => {
                self.move_leaf(&group, &value, Side::Selected).into_iter().collect()
            }
            UserEdit::SelectGroup { group } => self.move_group(&group, Side::Available),
            UserEdit::DeselectGroup { group } => self.move_group(&group, Side::Selected),
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<GroupNode> {
        match side {
            Side::Available => &mut self.available,
            Side::Selected => &mut self.selected,
        }
    }

    fn position(&self, side: Side, group: &Value) -> Option<usize> {
        let wanted = group.loose_string();
        let groups = match side {
            Side::Available => &self.available,
            Side::Selected => &self.selected,
        };
        groups
            .iter()
            .position(|node| node.id_text(&self.options.id_key) == wanted)
    }

    /// Index of the group on `side`, creating it with `fields` if absent.
    fn target_group(&mut self, side: Side, group: &Value, fields: &Record) -> usize {
        match self.position(side, group) {
            Some(i) => i,
            None => {
                let groups = self.side_mut(side);
                groups.push(GroupNode::new(fields.clone()));
                groups.len() - 1
            }
        }
    }

    fn move_leaf(&mut self, group: &Value, value: &Value, from: Side) -> Option<LeafDelta> {
        let source = self.position(from, group)?;
        let value_key = self.options.value_key.clone();
        let (leaf, fields, now_empty) = {
            let node = &mut self.side_mut(from)[source];
            let at = leaf_position(&node.level2, &value_key, value)?;
            let leaf = node.level2.remove(at);
            (leaf, node.fields.clone(), node.level2.is_empty())
        };
        if now_empty {
            self.side_mut(from).remove(source);
        }

        let to = from.other();
        let target = self.target_group(to, group, &fields);
        merge_or_add_leaf(&mut self.side_mut(to)[target].level2, leaf.clone(), &value_key);
        Some(LeafDelta {
            group: group.clone(),
            leaf,
            to,
        })
    }

    /// Move a whole group. Leaves whose value the receiving group already
    /// holds are dropped and produce no delta.
    fn move_group(&mut self, group: &Value, from: Side) -> Vec<LeafDelta> {
        let Some(source) = self.position(from, group) else {
            return Vec::new();
        };
        let node = self.side_mut(from).remove(source);
        let to = from.other();
        let value_key = self.options.value_key.clone();
        let target = self.target_group(to, group, &node.fields);
        let existing = &mut self.side_mut(to)[target].level2;

        let mut deltas = Vec::new();
        for leaf in node.level2 {
            let duplicate = leaf
                .get(&value_key)
                .is_some_and(|v| leaf_position(existing.as_slice(), &value_key, v).is_some());
            if duplicate {
                continue;
            }
            existing.push(leaf.clone());
            deltas.push(LeafDelta {
                group: group.clone(),
                leaf,
                to,
            });
        }
        deltas
    }

    /// The selected side in the widget's report format.
    pub fn selected_items(&self) -> Vec<SelectedGroup> {
        self.selected
            .iter()
            .map(|node| SelectedGroup {
                idlevel1: node.get(&self.options.id_key).cloned().unwrap_or(Value::Null),
                level1name: self.options.group_label(node),
                level2: node
                    .level2
                    .iter()
                    .zip(self.options.leaf_labels(node))
                    .map(|(leaf, level2name)| SelectedItem {
                        idlevel2: leaf.get(&self.options.value_key).cloned().unwrap_or(Value::Null),
                        level2name,
                    })
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedGroup {
    pub idlevel1: Value,
    pub level1name: String,
    #[serde(rename = "Level2")]
    pub level2: Vec<SelectedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub idlevel2: Value,
    pub level2name: String,
}
