//! Tree model helpers
//!
//! Documents are represented as [`serde_yaml::Value`]. Mappings keep insertion
//! order, which every operation in this crate preserves. This module adds the
//! pieces the matcher and planner need on top of that: concrete location
//! steps, trails, navigation by location, and a few scalar predicates.

use std::fmt;

use serde_yaml::{Mapping, Value};

/// One concrete component of a location inside a document.
///
/// Keys keep the original key node (a `200:` key is a number, not a string) so
/// that looking the entry up again is exact.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// A mapping entry, identified by its key node
    Key(Value),
    /// A sequence item
    Index(usize),
}

impl Step {
    /// Build a key step from plain text.
    pub fn key(text: &str) -> Self {
        Step::Key(Value::String(text.to_string()))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => match scalar_text(key) {
                Some(text) => write!(f, "{}", text),
                None => write!(f, "<{}>", type_name(key)),
            },
            Step::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// Breadcrumbs from the document root to the node currently being visited.
pub type Trail = Vec<Step>;

/// Join a trail into a label, e.g. `paths,/pet,get`.
pub fn describe(steps: &[Step], delimiter: &str) -> String {
    steps
        .iter()
        .map(|step| step.to_string())
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// The location of a child: its parent's trail plus its own step.
pub fn child_location(trail: &[Step], key: &Step) -> Trail {
    let mut location = trail.to_vec();
    location.push(key.clone());
    location
}

/// Text of a scalar node, `None` for collections.
///
/// `null` renders as the empty string so that it substitutes cleanly into
/// command text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Whether a node is a scalar (tags are looked through).
pub fn is_scalar(value: &Value) -> bool {
    !matches!(untag(value), Value::Sequence(_) | Value::Mapping(_))
}

/// Whether a node is an empty placeholder: `null` or a whitespace-only string.
pub fn is_blank(value: &Value) -> bool {
    match untag(value) {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// The scalar used to pad sequences up to a requested index.
pub fn placeholder() -> Value {
    Value::Null
}

/// Look through any tags on a node.
pub fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Mutable variant of [`untag`].
pub fn untag_mut(value: &mut Value) -> &mut Value {
    match value {
        Value::Tagged(tagged) => untag_mut(&mut tagged.value),
        other => other,
    }
}

/// Get a human-readable type name for a YAML value
///
/// Used for logging and error messages to describe the type of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Sequence(_) => "Sequence",
        Value::Mapping(_) => "Mapping",
        Value::Tagged(_) => "Tagged",
    }
}

/// Navigate to a location.
pub fn get_at<'a>(root: &'a Value, steps: &[Step]) -> Option<&'a Value> {
    let mut current = root;
    for step in steps {
        current = match (untag(current), step) {
            (Value::Mapping(map), Step::Key(key)) => map.get(key)?,
            (Value::Sequence(seq), Step::Index(idx)) => seq.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Navigate to a location for mutation.
pub fn get_at_mut<'a>(root: &'a mut Value, steps: &[Step]) -> Option<&'a mut Value> {
    let mut current = root;
    for step in steps {
        current = match (untag_mut(current), step) {
            (Value::Mapping(map), Step::Key(key)) => map.get_mut(key)?,
            (Value::Sequence(seq), Step::Index(idx)) => seq.get_mut(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Remove the node at `location` from its parent, preserving the order of the
/// remaining entries. Removing the empty location clears the document.
pub fn remove_at(root: &mut Value, location: &[Step]) -> Option<Value> {
    let Some((last, parent_steps)) = location.split_last() else {
        return Some(std::mem::replace(root, Value::Null));
    };
    let parent = untag_mut(get_at_mut(root, parent_steps)?);
    match (parent, last) {
        (Value::Mapping(map), Step::Key(key)) => map.shift_remove(key),
        (Value::Sequence(seq), Step::Index(idx)) if *idx < seq.len() => Some(seq.remove(*idx)),
        _ => None,
    }
}

/// Build a single-entry mapping.
pub fn single_entry(key: &str, value: Value) -> Value {
    let mut map = Mapping::new();
    map.insert(Value::String(key.to_string()), value);
    Value::Mapping(map)
}
