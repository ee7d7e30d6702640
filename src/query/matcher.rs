//! Testing one candidate against one selector part.

use crate::query::pseudo;
use crate::query::selector::{AttrOp, Attribute, Part};
use crate::tree::{Handle, Key, NodeId, Tree};
use crate::value::{normalize, Value};

/// Tests `value`, found at `key` within its parent, against `part`. The
/// part's combinator is not considered.
///
/// Primitive values only ever match on their key. Lists match on their key
/// and fail every other test.
pub(crate) fn matches_part(tree: &Tree, value: &Value, key: Option<Key<'_>>, part: &Part) -> bool {
    let handle = match value.as_handle() {
        Some(handle) => handle,
        None => return !part.has_node_tests() && tag_matches(part.tag.as_deref(), key),
    };

    if part.tag.is_some() {
        let key = key.or_else(|| tree.key_of(handle));
        if !tag_matches(part.tag.as_deref(), key) {
            return false;
        }
    }

    let node = match handle {
        Handle::Node(node) => node,
        Handle::List(_) => return !part.has_node_tests(),
    };

    if let Some(id) = &part.id {
        if tree.registry().is_a(tree.type_id(node), id) != Some(true) {
            return false;
        }
    }

    part.classes.iter().all(|class| has_class(tree, node, class))
        && part
            .attributes
            .iter()
            .all(|attribute| attribute_matches(tree, node, attribute))
        && part
            .pseudos
            .iter()
            .all(|p| pseudo::test(tree, node, &p.name, p.argument.as_deref()))
}

fn tag_matches(tag: Option<&str>, key: Option<Key<'_>>) -> bool {
    match (tag, key) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(tag), Some(Key::Field(field))) => tag == field,
        (Some(tag), Some(Key::Index(index))) => tag.parse::<usize>() == Ok(index),
    }
}

/// A declared field or metadata key holding something other than null or
/// undefined.
fn has_class(tree: &Tree, node: NodeId, name: &str) -> bool {
    match tree.get(node, name) {
        Ok(value) => !value.is_absent(),
        Err(_) => tree.meta(node).get(name).is_some_and(|raw| !raw.is_null()),
    }
}

/// Current value of an attribute: a field, else a metadata key. `None` for
/// structured metadata, which no textual operator applies to.
fn attribute_value(tree: &Tree, node: NodeId, name: &str) -> Option<Value> {
    if let Ok(value) = tree.get(node, name) {
        return Some(value);
    }
    match tree.meta(node).get(name) {
        None => Some(Value::Undefined),
        Some(serde_json::Value::Null) => Some(Value::Null),
        Some(serde_json::Value::Bool(b)) => Some(Value::Bool(*b)),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(Value::Number),
        Some(serde_json::Value::String(s)) => Some(Value::String(s.clone())),
        Some(_) => None,
    }
}

fn attribute_matches(tree: &Tree, node: NodeId, attribute: &Attribute) -> bool {
    let Some(op) = &attribute.op else {
        return tree.node_type(node).field_index(&attribute.name).is_some()
            || tree.meta(node).contains_key(&attribute.name);
    };

    let actual = attribute_value(tree, node, &attribute.name);
    let expected = normalize(&attribute.value);

    let actual = match actual {
        Some(value) if value.is_primitive() => value,
        _ => return *op == AttrOp::NotEq,
    };

    let text = actual.to_text();
    let raw = attribute.value.as_str();
    match op {
        AttrOp::Eq => actual == expected,
        AttrOp::NotEq => actual != expected,
        AttrOp::Prefix => text.starts_with(raw),
        AttrOp::Suffix => text.ends_with(raw),
        AttrOp::Contains => text.contains(raw),
        AttrOp::Word => text.split_whitespace().any(|word| word == raw),
        AttrOp::DashPrefix => {
            text == raw || text.strip_prefix(raw).is_some_and(|rest| rest.starts_with('-'))
        }
        AttrOp::Unknown(_) => false,
    }
}
