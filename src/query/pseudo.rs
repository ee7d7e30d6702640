//! `:reference`, `:declaration` and `:scope`.
//!
//! Whether an identifier is read or bound depends on the field it occupies in
//! its nearest enclosing node. The tables below list, per parent type, the
//! fields in which an identifier is a reference or a declaration. Parent types
//! absent from a table never qualify.

use crate::tree::{Handle, NodeId, Tree};
use crate::value::Value;

type RoleTable = &'static [(&'static str, &'static [&'static str])];

const REFERENCE_ROLES: RoleTable = &[
    ("ArrayExpression", &["elements"]),
    ("ArrowFunctionExpression", &["defaults", "body"]),
    ("AssignmentExpression", &["left", "right"]),
    ("AssignmentPattern", &["right"]),
    ("BinaryExpression", &["left", "right"]),
    ("CallExpression", &["callee", "arguments"]),
    ("ComprehensionBlock", &["right"]),
    ("ComprehensionExpression", &["body", "filter"]),
    ("ConditionalExpression", &["test", "consequent", "alternate"]),
    ("DoWhileStatement", &["test"]),
    ("ExpressionStatement", &["expression"]),
    ("ForInStatement", &["left", "right"]),
    ("ForOfStatement", &["left", "right"]),
    ("ForStatement", &["init", "test", "update"]),
    ("FunctionDeclaration", &["defaults"]),
    ("FunctionExpression", &["defaults"]),
    ("IfStatement", &["test"]),
    ("LogicalExpression", &["left", "right"]),
    ("MemberExpression", &["object"]),
    ("NewExpression", &["callee", "arguments"]),
    ("Property", &["value"]),
    ("ReturnStatement", &["argument"]),
    ("SequenceExpression", &["expressions"]),
    ("SpreadElement", &["argument"]),
    ("SwitchCase", &["test"]),
    ("SwitchStatement", &["discriminant"]),
    ("TaggedTemplateExpression", &["tag"]),
    ("TemplateLiteral", &["expressions"]),
    ("ThrowStatement", &["argument"]),
    ("UnaryExpression", &["argument"]),
    ("UpdateExpression", &["argument"]),
    ("VariableDeclarator", &["init"]),
    ("WhileStatement", &["test"]),
    ("WithStatement", &["object"]),
    ("YieldExpression", &["argument"]),
];

const DECLARATION_ROLES: RoleTable = &[
    ("ArrayPattern", &["elements"]),
    ("AssignmentPattern", &["left"]),
    ("CatchClause", &["param"]),
    ("ComprehensionBlock", &["left"]),
    ("RestElement", &["argument"]),
    ("VariableDeclarator", &["id"]),
];

/// Category-wide declaration roles, tested with `is_a`.
const DECLARATION_CATEGORY_ROLES: RoleTable = &[
    ("Function", &["id", "params", "rest"]),
    ("Class", &["id"]),
];

fn roles(table: RoleTable, type_name: &str) -> &'static [&'static str] {
    table
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// Evaluates a pseudo-class. Unknown names never match.
pub(crate) fn test(tree: &Tree, node: NodeId, name: &str, argument: Option<&str>) -> bool {
    match name {
        "reference" => is_reference(tree, node, argument),
        "declaration" => is_declaration(tree, node, argument),
        "scope" => is_scope(tree, node),
        _ => false,
    }
}

/// An identifier, optionally with the given name, and its nearest enclosing
/// node.
fn identifier_parent(tree: &Tree, node: NodeId, argument: Option<&str>) -> Option<NodeId> {
    if tree.type_name(node) != "Identifier" {
        return None;
    }
    if let Some(expected) = argument {
        if tree.get(node, "name").ok()?.as_str() != Some(expected) {
            return None;
        }
    }
    tree.parent_node(Handle::Node(node))
}

/// True when `child` sits in `field` of `parent`, directly or as a list item.
fn holds(tree: &Tree, parent: NodeId, field: &str, child: NodeId) -> bool {
    match tree.get(parent, field) {
        Ok(Value::Node(held)) => held == child,
        Ok(Value::List(list)) => tree.items(list).contains(&Some(child)),
        _ => false,
    }
}

fn in_object_pattern(tree: &Tree, property: NodeId) -> bool {
    match tree.parent(Handle::Node(property)) {
        Some(Handle::List(list)) => tree
            .parent_node(Handle::List(list))
            .is_some_and(|owner| tree.type_name(owner) == "ObjectPattern"),
        _ => false,
    }
}

pub(crate) fn is_reference(tree: &Tree, node: NodeId, argument: Option<&str>) -> bool {
    let Some(parent) = identifier_parent(tree, node, argument) else {
        return false;
    };
    let parent_type = tree.type_name(parent);

    if parent_type == "MemberExpression"
        && tree.get(parent, "computed").ok() == Some(Value::Bool(true))
        && holds(tree, parent, "property", node)
    {
        return true;
    }
    if parent_type == "Property" && in_object_pattern(tree, parent) {
        return false;
    }

    roles(REFERENCE_ROLES, parent_type)
        .iter()
        .any(|field| holds(tree, parent, field, node))
}

pub(crate) fn is_declaration(tree: &Tree, node: NodeId, argument: Option<&str>) -> bool {
    let Some(parent) = identifier_parent(tree, node, argument) else {
        return false;
    };
    let parent_type = tree.type_name(parent);

    if parent_type == "Property" {
        return in_object_pattern(tree, parent) && holds(tree, parent, "value", node);
    }

    let registry = tree.registry();
    let category_fields = DECLARATION_CATEGORY_ROLES
        .iter()
        .filter(|(category, _)| registry.is_a(tree.type_id(parent), category) == Some(true))
        .flat_map(|(_, fields)| fields.iter());

    roles(DECLARATION_ROLES, parent_type)
        .iter()
        .chain(category_fields)
        .any(|field| holds(tree, parent, field, node))
}

/// The program root or a function.
pub(crate) fn is_scope(tree: &Tree, node: NodeId) -> bool {
    tree.type_name(node) == "Program"
        || tree.registry().is_a(tree.type_id(node), "Function") == Some(true)
}
