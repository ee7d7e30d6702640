use super::{load, NESTED_EMPTY, SCOPES};
use ast_select::{estree, Tree};
use proptest::prelude::*;
use serde_json::{json, Value as Json};

// ── Strategies ──────────────────────────────────────────────────────────

fn identifier() -> impl Strategy<Value = Json> {
    "[a-z]{1,6}".prop_map(|name| json!({ "type": "Identifier", "name": name }))
}

fn literal() -> impl Strategy<Value = Json> {
    prop_oneof![
        any::<i32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
        "[a-z ]{0,8}".prop_map(|s| json!(s)),
    ]
    .prop_map(|value| json!({ "type": "Literal", "value": value }))
}

fn expression() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![identifier(), literal()];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            (prop::sample::select(vec!["+", "-", "==", "in"]), inner.clone(), inner.clone())
                .prop_map(|(operator, left, right)| json!({
                    "type": "BinaryExpression",
                    "operator": operator,
                    "left": left,
                    "right": right
                })),
            (inner.clone(), prop::collection::vec(inner.clone(), 0..3)).prop_map(
                |(callee, arguments)| json!({
                    "type": "CallExpression",
                    "callee": callee,
                    "arguments": arguments
                })
            ),
            prop::collection::vec(prop::option::of(inner), 0..3).prop_map(|elements| json!({
                "type": "ArrayExpression",
                "elements": elements
            })),
        ]
    })
}

fn program() -> impl Strategy<Value = Json> {
    prop::collection::vec(expression(), 0..4).prop_map(|expressions| {
        let body: Vec<Json> = expressions
            .into_iter()
            .map(|expression| json!({ "type": "ExpressionStatement", "expression": expression }))
            .collect();
        json!({ "type": "Program", "body": body })
    })
}

// ── Fixtures ────────────────────────────────────────────────────────────

#[test]
fn fixtures_survive_a_round_trip() {
    for fixture in [NESTED_EMPTY, SCOPES] {
        let (mut tree, root) = load(fixture);
        let first = tree.to_json(root.into());

        let rebuilt = tree.build(&first).unwrap().as_node().unwrap();
        assert_ne!(rebuilt, root);
        assert_eq!(tree.to_json(rebuilt.into()), first);
    }
}

#[test]
fn metadata_is_carried_through() {
    let (tree, root) = load(SCOPES);
    let json = tree.to_json(root.into());
    assert_eq!(json["body"][2]["loc"]["start"]["line"], 14);
}

#[test]
fn clones_are_detached_copies() {
    let (mut tree, root) = load(SCOPES);
    let copy = tree.clone_subtree(root.into()).unwrap().as_node().unwrap();

    assert_eq!(tree.parent(copy.into()), None);
    assert_eq!(tree.to_json(copy.into()), tree.to_json(root.into()));
    assert_eq!(
        tree.search(copy, "Identifier").unwrap().len(),
        tree.search(root, "Identifier").unwrap().len()
    );
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    /// Canonical input serializes back to itself.
    #[test]
    fn prop_to_json_mirrors_input(input in program()) {
        let mut tree = Tree::new(estree().unwrap());
        let root = tree.build(&input).unwrap().as_handle().unwrap();
        prop_assert_eq!(tree.to_json(root), input);
    }

    /// Rebuilding from serialized output gives a structurally equal tree
    /// made of new nodes.
    #[test]
    fn prop_rebuild_is_structurally_equal(input in program()) {
        let mut tree = Tree::new(estree().unwrap());
        let root = tree.build(&input).unwrap().as_handle().unwrap();
        let first = tree.to_json(root);

        let rebuilt = tree.build(&first).unwrap().as_handle().unwrap();
        prop_assert_ne!(tree.uid(rebuilt), tree.uid(root));
        prop_assert_eq!(tree.to_json(rebuilt), first);
    }

    /// Repeated searches without mutation return the same sequence.
    #[test]
    fn prop_search_is_deterministic(
        input in program(),
        selector in prop::sample::select(vec![
            "Identifier",
            "#Expression",
            "CallExpression > arguments",
            "Literal, Identifier, BinaryExpression",
            "Identifier ! ExpressionStatement",
            "BinaryExpression[operator=\"+\"] > left",
            ":reference",
        ]),
    ) {
        let mut tree = Tree::new(estree().unwrap());
        let root = tree.build(&input).unwrap().as_handle().unwrap();

        let first = tree.search(root, selector).unwrap();
        let second = tree.search(root, selector).unwrap();
        prop_assert_eq!(first, second);
    }
}
