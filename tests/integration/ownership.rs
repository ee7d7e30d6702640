use super::{identifiers, load, NESTED_EMPTY, SCOPES};
use ast_select::{estree, Handle, Tree, TreeError, Value};
use proptest::prelude::*;

#[test]
fn attaching_to_a_new_field_detaches_from_the_old_one() {
    let (mut tree, _) = load(SCOPES);
    let inner_ref = identifiers(&tree, "inner")[1];
    let ret = tree.parent_node(inner_ref.into()).unwrap();
    assert_eq!(tree.type_name(ret), "ReturnStatement");

    let statement = tree.create_node("ExpressionStatement").unwrap();
    tree.set(statement, "expression", inner_ref).unwrap();

    assert_eq!(tree.parent(inner_ref.into()), Some(Handle::Node(statement)));
    assert_eq!(tree.get(ret, "argument").unwrap(), Value::Null);
    assert_eq!(tree.child(statement, "expression").unwrap(), Some(inner_ref));
}

#[test]
fn moving_a_statement_between_lists() {
    let (mut tree, program) = load(SCOPES);
    let program_body = tree.list(program, "body").unwrap();
    let declaration = tree.items(program_body)[0].unwrap();

    let outer = tree.items(program_body)[1].unwrap();
    let block = tree.child(outer, "body").unwrap().unwrap();
    let block_body = tree.list(block, "body").unwrap();

    tree.push(block_body, declaration).unwrap();

    assert_eq!(tree.list_len(program_body), 2);
    assert!(!tree.items(program_body).contains(&Some(declaration)));
    assert_eq!(tree.items(block_body).last(), Some(&Some(declaration)));
    assert_eq!(tree.parent(declaration.into()), Some(Handle::List(block_body)));
    assert_eq!(tree.parent_node(declaration.into()), Some(block));
}

#[test]
fn rejected_assignment_keeps_the_previous_value() {
    let (mut tree, program) = load(NESTED_EMPTY);
    let statement = tree.search(program, "IfStatement").unwrap()[0].as_node().unwrap();
    let test = tree.child(statement, "test").unwrap().unwrap();

    let empty = tree.create_node("EmptyStatement").unwrap();
    let err = tree.set(statement, "test", empty).unwrap_err();
    assert!(matches!(err, TreeError::InvalidValue { ref field, .. } if field == "test"));

    assert_eq!(tree.child(statement, "test").unwrap(), Some(test));
    assert_eq!(tree.parent(empty.into()), None);
}

#[test]
fn rejected_list_insert_changes_nothing() {
    let (mut tree, program) = load(NESTED_EMPTY);
    let body = tree.list(program, "body").unwrap();
    let before = tree.items(body).to_vec();

    let empty = tree.create_node("EmptyStatement").unwrap();
    let literal = tree.create_node("Literal").unwrap();
    let err = tree.splice(body, 0, 0, vec![Some(empty), Some(literal)]).unwrap_err();
    assert!(matches!(err, TreeError::InvalidListItem { .. }));

    assert_eq!(tree.items(body), before.as_slice());
    assert_eq!(tree.parent(empty.into()), None);
}

#[test]
fn a_node_cannot_become_its_own_ancestor() {
    let (mut tree, program) = load(NESTED_EMPTY);
    let block = tree.search(program, "BlockStatement").unwrap()[0].as_node().unwrap();
    let statement = tree.parent_node(block.into()).unwrap();
    let block_body = tree.list(block, "body").unwrap();

    let err = tree.push(block_body, statement).unwrap_err();
    assert!(matches!(err, TreeError::Cycle { .. }));
    assert_eq!(tree.parent_node(statement.into()), Some(program));
}

#[test]
fn removed_subtrees_stay_usable() {
    let (mut tree, program) = load(NESTED_EMPTY);
    let body = tree.list(program, "body").unwrap();
    let statement = tree.items(body)[0].unwrap();

    assert!(tree.remove_child(Handle::List(body), statement));
    assert_eq!(tree.list_len(body), 0);
    assert_eq!(tree.parent(statement.into()), None);

    let found = tree.search(statement, "EmptyStatement").unwrap();
    assert_eq!(found.len(), 1);

    tree.push(body, statement).unwrap();
    assert_eq!(tree.search(program, "EmptyStatement").unwrap(), found);
}

#[test]
fn list_identity_is_fixed() {
    let (mut tree, program) = load(NESTED_EMPTY);
    let body = tree.list(program, "body").unwrap();
    tree.empty(body);

    let err = tree.set(program, "body", Value::List(body)).unwrap_err();
    assert!(matches!(err, TreeError::ListField { .. }));
    assert_eq!(tree.list(program, "body").unwrap(), body);
}

proptest! {
    /// Moving a statement to another program body leaves exactly one parent
    /// holding it.
    #[test]
    fn prop_moves_keep_a_single_owner(
        sizes in (1usize..6, 0usize..6),
        pick in any::<prop::sample::Index>(),
        at in any::<prop::sample::Index>(),
    ) {
        let (left_len, right_len) = sizes;
        let mut tree = Tree::new(estree().unwrap());
        let left = tree.create_node("Program").unwrap();
        let right = tree.create_node("Program").unwrap();
        let left_body = tree.list(left, "body").unwrap();
        let right_body = tree.list(right, "body").unwrap();

        for _ in 0..left_len {
            let statement = tree.create_node("EmptyStatement").unwrap();
            tree.push(left_body, statement).unwrap();
        }
        for _ in 0..right_len {
            let statement = tree.create_node("EmptyStatement").unwrap();
            tree.push(right_body, statement).unwrap();
        }

        let moved = tree.items(left_body)[pick.index(left_len)].unwrap();
        let at = at.index(right_len + 1);
        tree.splice(right_body, at, 0, vec![Some(moved)]).unwrap();

        prop_assert_eq!(tree.list_len(left_body), left_len - 1);
        prop_assert_eq!(tree.list_len(right_body), right_len + 1);
        prop_assert!(!tree.items(left_body).contains(&Some(moved)));
        prop_assert_eq!(tree.items(right_body)[at], Some(moved));
        prop_assert_eq!(tree.parent(moved.into()), Some(Handle::List(right_body)));
        prop_assert_eq!(tree.parent_node(moved.into()), Some(right));
    }
}
