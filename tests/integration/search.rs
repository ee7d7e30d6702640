use super::{identifiers, load, type_names, NESTED_EMPTY, SCOPES};
use ast_select::{Handle, QueryEngine, QueryError, Value};

#[test]
fn descendant_finds_the_nested_statement() {
    let (tree, program) = load(NESTED_EMPTY);
    let found = tree.search(program, "EmptyStatement").unwrap();
    assert_eq!(type_names(&tree, &found), ["EmptyStatement"]);
}

#[test]
fn child_does_not_reach_grandchildren() {
    let (tree, program) = load(NESTED_EMPTY);
    assert!(tree.search(program, "> EmptyStatement").unwrap().is_empty());
}

#[test]
fn parent_combinators_confirm_the_chain() {
    let (tree, program) = load(NESTED_EMPTY);

    let found = tree
        .search(program, "EmptyStatement < body < BlockStatement")
        .unwrap();
    assert_eq!(type_names(&tree, &found), ["BlockStatement"]);

    let found = tree.search(program, "EmptyStatement ! #Program").unwrap();
    assert_eq!(found, [Value::Node(program)]);

    let empty = tree.search(program, "EmptyStatement").unwrap()[0]
        .as_node()
        .unwrap();
    assert!(tree.matches(empty, "Program EmptyStatement").unwrap());
    assert!(!tree.matches(empty, "Program > EmptyStatement").unwrap());
    assert!(tree.matches(empty, "Program > body IfStatement consequent > body > EmptyStatement").unwrap());
}

#[test]
fn attribute_operators_on_identifier_names() {
    let (tree, program) = load(SCOPES);
    let names = |selector: &str| -> Vec<String> {
        tree.search(program, selector)
            .unwrap()
            .iter()
            .map(|v| tree.get(v.as_node().unwrap(), "name").unwrap().to_text())
            .collect()
    };

    assert_eq!(names("Identifier[name^=ou]"), ["outer", "outer"]);
    assert_eq!(names("Identifier[name$=er]"), ["outer", "inner", "inner", "outer"]);
    assert_eq!(names("Identifier[name*=te]"), ["outer", "step", "step", "outer"]);
    assert!(names("Identifier[name=cou]").is_empty());
    assert_eq!(names("Identifier[name!=count]").len(), 6);
}

#[test]
fn numeric_and_boolean_values_are_normalized() {
    let (tree, program) = load(SCOPES);
    let found = tree.search(program, "Literal[value=2]").unwrap();
    assert_eq!(found.len(), 1);
    let found = tree.search(program, "Literal[value=2.0]").unwrap();
    assert_eq!(found.len(), 1);
    assert!(tree.search(program, "Literal[value=3]").unwrap().is_empty());
    let found = tree.search(program, "FunctionDeclaration[generator=false]").unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn metadata_keys_behave_like_classes() {
    let (tree, program) = load(SCOPES);
    let found = tree.search(program, "ExpressionStatement.loc").unwrap();
    assert_eq!(found.len(), 1);
    let found = tree.search(program, "ExpressionStatement[loc]").unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn comma_alternatives_are_deduplicated_in_first_chain_order() {
    let (tree, program) = load(SCOPES);
    let found = tree
        .search(program, "ReturnStatement, #Statement")
        .unwrap();
    let names = type_names(&tree, &found);
    assert_eq!(names[0], "ReturnStatement");
    assert_eq!(names.iter().filter(|n| *n == "ReturnStatement").count(), 1);

    let all = tree.search(program, "#Statement").unwrap();
    assert_eq!(found.len(), all.len());
}

#[test]
fn function_boundary_combinator_stays_at_top_level() {
    let (tree, program) = load(SCOPES);
    let found = tree.search(program, "=> Identifier").unwrap();
    let names: Vec<String> = found
        .iter()
        .map(|v| tree.get(v.as_node().unwrap(), "name").unwrap().to_text())
        .collect();
    assert_eq!(names, ["count", "outer"]);
}

#[test]
fn list_results_are_replaced_by_their_members() {
    let (tree, program) = load(SCOPES);
    let found = tree.search(program, "FunctionDeclaration > params").unwrap();
    assert_eq!(type_names(&tree, &found), ["Identifier"]);

    let found = tree.search(program, "> body").unwrap();
    assert_eq!(
        type_names(&tree, &found),
        ["VariableDeclaration", "FunctionDeclaration", "ExpressionStatement"]
    );
}

#[test]
fn search_is_deterministic() {
    let (tree, program) = load(SCOPES);
    let selector = "Identifier, #Expression < *, BlockStatement > body";
    let first = tree.search(program, selector).unwrap();
    for _ in 0..3 {
        assert_eq!(tree.search(program, selector).unwrap(), first);
    }
}

#[test]
fn results_follow_the_tree_after_a_move() {
    let (mut tree, program) = load(NESTED_EMPTY);
    let nested = tree.search(program, "IfStatement EmptyStatement").unwrap();
    assert_eq!(nested.len(), 1);
    assert!(tree.search(program, "> body > EmptyStatement").unwrap().is_empty());

    let empty = nested[0].as_node().unwrap();
    let body = tree.list(program, "body").unwrap();
    tree.push(body, empty).unwrap();

    assert!(tree.search(program, "IfStatement EmptyStatement").unwrap().is_empty());
    let top = tree.search(program, "> body > EmptyStatement").unwrap();
    assert_eq!(top, nested);
}

#[test]
fn scope_of_a_nested_identifier_is_the_enclosing_function() {
    let (tree, program) = load(SCOPES);
    let engine = QueryEngine::new(&tree);
    let count = identifiers(&tree, "count")[1];

    let scope = engine.scope(count.into(), None).unwrap().unwrap();
    assert_eq!(tree.type_name(scope), "FunctionDeclaration");
    assert_eq!(
        tree.get(tree.child(scope, "id").unwrap().unwrap(), "name").unwrap(),
        Value::from("inner")
    );

    let scopes = engine.scopes(count.into(), None).unwrap();
    assert_eq!(scopes.len(), 3);
    assert_eq!(scopes.last(), Some(&program));

    let outer = engine
        .scope(count.into(), Some("FunctionDeclaration > id[name=outer] < *"))
        .unwrap();
    assert_eq!(outer, Some(scopes[1]));
}

#[test]
fn parent_walks_include_lists() {
    let (tree, program) = load(SCOPES);
    let engine = QueryEngine::new(&tree);
    let step = identifiers(&tree, "step")[0];

    let parent = engine.parent(step.into(), None).unwrap();
    assert!(matches!(parent, Some(Handle::List(_))));
    assert!(engine.parent(step.into(), Some("params")).unwrap().is_some());

    let function = engine.parent(step.into(), Some("#Function")).unwrap();
    assert_eq!(function, tree.parent_node(parent.unwrap()).map(Handle::Node));
    assert_eq!(engine.parents(step.into(), Some("#Program")).unwrap(), [Handle::Node(program)]);
}

#[test]
fn find_unique_reports_missing_and_ambiguous_matches() {
    let (tree, program) = load(SCOPES);
    let engine = QueryEngine::new(&tree);

    let found = engine.find_unique(program.into(), "ReturnStatement > argument").unwrap();
    assert_eq!(type_names(&tree, &[found]), ["Identifier"]);
    assert_eq!(
        engine.find_unique(program.into(), "ThrowStatement"),
        Err(QueryError::NoMatch)
    );
    assert_eq!(
        engine.find_unique(program.into(), "FunctionDeclaration"),
        Err(QueryError::AmbiguousMatch { count: 2 })
    );
}

#[test]
fn selector_errors_surface_to_the_caller() {
    let (tree, program) = load(SCOPES);
    assert!(matches!(
        tree.search(program, "#Identifer"),
        Err(QueryError::UnknownType { .. })
    ));
    assert!(matches!(
        tree.search(program, "Identifier["),
        Err(QueryError::InvalidSelector { .. })
    ));
}
