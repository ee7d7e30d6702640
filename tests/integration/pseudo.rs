use super::{identifiers, load, SCOPES};
use ast_select::{estree, Tree};
use serde_json::json;

#[test]
fn assignment_target_is_a_reference_not_a_declaration() {
    let mut tree = Tree::new(estree().unwrap());
    let statement = tree
        .build(&json!({
            "type": "ExpressionStatement",
            "expression": {
                "type": "AssignmentExpression",
                "operator": "=",
                "left": { "type": "Identifier", "name": "x" },
                "right": { "type": "Literal", "value": 1 }
            }
        }))
        .unwrap()
        .as_node()
        .unwrap();
    let x = identifiers(&tree, "x")[0];

    assert!(tree.matches(x, ":reference").unwrap());
    assert!(!tree.matches(x, ":declaration").unwrap());
    assert_eq!(tree.search(statement, ":reference(x)").unwrap().len(), 1);
    assert!(tree.search(statement, ":declaration").unwrap().is_empty());
}

#[test]
fn declarator_id_is_a_declaration_not_a_reference() {
    let mut tree = Tree::new(estree().unwrap());
    tree.build(&json!({
        "type": "VariableDeclaration",
        "kind": "var",
        "declarations": [{
            "type": "VariableDeclarator",
            "id": { "type": "Identifier", "name": "x" },
            "init": { "type": "Literal", "value": 1 }
        }]
    }))
    .unwrap();
    let x = identifiers(&tree, "x")[0];

    assert!(tree.matches(x, ":declaration").unwrap());
    assert!(tree.matches(x, ":declaration(x)").unwrap());
    assert!(!tree.matches(x, ":declaration(y)").unwrap());
    assert!(!tree.matches(x, ":reference").unwrap());
}

#[test]
fn roles_across_a_program() {
    let (tree, program) = load(SCOPES);
    let names = |selector: &str| -> Vec<String> {
        tree.search(program, selector)
            .unwrap()
            .iter()
            .map(|v| tree.get(v.as_node().unwrap(), "name").unwrap().to_text())
            .collect()
    };

    assert_eq!(names(":declaration"), ["count", "outer", "step", "inner"]);
    assert_eq!(names(":reference"), ["count", "step", "inner", "outer"]);
    assert_eq!(names(":reference(step)"), ["step"]);
}

#[test]
fn scopes_are_the_program_and_functions() {
    let (tree, program) = load(SCOPES);
    let found = tree.search(program, ":scope").unwrap();
    assert_eq!(found.len(), 2);
    assert!(tree.matches(program, ":scope").unwrap());

    let found = tree.search(program, ":scope > id").unwrap();
    assert_eq!(found.len(), 2);
}
