//! Integration tests for the parser and translator
//!
//! Tests reading Bramble source into a parse tree and then a typed story.

use bramble_foundation::ErrorKind;
use bramble_language::{
    DefinitionBody, Expression, Field, LExpression, Rule, Statement, Story, parse,
    translate_story,
};

fn story(source: &str) -> Story {
    translate_story(&parse(source).unwrap()).unwrap()
}

fn story_err(source: &str) -> ErrorKind {
    parse(source)
        .and_then(|tree| translate_story(&tree))
        .unwrap_err()
        .kind
}

// =============================================================================
// Parse tree
// =============================================================================

#[test]
fn header_fills_title_and_description() {
    let tree = parse("story \"Cellar\" \"Damp and dark.\";").unwrap();
    assert_eq!(tree.rule, Rule::Story);
    assert_eq!(
        tree.child(Field::Title).and_then(|n| n.text.as_deref()),
        Some("Cellar")
    );
    assert_eq!(
        tree.child(Field::Description).and_then(|n| n.text.as_deref()),
        Some("Damp and dark.")
    );
}

#[test]
fn header_is_optional() {
    let parsed = story("let x = 1;");
    assert!(parsed.title.is_empty());
    assert!(parsed.description.is_empty());
    assert_eq!(parsed.statements.len(), 1);
}

#[test]
fn member_access_nests_left_to_right() {
    let tree = parse("a.b.c;").unwrap();
    let statement = tree.child(Field::Statement).unwrap();
    assert_eq!(statement.rule, Rule::ExpressionStatement);
    let outer = statement.child(Field::Value).unwrap();
    assert_eq!(outer.rule, Rule::MemberAccess);
    assert_eq!(
        outer.child(Field::Member).and_then(|n| n.text.as_deref()),
        Some("c")
    );
    let inner = outer.child(Field::Receiver).unwrap();
    assert_eq!(inner.rule, Rule::MemberAccess);
}

#[test]
fn function_definition_children() {
    let tree = parse("override fun describe(who, how) { }").unwrap();
    let def = tree.child(Field::Statement).unwrap();
    assert_eq!(def.rule, Rule::FunctionDefinition);
    assert_eq!(def.child(Field::Modifier).unwrap().rule, Rule::Override);
    let params: Vec<_> = def
        .children(Field::Parameter)
        .filter_map(|p| p.text.as_deref())
        .collect();
    assert_eq!(params, vec!["who", "how"]);
    assert_eq!(def.child(Field::Body).unwrap().rule, Rule::Block);
}

#[test]
fn comments_are_skipped() {
    let parsed = story("// opening\nlet x = 1; // trailing\n");
    assert_eq!(parsed.statements.len(), 1);
}

// =============================================================================
// Parse errors
// =============================================================================

#[test]
fn missing_semicolon_reports_position() {
    let err = parse("let x = 1\nlet y = 2;").unwrap_err();
    match err.kind {
        ErrorKind::ParseError {
            line,
            column,
            context,
            ..
        } => {
            assert_eq!((line, column), (2, 1));
            assert_eq!(context, "let y = 2;");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn unterminated_block_is_a_parse_error() {
    assert!(matches!(
        story_err("object box : Item { let x = 1;"),
        ErrorKind::ParseError { .. }
    ));
}

#[test]
fn lexer_errors_surface_as_parse_errors() {
    assert!(matches!(
        story_err("say(\"open);"),
        ErrorKind::ParseError { .. }
    ));
    assert!(matches!(story_err("x = #;"), ErrorKind::ParseError { .. }));
}

// =============================================================================
// Translation
// =============================================================================

#[test]
fn translates_object_definition() {
    let parsed = story("object key : Item { let name = \"key\"; }");
    match &parsed.statements[0] {
        Statement::ObjectDefinition {
            name, parent, body, ..
        } => {
            assert_eq!(name, "key");
            assert_eq!(parent, "Item");
            assert!(matches!(
                &body[0],
                Statement::VariableDefinition { name, receiver: None, .. } if name == "name"
            ));
        }
        other => panic!("expected object definition, got {other:?}"),
    }
}

#[test]
fn translates_receiver_definitions() {
    let parsed = story("fun box.open() { } let box.weight = 3;");
    assert!(matches!(
        &parsed.statements[0],
        Statement::FunctionDefinition { receiver: Some(Expression::Variable(r, _)), name, .. }
            if r == "box" && name == "open"
    ));
    assert!(matches!(
        &parsed.statements[1],
        Statement::VariableDefinition { receiver: Some(_), name, .. } if name == "weight"
    ));
}

#[test]
fn translates_abstract_bodies() {
    let parsed = story("fun describe() abstract; let weight abstract;");
    assert!(matches!(
        &parsed.statements[0],
        Statement::FunctionDefinition { body: DefinitionBody::Abstract, .. }
    ));
    assert!(matches!(
        &parsed.statements[1],
        Statement::VariableDefinition { body: DefinitionBody::Abstract, .. }
    ));
}

#[test]
fn translates_else_if_chain() {
    let parsed = story("if a { } else if b { say(1); } else { say(2); }");
    let Statement::If { else_case, .. } = &parsed.statements[0] else {
        panic!("expected if statement");
    };
    assert_eq!(else_case.len(), 1);
    let Statement::If {
        then_case,
        else_case,
        ..
    } = &else_case[0]
    else {
        panic!("expected nested if");
    };
    assert_eq!(then_case.len(), 1);
    assert_eq!(else_case.len(), 1);
}

#[test]
fn empty_statements_are_dropped() {
    let parsed = story(";; let x = 1; ;");
    assert_eq!(parsed.statements.len(), 1);
}

#[test]
fn assignment_targets() {
    let parsed = story("room.items[0] = key;");
    let Statement::Assignment { lhs, .. } = &parsed.statements[0] else {
        panic!("expected assignment");
    };
    assert!(matches!(lhs, LExpression::Index { .. }));
}

#[test]
fn rejects_unassignable_targets() {
    assert!(matches!(story_err("say(x) = 1;"), ErrorKind::NotAnLValue(_)));
    assert!(matches!(story_err("3 = 1;"), ErrorKind::NotAnLValue(_)));
}

#[test]
fn rejects_invalid_definition_targets() {
    assert!(matches!(
        story_err("let items[0] = 1;"),
        ErrorKind::InvalidDefinitionTarget(_)
    ));
}

#[test]
fn expressions_display_as_source() {
    let parsed = story("say(room.items[0], [1, \"a\"]);");
    let Statement::Expression(expr) = &parsed.statements[0] else {
        panic!("expected expression statement");
    };
    assert_eq!(expr.to_string(), "say(room.items[0], [1, \"a\"])");
}
