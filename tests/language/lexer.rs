//! Integration tests for the lexer
//!
//! Tests tokenization of Bramble story source.

use bramble_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn tokenize_booleans() {
    let tokens = Lexer::tokenize_all("true false");
    assert!(matches!(tokens[0].kind, TokenKind::True));
    assert!(matches!(tokens[1].kind, TokenKind::False));
    assert!(matches!(tokens[2].kind, TokenKind::Eof));
}

#[test]
fn tokenize_numbers() {
    assert_eq!(
        kinds("0 42 -17 2.5"),
        vec![
            TokenKind::Number(0.0),
            TokenKind::Number(42.0),
            TokenKind::Number(-17.0),
            TokenKind::Number(2.5),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn trailing_dot_is_member_access() {
    assert_eq!(
        kinds("1.x"),
        vec![
            TokenKind::Number(1.0),
            TokenKind::Dot,
            TokenKind::Ident("x".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn tokenize_string() {
    let tokens = Lexer::tokenize_all("\"A small room.\"");
    if let TokenKind::String(s) = &tokens[0].kind {
        assert_eq!(s, "A small room.");
    } else {
        panic!("Expected string token");
    }
}

#[test]
fn tokenize_string_with_escapes() {
    let tokens = Lexer::tokenize_all(r#""say \"hi\"\n\tnow""#);
    assert_eq!(tokens[0].kind, TokenKind::String("say \"hi\"\n\tnow".into()));
}

#[test]
fn unterminated_string_is_an_error_token() {
    let tokens = Lexer::tokenize_all("\"open");
    assert!(matches!(tokens[0].kind, TokenKind::Error(_)));
}

#[test]
fn invalid_escape_is_an_error_token() {
    let tokens = Lexer::tokenize_all(r#""\q""#);
    assert!(matches!(tokens[0].kind, TokenKind::Error(ref m) if m.contains("\\q")));
}

// =============================================================================
// Keywords and identifiers
// =============================================================================

#[test]
fn tokenize_keywords() {
    assert_eq!(
        kinds("story let fun override object on if else abstract"),
        vec![
            TokenKind::Story,
            TokenKind::Let,
            TokenKind::Fun,
            TokenKind::Override,
            TokenKind::Object,
            TokenKind::On,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Abstract,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_are_whole_words() {
    assert_eq!(
        kinds("lettuce objects"),
        vec![
            TokenKind::Ident("lettuce".into()),
            TokenKind::Ident("objects".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn identifiers_allow_digits_and_dollar() {
    assert_eq!(
        kinds("room2 $outer _tmp"),
        vec![
            TokenKind::Ident("room2".into()),
            TokenKind::Ident("$outer".into()),
            TokenKind::Ident("_tmp".into()),
            TokenKind::Eof,
        ]
    );
}

// =============================================================================
// Comments and positions
// =============================================================================

#[test]
fn comments_are_kept_as_trivia() {
    let tokens = Lexer::tokenize_all("// a cellar\nlet");
    assert!(matches!(tokens[0].kind, TokenKind::Comment(_)));
    assert!(tokens[0].kind.is_trivia());
    assert_eq!(tokens[1].kind, TokenKind::Let);
}

#[test]
fn spans_track_lines_and_columns() {
    let tokens = Lexer::tokenize_all("let x\n  = 1;");
    let equals = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Equals)
        .unwrap();
    assert_eq!((equals.span.line, equals.span.column), (2, 3));
}

#[test]
fn object_header_tokens() {
    assert_eq!(
        kinds("object key : Item { }"),
        vec![
            TokenKind::Object,
            TokenKind::Ident("key".into()),
            TokenKind::Colon,
            TokenKind::Ident("Item".into()),
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}
