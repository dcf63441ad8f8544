//! Concrete parse tree consumed by the translator.
//!
//! The parse tree is the narrow contract between a source reader and the
//! compiler: every node names the grammar rule it was recognized by, and
//! children are addressed by the field they fill in that rule. Any reader
//! that builds these nodes can feed [`crate::translate`].

use std::fmt;

use bramble_foundation::{Error, Result};

use crate::span::Span;

/// Grammar rules a parse node can be recognized by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Root: optional `Title`/`Description`, then `Statement`s.
    Story,
    /// A lone `;`.
    EmptyStatement,
    /// `let Target = Value;` or `let Target abstract;`.
    VariableDefinition,
    /// `[Modifier] fun Target(Parameter*) Body`.
    FunctionDefinition,
    /// `object Name : Parent Body`.
    ObjectDefinition,
    /// `Target = Value;`.
    Assignment,
    /// `on Event Body`.
    OnHandler,
    /// `if Condition Then [Else]`.
    IfStatement,
    /// `Value;`.
    ExpressionStatement,
    /// `{ Statement* }`.
    Block,
    /// The `abstract` placeholder body.
    Abstract,
    /// The `override` modifier.
    Override,
    /// A bare name; text holds the name.
    Identifier,
    /// Text holds the unescaped contents.
    StringLiteral,
    /// Text holds the literal as written.
    NumberLiteral,
    /// Text is `true` or `false`.
    BooleanLiteral,
    /// `[ Element* ]`.
    ArrayLiteral,
    /// `Receiver . Member`.
    MemberAccess,
    /// `Receiver [ Index ]`.
    ArrayAccess,
    /// `Callee ( Argument* )`.
    FunctionCall,
    /// `( Inner )`.
    Parenthesized,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Named slots a child node can fill within its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// Story title.
    Title,
    /// Story description.
    Description,
    /// One statement of a story or block.
    Statement,
    /// Definition or assignment target.
    Target,
    /// Initial value or assigned value.
    Value,
    /// Defined object name.
    Name,
    /// Parent object name.
    Parent,
    /// One function parameter.
    Parameter,
    /// Function or object body.
    Body,
    /// Function modifier such as `override`.
    Modifier,
    /// Event of an `on` handler.
    Event,
    /// Condition of an `if`.
    Condition,
    /// Then branch.
    Then,
    /// Else branch.
    Else,
    /// Receiver of member or array access.
    Receiver,
    /// Member name of member access.
    Member,
    /// Index of array access.
    Index,
    /// Called expression.
    Callee,
    /// One call argument.
    Argument,
    /// One array element.
    Element,
    /// Wrapped expression.
    Inner,
}

/// A node of the parse tree.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseNode {
    /// The rule this node was recognized by.
    pub rule: Rule,
    /// Source location.
    pub span: Span,
    /// Leaf text for identifiers and literals.
    pub text: Option<String>,
    /// Children in source order, each tagged with the field it fills.
    pub children: Vec<(Field, ParseNode)>,
}

impl ParseNode {
    /// Creates an empty node.
    #[must_use]
    pub fn new(rule: Rule, span: Span) -> Self {
        Self {
            rule,
            span,
            text: None,
            children: Vec::new(),
        }
    }

    /// Creates a leaf node holding `text`.
    #[must_use]
    pub fn leaf(rule: Rule, span: Span, text: impl Into<String>) -> Self {
        Self {
            rule,
            span,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Appends a child filling `field`.
    #[must_use]
    pub fn with_child(mut self, field: Field, child: ParseNode) -> Self {
        self.children.push((field, child));
        self
    }

    /// Appends a child filling `field` in place.
    pub fn push(&mut self, field: Field, child: ParseNode) {
        self.children.push((field, child));
    }

    /// Returns the first child filling `field`.
    #[must_use]
    pub fn child(&self, field: Field) -> Option<&ParseNode> {
        self.children
            .iter()
            .find_map(|(f, node)| (*f == field).then_some(node))
    }

    /// Returns every child filling `field`, in order.
    pub fn children(&self, field: Field) -> impl Iterator<Item = &ParseNode> {
        self.children
            .iter()
            .filter_map(move |(f, node)| (*f == field).then_some(node))
    }

    /// Returns the child filling `field` or a `MalformedParseTree` error.
    ///
    /// # Errors
    /// Fails when this node has no such child.
    pub fn expect_child(&self, field: Field) -> Result<&ParseNode> {
        self.child(field).ok_or_else(|| {
            self.malformed(format!("{} node is missing its {field:?}", self.rule))
        })
    }

    /// Returns the leaf text or a `MalformedParseTree` error.
    ///
    /// # Errors
    /// Fails when this node carries no text.
    pub fn expect_text(&self) -> Result<&str> {
        self.text
            .as_deref()
            .ok_or_else(|| self.malformed(format!("{} node has no text", self.rule)))
    }

    /// Fails unless this node was recognized by `rule`.
    ///
    /// # Errors
    /// Returns `MalformedParseTree` naming both rules.
    pub fn expect_rule(&self, rule: Rule) -> Result<&Self> {
        if self.rule == rule {
            Ok(self)
        } else {
            Err(self.malformed(format!("expected {rule} node, found {}", self.rule)))
        }
    }

    /// Builds a `MalformedParseTree` error positioned at this node.
    #[must_use]
    pub fn malformed(&self, message: String) -> Error {
        let err = Error::malformed(message);
        if self.span.is_located() {
            err.at(self.span.line, self.span.column)
        } else {
            err
        }
    }
}
