//! Recursive-descent reader for Bramble story source.
//!
//! The parser converts a stream of tokens into a [`ParseNode`] tree. It
//! only recognizes syntax; shape checks such as "is this an assignable
//! expression" are left to the translator.

use bramble_foundation::{Error, ErrorKind, Result};

use crate::lexer::Lexer;
use crate::parse_tree::{Field, ParseNode, Rule};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for Bramble source code.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Span of the most recently consumed token.
    previous: Span,
    /// Source text (for error messages).
    source: &'src str,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let mut parser = Self {
            lexer,
            previous: current.span,
            current,
            source,
        };
        parser.skip_trivia();
        parser
    }

    /// Parses a whole story.
    ///
    /// # Errors
    /// Returns a `ParseError` with line, column, and the source line.
    pub fn parse_story(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        let mut story = ParseNode::new(Rule::Story, start);

        if self.check(&TokenKind::Story) {
            self.advance();
            let title = self.parse_string_literal()?;
            story.push(Field::Title, title);
            if matches!(self.current.kind, TokenKind::String(_)) {
                let description = self.parse_string_literal()?;
                story.push(Field::Description, description);
            }
            self.expect(&TokenKind::Semicolon)?;
        }

        while !self.check(&TokenKind::Eof) {
            let statement = self.parse_statement()?;
            story.push(Field::Statement, statement);
        }

        story.span = start.to(self.previous);
        Ok(story)
    }

    /// Parses one statement.
    fn parse_statement(&mut self) -> Result<ParseNode> {
        match self.current.kind {
            TokenKind::Semicolon => {
                let span = self.current.span;
                self.advance();
                Ok(ParseNode::new(Rule::EmptyStatement, span))
            }
            TokenKind::Let => self.parse_variable_definition(),
            TokenKind::Fun | TokenKind::Override => self.parse_function_definition(),
            TokenKind::Object => self.parse_object_definition(),
            TokenKind::On => self.parse_on_handler(),
            TokenKind::If => self.parse_if(),
            _ => self.parse_expression_statement(),
        }
    }

    /// `let target ( = expr | abstract ) ;`
    fn parse_variable_definition(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        self.expect(&TokenKind::Let)?;
        let target = self.parse_postfix(true)?;
        let mut node = ParseNode::new(Rule::VariableDefinition, start).with_child(Field::Target, target);

        if self.check(&TokenKind::Abstract) {
            let span = self.current.span;
            self.advance();
            node.push(Field::Value, ParseNode::new(Rule::Abstract, span));
        } else {
            self.expect(&TokenKind::Equals)?;
            let value = self.parse_expression()?;
            node.push(Field::Value, value);
        }

        self.expect(&TokenKind::Semicolon)?;
        node.span = start.to(self.previous);
        Ok(node)
    }

    /// `override? fun target ( params ) ( block | abstract ; )`
    fn parse_function_definition(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        let mut node = ParseNode::new(Rule::FunctionDefinition, start);

        if self.check(&TokenKind::Override) {
            let span = self.current.span;
            self.advance();
            node.push(Field::Modifier, ParseNode::new(Rule::Override, span));
        }
        self.expect(&TokenKind::Fun)?;

        let target = self.parse_postfix(false)?;
        node.push(Field::Target, target);

        self.expect(&TokenKind::LParen)?;
        if !self.check(&TokenKind::RParen) {
            loop {
                let param = self.parse_identifier()?;
                node.push(Field::Parameter, param);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&TokenKind::RParen)?;

        if self.check(&TokenKind::Abstract) {
            let span = self.current.span;
            self.advance();
            self.expect(&TokenKind::Semicolon)?;
            node.push(Field::Body, ParseNode::new(Rule::Abstract, span));
        } else {
            let body = self.parse_block()?;
            node.push(Field::Body, body);
        }

        node.span = start.to(self.previous);
        Ok(node)
    }

    /// `object Name : Parent block`
    fn parse_object_definition(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        self.expect(&TokenKind::Object)?;
        let name = self.parse_identifier()?;
        self.expect(&TokenKind::Colon)?;
        let parent = self.parse_identifier()?;
        let body = self.parse_block()?;
        Ok(ParseNode::new(Rule::ObjectDefinition, start.to(self.previous))
            .with_child(Field::Name, name)
            .with_child(Field::Parent, parent)
            .with_child(Field::Body, body))
    }

    /// `on expr block`
    fn parse_on_handler(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        self.expect(&TokenKind::On)?;
        let event = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(ParseNode::new(Rule::OnHandler, start.to(self.previous))
            .with_child(Field::Event, event)
            .with_child(Field::Body, body))
    }

    /// `if expr block ( else ( block | if ) )?`
    fn parse_if(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        self.expect(&TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_case = self.parse_block()?;
        let mut node = ParseNode::new(Rule::IfStatement, start)
            .with_child(Field::Condition, condition)
            .with_child(Field::Then, then_case);

        if self.check(&TokenKind::Else) {
            self.advance();
            let else_case = if self.check(&TokenKind::If) {
                self.parse_if()?
            } else {
                self.parse_block()?
            };
            node.push(Field::Else, else_case);
        }

        node.span = start.to(self.previous);
        Ok(node)
    }

    /// `expr ( = expr )? ;`
    fn parse_expression_statement(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        let expr = self.parse_expression()?;
        let node = if self.check(&TokenKind::Equals) {
            self.advance();
            let value = self.parse_expression()?;
            ParseNode::new(Rule::Assignment, start)
                .with_child(Field::Target, expr)
                .with_child(Field::Value, value)
        } else {
            ParseNode::new(Rule::ExpressionStatement, start).with_child(Field::Value, expr)
        };
        self.expect(&TokenKind::Semicolon)?;
        Ok(ParseNode {
            span: start.to(self.previous),
            ..node
        })
    }

    /// `{ statement* }`
    fn parse_block(&mut self) -> Result<ParseNode> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        let mut block = ParseNode::new(Rule::Block, start);
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error_at(start, "unterminated block"));
            }
            let statement = self.parse_statement()?;
            block.push(Field::Statement, statement);
        }
        self.expect(&TokenKind::RBrace)?;
        block.span = start.to(self.previous);
        Ok(block)
    }

    fn parse_expression(&mut self) -> Result<ParseNode> {
        self.parse_postfix(true)
    }

    /// `primary ( . IDENT | [ expr ] | ( args ) )*`
    ///
    /// Function definition targets are read with `allow_calls` off so the
    /// parameter list is not mistaken for a call.
    fn parse_postfix(&mut self, allow_calls: bool) -> Result<ParseNode> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = expr.span;
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.parse_identifier()?;
                    expr = ParseNode::new(Rule::MemberAccess, start.to(self.previous))
                        .with_child(Field::Receiver, expr)
                        .with_child(Field::Member, member);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = ParseNode::new(Rule::ArrayAccess, start.to(self.previous))
                        .with_child(Field::Receiver, expr)
                        .with_child(Field::Index, index);
                }
                TokenKind::LParen if allow_calls => {
                    self.advance();
                    let mut call =
                        ParseNode::new(Rule::FunctionCall, start).with_child(Field::Callee, expr);
                    for argument in self.parse_list(&TokenKind::RParen)? {
                        call.push(Field::Argument, argument);
                    }
                    call.span = start.to(self.previous);
                    expr = call;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parses comma-separated expressions up to and including `close`.
    fn parse_list(&mut self, close: &TokenKind) -> Result<Vec<ParseNode>> {
        let mut items = Vec::new();
        if !self.check(close) {
            loop {
                items.push(self.parse_expression()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<ParseNode> {
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::Ident(_) => self.parse_identifier(),
            TokenKind::String(_) => self.parse_string_literal(),
            TokenKind::Number(_) => {
                let text = span.text(self.source).to_string();
                self.advance();
                Ok(ParseNode::leaf(Rule::NumberLiteral, span, text))
            }
            TokenKind::True | TokenKind::False => {
                let text = if self.check(&TokenKind::True) { "true" } else { "false" };
                self.advance();
                Ok(ParseNode::leaf(Rule::BooleanLiteral, span, text))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut array = ParseNode::new(Rule::ArrayLiteral, span);
                for element in self.parse_list(&TokenKind::RBracket)? {
                    array.push(Field::Element, element);
                }
                array.span = span.to(self.previous);
                Ok(array)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(ParseNode::new(Rule::Parenthesized, span.to(self.previous))
                    .with_child(Field::Inner, inner))
            }
            TokenKind::Error(msg) => Err(self.error(msg)),
            other => Err(self.error(&format!("expected expression, found {}", other.name()))),
        }
    }

    fn parse_identifier(&mut self) -> Result<ParseNode> {
        let span = self.current.span;
        if let TokenKind::Ident(name) = &self.current.kind {
            let node = ParseNode::leaf(Rule::Identifier, span, name.clone());
            self.advance();
            Ok(node)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn parse_string_literal(&mut self) -> Result<ParseNode> {
        let span = self.current.span;
        if let TokenKind::String(text) = &self.current.kind {
            let node = ParseNode::leaf(Rule::StringLiteral, span, text.clone());
            self.advance();
            Ok(node)
        } else {
            Err(self.unexpected("string"))
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn skip_trivia(&mut self) {
        while self.current.kind.is_trivia() {
            self.current = self.lexer.next_token();
        }
    }

    /// Advances to the next non-trivia token.
    fn advance(&mut self) {
        self.previous = self.current.span;
        self.current = self.lexer.next_token();
        self.skip_trivia();
    }

    /// Expects the current token to be of a specific kind, then advances.
    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        if self.check(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected.name()))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        if let TokenKind::Error(msg) = &self.current.kind {
            return self.error(msg);
        }
        self.error(&format!(
            "expected {expected}, found {}",
            self.current.kind.name()
        ))
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        self.error_at(self.current.span, message)
    }

    /// Creates a parse error at a specific span.
    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::new(ErrorKind::ParseError {
            message: message.to_string(),
            line: span.line,
            column: span.column,
            context: self.context_at(span),
        })
    }

    /// Returns the full source line containing `span`.
    fn context_at(&self, span: Span) -> String {
        let start = span.start.min(self.source.len());
        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |i| start + i);
        self.source[line_start..line_end].to_string()
    }
}

/// Parses story source into a parse tree.
///
/// # Errors
/// Returns an error if the source cannot be parsed.
pub fn parse(source: &str) -> Result<ParseNode> {
    Parser::new(source).parse_story()
}
